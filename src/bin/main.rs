//! form-bind 演示程序：构造表单、绑定数据、模拟输入并打印数据对象

use form_bind::binding::{BindSpec, DataHandler, Marker};
use form_bind::controls::{Checkbox, Column, Select, Slider, Table};
use form_bind::factory::{self, Descriptor};
use form_bind::{logging, DataObject, UiRuntime};
use serde_json::{json, Value};

fn main() -> Result<(), String> {
    logging::init();
    println!("🚀 form-bind demo");

    let mut app = UiRuntime::default();
    app.init();
    let ctx = app.context().clone();
    let dom = app.dom();

    let name = factory::create(
        dom,
        &Descriptor::new("input").ident("#name").attr("type", "text").bind(BindSpec::new(Marker::Value, "name")),
    )
    .ok_or("failed to build name field")?;
    let age = factory::create(
        dom,
        &Descriptor::new("input").attr("type", "number").bind(
            BindSpec::new(Marker::Value, "profile.age").data_handler(DataHandler::new(|v: &Value| v.clone())),
        ),
    )
    .ok_or("failed to build age field")?;

    let agree = Checkbox::new(&ctx, false);
    dom.set_binding(agree.node(), BindSpec::new(Marker::Checkbox, "agree"));

    let volume = Slider::new(&ctx, 0.0, 100.0, 10.0);
    dom.set_binding(volume.node(), BindSpec::new(Marker::Slider, "volume"));
    dom.set_rect(volume.node(), form_bind::Rect::new(0.0, 0.0, 200.0, 20.0));

    let city = Select::new(&ctx, vec![json!({"id": "sh", "label": "Shanghai"}), json!({"id": "bj", "label": "Beijing"})]);
    city.set_label_key(dom, "label");
    dom.set_binding(city.node(), BindSpec::new(Marker::Selection, "city").value_key("id"));

    let table = Table::new(&ctx, vec![Column::new("item", "Item"), Column::new("qty", "Qty").sortable()]);
    dom.set_binding(table.node(), BindSpec::new(Marker::Table, "orders"));

    let data = DataObject::new(json!({
        "name": null,
        "volume": 26,
        "city": "bj",
        "orders": [{"item": "pen", "qty": 3}, {"item": "ink", "qty": null}, {"item": "pad", "qty": 7}]
    }));
    let form = app
        .mount(
            &Descriptor::new("form")
                .ident(".demo-form")
                .children([name, age, agree.node(), volume.node(), city.node(), table.node()])
                .data(data.clone()),
        )
        .ok_or("failed to mount form")?;
    println!("✅ form mounted: {} nodes", dom.descendants(form).len());

    // 模拟用户操作
    app.type_text(name, "Alice");
    app.blur();
    app.type_text(age, "31");
    app.tap(agree.node());
    app.touch_start(volume.node(), 0.0, 10.0);
    app.touch_move(volume.node(), 47.0, 10.0);
    app.touch_end(volume.node(), 47.0, 10.0);
    app.tap(city.node());
    app.run_until_idle(16.0, 1000.0);
    if let Some(first) = city.item_nodes().first() {
        app.tap(*first);
    }
    if let Some(qty) = table.header_cell(1) {
        app.tap(qty);
    }
    if let Some(list) = table.list() {
        list.append(json!({"item": "clip", "qty": 12}));
    }
    app.run_until_idle(16.0, 2000.0);

    let snapshot = serde_json::to_string_pretty(&data.snapshot()).map_err(|e| e.to_string())?;
    println!("📦 data:\n{}", snapshot);
    println!("🎨 styles:\n{}", app.styles().css_text());
    Ok(())
}
