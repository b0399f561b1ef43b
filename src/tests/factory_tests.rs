//! 元素工厂测试

use super::bound_input;
use crate::binding::{BindSpec, DataObject, Marker};
use crate::event::listener;
use crate::factory::{apply, create, Descriptor};
use crate::controls::Checkbox;
use crate::style::StyleDesc;
use crate::UiRuntime;
use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn test_baseline_normalization() {
    let rt = UiRuntime::default();
    let dom = rt.dom();
    let div = create(dom, &Descriptor::new("div")).unwrap();
    assert_eq!(dom.style(div, "margin").as_deref(), Some("0"));
    assert_eq!(dom.style(div, "padding").as_deref(), Some("0"));
    assert_eq!(dom.style(div, "border"), None);

    let input = create(dom, &Descriptor::new("INPUT")).unwrap();
    assert_eq!(dom.tag(input).as_deref(), Some("input"));
    assert_eq!(dom.style(input, "border").as_deref(), Some("none"));
    assert_eq!(dom.style(input, "outline").as_deref(), Some("none"));
    assert_eq!(dom.style(input, "appearance").as_deref(), Some("none"));
    assert_eq!(dom.style(input, "font-size").as_deref(), Some("1em"));
}

#[test]
fn test_ident_sets_id_or_classes() {
    let rt = UiRuntime::default();
    let dom = rt.dom();
    let a = create(dom, &Descriptor::new("div").ident("#main")).unwrap();
    assert_eq!(dom.element_id(a).as_deref(), Some("main"));
    let b = create(dom, &Descriptor::new("div").ident(".card wide")).unwrap();
    assert_eq!(dom.classes(b), vec!["card", "wide"]);
}

#[test]
fn test_dimensions_attrs_and_nested_style() {
    let rt = UiRuntime::default();
    let dom = rt.dom();
    let node = create(
        dom,
        &Descriptor::new("div")
            .width(100)
            .height("50%")
            .padding(4.5)
            .attr("title", "hello")
            .style(StyleDesc::new().set("opacity", 0.5))
            .markup("<span>a</span><b>b</b>"),
    )
    .unwrap();
    // 嵌套样式只作用于已存在的子孙
    apply(dom, node, &Descriptor::new("div").style(StyleDesc::new().nest("span", StyleDesc::new().set("color", "red"))))
        .unwrap();
    assert_eq!(dom.style(node, "width").as_deref(), Some("100px"));
    assert_eq!(dom.style(node, "height").as_deref(), Some("50%"));
    assert_eq!(dom.style(node, "padding").as_deref(), Some("4.5px"));
    assert_eq!(dom.style(node, "opacity").as_deref(), Some("0.5"));
    assert_eq!(dom.attr(node, "title").as_deref(), Some("hello"));
    let span = dom.query(node, "span").unwrap();
    assert_eq!(dom.style(span, "color").as_deref(), Some("red"));
    let b = dom.query(node, "b").unwrap();
    assert_eq!(dom.style(b, "color"), None);
}

#[test]
fn test_non_object_style_is_ignored() {
    let rt = UiRuntime::default();
    let node = create(rt.dom(), &Descriptor::new("div").style_json(&json!("color: red"))).unwrap();
    assert_eq!(rt.dom().style(node, "color"), None);
}

#[test]
fn test_unknown_tag_yields_no_node() {
    let rt = UiRuntime::default();
    let dom = rt.dom();
    assert!(create(dom, &Descriptor::new("blink")).is_none());
    assert!(create(dom, &Descriptor::new("  ")).is_none());

    // 子描述失败时整个构造失败，不留下半成品
    let before = dom.descendants(dom.root()).len();
    let result = create(dom, &Descriptor::new("div").child(Descriptor::new("marquee")));
    assert!(result.is_none());
    assert!(rt.mount(&Descriptor::new("nope")).is_none());
    assert_eq!(dom.descendants(dom.root()).len(), before);
}

#[test]
fn test_children_applied_only_once() {
    let rt = UiRuntime::default();
    let dom = rt.dom();
    let desc = Descriptor::new("ul").children(["<li>1</li>", "<li>2</li>"]);
    let list = create(dom, &desc).unwrap();
    assert_eq!(dom.child_count(list), 2);
    apply(dom, list, &desc).unwrap();
    assert_eq!(dom.child_count(list), 2);
}

#[test]
fn test_tap_callback_is_replaced_on_reapply() {
    let rt = UiRuntime::default();
    let taps = Rc::new(Cell::new(0));
    let t = taps.clone();
    let desc = Descriptor::new("button").on_tap(listener(move |_| t.set(t.get() + 1)));
    let button = rt.mount(&desc).unwrap();
    apply(rt.dom(), button, &desc).unwrap();
    assert_eq!(rt.dom().listener_count(button), 1);
    rt.tap(button);
    assert_eq!(taps.get(), 1);
}

#[test]
fn test_data_is_bound_after_children() {
    let rt = UiRuntime::default();
    let dom = rt.dom();
    let name = dom.create_element("input");
    dom.set_binding(name, BindSpec::new(Marker::Value, "name"));
    let data = DataObject::new(json!({"name": "Ada", "title": "Hello"}));
    let form = rt
        .mount(
            &Descriptor::new("form")
                .child(name)
                .child(Descriptor::new("span").bind(BindSpec::new(Marker::Label, "title")))
                .data(data.clone()),
        )
        .unwrap();
    assert_eq!(dom.value(name), "Ada");
    let label = dom.query(form, ".bind-label").unwrap();
    assert_eq!(dom.text_content(label), "Hello");
    assert!(dom.bound_data(form).unwrap().source().ptr_eq(&data));

    // 后加入的输入框在重新应用描述前不会被绑定
    let late = bound_input(dom, form, "name");
    assert_eq!(dom.value(late), "");
}

#[test]
fn test_apply_rejects_text_nodes() {
    let rt = UiRuntime::default();
    let text = rt.dom().create_text("x");
    assert!(apply(rt.dom(), text, &Descriptor::new("div").ident("#x")).is_err());
}

#[test]
fn test_failed_construction_keeps_caller_nodes() {
    let rt = UiRuntime::default();
    let ctx = rt.context().clone();
    let dom = rt.dom();
    let checkbox = Checkbox::new(&ctx, false);

    // 嵌套标签无效时什么都不追加
    let result = create(dom, &Descriptor::new("div").child(checkbox.node()).child(Descriptor::new("blink")));
    assert!(result.is_none());
    assert!(dom.contains(checkbox.node()));
    assert_eq!(dom.parent(checkbox.node()), None);

    // 追加途中失败：已追加的调用方节点被摘下而不是销毁
    let gone = dom.create_element("span");
    dom.remove(gone);
    let nested = Checkbox::new(&ctx, false);
    let result = create(
        dom,
        &Descriptor::new("div")
            .child(checkbox.node())
            .child(Descriptor::new("label").child(nested.node()))
            .child(gone),
    );
    assert!(result.is_none());
    for node in [checkbox.node(), nested.node()] {
        assert!(dom.contains(node));
        assert_eq!(dom.parent(node), None);
        assert!(dom.control(node).is_some());
    }
    rt.tap(checkbox.node());
    assert!(checkbox.is_checked());
}
