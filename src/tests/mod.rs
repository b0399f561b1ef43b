//! 单元测试模块
//! 覆盖绑定引擎、控件、观察列表、元素工厂与动画

pub mod datetime_tests;
pub mod factory_tests;
pub mod observed_list_tests;

use crate::binding::{keypath, BindSpec, Marker};
use crate::controls::RowFactory;
use crate::dom::{Dom, NodeId};
use crate::UiRuntime;
use std::rc::Rc;

/// 创建已挂到根节点的绑定输入框
pub(crate) fn bound_input(dom: &Dom, parent: NodeId, key_path: &str) -> NodeId {
    let input = dom.create_element("input");
    dom.set_binding(input, BindSpec::new(Marker::Value, key_path));
    dom.append_child(parent, input).unwrap();
    input
}

/// 挂在根节点下的空容器
pub(crate) fn container(rt: &UiRuntime) -> NodeId {
    let form = rt.dom().create_element("form");
    rt.dom().append_child(rt.dom().root(), form).unwrap();
    form
}

/// 每条记录渲染为一行，行文本为记录的显示文本
pub(crate) fn text_rows() -> RowFactory {
    Rc::new(|dom: &Dom, item: &serde_json::Value, _index: usize| {
        let tr = dom.create_element("tr");
        dom.set_text(tr, &keypath::display(item));
        Some(tr)
    })
}

/// 容器里各行的文本
pub(crate) fn row_texts(dom: &Dom, container: NodeId) -> Vec<String> {
    dom.children(container).into_iter().map(|r| dom.text_content(r)).collect()
}
