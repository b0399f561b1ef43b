//! 可绑定控件
//!
//! 每个控件是一个带私有状态机的句柄，克隆共享同一份状态；
//! 构造时把自己注册到节点上，供绑定引擎通过 [`BindableControl`] 访问。
//!
//! [`BindableControl`]: crate::binding::BindableControl

mod checkbox;
mod datetime;
mod observed_list;
mod select;
mod slider;
mod table;

pub use checkbox::Checkbox;
pub use datetime::{DateTimeField, DateTimeMode, PickerState};
pub use observed_list::{ObservedList, RowFactory, RowHook, RowOrigin, PLACEHOLDER_CLASS};
pub use select::{Select, SelectHandler, SelectState};
pub use slider::{snap, Slider};
pub use table::{sort_rows, Column, SortState, Table};

use crate::binding::DataBindHandler;
use crate::dom::{Dom, NodeId};
use serde_json::Value as JsonValue;
use std::cell::RefCell;

/// 节点当前绑定的键路径
pub(crate) fn key_path_of(dom: &Dom, node: NodeId) -> Option<String> {
    dom.binding(node).map(|spec| spec.key_path)
}

/// 整数值写成 JSON 整数
pub(crate) fn number_value(value: f64) -> JsonValue {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        JsonValue::from(value as i64)
    } else {
        serde_json::Number::from_f64(value).map(JsonValue::Number).unwrap_or(JsonValue::Null)
    }
}

pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// 调用写回钩子；节点未绑定时跳过
pub(crate) fn notify_bind(dom: &Dom, node: NodeId, handler: &RefCell<Option<DataBindHandler>>, value: &JsonValue) {
    let handler = handler.borrow().clone();
    if let (Some(handler), Some(key_path)) = (handler, key_path_of(dom, node)) {
        handler(value, &key_path);
    }
}
