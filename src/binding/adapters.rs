//! 文本输入与标签适配器
//!
//! 这两类节点没有独立的控件状态，适配器在绑定时临时构造。

use super::control::{BindableControl, ControlValue, DataBindHandler};
use super::keypath;
use crate::dom::{Dom, NodeId};
use crate::event::{listener, EventKind};
use serde_json::Value as JsonValue;

/// 绑定监听器所在的槽位
pub const BIND_SLOT: &str = "bind";

/// input / textarea：编辑中和失焦时各写回一次
pub struct TextInput {
    node: NodeId,
}

impl TextInput {
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }

    /// 按 input 类型把文本转换为数据值
    pub fn parse_input(dom: &Dom, node: NodeId, text: &str) -> JsonValue {
        let input_type = dom.attr(node, "type").unwrap_or_default();
        match input_type.as_str() {
            "number" | "range" => {
                if text.trim().is_empty() {
                    return JsonValue::Null;
                }
                match text.trim().parse::<f64>() {
                    Ok(n) => serde_json::Number::from_f64(n)
                        .map(|num| {
                            if n.fract() == 0.0 && n.abs() < 9.0e15 {
                                JsonValue::from(n as i64)
                            } else {
                                JsonValue::Number(num)
                            }
                        })
                        .unwrap_or(JsonValue::Null),
                    Err(_) => JsonValue::String(text.to_string()),
                }
            }
            _ => JsonValue::String(text.to_string()),
        }
    }
}

impl BindableControl for TextInput {
    fn get_value(&self, dom: &Dom) -> ControlValue {
        ControlValue::Text(dom.value(self.node))
    }

    fn set_value(&self, dom: &Dom, value: ControlValue) {
        if let ControlValue::Text(s) = value {
            dom.set_value(self.node, &s);
        }
    }

    fn on_change(&self, dom: &Dom, handler: DataBindHandler) {
        let node = self.node;
        for kind in [EventKind::Input, EventKind::Blur] {
            let handler = handler.clone();
            dom.set_listener(
                node,
                kind,
                BIND_SLOT,
                listener(move |ev| {
                    let Some(spec) = ev.dom.binding(node) else { return };
                    let value = TextInput::parse_input(ev.dom, node, &ev.dom.value(node));
                    handler(&value, &spec.key_path);
                }),
            );
        }
    }
}

/// 标签：重新绑定时清空并重写文本
pub struct Label {
    node: NodeId,
}

impl Label {
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }
}

impl BindableControl for Label {
    fn get_value(&self, dom: &Dom) -> ControlValue {
        ControlValue::Text(dom.text_content(self.node))
    }

    fn set_value(&self, dom: &Dom, value: ControlValue) {
        if let ControlValue::Text(s) = value {
            dom.set_text(self.node, &s);
        }
    }

    fn on_change(&self, _dom: &Dom, _handler: DataBindHandler) {}
}

/// 数据值转为控件值
pub(crate) fn text_value(value: &JsonValue) -> ControlValue {
    ControlValue::Text(keypath::display(value))
}
