//! 样式：样式描述、样式引擎、选择器与样式注册表

mod engine;
pub mod registry;
pub mod selector;

pub use engine::{apply_style_json, apply_styles, format_style_value, is_unitless};
pub use registry::{StyleRegistry, StyleRule};

use crate::error::{UiError, UiResult};
use serde_json::Value as JsonValue;

/// 样式值
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    /// 数值，非无单位属性会追加 px
    Number(f64),
    Text(String),
    /// 以空格连接的简写（如 margin: [0, 4]）
    List(Vec<StyleValue>),
}

impl From<f64> for StyleValue {
    fn from(v: f64) -> Self {
        StyleValue::Number(v)
    }
}

impl From<f32> for StyleValue {
    fn from(v: f32) -> Self {
        StyleValue::Number(v as f64)
    }
}

impl From<i32> for StyleValue {
    fn from(v: i32) -> Self {
        StyleValue::Number(v as f64)
    }
}

impl From<&str> for StyleValue {
    fn from(v: &str) -> Self {
        StyleValue::Text(v.to_string())
    }
}

impl From<String> for StyleValue {
    fn from(v: String) -> Self {
        StyleValue::Text(v)
    }
}

impl<T: Into<StyleValue>> From<Vec<T>> for StyleValue {
    fn from(v: Vec<T>) -> Self {
        StyleValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<StyleValue>, const N: usize> From<[T; N]> for StyleValue {
    fn from(v: [T; N]) -> Self {
        StyleValue::List(v.into_iter().map(Into::into).collect())
    }
}

/// 样式描述中的一项
#[derive(Debug, Clone, PartialEq)]
pub enum StyleEntry {
    Property(String, StyleValue),
    /// 以选择器为键，作用于匹配的子孙节点
    Nested(String, StyleDesc),
}

/// 样式描述（可嵌套）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleDesc {
    pub entries: Vec<StyleEntry>,
}

impl StyleDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, property: &str, value: impl Into<StyleValue>) -> Self {
        self.entries.push(StyleEntry::Property(property.to_string(), value.into()));
        self
    }

    pub fn nest(mut self, selector: &str, desc: StyleDesc) -> Self {
        self.entries.push(StyleEntry::Nested(selector.to_string(), desc));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 从 JSON 对象构造；嵌套对象视为选择器块
    pub fn from_json(value: &JsonValue) -> UiResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| UiError::InvalidStyle(format!("expected an object, got {}", value)))?;
        let mut desc = StyleDesc::new();
        for (key, v) in map {
            match v {
                JsonValue::Object(_) => desc = desc.nest(key, Self::from_json(v)?),
                other => match Self::json_to_value(other) {
                    Some(sv) => desc = desc.set(key, sv),
                    None => tracing::debug!(property = %key, "skipping non-style value"),
                },
            }
        }
        Ok(desc)
    }

    fn json_to_value(v: &JsonValue) -> Option<StyleValue> {
        match v {
            JsonValue::Number(n) => n.as_f64().map(StyleValue::Number),
            JsonValue::String(s) => Some(StyleValue::Text(s.clone())),
            JsonValue::Array(items) => Some(StyleValue::List(items.iter().filter_map(Self::json_to_value).collect())),
            _ => None,
        }
    }
}

/// 解析内联样式字符串 "a: b; c: d"
pub fn parse_inline_style(style_str: &str) -> Vec<(String, String)> {
    let mut styles = Vec::new();

    for part in style_str.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some(colon_pos) = part.find(':') {
            let name = part[..colon_pos].trim().to_ascii_lowercase();
            let value = part[colon_pos + 1..].trim().to_string();
            if !name.is_empty() {
                styles.push((name, value));
            }
        }
    }

    styles
}
