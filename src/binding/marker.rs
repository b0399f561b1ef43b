//! 绑定标记与绑定描述

use serde_json::Value as JsonValue;
use std::fmt;
use std::rc::Rc;

/// 绑定标记，决定由哪个适配器处理节点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    Value,
    Selection,
    Slider,
    Checkbox,
    Table,
    Label,
}

impl Marker {
    pub const ALL: [Marker; 6] = [
        Marker::Value,
        Marker::Selection,
        Marker::Slider,
        Marker::Checkbox,
        Marker::Table,
        Marker::Label,
    ];

    pub fn class_name(self) -> &'static str {
        match self {
            Marker::Value => "bind-value",
            Marker::Selection => "bind-selection",
            Marker::Slider => "bind-slider",
            Marker::Checkbox => "bind-checkbox",
            Marker::Table => "bind-table",
            Marker::Label => "bind-label",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Marker::Value => "value",
            Marker::Selection => "selection",
            Marker::Slider => "slider",
            Marker::Checkbox => "checkbox",
            Marker::Table => "table",
            Marker::Label => "label",
        }
    }

    /// 需要节点上注册控件的标记
    pub fn needs_control(self) -> bool {
        matches!(self, Marker::Selection | Marker::Slider | Marker::Checkbox | Marker::Table)
    }
}

type Transform = Rc<dyn Fn(&JsonValue) -> JsonValue>;

/// 值变换：读时应用；写回时优先用逆变换，没有逆变换则再次应用读变换
#[derive(Clone)]
pub struct DataHandler {
    read: Transform,
    inverse: Option<Transform>,
}

impl DataHandler {
    pub fn new<F>(read: F) -> Self
    where
        F: Fn(&JsonValue) -> JsonValue + 'static,
    {
        Self { read: Rc::new(read), inverse: None }
    }

    pub fn with_inverse<F, G>(read: F, inverse: G) -> Self
    where
        F: Fn(&JsonValue) -> JsonValue + 'static,
        G: Fn(&JsonValue) -> JsonValue + 'static,
    {
        Self { read: Rc::new(read), inverse: Some(Rc::new(inverse)) }
    }

    pub fn read(&self, value: &JsonValue) -> JsonValue {
        (self.read)(value)
    }

    pub fn write(&self, value: &JsonValue) -> JsonValue {
        match &self.inverse {
            Some(inv) => inv(value),
            None => (self.read)(value),
        }
    }
}

impl fmt::Debug for DataHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataHandler").field("has_inverse", &self.inverse.is_some()).finish()
    }
}

/// 节点上的绑定描述
#[derive(Debug, Clone)]
pub struct BindSpec {
    pub marker: Marker,
    pub key_path: String,
    /// 列表项里用于匹配的键
    pub value_key: Option<String>,
    pub data_handler: Option<DataHandler>,
}

impl BindSpec {
    pub fn new(marker: Marker, key_path: &str) -> Self {
        Self { marker, key_path: key_path.to_string(), value_key: None, data_handler: None }
    }

    pub fn value_key(mut self, key: &str) -> Self {
        self.value_key = Some(key.to_string());
        self
    }

    pub fn data_handler(mut self, handler: DataHandler) -> Self {
        self.data_handler = Some(handler);
        self
    }

    pub fn read(&self, value: JsonValue) -> JsonValue {
        match &self.data_handler {
            Some(h) => h.read(&value),
            None => value,
        }
    }

    pub fn write(&self, value: &JsonValue) -> JsonValue {
        match &self.data_handler {
            Some(h) => h.write(value),
            None => value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_control_markers_need_a_control() {
        let needing: Vec<Marker> = Marker::ALL.into_iter().filter(|m| m.needs_control()).collect();
        assert_eq!(needing.len(), 4);
        assert!(!Marker::Value.needs_control());
        assert!(!Marker::Label.needs_control());
    }
}
