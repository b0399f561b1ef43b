//! 视觉树节点

use crate::binding::{BindSpec, BindableControl, BoundData};
use crate::event::{EventKind, Listener};
use crate::Rect;
use std::collections::BTreeMap;
use std::rc::Rc;

/// 节点句柄（代际索引，移除后的旧句柄不会指向新节点）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// 节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
}

/// 内联样式项
#[derive(Debug, Clone, PartialEq)]
pub struct StyleProp {
    pub value: String,
    /// 目前只有 "important"
    pub priority: Option<String>,
}

pub(crate) struct ListenerEntry {
    pub kind: EventKind,
    /// 带槽位的监听器在重复注册时替换而不是叠加
    pub slot: Option<String>,
    pub listener: Listener,
}

/// 视觉节点
pub struct Node {
    pub kind: NodeKind,
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub style: BTreeMap<String, StyleProp>,
    /// 文本节点内容
    pub text: String,
    /// 表单值
    pub value: String,
    pub checked: bool,
    pub scroll_top: f32,
    /// 布局盒
    pub rect: Rect,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) listeners: Vec<ListenerEntry>,
    pub(crate) binding: Option<BindSpec>,
    pub(crate) control: Option<Rc<dyn BindableControl>>,
    pub(crate) bound_data: Option<BoundData>,
}

impl Node {
    pub fn new_element(tag: &str) -> Self {
        Self::new(NodeKind::Element, tag.to_ascii_lowercase(), String::new())
    }

    pub fn new_text(content: &str) -> Self {
        Self::new(NodeKind::Text, String::new(), content.to_string())
    }

    fn new(kind: NodeKind, tag: String, text: String) -> Self {
        Self {
            kind,
            tag,
            id: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            style: BTreeMap::new(),
            text,
            value: String::new(),
            checked: false,
            scroll_top: 0.0,
            rect: Rect::default(),
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
            binding: None,
            control: None,
            bound_data: None,
        }
    }

    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes.iter().any(|c| c == class_name)
    }

    pub fn style_value(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(|p| p.value.as_str())
    }
}
