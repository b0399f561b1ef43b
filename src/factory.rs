//! 元素工厂
//!
//! 由声明式描述构造一个视觉节点并做基线规范化：清零默认间距，
//! 表单控件去掉原生外观并使用相对字号。

use crate::binding::{bind_data, BindSpec, DataObject};
use crate::dom::{Dom, NodeId};
use crate::error::{report, UiError, UiResult};
use crate::event::{EventKind, Listener};
use crate::parser::MarkupParser;
use crate::style::{apply_styles, format_style_value, StyleDesc, StyleValue};
use once_cell::sync::Lazy;
use serde_json::Value as JsonValue;
use std::collections::HashSet;

/// 可识别的标签
pub const KNOWN_TAGS: &[&str] = &[
    "div", "span", "p", "a", "img", "canvas", "svg", "label", "form", "fieldset", "legend",
    "button", "input", "textarea", "select", "option",
    "table", "thead", "tbody", "tfoot", "tr", "th", "td",
    "ul", "ol", "li", "h1", "h2", "h3", "h4", "h5", "h6",
    "section", "header", "footer", "nav", "main", "article", "aside",
    "b", "i", "em", "strong", "small", "code", "pre", "br", "hr",
];

static KNOWN_TAG_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| KNOWN_TAGS.iter().copied().collect());

/// 需要去掉原生外观的表单控件
pub const FORM_CONTROL_TAGS: &[&str] = &["input", "textarea", "select", "button"];

/// 点击回调的监听器槽位，重复应用描述时替换
const TAP_SLOT: &str = "tap";

/// 尺寸：数字按 px 处理
#[derive(Debug, Clone, PartialEq)]
pub enum Dimension {
    Px(f64),
    Raw(String),
}

impl From<f64> for Dimension {
    fn from(v: f64) -> Self {
        Dimension::Px(v)
    }
}

impl From<i32> for Dimension {
    fn from(v: i32) -> Self {
        Dimension::Px(v as f64)
    }
}

impl From<&str> for Dimension {
    fn from(v: &str) -> Self {
        Dimension::Raw(v.to_string())
    }
}

/// 子节点
pub enum Child {
    Node(NodeId),
    /// 原始标记，解析后插入
    Markup(String),
    Descriptor(Box<Descriptor>),
}

impl From<NodeId> for Child {
    fn from(id: NodeId) -> Self {
        Child::Node(id)
    }
}

impl From<&str> for Child {
    fn from(markup: &str) -> Self {
        Child::Markup(markup.to_string())
    }
}

impl From<Descriptor> for Child {
    fn from(desc: Descriptor) -> Self {
        Child::Descriptor(Box::new(desc))
    }
}

/// 元素描述
pub struct Descriptor {
    tag: String,
    ident: Option<String>,
    attrs: Vec<(String, String)>,
    dimensions: Vec<(&'static str, Dimension)>,
    style: Option<StyleDesc>,
    data: Option<DataObject>,
    on_tap: Option<Listener>,
    bind: Option<BindSpec>,
    children: Vec<Child>,
}

impl Descriptor {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ident: None,
            attrs: Vec::new(),
            dimensions: Vec::new(),
            style: None,
            data: None,
            on_tap: None,
            bind: None,
            children: Vec::new(),
        }
    }

    /// "#name" 设置 id，".a b" 或 "a b" 设置类名
    pub fn ident(mut self, ident: &str) -> Self {
        self.ident = Some(ident.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn style(mut self, style: StyleDesc) -> Self {
        self.style = Some(style);
        self
    }

    /// JSON 样式描述；不是对象时报告并忽略
    pub fn style_json(mut self, style: &JsonValue) -> Self {
        match StyleDesc::from_json(style) {
            Ok(desc) => self.style = Some(desc),
            Err(e) => report(&e),
        }
        self
    }

    /// 子节点挂好之后以本节点为根绑定
    pub fn data(mut self, data: DataObject) -> Self {
        self.data = Some(data);
        self
    }

    pub fn on_tap(mut self, listener: Listener) -> Self {
        self.on_tap = Some(listener);
        self
    }

    pub fn bind(mut self, spec: BindSpec) -> Self {
        self.bind = Some(spec);
        self
    }

    pub fn width(self, v: impl Into<Dimension>) -> Self {
        self.dimension("width", v.into())
    }

    pub fn height(self, v: impl Into<Dimension>) -> Self {
        self.dimension("height", v.into())
    }

    pub fn margin(self, v: impl Into<Dimension>) -> Self {
        self.dimension("margin", v.into())
    }

    pub fn padding(self, v: impl Into<Dimension>) -> Self {
        self.dimension("padding", v.into())
    }

    fn dimension(mut self, property: &'static str, v: Dimension) -> Self {
        self.dimensions.push((property, v));
        self
    }

    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, C>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Child>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn markup(self, markup: &str) -> Self {
        self.child(Child::Markup(markup.to_string()))
    }
}

/// 构造节点；未知标签或子节点构造失败时报告并返回 None
pub fn create(dom: &Dom, desc: &Descriptor) -> Option<NodeId> {
    match validate(desc).and_then(|_| build(dom, desc)) {
        Ok(node) => Some(node),
        Err(e) => {
            report(&e);
            None
        }
    }
}

fn normalized_tag(desc: &Descriptor) -> UiResult<String> {
    let tag = desc.tag.trim().to_ascii_lowercase();
    if !KNOWN_TAG_SET.contains(tag.as_str()) {
        return Err(UiError::UnknownTag(desc.tag.clone()));
    }
    Ok(tag)
}

/// 追加任何子节点之前先检查嵌套描述的标签与标记
fn validate(desc: &Descriptor) -> UiResult<()> {
    normalized_tag(desc)?;
    for child in &desc.children {
        match child {
            Child::Node(_) => {}
            Child::Markup(markup) => {
                MarkupParser::new(markup).parse()?;
            }
            Child::Descriptor(d) => validate(d)?,
        }
    }
    Ok(())
}

fn build(dom: &Dom, desc: &Descriptor) -> UiResult<NodeId> {
    let tag = normalized_tag(desc)?;
    let node = dom.create_element(&tag);
    normalize(dom, node, &tag);
    if let Err(e) = apply(dom, node, desc) {
        // 不留下半成品节点，调用方传入的节点摘下后保留
        release_caller_nodes(dom, node, desc);
        dom.remove(node);
        return Err(e);
    }
    Ok(node)
}

fn release_caller_nodes(dom: &Dom, scope: NodeId, desc: &Descriptor) {
    for child in &desc.children {
        match child {
            Child::Node(id) if is_inside(dom, *id, scope) => dom.detach(*id),
            Child::Descriptor(d) => release_caller_nodes(dom, scope, d),
            _ => {}
        }
    }
}

fn is_inside(dom: &Dom, id: NodeId, scope: NodeId) -> bool {
    let mut current = dom.parent(id);
    while let Some(parent) = current {
        if parent == scope {
            return true;
        }
        current = dom.parent(parent);
    }
    false
}

fn normalize(dom: &Dom, node: NodeId, tag: &str) {
    dom.set_style(node, "margin", "0");
    dom.set_style(node, "padding", "0");
    if FORM_CONTROL_TAGS.contains(&tag) {
        dom.set_style(node, "border", "none");
        dom.set_style(node, "outline", "none");
        dom.set_style(node, "appearance", "none");
        dom.set_style(node, "font-size", "1em");
    }
}

/// 把描述应用到已有节点。已有子节点时跳过子节点，重复应用不会重复插入
pub fn apply(dom: &Dom, node: NodeId, desc: &Descriptor) -> UiResult<()> {
    match dom.with_node(node, |n| n.is_element()) {
        None => return Err(UiError::DetachedNode),
        Some(false) => return Err(UiError::NotAnElement),
        Some(true) => {}
    }

    if let Some(ident) = desc.ident.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        match ident.strip_prefix('#') {
            Some(id) => dom.set_id(node, id)?,
            None => {
                for class in ident.split_whitespace() {
                    dom.add_class(node, class.trim_start_matches('.'));
                }
            }
        }
    }
    for (name, value) in &desc.attrs {
        dom.set_attr(node, name, value);
    }
    for (property, dimension) in &desc.dimensions {
        let value = match dimension {
            Dimension::Px(n) => format_style_value(property, &StyleValue::Number(*n)).0,
            Dimension::Raw(s) => s.clone(),
        };
        dom.set_style(node, property, &value);
    }
    if let Some(style) = &desc.style {
        apply_styles(dom, node, style);
    }
    if let Some(l) = &desc.on_tap {
        dom.set_listener(node, EventKind::Tap, TAP_SLOT, l.clone());
    }
    if let Some(spec) = &desc.bind {
        dom.set_binding(node, spec.clone());
    }

    if dom.child_count(node) == 0 {
        for child in &desc.children {
            match child {
                Child::Node(id) => dom.append_child(node, *id)?,
                Child::Markup(markup) => {
                    dom.insert_markup(node, markup)?;
                }
                Child::Descriptor(d) => {
                    let id = build(dom, d)?;
                    dom.append_child(node, id)?;
                }
            }
        }
    } else if !desc.children.is_empty() {
        tracing::debug!("node already has children, skipping");
    }

    if let Some(data) = &desc.data {
        if let Some(bound) = bind_data(dom, Some(data), node) {
            dom.set_bound_data(node, bound);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_conversion() {
        assert_eq!(Dimension::from(12), Dimension::Px(12.0));
        assert_eq!(Dimension::from("50%"), Dimension::Raw("50%".to_string()));
    }
}
