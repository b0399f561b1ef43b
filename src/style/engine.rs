//! 样式引擎 - 把样式描述应用到节点及其匹配的子孙

use super::{StyleDesc, StyleEntry, StyleValue};
use crate::dom::{Dom, NodeId};
use crate::error::report;
use serde_json::Value as JsonValue;

/// 数值不追加 px 的属性
const UNITLESS: &[&str] = &[
    "opacity",
    "z-index",
    "flex-grow",
    "flex-shrink",
    "font-weight",
    "line-height",
    "order",
    "zoom",
];

const IMPORTANT: &str = "!important";

pub fn is_unitless(property: &str) -> bool {
    UNITLESS.contains(&property)
}

fn format_number(property: &str, n: f64) -> String {
    if is_unitless(property) {
        format!("{}", n)
    } else {
        format!("{}px", n)
    }
}

/// 格式化样式值，返回 (值, 优先级)
pub fn format_style_value(property: &str, value: &StyleValue) -> (String, Option<&'static str>) {
    match value {
        StyleValue::Number(n) => (format_number(property, *n), None),
        StyleValue::List(items) => {
            let parts: Vec<String> = items.iter().map(|v| format_style_value(property, v).0).collect();
            (parts.join(" "), None)
        }
        StyleValue::Text(s) => {
            let trimmed = s.trim_end();
            match trimmed.strip_suffix(IMPORTANT) {
                Some(v) => (v.trim_end().to_string(), Some("important")),
                None => (s.clone(), None),
            }
        }
    }
}

/// 应用样式描述：平铺项写到节点上，嵌套项递归到 scope 内匹配的子孙
pub fn apply_styles(dom: &Dom, node: NodeId, desc: &StyleDesc) {
    for entry in &desc.entries {
        match entry {
            StyleEntry::Property(property, value) => {
                let (v, priority) = format_style_value(property, value);
                dom.set_style_with_priority(node, property, &v, priority);
            }
            StyleEntry::Nested(selector, nested) => {
                for target in dom.query_all(node, selector) {
                    apply_styles(dom, target, nested);
                }
            }
        }
    }
}

/// JSON 形式的样式；非对象参数只上报不生效
pub fn apply_style_json(dom: &Dom, node: NodeId, style: &JsonValue) {
    match StyleDesc::from_json(style) {
        Ok(desc) => apply_styles(dom, node, &desc),
        Err(e) => report(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_list_and_important() {
        let dom = Dom::new();
        let n = dom.create_element("div");
        let desc = StyleDesc::new()
            .set("width", 10)
            .set("opacity", 0.5)
            .set("margin", [0, 4])
            .set("color", "red !important");
        apply_styles(&dom, n, &desc);
        assert_eq!(dom.style(n, "width").as_deref(), Some("10px"));
        assert_eq!(dom.style(n, "opacity").as_deref(), Some("0.5"));
        assert_eq!(dom.style(n, "margin").as_deref(), Some("0px 4px"));
        let color = dom.style_prop(n, "color").unwrap();
        assert_eq!(color.value, "red");
        assert_eq!(color.priority.as_deref(), Some("important"));
    }

    #[test]
    fn test_nested_selector_scoped_to_subtree() {
        let dom = Dom::new();
        let root = dom.root();
        dom.insert_markup(root, r#"<div id="a"><span class="x"></span></div><span class="x"></span>"#).unwrap();
        let a = dom.find_by_id("a").unwrap();
        apply_style_json(&dom, a, &json!({ ".x": { "height": 3 } }));
        let spans = dom.query_all(root, "span.x");
        assert_eq!(dom.style(spans[0], "height").as_deref(), Some("3px"));
        assert_eq!(dom.style(spans[1], "height"), None);
    }

    #[test]
    fn test_non_object_style_is_ignored() {
        let dom = Dom::new();
        let n = dom.create_element("div");
        apply_style_json(&dom, n, &json!("width: 3px"));
        assert!(dom.with_node(n, |n| n.style.is_empty()).unwrap());
    }
}
