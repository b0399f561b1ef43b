//! 样式注册表 - 进程内样式表服务
//!
//! 每个运行时持有独立实例，测试之间互不干扰。

use super::{format_style_value, StyleDesc, StyleEntry};

/// 样式规则
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    pub selector: String,
    /// (属性, 值, 优先级)，按首次写入顺序
    pub declarations: Vec<(String, String, Option<String>)>,
}

impl StyleRule {
    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations.iter().find(|(p, _, _)| p == property).map(|(_, v, _)| v.as_str())
    }

    fn upsert(&mut self, property: &str, value: String, priority: Option<String>) {
        match self.declarations.iter_mut().find(|(p, _, _)| p == property) {
            Some(entry) => {
                entry.1 = value;
                entry.2 = priority;
            }
            None => self.declarations.push((property.to_string(), value, priority)),
        }
    }
}

/// 样式注册表
#[derive(Debug, Default)]
pub struct StyleRegistry {
    rules: Vec<StyleRule>,
    active: bool,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self) {
        if !self.active {
            self.active = true;
            tracing::debug!("style registry initialised");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 清空全部规则
    pub fn teardown(&mut self) {
        self.rules.clear();
        self.active = false;
    }

    /// 合并写入规则；嵌套块展开为后代选择器规则
    pub fn upsert_rule(&mut self, selector: &str, declarations: &StyleDesc) {
        if !self.active {
            self.init();
        }
        let selector = selector.trim();
        for entry in &declarations.entries {
            match entry {
                StyleEntry::Property(property, value) => {
                    let (v, priority) = format_style_value(property, value);
                    self.rule_mut(selector).upsert(property, v, priority.map(str::to_string));
                }
                StyleEntry::Nested(nested, desc) => {
                    let combined: Vec<String> = nested
                        .split(',')
                        .map(|n| format!("{} {}", selector, n.trim()))
                        .collect();
                    self.upsert_rule(&combined.join(", "), desc);
                }
            }
        }
    }

    fn rule_mut(&mut self, selector: &str) -> &mut StyleRule {
        let index = match self.rules.iter().position(|r| r.selector == selector) {
            Some(i) => i,
            None => {
                self.rules.push(StyleRule { selector: selector.to_string(), declarations: Vec::new() });
                self.rules.len() - 1
            }
        };
        &mut self.rules[index]
    }

    pub fn rule(&self, selector: &str) -> Option<&StyleRule> {
        self.rules.iter().find(|r| r.selector == selector.trim())
    }

    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    /// 渲染为样式表文本
    pub fn css_text(&self) -> String {
        let mut out = String::new();
        for rule in &self.rules {
            out.push_str(&rule.selector);
            out.push_str(" {");
            for (property, value, priority) in &rule.declarations {
                out.push(' ');
                out.push_str(property);
                out.push_str(": ");
                out.push_str(value);
                if let Some(p) = priority {
                    out.push_str(" !");
                    out.push_str(p);
                }
                out.push(';');
            }
            out.push_str(" }\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_merges_and_flattens() {
        let mut reg = StyleRegistry::new();
        reg.init();
        reg.upsert_rule(".a", &StyleDesc::new().set("width", 4).nest(".b", StyleDesc::new().set("color", "red")));
        reg.upsert_rule(".a", &StyleDesc::new().set("width", 8).set("top", "0 !important"));
        assert_eq!(reg.rules().len(), 2);
        assert_eq!(reg.rule(".a").unwrap().get("width"), Some("8px"));
        assert_eq!(reg.rule(".a .b").unwrap().get("color"), Some("red"));
        assert!(reg.css_text().contains(".a { width: 8px; top: 0 !important; }"));
    }

    #[test]
    fn test_instances_are_isolated() {
        let mut a = StyleRegistry::new();
        let b = StyleRegistry::new();
        a.upsert_rule("div", &StyleDesc::new().set("margin", 0));
        assert!(a.is_active());
        assert!(b.rules().is_empty());
        a.teardown();
        assert!(a.rules().is_empty());
        assert!(!a.is_active());
    }
}
