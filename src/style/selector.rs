//! 选择器匹配
//!
//! 支持 `*`、`tag`、`.class`、`#id`、复合选择器（`td.num`）、
//! 后代组合符（空格）与逗号分组。

use crate::dom::{Arena, Node, NodeId};

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn parse(s: &str) -> Option<Self> {
        let mut compound = Compound::default();
        let mut current = String::new();
        // 当前片段的前缀：'\0' 表示标签
        let mut kind = '\0';
        let flush = |kind: char, current: &mut String, c: &mut Compound| {
            if current.is_empty() {
                return;
            }
            let part = std::mem::take(current);
            match kind {
                '.' => c.classes.push(part),
                '#' => c.id = Some(part),
                _ => c.tag = Some(part.to_ascii_lowercase()),
            }
        };
        for ch in s.chars() {
            match ch {
                '.' | '#' => {
                    flush(kind, &mut current, &mut compound);
                    kind = ch;
                }
                '*' if current.is_empty() && kind == '\0' => {}
                _ => current.push(ch),
            }
        }
        flush(kind, &mut current, &mut compound);
        if s.is_empty() {
            return None;
        }
        Some(compound)
    }

    fn matches(&self, node: &Node) -> bool {
        if !node.is_element() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if &node.tag != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.id.as_ref() != Some(id) {
                return false;
            }
        }
        self.classes.iter().all(|c| node.has_class(c))
    }
}

/// 解析后的选择器
#[derive(Debug, Clone, Default)]
pub struct Selector {
    alternatives: Vec<Vec<Compound>>,
}

impl Selector {
    pub fn parse(selector: &str) -> Self {
        let alternatives = selector
            .split(',')
            .map(|alt| alt.split_whitespace().filter_map(Compound::parse).collect::<Vec<_>>())
            .filter(|chain| !chain.is_empty())
            .collect();
        Self { alternatives }
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// 节点是否匹配，祖先只在 scope（含）以内查找
    pub(crate) fn matches(&self, arena: &Arena, id: NodeId, scope: NodeId) -> bool {
        self.alternatives.iter().any(|chain| Self::matches_chain(chain, arena, id, scope))
    }

    fn matches_chain(chain: &[Compound], arena: &Arena, id: NodeId, scope: NodeId) -> bool {
        let (last, rest) = match chain.split_last() {
            Some(x) => x,
            None => return false,
        };
        match arena.get(id) {
            Some(node) if last.matches(node) => {}
            _ => return false,
        }
        // 从右往左贪心匹配祖先
        let mut remaining = rest.iter().rev().peekable();
        let mut current = id;
        while remaining.peek().is_some() {
            if current == scope {
                return false;
            }
            current = match arena.parent(current) {
                Some(p) => p,
                None => return false,
            };
            if let (Some(wanted), Some(node)) = (remaining.peek(), arena.get(current)) {
                if wanted.matches(node) {
                    remaining.next();
                }
            }
        }
        true
    }
}
