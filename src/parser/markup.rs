//! 标记解析器

use crate::error::{UiError, UiResult};

/// 无结束标签的元素
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link", "col"];

/// 标记节点类型
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNodeType {
    Element,
    Text,
}

/// 标记节点
#[derive(Debug, Clone)]
pub struct MarkupNode {
    pub node_type: MarkupNodeType,
    pub tag_name: String,
    /// 保持书写顺序
    pub attributes: Vec<(String, String)>,
    pub children: Vec<MarkupNode>,
    pub text_content: String,
}

impl MarkupNode {
    pub fn new_element(tag_name: &str) -> Self {
        Self {
            node_type: MarkupNodeType::Element,
            tag_name: tag_name.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
            text_content: String::new(),
        }
    }

    pub fn new_text(content: &str) -> Self {
        Self {
            node_type: MarkupNodeType::Text,
            tag_name: String::new(),
            attributes: Vec::new(),
            children: Vec::new(),
            text_content: decode_entities(content),
        }
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

/// 标记解析器
pub struct MarkupParser {
    input: Vec<char>,
    pos: usize,
}

impl MarkupParser {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    pub fn parse(&mut self) -> UiResult<Vec<MarkupNode>> {
        let mut nodes = Vec::new();

        while self.pos < self.input.len() {
            if self.starts_with("<!--") {
                self.parse_comment();
            } else if self.current_char() == '<' {
                if self.starts_with("</") {
                    break; // 结束标签，返回上层
                }
                nodes.push(self.parse_element()?);
            } else if let Some(text) = self.parse_text() {
                if !text.text_content.trim().is_empty() {
                    nodes.push(text);
                }
            }
        }

        Ok(nodes)
    }

    fn parse_element(&mut self) -> UiResult<MarkupNode> {
        self.expect('<')?;

        let tag_name = self.parse_name(false);
        if tag_name.is_empty() {
            return Err(UiError::Markup("empty tag name".to_string()));
        }

        let mut node = MarkupNode::new_element(&tag_name);

        // 解析属性
        loop {
            self.skip_whitespace();
            if self.pos >= self.input.len() {
                return Err(UiError::Markup(format!("unterminated tag <{}>", tag_name)));
            }
            if self.current_char() == '>' || self.starts_with("/>") {
                break;
            }

            let (name, value) = self.parse_attribute()?;
            node.attributes.push((name, value));
        }

        // 自闭合标签
        if self.starts_with("/>") {
            self.pos += 2;
            return Ok(node);
        }

        self.expect('>')?;

        if VOID_TAGS.contains(&node.tag_name.as_str()) {
            return Ok(node);
        }

        // 解析子节点
        node.children = self.parse()?;

        // 解析结束标签
        if self.starts_with("</") {
            self.pos += 2;
            let end_tag = self.parse_name(false);
            if !end_tag.eq_ignore_ascii_case(&tag_name) {
                return Err(UiError::Markup(format!("mismatched tags: {} vs {}", tag_name, end_tag)));
            }
            self.skip_whitespace();
            self.expect('>')?;
        }

        Ok(node)
    }

    fn parse_name(&mut self, attribute: bool) -> String {
        let mut name = String::new();
        while self.pos < self.input.len() {
            let c = self.current_char();
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ':' || (attribute && c == '.') {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        name
    }

    fn parse_attribute(&mut self) -> UiResult<(String, String)> {
        let name = self.parse_name(true);
        if name.is_empty() {
            return Err(UiError::Markup(format!("unexpected '{}' in tag", self.current_char())));
        }

        self.skip_whitespace();

        if self.current_char() != '=' {
            return Ok((name, String::new()));
        }

        self.advance(); // skip '='
        self.skip_whitespace();

        let value = self.parse_attribute_value();

        Ok((name, decode_entities(&value)))
    }

    fn parse_attribute_value(&mut self) -> String {
        let quote = self.current_char();
        if quote != '"' && quote != '\'' {
            // 无引号值
            let mut value = String::new();
            while self.pos < self.input.len() {
                let c = self.current_char();
                if c.is_whitespace() || c == '>' || c == '/' {
                    break;
                }
                value.push(c);
                self.advance();
            }
            return value;
        }

        self.advance(); // skip opening quote

        let mut value = String::new();
        while self.pos < self.input.len() && self.current_char() != quote {
            value.push(self.current_char());
            self.advance();
        }

        if self.pos < self.input.len() {
            self.advance(); // skip closing quote
        }

        value
    }

    fn parse_text(&mut self) -> Option<MarkupNode> {
        let mut text = String::new();
        while self.pos < self.input.len() && self.current_char() != '<' {
            text.push(self.current_char());
            self.advance();
        }

        if text.is_empty() {
            None
        } else {
            Some(MarkupNode::new_text(&text))
        }
    }

    fn parse_comment(&mut self) {
        self.pos += 4;
        while self.pos < self.input.len() && !self.starts_with("-->") {
            self.advance();
        }
        self.pos = (self.pos + 3).min(self.input.len());
    }

    fn current_char(&self) -> char {
        self.input.get(self.pos).copied().unwrap_or('\0')
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.input.get(self.pos + i) == Some(&c))
    }

    fn expect(&mut self, c: char) -> UiResult<()> {
        if self.current_char() == c {
            self.advance();
            Ok(())
        } else {
            Err(UiError::Markup(format!("expected '{}', got '{}'", c, self.current_char())))
        }
    }
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}
