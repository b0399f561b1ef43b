//! 标记解析：字符串子节点按原始标记插入

pub mod markup;

pub use markup::{MarkupNode, MarkupNodeType, MarkupParser};
