//! 视觉树：节点存储、查询、事件分发

mod document;
mod node;

pub(crate) use document::Arena;
pub use document::{Dom, WeakDom};
pub use node::{Node, NodeId, NodeKind, StyleProp};
