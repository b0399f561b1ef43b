//! 视觉树文档
//!
//! `Dom` 是廉价可克隆的单线程句柄。所有方法只在内部短暂借用，
//! 调用监听器、控件回调之前一定先释放借用，回调里可以继续操作文档。

use super::node::{ListenerEntry, Node, NodeId, NodeKind, StyleProp};
use crate::binding::{BindSpec, BindableControl, BoundData};
use crate::error::{UiError, UiResult};
use crate::event::{Event, EventCtx, EventKind, Listener};
use crate::parser::markup::{MarkupNode, MarkupNodeType, MarkupParser};
use crate::style::selector::Selector;
use crate::Rect;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// 节点存储
pub(crate) struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    focused: Option<NodeId>,
}

impl Arena {
    fn new() -> Self {
        let mut arena = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId { index: 0, generation: 0 },
            focused: None,
        };
        arena.root = arena.insert(Node::new_element("body"));
        arena
    }

    fn insert(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId { index, generation: slot.generation };
        }
        self.slots.push(Slot { generation: 0, node: Some(node) });
        NodeId { index: (self.slots.len() - 1) as u32, generation: 0 }
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    fn element_mut(&mut self, id: NodeId) -> UiResult<&mut Node> {
        let node = self.get_mut(id).ok_or(UiError::DetachedNode)?;
        if !node.is_element() {
            return Err(UiError::NotAnElement);
        }
        Ok(node)
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            if let Some(p) = self.get_mut(parent) {
                p.children.retain(|c| *c != id);
            }
        }
        if let Some(n) = self.get_mut(id) {
            n.parent = None;
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.parent(node) {
                Some(p) => node = p,
                None => return false,
            }
        }
    }

    /// 销毁子树，释放监听器与控件状态
    fn destroy(&mut self, id: NodeId) {
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let slot = match self.slots.get_mut(current.index as usize) {
                Some(s) if s.generation == current.generation => s,
                _ => continue,
            };
            if let Some(node) = slot.node.take() {
                stack.extend(node.children.iter().copied());
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
            }
            if self.focused == Some(current) {
                self.focused = None;
            }
        }
    }

    /// 先序遍历子孙节点（不含 scope 自身）
    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.get(scope) {
            Some(n) => n.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(id) = stack.pop() {
            if let Some(n) = self.get(id) {
                out.push(id);
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }
}

/// 视觉树句柄
#[derive(Clone)]
pub struct Dom {
    inner: Rc<RefCell<Arena>>,
}

/// 不持有所有权的文档句柄，供长期存活的闭包使用
#[derive(Clone)]
pub struct WeakDom {
    inner: Weak<RefCell<Arena>>,
}

impl WeakDom {
    pub fn upgrade(&self) -> Option<Dom> {
        self.inner.upgrade().map(|inner| Dom { inner })
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        Self { inner: Rc::new(RefCell::new(Arena::new())) }
    }

    pub fn downgrade(&self) -> WeakDom {
        WeakDom { inner: Rc::downgrade(&self.inner) }
    }

    pub fn ptr_eq(&self, other: &Dom) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// 文档根节点（body）
    pub fn root(&self) -> NodeId {
        self.inner.borrow().root
    }

    /// 只读访问节点
    pub fn with_node<R>(&self, id: NodeId, f: impl FnOnce(&Node) -> R) -> Option<R> {
        self.inner.borrow().get(id).map(f)
    }

    /// 可变访问节点，闭包里不能再操作文档
    pub fn with_node_mut<R>(&self, id: NodeId, f: impl FnOnce(&mut Node) -> R) -> Option<R> {
        self.inner.borrow_mut().get_mut(id).map(f)
    }

    fn with_element_mut<R>(&self, id: NodeId, f: impl FnOnce(&mut Node) -> R) -> UiResult<R> {
        let mut arena = self.inner.borrow_mut();
        arena.element_mut(id).map(f)
    }

    // ---- 树结构 ----

    pub fn create_element(&self, tag: &str) -> NodeId {
        self.inner.borrow_mut().insert(Node::new_element(tag))
    }

    pub fn create_text(&self, text: &str) -> NodeId {
        self.inner.borrow_mut().insert(Node::new_text(text))
    }

    /// 节点仍然存活（未被销毁）
    pub fn contains(&self, id: NodeId) -> bool {
        self.inner.borrow().get(id).is_some()
    }

    /// 节点挂在文档根下
    pub fn is_attached(&self, id: NodeId) -> bool {
        let arena = self.inner.borrow();
        arena.get(id).is_some() && arena.is_ancestor_or_self(arena.root, id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.inner.borrow().parent(id)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.with_node(id, |n| n.children.clone()).unwrap_or_default()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.with_node(id, |n| n.children.len()).unwrap_or(0)
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> UiResult<()> {
        let len = self.child_count(parent);
        self.insert_at(parent, len, child)
    }

    /// 在指定下标插入，下标越界时追加
    pub fn insert_at(&self, parent: NodeId, index: usize, child: NodeId) -> UiResult<()> {
        let mut arena = self.inner.borrow_mut();
        arena.element_mut(parent)?;
        if arena.get(child).is_none() {
            return Err(UiError::DetachedNode);
        }
        // 不允许把祖先插到自己下面
        if arena.is_ancestor_or_self(child, parent) {
            return Err(UiError::NotAnElement);
        }
        arena.detach(child);
        let p = arena.element_mut(parent)?;
        let index = index.min(p.children.len());
        p.children.insert(index, child);
        if let Some(c) = arena.get_mut(child) {
            c.parent = Some(parent);
        }
        Ok(())
    }

    /// 从父节点摘下，节点本身保留
    pub fn detach(&self, id: NodeId) {
        self.inner.borrow_mut().detach(id);
    }

    /// 摘下并销毁整棵子树
    pub fn remove(&self, id: NodeId) {
        // 控件、监听器在借用释放后再析构，避免析构里回调文档
        let mut dropped = Vec::new();
        {
            let mut arena = self.inner.borrow_mut();
            for d in std::iter::once(id).chain(arena.descendants(id)) {
                if let Some(n) = arena.get_mut(d) {
                    dropped.push((n.control.take(), std::mem::take(&mut n.listeners), n.bound_data.take()));
                }
            }
            arena.destroy(id);
        }
        drop(dropped);
    }

    /// 移除全部子节点
    pub fn clear_children(&self, id: NodeId) {
        for child in self.children(id) {
            self.remove(child);
        }
    }

    /// 子孙节点（先序，不含自身）
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        self.inner.borrow().descendants(scope)
    }

    /// 在 scope 子树内（不含自身）按选择器查询
    pub fn query_all(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        let selector = Selector::parse(selector);
        let arena = self.inner.borrow();
        arena
            .descendants(scope)
            .into_iter()
            .filter(|id| selector.matches(&arena, *id, scope))
            .collect()
    }

    pub fn query(&self, scope: NodeId, selector: &str) -> Option<NodeId> {
        self.query_all(scope, selector).into_iter().next()
    }

    /// 带有某个类名的子孙节点
    pub fn find_by_class(&self, scope: NodeId, class_name: &str) -> Vec<NodeId> {
        let arena = self.inner.borrow();
        arena
            .descendants(scope)
            .into_iter()
            .filter(|id| arena.get(*id).map(|n| n.has_class(class_name)).unwrap_or(false))
            .collect()
    }

    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        let root = self.root();
        let arena = self.inner.borrow();
        arena
            .descendants(root)
            .into_iter()
            .find(|n| arena.get(*n).and_then(|n| n.id.as_deref()) == Some(id))
    }

    /// 解析标记并追加到 parent 末尾
    pub fn insert_markup(&self, parent: NodeId, markup: &str) -> UiResult<Vec<NodeId>> {
        let nodes = MarkupParser::new(markup).parse()?;
        let mut created = Vec::with_capacity(nodes.len());
        for m in &nodes {
            let id = self.build_markup_node(m);
            self.append_child(parent, id)?;
            created.push(id);
        }
        Ok(created)
    }

    fn build_markup_node(&self, m: &MarkupNode) -> NodeId {
        if m.node_type == MarkupNodeType::Text {
            return self.create_text(&m.text_content);
        }
        let id = self.create_element(&m.tag_name);
        for (name, value) in &m.attributes {
            match name.as_str() {
                "id" => {
                    let _ = self.set_id(id, value);
                }
                "class" => {
                    for c in value.split_whitespace() {
                        self.add_class(id, c);
                    }
                }
                "style" => {
                    for (prop, val) in crate::style::parse_inline_style(value) {
                        self.set_style(id, &prop, &val);
                    }
                }
                _ => self.set_attr(id, name, value),
            }
        }
        for child in &m.children {
            let c = self.build_markup_node(child);
            let _ = self.append_child(id, c);
        }
        id
    }

    // ---- 元素属性 ----

    pub fn tag(&self, id: NodeId) -> Option<String> {
        self.with_node(id, |n| n.tag.clone())
    }

    pub fn set_id(&self, id: NodeId, value: &str) -> UiResult<()> {
        self.with_element_mut(id, |n| n.id = Some(value.to_string()))
    }

    pub fn element_id(&self, id: NodeId) -> Option<String> {
        self.with_node(id, |n| n.id.clone()).flatten()
    }

    pub fn add_class(&self, id: NodeId, class_name: &str) {
        self.with_node_mut(id, |n| {
            if !n.has_class(class_name) {
                n.classes.push(class_name.to_string());
            }
        });
    }

    pub fn remove_class(&self, id: NodeId, class_name: &str) {
        self.with_node_mut(id, |n| n.classes.retain(|c| c != class_name));
    }

    /// 切换类名，返回切换后是否带有该类
    pub fn toggle_class(&self, id: NodeId, class_name: &str) -> bool {
        if self.has_class(id, class_name) {
            self.remove_class(id, class_name);
            false
        } else {
            self.add_class(id, class_name);
            true
        }
    }

    pub fn has_class(&self, id: NodeId, class_name: &str) -> bool {
        self.with_node(id, |n| n.has_class(class_name)).unwrap_or(false)
    }

    pub fn classes(&self, id: NodeId) -> Vec<String> {
        self.with_node(id, |n| n.classes.clone()).unwrap_or_default()
    }

    pub fn set_attr(&self, id: NodeId, name: &str, value: &str) {
        self.with_node_mut(id, |n| n.attributes.insert(name.to_string(), value.to_string()));
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<String> {
        self.with_node(id, |n| n.attributes.get(name).cloned()).flatten()
    }

    pub fn remove_attr(&self, id: NodeId, name: &str) {
        self.with_node_mut(id, |n| n.attributes.remove(name));
    }

    // ---- 内联样式 ----

    pub fn set_style(&self, id: NodeId, property: &str, value: &str) {
        self.set_style_with_priority(id, property, value, None);
    }

    pub fn set_style_with_priority(&self, id: NodeId, property: &str, value: &str, priority: Option<&str>) {
        self.with_node_mut(id, |n| {
            n.style.insert(
                property.to_string(),
                StyleProp { value: value.to_string(), priority: priority.map(str::to_string) },
            )
        });
    }

    pub fn style(&self, id: NodeId, property: &str) -> Option<String> {
        self.with_node(id, |n| n.style_value(property).map(str::to_string)).flatten()
    }

    pub fn style_prop(&self, id: NodeId, property: &str) -> Option<StyleProp> {
        self.with_node(id, |n| n.style.get(property).cloned()).flatten()
    }

    pub fn remove_style(&self, id: NodeId, property: &str) {
        self.with_node_mut(id, |n| n.style.remove(property));
    }

    // ---- 文本与表单状态 ----

    /// 清空子节点并写入单个文本节点
    pub fn set_text(&self, id: NodeId, text: &str) {
        if self.with_node(id, |n| n.kind).is_none() {
            return;
        }
        if self.with_node(id, |n| n.kind == NodeKind::Text) == Some(true) {
            self.with_node_mut(id, |n| n.text = text.to_string());
            return;
        }
        self.clear_children(id);
        if !text.is_empty() {
            let t = self.create_text(text);
            let _ = self.append_child(id, t);
        }
    }

    /// 子树内所有文本拼接
    pub fn text_content(&self, id: NodeId) -> String {
        let arena = self.inner.borrow();
        let mut out = String::new();
        if let Some(n) = arena.get(id) {
            if n.kind == NodeKind::Text {
                return n.text.clone();
            }
        }
        for d in arena.descendants(id) {
            if let Some(n) = arena.get(d) {
                if n.kind == NodeKind::Text {
                    out.push_str(&n.text);
                }
            }
        }
        out
    }

    pub fn value(&self, id: NodeId) -> String {
        self.with_node(id, |n| n.value.clone()).unwrap_or_default()
    }

    pub fn set_value(&self, id: NodeId, value: &str) {
        self.with_node_mut(id, |n| n.value = value.to_string());
    }

    pub fn checked(&self, id: NodeId) -> bool {
        self.with_node(id, |n| n.checked).unwrap_or(false)
    }

    pub fn set_checked(&self, id: NodeId, checked: bool) {
        self.with_node_mut(id, |n| n.checked = checked);
    }

    pub fn scroll_top(&self, id: NodeId) -> f32 {
        self.with_node(id, |n| n.scroll_top).unwrap_or(0.0)
    }

    pub fn set_scroll_top(&self, id: NodeId, top: f32) {
        self.with_node_mut(id, |n| n.scroll_top = top);
    }

    pub fn rect(&self, id: NodeId) -> Rect {
        self.with_node(id, |n| n.rect).unwrap_or_default()
    }

    /// 宿主布局后写入节点盒
    pub fn set_rect(&self, id: NodeId, rect: Rect) {
        self.with_node_mut(id, |n| n.rect = rect);
    }

    // ---- 焦点 ----

    pub fn focused(&self) -> Option<NodeId> {
        self.inner.borrow().focused
    }

    /// 移动焦点：旧节点收到 Blur，新节点收到 Focus
    pub fn focus(&self, id: NodeId) {
        let previous = self.focused();
        if previous == Some(id) || !self.contains(id) {
            return;
        }
        self.inner.borrow_mut().focused = Some(id);
        if let Some(prev) = previous {
            self.dispatch(prev, &Event::Blur);
        }
        self.dispatch(id, &Event::Focus);
    }

    pub fn blur(&self) {
        let previous = self.inner.borrow_mut().focused.take();
        if let Some(prev) = previous {
            self.dispatch(prev, &Event::Blur);
        }
    }

    // ---- 监听器 ----

    pub fn add_listener(&self, id: NodeId, kind: EventKind, listener: Listener) {
        self.with_node_mut(id, |n| n.listeners.push(ListenerEntry { kind, slot: None, listener }));
    }

    /// 按槽位注册监听器，同一 (事件, 槽位) 只保留最后一次
    pub fn set_listener(&self, id: NodeId, kind: EventKind, slot: &str, listener: Listener) {
        self.with_node_mut(id, |n| {
            if let Some(entry) = n
                .listeners
                .iter_mut()
                .find(|e| e.kind == kind && e.slot.as_deref() == Some(slot))
            {
                entry.listener = listener;
            } else {
                n.listeners.push(ListenerEntry { kind, slot: Some(slot.to_string()), listener });
            }
        });
    }

    pub fn listener_count(&self, id: NodeId) -> usize {
        self.with_node(id, |n| n.listeners.len()).unwrap_or(0)
    }

    fn listeners_for(&self, id: NodeId, kind: EventKind) -> Vec<Listener> {
        self.with_node(id, |n| {
            n.listeners.iter().filter(|e| e.kind == kind).map(|e| e.listener.clone()).collect()
        })
        .unwrap_or_default()
    }

    /// 分发事件：目标节点先处理，再沿祖先冒泡，直到被阻止
    pub fn dispatch(&self, target: NodeId, event: &Event) {
        if !self.contains(target) {
            return;
        }
        let kind = event.kind();
        let stopped = Cell::new(false);
        let mut current = Some(target);
        while let Some(node) = current {
            for l in self.listeners_for(node, kind) {
                let ctx = EventCtx::new(self, event, target, node, &stopped);
                l(&ctx);
            }
            if stopped.get() || !event.bubbles() {
                break;
            }
            current = self.parent(node);
        }
    }

    // ---- 绑定元数据 ----

    /// 设置绑定描述，同时维护唯一的标记类
    pub fn set_binding(&self, id: NodeId, spec: BindSpec) {
        self.with_node_mut(id, |n| {
            if let Some(old) = n.binding.take() {
                n.classes.retain(|c| c != old.marker.class_name());
            }
            let class = spec.marker.class_name();
            if !n.has_class(class) {
                n.classes.push(class.to_string());
            }
            n.binding = Some(spec);
        });
    }

    pub fn binding(&self, id: NodeId) -> Option<BindSpec> {
        self.with_node(id, |n| n.binding.clone()).flatten()
    }

    pub fn set_control(&self, id: NodeId, control: Rc<dyn BindableControl>) {
        self.with_node_mut(id, |n| n.control = Some(control));
    }

    pub fn control(&self, id: NodeId) -> Option<Rc<dyn BindableControl>> {
        self.with_node(id, |n| n.control.clone()).flatten()
    }

    pub fn set_bound_data(&self, id: NodeId, data: BoundData) {
        self.with_node_mut(id, |n| n.bound_data = Some(data));
    }

    /// 该节点上一次绑定得到的数据句柄
    pub fn bound_data(&self, id: NodeId) -> Option<BoundData> {
        self.with_node(id, |n| n.bound_data.clone()).flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::listener;

    #[test]
    fn test_remove_invalidates_handle() {
        let dom = Dom::new();
        let a = dom.create_element("div");
        dom.append_child(dom.root(), a).unwrap();
        dom.remove(a);
        assert!(!dom.contains(a));
        let b = dom.create_element("span");
        // 槽位复用后旧句柄仍然失效
        assert!(dom.contains(b));
        assert!(!dom.contains(a));
        assert_eq!(dom.child_count(dom.root()), 0);
    }

    #[test]
    fn test_cannot_append_to_text_node() {
        let dom = Dom::new();
        let t = dom.create_text("hi");
        let d = dom.create_element("div");
        assert!(dom.append_child(t, d).is_err());
    }

    #[test]
    fn test_dispatch_bubbles_until_stopped() {
        let dom = Dom::new();
        let outer = dom.create_element("div");
        let inner = dom.create_element("span");
        dom.append_child(dom.root(), outer).unwrap();
        dom.append_child(outer, inner).unwrap();

        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        dom.add_listener(outer, EventKind::Tap, listener(move |_| h.set(h.get() + 1)));
        dom.dispatch(inner, &Event::Tap(Default::default()));
        assert_eq!(hits.get(), 1);

        dom.add_listener(inner, EventKind::Tap, listener(|ev| ev.stop_propagation()));
        dom.dispatch(inner, &Event::Tap(Default::default()));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_slotted_listener_replaces() {
        let dom = Dom::new();
        let n = dom.create_element("input");
        dom.set_listener(n, EventKind::Input, "bind", listener(|_| {}));
        dom.set_listener(n, EventKind::Input, "bind", listener(|_| {}));
        dom.add_listener(n, EventKind::Input, listener(|_| {}));
        assert_eq!(dom.listener_count(n), 2);
    }

    #[test]
    fn test_insert_markup() {
        let dom = Dom::new();
        let root = dom.root();
        let created = dom
            .insert_markup(root, r#"<p class="a b" style="color: red; width: 10px">Hi <b>there</b></p>"#)
            .unwrap();
        assert_eq!(created.len(), 1);
        let p = created[0];
        assert!(dom.has_class(p, "b"));
        assert_eq!(dom.style(p, "width").as_deref(), Some("10px"));
        assert_eq!(dom.text_content(p), "Hi there");
    }

    #[test]
    fn test_focus_moves_blur() {
        let dom = Dom::new();
        let a = dom.create_element("input");
        let b = dom.create_element("input");
        dom.append_child(dom.root(), a).unwrap();
        dom.append_child(dom.root(), b).unwrap();
        let blurred = Rc::new(Cell::new(false));
        let f = blurred.clone();
        dom.add_listener(a, EventKind::Blur, listener(move |_| f.set(true)));
        dom.focus(a);
        dom.focus(b);
        assert!(blurred.get());
        assert_eq!(dom.focused(), Some(b));
    }
}
