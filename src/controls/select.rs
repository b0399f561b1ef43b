//! 下拉选择
//!
//! 状态：closed → opening → open → closing → closed。
//! 面板延后到下一帧创建并挂在根节点下，每次打开都重新渲染列表项；
//! 下方空间不足时翻到触发器上方。关闭时先把高度动画到 0 再移除面板。

use super::notify_bind;
use crate::animation::{AnimationHandle, Easing, FrameScheduler, StyleAnimation};
use crate::binding::{keypath, BindableControl, ControlValue, DataBindHandler};
use crate::config::UiConfig;
use crate::context::UiContext;
use crate::dom::{Dom, NodeId};
use crate::event::{listener, EventKind};
use crate::Rect;
use serde_json::Value as JsonValue;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// 选中回调：(下标, 控件)
pub type SelectHandler = Rc<dyn Fn(usize, &Select)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectState {
    Closed,
    /// 已请求打开，面板还没出现或正在展开
    Opening,
    Open,
    Closing,
}

struct SelectInner {
    node: NodeId,
    label: NodeId,
    items: RefCell<Vec<JsonValue>>,
    label_key: RefCell<Option<String>>,
    placeholder: RefCell<String>,
    selected: Cell<Option<usize>>,
    focused: Cell<Option<usize>>,
    state: Cell<SelectState>,
    panel: Cell<Option<NodeId>>,
    item_nodes: RefCell<Vec<NodeId>>,
    bind_handler: RefCell<Option<DataBindHandler>>,
    select_handler: RefCell<Option<SelectHandler>>,
    anim: RefCell<Option<AnimationHandle>>,
    frames: FrameScheduler,
    config: Rc<UiConfig>,
}

#[derive(Clone)]
pub struct Select {
    inner: Rc<SelectInner>,
}

impl Select {
    pub fn new(ctx: &UiContext, items: Vec<JsonValue>) -> Self {
        let dom = &ctx.dom;
        let node = dom.create_element("div");
        dom.add_class(node, "select");
        dom.set_attr(node, "role", "combobox");
        dom.set_attr(node, "tabindex", "0");
        let label = dom.create_element("span");
        dom.add_class(label, "select-label");
        let arrow = dom.create_element("span");
        dom.add_class(arrow, "select-arrow");
        for child in [label, arrow] {
            let _ = dom.append_child(node, child);
        }

        let select = Self {
            inner: Rc::new(SelectInner {
                node,
                label,
                items: RefCell::new(items),
                label_key: RefCell::new(None),
                placeholder: RefCell::new(String::new()),
                selected: Cell::new(None),
                focused: Cell::new(None),
                state: Cell::new(SelectState::Closed),
                panel: Cell::new(None),
                item_nodes: RefCell::new(Vec::new()),
                bind_handler: RefCell::new(None),
                select_handler: RefCell::new(None),
                anim: RefCell::new(None),
                frames: ctx.frames.clone(),
                config: ctx.config.clone(),
            }),
        };
        select.redraw_label(dom);

        let this = select.clone();
        dom.add_listener(
            node,
            EventKind::Tap,
            listener(move |ev| match this.state() {
                SelectState::Closed => this.open(ev.dom, false),
                SelectState::Open | SelectState::Opening => this.close(ev.dom),
                SelectState::Closing => {}
            }),
        );
        let this = select.clone();
        dom.add_listener(
            node,
            EventKind::KeyDown,
            listener(move |ev| {
                let Some(key) = ev.event.key() else { return };
                match key.key.as_str() {
                    " " | "ArrowDown" | "ArrowUp" if this.state() == SelectState::Closed => {
                        ev.stop_propagation();
                        this.open(ev.dom, true);
                    }
                    "Escape" => this.close(ev.dom),
                    _ => {}
                }
            }),
        );
        dom.set_control(node, Rc::new(select.clone()));
        select
    }

    pub fn node(&self) -> NodeId {
        self.inner.node
    }

    pub fn state(&self) -> SelectState {
        self.inner.state.get()
    }

    pub fn panel(&self) -> Option<NodeId> {
        self.inner.panel.get()
    }

    /// 当前面板中的列表项节点
    pub fn item_nodes(&self) -> Vec<NodeId> {
        self.inner.item_nodes.borrow().clone()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.inner.selected.get()
    }

    pub fn selected_item(&self) -> Option<JsonValue> {
        let index = self.inner.selected.get()?;
        self.inner.items.borrow().get(index).cloned()
    }

    pub fn items(&self) -> Vec<JsonValue> {
        self.inner.items.borrow().clone()
    }

    /// 替换列表项，下次打开时生效
    pub fn set_items(&self, dom: &Dom, items: Vec<JsonValue>) {
        let len = items.len();
        *self.inner.items.borrow_mut() = items;
        if self.inner.selected.get().map(|i| i >= len).unwrap_or(false) {
            self.inner.selected.set(None);
        }
        self.redraw_label(dom);
    }

    /// 对象列表项用于显示的字段
    pub fn set_label_key(&self, dom: &Dom, key: &str) {
        *self.inner.label_key.borrow_mut() = Some(key.to_string());
        self.redraw_label(dom);
    }

    pub fn set_placeholder(&self, dom: &Dom, text: &str) {
        *self.inner.placeholder.borrow_mut() = text.to_string();
        self.redraw_label(dom);
    }

    pub fn on_select<F>(&self, f: F)
    where
        F: Fn(usize, &Select) + 'static,
    {
        *self.inner.select_handler.borrow_mut() = Some(Rc::new(f));
    }

    fn item_text(&self, item: &JsonValue) -> String {
        match self.inner.label_key.borrow().as_deref() {
            Some(key) => keypath::display(&keypath::resolve(item, key)),
            None => keypath::display(item),
        }
    }

    fn redraw_label(&self, dom: &Dom) {
        let text = match self.selected_item() {
            Some(item) => self.item_text(&item),
            None => self.inner.placeholder.borrow().clone(),
        };
        dom.set_text(self.inner.label, &text);
    }

    /// 请求打开；面板在下一帧出现
    pub fn open(&self, dom: &Dom, focus_first: bool) {
        if self.state() != SelectState::Closed {
            return;
        }
        self.inner.state.set(SelectState::Opening);
        let this = self.clone();
        let weak = dom.downgrade();
        self.inner.frames.defer(move || {
            if let Some(dom) = weak.upgrade() {
                this.show_panel(&dom, focus_first);
            }
        });
    }

    fn show_panel(&self, dom: &Dom, focus_first: bool) {
        let inner = &self.inner;
        // 面板出现前已被关闭
        if inner.state.get() != SelectState::Opening || inner.panel.get().is_some() {
            return;
        }
        let items = inner.items.borrow().clone();
        let item_height = inner.config.select_item_height;
        let full_height = (item_height * items.len() as f32).min(inner.config.select_max_height);
        let trigger = dom.rect(inner.node);
        let above = trigger.bottom() + full_height > inner.config.viewport().height;
        let top = if above { trigger.top() - full_height } else { trigger.bottom() };

        let panel = dom.create_element("div");
        dom.add_class(panel, "select-panel");
        dom.set_attr(panel, "role", "listbox");
        if above {
            dom.add_class(panel, "above");
        }
        dom.set_style(panel, "position", "absolute");
        dom.set_style(panel, "overflow", "hidden");
        dom.set_style(panel, "left", &format!("{}px", trigger.left()));
        dom.set_style(panel, "top", &format!("{}px", top));
        dom.set_style(panel, "width", &format!("{}px", trigger.width));
        dom.set_style(panel, "height", "0px");
        dom.set_rect(panel, Rect::new(trigger.left(), top, trigger.width, full_height));

        let mut nodes = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let n = dom.create_element("div");
            dom.add_class(n, "select-item");
            dom.set_attr(n, "role", "option");
            dom.set_attr(n, "data-index", &index.to_string());
            if inner.selected.get() == Some(index) {
                dom.add_class(n, "selected");
                dom.set_attr(n, "aria-selected", "true");
            }
            dom.set_text(n, &self.item_text(item));
            dom.set_rect(n, Rect::new(trigger.left(), top + item_height * index as f32, trigger.width, item_height));
            let this = self.clone();
            dom.add_listener(
                n,
                EventKind::Tap,
                listener(move |ev| {
                    ev.stop_propagation();
                    this.select(ev.dom, index);
                }),
            );
            let _ = dom.append_child(panel, n);
            nodes.push(n);
        }

        let this = self.clone();
        dom.add_listener(panel, EventKind::KeyDown, listener(move |ev| this.on_panel_key(ev.dom, ev)));
        let _ = dom.append_child(dom.root(), panel);
        inner.panel.set(Some(panel));
        *inner.item_nodes.borrow_mut() = nodes;
        tracing::debug!(items = items.len(), above, "select panel opened");

        let this = self.clone();
        let handle = StyleAnimation::new(panel, "height", full_height as f64)
            .begin(0.0)
            .duration(inner.config.animation.select_ms)
            .easing(Easing::EaseOut)
            .start(dom, &inner.frames, None)
            .finish(move || {
                if this.inner.state.get() == SelectState::Opening {
                    this.inner.state.set(SelectState::Open);
                }
            });
        *inner.anim.borrow_mut() = Some(handle);

        if focus_first && !items.is_empty() {
            self.focus_item(dom, 0);
        }
    }

    fn on_panel_key(&self, dom: &Dom, ev: &crate::event::EventCtx<'_>) {
        let Some(key) = ev.event.key() else { return };
        let len = self.inner.item_nodes.borrow().len();
        if len == 0 {
            return;
        }
        let focused = self.inner.focused.get();
        match key.key.as_str() {
            "Enter" | " " => {
                if let Some(i) = focused {
                    self.select(dom, i);
                }
            }
            "ArrowDown" => self.focus_item(dom, focused.map(|i| (i + 1) % len).unwrap_or(0)),
            "ArrowUp" => self.focus_item(dom, focused.map(|i| (i + len - 1) % len).unwrap_or(len - 1)),
            "Escape" => self.close(dom),
            _ => return,
        }
        ev.stop_propagation();
    }

    /// 键盘焦点移到第 index 项
    pub fn focus_item(&self, dom: &Dom, index: usize) {
        let nodes = self.item_nodes();
        let Some(target) = nodes.get(index).copied() else { return };
        for n in &nodes {
            dom.remove_class(*n, "focused");
        }
        dom.add_class(target, "focused");
        self.inner.focused.set(Some(index));
        dom.focus(target);
    }

    pub fn focused_item(&self) -> Option<usize> {
        self.inner.focused.get()
    }

    /// 用户选中：更新下标、重绘、写回、回调，然后关闭
    pub fn select(&self, dom: &Dom, index: usize) {
        let Some(item) = self.inner.items.borrow().get(index).cloned() else { return };
        self.inner.selected.set(Some(index));
        self.redraw_label(dom);

        let value_key = dom.binding(self.inner.node).and_then(|spec| spec.value_key);
        let value = match value_key {
            Some(key) => keypath::resolve(&item, &key),
            None => item,
        };
        notify_bind(dom, self.inner.node, &self.inner.bind_handler, &value);
        let handler = self.inner.select_handler.borrow().clone();
        if let Some(handler) = handler {
            handler(index, self);
        }
        self.close(dom);
    }

    /// 高度动画到 0 后移除面板
    pub fn close(&self, dom: &Dom) {
        let inner = &self.inner;
        match inner.state.get() {
            SelectState::Closed | SelectState::Closing => return,
            SelectState::Opening if inner.panel.get().is_none() => {
                inner.state.set(SelectState::Closed);
                return;
            }
            _ => {}
        }
        let Some(panel) = inner.panel.get() else {
            inner.state.set(SelectState::Closed);
            return;
        };
        inner.state.set(SelectState::Closing);
        if let Some(prev) = inner.anim.borrow_mut().take() {
            prev.cancel();
        }

        let this = self.clone();
        let weak = dom.downgrade();
        let handle = StyleAnimation::new(panel, "height", 0.0)
            .duration(inner.config.animation.select_ms)
            .easing(Easing::EaseIn)
            .start(dom, &inner.frames, None)
            .finish(move || {
                let Some(dom) = weak.upgrade() else { return };
                this.finish_close(&dom);
            });
        *inner.anim.borrow_mut() = Some(handle);
    }

    fn finish_close(&self, dom: &Dom) {
        let inner = &self.inner;
        if let Some(panel) = inner.panel.take() {
            dom.remove(panel);
        }
        inner.item_nodes.borrow_mut().clear();
        inner.state.set(SelectState::Closed);
        if inner.focused.take().is_some() {
            dom.focus(inner.node);
        }
        tracing::debug!("select panel closed");
    }
}

impl BindableControl for Select {
    fn get_value(&self, _dom: &Dom) -> ControlValue {
        ControlValue::SelectedIndex(self.selected_index())
    }

    fn set_value(&self, dom: &Dom, value: ControlValue) {
        if let ControlValue::SelectedIndex(index) = value {
            let len = self.inner.items.borrow().len();
            self.inner.selected.set(index.filter(|i| *i < len));
            self.redraw_label(dom);
        }
    }

    fn on_change(&self, _dom: &Dom, handler: DataBindHandler) {
        *self.inner.bind_handler.borrow_mut() = Some(handler);
    }

    fn match_index(&self, value: &JsonValue, value_key: Option<&str>) -> Option<usize> {
        if value.is_null() {
            return None;
        }
        self.inner.items.borrow().iter().position(|item| match value_key {
            Some(key) => keypath::resolve(item, key) == *value,
            None => item == value,
        })
    }
}
