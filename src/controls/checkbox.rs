//! 复选框

use super::notify_bind;
use crate::animation::{AnimationHandle, Easing, FrameScheduler, StyleAnimation};
use crate::binding::{BindableControl, ControlValue, DataBindHandler};
use crate::config::UiConfig;
use crate::context::UiContext;
use crate::dom::{Dom, NodeId};
use crate::event::{listener, EventKind};
use serde_json::Value as JsonValue;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// 对勾描边长度
const MARK_LENGTH: f64 = 24.0;

struct CheckboxInner {
    node: NodeId,
    mark: NodeId,
    checked: Cell<bool>,
    drawn: Cell<bool>,
    bind_handler: RefCell<Option<DataBindHandler>>,
    on_toggle: RefCell<Option<Rc<dyn Fn(bool)>>>,
    anim: RefCell<Option<AnimationHandle>>,
    frames: FrameScheduler,
    config: Rc<UiConfig>,
}

/// 复选框：点击或 Enter/空格切换
#[derive(Clone)]
pub struct Checkbox {
    inner: Rc<CheckboxInner>,
}

impl Checkbox {
    pub fn new(ctx: &UiContext, checked: bool) -> Self {
        let dom = &ctx.dom;
        let node = dom.create_element("div");
        dom.add_class(node, "checkbox");
        dom.set_attr(node, "role", "checkbox");
        dom.set_attr(node, "tabindex", "0");
        let mark = dom.create_element("span");
        dom.add_class(mark, "checkmark");
        dom.set_style(mark, "stroke-dasharray", &MARK_LENGTH.to_string());
        let _ = dom.append_child(node, mark);

        let checkbox = Self {
            inner: Rc::new(CheckboxInner {
                node,
                mark,
                checked: Cell::new(checked),
                drawn: Cell::new(false),
                bind_handler: RefCell::new(None),
                on_toggle: RefCell::new(None),
                anim: RefCell::new(None),
                frames: ctx.frames.clone(),
                config: ctx.config.clone(),
            }),
        };
        checkbox.redraw(dom);

        let this = checkbox.clone();
        dom.add_listener(
            node,
            EventKind::Tap,
            listener(move |ev| {
                // 行内的复选框不触发行点击
                ev.stop_propagation();
                this.toggle(ev.dom);
            }),
        );
        let this = checkbox.clone();
        dom.add_listener(
            node,
            EventKind::KeyDown,
            listener(move |ev| {
                if ev.event.key().map(|k| k.is_activate()).unwrap_or(false) {
                    ev.stop_propagation();
                    this.toggle(ev.dom);
                }
            }),
        );
        dom.set_control(node, Rc::new(checkbox.clone()));
        checkbox
    }

    pub fn node(&self) -> NodeId {
        self.inner.node
    }

    pub fn is_checked(&self) -> bool {
        self.inner.checked.get()
    }

    /// 用户切换后的回调，在写回之后调用
    pub fn on_toggle<F>(&self, f: F)
    where
        F: Fn(bool) + 'static,
    {
        *self.inner.on_toggle.borrow_mut() = Some(Rc::new(f));
    }

    /// 用户切换：重绘、写回、回调
    pub fn toggle(&self, dom: &Dom) {
        let checked = !self.inner.checked.get();
        self.inner.checked.set(checked);
        self.redraw(dom);
        notify_bind(dom, self.inner.node, &self.inner.bind_handler, &JsonValue::Bool(checked));
        let cb = self.inner.on_toggle.borrow().clone();
        if let Some(cb) = cb {
            cb(checked);
        }
    }

    /// 程序设置，不触发回调
    pub fn set_checked(&self, dom: &Dom, checked: bool) {
        if self.inner.checked.replace(checked) != checked || !self.inner.drawn.get() {
            self.redraw(dom);
        }
    }

    fn redraw(&self, dom: &Dom) {
        let inner = &self.inner;
        let checked = inner.checked.get();
        dom.set_checked(inner.node, checked);
        dom.set_attr(inner.node, "aria-checked", if checked { "true" } else { "false" });
        if checked {
            dom.add_class(inner.node, "checked");
        } else {
            dom.remove_class(inner.node, "checked");
        }

        let target = if checked { 0.0 } else { MARK_LENGTH };
        if let Some(prev) = inner.anim.borrow_mut().take() {
            prev.cancel();
        }
        // 首次绘制不做动画
        if !inner.drawn.replace(true) {
            dom.set_style(inner.mark, "stroke-dashoffset", &target.to_string());
            return;
        }
        let handle = StyleAnimation::new(inner.mark, "stroke-dashoffset", target)
            .duration(inner.config.animation.checkbox_ms)
            .easing(Easing::EaseOut)
            .start(dom, &inner.frames, None);
        *inner.anim.borrow_mut() = Some(handle);
    }
}

impl BindableControl for Checkbox {
    fn get_value(&self, _dom: &Dom) -> ControlValue {
        ControlValue::Checked(self.is_checked())
    }

    fn set_value(&self, dom: &Dom, value: ControlValue) {
        if let ControlValue::Checked(checked) = value {
            self.set_checked(dom, checked);
        }
    }

    fn on_change(&self, _dom: &Dom, handler: DataBindHandler) {
        *self.inner.bind_handler.borrow_mut() = Some(handler);
    }
}
