//! 滑块
//!
//! 空闲时显示占位标签，拖动时显示轨道填充。按下只进入拖动状态，
//! 移动时按指针横坐标换算并吸附到步长，松开时写回并回调一次。

use super::{format_number, notify_bind, number_value};
use crate::binding::{BindableControl, ControlValue, DataBindHandler};
use crate::context::UiContext;
use crate::dom::{Dom, NodeId};
use crate::event::{listener, EventKind};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// 吸附到最近的步长并限制在 [min, max]
pub fn snap(raw: f64, min: f64, max: f64, step: f64) -> f64 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    if !raw.is_finite() {
        return lo;
    }
    let snapped = if step > 0.0 { min + ((raw - min) / step).round() * step } else { raw };
    // 去掉浮点步长累积的尾数
    let cleaned = (snapped * 1e9).round() / 1e9;
    cleaned.clamp(lo, hi)
}

struct SliderInner {
    node: NodeId,
    fill: NodeId,
    thumb: NodeId,
    label: NodeId,
    min: f64,
    max: f64,
    step: f64,
    value: Cell<f64>,
    dragging: Cell<bool>,
    placeholder: RefCell<Option<String>>,
    bind_handler: RefCell<Option<DataBindHandler>>,
    on_change: RefCell<Option<Rc<dyn Fn(f64)>>>,
}

#[derive(Clone)]
pub struct Slider {
    inner: Rc<SliderInner>,
}

impl Slider {
    pub fn new(ctx: &UiContext, min: f64, max: f64, step: f64) -> Self {
        let dom = &ctx.dom;
        let node = dom.create_element("div");
        dom.add_class(node, "slider");
        dom.set_attr(node, "role", "slider");
        let track = dom.create_element("div");
        dom.add_class(track, "slider-track");
        let fill = dom.create_element("div");
        dom.add_class(fill, "slider-fill");
        let thumb = dom.create_element("div");
        dom.add_class(thumb, "slider-thumb");
        let label = dom.create_element("span");
        dom.add_class(label, "slider-label");
        for child in [fill, thumb] {
            let _ = dom.append_child(track, child);
        }
        for child in [track, label] {
            let _ = dom.append_child(node, child);
        }

        let slider = Self {
            inner: Rc::new(SliderInner {
                node,
                fill,
                thumb,
                label,
                min,
                max,
                step,
                value: Cell::new(snap(min, min, max, step)),
                dragging: Cell::new(false),
                placeholder: RefCell::new(None),
                bind_handler: RefCell::new(None),
                on_change: RefCell::new(None),
            }),
        };
        slider.redraw(dom);
        slider.install_listeners(dom);
        dom.set_control(node, Rc::new(slider.clone()));
        slider
    }

    fn install_listeners(&self, dom: &Dom) {
        let node = self.inner.node;
        let this = self.clone();
        dom.add_listener(
            node,
            EventKind::TouchStart,
            listener(move |ev| {
                this.inner.dragging.set(true);
                this.redraw(ev.dom);
            }),
        );
        let this = self.clone();
        dom.add_listener(
            node,
            EventKind::TouchMove,
            listener(move |ev| {
                if !this.inner.dragging.get() {
                    return;
                }
                if let Some(p) = ev.event.point() {
                    let value = this.value_at(ev.dom, p.x);
                    this.inner.value.set(value);
                    this.redraw(ev.dom);
                }
            }),
        );
        let this = self.clone();
        dom.add_listener(
            node,
            EventKind::TouchEnd,
            listener(move |ev| {
                if !this.inner.dragging.replace(false) {
                    return;
                }
                if let Some(p) = ev.event.point() {
                    this.inner.value.set(this.value_at(ev.dom, p.x));
                }
                this.redraw(ev.dom);
                this.commit(ev.dom);
            }),
        );
    }

    pub fn node(&self) -> NodeId {
        self.inner.node
    }

    pub fn value(&self) -> f64 {
        self.inner.value.get()
    }

    pub fn is_dragging(&self) -> bool {
        self.inner.dragging.get()
    }

    pub fn range(&self) -> (f64, f64, f64) {
        (self.inner.min, self.inner.max, self.inner.step)
    }

    /// 空闲时显示的文本；未设置时显示当前值
    pub fn set_placeholder(&self, dom: &Dom, text: &str) {
        *self.inner.placeholder.borrow_mut() = Some(text.to_string());
        self.redraw(dom);
    }

    /// 松开时的回调，参数为吸附后的最终值
    pub fn on_release<F>(&self, f: F)
    where
        F: Fn(f64) + 'static,
    {
        *self.inner.on_change.borrow_mut() = Some(Rc::new(f));
    }

    /// 程序设置，吸附后重绘，不触发回调
    pub fn set(&self, dom: &Dom, raw: f64) {
        let inner = &self.inner;
        inner.value.set(snap(raw, inner.min, inner.max, inner.step));
        self.redraw(dom);
    }

    /// 指针横坐标换算为吸附后的值
    pub fn value_at(&self, dom: &Dom, x: f32) -> f64 {
        let inner = &self.inner;
        let fraction = dom.rect(inner.node).fraction_x(x) as f64;
        snap(inner.min + fraction * (inner.max - inner.min), inner.min, inner.max, inner.step)
    }

    fn fraction(&self) -> f64 {
        let inner = &self.inner;
        let span = inner.max - inner.min;
        if span == 0.0 {
            return 0.0;
        }
        ((inner.value.get() - inner.min) / span).clamp(0.0, 1.0)
    }

    fn redraw(&self, dom: &Dom) {
        let inner = &self.inner;
        let percent = format!("{}%", (self.fraction() * 10000.0).round() / 100.0);
        dom.set_style(inner.thumb, "left", &percent);
        dom.set_attr(inner.node, "aria-valuenow", &format_number(inner.value.get()));
        if inner.dragging.get() {
            dom.add_class(inner.node, "dragging");
            dom.set_style(inner.fill, "width", &percent);
            dom.remove_style(inner.fill, "display");
            dom.set_style(inner.label, "display", "none");
        } else {
            dom.remove_class(inner.node, "dragging");
            dom.set_style(inner.fill, "display", "none");
            dom.remove_style(inner.label, "display");
            let text = inner
                .placeholder
                .borrow()
                .clone()
                .unwrap_or_else(|| format_number(inner.value.get()));
            dom.set_text(inner.label, &text);
        }
    }

    fn commit(&self, dom: &Dom) {
        let value = self.inner.value.get();
        notify_bind(dom, self.inner.node, &self.inner.bind_handler, &number_value(value));
        let cb = self.inner.on_change.borrow().clone();
        if let Some(cb) = cb {
            cb(value);
        }
    }
}

impl BindableControl for Slider {
    fn get_value(&self, _dom: &Dom) -> ControlValue {
        ControlValue::Slider(self.value())
    }

    fn set_value(&self, dom: &Dom, value: ControlValue) {
        if let ControlValue::Slider(v) = value {
            self.set(dom, v);
        }
    }

    fn on_change(&self, _dom: &Dom, handler: DataBindHandler) {
        *self.inner.bind_handler.borrow_mut() = Some(handler);
    }
}
