//! 日期/时间字段
//!
//! 字段本身是一个 input，通过值标记绑定；选择器只负责把选中的日期时间
//! 格式化后写进 input 并派发 `Input` 事件，由文本适配器立即写回数据。
//!
//! 日历一次渲染前、当前、后三个月，滑动或点箭头时整条平移一个月，
//! 动画结束后再围绕新的中心月重新加载三个月。

use crate::animation::{Animation, AnimationHandle, Easing, FrameScheduler, StyleAnimation};
use crate::config::UiConfig;
use crate::context::UiContext;
use crate::date_util;
use crate::dom::{Dom, NodeId};
use crate::event::{listener, Event, EventKind};
use crate::Rect;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeMode {
    Date,
    Time,
    DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerState {
    Closed,
    Calendar,
    Time,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeUnit {
    Hour,
    Minute,
}

impl TimeUnit {
    fn count(self) -> usize {
        match self {
            TimeUnit::Hour => 24,
            TimeUnit::Minute => 60,
        }
    }
}

#[derive(Default)]
struct PanelNodes {
    panel: Option<NodeId>,
    title: Option<NodeId>,
    viewport: Option<NodeId>,
    strip: Option<NodeId>,
    hours: Option<NodeId>,
    minutes: Option<NodeId>,
}

struct DateTimeInner {
    node: NodeId,
    mode: DateTimeMode,
    state: Cell<PickerState>,
    nodes: RefCell<PanelNodes>,
    /// 当前中心月 (年, 月)
    center: Cell<(i32, u32)>,
    today: Cell<NaiveDate>,
    drag_start: Cell<Option<f32>>,
    sliding: Cell<bool>,
    slide_anim: RefCell<Option<AnimationHandle>>,
    snap_anims: RefCell<Vec<AnimationHandle>>,
    frames: FrameScheduler,
    config: Rc<UiConfig>,
}

#[derive(Clone)]
pub struct DateTimeField {
    inner: Rc<DateTimeInner>,
}

impl DateTimeField {
    pub fn new(ctx: &UiContext, mode: DateTimeMode) -> Self {
        let dom = &ctx.dom;
        let node = dom.create_element("input");
        dom.set_attr(node, "type", "text");
        dom.set_attr(node, "readonly", "readonly");
        dom.add_class(node, "datetime-field");
        dom.set_attr(
            node,
            "data-mode",
            match mode {
                DateTimeMode::Date => "date",
                DateTimeMode::Time => "time",
                DateTimeMode::DateTime => "datetime",
            },
        );
        let today = Local::now().date_naive();
        let field = Self {
            inner: Rc::new(DateTimeInner {
                node,
                mode,
                state: Cell::new(PickerState::Closed),
                nodes: RefCell::new(PanelNodes::default()),
                center: Cell::new((today.year(), today.month())),
                today: Cell::new(today),
                drag_start: Cell::new(None),
                sliding: Cell::new(false),
                slide_anim: RefCell::new(None),
                snap_anims: RefCell::new(Vec::new()),
                frames: ctx.frames.clone(),
                config: ctx.config.clone(),
            }),
        };
        let this = field.clone();
        dom.add_listener(
            node,
            EventKind::Tap,
            listener(move |ev| {
                if this.state() == PickerState::Closed {
                    this.open(ev.dom);
                }
            }),
        );
        field
    }

    pub fn node(&self) -> NodeId {
        self.inner.node
    }

    pub fn mode(&self) -> DateTimeMode {
        self.inner.mode
    }

    pub fn state(&self) -> PickerState {
        self.inner.state.get()
    }

    pub fn panel(&self) -> Option<NodeId> {
        self.inner.nodes.borrow().panel
    }

    /// 当前中心月
    pub fn center_month(&self) -> (i32, u32) {
        self.inner.center.get()
    }

    /// 覆盖"今天"，决定无值时打开的月份
    pub fn set_today(&self, today: NaiveDate) {
        self.inner.today.set(today);
    }

    pub fn pattern(&self) -> &str {
        let config = &self.inner.config;
        match self.inner.mode {
            DateTimeMode::Date => &config.date_pattern,
            DateTimeMode::Time => &config.time_pattern,
            DateTimeMode::DateTime => &config.datetime_pattern,
        }
    }

    /// 解析字段当前文本
    pub fn value(&self, dom: &Dom) -> Option<NaiveDateTime> {
        date_util::parse(&dom.value(self.inner.node), self.pattern())
    }

    /// 格式化写入字段并派发 Input，绑定的写回钩子随之执行
    pub fn write(&self, dom: &Dom, value: NaiveDateTime) {
        let text = date_util::format(&value, self.pattern());
        dom.set_value(self.inner.node, &text);
        dom.dispatch(self.inner.node, &Event::Input);
        tracing::debug!(value = %text, "datetime written");
    }

    pub fn open(&self, dom: &Dom) {
        let inner = &self.inner;
        if inner.state.get() != PickerState::Closed {
            return;
        }
        let state = match inner.mode {
            DateTimeMode::Date => PickerState::Calendar,
            DateTimeMode::Time => PickerState::Time,
            DateTimeMode::DateTime => PickerState::Both,
        };
        inner.state.set(state);
        let anchor = self.value(dom).map(|v| v.date()).unwrap_or(inner.today.get());
        inner.center.set((anchor.year(), anchor.month()));

        let field = dom.rect(inner.node);
        let panel = dom.create_element("div");
        dom.add_class(panel, "datetime-panel");
        dom.set_style(panel, "position", "absolute");
        dom.set_style(panel, "left", "0px");
        dom.set_style(panel, "top", &format!("{}px", field.bottom()));
        dom.set_rect(panel, Rect::new(0.0, field.bottom(), inner.config.viewport().width, 0.0));
        inner.nodes.borrow_mut().panel = Some(panel);

        if matches!(state, PickerState::Calendar | PickerState::Both) {
            self.build_calendar(dom, panel);
        }
        if matches!(state, PickerState::Time | PickerState::Both) {
            self.build_time(dom, panel);
        }

        let done = dom.create_element("button");
        dom.add_class(done, "datetime-done");
        dom.set_text(done, "OK");
        let this = self.clone();
        dom.add_listener(
            done,
            EventKind::Tap,
            listener(move |ev| {
                ev.stop_propagation();
                this.close(ev.dom);
            }),
        );
        let _ = dom.append_child(panel, done);
        let _ = dom.append_child(dom.root(), panel);
        tracing::debug!(?state, "datetime picker opened");
    }

    pub fn close(&self, dom: &Dom) {
        let inner = &self.inner;
        if inner.state.get() == PickerState::Closed {
            return;
        }
        if let Some(anim) = inner.slide_anim.borrow_mut().take() {
            anim.cancel();
        }
        for anim in inner.snap_anims.borrow_mut().drain(..) {
            anim.cancel();
        }
        let nodes = std::mem::take(&mut *inner.nodes.borrow_mut());
        if let Some(panel) = nodes.panel {
            dom.remove(panel);
        }
        inner.sliding.set(false);
        inner.drag_start.set(None);
        inner.state.set(PickerState::Closed);
    }

    // ---- 日历 ----

    fn build_calendar(&self, dom: &Dom, panel: NodeId) {
        let calendar = dom.create_element("div");
        dom.add_class(calendar, "calendar");

        let header = dom.create_element("div");
        dom.add_class(header, "calendar-header");
        let prev = dom.create_element("button");
        dom.add_class(prev, "calendar-prev");
        dom.set_text(prev, "‹");
        let title = dom.create_element("span");
        dom.add_class(title, "calendar-title");
        let next = dom.create_element("button");
        dom.add_class(next, "calendar-next");
        dom.set_text(next, "›");
        for (button, delta) in [(prev, -1), (next, 1)] {
            let this = self.clone();
            dom.add_listener(
                button,
                EventKind::Tap,
                listener(move |ev| {
                    ev.stop_propagation();
                    this.slide(ev.dom, delta);
                }),
            );
        }
        for child in [prev, title, next] {
            let _ = dom.append_child(header, child);
        }

        let width = self.inner.config.viewport_width;
        let viewport = dom.create_element("div");
        dom.add_class(viewport, "calendar-viewport");
        dom.set_style(viewport, "overflow", "hidden");
        dom.set_rect(viewport, Rect::new(0.0, 0.0, width, 0.0));
        let strip = dom.create_element("div");
        dom.add_class(strip, "calendar-strip");
        dom.set_style(strip, "position", "relative");
        dom.set_style(strip, "width", "300%");
        let _ = dom.append_child(viewport, strip);
        self.install_swipe(dom, viewport);

        for child in [header, viewport] {
            let _ = dom.append_child(calendar, child);
        }
        let _ = dom.append_child(panel, calendar);
        {
            let mut nodes = self.inner.nodes.borrow_mut();
            nodes.title = Some(title);
            nodes.viewport = Some(viewport);
            nodes.strip = Some(strip);
        }
        self.load_window(dom);
    }

    fn calendar_width(&self, dom: &Dom) -> f32 {
        let viewport = self.inner.nodes.borrow().viewport;
        match viewport.map(|v| dom.rect(v).width) {
            Some(w) if w > 0.0 => w,
            _ => self.inner.config.viewport_width,
        }
    }

    /// 围绕中心月重新渲染三个月，并把条带复位到中间
    fn load_window(&self, dom: &Dom) {
        let (strip, title) = {
            let nodes = self.inner.nodes.borrow();
            (nodes.strip, nodes.title)
        };
        let Some(strip) = strip else { return };
        let (year, month) = self.inner.center.get();
        dom.clear_children(strip);
        for delta in -1..=1 {
            let (y, m) = date_util::shift_month(year, month, delta);
            let panel = self.render_month(dom, y, m);
            let _ = dom.append_child(strip, panel);
        }
        let width = self.calendar_width(dom);
        dom.set_style(strip, "left", &format!("{}px", -width));
        if let Some(title) = title {
            dom.set_text(title, &format!("{:04}-{:02}", year, month));
        }
    }

    fn render_month(&self, dom: &Dom, year: i32, month: u32) -> NodeId {
        let node = dom.create_element("div");
        dom.add_class(node, "calendar-month");
        dom.set_attr(node, "data-month", &format!("{:04}-{:02}", year, month));
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return node;
        };
        let offset = (first.weekday().num_days_from_sunday() + 7 - self.inner.config.first_weekday % 7) % 7;
        for _ in 0..offset {
            let blank = dom.create_element("span");
            dom.add_class(blank, "calendar-blank");
            let _ = dom.append_child(node, blank);
        }
        let selected = self.value(dom).map(|v| v.date());
        let today = self.inner.today.get();
        for day in 1..=date_util::days_in_month(year, month) {
            let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else { continue };
            let cell = dom.create_element("div");
            dom.add_class(cell, "calendar-day");
            dom.set_attr(cell, "data-date", &date.format("%Y-%m-%d").to_string());
            dom.set_text(cell, &day.to_string());
            if selected == Some(date) {
                dom.add_class(cell, "selected");
            }
            if date == today {
                dom.add_class(cell, "today");
            }
            let this = self.clone();
            dom.add_listener(
                cell,
                EventKind::Tap,
                listener(move |ev| {
                    ev.stop_propagation();
                    this.select_day(ev.dom, date);
                }),
            );
            let _ = dom.append_child(node, cell);
        }
        node
    }

    fn install_swipe(&self, dom: &Dom, viewport: NodeId) {
        let this = self.clone();
        dom.add_listener(
            viewport,
            EventKind::TouchStart,
            listener(move |ev| {
                if this.inner.sliding.get() {
                    return;
                }
                this.inner.drag_start.set(ev.event.point().map(|p| p.x));
            }),
        );
        let this = self.clone();
        dom.add_listener(
            viewport,
            EventKind::TouchMove,
            listener(move |ev| {
                let (Some(start), Some(p)) = (this.inner.drag_start.get(), ev.event.point()) else { return };
                let strip = this.inner.nodes.borrow().strip;
                if let Some(strip) = strip {
                    let width = this.calendar_width(ev.dom);
                    ev.dom.set_style(strip, "left", &format!("{}px", -width + (p.x - start)));
                }
            }),
        );
        let this = self.clone();
        dom.add_listener(
            viewport,
            EventKind::TouchEnd,
            listener(move |ev| {
                let Some(start) = this.inner.drag_start.take() else { return };
                let dx = ev.event.point().map(|p| p.x - start).unwrap_or(0.0);
                let width = this.calendar_width(ev.dom);
                if dx.abs() > width * this.inner.config.swipe_threshold {
                    this.slide(ev.dom, if dx < 0.0 { 1 } else { -1 });
                } else {
                    this.animate_strip(ev.dom, -width as f64, None);
                }
            }),
        );
    }

    /// 平移一个月（-1 上月，1 下月），动画结束后重新加载窗口
    pub fn slide(&self, dom: &Dom, delta: i32) {
        let inner = &self.inner;
        if inner.sliding.get() || inner.nodes.borrow().strip.is_none() {
            return;
        }
        inner.sliding.set(true);
        let width = self.calendar_width(dom) as f64;
        let target = -width - delta.signum() as f64 * width;
        let this = self.clone();
        let weak = dom.downgrade();
        self.animate_strip(
            dom,
            target,
            Some(Box::new(move || {
                let Some(dom) = weak.upgrade() else { return };
                let (y, m) = this.inner.center.get();
                this.inner.center.set(date_util::shift_month(y, m, delta.signum()));
                this.load_window(&dom);
                this.inner.sliding.set(false);
            })),
        );
    }

    fn animate_strip(&self, dom: &Dom, target: f64, then: Option<Box<dyn FnOnce()>>) {
        let Some(strip) = self.inner.nodes.borrow().strip else { return };
        if let Some(prev) = self.inner.slide_anim.borrow_mut().take() {
            prev.cancel();
        }
        let handle = StyleAnimation::new(strip, "left", target)
            .duration(self.inner.config.animation.calendar_slide_ms)
            .easing(Easing::EaseOut)
            .start(dom, &self.inner.frames, None);
        let handle = match then {
            Some(f) => handle.finish(f),
            None => handle,
        };
        *self.inner.slide_anim.borrow_mut() = Some(handle);
    }

    fn select_day(&self, dom: &Dom, date: NaiveDate) {
        let time = self.value(dom).map(|v| v.time()).unwrap_or(NaiveTime::MIN);
        self.write(dom, date.and_time(time));
        self.inner.center.set((date.year(), date.month()));
        self.load_window(dom);
        if self.inner.mode == DateTimeMode::Date {
            self.close(dom);
        }
    }

    // ---- 时间 ----

    fn build_time(&self, dom: &Dom, panel: NodeId) {
        let picker = dom.create_element("div");
        dom.add_class(picker, "time-picker");
        let current = self.value(dom).map(|v| v.time()).unwrap_or(NaiveTime::MIN);
        let hours = self.build_column(dom, TimeUnit::Hour, current.hour() as usize);
        let minutes = self.build_column(dom, TimeUnit::Minute, current.minute() as usize);
        for column in [hours, minutes] {
            let _ = dom.append_child(picker, column);
        }
        let _ = dom.append_child(panel, picker);
        let mut nodes = self.inner.nodes.borrow_mut();
        nodes.hours = Some(hours);
        nodes.minutes = Some(minutes);
    }

    fn build_column(&self, dom: &Dom, unit: TimeUnit, selected: usize) -> NodeId {
        let row_height = self.inner.config.time_row_height;
        let column = dom.create_element("div");
        dom.add_class(column, "time-column");
        dom.add_class(column, if unit == TimeUnit::Hour { "hours" } else { "minutes" });
        dom.set_style(column, "overflow-y", "scroll");
        for i in 0..unit.count() {
            let row = dom.create_element("div");
            dom.add_class(row, "time-row");
            if i == selected {
                dom.add_class(row, "selected");
            }
            dom.set_text(row, &format!("{:02}", i));
            dom.set_style(row, "height", &format!("{}px", row_height));
            let _ = dom.append_child(column, row);
        }
        dom.set_scroll_top(column, selected as f32 * row_height);

        let this = self.clone();
        dom.add_listener(column, EventKind::TouchEnd, listener(move |ev| this.snap_column(ev.dom, unit)));
        column
    }

    fn column(&self, unit: TimeUnit) -> Option<NodeId> {
        let nodes = self.inner.nodes.borrow();
        match unit {
            TimeUnit::Hour => nodes.hours,
            TimeUnit::Minute => nodes.minutes,
        }
    }

    /// 松手后吸附到最近的一行，结束时写回
    fn snap_column(&self, dom: &Dom, unit: TimeUnit) {
        let Some(column) = self.column(unit) else { return };
        let row_height = self.inner.config.time_row_height;
        let from = dom.scroll_top(column);
        let index = if row_height > 0.0 {
            ((from / row_height).round().max(0.0) as usize).min(unit.count() - 1)
        } else {
            0
        };
        let target = index as f32 * row_height;

        let weak = dom.downgrade();
        let on_frame = {
            let weak = weak.clone();
            move |frame: crate::animation::Frame| {
                if let Some(dom) = weak.upgrade() {
                    let top = if frame.progress >= 1.0 { target } else { from + (target - from) * frame.eased as f32 };
                    dom.set_scroll_top(column, top);
                }
            }
        };
        let this = self.clone();
        let handle = Animation::new(self.inner.config.animation.scroll_snap_ms, Easing::EaseOut, on_frame)
            .on_finish(move || {
                if let Some(dom) = weak.upgrade() {
                    this.set_time_part(&dom, unit, index);
                }
            })
            .start(&self.inner.frames, None);
        let mut anims = self.inner.snap_anims.borrow_mut();
        anims.retain(|a| a.is_active());
        anims.push(handle);
    }

    fn set_time_part(&self, dom: &Dom, unit: TimeUnit, index: usize) {
        if let Some(column) = self.column(unit) {
            for (i, row) in dom.children(column).into_iter().enumerate() {
                if i == index {
                    dom.add_class(row, "selected");
                } else {
                    dom.remove_class(row, "selected");
                }
            }
        }
        let base = self.value(dom).unwrap_or_else(|| {
            let date = if self.inner.mode == DateTimeMode::Time {
                NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(self.inner.today.get())
            } else {
                self.inner.today.get()
            };
            date.and_time(NaiveTime::MIN)
        });
        let updated = match unit {
            TimeUnit::Hour => base.with_hour(index as u32),
            TimeUnit::Minute => base.with_minute(index as u32),
        };
        if let Some(value) = updated {
            self.write(dom, value);
        }
    }
}
