//! 运行时门面：持有视觉树、帧调度器、配置与样式注册表，
//! 并把宿主的输入转换为节点事件。

use crate::animation::FrameScheduler;
use crate::config::UiConfig;
use crate::context::UiContext;
use crate::dom::{Dom, NodeId};
use crate::error::UiResult;
use crate::event::{Event, KeyEvent, ScrollEvent, TapEvent, TouchEvent};
use crate::factory::{self, Descriptor};
use crate::style::{StyleDesc, StyleRegistry};

/// 运行时
pub struct UiRuntime {
    ctx: UiContext,
    styles: StyleRegistry,
}

impl UiRuntime {
    pub fn new(config: UiConfig) -> Self {
        Self { ctx: UiContext::new(config), styles: StyleRegistry::new() }
    }

    pub fn from_json_config(s: &str) -> UiResult<Self> {
        Ok(Self::new(UiConfig::from_json_str(s)?))
    }

    /// 注册控件的基础样式
    pub fn init(&mut self) {
        self.styles.init();
        self.styles.upsert_rule(
            ".checkbox",
            &StyleDesc::new()
                .set("display", "inline-block")
                .set("width", 20)
                .set("height", 20)
                .nest(".checkmark", StyleDesc::new().set("transition", "none")),
        );
        self.styles.upsert_rule(
            ".slider",
            &StyleDesc::new()
                .set("position", "relative")
                .nest(".slider-fill", StyleDesc::new().set("height", 4))
                .nest(".slider-thumb", StyleDesc::new().set("position", "absolute").set("width", 16).set("height", 16)),
        );
        self.styles.upsert_rule(
            ".select-panel",
            &StyleDesc::new()
                .set("z-index", 1000)
                .set("background", "#fff")
                .nest(".select-item.focused", StyleDesc::new().set("background", "#eef")),
        );
        self.styles.upsert_rule(".calendar-day.selected", &StyleDesc::new().set("font-weight", 600));
        self.styles.upsert_rule(".time-row.selected", &StyleDesc::new().set("font-weight", 600));
        self.styles.upsert_rule(".table-row.highlighted", &StyleDesc::new().set("background", "#ffd !important"));
        tracing::info!(rules = self.styles.rules().len(), "runtime initialised");
    }

    pub fn context(&self) -> &UiContext {
        &self.ctx
    }

    pub fn dom(&self) -> &Dom {
        &self.ctx.dom
    }

    pub fn frames(&self) -> &FrameScheduler {
        &self.ctx.frames
    }

    pub fn config(&self) -> &UiConfig {
        &self.ctx.config
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut StyleRegistry {
        &mut self.styles
    }

    /// 构造节点并挂到根节点下
    pub fn mount(&self, desc: &Descriptor) -> Option<NodeId> {
        let node = factory::create(self.dom(), desc)?;
        self.dom().append_child(self.dom().root(), node).ok()?;
        Some(node)
    }

    /// 推进一帧
    pub fn update(&self, now_ms: f64) {
        self.ctx.frames.tick(now_ms);
    }

    /// 按时间步进直到没有待执行的帧或到达 until_ms
    pub fn run_until_idle(&self, step_ms: f64, until_ms: f64) {
        let mut now = self.ctx.frames.now();
        loop {
            self.update(now);
            if self.ctx.frames.is_idle() || now >= until_ms {
                break;
            }
            now += step_ms.max(1.0);
        }
    }

    pub fn tap(&self, node: NodeId) {
        let rect = self.dom().rect(node);
        let tap = TapEvent { x: rect.x + rect.width / 2.0, y: rect.y + rect.height / 2.0, timestamp: 0 };
        self.dom().dispatch(node, &Event::Tap(tap));
    }

    /// 键盘事件发给焦点节点，没有焦点时发给根节点
    pub fn key(&self, key: &str) {
        let target = self.dom().focused().filter(|n| self.dom().is_attached(*n)).unwrap_or(self.dom().root());
        self.dom().dispatch(target, &Event::KeyDown(KeyEvent::new(key)));
    }

    /// 聚焦并输入文本，派发 Input
    pub fn type_text(&self, node: NodeId, text: &str) {
        self.dom().focus(node);
        self.dom().set_value(node, text);
        self.dom().dispatch(node, &Event::Input);
    }

    pub fn focus(&self, node: NodeId) {
        self.dom().focus(node);
    }

    pub fn blur(&self) {
        self.dom().blur();
    }

    pub fn touch_start(&self, node: NodeId, x: f32, y: f32) {
        self.dom().dispatch(node, &Event::TouchStart(TouchEvent::single(x, y)));
    }

    pub fn touch_move(&self, node: NodeId, x: f32, y: f32) {
        self.dom().dispatch(node, &Event::TouchMove(TouchEvent::single(x, y)));
    }

    pub fn touch_end(&self, node: NodeId, x: f32, y: f32) {
        self.dom().dispatch(node, &Event::TouchEnd(TouchEvent::single(x, y)));
    }

    pub fn scroll_to(&self, node: NodeId, top: f32) {
        self.dom().set_scroll_top(node, top);
        self.dom().dispatch(node, &Event::Scroll(ScrollEvent { top }));
    }
}

impl Default for UiRuntime {
    fn default() -> Self {
        Self::new(UiConfig::default())
    }
}
