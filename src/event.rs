//! 事件系统 - 宿主注入的交互事件与节点监听器

use crate::dom::{Dom, NodeId};
use crate::Point;
use std::cell::Cell;
use std::rc::Rc;

/// 事件
#[derive(Debug, Clone)]
pub enum Event {
    // 触摸/鼠标事件
    TouchStart(TouchEvent),
    TouchMove(TouchEvent),
    TouchEnd(TouchEvent),

    // 点击事件
    Tap(TapEvent),

    // 键盘事件
    KeyDown(KeyEvent),

    // 表单事件
    /// 编辑中值发生变化
    Input,
    /// 失去焦点
    Blur,
    Focus,
    Scroll(ScrollEvent),
}

/// 事件类型，用于匹配监听器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TouchStart,
    TouchMove,
    TouchEnd,
    Tap,
    KeyDown,
    Input,
    Blur,
    Focus,
    Scroll,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::TouchStart(_) => EventKind::TouchStart,
            Event::TouchMove(_) => EventKind::TouchMove,
            Event::TouchEnd(_) => EventKind::TouchEnd,
            Event::Tap(_) => EventKind::Tap,
            Event::KeyDown(_) => EventKind::KeyDown,
            Event::Input => EventKind::Input,
            Event::Blur => EventKind::Blur,
            Event::Focus => EventKind::Focus,
            Event::Scroll(_) => EventKind::Scroll,
        }
    }

    /// 焦点类事件不冒泡
    pub fn bubbles(&self) -> bool {
        !matches!(self, Event::Blur | Event::Focus | Event::Scroll(_))
    }

    /// 触摸或点击的位置
    pub fn point(&self) -> Option<Point> {
        match self {
            Event::TouchStart(t) | Event::TouchMove(t) | Event::TouchEnd(t) => t.point(),
            Event::Tap(t) => Some(Point::new(t.x, t.y)),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&KeyEvent> {
        match self {
            Event::KeyDown(k) => Some(k),
            _ => None,
        }
    }
}

/// 触摸事件
#[derive(Debug, Clone)]
pub struct TouchEvent {
    pub touches: Vec<Touch>,
    pub changed_touches: Vec<Touch>,
    pub timestamp: u64,
}

impl TouchEvent {
    /// 单点触摸
    pub fn single(x: f32, y: f32) -> Self {
        let touch = Touch::new(0, x, y);
        Self { touches: vec![touch.clone()], changed_touches: vec![touch], timestamp: 0 }
    }

    pub fn point(&self) -> Option<Point> {
        self.changed_touches.first().or(self.touches.first()).map(Touch::position)
    }
}

/// 单个触摸点
#[derive(Debug, Clone)]
pub struct Touch {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

impl Touch {
    pub fn new(id: u32, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// 点击事件
#[derive(Debug, Clone, Default)]
pub struct TapEvent {
    pub x: f32,
    pub y: f32,
    pub timestamp: u64,
}

/// 键盘事件，`key` 使用 DOM 键名（"Enter"、" "、"ArrowDown"...）
#[derive(Debug, Clone, Default)]
pub struct KeyEvent {
    pub key: String,
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: &str) -> Self {
        Self { key: key.to_string(), ..Default::default() }
    }

    /// Enter 或空格
    pub fn is_activate(&self) -> bool {
        self.key == "Enter" || self.key == " "
    }
}

/// 滚动事件
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollEvent {
    pub top: f32,
}

/// 分发给监听器的上下文
pub struct EventCtx<'a> {
    pub dom: &'a Dom,
    pub event: &'a Event,
    /// 事件的原始目标
    pub target: NodeId,
    /// 当前正在处理的节点
    pub current: NodeId,
    stopped: &'a Cell<bool>,
}

impl<'a> EventCtx<'a> {
    pub(crate) fn new(dom: &'a Dom, event: &'a Event, target: NodeId, current: NodeId, stopped: &'a Cell<bool>) -> Self {
        Self { dom, event, target, current, stopped }
    }

    /// 阻止继续冒泡
    pub fn stop_propagation(&self) {
        self.stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.stopped.get()
    }
}

/// 事件监听器
pub type Listener = Rc<dyn Fn(&EventCtx<'_>)>;

/// 包装闭包为监听器
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&EventCtx<'_>) + 'static,
{
    Rc::new(f)
}
