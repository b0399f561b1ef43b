//! 控件共享的运行环境

use crate::animation::FrameScheduler;
use crate::config::UiConfig;
use crate::dom::Dom;
use std::rc::Rc;

/// 视觉树、帧调度器与配置
#[derive(Clone)]
pub struct UiContext {
    pub dom: Dom,
    pub frames: FrameScheduler,
    pub config: Rc<UiConfig>,
}

impl UiContext {
    pub fn new(config: UiConfig) -> Self {
        Self {
            dom: Dom::new(),
            frames: FrameScheduler::with_capability(config.frames_available),
            config: Rc::new(config),
        }
    }
}

impl Default for UiContext {
    fn default() -> Self {
        Self::new(UiConfig::default())
    }
}
