//! 帧驱动动画：通用逐帧调度与样式插值

mod easing;
mod scheduler;
mod style_anim;

pub use easing::Easing;
pub use scheduler::{Animation, AnimationHandle, AnimationState, Frame, FrameScheduler};
pub use style_anim::{StyleAnimation, StyleNumber};
