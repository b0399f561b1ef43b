//! 逐帧调度器
//!
//! 宿主每次刷新调用 [`FrameScheduler::tick`]。帧回调串行执行，
//! 一个实例只在上一帧返回后才登记下一帧。

use super::Easing;
use crate::error::{report, UiError};
use std::cell::RefCell;
use std::rc::Rc;

/// 一帧的进度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// 线性进度 [0, 1]
    pub progress: f64,
    /// 缓动后的进度
    pub eased: f64,
}

/// 动画实例状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    Idle,
    Scheduled,
    Running,
    Finished,
    Cancelled,
}

type FrameFn = Box<dyn FnMut(Frame)>;
type FinishFn = Box<dyn FnOnce()>;

struct Task {
    duration: f64,
    easing: Easing,
    start_time: Option<f64>,
    state: AnimationState,
    progress: f64,
    on_frame: Option<FrameFn>,
    on_finish: Option<FinishFn>,
}

type TaskRef = Rc<RefCell<Task>>;

/// 已经过 `elapsed` 毫秒时的线性进度
pub fn progress_at(elapsed: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 1.0;
    }
    (elapsed / duration).clamp(0.0, 1.0)
}

/// 未启动的动画实例
pub struct Animation {
    task: Task,
}

impl Animation {
    pub fn new<F>(duration_ms: f64, easing: Easing, on_frame: F) -> Self
    where
        F: FnMut(Frame) + 'static,
    {
        Self {
            task: Task {
                duration: duration_ms,
                easing,
                start_time: None,
                state: AnimationState::Idle,
                progress: 0.0,
                on_frame: Some(Box::new(on_frame)),
                on_finish: None,
            },
        }
    }

    /// 完成回调，在最后一帧回调之后同步调用一次
    pub fn on_finish<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        self.task.on_finish = Some(Box::new(f));
        self
    }

    /// 登记首帧（可选延迟），返回可链式调用的句柄
    pub fn start(self, frames: &FrameScheduler, delay_ms: Option<f64>) -> AnimationHandle {
        let task = Rc::new(RefCell::new(self.task));
        task.borrow_mut().state = AnimationState::Scheduled;
        frames.schedule(task.clone(), delay_ms.unwrap_or(0.0));
        AnimationHandle { task }
    }
}

/// 运行中动画的句柄
#[derive(Clone)]
pub struct AnimationHandle {
    task: TaskRef,
}

impl AnimationHandle {
    /// 注册完成回调（替换之前的）；已完成时立即调用
    pub fn finish<F>(self, f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        let state = self.task.borrow().state;
        match state {
            AnimationState::Finished => f(),
            AnimationState::Cancelled => {}
            _ => self.task.borrow_mut().on_finish = Some(Box::new(f)),
        }
        self
    }

    /// 取消：后续帧成为空操作，完成回调不会触发
    pub fn cancel(&self) {
        let mut t = self.task.borrow_mut();
        if t.state != AnimationState::Finished {
            t.state = AnimationState::Cancelled;
            t.on_frame = None;
            t.on_finish = None;
        }
    }

    pub fn state(&self) -> AnimationState {
        self.task.borrow().state
    }

    /// 最近一帧的线性进度
    pub fn progress(&self) -> f64 {
        self.task.borrow().progress
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state(), AnimationState::Scheduled | AnimationState::Running)
    }
}

struct SchedulerInner {
    now: f64,
    frames_available: bool,
    warned: bool,
    frame_queue: Vec<TaskRef>,
    timers: Vec<(f64, TaskRef)>,
    deferred: Vec<FinishFn>,
}

/// 帧调度器句柄
#[derive(Clone)]
pub struct FrameScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::with_capability(true)
    }

    /// 宿主没有逐帧能力时，动画直接以进度 1 完成
    pub fn without_frames() -> Self {
        Self::with_capability(false)
    }

    pub fn with_capability(frames_available: bool) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                now: 0.0,
                frames_available,
                warned: false,
                frame_queue: Vec::new(),
                timers: Vec::new(),
                deferred: Vec::new(),
            })),
        }
    }

    pub fn frames_available(&self) -> bool {
        self.inner.borrow().frames_available
    }

    /// 最近一次 tick 的时间
    pub fn now(&self) -> f64 {
        self.inner.borrow().now
    }

    /// 等待中的帧、定时器与延后回调数
    pub fn pending(&self) -> usize {
        let inner = self.inner.borrow();
        inner.frame_queue.len() + inner.timers.len() + inner.deferred.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// 下一次 tick 时执行回调
    pub fn defer<F>(&self, f: F)
    where
        F: FnOnce() + 'static,
    {
        if !self.frames_available() {
            f();
            return;
        }
        self.inner.borrow_mut().deferred.push(Box::new(f));
    }

    fn schedule(&self, task: TaskRef, delay_ms: f64) {
        if !self.frames_available() {
            self.warn_unavailable();
            let now = self.now();
            let duration = task.borrow().duration;
            // 直接跑到进度 1
            task.borrow_mut().start_time = Some(now - duration);
            Self::run_frame(&task, now);
            return;
        }
        let mut inner = self.inner.borrow_mut();
        if delay_ms > 0.0 {
            let due = inner.now + delay_ms;
            inner.timers.push((due, task));
        } else {
            inner.frame_queue.push(task);
        }
    }

    fn warn_unavailable(&self) {
        let mut inner = self.inner.borrow_mut();
        if !inner.warned {
            inner.warned = true;
            drop(inner);
            report(&UiError::CapabilityUnavailable("frame scheduling"));
        }
    }

    /// 宿主刷新：执行延后回调、到期定时器与本帧的动画
    pub fn tick(&self, now_ms: f64) {
        let (deferred, queue) = {
            let mut inner = self.inner.borrow_mut();
            inner.now = inner.now.max(now_ms);
            let now = inner.now;
            let deferred = std::mem::take(&mut inner.deferred);
            let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut inner.timers)
                .into_iter()
                .partition(|(at, _)| *at <= now);
            inner.timers = waiting;
            let mut queue = std::mem::take(&mut inner.frame_queue);
            queue.extend(due.into_iter().map(|(_, t)| t));
            (deferred, queue)
        };

        for f in deferred {
            f();
        }

        let now = self.now();
        for task in queue {
            if Self::run_frame(&task, now) {
                self.inner.borrow_mut().frame_queue.push(task);
            }
        }
    }

    /// 执行一帧，返回是否需要下一帧
    fn run_frame(task: &TaskRef, now: f64) -> bool {
        let (frame, mut on_frame) = {
            let mut t = task.borrow_mut();
            if t.state == AnimationState::Cancelled || t.state == AnimationState::Finished {
                return false;
            }
            let start = *t.start_time.get_or_insert(now);
            t.state = AnimationState::Running;
            // 单调不减
            let progress = progress_at(now - start, t.duration).max(t.progress);
            t.progress = progress;
            let frame = Frame { progress, eased: t.easing.apply(progress) };
            (frame, t.on_frame.take())
        };

        if let Some(cb) = on_frame.as_mut() {
            cb(frame);
        }

        let finish = {
            let mut t = task.borrow_mut();
            if t.state == AnimationState::Cancelled {
                return false;
            }
            if frame.progress < 1.0 {
                t.on_frame = on_frame;
                return true;
            }
            t.state = AnimationState::Finished;
            t.on_finish.take()
        };
        if let Some(f) = finish {
            f();
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn recorder() -> (Rc<RefCell<Vec<f64>>>, impl FnMut(Frame)) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        (seen, move |f: Frame| s.borrow_mut().push(f.progress))
    }

    #[test]
    fn test_boundary_progress_and_single_finish() {
        let frames = FrameScheduler::new();
        let (seen, on_frame) = recorder();
        let finished = Rc::new(Cell::new(0));
        let fin = finished.clone();
        let handle = Animation::new(100.0, Easing::Linear, on_frame)
            .start(&frames, None)
            .finish(move || fin.set(fin.get() + 1));
        assert_eq!(handle.state(), AnimationState::Scheduled);

        frames.tick(0.0);
        assert_eq!(seen.borrow().as_slice(), &[0.0]);
        frames.tick(50.0);
        frames.tick(150.0);
        frames.tick(300.0);
        assert_eq!(seen.borrow().as_slice(), &[0.0, 0.5, 1.0]);
        assert_eq!(finished.get(), 1);
        assert_eq!(handle.state(), AnimationState::Finished);
        assert!(frames.is_idle());
    }

    #[test]
    fn test_finish_runs_after_last_frame() {
        let frames = FrameScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let l1 = log.clone();
        let l2 = log.clone();
        Animation::new(10.0, Easing::EaseOut, move |f| l1.borrow_mut().push(format!("frame {}", f.progress)))
            .on_finish(move || l2.borrow_mut().push("done".to_string()))
            .start(&frames, None);
        frames.tick(0.0);
        frames.tick(10.0);
        assert_eq!(log.borrow().as_slice(), &["frame 0", "frame 1", "done"]);
    }

    #[test]
    fn test_delay_defers_first_frame() {
        let frames = FrameScheduler::new();
        let (seen, on_frame) = recorder();
        frames.tick(1000.0);
        Animation::new(100.0, Easing::Linear, on_frame).start(&frames, Some(50.0));
        frames.tick(1020.0);
        assert!(seen.borrow().is_empty());
        frames.tick(1050.0);
        assert_eq!(seen.borrow().as_slice(), &[0.0]);
    }

    #[test]
    fn test_cancel_is_inert() {
        let frames = FrameScheduler::new();
        let (seen, on_frame) = recorder();
        let finished = Rc::new(Cell::new(false));
        let fin = finished.clone();
        let handle = Animation::new(100.0, Easing::Linear, on_frame)
            .on_finish(move || fin.set(true))
            .start(&frames, None);
        frames.tick(0.0);
        handle.cancel();
        frames.tick(200.0);
        assert_eq!(seen.borrow().len(), 1);
        assert!(!finished.get());
        assert_eq!(handle.state(), AnimationState::Cancelled);
        assert!(frames.is_idle());
    }

    #[test]
    fn test_without_frames_completes_immediately() {
        let frames = FrameScheduler::without_frames();
        let (seen, on_frame) = recorder();
        let finished = Rc::new(Cell::new(0));
        let fin = finished.clone();
        let handle = Animation::new(300.0, Easing::EaseIn, on_frame)
            .on_finish(move || fin.set(fin.get() + 1))
            .start(&frames, Some(100.0));
        assert_eq!(seen.borrow().as_slice(), &[1.0]);
        assert_eq!(finished.get(), 1);
        // 已完成后注册的回调立即执行
        let again = finished.clone();
        handle.finish(move || again.set(again.get() + 10));
        assert_eq!(finished.get(), 11);
    }

    #[test]
    fn test_zero_duration_finishes_on_first_frame() {
        assert_eq!(progress_at(0.0, 0.0), 1.0);
        assert_eq!(progress_at(0.0, 10.0), 0.0);
        assert_eq!(progress_at(25.0, 10.0), 1.0);
    }
}
