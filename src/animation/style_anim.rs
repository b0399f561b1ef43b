//! 样式插值动画：驱动单个数值样式属性

use super::{Animation, AnimationHandle, Easing, FrameScheduler};
use crate::dom::{Dom, NodeId};

/// 自动追加 px 的几何属性
const GEOMETRIC: &[&str] = &[
    "width", "height", "left", "top", "right", "bottom",
    "margin", "margin-left", "margin-right", "margin-top", "margin-bottom",
    "padding", "padding-left", "padding-right", "padding-top", "padding-bottom",
    "min-width", "min-height", "max-width", "max-height",
    "font-size", "border-width",
];

/// 百分比按宽度解析的属性，其余按高度
const HORIZONTAL: &[&str] = &[
    "width", "left", "right", "margin-left", "margin-right",
    "padding-left", "padding-right", "min-width", "max-width",
];

/// 起始值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StyleNumber {
    Value(f64),
    /// 相对节点当前盒尺寸的百分比
    Percent(f64),
}

impl StyleNumber {
    /// 解析 "12px" / "50%" / "0.4"
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(p) = s.strip_suffix('%') {
            return p.trim().parse().ok().map(StyleNumber::Percent);
        }
        let numeric: String = s
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-' || *c == '+' || *c == 'e')
            .collect();
        numeric.parse().ok().map(StyleNumber::Value)
    }
}

/// 样式属性动画
pub struct StyleAnimation {
    node: NodeId,
    property: String,
    begin: Option<StyleNumber>,
    finish: f64,
    duration: f64,
    easing: Easing,
    unit: Option<String>,
}

impl StyleAnimation {
    pub fn new(node: NodeId, property: &str, finish: f64) -> Self {
        Self {
            node,
            property: property.to_string(),
            begin: None,
            finish,
            duration: 300.0,
            easing: Easing::EaseInOut,
            unit: None,
        }
    }

    pub fn begin(mut self, value: f64) -> Self {
        self.begin = Some(StyleNumber::Value(value));
        self
    }

    pub fn begin_percent(mut self, percent: f64) -> Self {
        self.begin = Some(StyleNumber::Percent(percent));
        self
    }

    pub fn duration(mut self, ms: f64) -> Self {
        self.duration = ms;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// 覆盖推断出的单位
    pub fn unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    fn infer_unit(property: &str) -> &'static str {
        if GEOMETRIC.contains(&property) { "px" } else { "" }
    }

    /// 把起始值解析为数值；未给出时读取节点当前样式，再退回到节点的盒
    pub fn resolve_begin(&self, dom: &Dom) -> f64 {
        let begin = self
            .begin
            .or_else(|| dom.style(self.node, &self.property).and_then(|s| StyleNumber::parse(&s)));
        match begin {
            Some(StyleNumber::Value(v)) => v,
            Some(StyleNumber::Percent(p)) => {
                let rect = dom.rect(self.node);
                let basis = if HORIZONTAL.contains(&self.property.as_str()) { rect.width } else { rect.height };
                basis as f64 * p / 100.0
            }
            None => self.box_value(dom).unwrap_or(0.0),
        }
    }

    fn box_value(&self, dom: &Dom) -> Option<f64> {
        let rect = dom.rect(self.node);
        let v = match self.property.as_str() {
            "width" => rect.width,
            "height" => rect.height,
            "left" => rect.x,
            "top" => rect.y,
            _ => return None,
        };
        Some(v as f64)
    }

    pub fn start(self, dom: &Dom, frames: &FrameScheduler, delay_ms: Option<f64>) -> AnimationHandle {
        let begin = self.resolve_begin(dom);
        let finish = self.finish;
        let unit = self.unit.clone().unwrap_or_else(|| Self::infer_unit(&self.property).to_string());
        let weak = dom.downgrade();
        let node = self.node;
        let property = self.property;
        Animation::new(self.duration, self.easing, move |frame| {
            // 文档已释放或节点已移除时这一帧什么也不做
            let Some(dom) = weak.upgrade() else { return };
            let value = begin + (finish - begin) * frame.eased;
            dom.set_style(node, &property, &format_number(value, &unit));
        })
        .start(frames, delay_ms)
    }
}

fn format_number(value: f64, unit: &str) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    format!("{}{}", rounded, unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rect;

    #[test]
    fn test_infers_begin_and_px_unit() {
        let dom = Dom::new();
        let frames = FrameScheduler::new();
        let n = dom.create_element("div");
        dom.set_style(n, "height", "40px");
        StyleAnimation::new(n, "height", 0.0)
            .duration(100.0)
            .easing(Easing::Linear)
            .start(&dom, &frames, None);
        frames.tick(0.0);
        assert_eq!(dom.style(n, "height").as_deref(), Some("40px"));
        frames.tick(25.0);
        assert_eq!(dom.style(n, "height").as_deref(), Some("30px"));
        frames.tick(100.0);
        assert_eq!(dom.style(n, "height").as_deref(), Some("0px"));
    }

    #[test]
    fn test_percent_begin_resolves_against_box() {
        let dom = Dom::new();
        let n = dom.create_element("div");
        dom.set_rect(n, Rect::new(0.0, 0.0, 300.0, 50.0));
        let anim = StyleAnimation::new(n, "left", 0.0).begin_percent(-100.0);
        assert_eq!(anim.resolve_begin(&dom), -300.0);
        dom.set_style(n, "top", "50%");
        assert_eq!(StyleAnimation::new(n, "top", 0.0).resolve_begin(&dom), 25.0);
    }

    #[test]
    fn test_missing_begin_falls_back_to_box() {
        let dom = Dom::new();
        let n = dom.create_element("div");
        dom.set_rect(n, Rect::new(8.0, 16.0, 120.0, 48.0));
        assert_eq!(StyleAnimation::new(n, "height", 0.0).resolve_begin(&dom), 48.0);
        assert_eq!(StyleAnimation::new(n, "width", 0.0).resolve_begin(&dom), 120.0);
        assert_eq!(StyleAnimation::new(n, "top", 0.0).resolve_begin(&dom), 16.0);
        // 内联样式优先于盒
        dom.set_style(n, "height", "10px");
        assert_eq!(StyleAnimation::new(n, "height", 0.0).resolve_begin(&dom), 10.0);
        // 没有盒对应的属性仍从 0 开始
        assert_eq!(StyleAnimation::new(n, "opacity", 1.0).resolve_begin(&dom), 0.0);

        let frames = FrameScheduler::new();
        let m = dom.create_element("div");
        dom.set_rect(m, Rect::new(0.0, 0.0, 200.0, 0.0));
        StyleAnimation::new(m, "width", 100.0).duration(100.0).easing(Easing::Linear).start(&dom, &frames, None);
        frames.tick(0.0);
        assert_eq!(dom.style(m, "width").as_deref(), Some("200px"));
        frames.tick(50.0);
        assert_eq!(dom.style(m, "width").as_deref(), Some("150px"));
    }

    #[test]
    fn test_non_geometric_has_no_unit() {
        let dom = Dom::new();
        let frames = FrameScheduler::new();
        let n = dom.create_element("div");
        StyleAnimation::new(n, "opacity", 1.0).begin(0.0).duration(10.0).start(&dom, &frames, None);
        frames.tick(0.0);
        frames.tick(10.0);
        assert_eq!(dom.style(n, "opacity").as_deref(), Some("1"));
    }

    #[test]
    fn test_detached_node_frames_are_harmless() {
        let dom = Dom::new();
        let frames = FrameScheduler::new();
        let n = dom.create_element("div");
        let handle = StyleAnimation::new(n, "width", 10.0).begin(0.0).duration(10.0).start(&dom, &frames, None);
        dom.remove(n);
        frames.tick(0.0);
        frames.tick(20.0);
        assert_eq!(handle.state(), crate::animation::AnimationState::Finished);
    }
}
