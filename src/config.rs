//! 运行时配置

use crate::error::UiResult;
use crate::geometry::Size;
use serde::Deserialize;

/// 动画时长配置（毫秒）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub checkbox_ms: f64,
    pub select_ms: f64,
    pub calendar_slide_ms: f64,
    pub scroll_snap_ms: f64,
    pub row_fade_ms: f64,
    /// 表格新行按行号错开的延迟
    pub row_stagger_ms: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            checkbox_ms: 200.0,
            select_ms: 150.0,
            calendar_slide_ms: 250.0,
            scroll_snap_ms: 120.0,
            row_fade_ms: 300.0,
            row_stagger_ms: 40.0,
        }
    }
}

/// 运行时配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// 宿主是否提供逐帧调度
    pub frames_available: bool,
    pub animation: AnimationConfig,
    pub select_item_height: f32,
    pub select_max_height: f32,
    pub time_row_height: f32,
    /// 日历拖动超过视口宽度的该比例才翻月
    pub swipe_threshold: f32,
    /// 0 = 周日，1 = 周一
    pub first_weekday: u32,
    pub date_pattern: String,
    pub time_pattern: String,
    pub datetime_pattern: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            viewport_width: 375.0,
            viewport_height: 667.0,
            frames_available: true,
            animation: AnimationConfig::default(),
            select_item_height: 32.0,
            select_max_height: 240.0,
            time_row_height: 32.0,
            swipe_threshold: 0.2,
            first_weekday: 0,
            date_pattern: "%Y-%m-%d".to_string(),
            time_pattern: "%H:%M".to_string(),
            datetime_pattern: "%Y-%m-%d %H:%M".to_string(),
        }
    }
}

impl UiConfig {
    /// 从 JSON 加载，缺失字段取默认值
    pub fn from_json_str(s: &str) -> UiResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn viewport(&self) -> Size {
        Size::new(self.viewport_width, self.viewport_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg = UiConfig::from_json_str(r#"{"viewport_height": 400, "animation": {"select_ms": 90}}"#).unwrap();
        assert_eq!(cfg.viewport_height, 400.0);
        assert_eq!(cfg.viewport_width, 375.0);
        assert_eq!(cfg.animation.select_ms, 90.0);
        assert_eq!(cfg.animation.checkbox_ms, 200.0);
        assert_eq!(cfg.viewport(), Size::new(375.0, 400.0));
    }

    #[test]
    fn test_invalid_config_is_error() {
        assert!(UiConfig::from_json_str("[1, 2]").is_err());
    }
}
