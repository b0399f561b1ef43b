//! 日期/时间字段测试

use super::container;
use crate::binding::{bind_data, BindSpec, DataObject, Marker};
use crate::controls::{DateTimeField, DateTimeMode, PickerState};
use crate::dom::{Dom, NodeId};
use crate::UiRuntime;
use chrono::NaiveDate;
use serde_json::json;

fn bound_field(rt: &UiRuntime, mode: DateTimeMode, key: &str, data: &DataObject) -> DateTimeField {
    let ctx = rt.context().clone();
    let form = container(rt);
    let field = DateTimeField::new(&ctx, mode);
    field.set_today(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    rt.dom().set_binding(field.node(), BindSpec::new(Marker::Value, key));
    rt.dom().append_child(form, field.node()).unwrap();
    bind_data(rt.dom(), Some(data), form);
    field
}

fn months(dom: &Dom, panel: NodeId) -> Vec<String> {
    dom.query_all(panel, ".calendar-month")
        .into_iter()
        .filter_map(|m| dom.attr(m, "data-month"))
        .collect()
}

fn day(dom: &Dom, panel: NodeId, date: &str) -> NodeId {
    dom.query_all(panel, ".calendar-day")
        .into_iter()
        .find(|n| dom.attr(*n, "data-date").as_deref() == Some(date))
        .unwrap()
}

#[test]
fn test_calendar_renders_three_month_window() {
    let rt = UiRuntime::default();
    let data = DataObject::new(json!({"due": "2024-03-15"}));
    let field = bound_field(&rt, DateTimeMode::Date, "due", &data);
    rt.tap(field.node());
    assert_eq!(field.state(), PickerState::Calendar);
    let panel = field.panel().unwrap();
    assert_eq!(months(rt.dom(), panel), vec!["2024-02", "2024-03", "2024-04"]);
    assert!(rt.dom().has_class(day(rt.dom(), panel, "2024-03-15"), "selected"));
    assert!(rt.dom().has_class(day(rt.dom(), panel, "2024-03-01"), "today"));
}

#[test]
fn test_selecting_day_writes_back_immediately() {
    let rt = UiRuntime::default();
    let data = DataObject::new(json!({"due": "2024-03-15"}));
    let field = bound_field(&rt, DateTimeMode::Date, "due", &data);
    rt.tap(field.node());
    let panel = field.panel().unwrap();
    rt.tap(day(rt.dom(), panel, "2024-03-20"));
    assert_eq!(data.get("due"), json!("2024-03-20"));
    // 纯日期模式选中即关闭
    assert_eq!(field.state(), PickerState::Closed);
    assert!(!rt.dom().contains(panel));
}

#[test]
fn test_datetime_mode_keeps_time_and_stays_open() {
    let rt = UiRuntime::default();
    let data = DataObject::new(json!({"at": "2024-03-15 08:30"}));
    let field = bound_field(&rt, DateTimeMode::DateTime, "at", &data);
    rt.tap(field.node());
    assert_eq!(field.state(), PickerState::Both);
    let panel = field.panel().unwrap();
    rt.tap(day(rt.dom(), panel, "2024-03-02"));
    assert_eq!(data.get("at"), json!("2024-03-02 08:30"));
    assert_eq!(field.state(), PickerState::Both);
}

#[test]
fn test_arrow_slides_one_month_then_reloads() {
    let rt = UiRuntime::default();
    let data = DataObject::new(json!({"due": "2024-12-10"}));
    let field = bound_field(&rt, DateTimeMode::Date, "due", &data);
    rt.tap(field.node());
    let panel = field.panel().unwrap();
    let next = rt.dom().query(panel, ".calendar-next").unwrap();
    let strip = rt.dom().query(panel, ".calendar-strip").unwrap();
    assert_eq!(rt.dom().style(strip, "left").as_deref(), Some("-375px"));

    rt.tap(next);
    // 动画期间窗口不重建
    assert_eq!(field.center_month(), (2024, 12));
    rt.run_until_idle(16.0, 2000.0);
    assert_eq!(field.center_month(), (2025, 1));
    assert_eq!(months(rt.dom(), panel), vec!["2024-12", "2025-01", "2025-02"]);
    assert_eq!(rt.dom().style(strip, "left").as_deref(), Some("-375px"));
    let title = rt.dom().query(panel, ".calendar-title").unwrap();
    assert_eq!(rt.dom().text_content(title), "2025-01");
}

#[test]
fn test_swipe_past_threshold_changes_month() {
    let rt = UiRuntime::default();
    let data = DataObject::new(json!({"due": "2024-03-15"}));
    let field = bound_field(&rt, DateTimeMode::Date, "due", &data);
    rt.tap(field.node());
    let panel = field.panel().unwrap();
    let viewport = rt.dom().query(panel, ".calendar-viewport").unwrap();

    // 拖动不足阈值，回弹
    rt.touch_start(viewport, 200.0, 0.0);
    rt.touch_move(viewport, 170.0, 0.0);
    rt.touch_end(viewport, 170.0, 0.0);
    rt.run_until_idle(16.0, 2000.0);
    assert_eq!(field.center_month(), (2024, 3));

    rt.touch_start(viewport, 300.0, 0.0);
    rt.touch_move(viewport, 250.0, 0.0);
    rt.touch_end(viewport, 100.0, 0.0);
    rt.run_until_idle(16.0, 4000.0);
    assert_eq!(field.center_month(), (2024, 4));

    rt.touch_start(viewport, 100.0, 0.0);
    rt.touch_end(viewport, 300.0, 0.0);
    rt.run_until_idle(16.0, 6000.0);
    assert_eq!(field.center_month(), (2024, 3));
}

#[test]
fn test_time_column_snaps_and_writes_back() {
    let rt = UiRuntime::default();
    let data = DataObject::new(json!({"t": "07:30"}));
    let field = bound_field(&rt, DateTimeMode::Time, "t", &data);
    rt.tap(field.node());
    assert_eq!(field.state(), PickerState::Time);
    let panel = field.panel().unwrap();
    let hours = rt.dom().query(panel, ".time-column.hours").unwrap();
    assert_eq!(rt.dom().scroll_top(hours), 7.0 * 32.0);

    rt.scroll_to(hours, 9.4 * 32.0);
    rt.touch_end(hours, 0.0, 0.0);
    rt.run_until_idle(16.0, 2000.0);
    assert_eq!(rt.dom().scroll_top(hours), 9.0 * 32.0);
    assert_eq!(data.get("t"), json!("09:30"));

    let minutes = rt.dom().query(panel, ".time-column.minutes").unwrap();
    rt.scroll_to(minutes, 5000.0);
    rt.touch_end(minutes, 0.0, 0.0);
    rt.run_until_idle(16.0, 4000.0);
    assert_eq!(data.get("t"), json!("09:59"));
}

#[test]
fn test_done_button_closes() {
    let rt = UiRuntime::default();
    let data = DataObject::new(json!({"t": null}));
    let field = bound_field(&rt, DateTimeMode::Time, "t", &data);
    rt.tap(field.node());
    let panel = field.panel().unwrap();
    let done = rt.dom().query(panel, ".datetime-done").unwrap();
    rt.tap(done);
    assert_eq!(field.state(), PickerState::Closed);
    assert_eq!(data.get("t"), serde_json::Value::Null);
}
