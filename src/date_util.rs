//! 日期格式化与解析（chrono strftime 模式）

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub fn format(value: &NaiveDateTime, pattern: &str) -> String {
    value.format(pattern).to_string()
}

/// 依次尝试完整日期时间、纯日期（零点）、纯时间（1970-01-01）
pub fn parse(text: &str, pattern: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, pattern) {
        return Some(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, pattern) {
        return d.and_hms_opt(0, 0, 0);
    }
    if let Ok(t) = NaiveTime::parse_from_str(text, pattern) {
        return NaiveDate::from_ymd_opt(1970, 1, 1).map(|d| d.and_time(t));
    }
    None
}

/// 相对某月偏移若干个月
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let total = year * 12 + month as i32 - 1 + delta;
    (total.div_euclid(12), total.rem_euclid(12) as u32 + 1)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = shift_month(year, month, 1);
    match (NaiveDate::from_ymd_opt(year, month, 1), NaiveDate::from_ymd_opt(ny, nm, 1)) {
        (Some(a), Some(b)) => (b - a).num_days() as u32,
        _ => 30,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_only_parses_to_midnight() {
        let dt = parse("2024-02-29", "%Y-%m-%d").unwrap();
        assert_eq!(format(&dt, "%Y-%m-%d %H:%M"), "2024-02-29 00:00");
        assert!(parse("", "%Y-%m-%d").is_none());
        assert!(parse("nope", "%Y-%m-%d").is_none());
    }

    #[test]
    fn test_time_only_pattern() {
        let dt = parse("07:45", "%H:%M").unwrap();
        assert_eq!(format(&dt, "%H:%M"), "07:45");
    }

    #[test]
    fn test_month_math() {
        assert_eq!(shift_month(2024, 1, -1), (2023, 12));
        assert_eq!(shift_month(2024, 12, 1), (2025, 1));
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 12), 31);
    }
}
