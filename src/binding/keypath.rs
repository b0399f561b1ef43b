//! 键路径解析
//!
//! 点分路径逐段解析，数字段索引数组，也接受 `items[2]` 形式。
//! 缺失的路径解析为 `null`，不会报错。

use serde_json::{Map, Value as JsonValue};

/// 表示"整个对象"的路径
pub const WHOLE: &str = ".";

pub fn is_whole(path: &str) -> bool {
    let p = path.trim();
    p == WHOLE || p.is_empty()
}

fn segments(path: &str) -> Vec<String> {
    let mut out = Vec::new();
    for part in path.split('.').filter(|p| !p.is_empty()) {
        // 处理数组索引 item[0]
        match part.find('[') {
            Some(bracket_pos) => {
                let name = &part[..bracket_pos];
                if !name.is_empty() {
                    out.push(name.to_string());
                }
                for index in part[bracket_pos..].split(['[', ']']).filter(|s| !s.is_empty()) {
                    out.push(index.to_string());
                }
            }
            None => out.push(part.to_string()),
        }
    }
    out
}

fn step<'a>(current: &'a JsonValue, segment: &str) -> Option<&'a JsonValue> {
    match current {
        JsonValue::Object(map) => map.get(segment),
        JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn step_mut<'a>(current: &'a mut JsonValue, segment: &str) -> Option<&'a mut JsonValue> {
    match current {
        JsonValue::Object(map) => map.get_mut(segment),
        JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

/// 只读解析
pub fn resolve_ref<'a>(data: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    if is_whole(path) {
        return Some(data);
    }
    let mut current = data;
    for segment in segments(path) {
        current = step(current, &segment)?;
    }
    Some(current)
}

/// 解析为值，缺失时为 null
pub fn resolve(data: &JsonValue, path: &str) -> JsonValue {
    resolve_ref(data, path).cloned().unwrap_or(JsonValue::Null)
}

pub fn resolve_mut<'a>(data: &'a mut JsonValue, path: &str) -> Option<&'a mut JsonValue> {
    if is_whole(path) {
        return Some(data);
    }
    let mut current = data;
    for segment in segments(path) {
        current = step_mut(current, &segment)?;
    }
    Some(current)
}

/// 按路径写入；缺失的中间对象会被创建，数组越界写入被忽略
pub fn assign(data: &mut JsonValue, path: &str, value: JsonValue) -> bool {
    if is_whole(path) {
        *data = value;
        return true;
    }
    let segments = segments(path);
    let Some((last, parents)) = segments.split_last() else {
        return false;
    };
    let mut current = data;
    for segment in parents {
        if current.is_null() {
            *current = JsonValue::Object(Map::new());
        }
        current = match current {
            JsonValue::Object(map) => map
                .entry(segment.clone())
                .or_insert_with(|| JsonValue::Object(Map::new())),
            JsonValue::Array(items) => match segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                Some(v) => v,
                None => {
                    tracing::debug!(path, segment = %segment, "array index out of range");
                    return false;
                }
            },
            _ => {
                tracing::debug!(path, segment = %segment, "cannot descend into scalar");
                return false;
            }
        };
    }
    if current.is_null() {
        *current = JsonValue::Object(Map::new());
    }
    match current {
        JsonValue::Object(map) => {
            map.insert(last.clone(), value);
            true
        }
        JsonValue::Array(items) => match last.parse::<usize>() {
            Ok(i) if i < items.len() => {
                items[i] = value;
                true
            }
            Ok(i) if i == items.len() => {
                items.push(value);
                true
            }
            _ => {
                tracing::debug!(path, "array index out of range");
                false
            }
        },
        _ => false,
    }
}

/// 显示用文本：null 为空串，字符串不带引号
pub fn display(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Null => String::new(),
        _ => value.to_string(),
    }
}

pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().unwrap_or(0.0) != 0.0,
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

/// 数值或数字字符串
pub fn as_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_nested_and_missing() {
        let data = json!({"a": {"b": [10, {"c": "x"}]}});
        assert_eq!(resolve(&data, "a.b.0"), json!(10));
        assert_eq!(resolve(&data, "a.b[1].c"), json!("x"));
        assert_eq!(resolve(&data, "a.missing.deeper"), JsonValue::Null);
        assert_eq!(resolve(&data, "a.b.0.c"), JsonValue::Null);
        assert_eq!(resolve(&data, "."), data);
    }

    #[test]
    fn test_assign_creates_parents() {
        let mut data = json!({"name": null});
        assert!(assign(&mut data, "name", json!("Alice")));
        assert!(assign(&mut data, "address.city", json!("Oslo")));
        assert_eq!(data, json!({"name": "Alice", "address": {"city": "Oslo"}}));
    }

    #[test]
    fn test_assign_into_arrays() {
        let mut data = json!({"rows": [1, 2]});
        assert!(assign(&mut data, "rows.1", json!(5)));
        assert!(assign(&mut data, "rows.2", json!(6)));
        assert!(!assign(&mut data, "rows.9", json!(7)));
        assert!(!assign(&mut data, "rows.0.x", json!(7)));
        assert_eq!(data, json!({"rows": [1, 5, 6]}));
    }

    #[test]
    fn test_display_and_truthy() {
        assert_eq!(display(&JsonValue::Null), "");
        assert_eq!(display(&json!(3)), "3");
        assert_eq!(display(&json!("s")), "s");
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!("x")));
        assert_eq!(as_number(&json!(" 4.5 ")), Some(4.5));
    }
}
