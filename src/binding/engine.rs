//! 绑定引擎
//!
//! 遍历子树一次，找出所有带标记的节点，读取初始值写入节点，
//! 并按节点类型安装唯一的写回钩子。
//!
//! 查询覆盖整棵子树（含根节点），内部独立绑定的区域也会被外层再次绑定，
//! 最后一次绑定生效。

use super::adapters::{text_value, Label, TextInput};
use super::control::{BindableControl, ControlValue, DataBindHandler};
use super::data::{BoundData, DataObject};
use super::keypath;
use super::marker::{BindSpec, Marker};
use crate::controls::ObservedList;
use crate::dom::{Dom, NodeId};
use crate::error::{recover, report, UiError, UiResult};
use serde_json::Value as JsonValue;
use std::rc::Rc;

/// 绑定数据到子树；data 为 None 时什么也不做。
/// 返回值（可能被替换为观察列表）是调用方新的数据源。
pub fn bind_data(dom: &Dom, data: Option<&DataObject>, root: NodeId) -> Option<BoundData> {
    let data = data?;
    recover(bind_subtree(dom, data, root))
}

fn bind_subtree(dom: &Dom, data: &DataObject, root: NodeId) -> UiResult<BoundData> {
    if !data.is_bindable() {
        return Err(UiError::NotBindable("data"));
    }
    if !dom.contains(root) {
        return Err(UiError::DetachedNode);
    }

    let mut result = BoundData::Record(data.clone());
    let mut bound = 0usize;
    for marker in Marker::ALL {
        let mut nodes = dom.find_by_class(root, marker.class_name());
        if dom.has_class(root, marker.class_name()) {
            nodes.insert(0, root);
        }
        for node in nodes {
            let Some(spec) = dom.binding(node) else { continue };
            if spec.marker != marker || spec.key_path.trim().is_empty() {
                continue;
            }
            match bind_node(dom, data, node, &spec) {
                Ok(Some(list)) => result = BoundData::List(list),
                Ok(None) => {}
                Err(e) => {
                    report(&e);
                    continue;
                }
            }
            bound += 1;
        }
    }
    tracing::debug!(bound, "bind pass complete");
    Ok(result)
}

/// 绑定单个节点；表格直接绑定顶层数组时返回替换后的列表
fn bind_node(dom: &Dom, data: &DataObject, node: NodeId, spec: &BindSpec) -> UiResult<Option<ObservedList>> {
    let control = if spec.marker.needs_control() {
        Some(dom.control(node).ok_or(UiError::MissingControl(spec.marker.name()))?)
    } else {
        None
    };
    match (spec.marker, control) {
        (Marker::Value, _) => {
            let value = spec.read(data.get(&spec.key_path));
            let adapter = TextInput::new(node);
            adapter.set_value(dom, text_value(&value));
            adapter.on_change(dom, write_back(data, spec));
            Ok(None)
        }
        (Marker::Label, _) => {
            let value = spec.read(data.get(&spec.key_path));
            Label::new(node).set_value(dom, text_value(&value));
            Ok(None)
        }
        (Marker::Table, Some(control)) => bind_table(dom, data, control.as_ref(), spec),
        (_, Some(control)) => {
            let value = spec.read(data.get(&spec.key_path));
            let initial = match spec.marker {
                Marker::Checkbox => Some(ControlValue::Checked(keypath::is_truthy(&value))),
                Marker::Slider => keypath::as_number(&value).map(ControlValue::Slider),
                _ => Some(ControlValue::SelectedIndex(control.match_index(&value, spec.value_key.as_deref()))),
            };
            if let Some(v) = initial {
                control.set_value(dom, v);
            }
            control.on_change(dom, write_back(data, spec));
            Ok(None)
        }
        (_, None) => Ok(None),
    }
}

fn bind_table(
    dom: &Dom,
    data: &DataObject,
    control: &dyn BindableControl,
    spec: &BindSpec,
) -> UiResult<Option<ObservedList>> {
    let whole = keypath::is_whole(&spec.key_path);
    if whole {
        if !data.is_array() {
            return Err(UiError::NotBindable("table rows"));
        }
    } else {
        match data.get(&spec.key_path) {
            JsonValue::Array(_) => {}
            // 缺失的列表初始化为空数组，之后的追加才能写回
            JsonValue::Null => {
                data.set(&spec.key_path, JsonValue::Array(Vec::new()));
            }
            _ => return Err(UiError::NotBindable("table rows")),
        }
    }

    // 同一数据源只包装一次
    let list = match control.get_value(dom) {
        ControlValue::Rows(existing) if existing.is_view_of(data, &spec.key_path) => existing,
        _ => ObservedList::new(data.clone(), &spec.key_path),
    };
    control.set_value(dom, ControlValue::Rows(list.clone()));
    Ok(whole.then_some(list))
}

/// 写回钩子：应用写变换后按路径写入数据对象
fn write_back(data: &DataObject, spec: &BindSpec) -> DataBindHandler {
    let data = data.clone();
    let spec = spec.clone();
    Rc::new(move |value: &JsonValue, key_path: &str| {
        let v = spec.write(value);
        if !data.set(key_path, v) {
            tracing::warn!(key_path, "write-back did not land");
        }
    })
}
