//! 控件与绑定引擎之间的能力接口

use crate::controls::ObservedList;
use crate::dom::Dom;
use serde_json::Value as JsonValue;
use std::rc::Rc;

/// 用户编辑时的写回回调：(新值, 键路径)
pub type DataBindHandler = Rc<dyn Fn(&JsonValue, &str)>;

/// 控件值
#[derive(Debug, Clone)]
pub enum ControlValue {
    Text(String),
    Checked(bool),
    SelectedIndex(Option<usize>),
    Slider(f64),
    Rows(ObservedList),
}

/// 可绑定控件
pub trait BindableControl {
    fn get_value(&self, dom: &Dom) -> ControlValue;

    /// 程序写入，不触发写回
    fn set_value(&self, dom: &Dom, value: ControlValue);

    /// 设置写回回调；重复设置替换而不是叠加
    fn on_change(&self, dom: &Dom, handler: DataBindHandler);

    /// 列表型控件：按 value_key 匹配数据值得到下标
    fn match_index(&self, _value: &JsonValue, _value_key: Option<&str>) -> Option<usize> {
        None
    }
}
