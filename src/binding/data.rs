//! 共享数据对象

use super::keypath;
use crate::controls::ObservedList;
use serde_json::Value as JsonValue;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// 调用方持有的数据对象，视觉树与调用方共享同一份，不做拷贝
#[derive(Clone)]
pub struct DataObject(Rc<RefCell<JsonValue>>);

impl DataObject {
    pub fn new(value: JsonValue) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// 按键路径读取，缺失为 null
    pub fn get(&self, path: &str) -> JsonValue {
        keypath::resolve(&self.0.borrow(), path)
    }

    /// 按键路径写入，最后一次写入生效
    pub fn set(&self, path: &str, value: JsonValue) -> bool {
        keypath::assign(&mut self.0.borrow_mut(), path, value)
    }

    pub fn snapshot(&self) -> JsonValue {
        self.0.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&JsonValue) -> R) -> R {
        f(&self.0.borrow())
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut JsonValue) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    /// 只有对象和数组可以绑定
    pub fn is_bindable(&self) -> bool {
        matches!(&*self.0.borrow(), JsonValue::Object(_) | JsonValue::Array(_))
    }

    pub fn is_array(&self) -> bool {
        self.0.borrow().is_array()
    }

    pub fn ptr_eq(&self, other: &DataObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<JsonValue> for DataObject {
    fn from(value: JsonValue) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for DataObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DataObject").field(&*self.0.borrow()).finish()
    }
}

/// 绑定返回的数据句柄，调用方应以它为新的数据源
#[derive(Clone, Debug)]
pub enum BoundData {
    Record(DataObject),
    /// 顶层数组绑定到表格时被替换为观察列表
    List(ObservedList),
}

impl BoundData {
    pub fn as_record(&self) -> Option<&DataObject> {
        match self {
            BoundData::Record(d) => Some(d),
            BoundData::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&ObservedList> {
        match self {
            BoundData::List(l) => Some(l),
            BoundData::Record(_) => None,
        }
    }

    /// 底层数据对象
    pub fn source(&self) -> DataObject {
        match self {
            BoundData::Record(d) => d.clone(),
            BoundData::List(l) => l.source(),
        }
    }
}
