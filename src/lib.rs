//! form-bind - 声明式界面构造与双向数据绑定
//! 元素工厂、样式引擎、逐帧动画、绑定引擎与可绑定控件

mod geometry;

pub use geometry::{Point, Rect, Size};

// 错误与诊断
pub mod error;
pub mod logging;

// 运行时配置
pub mod config;

// 视觉树
pub mod dom;

// 事件系统
pub mod event;

// 标记解析器
pub mod parser;

// 样式引擎与样式注册表
pub mod style;

// 逐帧动画
pub mod animation;

// 数据绑定
pub mod binding;

// 可绑定控件
pub mod controls;

// 元素工厂
pub mod factory;

pub mod context;
pub mod date_util;

// 运行时门面
pub mod runtime;

pub use binding::{bind_data, BindSpec, BindableControl, BoundData, ControlValue, DataHandler, DataObject, Marker};
pub use context::UiContext;
pub use controls::{Checkbox, Column, DateTimeField, DateTimeMode, ObservedList, Select, Slider, Table};
pub use error::{UiError, UiResult};
pub use factory::{create, Descriptor};
pub use runtime::UiRuntime;

// 单元测试
#[cfg(test)]
mod tests;
