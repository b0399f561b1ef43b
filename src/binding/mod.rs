//! 双向数据绑定

mod adapters;
mod control;
mod data;
mod engine;
pub mod keypath;
mod marker;

pub use adapters::{Label, TextInput, BIND_SLOT};
pub use control::{BindableControl, ControlValue, DataBindHandler};
pub use data::{BoundData, DataObject};
pub use engine::bind_data;
pub use marker::{BindSpec, DataHandler, Marker};
