//! 错误类型与诊断通道
//!
//! 公开入口不会把错误抛给调用方：在检测到错误的操作边界处恢复，
//! 并通过 [`report`] 写入 tracing 诊断通道。

use thiserror::Error;

/// 运行时错误
#[derive(Debug, Error)]
pub enum UiError {
    /// 构造错误：未知或缺失的标签名
    #[error("unknown tag name `{0}`")]
    UnknownTag(String),

    /// 构造错误：目标节点不存在或已被移除
    #[error("node is detached or does not exist")]
    DetachedNode,

    /// 构造错误：目标节点不是元素节点
    #[error("node is not an element")]
    NotAnElement,

    /// 绑定错误：数据不是对象或数组
    #[error("cannot bind {0}: expected an object or array")]
    NotBindable(&'static str),

    /// 绑定错误：节点带有需要控件的标记但未注册控件
    #[error("node carries marker `{0}` but has no control attached")]
    MissingControl(&'static str),

    /// 样式描述不是对象
    #[error("invalid style description: {0}")]
    InvalidStyle(String),

    /// 宿主能力不可用，功能降级
    #[error("host capability unavailable: {0}")]
    CapabilityUnavailable(&'static str),

    /// 标记解析错误
    #[error("markup parse error: {0}")]
    Markup(String),

    /// 配置错误
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl UiError {
    /// 降级类错误只需警告
    pub fn is_degradation(&self) -> bool {
        matches!(self, UiError::CapabilityUnavailable(_) | UiError::MissingControl(_))
    }
}

/// 把错误写入诊断通道
pub fn report(err: &UiError) {
    if err.is_degradation() {
        tracing::warn!(error = %err, "degraded");
    } else {
        tracing::error!(error = %err, "operation aborted");
    }
}

/// 在操作边界处恢复：出错时上报并返回 `None`
pub fn recover<T>(result: Result<T, UiError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            report(&e);
            None
        }
    }
}

pub type UiResult<T> = Result<T, UiError>;
