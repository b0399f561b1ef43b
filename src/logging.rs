//! 日志初始化

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// 环境变量名，语法同 `RUST_LOG`
pub const LOG_ENV: &str = "FORM_BIND_LOG";

/// 安装 fmt 订阅者，重复调用无副作用
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
        // 宿主可能已经装了全局订阅者
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
    });
}
