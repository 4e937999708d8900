// crates/ct_foundation/src/logging.rs

//! 日志初始化
//!
//! 基于 `tracing-subscriber` 的 `FmtSubscriber`。库代码只使用 `tracing` 宏，
//! 由宿主进程（服务或测试）调用 [`init_logging`] 安装全局订阅者。

use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// 解析日志级别字符串，未知值回退为 `INFO`
#[must_use]
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// 安装全局日志订阅者
///
/// 若设置了 `RUST_LOG` 则优先使用其过滤规则，否则使用 `level`。
/// 重复调用是安全的：已存在全局订阅者时返回 `false`。
pub fn init_logging(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(parse_level(level).as_str()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).is_ok()
}
