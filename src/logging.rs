//! 日志模块
//!
//! 进程内唯一的结构化日志输出（JSON，写到 stdout），
//! 以及按字符串级别记录带函数名字段的日志。

use crate::error::{KitError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::EnvFilter;

static LOG_INIT: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// trace / debug / info / warn / error，未识别的值按 debug 处理
    pub level: String,

    /// 是否输出 JSON
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    /// 以 ERROR 记录并标记 `fatal = true`，不会退出进程
    Fatal,
    /// 以 ERROR 记录并标记 `fatal = true`，不会触发 panic
    Panic,
}

impl LogLevel {
    /// 解析级别，未识别的值按 debug 处理
    pub fn parse(level: &str) -> Self {
        match level.trim().to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            "fatal" => LogLevel::Fatal,
            "panic" => LogLevel::Panic,
            _ => LogLevel::Debug,
        }
    }

    /// 对应的过滤器指令
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error | LogLevel::Fatal | LogLevel::Panic => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
            LogLevel::Panic => "panic",
        };
        write!(f, "{}", name)
    }
}

/// 安装全局日志订阅者
///
/// 每个进程只安装一次。真正执行安装的那次调用返回安装结果（已经有其它全局订阅者时
/// 返回错误），并发或之后的调用都是空操作并返回 `Ok`。
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let mut installed = None;
    LOG_INIT.get_or_init(|| {
        let result = install(config);
        installed = Some(result.clone());
        result
    });

    match installed {
        Some(result) => result.map_err(KitError::system),
        None => Ok(()),
    }
}

/// 本模块的订阅者是否已安装成功
pub fn is_initialized() -> bool {
    matches!(LOG_INIT.get(), Some(Ok(())))
}

fn install(config: &LogConfig) -> std::result::Result<(), String> {
    let level = LogLevel::parse(&config.level);
    let filter = EnvFilter::new(level.as_filter());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_ansi(false);

    let result = if config.json {
        builder
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|err| format!("failed to install log subscriber: {err}"))
}

/// 记录一条带函数名字段的日志
pub fn log_with_func(level: &str, func_name: &str, message: impl fmt::Display) {
    match LogLevel::parse(level) {
        LogLevel::Trace => trace!(func_name = func_name, "{}", message),
        LogLevel::Debug => debug!(func_name = func_name, "{}", message),
        LogLevel::Info => info!(func_name = func_name, "{}", message),
        LogLevel::Warn => warn!(func_name = func_name, "{}", message),
        LogLevel::Error => error!(func_name = func_name, "{}", message),
        LogLevel::Fatal | LogLevel::Panic => {
            error!(func_name = func_name, fatal = true, "{}", message)
        }
    }
}
