//! 日志初始化测试

use svc_kit::logging::{LogConfig, LogLevel, init_logging, is_initialized, log_with_func};

/// 测试：级别解析，未识别的值按 debug 处理
#[test]
fn test_log_level_parse() {
    assert_eq!(LogLevel::parse("INFO"), LogLevel::Info);
    assert_eq!(LogLevel::parse(" warn "), LogLevel::Warn);
    assert_eq!(LogLevel::parse("fatal"), LogLevel::Fatal);
    assert_eq!(LogLevel::parse("verbose"), LogLevel::Debug);
    assert_eq!(LogLevel::Panic.as_filter(), "error");
    assert_eq!(LogLevel::Fatal.to_string(), "fatal");
}

/// 测试：并发初始化只安装一次，之后的日志调用正常
#[test]
fn test_concurrent_init_logging() {
    let handles: Vec<_> = (0..8)
        .map(|_| std::thread::spawn(|| init_logging(&LogConfig::default()).is_ok()))
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert!(is_initialized());

    // 之后的调用是空操作
    let debug_config = LogConfig {
        level: "debug".to_string(),
        json: false,
    };
    assert!(init_logging(&debug_config).is_ok());

    for level in ["trace", "debug", "info", "warn", "error", "fatal", "panic", "unknown"] {
        log_with_func(level, "test_concurrent_init_logging", format!("level {}", level));
    }
}
