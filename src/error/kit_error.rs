//! 统一错误类型

use super::code::ErrorCode;
use std::collections::HashMap;
use thiserror::Error;

/// 工具包统一错误类型
#[derive(Error, Debug, Clone)]
pub enum KitError {
    /// 带错误代码的业务错误
    #[error("错误 [{code}] {reason}", code = .code.as_str())]
    Localized {
        code: ErrorCode,
        reason: String,
        details: Option<String>,
        params: Option<HashMap<String, String>>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// 系统错误（内部错误）
    #[error("系统错误: {0}")]
    System(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),
}

impl KitError {
    /// 创建带错误代码的错误
    pub fn localized(code: ErrorCode, reason: impl Into<String>) -> Self {
        KitError::Localized {
            code,
            reason: reason.into(),
            details: None,
            params: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// 创建系统错误
    pub fn system(msg: impl Into<String>) -> Self {
        KitError::System(msg.into())
    }

    /// 创建 IO 错误
    pub fn io(msg: impl Into<String>) -> Self {
        KitError::Io(msg.into())
    }

    // ============================================================
    // 便捷方法：负载均衡相关错误
    // ============================================================

    /// 候选实例为空
    pub fn no_available_instance(reason: impl Into<String>) -> Self {
        Self::localized(ErrorCode::NoAvailableInstance, reason)
    }

    /// 非法权重（负数、NaN 或无穷大）
    pub fn invalid_weight(index: usize, weight: f64) -> Self {
        let mut params = HashMap::new();
        params.insert("index".to_string(), index.to_string());
        params.insert("weight".to_string(), weight.to_string());
        KitError::Localized {
            code: ErrorCode::InvalidWeight,
            reason: format!("invalid weight {} at index {}", weight, index),
            details: None,
            params: Some(params),
            timestamp: chrono::Utc::now(),
        }
    }

    // ============================================================
    // 便捷方法：注册中心 / 配置中心
    // ============================================================

    pub fn registry(reason: impl Into<String>) -> Self {
        Self::localized(ErrorCode::RegistryError, reason)
    }

    pub fn config_sync_failed(namespace: &str, reason: impl Into<String>) -> Self {
        let mut params = HashMap::new();
        params.insert("namespace".to_string(), namespace.to_string());
        KitError::Localized {
            code: ErrorCode::ConfigSyncFailed,
            reason: reason.into(),
            details: None,
            params: Some(params),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::localized(ErrorCode::ConfigurationError, reason)
    }

    // ============================================================
    // 便捷方法：认证 / 序列化
    // ============================================================

    pub fn token_invalid(reason: impl Into<String>) -> Self {
        Self::localized(ErrorCode::TokenInvalid, reason)
    }

    pub fn deserialization_error(reason: impl Into<String>) -> Self {
        Self::localized(ErrorCode::DeserializationError, reason)
    }

    pub fn encoding_error(reason: impl Into<String>) -> Self {
        Self::localized(ErrorCode::EncodingError, reason)
    }

    // ============================================================
    // 信息获取方法
    // ============================================================

    /// 获取错误代码
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            KitError::Localized { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// 获取错误原因
    pub fn reason(&self) -> &str {
        match self {
            KitError::Localized { reason, .. } => reason,
            KitError::System(msg) => msg,
            KitError::Io(msg) => msg,
        }
    }

    /// 获取错误参数
    pub fn param(&self, key: &str) -> Option<&str> {
        match self {
            KitError::Localized {
                params: Some(params),
                ..
            } => params.get(key).map(String::as_str),
            _ => None,
        }
    }

    /// 判断是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        match self {
            KitError::Io(_) => true,
            _ => self.code().map(|code| code.is_retryable()).unwrap_or(false),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, KitError>;
