//! 错误代码和错误类别定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 错误代码枚举
///
/// 错误代码按类别分组，每个类别占用1000个代码范围：
/// - 1000-1999: 负载均衡相关错误
/// - 2000-2999: 认证相关错误
/// - 3000-3999: 服务注册相关错误
/// - 4000-4999: 配置中心相关错误
/// - 6000-6999: 系统相关错误
/// - 7000-7999: 网络相关错误
/// - 8000-8999: 序列化相关错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum ErrorCode {
    // ============================================================
    // 负载均衡相关错误 (1000-1999)
    // ============================================================
    NoAvailableInstance = 1000,
    InvalidWeight = 1001,

    // ============================================================
    // 认证相关错误 (2000-2999)
    // ============================================================
    TokenInvalid = 2005,
    TokenExpired = 2006,

    // ============================================================
    // 服务注册相关错误 (3000-3999)
    // ============================================================
    RegistryError = 3000,
    RegistryUnavailable = 3001,

    // ============================================================
    // 配置中心相关错误 (4000-4999)
    // ============================================================
    ConfigStartFailed = 4000,
    ConfigSyncFailed = 4002,

    // ============================================================
    // 系统相关错误 (6000-6999)
    // ============================================================
    ServiceUnavailable = 6001,
    ConfigurationError = 6003,

    // ============================================================
    // 网络相关错误 (7000-7999)
    // ============================================================
    NetworkError = 7000,
    NetworkTimeout = 7001,

    // ============================================================
    // 序列化相关错误 (8000-8999)
    // ============================================================
    DeserializationError = 8001,
    EncodingError = 8002,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ErrorCode {
    /// 获取错误代码的数字值
    #[inline]
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    /// 获取错误代码的英文标识符
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NoAvailableInstance => "NO_AVAILABLE_INSTANCE",
            ErrorCode::InvalidWeight => "INVALID_WEIGHT",
            ErrorCode::TokenInvalid => "TOKEN_INVALID",
            ErrorCode::TokenExpired => "TOKEN_EXPIRED",
            ErrorCode::RegistryError => "REGISTRY_ERROR",
            ErrorCode::RegistryUnavailable => "REGISTRY_UNAVAILABLE",
            ErrorCode::ConfigStartFailed => "CONFIG_START_FAILED",
            ErrorCode::ConfigSyncFailed => "CONFIG_SYNC_FAILED",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::NetworkTimeout => "NETWORK_TIMEOUT",
            ErrorCode::DeserializationError => "DESERIALIZATION_ERROR",
            ErrorCode::EncodingError => "ENCODING_ERROR",
        }
    }

    /// 获取错误代码的类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorCode::NoAvailableInstance | ErrorCode::InvalidWeight => ErrorCategory::Balance,
            ErrorCode::TokenInvalid | ErrorCode::TokenExpired => ErrorCategory::Authentication,
            ErrorCode::RegistryError | ErrorCode::RegistryUnavailable => ErrorCategory::Registry,
            ErrorCode::ConfigStartFailed | ErrorCode::ConfigSyncFailed => ErrorCategory::Config,
            ErrorCode::ServiceUnavailable | ErrorCode::ConfigurationError => ErrorCategory::System,
            ErrorCode::NetworkError | ErrorCode::NetworkTimeout => ErrorCategory::Network,
            ErrorCode::DeserializationError | ErrorCode::EncodingError => {
                ErrorCategory::Serialization
            }
        }
    }

    /// 判断是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::RegistryUnavailable
                | ErrorCode::ConfigSyncFailed
                | ErrorCode::NetworkError
                | ErrorCode::NetworkTimeout
                | ErrorCode::ServiceUnavailable
        )
    }
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    Balance,
    Authentication,
    Registry,
    Config,
    System,
    Network,
    Serialization,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Balance => write!(f, "BALANCE"),
            ErrorCategory::Authentication => write!(f, "AUTHENTICATION"),
            ErrorCategory::Registry => write!(f, "REGISTRY"),
            ErrorCategory::Config => write!(f, "CONFIG"),
            ErrorCategory::System => write!(f, "SYSTEM"),
            ErrorCategory::Network => write!(f, "NETWORK"),
            ErrorCategory::Serialization => write!(f, "SERIALIZATION"),
        }
    }
}
