//! 错误类型转换实现

use super::{ErrorBuilder, ErrorCode, KitError};
use std::io;

impl From<io::Error> for KitError {
    fn from(err: io::Error) -> Self {
        KitError::io(err.to_string())
    }
}

impl From<serde_json::Error> for KitError {
    fn from(err: serde_json::Error) -> Self {
        KitError::deserialization_error(format!("JSON 解析错误: {}", err))
    }
}

impl From<toml::de::Error> for KitError {
    fn from(err: toml::de::Error) -> Self {
        ErrorBuilder::new(ErrorCode::ConfigurationError, "TOML 配置解析失败")
            .details(err.to_string())
            .build()
    }
}

impl From<base64::DecodeError> for KitError {
    fn from(err: base64::DecodeError) -> Self {
        KitError::encoding_error(format!("base64 解码失败: {}", err))
    }
}

impl From<reqwest::Error> for KitError {
    fn from(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            ErrorCode::NetworkTimeout
        } else if err.is_decode() {
            ErrorCode::DeserializationError
        } else if err.is_connect() {
            ErrorCode::ServiceUnavailable
        } else {
            ErrorCode::NetworkError
        };

        let builder = ErrorBuilder::new(code, err.to_string());
        match err.url() {
            Some(url) => builder.param("url", url.as_str()).build(),
            None => builder.build(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for KitError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => {
                KitError::localized(ErrorCode::TokenExpired, "token expired")
            }
            _ => KitError::token_invalid(format!("invalid token: {}", err)),
        }
    }
}
