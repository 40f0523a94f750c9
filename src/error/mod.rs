//! 错误处理模块
//!
//! 提供统一的错误类型、错误代码分类和常见第三方错误的转换

pub mod builder;
pub mod code;
pub mod conversions;
pub mod kit_error;

pub use builder::ErrorBuilder;
pub use code::{ErrorCategory, ErrorCode};
pub use kit_error::{KitError, Result};
