//! Service Kit
//!
//! Helpers for services that sit behind a Nacos-style registry and an Apollo-style
//! config center: weighted instance selection, registry and config client wrappers,
//! JWT payload extraction and structured logging setup.

pub mod apollo;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod utils;

// Re-exports
pub use apollo::{ApolloConfig, ChangeEvent, ChangeListener, ConfigClient, ConfigSource};
pub use auth::{JwtUserInfo, user_id_from_jwt};
pub use config::Config;
pub use error::{ErrorBuilder, ErrorCategory, ErrorCode, KitError, Result};
pub use logging::{LogConfig, LogLevel, init_logging, log_with_func};
pub use registry::{
    EnvMode, LoadBalanceStrategy, Nacos, NacosConfig, NamingClient, ServiceInfo,
    ServiceInstance, TargetMachine, WeightedSelector, select_index, select_index_with,
};
pub use utils::remote_ip;
