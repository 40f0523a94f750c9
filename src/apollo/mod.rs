//! 配置中心模块
//!
//! Apollo 风格的配置客户端：命名空间缓存、类型化读取和变更通知。

pub mod client;
pub mod config;
pub mod listener;
pub mod namespace;
pub mod source;

pub use client::ConfigClient;
pub use config::{ApolloConfig, DEFAULT_NAMESPACE};
pub use listener::{ChangeEvent, ChangeListener, ChangeType, ConfigChange};
pub use namespace::{NamespaceConfig, parse_bool};
pub use source::{ApolloHttpSource, ConfigSource, sign};
