//! 配置中心客户端配置

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 默认命名空间
pub const DEFAULT_NAMESPACE: &str = "application";

/// Apollo 客户端配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApolloConfig {
    pub app_id: String,

    pub cluster: String,

    /// 逗号分隔的命名空间列表，第一个为默认命名空间
    pub namespace_name: String,

    /// 配置服务地址，如 `http://apollo-config:8080`
    pub ip: String,

    /// 访问密钥（开启访问控制时需要）
    pub secret: Option<String>,

    /// 启动时一个配置都没有读到则启动失败
    pub must_start: bool,

    /// 定时刷新间隔（秒）
    pub sync_interval_secs: u64,

    /// 单次请求超时（毫秒）
    pub timeout_ms: u64,
}

impl Default for ApolloConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            cluster: "default".to_string(),
            namespace_name: DEFAULT_NAMESPACE.to_string(),
            ip: "http://localhost:8080".to_string(),
            secret: None,
            must_start: false,
            sync_interval_secs: 60,
            timeout_ms: 5000,
        }
    }
}

impl ApolloConfig {
    /// 从环境变量构建配置
    ///
    /// - `APP_ID`：应用 ID
    /// - `IDC`：集群，默认 `default`
    /// - `APOLLO_META`：配置服务地址
    /// - `APOLLO_NAMESPACE`：命名空间列表
    /// - `APOLLO_ACCESS_KEY_SECRET`：访问密钥
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            app_id: std::env::var("APP_ID").unwrap_or_default(),
            cluster: std::env::var("IDC").unwrap_or(defaults.cluster),
            namespace_name: std::env::var("APOLLO_NAMESPACE").unwrap_or(defaults.namespace_name),
            ip: std::env::var("APOLLO_META").unwrap_or(defaults.ip),
            secret: std::env::var("APOLLO_ACCESS_KEY_SECRET").ok(),
            ..defaults
        }
    }

    /// 拆分后的命名空间列表
    pub fn namespaces(&self) -> Vec<String> {
        self.namespace_name
            .split(',')
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// 默认命名空间（列表中的第一个）
    pub fn default_namespace(&self) -> String {
        self.namespaces()
            .into_iter()
            .next()
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
