//! 命名服务配置

use super::load_balancer::LoadBalanceStrategy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Nacos 客户端配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NacosConfig {
    /// 服务端域名或 IP
    pub server_addr: String,

    pub port: u16,

    pub context_path: String,

    /// http 或 https
    pub scheme: String,

    /// 命名空间 ID
    pub namespace_id: String,

    pub group_name: String,

    /// 注册和查询时使用的集群
    pub cluster_name: String,

    /// 请求超时（毫秒）
    pub timeout_ms: u64,

    /// 临时实例的心跳间隔（毫秒），0 表示不发送心跳
    pub beat_interval_ms: u64,

    /// 注册实例时的默认权重
    pub default_weight: f64,

    /// 选择目标机器时的负载均衡策略
    pub load_balance: LoadBalanceStrategy,
}

impl Default for NacosConfig {
    fn default() -> Self {
        Self {
            server_addr: "nacos-live.aijidou.com".to_string(),
            port: 8848,
            context_path: "/nacos".to_string(),
            scheme: "http".to_string(),
            namespace_id: String::new(),
            group_name: "DEFAULT_GROUP".to_string(),
            cluster_name: "cluster-live".to_string(),
            timeout_ms: 5000,
            beat_interval_ms: 5000,
            default_weight: 10.0,
            load_balance: LoadBalanceStrategy::WeightedRandom,
        }
    }
}

impl NacosConfig {
    /// 创建指定命名空间的配置，其余使用默认值
    pub fn new(namespace_id: impl Into<String>) -> Self {
        Self {
            namespace_id: namespace_id.into(),
            ..Default::default()
        }
    }

    /// 设置服务端地址
    pub fn with_server(mut self, server_addr: impl Into<String>, port: u16) -> Self {
        self.server_addr = server_addr.into();
        self.port = port;
        self
    }

    /// 设置负载均衡策略
    pub fn with_load_balance(mut self, strategy: LoadBalanceStrategy) -> Self {
        self.load_balance = strategy;
        self
    }

    /// 开放接口的根地址，如 `http://nacos:8848/nacos`
    pub fn base_url(&self) -> String {
        let context_path = self.context_path.trim_end_matches('/');
        let context_path = if context_path.is_empty() || context_path.starts_with('/') {
            context_path.to_string()
        } else {
            format!("/{}", context_path)
        };
        format!(
            "{}://{}:{}{}",
            self.scheme, self.server_addr, self.port, context_path
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn beat_interval(&self) -> Duration {
        Duration::from_millis(self.beat_interval_ms)
    }
}
