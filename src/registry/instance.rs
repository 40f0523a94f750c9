//! 服务实例定义

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 灰度实例在元数据中使用的键
pub const ENV_METADATA_KEY: &str = "env";

/// 灰度实例在元数据中使用的值
pub const GRAY_TAG: &str = "grayTag";

/// 服务实例
///
/// 字段名与 Nacos 开放接口的 JSON 保持一致。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceInstance {
    /// 实例 ID（由注册中心生成）
    pub instance_id: String,

    pub ip: String,

    pub port: u64,

    /// 权重（非负实数，相对流量占比）
    pub weight: f64,

    pub enabled: bool,

    pub healthy: bool,

    /// 临时实例（由客户端心跳维持）
    pub ephemeral: bool,

    pub cluster_name: String,

    pub service_name: String,

    /// 元数据（灰度标记等）
    pub metadata: HashMap<String, String>,
}

impl Default for ServiceInstance {
    fn default() -> Self {
        Self {
            instance_id: String::new(),
            ip: String::new(),
            port: 0,
            weight: 1.0,
            enabled: true,
            healthy: true,
            ephemeral: true,
            cluster_name: String::new(),
            service_name: String::new(),
            metadata: HashMap::new(),
        }
    }
}

impl ServiceInstance {
    /// 创建新的服务实例
    pub fn new(ip: impl Into<String>, port: u64) -> Self {
        let ip = ip.into();
        Self {
            instance_id: format!("{}#{}", ip, port),
            ip,
            port,
            ..Default::default()
        }
    }

    /// 设置权重
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// 设置启用状态
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// 设置健康状态
    pub fn with_health(mut self, healthy: bool) -> Self {
        self.healthy = healthy;
        self
    }

    /// 添加元数据
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// 是否可以接收流量（启用且健康）
    pub fn is_available(&self) -> bool {
        self.enabled && self.healthy
    }

    /// 权重是否为有限的非负数
    pub fn has_valid_weight(&self) -> bool {
        self.weight.is_finite() && self.weight >= 0.0
    }

    /// 是否为灰度实例
    pub fn is_gray(&self) -> bool {
        self.metadata
            .get(ENV_METADATA_KEY)
            .is_some_and(|v| v == GRAY_TAG)
    }

    /// 是否为线上（未打环境标记的）实例
    pub fn is_live(&self) -> bool {
        self.metadata
            .get(ENV_METADATA_KEY)
            .is_none_or(|v| v.is_empty())
    }
}

/// 环境选择模式
///
/// 决定从服务的实例列表中取哪一部分：线上池、灰度池或全部。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnvMode {
    /// 没有环境标记的实例
    #[default]
    Live,
    /// 带灰度标记的实例
    Gray,
    /// 不过滤
    All,
}

impl EnvMode {
    /// 判断实例是否属于该环境
    pub fn matches(&self, instance: &ServiceInstance) -> bool {
        match self {
            EnvMode::Live => instance.is_live(),
            EnvMode::Gray => instance.is_gray(),
            EnvMode::All => true,
        }
    }

    /// 注册时附带的元数据
    pub fn register_metadata(&self) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        if *self == EnvMode::Gray {
            metadata.insert(ENV_METADATA_KEY.to_string(), GRAY_TAG.to_string());
        }
        metadata
    }
}

impl std::str::FromStr for EnvMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "live" => Ok(EnvMode::Live),
            "1" | "gray" | "grey" | "canary" => Ok(EnvMode::Gray),
            "2" | "all" => Ok(EnvMode::All),
            _ => Err(format!("Unknown env mode: {}", s)),
        }
    }
}

impl fmt::Display for EnvMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvMode::Live => write!(f, "live"),
            EnvMode::Gray => write!(f, "gray"),
            EnvMode::All => write!(f, "all"),
        }
    }
}

/// 服务信息（注册中心返回的实例列表）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceInfo {
    pub name: String,
    pub group_name: String,
    /// 逗号分隔的集群名
    pub clusters: String,
    pub hosts: Vec<ServiceInstance>,
}

impl ServiceInfo {
    pub fn new(name: impl Into<String>, hosts: Vec<ServiceInstance>) -> Self {
        Self {
            name: name.into(),
            hosts,
            ..Default::default()
        }
    }

    /// 按环境过滤实例
    pub fn filter_env(mut self, env: EnvMode) -> Self {
        self.hosts.retain(|host| env.matches(host));
        self
    }
}

/// 选中的目标机器
///
/// 候选池为空时为 `("", 0)`。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TargetMachine {
    pub ip: String,
    pub port: u64,
}

impl TargetMachine {
    pub fn new(ip: impl Into<String>, port: u64) -> Self {
        Self {
            ip: ip.into(),
            port,
        }
    }

    /// 空结果
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.ip.is_empty() && self.port == 0
    }
}

impl fmt::Display for TargetMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

impl From<&ServiceInstance> for TargetMachine {
    fn from(instance: &ServiceInstance) -> Self {
        Self::new(instance.ip.clone(), instance.port)
    }
}
