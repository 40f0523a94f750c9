//! 命名服务客户端 Trait 定义

use super::instance::{ServiceInfo, ServiceInstance};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// 注册实例参数
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterInstanceParam {
    pub service_name: String,
    pub group_name: String,
    pub cluster_name: String,
    pub ip: String,
    pub port: u64,
    pub weight: f64,
    pub enabled: bool,
    pub healthy: bool,
    pub ephemeral: bool,
    pub metadata: HashMap<String, String>,
}

impl RegisterInstanceParam {
    /// 转换为注册后的实例视图
    pub fn to_instance(&self) -> ServiceInstance {
        ServiceInstance {
            instance_id: format!("{}#{}#{}", self.ip, self.port, self.cluster_name),
            ip: self.ip.clone(),
            port: self.port,
            weight: self.weight,
            enabled: self.enabled,
            healthy: self.healthy,
            ephemeral: self.ephemeral,
            cluster_name: self.cluster_name.clone(),
            service_name: self.service_name.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// 注销实例参数
#[derive(Debug, Clone, PartialEq)]
pub struct DeregisterInstanceParam {
    pub service_name: String,
    pub group_name: String,
    pub cluster_name: String,
    pub ip: String,
    pub port: u64,
    pub ephemeral: bool,
}

/// 查询服务参数
#[derive(Debug, Clone, PartialEq)]
pub struct GetServiceParam {
    pub service_name: String,
    pub group_name: String,
    pub clusters: Vec<String>,
}

/// 命名服务客户端
///
/// 注册中心的具体协议由实现方负责，这里只约定调用形式。
#[async_trait]
pub trait NamingClient: Send + Sync {
    /// 注册实例
    async fn register_instance(&self, param: RegisterInstanceParam) -> Result<bool>;

    /// 注销实例
    async fn deregister_instance(&self, param: DeregisterInstanceParam) -> Result<bool>;

    /// 获取服务的实例列表
    async fn get_service(&self, param: GetServiceParam) -> Result<ServiceInfo>;
}
