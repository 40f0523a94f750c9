//! 命名服务封装
//!
//! 组合命名服务客户端和负载均衡器：按环境注册实例、按环境查询实例，
//! 并从候选实例中选出一台目标机器。

use super::config::NacosConfig;
use super::instance::{EnvMode, ServiceInfo, ServiceInstance, TargetMachine};
use super::load_balancer::{LoadBalancer, WeightedSelector};
use super::nacos_http::NacosHttpClient;
use super::trait_def::{
    DeregisterInstanceParam, GetServiceParam, NamingClient, RegisterInstanceParam,
};
use crate::error::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// 命名服务封装
pub struct Nacos {
    config: NacosConfig,
    client: Arc<dyn NamingClient>,
    balancer: LoadBalancer,
}

impl Nacos {
    /// 使用 HTTP 客户端创建
    pub fn new(config: NacosConfig) -> Result<Self> {
        let client = NacosHttpClient::new(&config)?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// 使用指定的命名服务客户端创建
    pub fn with_client(config: NacosConfig, client: Arc<dyn NamingClient>) -> Self {
        let balancer = LoadBalancer::new(config.load_balance);
        Self {
            config,
            client,
            balancer,
        }
    }

    /// 替换负载均衡器（测试中可传入固定种子）
    pub fn with_selector(mut self, selector: WeightedSelector) -> Self {
        self.balancer = LoadBalancer::with_selector(self.config.load_balance, selector);
        self
    }

    pub fn config(&self) -> &NacosConfig {
        &self.config
    }

    /// 注册实例
    ///
    /// 灰度环境的实例带 `env=grayTag` 元数据，其余环境不带元数据。
    /// 实例为临时实例，由客户端持续发送心跳直到注销。
    pub async fn register_instance(
        &self,
        service_name: &str,
        env: EnvMode,
        ip: &str,
        port: u64,
    ) -> Result<bool> {
        let param = RegisterInstanceParam {
            service_name: service_name.to_string(),
            group_name: self.config.group_name.clone(),
            cluster_name: self.config.cluster_name.clone(),
            ip: ip.to_string(),
            port,
            weight: self.config.default_weight,
            enabled: true,
            healthy: true,
            ephemeral: true,
            metadata: env.register_metadata(),
        };
        self.client.register_instance(param).await
    }

    /// 注销实例
    pub async fn deregister_instance(&self, service_name: &str, ip: &str, port: u64) -> Result<bool> {
        let param = DeregisterInstanceParam {
            service_name: service_name.to_string(),
            group_name: self.config.group_name.clone(),
            cluster_name: self.config.cluster_name.clone(),
            ip: ip.to_string(),
            port,
            ephemeral: true,
        };
        self.client.deregister_instance(param).await
    }

    /// 查询服务，并按环境过滤实例
    pub async fn get_service(&self, env: EnvMode, service_name: &str) -> Result<ServiceInfo> {
        let param = GetServiceParam {
            service_name: service_name.to_string(),
            group_name: self.config.group_name.clone(),
            clusters: vec![self.config.cluster_name.clone()],
        };
        let service = self.client.get_service(param).await?;
        Ok(service.filter_env(env))
    }

    /// 从服务的实例中选出一台目标机器
    ///
    /// 没有可用实例时返回 `("", 0)`。
    pub fn get_target_machine(&self, service: &ServiceInfo) -> TargetMachine {
        let candidates = candidate_pool(&service.hosts);
        if candidates.is_empty() {
            debug!(service_name = %service.name, "No available instance");
            return TargetMachine::none();
        }

        let weights: Vec<f64> = candidates.iter().map(|host| host.weight).collect();
        match self.balancer.select(&weights) {
            Ok(index) => TargetMachine::from(candidates[index]),
            Err(err) => {
                warn!(service_name = %service.name, error = %err, "Instance selection failed");
                TargetMachine::none()
            }
        }
    }

    /// 查询服务并选出一台目标机器
    pub async fn select_target(&self, env: EnvMode, service_name: &str) -> Result<TargetMachine> {
        let service = self.get_service(env, service_name).await?;
        Ok(self.get_target_machine(&service))
    }
}

/// 按权重升序稳定排序
///
/// 权重相同的实例保持原有的相对顺序。
pub fn sort_by_weight(hosts: &[ServiceInstance]) -> Vec<&ServiceInstance> {
    let mut sorted: Vec<&ServiceInstance> = hosts.iter().collect();
    sorted.sort_by(|a, b| a.weight.total_cmp(&b.weight));
    sorted
}

/// 候选池：按权重排序后，保留启用、健康且权重合法的实例
pub fn candidate_pool(hosts: &[ServiceInstance]) -> Vec<&ServiceInstance> {
    sort_by_weight(hosts)
        .into_iter()
        .filter(|host| {
            if !host.is_available() {
                return false;
            }
            if !host.has_valid_weight() {
                warn!(
                    ip = %host.ip,
                    port = host.port,
                    weight = host.weight,
                    "Skipping instance with invalid weight"
                );
                return false;
            }
            true
        })
        .collect()
}
