//! Nacos 开放接口（HTTP）客户端

use super::config::NacosConfig;
use super::instance::ServiceInfo;
use super::trait_def::{
    DeregisterInstanceParam, GetServiceParam, NamingClient, RegisterInstanceParam,
};
use crate::error::{ErrorCode, KitError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, warn};

/// Nacos 返回的服务名带有分组前缀，如 `DEFAULT_GROUP@@order-service`
const GROUP_SEPARATOR: &str = "@@";

/// 心跳请求中的实例信息
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BeatInfo {
    service_name: String,
    ip: String,
    port: u64,
    cluster: String,
    weight: f64,
    metadata: HashMap<String, String>,
    scheduled: bool,
}

/// 基于 HTTP 开放接口的命名服务客户端
///
/// 临时实例注册成功后由后台任务定时发送心跳，注销实例或释放客户端时停止。
pub struct NacosHttpClient {
    client: reqwest::Client,
    base_url: String,
    namespace_id: String,
    beat_interval: Duration,
    beats: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl NacosHttpClient {
    pub fn new(config: &NacosConfig) -> Result<Self> {
        if config.server_addr.is_empty() {
            return Err(KitError::configuration("No Nacos server address provided"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            namespace_id: config.namespace_id.clone(),
            beat_interval: config.beat_interval(),
            beats: Mutex::new(HashMap::new()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 正在发送心跳的实例数量
    pub fn active_beats(&self) -> usize {
        self.beats.lock().map(|beats| beats.len()).unwrap_or(0)
    }

    fn instance_url(&self) -> String {
        format!("{}/v1/ns/instance", self.base_url)
    }

    fn check_ok(body: &str, action: &str) -> Result<bool> {
        if body.trim() == "ok" {
            Ok(true)
        } else {
            Err(KitError::registry(format!(
                "Nacos {} returned unexpected body: {}",
                action, body
            )))
        }
    }

    fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_server_error() {
            return Err(KitError::localized(
                ErrorCode::RegistryUnavailable,
                format!("Nacos server returned {}", status),
            ));
        }
        Ok(response.error_for_status()?)
    }

    fn beat_key(service_name: &str, group_name: &str, ip: &str, port: u64) -> String {
        format!("{}{}{}#{}#{}", group_name, GROUP_SEPARATOR, service_name, ip, port)
    }

    fn start_beat(&self, param: &RegisterInstanceParam) -> Result<()> {
        if self.beat_interval.is_zero() {
            return Ok(());
        }

        let grouped_name = format!("{}{}{}", param.group_name, GROUP_SEPARATOR, param.service_name);
        let beat = BeatInfo {
            service_name: grouped_name.clone(),
            ip: param.ip.clone(),
            port: param.port,
            cluster: param.cluster_name.clone(),
            weight: param.weight,
            metadata: param.metadata.clone(),
            scheduled: true,
        };
        let query = vec![
            ("namespaceId", self.namespace_id.clone()),
            ("serviceName", grouped_name),
            ("groupName", param.group_name.clone()),
            ("ephemeral", "true".to_string()),
            ("beat", serde_json::to_string(&beat)?),
        ];

        let client = self.client.clone();
        let url = format!("{}/beat", self.instance_url());
        let period = self.beat_interval;
        let ip = param.ip.clone();
        let port = param.port;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let result = client
                    .put(&url)
                    .query(&query)
                    .send()
                    .await
                    .and_then(|response| response.error_for_status());
                match result {
                    Ok(_) => debug!(ip = %ip, port = port, "Heartbeat sent to Nacos"),
                    Err(err) => warn!(ip = %ip, port = port, error = %err, "Heartbeat failed"),
                }
            }
        });

        let key = Self::beat_key(&param.service_name, &param.group_name, &param.ip, param.port);
        let mut beats = self
            .beats
            .lock()
            .map_err(|_| KitError::system("nacos heartbeat table lock poisoned"))?;
        if let Some(previous) = beats.insert(key, handle) {
            previous.abort();
        }
        Ok(())
    }

    fn stop_beat(&self, service_name: &str, group_name: &str, ip: &str, port: u64) {
        let key = Self::beat_key(service_name, group_name, ip, port);
        if let Some(handle) = self.beats.lock().ok().and_then(|mut beats| beats.remove(&key)) {
            handle.abort();
        }
    }
}

impl Drop for NacosHttpClient {
    fn drop(&mut self) {
        if let Ok(beats) = self.beats.get_mut() {
            for (_, handle) in beats.drain() {
                handle.abort();
            }
        }
    }
}

#[async_trait]
impl NamingClient for NacosHttpClient {
    async fn register_instance(&self, param: RegisterInstanceParam) -> Result<bool> {
        let metadata = serde_json::to_string(&param.metadata)?;
        let query = vec![
            ("namespaceId", self.namespace_id.clone()),
            ("serviceName", param.service_name.clone()),
            ("groupName", param.group_name.clone()),
            ("clusterName", param.cluster_name.clone()),
            ("ip", param.ip.clone()),
            ("port", param.port.to_string()),
            ("weight", param.weight.to_string()),
            ("enabled", param.enabled.to_string()),
            ("healthy", param.healthy.to_string()),
            ("ephemeral", param.ephemeral.to_string()),
            ("metadata", metadata),
        ];

        let response = self
            .client
            .post(self.instance_url())
            .query(&query)
            .send()
            .await?;
        let body = Self::check_status(response)?.text().await?;

        let registered = Self::check_ok(&body, "register")?;
        if param.ephemeral {
            self.start_beat(&param)?;
        }
        info!(
            service_name = %param.service_name,
            ip = %param.ip,
            port = param.port,
            "Instance registered with Nacos"
        );
        Ok(registered)
    }

    async fn deregister_instance(&self, param: DeregisterInstanceParam) -> Result<bool> {
        self.stop_beat(&param.service_name, &param.group_name, &param.ip, param.port);

        let query = vec![
            ("namespaceId", self.namespace_id.clone()),
            ("serviceName", param.service_name.clone()),
            ("groupName", param.group_name.clone()),
            ("clusterName", param.cluster_name.clone()),
            ("ip", param.ip.clone()),
            ("port", param.port.to_string()),
            ("ephemeral", param.ephemeral.to_string()),
        ];

        let response = self
            .client
            .delete(self.instance_url())
            .query(&query)
            .send()
            .await?;
        let body = Self::check_status(response)?.text().await?;

        let deregistered = Self::check_ok(&body, "deregister")?;
        info!(
            service_name = %param.service_name,
            ip = %param.ip,
            port = param.port,
            "Instance deregistered from Nacos"
        );
        Ok(deregistered)
    }

    async fn get_service(&self, param: GetServiceParam) -> Result<ServiceInfo> {
        let query = vec![
            ("namespaceId", self.namespace_id.clone()),
            ("serviceName", param.service_name.clone()),
            ("groupName", param.group_name.clone()),
            ("clusters", param.clusters.join(",")),
            ("healthyOnly", "false".to_string()),
        ];

        let response = self
            .client
            .get(format!("{}/list", self.instance_url()))
            .query(&query)
            .send()
            .await?;
        let mut service: ServiceInfo = Self::check_status(response)?.json().await?;

        service.name = strip_group(&service.name).to_string();
        for host in service.hosts.iter_mut() {
            host.service_name = strip_group(&host.service_name).to_string();
        }

        debug!(
            service_name = %param.service_name,
            hosts = service.hosts.len(),
            "Fetched service from Nacos"
        );
        Ok(service)
    }
}

/// 去掉服务名上的分组前缀
pub fn strip_group(name: &str) -> &str {
    name.split_once(GROUP_SEPARATOR)
        .map(|(_, service)| service)
        .unwrap_or(name)
}
