//! 配置来源
//!
//! `ConfigSource` 负责按命名空间拉取一次完整配置；长轮询协议不在此实现。

use super::config::ApolloConfig;
use crate::error::{KitError, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha1::Sha1;
use std::collections::HashMap;
use tracing::debug;

type HmacSha1 = Hmac<Sha1>;

/// 配置来源
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// 拉取命名空间的全部配置，命名空间不存在时返回 `None`
    async fn fetch(
        &self,
        config: &ApolloConfig,
        namespace: &str,
    ) -> Result<Option<HashMap<String, String>>>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApolloConfigResponse {
    #[serde(default)]
    configurations: HashMap<String, String>,
    #[serde(default)]
    release_key: Option<String>,
}

/// 基于 Apollo 配置服务 HTTP 接口的配置来源
pub struct ApolloHttpSource {
    client: reqwest::Client,
}

impl ApolloHttpSource {
    pub fn new(config: &ApolloConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client })
    }

    /// 配置接口路径，如 `/configs/app/default/application`
    pub fn config_path(config: &ApolloConfig, namespace: &str) -> String {
        format!(
            "/configs/{}/{}/{}",
            config.app_id, config.cluster, namespace
        )
    }
}

#[async_trait]
impl ConfigSource for ApolloHttpSource {
    async fn fetch(
        &self,
        config: &ApolloConfig,
        namespace: &str,
    ) -> Result<Option<HashMap<String, String>>> {
        let path = Self::config_path(config, namespace);
        let url = format!("{}{}", config.ip.trim_end_matches('/'), path);

        let mut request = self.client.get(&url);
        if let Some(secret) = config.secret.as_deref().filter(|s| !s.is_empty()) {
            let timestamp = chrono::Utc::now().timestamp_millis().to_string();
            let signature = sign(&timestamp, &path, secret)?;
            request = request
                .header("Authorization", format!("Apollo {}:{}", config.app_id, signature))
                .header("Timestamp", timestamp);
        }

        let response = request.send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(namespace = %namespace, "Namespace not found on config server");
            return Ok(None);
        }

        let body: ApolloConfigResponse = response.error_for_status()?.json().await?;
        debug!(
            namespace = %namespace,
            release_key = body.release_key.as_deref().unwrap_or(""),
            keys = body.configurations.len(),
            "Fetched namespace from config server"
        );
        Ok(Some(body.configurations))
    }
}

/// 计算访问控制签名：`base64(HmacSHA1(secret, timestamp + "\n" + path))`
pub fn sign(timestamp: &str, path_with_query: &str, secret: &str) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|err| KitError::encoding_error(format!("failed to build HMAC key: {}", err)))?;
    mac.update(timestamp.as_bytes());
    mac.update(b"\n");
    mac.update(path_with_query.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
