//! 配置中心客户端
//!
//! 启动时同步配置的全部命名空间，之后按需加载其它命名空间，
//! 并通过定时刷新把变更通知给监听器。

use super::config::ApolloConfig;
use super::listener::{ChangeEvent, ChangeListener};
use super::namespace::NamespaceConfig;
use super::source::{ApolloHttpSource, ConfigSource};
use crate::error::{ErrorCode, KitError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, error, info, warn};

struct ClientInner {
    config: ApolloConfig,
    source: Arc<dyn ConfigSource>,
    cache: RwLock<HashMap<String, Arc<NamespaceConfig>>>,
    listeners: RwLock<Vec<Arc<dyn ChangeListener>>>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        if let Some(handle) = self.refresh_task.get_mut().ok().and_then(Option::take) {
            handle.abort();
        }
    }
}

/// 配置中心客户端
///
/// 可以廉价克隆，克隆体共享同一份缓存和监听器。最后一个克隆体释放时定时刷新任务随之结束。
#[derive(Clone)]
pub struct ConfigClient {
    inner: Arc<ClientInner>,
}

impl ConfigClient {
    /// 使用 HTTP 配置来源启动
    pub async fn start(config: ApolloConfig) -> Result<Self> {
        let source = ApolloHttpSource::new(&config)?;
        Self::start_with_source(config, Arc::new(source)).await
    }

    /// 使用指定的配置来源启动
    ///
    /// 首次同步一个命名空间都没有读到且 `must_start` 为真时启动失败。
    /// 启动成功后按 `sync_interval_secs` 定时刷新，间隔为 0 时不刷新。
    pub async fn start_with_source(
        config: ApolloConfig,
        source: Arc<dyn ConfigSource>,
    ) -> Result<Self> {
        let mut cache = HashMap::new();
        for namespace in config.namespaces() {
            match source.fetch(&config, &namespace).await {
                Ok(Some(values)) => {
                    cache.insert(
                        namespace.clone(),
                        Arc::new(NamespaceConfig::new(namespace, values)),
                    );
                }
                Ok(None) => warn!(namespace = %namespace, "Namespace not found during first sync"),
                Err(err) => warn!(namespace = %namespace, error = %err, "First sync failed"),
            }
        }

        if cache.is_empty() && config.must_start {
            return Err(KitError::localized(
                ErrorCode::ConfigStartFailed,
                "start failed cause no config was read",
            ));
        }

        info!(
            app_id = %config.app_id,
            cluster = %config.cluster,
            namespaces = cache.len(),
            "Config client start finished"
        );

        let client = Self {
            inner: Arc::new(ClientInner {
                config,
                source,
                cache: RwLock::new(cache),
                listeners: RwLock::new(Vec::new()),
                refresh_task: Mutex::new(None),
            }),
        };
        client.spawn_refresh();
        Ok(client)
    }

    pub fn config(&self) -> &ApolloConfig {
        &self.inner.config
    }

    /// 获取命名空间配置
    ///
    /// 未缓存的命名空间会先同步一次；名称为空或同步失败时返回 `None`。
    pub async fn get_config(&self, namespace: &str) -> Option<Arc<NamespaceConfig>> {
        if namespace.is_empty() {
            return None;
        }

        if let Some(config) = self.inner.cache.read().await.get(namespace) {
            return Some(config.clone());
        }

        match self.sync_namespace(namespace).await {
            Ok(config) => config,
            Err(err) => {
                error!(namespace = %namespace, error = %err, "Failed to sync namespace");
                None
            }
        }
    }

    /// 默认命名空间的配置
    pub async fn get_default_config(&self) -> Option<Arc<NamespaceConfig>> {
        self.get_config(&self.inner.config.default_namespace()).await
    }

    async fn sync_namespace(&self, namespace: &str) -> Result<Option<Arc<NamespaceConfig>>> {
        let values = self
            .inner
            .source
            .fetch(&self.inner.config, namespace)
            .await?;

        let Some(values) = values else {
            debug!(namespace = %namespace, "Namespace does not exist");
            return Ok(None);
        };

        let config = Arc::new(NamespaceConfig::new(namespace, values));
        let mut cache = self.inner.cache.write().await;
        let entry = cache
            .entry(namespace.to_string())
            .or_insert_with(|| config.clone());
        Ok(Some(entry.clone()))
    }

    // ============================================================
    // 默认命名空间的便捷读取
    // ============================================================

    pub async fn get_value(&self, key: &str) -> Option<String> {
        self.get_default_config()
            .await
            .and_then(|c| c.get_value(key).map(str::to_string))
    }

    pub async fn get_string_value(&self, key: &str, default_value: &str) -> String {
        match self.get_default_config().await {
            Some(c) => c.get_string_value(key, default_value),
            None => default_value.to_string(),
        }
    }

    pub async fn get_int_value(&self, key: &str, default_value: i64) -> i64 {
        match self.get_default_config().await {
            Some(c) => c.get_int_value(key, default_value),
            None => default_value,
        }
    }

    pub async fn get_float_value(&self, key: &str, default_value: f64) -> f64 {
        match self.get_default_config().await {
            Some(c) => c.get_float_value(key, default_value),
            None => default_value,
        }
    }

    pub async fn get_bool_value(&self, key: &str, default_value: bool) -> bool {
        match self.get_default_config().await {
            Some(c) => c.get_bool_value(key, default_value),
            None => default_value,
        }
    }

    pub async fn get_string_slice_value(&self, key: &str, default_value: &[String]) -> Vec<String> {
        match self.get_default_config().await {
            Some(c) => c.get_string_slice_value(key, default_value),
            None => default_value.to_vec(),
        }
    }

    pub async fn get_int_slice_value(&self, key: &str, default_value: &[i64]) -> Vec<i64> {
        match self.get_default_config().await {
            Some(c) => c.get_int_slice_value(key, default_value),
            None => default_value.to_vec(),
        }
    }

    // ============================================================
    // 变更监听
    // ============================================================

    pub async fn add_change_listener(&self, listener: Arc<dyn ChangeListener>) {
        self.inner.listeners.write().await.push(listener);
    }

    /// 按 `Arc` 身份移除监听器
    pub async fn remove_change_listener(&self, listener: &Arc<dyn ChangeListener>) {
        let target = Arc::as_ptr(listener) as *const ();
        self.inner
            .listeners
            .write()
            .await
            .retain(|l| Arc::as_ptr(l) as *const () != target);
    }

    pub async fn change_listeners(&self) -> Vec<Arc<dyn ChangeListener>> {
        self.inner.listeners.read().await.clone()
    }

    /// 重新拉取所有已缓存的命名空间，返回发生变化的命名空间数量
    pub async fn refresh(&self) -> Result<usize> {
        let namespaces: Vec<String> = self.inner.cache.read().await.keys().cloned().collect();

        let mut events = Vec::new();
        for namespace in namespaces {
            let values = match self.inner.source.fetch(&self.inner.config, &namespace).await {
                Ok(Some(values)) => values,
                Ok(None) => {
                    warn!(namespace = %namespace, "Namespace disappeared, keeping cached values");
                    continue;
                }
                Err(err) => {
                    warn!(namespace = %namespace, error = %err, "Refresh failed");
                    continue;
                }
            };

            let mut cache = self.inner.cache.write().await;
            let old = cache.get(&namespace).map(|c| c.values().clone()).unwrap_or_default();
            if let Some(event) = ChangeEvent::diff(&namespace, &old, &values) {
                cache.insert(
                    namespace.clone(),
                    Arc::new(NamespaceConfig::new(namespace.clone(), values)),
                );
                events.push(event);
            }
        }

        if !events.is_empty() {
            let listeners = self.change_listeners().await;
            for event in &events {
                info!(
                    namespace = %event.namespace,
                    changes = event.changes.len(),
                    "Config changed"
                );
                for listener in &listeners {
                    listener.on_change(event);
                }
            }
        }

        Ok(events.len())
    }

    /// 定时刷新任务是否在运行
    pub fn is_refreshing(&self) -> bool {
        self.inner
            .refresh_task
            .lock()
            .map(|task| task.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    /// 停止定时刷新任务
    pub fn stop_refresh(&self) {
        if let Some(handle) = self.inner.refresh_task.lock().ok().and_then(|mut task| task.take()) {
            handle.abort();
            info!(app_id = %self.inner.config.app_id, "Config refresh stopped");
        }
    }

    fn spawn_refresh(&self) {
        let period = self.inner.config.sync_interval();
        if period.is_zero() {
            return;
        }

        // 任务只持有弱引用，客户端全部释放后自行退出
        let weak: Weak<ClientInner> = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let client = ConfigClient { inner };
                if let Err(err) = client.refresh().await {
                    warn!(error = %err, "Scheduled config refresh failed");
                }
            }
        });

        if let Ok(mut task) = self.inner.refresh_task.lock() {
            if let Some(previous) = task.replace(handle) {
                previous.abort();
            }
        }
    }
}
