use serde::{Deserialize, Serialize};

use crate::apollo::ApolloConfig;
use crate::error::Result;
use crate::logging::LogConfig;
use crate::registry::NacosConfig;

/// 工具包配置
///
/// ```toml
/// [logging]
/// level = "info"
///
/// [nacos]
/// server_addr = "127.0.0.1"
/// namespace_id = "dev"
///
/// [apollo]
/// app_id = "order-service"
/// ip = "http://127.0.0.1:8080"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub logging: LogConfig,
    pub nacos: Option<NacosConfig>,
    pub apollo: Option<ApolloConfig>,
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}
