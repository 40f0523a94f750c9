//! 服务注册发现模块
//!
//! 封装 Nacos 风格的命名服务：实例注册、按环境（线上/灰度）查询，
//! 以及基于权重的目标机器选择。

pub mod config;
pub mod instance;
pub mod load_balancer;
pub mod nacos;
pub mod nacos_http;
pub mod trait_def;

pub use config::NacosConfig;
pub use instance::{EnvMode, GRAY_TAG, ServiceInfo, ServiceInstance, TargetMachine};
pub use load_balancer::{
    LoadBalanceStrategy, LoadBalancer, WeightedSelector, pick_index, select_index,
    select_index_with, validate_weights,
};
pub use nacos::{Nacos, candidate_pool, sort_by_weight};
pub use nacos_http::NacosHttpClient;
pub use trait_def::{
    DeregisterInstanceParam, GetServiceParam, NamingClient, RegisterInstanceParam,
};
