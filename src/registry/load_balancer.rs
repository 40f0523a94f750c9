//! 负载均衡模块
//!
//! 按权重从候选实例中随机选择一个下标。权重序列与候选实例一一对应，
//! 健康/启用过滤由调用方完成。

use crate::error::{KitError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 负载均衡策略
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalanceStrategy {
    /// 加权随机
    #[default]
    WeightedRandom,
    /// 随机（忽略权重）
    Random,
    /// 轮询
    RoundRobin,
}

impl std::str::FromStr for LoadBalanceStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "weighted_random" | "weightedrandom" | "weighted" => {
                Ok(LoadBalanceStrategy::WeightedRandom)
            }
            "random" => Ok(LoadBalanceStrategy::Random),
            "round_robin" | "roundrobin" => Ok(LoadBalanceStrategy::RoundRobin),
            _ => Err(format!("Unknown load balance strategy: {}", s)),
        }
    }
}

/// 校验权重序列：非空，且每个权重都是有限的非负数
pub fn validate_weights(weights: &[f64]) -> Result<()> {
    if weights.is_empty() {
        return Err(KitError::no_available_instance("weight list is empty"));
    }
    match weights
        .iter()
        .position(|w| !w.is_finite() || *w < 0.0)
    {
        Some(index) => Err(KitError::invalid_weight(index, weights[index])),
        None => Ok(()),
    }
}

/// 根据一次随机抽样值选出下标
///
/// 权重被视为首尾相接的半开区间 `[start, start + w)`，返回包含 `draw` 的区间下标。
/// 权重为 0 的区间为空，永远不会被选中。区间遍历结束仍未命中（仅在浮点舍入时发生）
/// 时返回 0。
pub fn pick_index(weights: &[f64], draw: f64) -> usize {
    let mut remaining = draw;
    for (index, weight) in weights.iter().enumerate() {
        if remaining < *weight {
            return index;
        }
        remaining -= weight;
    }
    0
}

/// 使用给定随机源按权重选择下标
///
/// - 单个元素直接返回 0，不消耗随机数
/// - 权重总和为 0 时确定性地返回 0
/// - 权重总和溢出为无穷大时先按最大权重缩放
pub fn select_index_with<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Result<usize> {
    validate_weights(weights)?;

    if weights.len() == 1 {
        return Ok(0);
    }

    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Ok(0);
    }
    if !total.is_finite() {
        return Ok(select_scaled(weights, rng));
    }

    // 抽样值落在 [0, 1)
    let draw = rng.r#gen::<f64>() * total;
    Ok(pick_index(weights, draw))
}

// 单个权重有限但总和溢出时，按最大权重缩放到 [0, 1] 后再抽样，比例不变
fn select_scaled<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    let max = weights.iter().copied().fold(0.0_f64, f64::max);
    let scaled: Vec<f64> = weights.iter().map(|w| w / max).collect();
    let total: f64 = scaled.iter().sum();
    pick_index(&scaled, rng.r#gen::<f64>() * total)
}

/// 使用线程本地随机源按权重选择下标
///
/// 每个线程拥有独立的随机源，并发调用之间没有共享状态。
pub fn select_index(weights: &[f64]) -> Result<usize> {
    select_index_with(weights, &mut rand::thread_rng())
}

/// 加权随机选择器
///
/// 持有一个可复用的随机源，多个任务共享同一个选择器时由互斥锁保护。
pub struct WeightedSelector {
    rng: Mutex<StdRng>,
}

impl WeightedSelector {
    /// 使用系统熵初始化随机源
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// 使用固定种子初始化，结果可复现
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// 按权重选择下标
    pub fn select(&self, weights: &[f64]) -> Result<usize> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| KitError::system("weighted selector rng lock poisoned"))?;
        select_index_with(weights, &mut *rng)
    }

    /// 忽略权重，等概率选择下标
    pub fn select_uniform(&self, len: usize) -> Result<usize> {
        if len == 0 {
            return Err(KitError::no_available_instance("candidate pool is empty"));
        }
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| KitError::system("weighted selector rng lock poisoned"))?;
        Ok(rng.gen_range(0..len))
    }
}

impl Default for WeightedSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// 负载均衡器
///
/// 按策略从权重序列中选出下标，供注册中心封装使用。
pub struct LoadBalancer {
    strategy: LoadBalanceStrategy,
    selector: WeightedSelector,
    round_robin_index: AtomicUsize,
}

impl LoadBalancer {
    /// 创建新的负载均衡器
    pub fn new(strategy: LoadBalanceStrategy) -> Self {
        Self::with_selector(strategy, WeightedSelector::new())
    }

    /// 使用指定的选择器创建（测试中可传入固定种子的选择器）
    pub fn with_selector(strategy: LoadBalanceStrategy, selector: WeightedSelector) -> Self {
        Self {
            strategy,
            selector,
            round_robin_index: AtomicUsize::new(0),
        }
    }

    pub fn strategy(&self) -> LoadBalanceStrategy {
        self.strategy
    }

    /// 选择下标
    pub fn select(&self, weights: &[f64]) -> Result<usize> {
        match self.strategy {
            LoadBalanceStrategy::WeightedRandom => self.selector.select(weights),
            LoadBalanceStrategy::Random => {
                validate_weights(weights)?;
                self.selector.select_uniform(weights.len())
            }
            LoadBalanceStrategy::RoundRobin => {
                validate_weights(weights)?;
                let index = self.round_robin_index.fetch_add(1, Ordering::Relaxed);
                Ok(index % weights.len())
            }
        }
    }
}

impl Default for LoadBalancer {
    fn default() -> Self {
        Self::new(LoadBalanceStrategy::WeightedRandom)
    }
}
