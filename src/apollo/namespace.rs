//! 命名空间配置快照

use std::collections::HashMap;
use std::str::FromStr;

/// 列表类型配置项的分隔符
pub const SLICE_SEPARATOR: char = ',';

/// 单个命名空间的配置快照
///
/// 快照不可变，刷新时整体替换。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamespaceConfig {
    namespace: String,
    values: HashMap<String, String>,
}

impl NamespaceConfig {
    pub fn new(namespace: impl Into<String>, values: HashMap<String, String>) -> Self {
        Self {
            namespace: namespace.into(),
            values,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 获取原始值
    pub fn get_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_string_value(&self, key: &str, default_value: &str) -> String {
        self.get_value(key).unwrap_or(default_value).to_string()
    }

    pub fn get_int_value(&self, key: &str, default_value: i64) -> i64 {
        self.parse_or(key, default_value)
    }

    pub fn get_float_value(&self, key: &str, default_value: f64) -> f64 {
        self.parse_or(key, default_value)
    }

    /// 布尔值接受 `1/t/T/TRUE/true/True` 与 `0/f/F/FALSE/false/False`
    pub fn get_bool_value(&self, key: &str, default_value: bool) -> bool {
        self.get_value(key)
            .and_then(|v| parse_bool(v.trim()))
            .unwrap_or(default_value)
    }

    /// 以逗号分隔的字符串列表
    pub fn get_string_slice_value(&self, key: &str, default_value: &[String]) -> Vec<String> {
        match self.get_value(key) {
            Some(value) => split_slice(value).map(str::to_string).collect(),
            None => default_value.to_vec(),
        }
    }

    /// 以逗号分隔的整数列表，任一元素无法解析时返回默认值
    pub fn get_int_slice_value(&self, key: &str, default_value: &[i64]) -> Vec<i64> {
        self.get_value(key)
            .and_then(|value| {
                split_slice(value)
                    .map(|item| item.parse::<i64>().ok())
                    .collect::<Option<Vec<_>>>()
            })
            .unwrap_or_else(|| default_value.to_vec())
    }

    fn parse_or<T: FromStr>(&self, key: &str, default_value: T) -> T {
        self.get_value(key)
            .and_then(|v| v.trim().parse::<T>().ok())
            .unwrap_or(default_value)
    }
}

fn split_slice(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(SLICE_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

/// 解析布尔值
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
