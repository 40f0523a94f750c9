//! 配置变更事件与监听器

use std::collections::HashMap;

/// 变更类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
}

/// 单个配置项的变更
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChange {
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub change_type: ChangeType,
}

/// 命名空间变更事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub namespace: String,
    pub changes: HashMap<String, ConfigChange>,
}

impl ChangeEvent {
    /// 比较新旧两份配置，生成变更事件；没有变化时返回 `None`
    pub fn diff(
        namespace: &str,
        old: &HashMap<String, String>,
        new: &HashMap<String, String>,
    ) -> Option<Self> {
        let mut changes = HashMap::new();

        for (key, new_value) in new {
            match old.get(key) {
                None => {
                    changes.insert(
                        key.clone(),
                        ConfigChange {
                            old_value: None,
                            new_value: Some(new_value.clone()),
                            change_type: ChangeType::Added,
                        },
                    );
                }
                Some(old_value) if old_value != new_value => {
                    changes.insert(
                        key.clone(),
                        ConfigChange {
                            old_value: Some(old_value.clone()),
                            new_value: Some(new_value.clone()),
                            change_type: ChangeType::Modified,
                        },
                    );
                }
                Some(_) => {}
            }
        }

        for (key, old_value) in old {
            if !new.contains_key(key) {
                changes.insert(
                    key.clone(),
                    ConfigChange {
                        old_value: Some(old_value.clone()),
                        new_value: None,
                        change_type: ChangeType::Deleted,
                    },
                );
            }
        }

        if changes.is_empty() {
            None
        } else {
            Some(Self {
                namespace: namespace.to_string(),
                changes,
            })
        }
    }
}

/// 配置变更监听器
pub trait ChangeListener: Send + Sync {
    /// 命名空间中有配置项发生变化
    fn on_change(&self, event: &ChangeEvent);
}
