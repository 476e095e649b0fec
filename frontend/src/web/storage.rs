//! LocalStorage 封装模块
//!
//! 使用 `web_sys::Storage` 实现共享层的 `KeyValueStore`。

use clinica_shared::storage::KeyValueStore;
use clinica_shared::{ClinicError, ClinicResult};

/// 浏览器 LocalStorage
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

impl BrowserStorage {
    /// 获取 LocalStorage 实例（隐私模式等情况下可能不可用）
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) -> ClinicResult<()> {
        let storage = Self::storage()
            .ok_or_else(|| ClinicError::storage("localStorage no disponible"))?;
        storage
            .set_item(key, value)
            .map_err(|e| ClinicError::storage(format!("{:?}", e)).in_op_with("storage.set", key))
    }

    fn remove(&self, key: &str) -> ClinicResult<()> {
        // 存储不可用时也就没有需要删除的内容
        let Some(storage) = Self::storage() else {
            return Ok(());
        };
        storage
            .remove_item(key)
            .map_err(|e| ClinicError::storage(format!("{:?}", e)).in_op_with("storage.remove", key))
    }
}
