//! 持久化键值存储抽象
//!
//! 浏览器端由 `window.localStorage` 实现；测试中使用 `MemoryStore`。

use crate::ClinicResult;
use std::cell::RefCell;
use std::collections::HashMap;

/// 同步的字符串键值存储
pub trait KeyValueStore {
    /// 读取值，键不存在或存储不可用时返回 None
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> ClinicResult<()>;
    /// 删除键，键不存在时视为成功
    fn remove(&self, key: &str) -> ClinicResult<()>;
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> ClinicResult<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ClinicResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> ClinicResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> ClinicResult<()> {
        (**self).remove(key)
    }
}
