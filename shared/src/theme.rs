//! 明暗主题偏好，独立于会话生命周期（注销不会清除）

use crate::storage::KeyValueStore;
use crate::{ClinicResult, STORAGE_THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// 读取保存的偏好，缺失或无法识别时为浅色
    pub fn load<S: KeyValueStore>(storage: &S) -> Self {
        match storage.get(STORAGE_THEME_KEY).as_deref() {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn save<S: KeyValueStore>(&self, storage: &S) -> ClinicResult<()> {
        storage.set(STORAGE_THEME_KEY, self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use crate::storage::MemoryStore;
    use crate::{Role, UserRecord};

    #[test]
    fn test_defaults_to_light() {
        let storage = MemoryStore::new();
        assert_eq!(Theme::load(&storage), Theme::Light);
        storage.set(STORAGE_THEME_KEY, "sepia").unwrap();
        assert_eq!(Theme::load(&storage), Theme::Light);
    }

    #[test]
    fn test_survives_logout() {
        let storage = MemoryStore::new();
        Theme::Light.toggled().save(&storage).unwrap();

        let mut store = SessionStore::restore(&storage);
        store
            .login(UserRecord::new("A", "a@x.com", Role::Reader), "t".into())
            .unwrap();
        store.logout().unwrap();

        assert_eq!(Theme::load(&storage), Theme::Dark);
    }
}
