//! 会话存储
//!
//! 会话只能通过 `login` / `logout` 整体替换或清空，不暴露字段级写入。
//! 每次变更同步写回持久化存储，启动时通过 `restore` 重新加载。

use crate::storage::KeyValueStore;
use crate::{ClinicError, ClinicResult, Role, STORAGE_TOKEN_KEY, STORAGE_USER_KEY, UserRecord};

/// 当前登录身份（用户记录 + Bearer 令牌）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    user: Option<UserRecord>,
    token: Option<String>,
}

impl Session {
    pub fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// 当前角色，未登录时为 `Role::Unrecognized`
    pub fn role(&self) -> Role {
        self.user.as_ref().map(|u| u.role).unwrap_or_default()
    }

    /// 用户与令牌同时存在且非空（用户需有姓名和邮箱）
    pub fn is_authenticated(&self) -> bool {
        self.user.as_ref().is_some_and(has_identity)
            && self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

fn has_identity(user: &UserRecord) -> bool {
    !user.name.trim().is_empty() && !user.email.trim().is_empty()
}

/// 会话存储
pub struct SessionStore<S: KeyValueStore> {
    storage: S,
    session: Session,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// 从持久化存储恢复会话
    ///
    /// 任何损坏或不完整的持久化数据都视为"未登录"，并清理残留的键。
    pub fn restore(storage: S) -> Self {
        let session = match Self::load(&storage) {
            Ok(session) => session,
            Err(_) => {
                let _ = storage.remove(STORAGE_USER_KEY);
                let _ = storage.remove(STORAGE_TOKEN_KEY);
                Session::default()
            }
        };
        Self { storage, session }
    }

    fn load(storage: &S) -> ClinicResult<Session> {
        let user_raw = storage.get(STORAGE_USER_KEY);
        let token = storage.get(STORAGE_TOKEN_KEY);

        match (user_raw, token) {
            (None, None) => Ok(Session::default()),
            (Some(raw), Some(token)) if !token.is_empty() => {
                let user: UserRecord = serde_json::from_str(&raw)
                    .map_err(|e| ClinicError::from(e).in_op("session.restore"))?;
                if !has_identity(&user) {
                    return Err(
                        ClinicError::storage("persisted user has no identity").in_op("session.restore")
                    );
                }
                Ok(Session {
                    user: Some(user),
                    token: Some(token),
                })
            }
            _ => Err(ClinicError::storage("incomplete persisted session").in_op("session.restore")),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// 以新身份整体替换当前会话并持久化
    ///
    /// 内存状态总是被替换；持久化失败时返回错误，由调用方决定如何提示。
    pub fn login(&mut self, user: UserRecord, token: String) -> ClinicResult<()> {
        let serialized =
            serde_json::to_string(&user).map_err(|e| ClinicError::from(e).in_op("session.login"))?;

        self.session = Session {
            user: Some(user),
            token: Some(token),
        };

        self.storage
            .set(STORAGE_USER_KEY, &serialized)
            .map_err(|e| e.in_op("session.login"))?;
        self.storage
            .set(STORAGE_TOKEN_KEY, self.session.token().unwrap_or_default())
            .map_err(|e| e.in_op("session.login"))
    }

    /// 清空会话并删除持久化副本，重复调用无副作用
    pub fn logout(&mut self) -> ClinicResult<()> {
        self.session = Session::default();
        self.storage
            .remove(STORAGE_USER_KEY)
            .map_err(|e| e.in_op("session.logout"))?;
        self.storage
            .remove(STORAGE_TOKEN_KEY)
            .map_err(|e| e.in_op("session.logout"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn ana() -> UserRecord {
        UserRecord::new("Ana", "ana@clinica.com", Role::Administrator)
    }

    #[test]
    fn test_fresh_store_is_logged_out() {
        let storage = MemoryStore::new();
        let store = SessionStore::restore(&storage);
        assert!(!store.is_authenticated());
        assert_eq!(store.session().role(), Role::Unrecognized);
    }

    #[test]
    fn test_login_persists_and_restores() {
        let storage = MemoryStore::new();
        let mut store = SessionStore::restore(&storage);
        store.login(ana(), "tok-1".to_string()).unwrap();
        assert!(store.is_authenticated());
        assert_eq!(storage.get(STORAGE_TOKEN_KEY).as_deref(), Some("tok-1"));

        let restored = SessionStore::restore(&storage);
        assert!(restored.is_authenticated());
        assert_eq!(restored.session().user(), Some(&ana()));
        assert_eq!(restored.session().token(), Some("tok-1"));
    }

    #[test]
    fn test_login_replaces_wholesale() {
        let storage = MemoryStore::new();
        let mut store = SessionStore::restore(&storage);
        store.login(ana(), "tok-1".to_string()).unwrap();

        let luis = UserRecord::new("Luis", "luis@clinica.com", Role::Reader);
        store.login(luis.clone(), "tok-2".to_string()).unwrap();
        assert_eq!(store.session().user(), Some(&luis));
        assert_eq!(store.session().token(), Some("tok-2"));
        assert_eq!(store.session().role(), Role::Reader);
    }

    #[test]
    fn test_logout_is_idempotent() {
        let storage = MemoryStore::new();
        let mut store = SessionStore::restore(&storage);
        store.login(ana(), "tok".to_string()).unwrap();

        store.logout().unwrap();
        let once = store.session().clone();
        store.logout().unwrap();
        assert_eq!(store.session(), &once);
        assert_eq!(once, Session::default());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_authenticated_iff_user_and_token_across_interleavings() {
        let storage = MemoryStore::new();
        let mut store = SessionStore::restore(&storage);
        let steps: &[Option<&str>] = &[
            Some("a"),
            None,
            None,
            Some("b"),
            Some("c"),
            None,
            Some(""),
            Some("d"),
        ];

        for step in steps {
            match step {
                Some(token) => store.login(ana(), token.to_string()).unwrap(),
                None => store.logout().unwrap(),
            }
            let s = store.session();
            let expected = s.user().is_some() && s.token().is_some_and(|t| !t.is_empty());
            assert_eq!(store.is_authenticated(), expected);
        }
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_blank_user_is_not_authenticated() {
        let storage = MemoryStore::new();
        let mut store = SessionStore::restore(&storage);
        store
            .login(UserRecord::new("", "", Role::Administrator), "tok".to_string())
            .unwrap();
        assert!(!store.is_authenticated());

        store
            .login(UserRecord::new("  ", "ana@clinica.com", Role::Administrator), "tok".to_string())
            .unwrap();
        assert!(!store.is_authenticated());

        // 持久化的空身份在恢复时被丢弃
        let restored = SessionStore::restore(&storage);
        assert!(!restored.is_authenticated());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_corrupted_user_json_degrades_to_logged_out() {
        let storage = MemoryStore::new();
        storage.set(STORAGE_USER_KEY, "{not json").unwrap();
        storage.set(STORAGE_TOKEN_KEY, "tok").unwrap();

        let store = SessionStore::restore(&storage);
        assert!(!store.is_authenticated());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_half_persisted_session_is_discarded() {
        let storage = MemoryStore::new();
        storage.set(STORAGE_TOKEN_KEY, "tok").unwrap();

        let store = SessionStore::restore(&storage);
        assert!(!store.is_authenticated());
        assert!(storage.get(STORAGE_TOKEN_KEY).is_none());
    }
}
