//! 认证模块
//!
//! 管理会话状态，与路由系统解耦。
//! 会话只经由 `login` / `logout` 修改；路由服务与守卫组件只读取注入的会话信号。

use crate::api::{Api, build_api};
use crate::web::BrowserStorage;
use clinica_shared::session::{Session, SessionStore};
use clinica_shared::{ClinicError, ClinicResult, Permission, Role, UserRecord};
use leptos::prelude::*;

/// 认证上下文
///
/// 持久化的 `SessionStore` 保存在 `StoredValue` 中，
/// 每次变更后把最新会话镜像到信号，驱动界面与守卫重新判定。
#[derive(Clone, Copy)]
pub struct AuthContext {
    session: ReadSignal<Session>,
    set_session: WriteSignal<Session>,
    store: StoredValue<SessionStore<BrowserStorage>>,
}

impl AuthContext {
    /// 从 LocalStorage 恢复会话
    pub fn restore() -> Self {
        let store = SessionStore::restore(BrowserStorage);
        let (session, set_session) = signal(store.session().clone());
        if session.get_untracked().is_authenticated() {
            log_info!("[Auth] Session restored from storage");
        }
        Self {
            session,
            set_session,
            store: StoredValue::new(store),
        }
    }

    /// 会话信号（用于路由服务注入）
    pub fn session_signal(&self) -> Signal<Session> {
        self.session.into()
    }

    pub fn role_signal(&self) -> Signal<Role> {
        let session = self.session;
        Signal::derive(move || session.with(|s| s.role()))
    }

    /// 当前用户（响应式）
    pub fn user(&self) -> Option<UserRecord> {
        self.session.with(|s| s.user().cloned())
    }

    /// 当前角色是否具备某项权限（响应式）
    pub fn can(&self, permission: Permission) -> bool {
        self.session.with(|s| s.role().can(permission))
    }

    /// 携带当前令牌的 API 客户端
    pub fn api(&self) -> Api {
        let token = self
            .session
            .with_untracked(|s| s.token().map(str::to_string));
        build_api(token)
    }

    fn sync(&self) {
        let session = self.store.with_value(|store| store.session().clone());
        self.set_session.set(session);
    }

    /// 建立新会话（整体替换）
    pub fn establish(&self, user: UserRecord, token: String) -> ClinicResult<()> {
        let result = self
            .store
            .try_update_value(|store| store.login(user, token))
            .unwrap_or_else(|| Err(ClinicError::storage("sesión no disponible")));
        // 即使持久化失败，内存会话也已建立
        self.sync();
        result
    }

    /// 注销：清空内存会话与持久化的键，可重复调用
    pub fn logout(&self) {
        let result = self.store.try_update_value(|store| store.logout());
        if let Some(Err(e)) = result {
            log_warn!("[Auth] Failed to clear stored session: {}", e);
        }
        self.sync();
        log_info!("[Auth] Logged out");
    }

    /// 统一处理页面上的请求错误；认证失败时强制注销
    pub fn handle_error(&self, err: &ClinicError) {
        log_error!("[Api] {}", err);
        if err.forces_logout() && self.session.with_untracked(|s| s.is_authenticated()) {
            self.logout();
        }
    }
}

/// 从 Context 获取认证上下文
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("AuthContext should be provided")
}

/// 登录
///
/// 本地校验失败时不发起网络请求，成功后建立会话。
pub async fn login(ctx: &AuthContext, email: String, password: String) -> ClinicResult<()> {
    let res = build_api(None)
        .login(&email, &password)
        .await
        .map_err(|e| e.in_op("auth.login"))?;

    log_info!("[Auth] Logged in as {}", res.user.email);
    ctx.establish(res.user, res.token)
}
