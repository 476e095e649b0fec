//! 路由服务模块 - 核心引擎
//!
//! 封装了 web_sys 的 History API，所有对 window.history 的操作都集中在此模块。
//! 实现了"监听 -> 验证 -> 处理 -> 加载"的导航流程。
//!
//! 守卫判定不缓存：每次导航、每次 popstate 以及每次会话变化都重新调用
//! `clinica_shared::guard::evaluate`。重定向一律使用 replaceState，
//! 后退按钮不会回到被拒绝的页面。

use clinica_shared::date::{Clock, SystemClock};
use clinica_shared::guard::{GuardDecision, evaluate};
use clinica_shared::session::Session;
use leptos::prelude::*;
use wasm_bindgen::prelude::*;

use super::route::AppRoute;

/// 获取当前浏览器路径
fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

/// 推送 History 状态
fn push_history_state(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.push_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// 替换 History 状态（用于重定向）
fn replace_history_state(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// 导航前的路由级判定
///
/// 只处理"未认证访问受保护页面"与"已认证访问登录页"两种情况；
/// 管理员与令牌新鲜度由页面上的守卫组件处理（需要就地提示或先注销）。
fn resolve_target(target: AppRoute, session: &Session) -> Result<AppRoute, AppRoute> {
    let decision = evaluate(target.guard(), session, SystemClock.now());
    if decision == GuardDecision::RedirectToLogin {
        return Err(AppRoute::auth_failure_redirect());
    }
    if target.should_redirect_when_authenticated() && session.is_authenticated() {
        return Err(AppRoute::auth_success_redirect());
    }
    Ok(target)
}

/// 路由器服务
///
/// 封装所有路由操作，通过 Signal 驱动界面更新。
/// 会话信号由外部注入，路由服务本身从不修改会话。
#[derive(Clone, Copy)]
pub struct RouterService {
    current_route: ReadSignal<AppRoute>,
    set_route: WriteSignal<AppRoute>,
    session: Signal<Session>,
}

impl RouterService {
    fn new(session: Signal<Session>) -> Self {
        let initial = AppRoute::from_path(&current_path());
        let (current_route, set_route) = signal(initial.clone());
        let router = Self {
            current_route,
            set_route,
            session,
        };
        // 首次加载同样经过守卫
        router.navigate_to_route(initial, false);
        router
    }

    /// 获取当前路由信号
    pub fn current_route(&self) -> ReadSignal<AppRoute> {
        self.current_route
    }

    /// **核心方法：导航与守卫**
    pub fn go(&self, route: AppRoute) {
        self.navigate_to_route(route, true);
    }

    /// 重定向到登录页（替换当前历史记录）
    pub fn redirect_to_login(&self) {
        self.redirect(AppRoute::auth_failure_redirect());
    }

    fn redirect(&self, route: AppRoute) {
        if self.current_route.get_untracked() == route {
            return;
        }
        replace_history_state(&route.to_path());
        self.set_route.set(route);
    }

    /// 导航到指定路由
    ///
    /// `use_push` 为 true 使用 pushState，否则 replaceState；守卫重定向总是 replaceState。
    fn navigate_to_route(&self, target: AppRoute, use_push: bool) {
        let session = self.session.get_untracked();

        match resolve_target(target, &session) {
            Ok(route) => {
                let path = route.to_path();
                if use_push {
                    push_history_state(&path);
                } else {
                    replace_history_state(&path);
                }
                self.set_route.set(route);
            }
            Err(redirect) => {
                log_info!("[Router] Guard redirect to {}", redirect);
                replace_history_state(&redirect.to_path());
                self.set_route.set(redirect);
            }
        }
    }

    /// 初始化浏览器后退/前进按钮监听
    fn init_popstate_listener(&self) {
        let router = *self;

        let closure = Closure::<dyn Fn()>::new(move || {
            let target = AppRoute::from_path(&current_path());
            router.navigate_to_route(target, false);
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // 泄漏闭包以保持监听器存活
        closure.forget();
    }

    /// 会话变化时重新判定当前路由
    fn setup_session_redirect(&self) {
        let router = *self;
        let session = self.session;

        Effect::new(move |_| {
            let session = session.get();
            let route = router.current_route.get_untracked();

            if let Err(redirect) = resolve_target(route, &session) {
                log_info!("[Router] Session changed, redirecting to {}", redirect);
                router.redirect(redirect);
            }
        });
    }
}

/// 提供路由服务到 Context 并初始化
fn provide_router(session: Signal<Session>) -> RouterService {
    let router = RouterService::new(session);

    router.init_popstate_listener();
    router.setup_session_redirect();

    provide_context(router);
    router
}

/// 从 Context 获取路由服务
pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

// ============================================================================
// UI 组件
// ============================================================================

/// 路由器根组件
#[component]
pub fn Router(
    /// 会话信号
    session: Signal<Session>,
    children: Children,
) -> impl IntoView {
    provide_router(session);

    children()
}

/// 路由出口组件
///
/// 根据当前路由状态渲染对应的组件。
#[component]
pub fn RouterOutlet(
    /// 路由匹配函数：接收当前路由，返回对应视图
    matcher: fn(AppRoute) -> AnyView,
) -> impl IntoView {
    let router = use_router();

    move || {
        let current = router.current_route().get();
        matcher(current)
    }
}

/// 站内链接，拦截点击改为路由导航
#[component]
pub fn Link(
    route: AppRoute,
    #[prop(optional, into)] class: String,
    children: Children,
) -> impl IntoView {
    let router = use_router();
    let href = route.to_path();

    let on_click = move |ev: leptos::ev::MouseEvent| {
        ev.prevent_default();
        router.go(route.clone());
    };

    view! {
        <a href=href class=class on:click=on_click>
            {children()}
        </a>
    }
}
