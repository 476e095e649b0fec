//! 路由守卫组件
//!
//! 包裹受保护的视图；判定随会话信号变化重新计算，不缓存。

use crate::auth::use_auth;
use crate::web::router::use_router;
use clinica_shared::Permission;
use clinica_shared::date::{Clock, SystemClock};
use clinica_shared::guard::{GuardDecision, GuardKind, evaluate};
use leptos::prelude::*;

fn guarded(kind: GuardKind, children: ChildrenFn) -> impl IntoView {
    let auth = use_auth();
    let router = use_router();
    let session = auth.session_signal();

    let decision = Memo::new(move |_| session.with(|s| evaluate(kind, s, SystemClock.now())));

    Effect::new(move |_| match decision.get() {
        GuardDecision::RedirectToLogin => router.redirect_to_login(),
        GuardDecision::ForceLogout => {
            log_warn!("[Auth] Token expired, forcing logout");
            auth.logout();
            router.redirect_to_login();
        }
        GuardDecision::Render | GuardDecision::AccessDenied => {}
    });

    move || match decision.get() {
        GuardDecision::Render => children().into_any(),
        GuardDecision::AccessDenied => view! { <AccessDenied /> }.into_any(),
        GuardDecision::RedirectToLogin | GuardDecision::ForceLogout => ().into_any(),
    }
}

/// 需要任意已认证会话
#[component]
pub fn AuthGuard(children: ChildrenFn) -> impl IntoView {
    guarded(GuardKind::Auth, children)
}

/// 需要管理员角色；非管理员就地显示无权访问，不导航、不清除会话
#[component]
pub fn AdminGuard(children: ChildrenFn) -> impl IntoView {
    guarded(GuardKind::Admin, children)
}

/// 需要未过期的令牌；过期或无法解析时先注销再重定向
#[component]
pub fn FreshTokenGuard(children: ChildrenFn) -> impl IntoView {
    guarded(GuardKind::FreshToken, children)
}

#[component]
pub fn AccessDenied() -> impl IntoView {
    view! {
        <div role="alert" class="alert alert-warning shadow">
            <span class="font-semibold">"Acceso denegado"</span>
            <span>"Su rol no tiene permiso para ver esta sección."</span>
        </div>
    }
}

/// 按权限显示子内容（如新建、删除按钮）
#[component]
pub fn Can(
    permission: Permission,
    children: ChildrenFn,
    #[prop(optional, into)] fallback: ViewFn,
) -> impl IntoView {
    let auth = use_auth();
    view! {
        <Show when=move || auth.can(permission) fallback=fallback>
            {children()}
        </Show>
    }
}
