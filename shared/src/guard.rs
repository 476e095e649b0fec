//! 路由守卫判定
//!
//! 纯函数，不缓存任何结果：每次导航和每次会话变化都重新调用 `evaluate`。

use crate::date::Timestamp;
use crate::session::Session;
use crate::token::check_freshness;

/// 路由所需的守卫类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardKind {
    /// 公开路由
    Public,
    /// 需要任意已认证会话
    Auth,
    /// 需要管理员角色
    Admin,
    /// 需要已认证且令牌未过期（旧版受保护路由）
    FreshToken,
}

/// 守卫判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    /// 重定向到登录页（替换历史记录）
    RedirectToLogin,
    /// 就地显示"无权访问"，不导航、不清除会话
    AccessDenied,
    /// 先注销再重定向到登录页
    ForceLogout,
}

pub fn evaluate(kind: GuardKind, session: &Session, now: Timestamp) -> GuardDecision {
    if kind == GuardKind::Public {
        return GuardDecision::Render;
    }

    if !session.is_authenticated() {
        return GuardDecision::RedirectToLogin;
    }

    match kind {
        GuardKind::Public | GuardKind::Auth => GuardDecision::Render,
        GuardKind::Admin if session.role().is_admin() => GuardDecision::Render,
        GuardKind::Admin => GuardDecision::AccessDenied,
        GuardKind::FreshToken => {
            let token = session.token().unwrap_or_default();
            if check_freshness(token, now).is_fresh() {
                GuardDecision::Render
            } else {
                GuardDecision::ForceLogout
            }
        }
    }
}
