//! 路由定义模块 - 领域模型
//!
//! 这是纯粹的业务逻辑层，不依赖于 DOM 或 web_sys。
//! 定义了应用的所有路由及其守卫类型。

use clinica_shared::guard::GuardKind;
use std::fmt::Display;

/// 应用路由枚举
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppRoute {
    /// 登录页面 (默认路由)
    #[default]
    Login,
    /// 通过邮件链接重置密码
    ResetPassword(String),
    /// 控制面板
    Dashboard,
    /// 用户管理（仅管理员）
    Users,
    Patients,
    /// 患者病历（旧版受保护路由，要求令牌未过期）
    PatientHistory(String),
    Appointments,
    /// 患者自助预约
    Chatbot,
    /// 页面未找到
    NotFound,
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] | ["login"] => Self::Login,
            ["reset-password", token] => Self::ResetPassword(token.to_string()),
            ["dashboard"] => Self::Dashboard,
            ["usuarios"] => Self::Users,
            ["pacientes"] => Self::Patients,
            ["pacientes", id, "historia"] => Self::PatientHistory(id.to_string()),
            ["citas"] => Self::Appointments,
            ["agendar"] => Self::Chatbot,
            _ => Self::NotFound,
        }
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> String {
        match self {
            Self::Login => "/".to_string(),
            Self::ResetPassword(token) => format!("/reset-password/{}", token),
            Self::Dashboard => "/dashboard".to_string(),
            Self::Users => "/usuarios".to_string(),
            Self::Patients => "/pacientes".to_string(),
            Self::PatientHistory(id) => format!("/pacientes/{}/historia", id),
            Self::Appointments => "/citas".to_string(),
            Self::Chatbot => "/agendar".to_string(),
            Self::NotFound => "/404".to_string(),
        }
    }

    /// **核心守卫逻辑：定义该路由需要的守卫**
    pub fn guard(&self) -> GuardKind {
        match self {
            Self::Login | Self::ResetPassword(_) | Self::Chatbot | Self::NotFound => {
                GuardKind::Public
            }
            Self::Users => GuardKind::Admin,
            Self::PatientHistory(_) => GuardKind::FreshToken,
            Self::Dashboard | Self::Patients | Self::Appointments => GuardKind::Auth,
        }
    }

    /// 定义已认证用户是否应该离开此路由（如登录页）
    pub fn should_redirect_when_authenticated(&self) -> bool {
        matches!(self, Self::Login)
    }

    /// 获取认证失败时的重定向目标
    pub fn auth_failure_redirect() -> Self {
        Self::Login
    }

    /// 获取认证成功时的重定向目标（从登录页）
    pub fn auth_success_redirect() -> Self {
        Self::Dashboard
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_round_trip() {
        let routes = [
            AppRoute::Login,
            AppRoute::ResetPassword("abc123".into()),
            AppRoute::Dashboard,
            AppRoute::Users,
            AppRoute::Patients,
            AppRoute::PatientHistory("p1".into()),
            AppRoute::Appointments,
            AppRoute::Chatbot,
        ];
        for route in routes {
            assert_eq!(AppRoute::from_path(&route.to_path()), route);
        }
    }

    #[test]
    fn test_unknown_and_trailing_slash() {
        assert_eq!(AppRoute::from_path("/login/"), AppRoute::Login);
        assert_eq!(AppRoute::from_path("/pacientes/"), AppRoute::Patients);
        assert_eq!(AppRoute::from_path("/pacientes/p1"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/reset-password"), AppRoute::NotFound);
    }

    #[test]
    fn test_guard_kinds() {
        assert_eq!(AppRoute::Users.guard(), GuardKind::Admin);
        assert_eq!(AppRoute::PatientHistory("x".into()).guard(), GuardKind::FreshToken);
        assert_eq!(AppRoute::Appointments.guard(), GuardKind::Auth);
        assert_eq!(AppRoute::Chatbot.guard(), GuardKind::Public);
        assert_eq!(AppRoute::ResetPassword("t".into()).guard(), GuardKind::Public);
    }
}
