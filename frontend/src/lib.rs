//! Clínica 管理控制台前端
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `web::route`: 路由定义（领域模型）
//! - `web::router`: 路由服务（核心引擎）
//! - `auth`: 会话上下文，会话只经由登录/注销修改
//! - `components`: UI 组件层
//!
//! 所有可测试的业务逻辑（会话、权限、守卫判定、预约对话）都位于 `clinica-shared`。

// 日志宏：wasm32 下输出到浏览器控制台，其他目标输出到标准输出/错误
#[cfg(target_arch = "wasm32")]
macro_rules! log_info {
    ($($arg:tt)*) => {
        web_sys::console::log_1(&format!($($arg)*).into())
    };
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! log_info {
    ($($arg:tt)*) => {
        println!($($arg)*)
    };
}

#[cfg(target_arch = "wasm32")]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        web_sys::console::warn_1(&format!($($arg)*).into())
    };
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        eprintln!($($arg)*)
    };
}

#[cfg(target_arch = "wasm32")]
macro_rules! log_error {
    ($($arg:tt)*) => {
        web_sys::console::error_1(&format!($($arg)*).into())
    };
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! log_error {
    ($($arg:tt)*) => {
        eprintln!($($arg)*)
    };
}

mod api;
mod auth;
mod config;
mod components {
    pub mod appointments;
    pub mod chatbot;
    pub mod dashboard;
    pub mod guards;
    pub mod history;
    mod icons;
    pub mod layout;
    pub mod login;
    pub mod notice;
    pub mod patients;
    pub mod reset_password;
    mod submit;
    pub mod users;
}

use crate::auth::AuthContext;
use crate::components::appointments::AppointmentsPage;
use crate::components::chatbot::ChatbotPage;
use crate::components::dashboard::DashboardPage;
use crate::components::guards::{AdminGuard, AuthGuard, FreshTokenGuard};
use crate::components::history::HistoryPage;
use crate::components::layout::{Shell, ThemeContext};
use crate::components::login::LoginPage;
use crate::components::patients::PatientsPage;
use crate::components::reset_password::ResetPasswordPage;
use crate::components::users::UsersPage;

use leptos::prelude::*;

// 浏览器 API 封装模块
pub(crate) mod web {
    mod http;
    pub mod route;
    pub mod router;
    mod storage;

    pub use http::FetchClient;
    pub use storage::BrowserStorage;
}

use web::route::AppRoute;
use web::router::{Router, RouterOutlet};

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件，受保护页面包裹在对应的守卫中。
fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::ResetPassword(token) => view! { <ResetPasswordPage token=token /> }.into_any(),
        AppRoute::Chatbot => view! { <ChatbotPage /> }.into_any(),
        AppRoute::Dashboard => view! {
            <AuthGuard>
                <Shell>
                    <DashboardPage />
                </Shell>
            </AuthGuard>
        }
        .into_any(),
        AppRoute::Users => view! {
            <AuthGuard>
                <Shell>
                    <AdminGuard>
                        <UsersPage />
                    </AdminGuard>
                </Shell>
            </AuthGuard>
        }
        .into_any(),
        AppRoute::Patients => view! {
            <AuthGuard>
                <Shell>
                    <PatientsPage />
                </Shell>
            </AuthGuard>
        }
        .into_any(),
        AppRoute::PatientHistory(id) => {
            let id = StoredValue::new(id);
            view! {
                <FreshTokenGuard>
                    <Shell>
                        <HistoryPage patient_id=id.get_value() />
                    </Shell>
                </FreshTokenGuard>
            }
            .into_any()
        }
        AppRoute::Appointments => view! {
            <AuthGuard>
                <Shell>
                    <AppointmentsPage />
                </Shell>
            </AuthGuard>
        }
        .into_any(),
        AppRoute::NotFound => view! {
            <div class="flex items-center justify-center min-h-screen bg-base-200">
                <div class="text-center">
                    <h1 class="text-6xl font-bold text-error">"404"</h1>
                    <p class="text-xl mt-4">"Página no encontrada"</p>
                </div>
            </div>
        }
        .into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 从 LocalStorage 恢复会话并提供上下文
    let auth_ctx = AuthContext::restore();
    provide_context(auth_ctx);

    // 2. 主题偏好与会话无关，单独恢复
    let theme = ThemeContext::restore();
    provide_context(theme);

    // 3. 会话信号注入路由服务
    let session = auth_ctx.session_signal();

    view! {
        <Router session=session>
            <RouterOutlet matcher=route_matcher />
        </Router>
    }
}
