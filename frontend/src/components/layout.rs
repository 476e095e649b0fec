//! 页面框架：导航栏、主题切换与注销

use crate::auth::use_auth;
use crate::components::icons::{LogOut, Moon, Stethoscope, Sun};
use crate::web::BrowserStorage;
use crate::web::route::AppRoute;
use crate::web::router::{Link, use_router};
use clinica_shared::Permission;
use clinica_shared::theme::Theme;
use leptos::prelude::*;

/// 把主题写到 `<html data-theme="...">`
fn apply_theme(theme: Theme) {
    let root = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.document_element());
    if let Some(root) = root {
        let _ = root.set_attribute("data-theme", theme.as_str());
    }
}

/// 主题上下文，独立于会话（注销不影响主题）
#[derive(Clone, Copy)]
pub struct ThemeContext {
    theme: RwSignal<Theme>,
}

impl ThemeContext {
    pub fn restore() -> Self {
        let theme = RwSignal::new(Theme::load(&BrowserStorage));

        Effect::new(move |_| apply_theme(theme.get()));

        Self { theme }
    }

    pub fn get(&self) -> Theme {
        self.theme.get()
    }

    pub fn toggle(&self) {
        let next = self.theme.get_untracked().toggled();
        if let Err(e) = next.save(&BrowserStorage) {
            log_warn!("[Theme] Failed to persist preference: {}", e);
        }
        self.theme.set(next);
    }
}

pub fn use_theme() -> ThemeContext {
    use_context::<ThemeContext>().expect("ThemeContext should be provided")
}

#[component]
pub fn ThemeToggle() -> impl IntoView {
    let theme = use_theme();
    view! {
        <button class="btn btn-ghost btn-circle" on:click=move |_| theme.toggle()>
            {move || match theme.get() {
                Theme::Light => view! { <Moon attr:class="h-5 w-5" /> }.into_any(),
                Theme::Dark => view! { <Sun attr:class="h-5 w-5" /> }.into_any(),
            }}
        </button>
    }
}

/// 已登录页面的外框
#[component]
pub fn Shell(children: Children) -> impl IntoView {
    let auth = use_auth();
    let router = use_router();

    let user_name = move || auth.user().map(|u| u.name).unwrap_or_default();
    let role_label = move || auth.role_signal().get().label();

    let on_logout = move |_| {
        auth.logout();
        router.redirect_to_login();
    };

    view! {
        <div class="min-h-screen bg-base-200 p-4 md:p-8 font-sans">
            <div class="max-w-7xl mx-auto space-y-8">
                <div class="navbar bg-base-100 rounded-box shadow-xl">
                    <div class="flex-1 gap-2">
                        <Stethoscope attr:class="text-primary h-6 w-6" />
                        <Link route=AppRoute::Dashboard class="btn btn-ghost text-xl">"Clínica"</Link>
                        <ul class="menu menu-horizontal px-1 hidden md:flex">
                            <Show when=move || auth.can(Permission::ViewUsers)>
                                <li><Link route=AppRoute::Users>"Usuarios"</Link></li>
                            </Show>
                            <Show when=move || auth.can(Permission::ViewPatients)>
                                <li><Link route=AppRoute::Patients>"Pacientes"</Link></li>
                            </Show>
                            <Show when=move || auth.can(Permission::ViewAppointments)>
                                <li><Link route=AppRoute::Appointments>"Citas"</Link></li>
                            </Show>
                        </ul>
                    </div>
                    <div class="flex-none gap-2">
                        <span class="hidden md:inline text-sm">{user_name}</span>
                        <span class="badge badge-neutral">{role_label}</span>
                        <ThemeToggle />
                        <button on:click=on_logout class="btn btn-outline btn-error gap-2">
                            <LogOut attr:class="h-4 w-4" /> "Cerrar sesión"
                        </button>
                    </div>
                </div>

                {children()}
            </div>
        </div>
    }
}
