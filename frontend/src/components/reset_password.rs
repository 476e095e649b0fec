use crate::api::build_api;
use crate::web::route::AppRoute;
use crate::web::router::use_router;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// 通过邮件链接中的令牌重置密码
///
/// 长度不足或两次输入不一致时由 `reset_password` 直接拒绝，不发起请求。
#[component]
pub fn ResetPasswordPage(token: String) -> impl IntoView {
    let router = use_router();
    let token = StoredValue::new(token);

    let new_password = RwSignal::new(String::new());
    let confirmation = RwSignal::new(String::new());
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (done, set_done) = signal(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if is_submitting.get_untracked() {
            return;
        }
        let password = new_password.get_untracked();
        let confirm = confirmation.get_untracked();

        set_is_submitting.set(true);
        set_error_msg.set(None);

        spawn_local(async move {
            let result = build_api(None)
                .reset_password(&token.get_value(), &password, &confirm)
                .await;
            match result {
                Ok(()) => {
                    let _ = set_done.try_set(true);
                }
                Err(e) => {
                    log_error!("[Auth] Password reset failed: {}", e);
                    let _ = set_error_msg.try_set(Some(e.message().to_string()));
                }
            }
            let _ = set_is_submitting.try_set(false);
        });
    };

    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content flex-col w-full max-w-md">
                <h1 class="text-2xl font-bold">"Restablecer contraseña"</h1>
                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <Show
                        when=move || !done.get()
                        fallback=move || view! {
                            <div class="card-body items-center text-center">
                                <p>"Su contraseña fue actualizada."</p>
                                <button class="btn btn-primary" on:click=move |_| router.go(AppRoute::Login)>
                                    "Ir al inicio de sesión"
                                </button>
                            </div>
                        }
                    >
                        <form class="card-body" on:submit=on_submit>
                            <Show when=move || error_msg.get().is_some()>
                                <div role="alert" class="alert alert-error text-sm py-2">
                                    <span>{move || error_msg.get().unwrap_or_default()}</span>
                                </div>
                            </Show>
                            <input
                                type="password"
                                placeholder="Nueva contraseña"
                                class="input input-bordered"
                                on:input=move |ev| new_password.set(event_target_value(&ev))
                                prop:value=new_password
                            />
                            <input
                                type="password"
                                placeholder="Confirmar contraseña"
                                class="input input-bordered"
                                on:input=move |ev| confirmation.set(event_target_value(&ev))
                                prop:value=confirmation
                            />
                            <button class="btn btn-primary mt-4" disabled=move || is_submitting.get()>
                                "Guardar"
                            </button>
                        </form>
                    </Show>
                </div>
            </div>
        </div>
    }
}
