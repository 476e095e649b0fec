use crate::auth::use_auth;
use crate::components::icons::RefreshCw;
use crate::components::notice::{Notice, NoticeToast, use_notice};
use clinica_shared::Permission;
use clinica_shared::dashboard::{CountKind, DashboardCounts, fetch_count};
use clinica_shared::generation::RequestGeneration;
use leptos::prelude::*;
use leptos::task::spawn_local;

fn required_permission(kind: CountKind) -> Permission {
    match kind {
        CountKind::Users => Permission::ViewUsers,
        CountKind::Patients => Permission::ViewPatients,
        CountKind::Appointments => Permission::ViewAppointments,
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let auth = use_auth();
    let notice = use_notice();

    let counts = RwSignal::new(DashboardCounts::default());
    let generation = StoredValue::new(RequestGeneration::new());
    let (loading, set_loading) = signal(0usize);

    // 三个计数并发请求，各自完成时只写自己的字段
    let load_counts = move || {
        let Some(tag) = generation.try_with_value(|g| g.begin()) else {
            return;
        };
        counts.set(DashboardCounts::default());

        for kind in CountKind::ALL {
            if !auth.can(required_permission(kind)) {
                continue;
            }
            let api = auth.api();
            set_loading.update(|n| *n += 1);
            spawn_local(async move {
                let result = fetch_count(&api, kind, tag).await;
                // 页面已卸载时上下文已释放，结果直接丢弃
                let Some(current) = generation.try_get_value() else {
                    return;
                };
                match result {
                    Ok(update) => {
                        counts.try_update(|c| c.apply(update, &current));
                    }
                    Err(e) if current.is_current(tag) => {
                        auth.handle_error(&e);
                        notice.try_set(Some(Notice::error(format!(
                            "No se pudo cargar {}: {}",
                            kind.label().to_lowercase(),
                            e.message()
                        ))));
                    }
                    Err(_) => {}
                }
                set_loading.try_update(|n| *n = n.saturating_sub(1));
            });
        }
    };

    Effect::new(move |_| load_counts());

    let stat = move |kind: CountKind| {
        move || match counts.with(|c| c.get(kind)) {
            Some(value) => value.to_string(),
            None => "-".to_string(),
        }
    };

    view! {
        <NoticeToast notice=notice />

        <div class="flex items-center justify-between">
            <div>
                <h2 class="text-2xl font-bold">"Panel de control"</h2>
                <p class="text-base-content/70 text-sm">
                    "Bienvenido, " {move || auth.user().map(|u| u.name).unwrap_or_default()}
                </p>
            </div>
            <button
                on:click=move |_| load_counts()
                disabled=move || loading.get() > 0
                class="btn btn-ghost btn-circle"
            >
                <RefreshCw attr:class=move || {
                    if loading.get() > 0 { "h-5 w-5 animate-spin" } else { "h-5 w-5" }
                } />
            </button>
        </div>

        <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100">
            {CountKind::ALL
                .into_iter()
                .map(|kind| view! {
                    <div class="stat">
                        <div class="stat-title">{kind.label()}</div>
                        <div class="stat-value text-primary">{stat(kind)}</div>
                    </div>
                })
                .collect_view()}
        </div>
    }
}
