//! 患者病历
//!
//! 字段结构不固定，按服务端返回的键逐一渲染为文本框。

use crate::auth::use_auth;
use crate::components::notice::{Notice, NoticeToast, use_notice};
use crate::web::route::AppRoute;
use crate::web::router::Link;
use clinica_shared::generation::RequestGeneration;
use clinica_shared::{ClinicalHistory, Permission};
use leptos::prelude::*;
use leptos::task::spawn_local;

/// 空病历时提供的默认字段
const DEFAULT_FIELDS: &[&str] = &["antecedentes", "alergias", "medicacion", "notas"];

#[component]
pub fn HistoryPage(patient_id: String) -> impl IntoView {
    let auth = use_auth();
    let notice = use_notice();
    let patient_id = StoredValue::new(patient_id);

    let history = RwSignal::new(ClinicalHistory::default());
    let (loading, set_loading) = signal(true);
    let (saving, set_saving) = signal(false);
    let generation = StoredValue::new(RequestGeneration::new());

    Effect::new(move |_| {
        let Some(generation) = generation.try_get_value() else {
            return;
        };
        let tag = generation.begin();
        let api = auth.api();
        let id = patient_id.get_value();
        spawn_local(async move {
            let Some(result) = generation.settle(tag, api.get_history(&id)).await else {
                return;
            };
            match result {
                Ok(mut loaded) => {
                    if loaded.0.is_empty() {
                        for field in DEFAULT_FIELDS {
                            loaded.set_text(field, "");
                        }
                    }
                    history.try_set(loaded);
                }
                Err(e) => {
                    auth.handle_error(&e);
                    notice.try_set(Some(Notice::error(e.message().to_string())));
                }
            }
            set_loading.try_set(false);
        });
    });

    let on_save = move |_| {
        if saving.get_untracked() {
            return;
        }
        let api = auth.api();
        let id = patient_id.get_value();
        let current = history.get_untracked();
        set_saving.set(true);
        spawn_local(async move {
            match api.update_history(&id, current).await {
                Ok(saved) => {
                    history.try_set(saved);
                    notice.try_set(Some(Notice::success("Historia clínica guardada")));
                }
                Err(e) => {
                    auth.handle_error(&e);
                    notice.try_set(Some(Notice::error(e.message().to_string())));
                }
            }
            set_saving.try_set(false);
        });
    };

    let read_only = move || !auth.can(Permission::EditHistory);

    view! {
        <NoticeToast notice=notice />

        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <div class="flex items-center justify-between">
                    <h3 class="card-title">"Historia clínica"</h3>
                    <Link route=AppRoute::Patients class="btn btn-ghost btn-sm">"Volver"</Link>
                </div>

                <Show
                    when=move || !loading.get()
                    fallback=|| view! { <span class="loading loading-spinner loading-md"></span> }
                >
                    <For
                        each=move || history.with(|h| h.keys())
                        key=|k| k.clone()
                        children=move |key| {
                            let label = key.replace('_', " ");
                            let field = StoredValue::new(key);
                            view! {
                                <label class="form-control">
                                    <span class="label-text capitalize">{label}</span>
                                    <textarea
                                        class="textarea textarea-bordered"
                                        readonly=read_only
                                        prop:value=move || history.with(|h| h.text(&field.get_value()))
                                        on:input=move |ev| {
                                            let value = event_target_value(&ev);
                                            history.update(|h| h.set_text(&field.get_value(), value));
                                        }
                                    ></textarea>
                                </label>
                            }
                        }
                    />

                    <Show when=move || !read_only()>
                        <div class="card-actions justify-end">
                            <button class="btn btn-primary" on:click=on_save disabled=move || saving.get()>
                                "Guardar"
                            </button>
                        </div>
                    </Show>
                </Show>
            </div>
        </div>
    }
}
