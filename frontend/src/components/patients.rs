//! 患者管理

use crate::auth::use_auth;
use crate::components::guards::Can;
use crate::components::icons::{Plus, Trash2};
use crate::components::notice::{Notice, NoticeToast, use_notice};
use crate::components::submit::SubmitState;
use crate::web::route::AppRoute;
use crate::web::router::Link;
use clinica_shared::date::{format_date, parse_date};
use clinica_shared::generation::RequestGeneration;
use clinica_shared::{ClinicResult, Patient, Permission, validation};
use leptos::prelude::*;
use leptos::task::spawn_local;

/// 患者表单状态
#[derive(Clone, Copy)]
struct PatientForm {
    editing: RwSignal<Option<String>>,
    name: RwSignal<String>,
    email: RwSignal<String>,
    phone: RwSignal<String>,
    birth_date: RwSignal<String>,
}

impl PatientForm {
    fn new() -> Self {
        Self {
            editing: RwSignal::new(None),
            name: RwSignal::new(String::new()),
            email: RwSignal::new(String::new()),
            phone: RwSignal::new(String::new()),
            birth_date: RwSignal::new(String::new()),
        }
    }

    fn reset(&self) {
        self.editing.set(None);
        self.name.set(String::new());
        self.email.set(String::new());
        self.phone.set(String::new());
        self.birth_date.set(String::new());
    }

    fn load(&self, patient: &Patient) {
        self.editing.set(patient.id.clone());
        self.name.set(patient.name.clone());
        self.email.set(patient.email.clone());
        self.phone.set(patient.phone.clone().unwrap_or_default());
        self.birth_date
            .set(patient.birth_date.map(format_date).unwrap_or_default());
    }

    /// 校验并转换为领域对象；空的可选字段不发送
    fn to_patient(&self) -> ClinicResult<Patient> {
        let name = self.name.get_untracked().trim().to_string();
        let email = self.email.get_untracked().trim().to_string();
        validation::validate_patient(&name, &email)?;

        let phone = self.phone.get_untracked().trim().to_string();
        Ok(Patient {
            id: None,
            name,
            email,
            phone: (!phone.is_empty()).then_some(phone),
            birth_date: parse_date(&self.birth_date.get_untracked()),
        })
    }
}

#[component]
pub fn PatientsPage() -> impl IntoView {
    let auth = use_auth();
    let notice = use_notice();
    let form = PatientForm::new();

    let patients = RwSignal::new(Vec::<Patient>::new());
    let (loading, set_loading) = signal(true);
    let (filter, set_filter) = signal(String::new());
    let submit = SubmitState::new();
    let generation = StoredValue::new(RequestGeneration::new());

    let load_patients = move || {
        let Some(generation) = generation.try_get_value() else {
            return;
        };
        let tag = generation.begin();
        let api = auth.api();
        set_loading.set(true);
        spawn_local(async move {
            let Some(result) = generation.settle(tag, api.list_patients()).await else {
                return;
            };
            match result {
                Ok(list) => {
                    patients.try_set(list);
                }
                Err(e) => {
                    auth.handle_error(&e);
                    notice.try_set(Some(Notice::error(e.message().to_string())));
                }
            }
            set_loading.try_set(false);
        });
    };

    Effect::new(move |_| load_patients());

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let patient = match form.to_patient() {
            Ok(p) => p,
            Err(e) => {
                notice.set(Some(Notice::error(e.message().to_string())));
                return;
            }
        };
        if !submit.try_begin() {
            return;
        }

        let api = auth.api();
        let editing = form.editing.get_untracked();
        spawn_local(async move {
            let result = match editing {
                Some(id) => api
                    .update_patient(&id, patient)
                    .await
                    .map(|_| "Paciente actualizado"),
                None => api.create_patient(patient).await.map(|_| "Paciente creado"),
            };
            match result {
                Ok(msg) => {
                    notice.try_set(Some(Notice::success(msg)));
                    form.reset();
                    load_patients();
                }
                Err(e) => {
                    auth.handle_error(&e);
                    notice.try_set(Some(Notice::error(e.message().to_string())));
                }
            }
            submit.finish();
        });
    };

    let handle_delete = move |id: String| {
        let api = auth.api();
        spawn_local(async move {
            match api.delete_patient(&id).await {
                Ok(()) => {
                    notice.try_set(Some(Notice::success("Paciente eliminado")));
                    patients
                        .try_update(|list| list.retain(|p| p.id.as_deref() != Some(id.as_str())));
                }
                Err(e) => {
                    auth.handle_error(&e);
                    notice.try_set(Some(Notice::error(e.message().to_string())));
                }
            }
        });
    };

    let visible = move || {
        let needle = filter.get().to_lowercase();
        patients.with(|list| {
            list.iter()
                .filter(|p| {
                    needle.is_empty()
                        || p.name.to_lowercase().contains(&needle)
                        || p.email.to_lowercase().contains(&needle)
                })
                .cloned()
                .collect::<Vec<_>>()
        })
    };

    let show_form = move || {
        if form.editing.get().is_some() {
            auth.can(Permission::EditPatient)
        } else {
            auth.can(Permission::CreatePatient)
        }
    };

    view! {
        <NoticeToast notice=notice />

        <Show when=show_form>
            <div class="card bg-base-100 shadow-xl">
                <form class="card-body grid md:grid-cols-5 gap-2 items-end" on:submit=on_submit>
                    <input class="input input-bordered" placeholder="Nombre"
                        on:input=move |ev| form.name.set(event_target_value(&ev)) prop:value=form.name />
                    <input class="input input-bordered" type="email" placeholder="Correo"
                        on:input=move |ev| form.email.set(event_target_value(&ev)) prop:value=form.email />
                    <input class="input input-bordered" placeholder="Teléfono"
                        on:input=move |ev| form.phone.set(event_target_value(&ev)) prop:value=form.phone />
                    <input class="input input-bordered" type="date"
                        on:input=move |ev| form.birth_date.set(event_target_value(&ev)) prop:value=form.birth_date />
                    <div class="flex gap-2">
                        <button class="btn btn-primary gap-1" disabled=move || submit.is_busy()>
                            <Plus attr:class="h-4 w-4" />
                            {move || if form.editing.get().is_some() { "Guardar" } else { "Registrar" }}
                        </button>
                        <Show when=move || form.editing.get().is_some()>
                            <button type="button" class="btn btn-ghost" on:click=move |_| form.reset()>"Cancelar"</button>
                        </Show>
                    </div>
                </form>
            </div>
        </Show>

        <div class="card bg-base-100 shadow-xl">
            <div class="card-body p-0">
                <div class="p-6 pb-2">
                    <input class="input input-bordered w-full md:w-80" placeholder="Buscar paciente"
                        on:input=move |ev| set_filter.set(event_target_value(&ev)) prop:value=filter />
                </div>
                <div class="overflow-x-auto w-full">
                    <table class="table table-zebra w-full">
                        <thead>
                            <tr>
                                <th>"Nombre"</th>
                                <th>"Correo"</th>
                                <th class="hidden md:table-cell">"Teléfono"</th>
                                <th></th>
                            </tr>
                        </thead>
                        <tbody>
                            <Show when=move || loading.get()>
                                <tr>
                                    <td colspan="4" class="text-center py-8">
                                        <span class="loading loading-spinner loading-md"></span>
                                    </td>
                                </tr>
                            </Show>
                            <Show when=move || !loading.get() && patients.with(Vec::is_empty)>
                                <tr>
                                    <td colspan="4" class="text-center py-8 text-base-content/50">
                                        "No hay pacientes registrados."
                                    </td>
                                </tr>
                            </Show>
                            <For
                                each=visible
                                key=|p| (p.id.clone(), p.name.clone(), p.email.clone(), p.phone.clone())
                                children=move |patient| {
                                    let id = patient.id.clone().unwrap_or_default();
                                    let history_route = AppRoute::PatientHistory(id.clone());
                                    let editable = patient.clone();
                                    view! {
                                        <tr>
                                            <td>{patient.name.clone()}</td>
                                            <td class="font-mono text-sm">{patient.email.clone()}</td>
                                            <td class="hidden md:table-cell">{patient.phone.clone().unwrap_or_default()}</td>
                                            <td class="flex gap-1 justify-end">
                                                <Can permission=Permission::ViewHistory>
                                                    <Link route=history_route.clone() class="btn btn-ghost btn-sm">
                                                        "Historia"
                                                    </Link>
                                                </Can>
                                                <Can permission=Permission::EditPatient>
                                                    <button class="btn btn-ghost btn-sm" on:click={
                                                        let editable = editable.clone();
                                                        move |_| form.load(&editable)
                                                    }>"Editar"</button>
                                                </Can>
                                                <Can permission=Permission::DeletePatient>
                                                    <button class="btn btn-ghost btn-sm text-error" on:click={
                                                        let id = id.clone();
                                                        move |_| handle_delete(id.clone())
                                                    }>
                                                        <Trash2 attr:class="h-4 w-4" />
                                                    </button>
                                                </Can>
                                            </td>
                                        </tr>
                                    }
                                }
                            />
                        </tbody>
                    </table>
                </div>
            </div>
        </div>
    }
}
