//! 预约列表与新建

use crate::auth::use_auth;
use crate::components::guards::Can;
use crate::components::icons::Plus;
use crate::components::notice::{Notice, NoticeToast, use_notice};
use crate::components::submit::SubmitState;
use clinica_shared::booking::{BookingApi, REASONS};
use clinica_shared::date::{Clock, SystemClock, format_date, parse_date};
use clinica_shared::generation::RequestGeneration;
use clinica_shared::{Appointment, ClinicError, ClinicResult, Permission, Slot, validation};
use leptos::prelude::*;
use leptos::task::spawn_local;

#[derive(Clone, Copy)]
struct AppointmentForm {
    email: RwSignal<String>,
    date: RwSignal<String>,
    slot: RwSignal<String>,
    reason: RwSignal<String>,
}

impl AppointmentForm {
    fn new() -> Self {
        Self {
            email: RwSignal::new(String::new()),
            date: RwSignal::new(String::new()),
            slot: RwSignal::new(String::new()),
            reason: RwSignal::new(REASONS[0].to_string()),
        }
    }

    fn reset(&self) {
        self.email.set(String::new());
        self.date.set(String::new());
        self.slot.set(String::new());
        self.reason.set(REASONS[0].to_string());
    }

    /// 过去的日期在本地拒绝，不发起请求
    fn to_appointment(&self) -> ClinicResult<Appointment> {
        let email = self.email.get_untracked().trim().to_lowercase();
        validation::validate_email(&email)?;

        let date = parse_date(&self.date.get_untracked())
            .ok_or_else(|| ClinicError::validation("Seleccione una fecha válida"))?;
        validation::validate_appointment_date(date, SystemClock.today())?;

        let slot = self.slot.get_untracked();
        if slot.is_empty() {
            return Err(ClinicError::validation("Seleccione un horario"));
        }

        Ok(Appointment {
            id: None,
            patient_email: email,
            date,
            slot: Slot::new(slot),
            reason: self.reason.get_untracked(),
            status: None,
        })
    }
}

#[component]
pub fn AppointmentsPage() -> impl IntoView {
    let auth = use_auth();
    let notice = use_notice();
    let form = AppointmentForm::new();

    let appointments = RwSignal::new(Vec::<Appointment>::new());
    let slots = RwSignal::new(Vec::<Slot>::new());
    let (loading, set_loading) = signal(true);
    let submit = SubmitState::new();
    let generation = StoredValue::new(RequestGeneration::new());

    let load_appointments = move || {
        let Some(generation) = generation.try_get_value() else {
            return;
        };
        let tag = generation.begin();
        let api = auth.api();
        set_loading.set(true);
        spawn_local(async move {
            let Some(result) = generation.settle(tag, api.list_appointments()).await else {
                return;
            };
            match result {
                Ok(mut list) => {
                    list.sort_by(|a, b| (a.date, &a.slot).cmp(&(b.date, &b.slot)));
                    appointments.try_set(list);
                }
                Err(e) => {
                    auth.handle_error(&e);
                    notice.try_set(Some(Notice::error(e.message().to_string())));
                }
            }
            set_loading.try_set(false);
        });
    };

    Effect::new(move |_| load_appointments());

    // 选定日期后加载可用时段；过去日期直接提示
    let on_date = move |value: String| {
        form.date.set(value.clone());
        form.slot.set(String::new());
        slots.set(Vec::new());

        let Some(date) = parse_date(&value) else {
            return;
        };
        if let Err(e) = validation::validate_appointment_date(date, SystemClock.today()) {
            notice.set(Some(Notice::error(e.message().to_string())));
            return;
        }

        let api = auth.api();
        spawn_local(async move {
            match api.available_slots(date).await {
                Ok(list) => {
                    // 用户可能已经换了日期
                    if form.date.try_get_untracked().as_deref() == Some(value.as_str()) {
                        slots.try_set(list);
                    }
                }
                Err(e) => {
                    auth.handle_error(&e);
                    notice.try_set(Some(Notice::error(e.message().to_string())));
                }
            }
        });
    };

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let appointment = match form.to_appointment() {
            Ok(a) => a,
            Err(e) => {
                notice.set(Some(Notice::error(e.message().to_string())));
                return;
            }
        };
        if !submit.try_begin() {
            return;
        }

        let api = auth.api();
        spawn_local(async move {
            match api.create_appointment(appointment).await {
                Ok(_) => {
                    notice.try_set(Some(Notice::success("Cita registrada")));
                    form.reset();
                    slots.try_set(Vec::new());
                    load_appointments();
                }
                Err(e) => {
                    auth.handle_error(&e);
                    notice.try_set(Some(Notice::error(e.message().to_string())));
                }
            }
            submit.finish();
        });
    };

    let min_date = format_date(SystemClock.today());

    view! {
        <NoticeToast notice=notice />

        <Can permission=Permission::CreateAppointment>
            <div class="card bg-base-100 shadow-xl">
                <form class="card-body grid md:grid-cols-5 gap-2 items-end" on:submit=on_submit>
                    <input class="input input-bordered" type="email" placeholder="Correo del paciente"
                        on:input=move |ev| form.email.set(event_target_value(&ev)) prop:value=form.email />
                    <input class="input input-bordered" type="date" min=min_date.clone()
                        on:change=move |ev| on_date(event_target_value(&ev)) prop:value=form.date />
                    <select class="select select-bordered"
                        on:change=move |ev| form.slot.set(event_target_value(&ev))
                        prop:value=form.slot
                        disabled=move || slots.with(Vec::is_empty)
                    >
                        <option value="">"Horario"</option>
                        <For
                            each=move || slots.get()
                            key=|s| s.clone()
                            children=|slot| view! { <option value=slot.to_string()>{slot.to_string()}</option> }
                        />
                    </select>
                    <select class="select select-bordered"
                        on:change=move |ev| form.reason.set(event_target_value(&ev))
                        prop:value=form.reason
                    >
                        {REASONS
                            .iter()
                            .map(|r| view! { <option value=*r>{*r}</option> })
                            .collect_view()}
                    </select>
                    <button class="btn btn-primary gap-1" disabled=move || submit.is_busy()>
                        <Plus attr:class="h-4 w-4" /> "Agendar"
                    </button>
                </form>
            </div>
        </Can>

        <div class="card bg-base-100 shadow-xl">
            <div class="overflow-x-auto w-full">
                <table class="table table-zebra w-full">
                    <thead>
                        <tr>
                            <th>"Fecha"</th>
                            <th>"Hora"</th>
                            <th>"Paciente"</th>
                            <th>"Motivo"</th>
                            <th class="hidden md:table-cell">"Estado"</th>
                        </tr>
                    </thead>
                    <tbody>
                        <Show when=move || loading.get()>
                            <tr>
                                <td colspan="5" class="text-center py-8">
                                    <span class="loading loading-spinner loading-md"></span>
                                </td>
                            </tr>
                        </Show>
                        <For
                            each=move || appointments.get()
                            key=|a| (a.id.clone(), a.date, a.slot.clone(), a.patient_email.clone())
                            children=|appt| view! {
                                <tr>
                                    <td>{appt.date.format("%d/%m/%Y").to_string()}</td>
                                    <td class="font-mono">{appt.slot.to_string()}</td>
                                    <td class="font-mono text-sm">{appt.patient_email.clone()}</td>
                                    <td>{appt.reason.clone()}</td>
                                    <td class="hidden md:table-cell">
                                        <span class="badge badge-outline">{appt.status.clone().unwrap_or_else(|| "pendiente".to_string())}</span>
                                    </td>
                                </tr>
                            }
                        />
                    </tbody>
                </table>
            </div>
        </div>
    }
}
