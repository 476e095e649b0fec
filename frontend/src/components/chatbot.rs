//! 患者自助预约对话
//!
//! 对话状态机位于 `clinica_shared::booking`；这里只负责把输入交给
//! `BookingConversation`，在后台执行返回的调用，再把结果带着代际标记送回。

use crate::api::build_api;
use crate::components::icons::{RefreshCw, SendHorizontal};
use crate::components::layout::ThemeToggle;
use clinica_shared::booking::{
    BookingConversation, BookingInput, REASONS, Speaker, Step, perform,
};
use clinica_shared::date::{Clock, SystemClock, format_date, parse_date};
use leptos::prelude::*;
use leptos::task::spawn_local;

/// 把输入交给对话，并在后台完成产生的外部调用
fn dispatch(conversation: RwSignal<BookingConversation>, input: BookingInput) {
    let today = SystemClock.today();
    let Some(call) = conversation
        .try_update(|c| c.submit(input, today))
        .flatten()
    else {
        return;
    };

    // 预约对话面向未登录的患者，不携带令牌
    let api = build_api(None);
    spawn_local(async move {
        let outcome = perform(&api, &call.effect).await;
        let applied = conversation.try_update(|c| c.complete(call.tag, outcome));
        if applied == Some(false) {
            log_info!("[Booking] Discarded stale response");
        }
    });
}

#[component]
pub fn ChatbotPage() -> impl IntoView {
    view! {
        <div class="min-h-screen bg-base-200 p-4 md:p-8 font-sans">
            <div class="max-w-xl mx-auto space-y-4">
                <div class="flex items-center justify-between">
                    <h1 class="text-2xl font-bold">"Agende su cita"</h1>
                    <ThemeToggle />
                </div>
                <ChatbotWidget />
            </div>
        </div>
    }
}

#[component]
pub fn ChatbotWidget() -> impl IntoView {
    let conversation = RwSignal::new(BookingConversation::new());
    let (draft, set_draft) = signal(String::new());

    let step = Memo::new(move |_| conversation.with(|c| c.state().step()));
    let busy = Memo::new(move |_| conversation.with(|c| c.is_busy()));
    let accepts_text = Memo::new(move |_| conversation.with(|c| c.accepts_text()));

    let on_send = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let text = draft.get_untracked();
        if text.trim().is_empty() || !accepts_text.get_untracked() {
            return;
        }
        set_draft.set(String::new());
        dispatch(conversation, BookingInput::Text(text));
    };

    let min_date = format_date(SystemClock.today());

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body gap-4">
                <div class="flex items-center justify-between">
                    <h3 class="card-title">"Asistente de citas"</h3>
                    <button
                        class="btn btn-ghost btn-sm gap-1"
                        on:click=move |_| dispatch(conversation, BookingInput::Restart)
                    >
                        <RefreshCw attr:class="h-4 w-4" /> "Reiniciar"
                    </button>
                </div>

                <div class="h-80 overflow-y-auto space-y-2">
                    {move || {
                        conversation.with(|c| {
                            c.transcript()
                                .iter()
                                .map(|msg| {
                                    let side = match msg.from {
                                        Speaker::Bot => "chat chat-start",
                                        Speaker::User => "chat chat-end",
                                    };
                                    let bubble = match msg.from {
                                        Speaker::Bot => "chat-bubble",
                                        Speaker::User => "chat-bubble chat-bubble-primary",
                                    };
                                    let text = msg.text.clone();
                                    view! {
                                        <div class=side>
                                            <div class=bubble>{text}</div>
                                        </div>
                                    }
                                })
                                .collect_view()
                        })
                    }}
                    <Show when=move || busy.get()>
                        <div class="chat chat-start">
                            <div class="chat-bubble">
                                <span class="loading loading-dots loading-sm"></span>
                            </div>
                        </div>
                    </Show>
                </div>

                // 结构化选择
                {move || match step.get() {
                    Step::ChoosingReason => view! {
                        <div class="flex flex-wrap gap-2">
                            {REASONS
                                .iter()
                                .map(|reason| {
                                    let reason = reason.to_string();
                                    view! {
                                        <button
                                            class="btn btn-outline btn-sm"
                                            disabled=move || busy.get()
                                            on:click={
                                                let reason = reason.clone();
                                                move |_| dispatch(conversation, BookingInput::PickReason(reason.clone()))
                                            }
                                        >
                                            {reason.clone()}
                                        </button>
                                    }
                                })
                                .collect_view()}
                        </div>
                    }
                    .into_any(),
                    Step::ChoosingDate | Step::ChoosingSlot => view! {
                        <div class="space-y-2">
                            <input
                                type="date"
                                class="input input-bordered w-full"
                                min=min_date.clone()
                                disabled=move || busy.get()
                                on:change=move |ev| {
                                    if let Some(date) = parse_date(&event_target_value(&ev)) {
                                        dispatch(conversation, BookingInput::PickDate(date));
                                    }
                                }
                            />
                            <div class="flex flex-wrap gap-2">
                                {move || {
                                    conversation.with(|c| {
                                        c.state()
                                            .slots()
                                            .iter()
                                            .cloned()
                                            .map(|slot| {
                                                let label = slot.to_string();
                                                view! {
                                                    <button
                                                        class="btn btn-outline btn-sm font-mono"
                                                        disabled=move || busy.get()
                                                        on:click=move |_| dispatch(conversation, BookingInput::PickSlot(slot.clone()))
                                                    >
                                                        {label}
                                                    </button>
                                                }
                                            })
                                            .collect_view()
                                    })
                                }}
                            </div>
                        </div>
                    }
                    .into_any(),
                    Step::Confirming => view! {
                        <div class="flex gap-2">
                            <button
                                class="btn btn-primary btn-sm"
                                disabled=move || busy.get()
                                on:click=move |_| dispatch(conversation, BookingInput::Confirm)
                            >
                                "Confirmar"
                            </button>
                        </div>
                    }
                    .into_any(),
                    Step::AwaitingEmail | Step::AwaitingCode | Step::Done => ().into_any(),
                }}

                <form class="join w-full" on:submit=on_send>
                    <input
                        class="input input-bordered join-item w-full"
                        placeholder=move || match step.get() {
                            Step::AwaitingEmail => "correo@ejemplo.com",
                            Step::AwaitingCode => "Código de verificación",
                            Step::Confirming => "Escriba sí o no",
                            _ => "",
                        }
                        disabled=move || !accepts_text.get()
                        on:input=move |ev| set_draft.set(event_target_value(&ev))
                        prop:value=draft
                    />
                    <button class="btn btn-primary join-item" disabled=move || !accepts_text.get()>
                        <SendHorizontal attr:class="h-4 w-4" />
                    </button>
                </form>
            </div>
        </div>
    }
}
