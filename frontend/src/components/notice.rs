//! 页面通知（toast），3 秒后自动消失

use gloo_timers::callback::Timeout;
use leptos::prelude::*;

const DISMISS_AFTER_MS: u32 = 3_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub is_error: bool,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

/// 创建通知信号，设置后自动定时清除
pub fn use_notice() -> RwSignal<Option<Notice>> {
    let notice = RwSignal::new(None::<Notice>);

    Effect::new(move |_| {
        if notice.with(Option::is_some) {
            Timeout::new(DISMISS_AFTER_MS, move || notice.set(None)).forget();
        }
    });

    notice
}

#[component]
pub fn NoticeToast(notice: RwSignal<Option<Notice>>) -> impl IntoView {
    view! {
        <Show when=move || notice.with(Option::is_some)>
            <div class="toast toast-top toast-end z-50">
                <div class=move || {
                    if notice.with(|n| n.as_ref().is_some_and(|n| n.is_error)) {
                        "alert alert-error shadow-lg"
                    } else {
                        "alert alert-success shadow-lg"
                    }
                }>
                    <span>{move || notice.with(|n| n.as_ref().map(|n| n.message.clone()).unwrap_or_default())}</span>
                </div>
            </div>
        </Show>
    }
}
