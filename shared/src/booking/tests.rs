use super::*;
use crate::{ClinicError, ErrorKind};
use std::cell::RefCell;

// =========================================================
// Shared Mock Components
// =========================================================

struct ScriptedApi {
    /// Operation log to verify calling order
    log: RefCell<Vec<String>>,
    valid_code: String,
    slots: Vec<Slot>,
    fail_booking: bool,
    fail_send: bool,
}

impl ScriptedApi {
    fn new() -> Self {
        Self {
            log: RefCell::new(Vec::new()),
            valid_code: "123456".to_string(),
            slots: vec![Slot::new("09:00"), Slot::new("10:30")],
            fail_booking: false,
            fail_send: false,
        }
    }

    fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

#[async_trait(?Send)]
impl BookingApi for ScriptedApi {
    async fn send_code(&self, email: &str) -> ClinicResult<()> {
        self.log.borrow_mut().push(format!("send_code:{}", email));
        if self.fail_send {
            return Err(ClinicError::network("servicio no disponible"));
        }
        Ok(())
    }

    async fn verify_code(&self, email: &str, code: &str) -> ClinicResult<VerifiedPatient> {
        self.log.borrow_mut().push(format!("verify_code:{}:{}", email, code));
        if code == self.valid_code {
            Ok(VerifiedPatient {
                id: Some("p1".to_string()),
                name: "Paciente Prueba".to_string(),
                email: email.to_string(),
            })
        } else {
            Err(ClinicError::new(ErrorKind::Validation, "Código incorrecto"))
        }
    }

    async fn available_slots(&self, date: NaiveDate) -> ClinicResult<Vec<Slot>> {
        self.log.borrow_mut().push(format!("slots:{}", date));
        Ok(self.slots.clone())
    }

    async fn book(&self, req: BookFromBotRequest) -> ClinicResult<Appointment> {
        self.log
            .borrow_mut()
            .push(format!("book:{}:{}:{}:{}", req.email, req.date, req.slot, req.reason));
        if self.fail_booking {
            return Err(ClinicError::network("horario ocupado"));
        }
        Ok(Appointment {
            id: Some("c1".to_string()),
            patient_email: req.email,
            date: req.date,
            slot: req.slot,
            reason: req.reason,
            status: None,
        })
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn tomorrow() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn last_bot(conv: &BookingConversation) -> String {
    conv.transcript()
        .iter()
        .rev()
        .find(|m| m.from == Speaker::Bot)
        .map(|m| m.text.clone())
        .unwrap_or_default()
}

/// 驱动对话到选择原因步骤
async fn verified(api: &ScriptedApi) -> BookingConversation {
    let mut conv = BookingConversation::new();
    conv.send(api, BookingInput::Text("patient@example.com".into()), today())
        .await;
    conv.send(api, BookingInput::Text("123456".into()), today())
        .await;
    assert_eq!(conv.state().step(), Step::ChoosingReason);
    conv
}

// =========================================================
// 完整流程
// =========================================================

#[tokio::test]
async fn test_end_to_end_booking() {
    let api = ScriptedApi::new();
    let mut conv = BookingConversation::new();
    assert_eq!(conv.state().step(), Step::AwaitingEmail);

    conv.send(&api, BookingInput::Text("patient@example.com".into()), today())
        .await;
    assert_eq!(conv.state().step(), Step::AwaitingCode);

    conv.send(&api, BookingInput::Text("123456".into()), today())
        .await;
    assert_eq!(conv.state().step(), Step::ChoosingReason);

    conv.send(&api, BookingInput::PickReason("Consulta general".into()), today())
        .await;
    assert_eq!(conv.state().step(), Step::ChoosingDate);

    conv.send(&api, BookingInput::PickDate(today()), today())
        .await;
    assert_eq!(conv.state().step(), Step::ChoosingSlot);
    assert_eq!(conv.state().slots().len(), 2);

    conv.send(&api, BookingInput::PickSlot(Slot::new("10:30")), today())
        .await;
    assert_eq!(conv.state().step(), Step::Confirming);

    conv.send(&api, BookingInput::Confirm, today()).await;
    assert_eq!(conv.state().step(), Step::Done);
    assert!(!conv.is_busy());

    assert_eq!(
        api.calls(),
        vec![
            "send_code:patient@example.com",
            "verify_code:patient@example.com:123456",
            "slots:2026-10-17",
            "book:patient@example.com:2026-10-17:10:30:Consulta general",
        ]
    );
    assert!(last_bot(&conv).contains("17/10/2026"));
}

// =========================================================
// 邮箱与验证码
// =========================================================

#[tokio::test]
async fn test_invalid_email_stays_without_call() {
    let api = ScriptedApi::new();
    let mut conv = BookingConversation::new();
    conv.send(&api, BookingInput::Text("patient-at-example".into()), today())
        .await;
    assert_eq!(conv.state().step(), Step::AwaitingEmail);
    assert!(api.calls().is_empty());
    assert!(last_bot(&conv).contains("no parece válido"));
}

#[tokio::test]
async fn test_send_code_failure_is_a_bot_message() {
    let mut api = ScriptedApi::new();
    api.fail_send = true;
    let mut conv = BookingConversation::new();
    conv.send(&api, BookingInput::Text("patient@example.com".into()), today())
        .await;
    assert_eq!(conv.state().step(), Step::AwaitingEmail);
    assert!(last_bot(&conv).contains("servicio no disponible"));
}

#[tokio::test]
async fn test_wrong_code_allows_retry() {
    let api = ScriptedApi::new();
    let mut conv = BookingConversation::new();
    conv.send(&api, BookingInput::Text("patient@example.com".into()), today())
        .await;
    conv.send(&api, BookingInput::Text("000000".into()), today())
        .await;

    assert_eq!(
        conv.state(),
        &BookingState::AwaitingCode {
            email: "patient@example.com".to_string(),
            attempts: 1
        }
    );
    assert!(last_bot(&conv).contains("Código incorrecto"));

    conv.send(&api, BookingInput::Text("123456".into()), today())
        .await;
    assert_eq!(conv.state().step(), Step::ChoosingReason);
}

#[tokio::test]
async fn test_code_attempts_are_bounded() {
    let api = ScriptedApi::new();
    let mut conv = BookingConversation::new();
    conv.send(&api, BookingInput::Text("patient@example.com".into()), today())
        .await;

    for _ in 0..MAX_CODE_ATTEMPTS {
        conv.send(&api, BookingInput::Text("999999".into()), today())
            .await;
    }
    assert_eq!(conv.state(), &BookingState::AwaitingEmail);
    assert!(last_bot(&conv).contains("correo"));
}

// =========================================================
// 原因、日期与时段
// =========================================================

#[tokio::test]
async fn test_free_text_disabled_while_choosing_date() {
    let api = ScriptedApi::new();
    let mut conv = verified(&api).await;
    conv.send(&api, BookingInput::PickReason("Vacunación".into()), today())
        .await;
    assert!(!conv.accepts_text());

    let calls_before = api.calls().len();
    conv.send(&api, BookingInput::Text("mañana por la tarde".into()), today())
        .await;
    assert_eq!(conv.state().step(), Step::ChoosingDate);
    assert_eq!(api.calls().len(), calls_before);
}

#[tokio::test]
async fn test_past_date_rejected_locally() {
    let api = ScriptedApi::new();
    let mut conv = verified(&api).await;
    conv.send(&api, BookingInput::PickReason("Consulta general".into()), today())
        .await;

    let calls_before = api.calls().len();
    let yesterday = today().pred_opt().unwrap();
    conv.send(&api, BookingInput::PickDate(yesterday), today())
        .await;
    assert_eq!(conv.state().step(), Step::ChoosingDate);
    assert_eq!(api.calls().len(), calls_before);
}

#[tokio::test]
async fn test_no_slots_stays_choosing_date() {
    let mut api = ScriptedApi::new();
    api.slots.clear();
    let mut conv = verified(&api).await;
    conv.send(&api, BookingInput::PickReason("Consulta general".into()), today())
        .await;
    conv.send(&api, BookingInput::PickDate(tomorrow()), today())
        .await;
    assert_eq!(conv.state().step(), Step::ChoosingDate);
    assert!(last_bot(&conv).contains("No hay horarios"));
}

#[tokio::test]
async fn test_unknown_slot_rejected() {
    let api = ScriptedApi::new();
    let mut conv = verified(&api).await;
    conv.send(&api, BookingInput::PickReason("Consulta general".into()), today())
        .await;
    conv.send(&api, BookingInput::PickDate(tomorrow()), today())
        .await;
    conv.send(&api, BookingInput::PickSlot(Slot::new("23:00")), today())
        .await;
    assert_eq!(conv.state().step(), Step::ChoosingSlot);
}

// =========================================================
// 确认
// =========================================================

#[tokio::test]
async fn test_booking_failure_returns_to_slot_choice() {
    let mut api = ScriptedApi::new();
    api.fail_booking = true;
    let mut conv = verified(&api).await;
    conv.send(&api, BookingInput::PickReason("Consulta general".into()), today())
        .await;
    conv.send(&api, BookingInput::PickDate(tomorrow()), today())
        .await;
    conv.send(&api, BookingInput::PickSlot(Slot::new("09:00")), today())
        .await;
    conv.send(&api, BookingInput::Confirm, today()).await;

    assert_eq!(conv.state().step(), Step::ChoosingSlot);
    assert_eq!(conv.state().slots().len(), 2);
    assert!(last_bot(&conv).contains("horario ocupado"));
}

#[tokio::test]
async fn test_text_answers_in_confirmation() {
    let api = ScriptedApi::new();
    let mut conv = verified(&api).await;
    conv.send(&api, BookingInput::PickReason("Consulta general".into()), today())
        .await;
    conv.send(&api, BookingInput::PickDate(tomorrow()), today())
        .await;
    conv.send(&api, BookingInput::PickSlot(Slot::new("09:00")), today())
        .await;

    conv.send(&api, BookingInput::Text("no".into()), today())
        .await;
    assert_eq!(conv.state().step(), Step::ChoosingSlot);

    conv.send(&api, BookingInput::PickSlot(Slot::new("10:30")), today())
        .await;
    conv.send(&api, BookingInput::Text("Sí".into()), today())
        .await;
    assert_eq!(conv.state().step(), Step::Done);
}

// =========================================================
// 在途调用与重启
// =========================================================

#[test]
fn test_input_ignored_while_call_in_flight() {
    let mut conv = BookingConversation::new();
    let call = conv
        .submit(BookingInput::Text("patient@example.com".into()), today())
        .unwrap();
    assert!(conv.is_busy());
    assert!(!conv.accepts_text());

    // 重复提交不会产生第二个调用
    assert!(conv
        .submit(BookingInput::Text("patient@example.com".into()), today())
        .is_none());

    assert!(conv.complete(call.tag, Outcome::CodeSent));
    assert_eq!(conv.state().step(), Step::AwaitingCode);
}

#[test]
fn test_restart_discards_stale_response() {
    let mut conv = BookingConversation::new();
    let call = conv
        .submit(BookingInput::Text("patient@example.com".into()), today())
        .unwrap();

    conv.submit(BookingInput::Restart, today());
    assert!(!conv.is_busy());
    assert_eq!(conv.transcript().len(), 1);

    assert!(!conv.complete(call.tag, Outcome::CodeSent));
    assert_eq!(conv.state(), &BookingState::AwaitingEmail);
}

#[test]
fn test_transition_is_pure_and_returns_effect() {
    let t = transition(
        &BookingState::AwaitingEmail,
        BookingInput::Text("  Patient@Example.com ".into()),
        today(),
    );
    assert_eq!(t.next, BookingState::AwaitingEmail);
    assert_eq!(
        t.effect,
        Effect::SendCode {
            email: "patient@example.com".to_string()
        }
    );
}

#[test]
fn test_confirm_builds_booking_request() {
    let confirming = BookingState::Confirming {
        identity: Identity {
            email: "p@x.com".to_string(),
            patient: VerifiedPatient {
                id: Some("p1".to_string()),
                name: "Ana".to_string(),
                email: "p@x.com".to_string(),
            },
        },
        reason: "Control".to_string(),
        date: tomorrow(),
        slots: vec![Slot::new("09:00"), Slot::new("10:00")],
        slot: Slot::new("10:00"),
    };

    let t = transition(&confirming, BookingInput::Text("sí".into()), today());
    assert_eq!(t.next, confirming);
    assert_eq!(
        t.effect,
        Effect::Book(BookFromBotRequest {
            email: "p@x.com".to_string(),
            date: tomorrow(),
            slot: Slot::new("10:00"),
            reason: "Control".to_string(),
        })
    );
}

#[test]
fn test_done_is_terminal_until_restart() {
    let appointment = Appointment {
        id: None,
        patient_email: "p@x.com".to_string(),
        date: tomorrow(),
        slot: Slot::new("09:00"),
        reason: "Control".to_string(),
        status: None,
    };
    let done = BookingState::Done { appointment };
    let t = transition(&done, BookingInput::Confirm, today());
    assert_eq!(t.next, done);
    assert_eq!(t.effect, Effect::None);

    let t = transition(&done, BookingInput::Restart, today());
    assert_eq!(t.next, BookingState::AwaitingEmail);
}
