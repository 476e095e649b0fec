//! 聊天机器人预约对话状态机
//!
//! 流程：邮箱 -> 验证码 -> 就诊原因 -> 日期 -> 时段 -> 确认 -> 完成。
//! `transition` 处理用户输入，`resolve` 处理外部调用的结果，二者都是纯函数；
//! 每个状态只携带到该步为止收集到的数据，非法组合无法构造。

use crate::protocol::BookFromBotRequest;
use crate::validation::{is_valid_email, validate_appointment_date};
use crate::{Appointment, ClinicResult, Slot, VerifiedPatient};
use async_trait::async_trait;
use chrono::NaiveDate;

mod conversation;
#[cfg(test)]
mod tests;

pub use conversation::{BookingConversation, ChatMessage, PendingCall, Speaker, perform};

/// 验证码最多尝试次数，用尽后对话回到邮箱步骤
pub const MAX_CODE_ATTEMPTS: u32 = 5;

/// 可选的就诊原因
pub const REASONS: &[&str] = &[
    "Consulta general",
    "Control de seguimiento",
    "Resultados de laboratorio",
    "Vacunación",
];

// =========================================================
// 外部调用接口
// =========================================================

/// 对话在各步骤需要调用的远端操作
#[async_trait(?Send)]
pub trait BookingApi {
    async fn send_code(&self, email: &str) -> ClinicResult<()>;
    async fn verify_code(&self, email: &str, code: &str) -> ClinicResult<VerifiedPatient>;
    async fn available_slots(&self, date: NaiveDate) -> ClinicResult<Vec<Slot>>;
    async fn book(&self, req: BookFromBotRequest) -> ClinicResult<Appointment>;
}

// =========================================================
// 状态
// =========================================================

/// 邮箱验证通过后的患者身份
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub email: String,
    pub patient: VerifiedPatient,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum BookingState {
    #[default]
    AwaitingEmail,
    AwaitingCode {
        email: String,
        attempts: u32,
    },
    ChoosingReason {
        identity: Identity,
    },
    ChoosingDate {
        identity: Identity,
        reason: String,
    },
    ChoosingSlot {
        identity: Identity,
        reason: String,
        date: NaiveDate,
        slots: Vec<Slot>,
    },
    Confirming {
        identity: Identity,
        reason: String,
        date: NaiveDate,
        slots: Vec<Slot>,
        slot: Slot,
    },
    Done {
        appointment: Appointment,
    },
}

/// 步骤名称（不含数据），供界面切换输入控件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    AwaitingEmail,
    AwaitingCode,
    ChoosingReason,
    ChoosingDate,
    ChoosingSlot,
    Confirming,
    Done,
}

impl BookingState {
    pub fn step(&self) -> Step {
        match self {
            BookingState::AwaitingEmail => Step::AwaitingEmail,
            BookingState::AwaitingCode { .. } => Step::AwaitingCode,
            BookingState::ChoosingReason { .. } => Step::ChoosingReason,
            BookingState::ChoosingDate { .. } => Step::ChoosingDate,
            BookingState::ChoosingSlot { .. } => Step::ChoosingSlot,
            BookingState::Confirming { .. } => Step::Confirming,
            BookingState::Done { .. } => Step::Done,
        }
    }

    /// 日期与时段步骤只接受结构化选择，自由文本输入被禁用
    pub fn accepts_text(&self) -> bool {
        !matches!(
            self.step(),
            Step::ChoosingDate | Step::ChoosingSlot | Step::Done
        )
    }

    /// 当前可选时段（仅在选择时段与确认步骤中非空）
    pub fn slots(&self) -> &[Slot] {
        match self {
            BookingState::ChoosingSlot { slots, .. } | BookingState::Confirming { slots, .. } => {
                slots
            }
            _ => &[],
        }
    }

    /// 初始欢迎语
    pub fn greeting() -> &'static str {
        "¡Hola! Para agendar una cita, escriba su correo electrónico."
    }
}

// =========================================================
// 输入、副作用与结果
// =========================================================

#[derive(Debug, Clone, PartialEq)]
pub enum BookingInput {
    Text(String),
    PickReason(String),
    PickDate(NaiveDate),
    PickSlot(Slot),
    Confirm,
    Restart,
}

impl BookingInput {
    /// 在对话记录中显示的用户消息
    pub fn echo(&self) -> Option<String> {
        match self {
            BookingInput::Text(text) => Some(text.trim().to_string()),
            BookingInput::PickReason(reason) => Some(reason.clone()),
            BookingInput::PickDate(date) => Some(date.format("%d/%m/%Y").to_string()),
            BookingInput::PickSlot(slot) => Some(slot.to_string()),
            BookingInput::Confirm => Some("Confirmar".to_string()),
            BookingInput::Restart => None,
        }
    }
}

/// 状态转移要求执行的外部调用
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    SendCode { email: String },
    VerifyCode { email: String, code: String },
    FetchSlots { date: NaiveDate },
    Book(BookFromBotRequest),
}

/// 外部调用的结果；失败只携带面向用户的消息
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    CodeSent,
    CodeVerified(VerifiedPatient),
    SlotsFetched(Vec<Slot>),
    Booked(Appointment),
    Failed(String),
}

/// 一次状态转移：下一个状态、需要执行的调用、机器人的回复
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: BookingState,
    pub effect: Effect,
    pub replies: Vec<String>,
}

impl Transition {
    fn to(next: BookingState, reply: impl Into<String>) -> Self {
        Self {
            next,
            effect: Effect::None,
            replies: vec![reply.into()],
        }
    }

    fn call(next: BookingState, effect: Effect) -> Self {
        Self {
            next,
            effect,
            replies: Vec::new(),
        }
    }

    fn stay(state: &BookingState, reply: impl Into<String>) -> Self {
        Self::to(state.clone(), reply)
    }
}

fn is_affirmative(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "si" | "sí" | "confirmar" | "ok" | "s"
    )
}

fn is_negative(text: &str) -> bool {
    matches!(text.trim().to_lowercase().as_str(), "no" | "n" | "cambiar")
}

// =========================================================
// 纯状态转移
// =========================================================

/// 处理一条用户输入
pub fn transition(state: &BookingState, input: BookingInput, today: NaiveDate) -> Transition {
    use BookingInput as In;
    use BookingState as S;

    if input == In::Restart {
        return Transition::to(S::AwaitingEmail, BookingState::greeting());
    }

    match (state, input) {
        (S::AwaitingEmail, In::Text(text)) => {
            let email = text.trim().to_lowercase();
            if is_valid_email(&email) {
                Transition::call(S::AwaitingEmail, Effect::SendCode { email })
            } else {
                Transition::stay(
                    state,
                    "Ese correo no parece válido. Por favor, escríbalo de nuevo.",
                )
            }
        }

        (S::AwaitingCode { email, .. }, In::Text(text)) => {
            let code = text.trim().to_string();
            if code.is_empty() {
                Transition::stay(state, "Escriba el código que le enviamos por correo.")
            } else {
                Transition::call(
                    state.clone(),
                    Effect::VerifyCode {
                        email: email.clone(),
                        code,
                    },
                )
            }
        }

        (S::ChoosingReason { identity }, In::PickReason(reason) | In::Text(reason)) => {
            let reason = reason.trim().to_string();
            if reason.is_empty() {
                return Transition::stay(state, "Seleccione el motivo de su consulta.");
            }
            Transition::to(
                S::ChoosingDate {
                    identity: identity.clone(),
                    reason,
                },
                "Elija la fecha de su cita en el calendario.",
            )
        }

        // 在选择时段时也允许改选日期
        (
            S::ChoosingDate { identity, reason } | S::ChoosingSlot { identity, reason, .. },
            In::PickDate(date),
        ) => match validate_appointment_date(date, today) {
            Ok(()) => Transition::call(
                S::ChoosingDate {
                    identity: identity.clone(),
                    reason: reason.clone(),
                },
                Effect::FetchSlots { date },
            ),
            Err(e) => Transition::stay(state, e.message().to_string()),
        },

        (
            S::ChoosingSlot {
                identity,
                reason,
                date,
                slots,
            }
            | S::Confirming {
                identity,
                reason,
                date,
                slots,
                ..
            },
            In::PickSlot(slot),
        ) => {
            if !slots.contains(&slot) {
                return Transition::stay(state, "Ese horario no está disponible.");
            }
            let prompt = format!(
                "¿Confirma su cita de {} el {} a las {}?",
                reason,
                date.format("%d/%m/%Y"),
                slot
            );
            Transition::to(
                S::Confirming {
                    identity: identity.clone(),
                    reason: reason.clone(),
                    date: *date,
                    slots: slots.clone(),
                    slot,
                },
                prompt,
            )
        }

        (
            S::Confirming {
                identity,
                reason,
                date,
                slot,
                ..
            },
            In::Confirm,
        ) => Transition::call(
            state.clone(),
            Effect::Book(BookFromBotRequest {
                email: identity.email.clone(),
                date: *date,
                slot: slot.clone(),
                reason: reason.clone(),
            }),
        ),

        (S::Confirming { .. }, In::Text(text)) if is_affirmative(&text) => {
            transition(state, In::Confirm, today)
        }

        (
            S::Confirming {
                identity,
                reason,
                date,
                slots,
                ..
            },
            In::Text(text),
        ) if is_negative(&text) => Transition::to(
            S::ChoosingSlot {
                identity: identity.clone(),
                reason: reason.clone(),
                date: *date,
                slots: slots.clone(),
            },
            "De acuerdo, elija otro horario.",
        ),

        (S::Confirming { .. }, _) => Transition::stay(
            state,
            "Responda \"sí\" para confirmar o \"no\" para elegir otro horario.",
        ),

        (S::ChoosingDate { .. } | S::ChoosingSlot { .. }, In::Text(_)) => Transition::stay(
            state,
            "Por favor use el calendario y los botones para continuar.",
        ),

        (S::Done { .. }, _) => Transition::stay(
            state,
            "Su cita ya fue registrada. Pulse \"Reiniciar\" para agendar otra.",
        ),

        _ => Transition::stay(state, "No entendí su respuesta. Intente de nuevo."),
    }
}

/// 应用外部调用的结果
///
/// `state` 是发起调用时 `transition` 返回的状态，`effect` 是被执行的调用。
pub fn resolve(state: &BookingState, effect: &Effect, outcome: Outcome) -> Transition {
    use BookingState as S;

    match (state, effect, outcome) {
        (_, Effect::SendCode { email }, Outcome::CodeSent) => Transition::to(
            S::AwaitingCode {
                email: email.clone(),
                attempts: 0,
            },
            format!(
                "Le enviamos un código de verificación a {}. Escríbalo aquí.",
                email
            ),
        ),

        (_, Effect::SendCode { .. }, Outcome::Failed(msg)) => Transition::to(
            S::AwaitingEmail,
            format!("No pudimos enviar el código: {}. Intente de nuevo.", msg),
        ),

        (_, Effect::VerifyCode { email, .. }, Outcome::CodeVerified(patient)) => {
            let greeting = if patient.name.is_empty() {
                "Código verificado.".to_string()
            } else {
                format!("Código verificado. Hola, {}.", patient.name)
            };
            Transition {
                next: S::ChoosingReason {
                    identity: Identity {
                        email: email.clone(),
                        patient,
                    },
                },
                effect: Effect::None,
                replies: vec![greeting, "¿Cuál es el motivo de su consulta?".to_string()],
            }
        }

        (S::AwaitingCode { attempts, .. }, Effect::VerifyCode { email, .. }, Outcome::Failed(msg)) => {
            let attempts = attempts + 1;
            if attempts >= MAX_CODE_ATTEMPTS {
                Transition {
                    next: S::AwaitingEmail,
                    effect: Effect::None,
                    replies: vec![
                        "Demasiados intentos fallidos.".to_string(),
                        BookingState::greeting().to_string(),
                    ],
                }
            } else {
                Transition::to(
                    S::AwaitingCode {
                        email: email.clone(),
                        attempts,
                    },
                    format!(
                        "{}. Le quedan {} intentos.",
                        msg,
                        MAX_CODE_ATTEMPTS - attempts
                    ),
                )
            }
        }

        (S::ChoosingDate { identity, reason }, Effect::FetchSlots { date }, Outcome::SlotsFetched(slots)) => {
            if slots.is_empty() {
                Transition::stay(state, "No hay horarios disponibles ese día. Elija otra fecha.")
            } else {
                Transition::to(
                    S::ChoosingSlot {
                        identity: identity.clone(),
                        reason: reason.clone(),
                        date: *date,
                        slots,
                    },
                    "Estos son los horarios disponibles:",
                )
            }
        }

        (S::ChoosingDate { .. }, Effect::FetchSlots { .. }, Outcome::Failed(msg)) => Transition::stay(
            state,
            format!("No pudimos consultar los horarios: {}", msg),
        ),

        (S::Confirming { .. }, Effect::Book(_), Outcome::Booked(appointment)) => {
            let reply = format!(
                "¡Listo! Su cita quedó agendada para el {} a las {}.",
                appointment.date.format("%d/%m/%Y"),
                appointment.slot
            );
            Transition::to(S::Done { appointment }, reply)
        }

        (
            S::Confirming {
                identity,
                reason,
                date,
                slots,
                ..
            },
            Effect::Book(_),
            Outcome::Failed(msg),
        ) => Transition::to(
            S::ChoosingSlot {
                identity: identity.clone(),
                reason: reason.clone(),
                date: *date,
                slots: slots.clone(),
            },
            format!("No pudimos agendar la cita: {}. Elija otro horario.", msg),
        ),

        _ => Transition::stay(state, "Ocurrió un error inesperado. Intente de nuevo."),
    }
}
