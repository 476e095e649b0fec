use super::{BookingApi, BookingInput, BookingState, Effect, Outcome, Transition, resolve, transition};
use crate::generation::{GenerationTag, RequestGeneration};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Bot,
    User,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub from: Speaker,
    pub text: String,
}

impl ChatMessage {
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            from: Speaker::Bot,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            from: Speaker::User,
            text: text.into(),
        }
    }
}

/// 一次等待执行的外部调用，带发出时的代际标记
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCall {
    pub tag: GenerationTag,
    pub effect: Effect,
}

/// 预约对话驱动器
///
/// 持有当前状态与对话记录。调用分三步：
/// `submit` 应用输入并返回待执行调用 -> `perform` 执行调用 -> `complete` 应用结果。
/// 调用在途时拒绝新的输入；重启会推进代际，使在途调用的结果被丢弃。
#[derive(Debug, Clone)]
pub struct BookingConversation {
    state: BookingState,
    transcript: Vec<ChatMessage>,
    generation: RequestGeneration,
    pending: Option<PendingCall>,
}

impl Default for BookingConversation {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingConversation {
    pub fn new() -> Self {
        Self {
            state: BookingState::AwaitingEmail,
            transcript: vec![ChatMessage::bot(BookingState::greeting())],
            generation: RequestGeneration::new(),
            pending: None,
        }
    }

    pub fn state(&self) -> &BookingState {
        &self.state
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// 文本输入框是否可用
    pub fn accepts_text(&self) -> bool {
        !self.is_busy() && self.state.accepts_text()
    }

    fn apply(&mut self, t: Transition) {
        self.state = t.next;
        self.transcript
            .extend(t.replies.into_iter().map(ChatMessage::bot));
    }

    /// 应用一条用户输入
    ///
    /// 返回需要执行的外部调用；调用在途时（除重启外）输入被忽略并返回 None。
    pub fn submit(&mut self, input: BookingInput, today: NaiveDate) -> Option<PendingCall> {
        if input == BookingInput::Restart {
            self.generation.invalidate();
            self.pending = None;
            self.transcript.clear();
            self.apply(transition(&self.state, input, today));
            return None;
        }

        if self.is_busy() {
            return None;
        }

        if let Some(echo) = input.echo().filter(|e| !e.is_empty()) {
            self.transcript.push(ChatMessage::user(echo));
        }

        let t = transition(&self.state, input, today);
        let effect = t.effect.clone();
        self.apply(t);

        if effect == Effect::None {
            return None;
        }

        let call = PendingCall {
            tag: self.generation.begin(),
            effect,
        };
        self.pending = Some(call.clone());
        Some(call)
    }

    /// 应用调用结果；代际已过期（对话被重启）时丢弃并返回 false
    pub fn complete(&mut self, tag: GenerationTag, outcome: Outcome) -> bool {
        if !self.generation.is_current(tag) {
            return false;
        }
        let Some(call) = self.pending.take() else {
            return false;
        };
        if call.tag != tag {
            self.pending = Some(call);
            return false;
        }

        let t = resolve(&self.state, &call.effect, outcome);
        self.apply(t);
        true
    }

    /// 提交输入并在同一任务中完成调用
    pub async fn send<A: BookingApi>(&mut self, api: &A, input: BookingInput, today: NaiveDate) {
        if let Some(call) = self.submit(input, today) {
            let outcome = perform(api, &call.effect).await;
            self.complete(call.tag, outcome);
        }
    }
}

/// 执行外部调用，所有错误都转换为 `Outcome::Failed`，不会向外传播
pub async fn perform<A: BookingApi + ?Sized>(api: &A, effect: &Effect) -> Outcome {
    let result = match effect {
        Effect::None => return Outcome::Failed("nada que hacer".to_string()),
        Effect::SendCode { email } => api.send_code(email).await.map(|_| Outcome::CodeSent),
        Effect::VerifyCode { email, code } => api
            .verify_code(email, code)
            .await
            .map(Outcome::CodeVerified),
        Effect::FetchSlots { date } => api
            .available_slots(*date)
            .await
            .map(Outcome::SlotsFetched),
        Effect::Book(req) => api.book(req.clone()).await.map(Outcome::Booked),
    };
    result.unwrap_or_else(|e| Outcome::Failed(e.message().to_string()))
}
