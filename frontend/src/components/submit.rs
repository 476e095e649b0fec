//! 表单提交状态
//!
//! 请求在途期间拒绝重复提交，同时驱动按钮的 `disabled`。

use leptos::prelude::*;

#[derive(Clone, Copy)]
pub struct SubmitState(RwSignal<bool>);

impl SubmitState {
    pub fn new() -> Self {
        Self(RwSignal::new(false))
    }

    /// 开始一次提交；已有请求在途时返回 `false`
    pub fn try_begin(&self) -> bool {
        if self.0.get_untracked() {
            return false;
        }
        self.0.set(true);
        true
    }

    /// 请求结束（页面已卸载时静默忽略）
    pub fn finish(&self) {
        self.0.try_set(false);
    }

    /// 响应式读取，用于按钮状态
    pub fn is_busy(&self) -> bool {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leptos::reactive::owner::Owner;

    #[test]
    fn test_second_submit_rejected_until_finished() {
        let owner = Owner::new();
        owner.with(|| {
            let state = SubmitState::new();
            assert!(!state.is_busy());

            assert!(state.try_begin());
            assert!(state.is_busy());
            assert!(!state.try_begin());

            state.finish();
            assert!(!state.is_busy());
            assert!(state.try_begin());
        });
    }
}
