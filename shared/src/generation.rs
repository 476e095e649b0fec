//! 请求代际标记
//!
//! 每次发起请求（或视图卸载、对话重启）时推进代际；
//! 响应返回时若代际已过期则丢弃，避免陈旧响应改写已不活跃的视图。

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 某次请求发出时的代际
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GenerationTag(u64);

/// 共享的代际计数器，克隆后共享同一计数
#[derive(Debug, Clone, Default)]
pub struct RequestGeneration {
    current: Arc<AtomicU64>,
}

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始新一代请求，之前发出的标记全部失效
    pub fn begin(&self) -> GenerationTag {
        GenerationTag(self.current.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// 当前代际（不推进）
    pub fn current(&self) -> GenerationTag {
        GenerationTag(self.current.load(Ordering::Relaxed))
    }

    pub fn is_current(&self, tag: GenerationTag) -> bool {
        self.current.load(Ordering::Relaxed) == tag.0
    }

    /// 使所有在途请求失效（如视图卸载时）
    pub fn invalidate(&self) {
        self.begin();
    }

    /// 等待 `fut` 完成；若期间代际已推进则丢弃结果，返回 `None`
    pub async fn settle<F: Future>(&self, tag: GenerationTag, fut: F) -> Option<F::Output> {
        let output = fut.await;
        self.is_current(tag).then_some(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_request_invalidates_older() {
        let generation = RequestGeneration::new();
        let first = generation.begin();
        assert!(generation.is_current(first));

        let second = generation.begin();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
    }

    #[tokio::test]
    async fn test_settle_drops_superseded_load() {
        let generation = RequestGeneration::new();

        let first = generation.begin();
        let stale = generation.settle(first, async { vec!["old"] });
        let second = generation.begin();
        assert_eq!(stale.await, None);

        let fresh = generation.settle(second, async { vec!["new"] }).await;
        assert_eq!(fresh, Some(vec!["new"]));

        let tag = generation.begin();
        let pending = generation.settle(tag, async { 1 });
        generation.invalidate();
        assert_eq!(pending.await, None);
    }

    #[test]
    fn test_clones_share_counter() {
        let generation = RequestGeneration::new();
        let tag = generation.current();
        let handle = generation.clone();
        handle.invalidate();
        assert!(!generation.is_current(tag));
    }
}
