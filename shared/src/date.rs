//! 时间类型模块
//!
//! 提供两种时间相关的抽象：
//! - `Timestamp`: 可序列化的毫秒时间戳，用于比较令牌过期时间
//! - `Clock`: 当前时间来源，守卫和预约流程通过它读取"现在"与"今天"

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =========================================================
// Timestamp - 可比较的时间戳类型
// =========================================================

/// 毫秒时间戳
///
/// 内部存储为 `i64`，表示自 Unix 纪元以来的毫秒数
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    #[inline]
    pub const fn new(ms: i64) -> Self {
        Self(ms)
    }

    /// 从秒值创建（JWT 的 `exp` 声明以秒为单位）
    #[inline]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    #[inline]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }
}

// =========================================================
// Clock - 时间来源
// =========================================================

/// 当前时间来源
pub trait Clock {
    /// 当前墙钟时间
    fn now(&self) -> Timestamp;
    /// 本地日历中的"今天"，用于拒绝过去日期的预约
    fn today(&self) -> NaiveDate;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from(Utc::now())
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// 固定时钟，便于测试与回放
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub now: Timestamp,
    pub today: NaiveDate,
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.now
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}

/// 日期的线上格式 (`YYYY-MM-DD`)
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// 解析 `<input type="date">` 的值
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}
