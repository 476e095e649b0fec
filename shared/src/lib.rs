//! 诊所管理控制台的共享领域层
//!
//! 不依赖 DOM，可在原生目标上完整测试：
//! - `session`: 会话存储（唯一的跨组件共享状态）
//! - `permissions` / `guard` / `token`: 认证与授权判定
//! - `booking`: 聊天机器人预约对话状态机
//! - `api` / `protocol` / `request`: 远端 API 协议与客户端

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod api;
pub mod booking;
pub mod dashboard;
pub mod date;
pub mod error;
pub mod generation;
pub mod guard;
pub mod permissions;
pub mod protocol;
pub mod request;
pub mod session;
pub mod storage;
pub mod theme;
pub mod token;
pub mod validation;

pub use error::{ClinicError, ClinicResult, ErrorKind};
pub use permissions::{Permission, Role};

// =========================================================
// 常量定义 (Constants)
// =========================================================

pub const STORAGE_USER_KEY: &str = "clinica_user";
pub const STORAGE_TOKEN_KEY: &str = "clinica_token";
pub const STORAGE_THEME_KEY: &str = "clinica_theme";
pub const HEADER_AUTHORIZATION: &str = "Authorization";

// =========================================================
// 领域模型 (Domain Models)
// =========================================================

/// 系统用户（控制台操作者）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(alias = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(alias = "rol")]
    pub role: Role,
}

impl UserRecord {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            role,
        }
    }
}

/// 患者档案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(rename = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(
        rename = "fechaNacimiento",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub birth_date: Option<NaiveDate>,
}

/// 预约时段，如 `"09:30"`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slot(pub String);

impl Slot {
    pub fn new(time: impl Into<String>) -> Self {
        Self(time.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 预约
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "email")]
    pub patient_email: String,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "hora")]
    pub slot: Slot,
    #[serde(rename = "motivo")]
    pub reason: String,
    #[serde(rename = "estado", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// 验证码校验成功后解析出的患者身份
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedPatient {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "nombre", default)]
    pub name: String,
    pub email: String,
}

/// 病历表单
///
/// 字段结构属于产品内容，这里只作为字符串键值集合透传。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClinicalHistory(pub serde_json::Map<String, serde_json::Value>);

impl ClinicalHistory {
    /// 读取字段的文本形式（非字符串值按 JSON 文本显示）
    pub fn text(&self, key: &str) -> String {
        match self.0.get(key) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    pub fn set_text(&mut self, key: &str, value: impl Into<String>) {
        self.0
            .insert(key.to_string(), serde_json::Value::String(value.into()));
    }

    /// 按字母序返回字段名（`serde_json::Map` 默认即为有序）
    pub fn keys(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }
}
