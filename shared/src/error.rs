use std::fmt;

use serde::{Deserialize, Serialize};

// =========================================================
// 错误类别枚举
// =========================================================

/// 错误类别
///
/// 对应控制台中用户可见的四类提示，外加本地存储与序列化两类基础设施错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// 凭据错误、令牌过期或无效（已登录会话上检测到时需强制注销）
    Authentication,
    /// 已认证但角色不足（只显示拒绝提示，不清除会话）
    Authorization,
    /// 请求被拒绝或服务不可达（不自动重试）
    Network,
    /// 表单输入校验失败（在发出任何请求之前）
    Validation,
    /// 本地持久化读写失败
    Storage,
    /// JSON 解析或序列化错误
    Serialization,
}

impl ErrorKind {
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorKind::Authentication => "AUTHENTICATION_FAILED",
            ErrorKind::Authorization => "ACCESS_DENIED",
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::Validation => "INVALID_INPUT",
            ErrorKind::Storage => "STORAGE_ERROR",
            ErrorKind::Serialization => "JSON_PARSE_ERROR",
        }
    }

    /// 根据 HTTP 状态码推断错误类别
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorKind::Authentication,
            403 => ErrorKind::Authorization,
            400 | 422 => ErrorKind::Validation,
            _ => ErrorKind::Network,
        }
    }
}

// =========================================================
// 错误上下文追踪
// =========================================================

/// 结构化的错误追踪片段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSpan {
    /// 操作名称，如 "api.login", "session.restore"
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorSpan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: None,
        }
    }

    pub fn with_detail(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: Some(detail.into()),
        }
    }
}

// =========================================================
// 核心错误类型
// =========================================================

/// 控制台领域错误
///
/// - kind: 错误类别
/// - message: 面向用户的消息
/// - source: 原始错误（可选）
/// - spans: 结构化的调用追踪栈
#[derive(Debug)]
pub struct ClinicError {
    pub kind: ErrorKind,
    pub message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    spans: Vec<ErrorSpan>,
}

impl ClinicError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            spans: Vec::new(),
        }
    }

    // --- Convenience constructors ---

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    // --- Context builders ---

    /// 添加操作追踪（无额外细节）
    pub fn in_op(mut self, operation: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::new(operation));
        self
    }

    /// 添加操作追踪（带额外细节）
    pub fn in_op_with(mut self, operation: impl Into<String>, detail: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::with_detail(operation, detail));
        self
    }

    /// 设置原始错误源
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // --- Accessors ---

    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn spans(&self) -> &[ErrorSpan] {
        &self.spans
    }

    /// 是否应当导致已登录会话被强制注销
    pub fn forces_logout(&self) -> bool {
        self.kind == ErrorKind::Authentication
    }
}

impl fmt::Display for ClinicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message)?;

        if !self.spans.is_empty() {
            write!(f, " | trace: ")?;
            for (i, span) in self.spans.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", span.operation)?;
                if let Some(detail) = &span.detail {
                    write!(f, "({})", detail)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ClinicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;

// =========================================================
// 服务端错误响应体
// =========================================================

/// 远端 API 返回的错误体，通常形如 `{"message": "..."}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, alias = "error", alias = "mensaje")]
    pub message: Option<String>,
}

impl ErrorResponse {
    /// 从响应体中尽力提取错误消息，解析失败时返回 None
    pub fn extract(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .and_then(|r| r.message)
            .filter(|m| !m.trim().is_empty())
    }
}

// =========================================================
// 类型转换实现
// =========================================================

impl From<serde_json::Error> for ClinicError {
    fn from(e: serde_json::Error) -> Self {
        ClinicError::serialization(e.to_string()).with_source(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_trace() {
        let err = ClinicError::network("timeout")
            .in_op("api.send")
            .in_op_with("dashboard.count", "usuarios");
        assert_eq!(
            err.to_string(),
            "[NETWORK_ERROR] timeout | trace: api.send -> dashboard.count(usuarios)"
        );
    }

    #[test]
    fn test_kind_from_status() {
        assert_eq!(ErrorKind::from_status(401), ErrorKind::Authentication);
        assert_eq!(ErrorKind::from_status(403), ErrorKind::Authorization);
        assert_eq!(ErrorKind::from_status(422), ErrorKind::Validation);
        assert_eq!(ErrorKind::from_status(500), ErrorKind::Network);
    }

    #[test]
    fn test_only_authentication_forces_logout() {
        assert!(ClinicError::authentication("expired").forces_logout());
        assert!(!ClinicError::authorization("nope").forces_logout());
        assert!(!ClinicError::network("down").forces_logout());
    }

    #[test]
    fn test_extract_server_message() {
        assert_eq!(
            ErrorResponse::extract(r#"{"message":"Credenciales inválidas"}"#),
            Some("Credenciales inválidas".to_string())
        );
        assert_eq!(
            ErrorResponse::extract(r#"{"error":"Código incorrecto"}"#),
            Some("Código incorrecto".to_string())
        );
        assert_eq!(ErrorResponse::extract("<html>"), None);
        assert_eq!(ErrorResponse::extract(r#"{"message":"  "}"#), None);
    }
}
