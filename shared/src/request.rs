use crate::{ClinicError, ClinicResult};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::collections::VecDeque;

// =========================================================
// 核心抽象层 (HTTP Interface Abstraction)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 解析 JSON 响应体，空响应体按 `null` 处理（以便 `()` 响应类型）
    pub fn json<T: DeserializeOwned>(&self) -> ClinicResult<T> {
        let body = if self.body.trim().is_empty() {
            "null"
        } else {
            self.body.as_str()
        };
        serde_json::from_str(body).map_err(ClinicError::from)
    }
}

/// HTTP 传输层
///
/// 所有请求都在 UI 单线程上执行，因此不要求 `Send`。
#[async_trait::async_trait(?Send)]
pub trait HttpClient {
    /// 传输失败（无法连接等）返回 `ErrorKind::Network`；
    /// 任何收到的 HTTP 响应（包括非 2xx）都返回 `Ok`。
    async fn send(&self, req: HttpRequest) -> ClinicResult<HttpResponse>;
}

// =========================================================
// 测试工具: MockHttpClient
// =========================================================

#[cfg(test)]
type MockKey = (HttpMethod, String);

#[cfg(test)]
pub struct MockHttpClient {
    // (Method, URL) -> 依次返回的 (Status, Body)，最后一个会被重复使用
    responses: RefCell<HashMap<MockKey, VecDeque<(u16, String)>>>,
    // 模拟传输失败的请求
    failures: RefCell<Vec<MockKey>>,
    // 记录发出的请求 (URL, Method, Headers, Body)
    pub requests: RefCell<Vec<(String, HttpMethod, HashMap<String, String>, Option<String>)>>,
}

#[cfg(test)]
impl MockHttpClient {
    pub fn new() -> Self {
        Self {
            responses: RefCell::new(HashMap::new()),
            failures: RefCell::new(Vec::new()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn mock_response(&self, method: HttpMethod, url: &str, status: u16, body: serde_json::Value) {
        self.responses
            .borrow_mut()
            .entry((method, url.to_string()))
            .or_default()
            .push_back((status, body.to_string()));
    }

    pub fn mock_failure(&self, method: HttpMethod, url: &str) {
        self.failures.borrow_mut().push((method, url.to_string()));
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn last_body(&self) -> Option<serde_json::Value> {
        self.requests
            .borrow()
            .last()
            .and_then(|(_, _, _, body)| body.as_ref())
            .and_then(|b| serde_json::from_str(b).ok())
    }
}

#[cfg(test)]
#[async_trait::async_trait(?Send)]
impl HttpClient for MockHttpClient {
    async fn send(&self, req: HttpRequest) -> ClinicResult<HttpResponse> {
        self.requests.borrow_mut().push((
            req.url.clone(),
            req.method,
            req.headers.clone(),
            req.body.clone(),
        ));

        let key = (req.method, req.url.clone());
        if self.failures.borrow().contains(&key) {
            return Err(ClinicError::network("connection refused"));
        }

        let mut responses = self.responses.borrow_mut();
        match responses.get_mut(&key) {
            Some(queue) if !queue.is_empty() => {
                let (status, body) = if queue.len() > 1 {
                    queue.pop_front().unwrap_or_default()
                } else {
                    queue.front().cloned().unwrap_or_default()
                };
                Ok(HttpResponse { status, body })
            }
            _ => Ok(HttpResponse {
                status: 404,
                body: "Not Found".to_string(),
            }),
        }
    }
}
