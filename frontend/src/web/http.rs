//! HTTP 传输层
//!
//! 使用 `gloo-net` 实现共享层的 `HttpClient`。

use clinica_shared::request::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use clinica_shared::{ClinicError, ClinicResult};
use gloo_net::http::{Method, RequestBuilder};

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// 基于浏览器 fetch 的客户端
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FetchClient;

#[async_trait::async_trait(?Send)]
impl HttpClient for FetchClient {
    async fn send(&self, req: HttpRequest) -> ClinicResult<HttpResponse> {
        let mut builder = RequestBuilder::new(&req.url).method(to_method(req.method));
        for (key, value) in &req.headers {
            builder = builder.header(key, value);
        }

        let request = match req.body {
            Some(body) => builder.body(body),
            None => builder.build(),
        }
        .map_err(|e| ClinicError::network(format!("No se pudo construir la solicitud: {}", e)))?;

        let res = request
            .send()
            .await
            .map_err(|e| ClinicError::network(format!("No se pudo conectar con el servidor: {}", e)))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| ClinicError::network(format!("No se pudo leer la respuesta: {}", e)))?;

        Ok(HttpResponse { status, body })
    }
}
