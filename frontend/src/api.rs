//! 浏览器端 API 客户端
//!
//! 共享层的 `ClinicApi` 搭配 fetch 传输层。

use crate::config::AppConfig;
use crate::web::FetchClient;
use clinica_shared::api::ClinicApi;

pub type Api = ClinicApi<FetchClient>;

/// 按当前配置构建客户端，`token` 为空时不发送 Authorization 头
pub fn build_api(token: Option<String>) -> Api {
    ClinicApi::new(AppConfig::from_env().api_base_url, FetchClient).with_token(token)
}
