//! 运行时配置
//!
//! 构建时可通过环境变量 `CLINICA_API_URL` 覆盖默认的 API 地址，
//! 例如 `CLINICA_API_URL=https://api.clinica.example/api trunk build --release`。

/// 未配置时使用的 API 地址（本地开发服务器）
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:4000/api";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let url = option_env!("CLINICA_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(DEFAULT_API_BASE_URL);
        Self {
            api_base_url: url.trim().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_has_no_trailing_slash() {
        let config = AppConfig::from_env();
        assert!(!config.api_base_url.is_empty());
        assert!(!config.api_base_url.ends_with('/'));
    }
}
