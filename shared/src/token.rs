//! Bearer 令牌过期检查
//!
//! 只解码 JWT 载荷中的 `exp` 声明，不校验签名。
//! 这是一项省去必然失败的往返请求的界面优化，不是安全边界：
//! 服务端必须在每个请求上独立重新校验令牌。

use crate::date::Timestamp;
use crate::{ClinicError, ClinicResult};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

/// 从令牌载荷中读取的声明
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenClaims {
    /// 过期时间（Unix 秒）
    pub exp: i64,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub iat: Option<i64>,
}

impl TokenClaims {
    /// 解码 `header.payload.signature` 形式令牌的载荷
    pub fn decode(token: &str) -> ClinicResult<Self> {
        let mut parts = token.split('.');
        let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
            _ => {
                return Err(ClinicError::authentication("malformed token").in_op("token.decode"));
            }
        };

        // 部分签发方会保留 `=` 填充
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| {
                ClinicError::authentication(format!("token payload is not base64url: {}", e))
                    .in_op("token.decode")
            })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            ClinicError::authentication(format!("token payload is not valid claims: {}", e))
                .in_op("token.decode")
        })
    }

    pub fn expires_at(&self) -> Timestamp {
        Timestamp::from_secs(self.exp)
    }
}

/// 令牌新鲜度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Expired,
    /// 无法解码，调用方按过期处理
    Malformed,
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh)
    }
}

/// 在 `now` 时刻检查令牌：`now >= exp` 即视为过期
pub fn check_freshness(token: &str, now: Timestamp) -> Freshness {
    match TokenClaims::decode(token) {
        Ok(claims) if now >= claims.expires_at() => Freshness::Expired,
        Ok(_) => Freshness::Fresh,
        Err(_) => Freshness::Malformed,
    }
}

#[cfg(test)]
pub(crate) fn make_token(payload: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload);
    format!("{}.{}.signature", header, body)
}
