//! JWTペイロードの読み出し
//!
//! 署名は検証しない。ロールと有効期限を画面の出し分けに使うだけ。

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{AuthError, AuthResult};

/// ダッシュボードのロール
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum Role {
    #[display("Admin")]
    Admin,
    #[display("Counselor")]
    Counselor,
    #[display("{_0}")]
    Other(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().trim_start_matches("ROLE_").to_ascii_lowercase();
        match normalized.as_str() {
            "admin" | "administrator" => Role::Admin,
            "counselor" | "counsellor" | "consultant" => Role::Counselor,
            _ => Role::Other(raw.to_string()),
        }
    }

    /// ロールごとに開ける画面
    pub fn sections(&self) -> &'static [DashboardSection] {
        use DashboardSection::*;
        match self {
            Role::Admin => &[
                Certificates,
                Courses,
                Memberships,
                Bookings,
                Surveys,
                PersonalityTypes,
                Withdrawals,
                Accounts,
                Notifications,
            ],
            Role::Counselor => &[Bookings, Surveys, Certificates, Withdrawals, Notifications],
            Role::Other(_) => &[],
        }
    }

    pub fn can_access(&self, section: DashboardSection) -> bool {
        self.sections().contains(&section)
    }

    pub fn require(&self, section: DashboardSection) -> AuthResult<()> {
        if self.can_access(section) {
            Ok(())
        } else {
            Err(AuthError::Forbidden {
                role: self.to_string(),
                section: section.to_string(),
            })
        }
    }
}

/// ダッシュボードの画面区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DashboardSection {
    Certificates,
    Courses,
    Memberships,
    Bookings,
    Surveys,
    PersonalityTypes,
    Withdrawals,
    Accounts,
    Notifications,
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<serde_json::Value>,
    #[serde(default, alias = "userRole", alias = "authority")]
    role: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    exp: Option<i64>,
}

/// トークンから読み出した情報
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    pub subject: Option<String>,
    pub role: Role,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenClaims {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// JWTのペイロード部を読み出す
pub fn decode_claims(token: &str) -> AuthResult<TokenClaims> {
    let token = token.trim().trim_start_matches("Bearer ").trim();
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| AuthError::MalformedToken("missing payload segment".into()))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::MalformedToken(e.to_string()))?;
    let raw: RawClaims =
        serde_json::from_slice(&bytes).map_err(|e| AuthError::MalformedToken(e.to_string()))?;

    let role = raw
        .role
        .or_else(|| raw.roles.into_iter().next())
        .map(|r| Role::parse(&r))
        .unwrap_or_else(|| Role::Other(String::new()));

    let subject = raw.sub.map(|sub| match sub {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    });

    let expires_at = raw.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single());

    Ok(TokenClaims {
        subject,
        role,
        expires_at,
    })
}

#[cfg(test)]
pub(crate) fn make_token(payload: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.signature", header, body)
}
