//! JWT claim structures.
//!
//! Access and refresh tokens share one claim layout and are told apart by
//! [`TokenType`]. Every token carries a unique `jti` so it can be revoked
//! individually through the blocklist.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// Identity embedded in issued tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub user_id: i64,
    pub role: String,
    pub external_id: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    pub role: String,
    pub external_id: String,
    pub full_name: String,
    /// Unique token identifier, used for revocation
    pub jti: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    /// Numeric user id parsed from `sub`.
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }

    pub fn subject(&self) -> Option<TokenSubject> {
        Some(TokenSubject {
            user_id: self.user_id()?,
            role: self.role.clone(),
            external_id: self.external_id.clone(),
            full_name: self.full_name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> Claims {
        Claims {
            sub: "42".to_string(),
            role: "student".to_string(),
            external_id: "2024-0001".to_string(),
            full_name: "Ana Cruz".to_string(),
            jti: "abc".to_string(),
            token_type: TokenType::Access,
            exp: 9999999999,
            iat: 1234567890,
        }
    }

    #[test]
    fn test_claims_serialize_type_field() {
        let json = serde_json::to_value(sample_claims()).unwrap();
        assert_eq!(json["type"], "access");
        assert_eq!(json["sub"], "42");
        assert!(json.get("token_type").is_none());
    }

    #[test]
    fn test_claims_roundtrip_refresh() {
        let mut claims = sample_claims();
        claims.token_type = TokenType::Refresh;
        let json = serde_json::to_string(&claims).unwrap();
        let decoded: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.token_type, TokenType::Refresh);
    }

    #[test]
    fn test_user_id_and_subject() {
        let claims = sample_claims();
        assert_eq!(claims.user_id(), Some(42));
        let subject = claims.subject().unwrap();
        assert_eq!(subject.full_name, "Ana Cruz");

        let mut bad = sample_claims();
        bad.sub = "not-a-number".to_string();
        assert!(bad.user_id().is_none());
        assert!(bad.subject().is_none());
    }
}
