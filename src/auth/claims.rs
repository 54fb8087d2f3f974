use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Access tokens authenticate requests; refresh tokens are only good for `/refresh`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT payload. Identity only; the admin flag is read from `users` on each admin call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

impl Claims {
    pub fn expiring(
        user_id: Uuid,
        kind: TokenKind,
        issued_at: OffsetDateTime,
        ttl: Duration,
        issuer: &str,
        audience: &str,
    ) -> Self {
        Self {
            sub: user_id,
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + ttl).unix_timestamp(),
            iss: issuer.to_owned(),
            aud: audience.to_owned(),
            kind,
        }
    }
}
