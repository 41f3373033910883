//! Builders for unsigned compact tokens.
//!
//! Decoding never checks signatures, so tests only need well-formed
//! segments. Feature-gated behind `testutil`.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Value, json};

use crate::claims::BACKCHANNEL_LOGOUT_EVENT;

/// Encodes `claims` as the payload of a token with a dummy signature.
#[must_use]
pub fn unsigned_token(claims: &Value) -> String {
    let header = json!({ "alg": "RS256", "typ": "JWT" });
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string()),
        URL_SAFE_NO_PAD.encode("signature")
    )
}

/// Claims of a valid back-channel logout token.
#[must_use]
pub fn logout_claims(issuer: &str, subject: &str, session_id: Option<&str>) -> Value {
    let mut events = serde_json::Map::new();
    events.insert(BACKCHANNEL_LOGOUT_EVENT.to_string(), json!({}));

    let mut claims = json!({
        "iss": issuer,
        "sub": subject,
        "aud": "gateway",
        "iat": 1_700_000_000,
        "jti": "logout-1",
        "events": Value::Object(events),
    });
    if let Some(sid) = session_id {
        claims["sid"] = json!(sid);
    }
    claims
}

/// A valid back-channel logout token.
#[must_use]
pub fn logout_token(issuer: &str, subject: &str, session_id: Option<&str>) -> String {
    unsigned_token(&logout_claims(issuer, subject, session_id))
}

/// An access token for `subject`, bound to `session_id` when given.
#[must_use]
pub fn access_token(subject: &str, session_id: Option<&str>) -> String {
    let mut claims = json!({
        "iss": "https://idp.example.com",
        "sub": subject,
        "exp": 4_102_444_800_i64,
        "scope": "openid",
    });
    if let Some(sid) = session_id {
        claims["sid"] = json!(sid);
    }
    unsigned_token(&claims)
}
