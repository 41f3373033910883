//! Back-channel logout integration tests.

use chrono::TimeDelta;
use reqwest::StatusCode;
use reqwest::header::CACHE_CONTROL;
use rg_token::testutil::{logout_claims, logout_token, unsigned_token};
use serde_json::Value;

use crate::common::TestEnv;

const ISSUER: &str = "https://idp.example.com/realms/main";

/// Tests that an accepted logout answers 200 with an empty body.
#[tokio::test]
async fn test_logout_accepted() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .logout(&logout_token(ISSUER, "alice@example.com", Some("sess-42")))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CACHE_CONTROL], "no-store");
    assert!(response.text().await?.is_empty());
    assert!(env.store.is_revoked("sess-42").await?);
    Ok(())
}

/// Tests that a logout without a session revokes the subject.
#[tokio::test]
async fn test_logout_without_session_revokes_subject() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env.logout(&logout_token(ISSUER, "bob", None)).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(env.store.is_revoked("bob").await?);
    Ok(())
}

/// Tests that a two-segment token is rejected without writing anything.
#[tokio::test]
async fn test_malformed_token_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let token = logout_token(ISSUER, "alice@example.com", Some("sess-42"));
    let two_segments = token.rsplitn(2, '.').nth(1).unwrap_or_default().to_string();

    let response = env.logout(&two_segments).await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "invalid_request");
    assert!(!env.store.is_revoked("sess-42").await?);
    assert!(!env.store.is_revoked("alice@example.com").await?);
    Ok(())
}

/// Tests that a token missing required claims is unsupported.
#[tokio::test]
async fn test_missing_claims_unsupported() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let mut claims = logout_claims(ISSUER, "alice@example.com", Some("sess-42"));
    if let Some(object) = claims.as_object_mut() {
        object.remove("events");
    }

    let response = env.logout(&unsigned_token(&claims)).await?;

    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "unsupported_logout_token");
    assert!(!env.store.is_revoked("sess-42").await?);
    Ok(())
}

/// Tests that a logout token carrying a nonce is refused.
#[tokio::test]
async fn test_nonce_unsupported() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let mut claims = logout_claims(ISSUER, "alice@example.com", Some("sess-42"));
    claims["nonce"] = Value::from("n-0S6_WzA2Mj");

    let response = env.logout(&unsigned_token(&claims)).await?;

    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    Ok(())
}

/// Tests that a request without a logout token is a bad request.
#[tokio::test]
async fn test_missing_form_field() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .client
        .post(env.url("/backchannel-logout"))
        .form(&[("token", "abc")])
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

/// Tests that repeated notifications for one session are idempotent.
#[tokio::test]
async fn test_repeated_logout_idempotent() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let token = logout_token(ISSUER, "alice@example.com", Some("sess-42"));

    for _ in 0..3 {
        assert_eq!(env.logout(&token).await?.status(), StatusCode::OK);
    }

    assert!(env.store.is_revoked("sess-42").await?);
    env.clock.advance(TimeDelta::seconds(3601));
    assert!(!env.store.is_revoked("sess-42").await?);
    Ok(())
}

/// Tests that concurrent logouts for different sessions are all recorded.
#[tokio::test]
async fn test_concurrent_logouts() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let tokens: Vec<_> = (0..32)
        .map(|i| logout_token(ISSUER, "carol", Some(&format!("sess-{i}"))))
        .collect();
    let responses = futures::future::join_all(tokens.iter().map(|t| env.logout(t))).await;

    for response in responses {
        assert_eq!(response?.status(), StatusCode::OK);
    }
    for i in 0..32 {
        assert!(env.store.is_revoked(&format!("sess-{i}")).await?);
    }
    Ok(())
}
