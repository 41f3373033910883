//! Request pre-filter integration tests.

use chrono::TimeDelta;
use reqwest::StatusCode;
use reqwest::header::WWW_AUTHENTICATE;
use rg_server::ServerConfig;
use rg_token::testutil::{access_token, logout_token};

use crate::common::TestEnv;

const ISSUER: &str = "https://idp.example.com/realms/main";

/// Tests the full logout, deny and expiry scenario.
#[tokio::test]
async fn test_logout_then_deny_until_expiry() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let access = access_token("alice@example.com", Some("sess-42"));

    assert_eq!(env.verify(&access).await?.status(), StatusCode::NO_CONTENT);

    let response = env
        .logout(&logout_token(ISSUER, "alice@example.com", Some("sess-42")))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = env.verify(&access).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let challenge = response.headers()[WWW_AUTHENTICATE].to_str()?;
    assert!(challenge.contains("invalid_token"));

    env.clock.advance(TimeDelta::seconds(3601));
    assert_eq!(env.verify(&access).await?.status(), StatusCode::NO_CONTENT);
    Ok(())
}

/// Tests that only the logged-out session is denied.
#[tokio::test]
async fn test_other_session_allowed() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    env.logout(&logout_token(ISSUER, "alice@example.com", Some("sess-42")))
        .await?;

    let other = access_token("alice@example.com", Some("sess-43"));
    assert_eq!(env.verify(&other).await?.status(), StatusCode::NO_CONTENT);
    Ok(())
}

/// Tests that a configured revocation lifetime is applied.
#[tokio::test]
async fn test_configured_revocation_ttl() -> anyhow::Result<()> {
    let config = ServerConfig {
        revocation_ttl_seconds: 60,
        ..ServerConfig::for_testing()
    };
    let env = TestEnv::with_config(config).await?;
    let access = access_token("dave", None);

    env.logout(&logout_token(ISSUER, "dave", None)).await?;
    assert_eq!(env.verify(&access).await?.status(), StatusCode::UNAUTHORIZED);

    env.clock.advance(TimeDelta::seconds(61));
    assert_eq!(env.verify(&access).await?.status(), StatusCode::NO_CONTENT);
    Ok(())
}

/// Tests that requests without a decodable token are let through.
#[tokio::test]
async fn test_unknown_credentials_allowed() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env.client.get(env.url("/verify")).send().await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(env.verify("opaque-reference-token").await?.status(), StatusCode::NO_CONTENT);
    Ok(())
}

/// Tests that the health endpoint reports the active backend.
#[tokio::test]
async fn test_health_reports_backend() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let body: serde_json::Value = env.client.get(env.url("/health")).send().await?.json().await?;

    assert_eq!(body["backend"], "in-memory");
    assert_eq!(body["failure_policy"], "fail-closed");
    Ok(())
}
