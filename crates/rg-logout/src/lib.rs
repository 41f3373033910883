//! # rg-logout
//!
//! Back-channel logout ingestion.
//!
//! An identity provider POSTs a signed logout token to
//! [`BACKCHANNEL_LOGOUT_PATH`]; the token's session identifiers (or its
//! subject) are revoked in the shared [`rg_store::RevocationStore`] for the
//! configured default TTL.
//!
//! | outcome | status |
//! |---------|--------|
//! | revoked | 200, empty body |
//! | not a three-segment token, undecodable payload | 400 |
//! | missing `iss`, `sub` or the logout event | 501 |
//! | store write failed or timed out | 503 |
//!
//! The response is only sent once every store write has resolved.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod error;
pub mod handler;
pub mod ingestion;

pub use error::{ErrorResponse, LogoutError, LogoutResult};
pub use handler::{BACKCHANNEL_LOGOUT_PATH, LogoutForm, LogoutState, MAX_BODY_BYTES, logout_router};
pub use ingestion::{LogoutIngestion, LogoutNotification};
