//! # rg-token
//!
//! Compact token decoding and token-key derivation.
//!
//! Logout ingestion and the request pre-filter must compute the same key for
//! the same session, otherwise a revocation written by one is never found by
//! the other. Both go through [`TokenKey::derive`] in this crate.
//!
//! Signatures are not verified here: the only purpose of decoding is to
//! extract an identifier.
//!
//! ## Feature Flags
//!
//! - **`testutil`**: Enables the [`testutil`] module with builders for
//!   unsigned logout and access tokens.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod claims;
pub mod compact;
pub mod error;
pub mod key;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use claims::{AccessTokenClaims, BACKCHANNEL_LOGOUT_EVENT, LogoutTokenClaims, SessionIds};
pub use compact::{CompactToken, decode_claims};
pub use error::{TokenError, TokenResult};
pub use key::TokenKey;
