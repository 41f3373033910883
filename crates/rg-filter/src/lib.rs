//! # rg-filter
//!
//! Request pre-filter rejecting access tokens whose session was logged out.
//!
//! [`RevocationFilter::check`] derives the token key from the presented
//! credential exactly as logout ingestion does, asks the shared
//! [`rg_store::RevocationStore`], and returns a [`Verdict`]. The filter only
//! ever says "definitely revoked" or "unknown"; it does not validate tokens.
//!
//! ## Gateway adapters
//!
//! - [`revocation_guard`]: axum middleware for routes served in-process.
//! - [`filter_router`]: a `/verify` endpoint for gateways that delegate the
//!   decision to a sub-request (204 allow, 401 revoked).
//!
//! ## Failure policy
//!
//! What happens when the store cannot answer is a deployment decision, see
//! [`FailurePolicy`].

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod filter;
pub mod handler;
pub mod policy;

pub use filter::{DenyReason, RevocationFilter, Verdict};
pub use handler::{FilterState, VERIFY_PATH, bearer_credential, filter_router, revocation_guard};
pub use policy::{FailurePolicy, PolicyParseError};
