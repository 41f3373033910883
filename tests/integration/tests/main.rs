//! End-to-End Integration Tests
//!
//! These tests run the complete revocation gate on an ephemeral port and
//! drive it over HTTP. Redis tests need docker and run with `--ignored`.

mod backchannel_logout;
mod common;
mod redis_store;
mod request_filter;
