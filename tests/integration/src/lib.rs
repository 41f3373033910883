//! Integration test harness for revoke-gate.
//!
//! The tests live under `tests/`.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]
