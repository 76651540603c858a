//! Test utilities for unitwork integration tests
//!
//! - recording: adapter and queued object that log every call they receive
//! - entities: small serializable entities for repository tests

#![allow(dead_code)]

pub mod entities;
pub mod recording;

/// Route `log` output through the test harness; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
