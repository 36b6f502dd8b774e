//! Shared fixtures for integration tests
//!
//! Each test binary compiles this module separately, so not every helper is
//! used everywhere.

#![allow(dead_code)]

pub mod across_server;
pub mod fixtures;

#[allow(unused_imports)]
pub use across_server::FakeAcrossServer;
#[allow(unused_imports)]
pub use fixtures::*;
