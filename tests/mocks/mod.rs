//! Centralized mocks and fixtures for testing
//!
//! Reusable settings, provider configurations and locations shared by the
//! integration tests.

pub mod configs;

#[allow(unused_imports)]
pub use configs::{Locations, MockConfigs};
