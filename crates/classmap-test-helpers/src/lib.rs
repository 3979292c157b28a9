//! Test utilities and fixtures for classmap
//!
//! Shared by the integration tests of the core and CLI crates.

pub mod fixtures;
pub mod mocks;
