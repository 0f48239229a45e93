//! Shared fixtures for the tlnorm integration harnesses.
//!
//! Import via `mod common; use common::*;` at the top of each harness file.

pub mod fixtures;

pub use fixtures::*;
