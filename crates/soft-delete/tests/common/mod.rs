//! Shared helpers for soft-delete integration tests.
//!
//! - `TestHarness`: an isolated project tree, quarantine root and settings file
//! - builders for the deletion requests a host would send

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
