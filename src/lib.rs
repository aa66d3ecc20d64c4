//! mitto library — re-exports internal modules for integration testing.
//!
//! Integration tests in `tests/` cannot access items from a binary crate.
//! This `lib.rs` creates a library target alongside the binary so that
//! `tests/acp_integration.rs` can import `mitto::session::SessionManager`, etc.
//!
//! **All application logic lives in the module files.** This file merely
//! makes those modules reachable to external test crates.

pub mod attachment;
pub mod cli;
pub mod client;
pub mod connection;
pub mod env_merge;
pub mod error;
pub mod fs_mediator;
pub mod json_filter;
pub mod logging;
pub mod output;
pub mod permission;
pub mod process;
pub mod processor;
pub mod session;
pub mod terminal_stub;
pub mod tokenizer;
pub mod workspace;
