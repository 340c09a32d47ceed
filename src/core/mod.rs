//! Shared building blocks for the kbc commands
//!
//! - **config**: kbc.toml parsing, action inputs and validation
//! - **context**: Run context built once in main and passed to every command
//! - **error**: Error types with contextual help messages
//! - **vcs**: Git operations (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod vcs;
