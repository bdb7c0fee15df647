//! pylite CLI library.
//!
//! Shared functionality for the `pylite` binary.

pub mod colors;
pub mod commands;
pub mod config;
pub mod error;

pub use commands::{Settings, Status};
pub use error::CliError;
