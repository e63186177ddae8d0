//! meetup2md command-line client.
//!
//! This crate provides the `meetup2md` binary: argument parsing, the
//! configuration file that holds credentials and event options, and the two
//! steps of a run (authorize, then export).

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use config::CredentialStore;
pub use error::{ClientError, ClientResult};
