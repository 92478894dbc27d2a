//! CLI module for aerocluster
//!
//! Provides command-line interface for:
//! - delete: Delete a collection from a fixture-described cluster
//! - check-config: Validate a configuration file

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    check_config, delete, load_config, load_fixture, run, run_command, run_delete, DeleteReport,
    ReportedError,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_request, read_request, write_error, write_response};
