//! CLI command implementations
//!
//! `delete` loads a cluster fixture into the in-memory collaborators, runs
//! the simulated leader alongside the delete controller, and prints the
//! per-replica results. `check-config` only loads and validates.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::cluster::memory::ClusterFixture;
use crate::cluster::CommandResults;
use crate::observability::{MetricsRegistry, MetricsSnapshot};
use crate::teardown::{
    DeleteCollectionController, DeleteCollectionRequest, DeleteConfig, DeleteOutcome,
};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> CliResult<DeleteConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

    DeleteConfig::from_json(&content).map_err(|e| CliError::config_error(e.to_string()))
}

/// Load a cluster fixture file.
pub fn load_fixture(path: &Path) -> CliResult<ClusterFixture> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::fixture_error(format!("Failed to read fixture: {}", e)))?;

    ClusterFixture::from_json(&content)
        .map_err(|e| CliError::fixture_error(format!("Invalid fixture: {}", e)))
}

/// Failure part of a delete report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportedError {
    pub code: &'static str,
    pub status: u16,
    pub message: String,
}

/// Everything one delete run produced.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteReport {
    pub collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<DeleteOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ReportedError>,
    pub results: CommandResults,
    pub metrics: MetricsSnapshot,
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Delete {
            fixture,
            name,
            async_id,
            config,
        } => {
            let request = match name {
                Some(name) => DeleteCollectionRequest {
                    name,
                    async_id,
                },
                None => {
                    let mut request: DeleteCollectionRequest =
                        serde_json::from_value(read_request()?)?;
                    if async_id.is_some() {
                        request.async_id = async_id;
                    }
                    request
                }
            };
            delete(&fixture, request, config.as_deref())
        }
        Command::CheckConfig { config } => check_config(&config),
    }
}

/// Delete a collection and print the report.
pub fn delete(
    fixture_path: &Path,
    request: DeleteCollectionRequest,
    config_path: Option<&Path>,
) -> CliResult<()> {
    let report = run_delete(fixture_path, request, config_path)?;
    let data = serde_json::to_value(&report)?;

    match &report.error {
        None => write_response(data),
        Some(error) => {
            write_error(error.code, &error.message, data)?;
            Err(CliError::delete_failed(error.message.clone()))
        }
    }
}

/// Run a delete against a fixture and collect the report.
///
/// Setup problems are returned as errors; a failed delete is a report with
/// `error` set.
pub fn run_delete(
    fixture_path: &Path,
    request: DeleteCollectionRequest,
    config_path: Option<&Path>,
) -> CliResult<DeleteReport> {
    let config = match config_path {
        Some(path) => load_config(path)?,
        None => DeleteConfig::default(),
    };
    let fixture = load_fixture(fixture_path)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let cluster = fixture
            .install()
            .await
            .map_err(|e| CliError::fixture_error(format!("Failed to install fixture: {}", e)))?;

        let leader_cancel = CancellationToken::new();
        let leader = Arc::clone(&cluster.leader).spawn(leader_cancel.clone());

        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupt.cancel();
            }
        });

        let metrics = Arc::new(MetricsRegistry::new());
        let controller =
            DeleteCollectionController::new(cluster.collaborators(), &config, Arc::clone(&metrics));

        let mut results = CommandResults::new();
        let outcome = controller.execute(&request, &mut results, &cancel).await;

        leader_cancel.cancel();
        // The leader loop only ends on cancellation; a join error means it panicked.
        leader
            .await
            .map_err(|e| CliError::io_error(format!("Leader task failed: {}", e)))?;

        let (outcome, error) = match outcome {
            Ok(outcome) => (Some(outcome), None),
            Err(e) => (
                None,
                Some(ReportedError {
                    code: e.error_code().as_str(),
                    status: e.status_code(),
                    message: e.to_string(),
                }),
            ),
        };

        Ok::<_, CliError>(DeleteReport {
            collection: request.name,
            outcome,
            error,
            results,
            metrics: metrics.snapshot(),
        })
    })
}

/// Validate a configuration file and print the effective settings.
pub fn check_config(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    write_response(serde_json::to_value(&config)?)
}
