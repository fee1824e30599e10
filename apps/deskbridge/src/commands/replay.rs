//! `deskbridge replay`: feed stored webhook bodies through the engine.
//!
//! Files are processed in the order given. An unreadable file stops the
//! replay; an event that fails to reconcile is reported and skipped.

use std::path::PathBuf;

use clap::Args;
use deskbridge_reconcile::{ReconciliationEngine, RunResult};
use deskbridge_webhooks::process_event_body;
use serde::Serialize;
use tracing::warn;

use crate::commands::print_json;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Event files, each holding one webhook body
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ReplayOutcome {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<RunResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn execute(args: ReplayArgs, config: AppConfig) -> AppResult<()> {
    let engine = ReconciliationEngine::from_config(config.engine_config())?;
    let outcomes = replay_files(&engine, &args.files).await?;

    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    print_json(&outcomes)?;

    if failed > 0 {
        return Err(AppError::Partial {
            failed,
            total: outcomes.len(),
        });
    }
    Ok(())
}

async fn replay_files(
    engine: &ReconciliationEngine,
    files: &[PathBuf],
) -> AppResult<Vec<ReplayOutcome>> {
    let mut outcomes = Vec::with_capacity(files.len());
    for path in files {
        let body = tokio::fs::read(path).await.map_err(|source| AppError::Io {
            path: path.clone(),
            source,
        })?;

        let file = path.display().to_string();
        match process_event_body(engine, &body).await {
            Ok(result) => outcomes.push(ReplayOutcome {
                file,
                result: Some(result),
                error: None,
            }),
            Err(e) => {
                warn!(file = %file, error = %e, "Replayed event failed");
                outcomes.push(ReplayOutcome {
                    file,
                    result: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }
    Ok(outcomes)
}
