//! `deskbridge sync`: reconcile every billing customer.

use std::sync::Arc;

use clap::Args;
use deskbridge_billing::BillingClient;
use deskbridge_reconcile::{BulkSync, BulkSyncReport, ReconciliationEngine};
use tracing::{info, warn};

use crate::commands::print_json;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::shutdown::cancel_on_signal;

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Only reconcile the customer with this email
    #[arg(long)]
    pub email: Option<String>,

    /// Concurrent reconciliations (defaults to SYNC_PARALLELISM)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub parallelism: Option<u16>,
}

pub async fn execute(args: SyncArgs, config: AppConfig) -> AppResult<()> {
    let billing = config.require_billing()?;
    let billing = BillingClient::new(
        billing.base_url.clone(),
        billing.api_key.clone(),
        billing.timeout,
    )?;
    let engine = ReconciliationEngine::from_config(config.engine_config())?;
    let options = config.bulk_sync_options(args.email, args.parallelism.map(usize::from));

    let cancel = cancel_on_signal();
    let sync = BulkSync::new(Arc::new(engine), Arc::new(billing), options);
    let report = sync.run(&cancel).await?;

    info!(
        processed = report.processed(),
        failed = report.failures.len(),
        cancelled = report.cancelled,
        "Bulk sync finished"
    );
    print_json(&report)?;
    sync_outcome(&report)
}

/// Cancellation wins over failures: runs it interrupted show up as failures.
fn sync_outcome(report: &BulkSyncReport) -> AppResult<()> {
    if report.cancelled {
        warn!("Bulk sync was cancelled before completion");
        return Err(AppError::Cancelled {
            processed: report.processed(),
        });
    }
    if !report.failures.is_empty() {
        return Err(AppError::Partial {
            failed: report.failures.len(),
            total: report.processed(),
        });
    }
    Ok(())
}
