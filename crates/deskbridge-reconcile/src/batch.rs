//! One-shot bulk sync of billing customers into the directory.
//!
//! Pages through the billing customer list oldest first and reconciles each
//! customer independently, at most `parallelism` at a time. A failed customer
//! is recorded in the report and does not stop the sync.

use std::collections::HashMap;
use std::sync::Arc;

use deskbridge_billing::{BillingApi, CustomerFilter, CustomerRecord};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::{ReconciliationEngine, RunResult, RunStatus};
use crate::error::{BulkSyncError, ReconcileResult};

/// Default number of customers reconciled concurrently.
pub const DEFAULT_PARALLELISM: usize = 4;

/// Bulk sync settings.
#[derive(Debug, Clone)]
pub struct BulkSyncOptions {
    /// Restrict the sync to one email address.
    pub email: Option<String>,
    pub parallelism: usize,
    /// Customers whose email ends with one of these (case-insensitive) are
    /// skipped, e.g. internal staff domains.
    pub exclude_email_suffixes: Vec<String>,
    pub page_size: u32,
}

impl Default for BulkSyncOptions {
    fn default() -> Self {
        Self {
            email: None,
            parallelism: DEFAULT_PARALLELISM,
            exclude_email_suffixes: Vec::new(),
            page_size: CustomerFilter::default().limit,
        }
    }
}

/// A customer whose run failed.
#[derive(Debug, Clone, Serialize)]
pub struct BulkSyncFailure {
    pub external_id: String,
    pub error_code: String,
    pub message: String,
    pub retryable: bool,
}

/// Tally of a bulk sync.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkSyncReport {
    pub pages: usize,
    pub excluded: usize,
    pub no_action: usize,
    pub created: usize,
    pub updated: usize,
    pub merged: usize,
    pub cleaned: usize,
    pub privileged_skipped: usize,
    pub failures: Vec<BulkSyncFailure>,
    /// Cancellation stopped the sync before the last page.
    pub cancelled: bool,
}

impl BulkSyncReport {
    /// Customers that were handed to the engine.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.no_action + self.created + self.updated + self.merged + self.cleaned
            + self.failures.len()
    }

    fn record(&mut self, external_id: String, outcome: ReconcileResult<RunResult>) {
        match outcome {
            Ok(result) => {
                match result.status {
                    RunStatus::NoAction => self.no_action += 1,
                    RunStatus::Created => self.created += 1,
                    RunStatus::Updated => self.updated += 1,
                    RunStatus::Merged => self.merged += 1,
                    RunStatus::Cleaned => self.cleaned += 1,
                }
                if result.privileged_skipped {
                    self.privileged_skipped += 1;
                }
            }
            Err(e) => {
                warn!(external_id = %external_id, error = %e, "Customer sync failed");
                self.failures.push(BulkSyncFailure {
                    external_id,
                    error_code: e.error_code().to_string(),
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                });
            }
        }
    }
}

/// Drives [`ReconciliationEngine`] over every billing customer.
pub struct BulkSync {
    engine: Arc<ReconciliationEngine>,
    billing: Arc<dyn BillingApi>,
    options: BulkSyncOptions,
}

impl BulkSync {
    #[must_use]
    pub fn new(
        engine: Arc<ReconciliationEngine>,
        billing: Arc<dyn BillingApi>,
        options: BulkSyncOptions,
    ) -> Self {
        Self {
            engine,
            billing,
            options,
        }
    }

    fn is_excluded(&self, customer: &CustomerRecord) -> bool {
        let email = customer.email.to_ascii_lowercase();
        self.options
            .exclude_email_suffixes
            .iter()
            .any(|suffix| email.ends_with(&suffix.to_ascii_lowercase()))
    }

    /// Run the sync to completion or until `cancel` fires.
    ///
    /// Only a failure to list billing customers aborts the sync; runs already
    /// started are awaited before returning either way.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<BulkSyncReport, BulkSyncError> {
        let filter = CustomerFilter {
            email: self.options.email.clone(),
            limit: self.options.page_size,
        };
        let semaphore = Arc::new(Semaphore::new(self.options.parallelism.max(1)));
        let mut join_set: JoinSet<ReconcileResult<RunResult>> = JoinSet::new();
        // Task id -> customer id, so a panicked run is still attributed.
        let mut in_flight: HashMap<Id, String> = HashMap::new();
        let mut report = BulkSyncReport::default();
        let mut page_token: Option<String> = None;

        info!(
            parallelism = self.options.parallelism,
            email = ?self.options.email,
            "Starting bulk sync"
        );

        let outcome = loop {
            if cancel.is_cancelled() {
                break Ok(());
            }

            let page = match self
                .billing
                .list_customers(&filter, page_token.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) => break Err(e),
            };
            report.pages += 1;
            debug!(
                page = report.pages,
                customers = page.customers.len(),
                "Fetched billing customer page"
            );

            for customer in page.customers {
                if self.is_excluded(&customer) {
                    debug!(email = %customer.email, "Not processing excluded customer");
                    report.excluded += 1;
                    continue;
                }

                let permit = tokio::select! {
                    permit = semaphore.clone().acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                    () = cancel.cancelled() => break,
                };

                let engine = self.engine.clone();
                let run_cancel = cancel.clone();
                let external_id = customer.id.clone();
                let handle = join_set.spawn(async move {
                    let event_id = format!("bulk-sync:{}", customer.id);
                    let result = engine
                        .reconcile_with_cancel(&customer, &event_id, &run_cancel)
                        .await;
                    drop(permit);
                    result
                });
                in_flight.insert(handle.id(), external_id);

                while let Some(joined) = join_set.try_join_next_with_id() {
                    collect(&mut report, &mut in_flight, joined);
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break Ok(()),
            }
        };

        while let Some(joined) = join_set.join_next_with_id().await {
            collect(&mut report, &mut in_flight, joined);
        }
        report.cancelled = cancel.is_cancelled();

        if let Err(e) = outcome {
            error!(error = %e, retryable = e.is_retryable(), "Bulk sync aborted");
            return Err(e.into());
        }

        info!(
            processed = report.processed(),
            created = report.created,
            updated = report.updated,
            merged = report.merged,
            failures = report.failures.len(),
            cancelled = report.cancelled,
            "Bulk sync finished"
        );
        Ok(report)
    }
}

fn collect(
    report: &mut BulkSyncReport,
    in_flight: &mut HashMap<Id, String>,
    joined: Result<(Id, ReconcileResult<RunResult>), JoinError>,
) {
    match joined {
        Ok((id, outcome)) => {
            let external_id = in_flight.remove(&id).unwrap_or_default();
            report.record(external_id, outcome);
        }
        Err(e) => {
            let external_id = in_flight.remove(&e.id()).unwrap_or_default();
            error!(external_id = %external_id, error = %e, "Customer sync task panicked");
            report.failures.push(BulkSyncFailure {
                external_id,
                error_code: "INTERNAL".to_string(),
                message: format!("task failed: {e}"),
                retryable: true,
            });
        }
    }
}
