//! `deskbridge sweep-identities`: remove redundant phone identities of one user.

use std::sync::Arc;

use clap::Args;
use deskbridge_directory::DirectoryClient;
use deskbridge_reconcile::IdentitySweep;
use tracing::info;

use crate::commands::print_json;
use crate::config::AppConfig;
use crate::error::AppResult;

#[derive(Debug, Args)]
pub struct SweepArgs {
    /// Email address of the directory user
    pub email: String,

    /// Delete what is found (default is a dry run)
    #[arg(long)]
    pub apply: bool,
}

pub async fn execute(args: SweepArgs, config: AppConfig) -> AppResult<()> {
    let directory = DirectoryClient::new(config.directory.clone())?;
    let sweep = IdentitySweep::new(Arc::new(directory), config.phone_matcher.clone());

    let findings = sweep.sweep(&args.email, args.apply).await?;
    info!(
        found = findings.len(),
        applied = args.apply,
        "Identity sweep finished"
    );
    print_json(&findings)
}
