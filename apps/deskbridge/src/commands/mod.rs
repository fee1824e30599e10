//! Subcommand implementations.

pub mod replay;
pub mod serve;
pub mod sweep;
pub mod sync;

use serde::Serialize;

use crate::error::AppResult;

/// Write `value` to stdout as pretty JSON.
pub(crate) fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
