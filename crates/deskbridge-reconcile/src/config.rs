//! Engine configuration.

use deskbridge_directory::DirectoryConfig;

use crate::cleaner::PhoneMatcher;

/// Behaviour switches of a [`crate::ReconciliationEngine`].
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Phone comparison used by the identity cleaner.
    pub phone_matcher: PhoneMatcher,
    /// Log full customer and directory records at debug level. Off by
    /// default since they carry contact details.
    pub debug: bool,
}

/// Everything needed to build an engine against a live directory.
///
/// Passed explicitly so engines with different credentials can coexist in
/// one process.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub directory: DirectoryConfig,
    pub options: EngineOptions,
}
