//! Field-level diff between the canonical customer and its directory record.

use deskbridge_directory::DirectoryUser;
use serde::Serialize;

use crate::normalizer::CanonicalCustomer;

/// What the write step has to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteAction {
    Create,
    Update,
    Unchanged,
    /// Staff record that disagrees with billing data; left untouched.
    PrivilegedSkipped,
}

/// Outcome of [`decide`]: the action and the record to send if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub action: WriteAction,
    pub request: DirectoryUser,
    /// Names of the fields that triggered an update.
    pub changed: Vec<&'static str>,
}

impl Decision {
    #[must_use]
    pub fn write_needed(&self) -> bool {
        matches!(self.action, WriteAction::Create | WriteAction::Update)
    }
}

/// Decide whether `existing` must be created or updated to match `canonical`.
///
/// The caller guarantees `canonical.full_name` is non-empty.
#[must_use]
pub fn decide(canonical: &CanonicalCustomer, existing: Option<&DirectoryUser>) -> Decision {
    let Some(existing) = existing else {
        return Decision {
            action: WriteAction::Create,
            request: DirectoryUser {
                id: None,
                email: canonical.email.clone(),
                name: canonical.full_name.clone(),
                phone: non_empty(&canonical.phone),
                external_id: Some(canonical.external_id.clone()),
                active: true,
                verified: true,
                role: None,
            },
            changed: Vec::new(),
        };
    };

    let changed = differences(canonical, existing);

    let mut request = existing.clone();
    request.role = None;
    request.name = canonical.full_name.clone();
    request.email = canonical.email.clone();
    request.external_id = Some(canonical.external_id.clone());
    if !canonical.phone.is_empty() {
        request.phone = Some(canonical.phone.clone());
    }
    request.active = true;
    request.verified = true;

    let action = if changed.is_empty() {
        WriteAction::Unchanged
    } else if existing.is_privileged() {
        WriteAction::PrivilegedSkipped
    } else {
        WriteAction::Update
    };

    Decision {
        action,
        request,
        changed,
    }
}

/// Fields of `existing` that disagree with `canonical`.
#[must_use]
pub fn differences(canonical: &CanonicalCustomer, existing: &DirectoryUser) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if existing.name != canonical.full_name {
        changed.push("name");
    }
    if !canonical.phone.is_empty()
        && !existing.phone_or_empty().eq_ignore_ascii_case(&canonical.phone)
    {
        changed.push("phone");
    }
    if !existing
        .external_id_or_empty()
        .eq_ignore_ascii_case(&canonical.external_id)
    {
        changed.push("external_id");
    }
    if !existing.verified {
        changed.push("verified");
    }
    if !existing.active {
        changed.push("active");
    }
    changed
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
