//! Stale phone identity detection.

use deskbridge_directory::Identity;
use serde::Serialize;

use crate::normalizer::strip_whitespace;

/// How two whitespace-stripped phone numbers are compared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PhoneMatcher {
    /// Case-insensitive string equality.
    #[default]
    Exact,
    /// Also treat a leading trunk `0` as equivalent to the country code, so
    /// `0412345678` equals `+61412345678` with country code `+61`.
    TrunkPrefix { country_code: String },
}

impl PhoneMatcher {
    /// Trunk-prefix matching for `country_code`, or exact matching when the
    /// code is blank.
    #[must_use]
    pub fn for_country_code(country_code: Option<&str>) -> Self {
        match country_code.map(str::trim) {
            Some(code) if !code.is_empty() => Self::TrunkPrefix {
                country_code: code.to_string(),
            },
            _ => Self::Exact,
        }
    }

    /// Whether two stripped phone numbers denote the same line.
    #[must_use]
    pub fn matches(&self, a: &str, b: &str) -> bool {
        if a.eq_ignore_ascii_case(b) {
            return true;
        }
        match self {
            Self::Exact => false,
            Self::TrunkPrefix { country_code } => {
                match (
                    national_number(a, country_code),
                    national_number(b, country_code),
                ) {
                    (Some(x), Some(y)) => !x.is_empty() && x == y,
                    _ => false,
                }
            }
        }
    }
}

fn national_number<'a>(phone: &'a str, country_code: &str) -> Option<&'a str> {
    phone
        .strip_prefix(country_code)
        .or_else(|| phone.strip_prefix('0'))
}

/// Phone identities that disagree with the canonical phone.
///
/// An empty canonical phone means billing holds no phone, which is not
/// evidence against the directory, so nothing is returned. Identities of any
/// other type are never returned.
#[must_use]
pub fn stale_phone_identities<'a>(
    canonical_phone: &str,
    identities: &'a [Identity],
    matcher: &PhoneMatcher,
) -> Vec<&'a Identity> {
    if canonical_phone.is_empty() {
        return Vec::new();
    }
    identities
        .iter()
        .filter(|identity| identity.is_phone_number())
        .filter(|identity| !matcher.matches(&strip_whitespace(&identity.value), canonical_phone))
        .collect()
}
