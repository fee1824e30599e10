//! Canonical form of a billing customer.
//!
//! Names are title-cased word by word and phones lose all whitespace. Both
//! transforms are idempotent, so a canonical value compares equal to a
//! directory field written from it on an earlier run.

use deskbridge_billing::CustomerRecord;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Name and phone in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedContact {
    pub full_name: String,
    pub phone: String,
}

/// A billing customer reduced to the fields the directory carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCustomer {
    pub external_id: String,
    pub email: String,
    pub full_name: String,
    pub phone: String,
}

impl CanonicalCustomer {
    #[must_use]
    pub fn from_record(record: &CustomerRecord) -> Self {
        let contact = normalize(&record.first_name, &record.last_name, &record.phone);
        Self {
            external_id: record.id.trim().to_string(),
            email: record.email.trim().to_string(),
            full_name: contact.full_name,
            phone: contact.phone,
        }
    }

    /// Customers without a name are half-registered and not pushed yet.
    #[must_use]
    pub fn has_name(&self) -> bool {
        !self.full_name.is_empty()
    }
}

/// Canonicalize a billing name pair and phone.
///
/// The parts are title-cased separately, joined with one space, and the
/// result trimmed. Inner padding of a part survives, as it always has in
/// names already written to the directory.
#[must_use]
pub fn normalize(first_name: &str, last_name: &str, phone: &str) -> NormalizedContact {
    let joined = format!("{} {}", title_case(first_name), title_case(last_name));

    NormalizedContact {
        full_name: joined.trim().to_string(),
        phone: strip_whitespace(phone),
    }
}

/// Upper-case the first letter of every word and lower-case the rest.
///
/// A word starts after any character that is neither alphanumeric, an
/// apostrophe nor a combining mark, so `o'neil` becomes `O'neil` and
/// `anne-marie` becomes `Anne-Marie`. Input and output are in NFC.
#[must_use]
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut word_start = true;

    for c in input.nfc() {
        if is_combining_mark(c) {
            // Accents belong to the letter before them.
            out.push(c);
        } else if c.is_alphabetic() {
            if word_start {
                let mut upper = c.to_uppercase();
                if let Some(first) = upper.next() {
                    out.push(first);
                }
                // Multi-char expansions (ß -> SS) keep only the head upper.
                out.extend(upper.flat_map(char::to_lowercase));
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else if c.is_numeric() {
            out.push(c);
            word_start = false;
        } else {
            out.push(c);
            word_start = !is_apostrophe(c);
        }
    }

    out.nfc().collect()
}

/// Remove every whitespace character.
#[must_use]
pub fn strip_whitespace(input: &str) -> String {
    input.chars().filter(|c| !c.is_whitespace()).collect()
}

fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}')
}
