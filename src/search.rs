use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::alphabet::AlphabetTable;
use crate::input::filter_phone;
use crate::translit::translate_term;

/// Lowercase and drop all whitespace. Applied to search terms and to the
/// plate field of every candidate record.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

pub fn normalize_query(query: &str) -> Option<String> {
    let normalized = normalize(query);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Search needles for a plate term typed in either alphabet.
///
/// Returns the normalized term followed by its letter-swapped translation,
/// or nothing when the term is blank. The translation is built from the raw
/// term, so any whitespace in it is kept.
pub fn variations(table: &AlphabetTable, term: &str) -> Vec<String> {
    let Some(normalized) = normalize_query(term) else {
        return Vec::new();
    };
    let translated = translate_term(table, term).to_lowercase();

    if translated == normalized {
        vec![normalized]
    } else {
        vec![normalized, translated]
    }
}

/// Whether any variation occurs inside the normalized plate.
pub fn matches(variations: &[String], plate: &str) -> bool {
    let plate = normalize(plate);
    variations.iter().any(|v| plate.contains(v.as_str()))
}

// =============================================================================
// Request list
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: String,
    pub plate: String,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub car: Option<String>,
}

pub fn load_requests(path: &Path) -> Result<Vec<RequestRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read request list at {}", path.display()))?;
    let records: Vec<RequestRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {} as a JSON request list", path.display()))?;
    tracing::debug!(count = records.len(), path = %path.display(), "loaded request list");
    Ok(records)
}

/// Requests whose plate matches `term`, in list order.
///
/// A term made only of digits and separators also matches phone numbers.
pub fn filter_requests<'a>(
    table: &AlphabetTable,
    records: &'a [RequestRecord],
    term: &str,
) -> Vec<&'a RequestRecord> {
    let needles = variations(table, term);
    if needles.is_empty() {
        return Vec::new();
    }

    let phone_needle = phone_needle(term);

    records
        .iter()
        .filter(|record| {
            matches(&needles, &record.plate)
                || match (&phone_needle, &record.phone) {
                    (Some(needle), Some(phone)) => filter_phone(phone).contains(needle.as_str()),
                    _ => false,
                }
        })
        .collect()
}

fn phone_needle(term: &str) -> Option<String> {
    let looks_numeric = term
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '+' | '-' | '(' | ')'));
    let digits = filter_phone(term);
    (looks_numeric && !digits.is_empty()).then_some(digits)
}
