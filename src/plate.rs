//! Plate values: the decomposed segment, its derived bilingual view and the
//! single string a request stores.
//!
//! Stored forms:
//! - standard: `"<arabic letters> <digits>"`, e.g. `"طصن 1234"`
//! - chassis:  `"شاصي <VIN>"`

use serde::Serialize;

use crate::alphabet::AlphabetTable;
use crate::input::{compact, filter_digits, filter_letters, PLATE_DIGITS};
use crate::translit::{to_arabic_digits, transliterate_letters};

/// Marks a stored value as a chassis number ("chassis" in Arabic).
pub const CHASSIS_PREFIX: &str = "شاصي";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlateSegment {
    /// Letters as typed, without normalization.
    pub letters: String,
    pub digits: String,
    pub is_chassis: bool,
    /// Chassis number; empty unless `is_chassis`.
    pub vin: String,
}

impl PlateSegment {
    /// Build a standard segment from raw field input.
    pub fn standard(table: &AlphabetTable, letters: &str, digits: &str) -> Self {
        Self {
            letters: filter_letters(table, letters),
            digits: filter_digits(digits, PLATE_DIGITS),
            ..Self::default()
        }
    }

    pub fn chassis(vin: &str) -> Self {
        Self {
            is_chassis: true,
            vin: vin.to_uppercase(),
            ..Self::default()
        }
    }

    /// Decompose a stored plate string. Never fails: a value without a
    /// trailing all-digit token is read as letters only.
    pub fn parse(stored: &str) -> Self {
        if let Some(rest) = stored.strip_prefix(CHASSIS_PREFIX) {
            return Self {
                is_chassis: true,
                vin: rest.trim_start().to_string(),
                ..Self::default()
            };
        }

        let tokens: Vec<&str> = stored.split_whitespace().collect();
        let digits_at = tokens
            .iter()
            .rposition(|t| t.chars().all(|c| c.is_ascii_digit()));

        let mut letters = String::new();
        let mut digits = String::new();
        for (i, token) in tokens.iter().enumerate() {
            if Some(i) == digits_at {
                digits.push_str(token);
            } else {
                letters.push_str(token);
            }
        }

        Self {
            letters,
            digits,
            ..Self::default()
        }
    }

    /// The string persisted on the request.
    pub fn to_stored(&self, table: &AlphabetTable) -> String {
        if self.is_chassis {
            return format!("{} {}", CHASSIS_PREFIX, self.vin);
        }
        let (arabic, _) = transliterate_letters(table, &self.letters);
        format!("{} {}", arabic, compact(&self.digits))
    }

    pub fn derive(&self, table: &AlphabetTable) -> DerivedPlateView {
        DerivedPlateView::derive(table, self)
    }
}

/// Both halves of a plate, computed on demand and never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivedPlateView {
    pub arabic_letters: String,
    /// Same order as `arabic_letters`. See [`DerivedPlateView::latin_display`].
    pub latin_letters: String,
    pub arabic_digits: String,
    pub latin_digits: String,
}

impl DerivedPlateView {
    pub fn derive(table: &AlphabetTable, segment: &PlateSegment) -> Self {
        let (arabic_letters, latin_letters) = transliterate_letters(table, &segment.letters);
        let latin_digits = compact(&segment.digits);
        Self {
            arabic_letters,
            latin_letters,
            arabic_digits: to_arabic_digits(&latin_digits),
            latin_digits,
        }
    }

    /// Latin letters as printed on the plate: mirrored against the
    /// right-to-left Arabic half.
    pub fn latin_display(&self) -> String {
        self.latin_letters.chars().rev().collect()
    }

    /// One-line rendering used in request lists and headers.
    pub fn badge(&self) -> String {
        format!(
            "{} {} | {} {}",
            self.arabic_letters,
            self.arabic_digits,
            self.latin_digits,
            self.latin_display()
        )
    }

    pub fn is_empty(&self) -> bool {
        self.arabic_letters.is_empty() && self.latin_digits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_stored_standard() {
        let table = AlphabetTable::saudi();
        let segment = PlateSegment::standard(&table, "t x n", "1 2 3 4");
        assert_eq!(segment.to_stored(&table), "طصن 1234");

        let segment = PlateSegment::standard(&table, "طصن", "1234");
        assert_eq!(segment.to_stored(&table), "طصن 1234");
    }

    #[test]
    fn test_standard_clamps_input() {
        let table = AlphabetTable::saudi();
        let segment = PlateSegment::standard(&table, "a w b d k r", "123456");
        assert_eq!(segment.letters, "abdk");
        assert_eq!(segment.digits, "1234");
    }

    #[test]
    fn test_parse_standard() {
        let segment = PlateSegment::parse("طصن 1234");
        assert_eq!(segment.letters, "طصن");
        assert_eq!(segment.digits, "1234");
        assert!(!segment.is_chassis);
    }

    #[test]
    fn test_parse_spaced_and_legacy_values() {
        let segment = PlateSegment::parse("ط ص ن 1234");
        assert_eq!(segment.letters, "طصن");
        assert_eq!(segment.digits, "1234");

        // Last all-digit token wins; earlier ones are folded into the letters.
        let segment = PlateSegment::parse("12 طص 34");
        assert_eq!(segment.letters, "12طص");
        assert_eq!(segment.digits, "34");
    }

    #[test]
    fn test_parse_without_digits_is_all_letters() {
        let segment = PlateSegment::parse("طصن12");
        assert_eq!(segment.letters, "طصن12");
        assert_eq!(segment.digits, "");

        let segment = PlateSegment::parse("");
        assert_eq!(segment, PlateSegment::default());
    }

    #[test]
    fn test_standard_round_trip() {
        let table = AlphabetTable::saudi();
        for (letters, digits) in [("طصن", "1234"), ("", "7"), ("ابدك", "0001"), ("هـ", "12")] {
            let stored = PlateSegment::standard(&table, letters, digits).to_stored(&table);
            let parsed = PlateSegment::parse(&stored);
            assert_eq!(parsed.letters, crate::alphabet::strip_tatweel(letters));
            assert_eq!(parsed.digits, digits);
        }
    }

    #[test]
    fn test_chassis_round_trip() {
        let table = AlphabetTable::saudi();
        let stored = PlateSegment::chassis("1N4AL11D75C109151").to_stored(&table);
        assert_eq!(stored, "شاصي 1N4AL11D75C109151");

        let parsed = PlateSegment::parse(&stored);
        assert!(parsed.is_chassis);
        assert_eq!(parsed.vin, "1N4AL11D75C109151");
    }

    #[test]
    fn test_parse_chassis_without_space() {
        let parsed = PlateSegment::parse("شاصي JH4DC4350NS000129");
        assert!(parsed.is_chassis);
        assert_eq!(parsed.vin, "JH4DC4350NS000129");

        let parsed = PlateSegment::parse("شاصيJH4DC4350NS000129");
        assert!(parsed.is_chassis);
        assert_eq!(parsed.vin, "JH4DC4350NS000129");
    }

    #[test]
    fn test_derive_view() {
        let table = AlphabetTable::saudi();
        let view = PlateSegment::standard(&table, "tXن", "1234").derive(&table);
        assert_eq!(view.arabic_letters, "طصن");
        assert_eq!(view.latin_letters, "TXN");
        assert_eq!(view.latin_display(), "NXT");
        assert_eq!(view.arabic_digits, "١٢٣٤");
        assert_eq!(view.latin_digits, "1234");
        assert_eq!(view.badge(), "طصن ١٢٣٤ | 1234 NXT");
    }
}
