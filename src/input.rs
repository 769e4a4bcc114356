//! Keyboard input handling for the plate and phone fields.
//!
//! While typing, the letters and digits fields show their characters
//! separated by single spaces (`"a b c"`). The spacing is only a typing aid:
//! [`compact`] removes it before anything else looks at the value.

use crate::alphabet::AlphabetTable;
use crate::plate::{DerivedPlateView, PlateSegment};
use crate::translit::MAX_LETTERS;

pub const PLATE_DIGITS: usize = 4;
pub const PHONE_DIGITS: usize = 10;

/// Keep only plate-alphabet characters, at most four of them.
pub fn filter_letters(table: &AlphabetTable, raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .filter(|c| table.is_allowed(*c))
        .take(MAX_LETTERS)
        .collect()
}

/// Keep only ASCII digits, at most `max` of them.
pub fn filter_digits(raw: &str, max: usize) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).take(max).collect()
}

pub fn filter_phone(raw: &str) -> String {
    filter_digits(raw, PHONE_DIGITS)
}

pub fn spaced(s: &str) -> String {
    let chars: Vec<String> = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(String::from)
        .collect();
    chars.join(" ")
}

pub fn compact(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Editing state of the plate field on the request forms.
///
/// Used for both new requests and edits of existing ones; the latter start
/// from [`PlateInput::from_stored`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlateInput {
    letters: String,
    digits: String,
    chassis: bool,
    vin: String,
}

impl PlateInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-populate the buffers from a stored plate string.
    pub fn from_stored(stored: &str) -> Self {
        let segment = PlateSegment::parse(stored);
        Self {
            letters: spaced(&segment.letters),
            digits: spaced(&segment.digits),
            chassis: segment.is_chassis,
            vin: segment.vin,
        }
    }

    pub fn set_letters(&mut self, table: &AlphabetTable, raw: &str) {
        self.letters = spaced(&filter_letters(table, raw));
    }

    pub fn set_digits(&mut self, raw: &str) {
        self.digits = spaced(&filter_digits(raw, PLATE_DIGITS));
    }

    pub fn set_chassis(&mut self, chassis: bool) {
        self.chassis = chassis;
    }

    pub fn set_vin(&mut self, raw: &str) {
        self.vin = raw.to_uppercase();
    }

    pub fn letters_buffer(&self) -> &str {
        &self.letters
    }

    pub fn digits_buffer(&self) -> &str {
        &self.digits
    }

    pub fn is_chassis(&self) -> bool {
        self.chassis
    }

    pub fn vin(&self) -> &str {
        &self.vin
    }

    pub fn segment(&self) -> PlateSegment {
        if self.chassis {
            PlateSegment::chassis(&self.vin)
        } else {
            PlateSegment {
                letters: compact(&self.letters),
                digits: compact(&self.digits),
                ..PlateSegment::default()
            }
        }
    }

    pub fn preview(&self, table: &AlphabetTable) -> DerivedPlateView {
        self.segment().derive(table)
    }

    pub fn to_stored(&self, table: &AlphabetTable) -> String {
        self.segment().to_stored(table)
    }
}
