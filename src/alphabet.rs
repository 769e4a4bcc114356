//! The configurable Arabic/Latin plate alphabet.
//!
//! A table is built once from an ordered list of rules and then treated as
//! read-only. When the rules change, build a new table instead of patching
//! the old one.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use unicode_script::{Script, UnicodeScript};

/// Arabic elongation mark (kashida). Settings often store letters such as
/// `هـ` with a trailing tatweel so they render in their joined form.
pub const TATWEEL: char = '\u{0640}';

/// One Arabic letter and the Latin letter stamped next to it on the plate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlateCharacterRule {
    #[serde(alias = "arabicChar")]
    pub arabic: String,
    #[serde(alias = "latinChar")]
    pub latin: String,
}

impl PlateCharacterRule {
    pub fn new(arabic: impl Into<String>, latin: impl Into<String>) -> Self {
        Self {
            arabic: arabic.into(),
            latin: latin.into(),
        }
    }

    /// Arabic side with every tatweel removed.
    pub fn normalized_arabic(&self) -> String {
        strip_tatweel(&self.arabic)
    }

    /// Latin side as it is compared: uppercase.
    pub fn upper_latin(&self) -> String {
        self.latin.to_uppercase()
    }
}

pub fn strip_tatweel(s: &str) -> String {
    s.chars().filter(|c| *c != TATWEEL).collect()
}

/// The 17 letters used on Saudi registration plates.
pub fn default_rules() -> Vec<PlateCharacterRule> {
    [
        ("ا", "A"),
        ("ب", "B"),
        ("ح", "J"),
        ("د", "D"),
        ("ر", "R"),
        ("س", "S"),
        ("ص", "X"),
        ("ط", "T"),
        ("ع", "E"),
        ("ق", "G"),
        ("ك", "K"),
        ("ل", "L"),
        ("م", "Z"),
        ("ن", "N"),
        ("هـ", "H"),
        ("و", "U"),
        ("ى", "V"),
    ]
    .iter()
    .map(|(arabic, latin)| PlateCharacterRule::new(*arabic, *latin))
    .collect()
}

// =============================================================================
// Diagnostics
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Arabic,
    Latin,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Arabic => f.write_str("Arabic"),
            Side::Latin => f.write_str("Latin"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlphabetError {
    #[error("alphabet rules #{first} and #{second} both define Arabic letter `{key}`")]
    DuplicateArabic {
        key: String,
        first: usize,
        second: usize,
    },
    #[error("alphabet rules #{first} and #{second} both define Latin letter `{key}`")]
    DuplicateLatin {
        key: String,
        first: usize,
        second: usize,
    },
}

/// Two rules that normalize to the same key on one side of the table.
/// `first` and `second` are zero-based rule indices; `second` is the rule that
/// wins when the table is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    pub side: Side,
    pub key: String,
    pub first: usize,
    pub second: usize,
}

impl From<Duplicate> for AlphabetError {
    fn from(dup: Duplicate) -> Self {
        match dup.side {
            Side::Arabic => AlphabetError::DuplicateArabic {
                key: dup.key,
                first: dup.first,
                second: dup.second,
            },
            Side::Latin => AlphabetError::DuplicateLatin {
                key: dup.key,
                first: dup.first,
                second: dup.second,
            },
        }
    }
}

/// A rule that is accepted but will not behave as the user probably expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// The side is empty or longer than one character after normalization,
    /// so per-character lookups can never hit it.
    NotSingleChar {
        index: usize,
        side: Side,
        value: String,
    },
    /// The side contains characters from another script.
    WrongScript {
        index: usize,
        side: Side,
        value: String,
    },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::NotSingleChar { index, side, value } => write!(
                f,
                "rule #{}: {} side `{}` is not a single character",
                index, side, value
            ),
            Anomaly::WrongScript { index, side, value } => write!(
                f,
                "rule #{}: {} side `{}` is not written in {} script",
                index, side, value, side
            ),
        }
    }
}

// =============================================================================
// Table
// =============================================================================

/// Outcome of looking a single typed character up in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// The character is an Arabic plate letter.
    Arabic { arabic: char, latin: &'a str },
    /// The uppercased character is a Latin plate letter.
    Latin { arabic: &'a str, latin: char },
    Unmapped,
}

#[derive(Debug, Clone, Default)]
pub struct AlphabetTable {
    rules: Vec<PlateCharacterRule>,
    arabic_to_latin: HashMap<char, String>,
    latin_to_arabic: HashMap<char, String>,
    allowed: HashSet<char>,
}

impl AlphabetTable {
    /// Build both lookup maps. Colliding keys are resolved last-write-wins.
    ///
    /// Lookups are per character, so a rule whose sides are not exactly one
    /// character each after normalization is left out of both maps.
    pub fn build(rules: Vec<PlateCharacterRule>) -> Self {
        let mut arabic_to_latin = HashMap::new();
        let mut latin_to_arabic = HashMap::new();
        let mut allowed = HashSet::new();

        for rule in &rules {
            let arabic = rule.normalized_arabic();
            let upper = rule.upper_latin();
            let lower = rule.latin.to_lowercase();

            for key in [&arabic, &upper, &lower].into_iter().filter_map(|s| single_char(s)) {
                allowed.insert(key);
            }

            // Both sides must be one character or the letter outputs drift apart.
            if let (Some(arabic_key), Some(latin_key), Some(_)) =
                (single_char(&arabic), single_char(&upper), single_char(&rule.latin))
            {
                arabic_to_latin.insert(arabic_key, rule.latin.clone());
                latin_to_arabic.insert(latin_key, arabic);
            }
        }

        Self {
            rules,
            arabic_to_latin,
            latin_to_arabic,
            allowed,
        }
    }

    /// Like [`AlphabetTable::build`] but refuses rule lists with collisions.
    pub fn build_strict(rules: Vec<PlateCharacterRule>) -> Result<Self, AlphabetError> {
        if let Some(dup) = find_duplicates(&rules).into_iter().next() {
            return Err(dup.into());
        }
        Ok(Self::build(rules))
    }

    #[cfg(test)]
    pub fn saudi() -> Self {
        Self::build(default_rules())
    }

    pub fn rules(&self) -> &[PlateCharacterRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `c` may be typed into the letters field.
    pub fn is_allowed(&self, c: char) -> bool {
        self.allowed.contains(&c)
    }

    /// Latin letter (as configured) for an Arabic plate letter.
    pub fn latin_for(&self, arabic: char) -> Option<&str> {
        self.arabic_to_latin.get(&arabic).map(String::as_str)
    }

    /// Arabic letter for a Latin plate letter, in either case.
    pub fn arabic_for(&self, latin: char) -> Option<&str> {
        let upper = upper_char(latin)?;
        self.latin_to_arabic.get(&upper).map(String::as_str)
    }

    /// Resolve a typed character: Arabic first, then uppercased Latin.
    pub fn lookup(&self, c: char) -> Lookup<'_> {
        if let Some(latin) = self.latin_for(c) {
            return Lookup::Arabic { arabic: c, latin };
        }
        match (upper_char(c), self.arabic_for(c)) {
            (Some(latin), Some(arabic)) => Lookup::Latin { arabic, latin },
            _ => Lookup::Unmapped,
        }
    }

    /// Every key collision in the rule list, in rule order.
    pub fn duplicates(&self) -> Vec<Duplicate> {
        find_duplicates(&self.rules)
    }

    pub fn anomalies(&self) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            let arabic = rule.normalized_arabic();
            if single_char(&arabic).is_none() {
                anomalies.push(Anomaly::NotSingleChar {
                    index,
                    side: Side::Arabic,
                    value: rule.arabic.clone(),
                });
            } else if !arabic.chars().all(|c| c.script() == Script::Arabic) {
                anomalies.push(Anomaly::WrongScript {
                    index,
                    side: Side::Arabic,
                    value: rule.arabic.clone(),
                });
            }

            if single_char(&rule.upper_latin()).is_none() {
                anomalies.push(Anomaly::NotSingleChar {
                    index,
                    side: Side::Latin,
                    value: rule.latin.clone(),
                });
            } else if !rule.latin.chars().all(|c| c.script() == Script::Latin) {
                anomalies.push(Anomaly::WrongScript {
                    index,
                    side: Side::Latin,
                    value: rule.latin.clone(),
                });
            }
        }
        anomalies
    }
}

fn find_duplicates(rules: &[PlateCharacterRule]) -> Vec<Duplicate> {
    let mut seen_arabic: HashMap<String, usize> = HashMap::new();
    let mut seen_latin: HashMap<String, usize> = HashMap::new();
    let mut found = Vec::new();

    for (index, rule) in rules.iter().enumerate() {
        let arabic = rule.normalized_arabic();
        if let Some(first) = seen_arabic.insert(arabic.clone(), index) {
            found.push(Duplicate {
                side: Side::Arabic,
                key: arabic,
                first,
                second: index,
            });
        }
        let latin = rule.upper_latin();
        if let Some(first) = seen_latin.insert(latin.clone(), index) {
            found.push(Duplicate {
                side: Side::Latin,
                key: latin,
                first,
                second: index,
            });
        }
    }
    found
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Uppercase a character when that yields exactly one character.
fn upper_char(c: char) -> Option<char> {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => Some(u),
        _ => None,
    }
}
