//! Transliteration between the Arabic and Latin halves of a plate.
//!
//! Every function here takes the alphabet table explicitly and is total:
//! unknown input is dropped or passed through, never rejected.

use crate::alphabet::{AlphabetTable, Lookup};

/// Maximum number of letters on a plate.
pub const MAX_LETTERS: usize = 4;

const ARABIC_INDIC_DIGITS: [char; 10] = ['٠', '١', '٢', '٣', '٤', '٥', '٦', '٧', '٨', '٩'];

/// Derive the Arabic and Latin letter strings from up to four typed letters.
///
/// The input may mix both alphabets. Whitespace is ignored, only the first
/// four remaining characters are considered, and characters the table does
/// not know are dropped from both outputs. The two outputs are index-aligned.
pub fn transliterate_letters(table: &AlphabetTable, input: &str) -> (String, String) {
    let mut arabic = String::new();
    let mut latin = String::new();

    for c in input
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(MAX_LETTERS)
    {
        match table.lookup(c) {
            Lookup::Arabic { arabic: a, latin: l } => {
                arabic.push(a);
                latin.push_str(l);
            }
            Lookup::Latin { arabic: a, latin: l } => {
                arabic.push_str(a);
                latin.push(l);
            }
            Lookup::Unmapped => {}
        }
    }

    (arabic, latin)
}

/// Render ASCII digits as Eastern Arabic-Indic numerals.
/// Whitespace is removed; anything that is not `0`-`9` is kept as is.
pub fn to_arabic_digits(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c.to_digit(10) {
            Some(d) if c.is_ascii_digit() => ARABIC_INDIC_DIGITS[d as usize],
            _ => c,
        })
        .collect()
}

/// Swap every known plate letter in a free-text term to the other alphabet.
///
/// Unlike [`transliterate_letters`] nothing is dropped or capped: unmapped
/// characters, digits and whitespace pass through so the result can still be
/// used as a fuzzy search needle.
pub fn translate_term(table: &AlphabetTable, term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        match table.lookup(c) {
            Lookup::Arabic { latin, .. } => out.push_str(latin),
            Lookup::Latin { arabic, .. } => out.push_str(arabic),
            Lookup::Unmapped => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::PlateCharacterRule;

    fn table() -> AlphabetTable {
        AlphabetTable::saudi()
    }

    #[test]
    fn test_mixed_case_latin_maps_to_arabic() {
        let table = AlphabetTable::build(vec![PlateCharacterRule::new("ط", "X")]);
        let (arabic, latin) = transliterate_letters(&table, "xX");
        assert_eq!(arabic, "طط");
        assert_eq!(latin, "XX");
    }

    #[test]
    fn test_mixed_alphabets() {
        let (arabic, latin) = transliterate_letters(&table(), "طxn");
        assert_eq!(arabic, "طصن");
        assert_eq!(latin, "TXN");
    }

    #[test]
    fn test_unmapped_dropped_and_capped() {
        // Cap applies before dropping: only "a", "?", "b" and "d" are looked at.
        let (arabic, latin) = transliterate_letters(&table(), "a ? b d k");
        assert_eq!(arabic, "ابد");
        assert_eq!(latin, "ABD");

        let (arabic, latin) = transliterate_letters(&table(), "abdkr");
        assert_eq!(arabic.chars().count(), 4);
        assert_eq!(latin, "ABDK");
    }

    #[test]
    fn test_outputs_are_aligned() {
        let table = table();
        for input in ["", "a", "طصن", "TxNب", "zzzz", "9؟ا"] {
            let (arabic, latin) = transliterate_letters(&table, input);
            assert_eq!(arabic.chars().count(), latin.chars().count(), "{input}");
            for (a, l) in arabic.chars().zip(latin.chars()) {
                assert_eq!(table.latin_for(a), Some(l.to_string().as_str()));
                assert_eq!(table.arabic_for(l), Some(a.to_string().as_str()));
            }
        }
    }

    #[test]
    fn test_multichar_rule_does_not_break_alignment() {
        let table = AlphabetTable::build(vec![
            PlateCharacterRule::new("ط", "TT"),
            PlateCharacterRule::new("صن", "X"),
        ]);
        assert_eq!(
            transliterate_letters(&table, "ط"),
            (String::new(), String::new())
        );
        assert_eq!(
            transliterate_letters(&table, "x"),
            (String::new(), String::new())
        );
        assert_eq!(translate_term(&table, "طx"), "طx");
    }

    #[test]
    fn test_round_trip_every_rule() {
        let table = table();
        for rule in table.rules() {
            let arabic = rule.normalized_arabic().repeat(3);
            let (_, latin) = transliterate_letters(&table, &arabic);
            let (back, _) = transliterate_letters(&table, &latin);
            assert_eq!(back, arabic);
        }
    }

    #[test]
    fn test_to_arabic_digits() {
        assert_eq!(to_arabic_digits("1234"), "١٢٣٤");
        assert_eq!(to_arabic_digits("0 9"), "٠٩");
        assert_eq!(to_arabic_digits("1a٣"), "١a٣");
        assert_eq!(to_arabic_digits(""), "");
    }

    #[test]
    fn test_translate_term_keeps_unmapped() {
        assert_eq!(translate_term(&table(), "طصن 12-x"), "TXN 12-ص");
        assert_eq!(translate_term(&table(), "tw?"), "طw?");
    }
}
