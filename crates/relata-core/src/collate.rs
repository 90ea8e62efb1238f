//! # Collation
//!
//! Locale-aware string ordering for sorted views.
//!
//! Three comparison levels, the way a root-locale collator orders text:
//! 1. base letters, case- and accent-insensitive (`apple` < `Banana`)
//! 2. accents (`resume` < `résumé`)
//! 3. case, lowercase first (`apple` < `Apple`)
//!
//! Only Latin-1 and Latin Extended-A letters are folded to a base letter.
//! Ligatures are not expanded (`æ` is not `ae`) and punctuation carries no
//! reduced weight. Other scripts are lowercased and compared by code point.
//! Text outside those ranges can therefore order differently from a platform
//! locale comparison.

use std::cmp::Ordering;

/// Compare two strings for display ordering.
#[must_use]
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let primary = a
        .chars()
        .flat_map(base_letter)
        .cmp(b.chars().flat_map(base_letter));
    if primary != Ordering::Equal {
        return primary;
    }

    let secondary = a.chars().map(is_accented).cmp(b.chars().map(is_accented));
    if secondary != Ordering::Equal {
        return secondary;
    }

    a.chars()
        .map(char::is_uppercase)
        .cmp(b.chars().map(char::is_uppercase))
}

/// Lowercased letter with its diacritic removed.
fn base_letter(c: char) -> std::char::ToLowercase {
    strip_accent(c).to_lowercase()
}

fn is_accented(c: char) -> bool {
    strip_accent(c) != c
}

/// Latin-1 and Latin Extended-A letters folded to their base letter.
fn strip_accent(c: char) -> char {
    match c {
        'À'..='Å' => 'A',
        'à'..='å' => 'a',
        'Ç' => 'C',
        'ç' => 'c',
        'È'..='Ë' => 'E',
        'è'..='ë' => 'e',
        'Ì'..='Ï' => 'I',
        'ì'..='ï' => 'i',
        'Ñ' => 'N',
        'ñ' => 'n',
        'Ò'..='Ö' | 'Ø' => 'O',
        'ò'..='ö' | 'ø' => 'o',
        'Ù'..='Ü' => 'U',
        'ù'..='ü' => 'u',
        'Ý' => 'Y',
        'ý' | 'ÿ' => 'y',
        'Ā' | 'Ă' | 'Ą' => 'A',
        'ā' | 'ă' | 'ą' => 'a',
        'Ć' | 'Ĉ' | 'Ċ' | 'Č' => 'C',
        'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'Ē' | 'Ĕ' | 'Ė' | 'Ę' | 'Ě' => 'E',
        'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'Ł' => 'L',
        'ł' => 'l',
        'Ń' | 'Ņ' | 'Ň' => 'N',
        'ń' | 'ņ' | 'ň' => 'n',
        'Ś' | 'Ŝ' | 'Ş' | 'Š' => 'S',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'Ź' | 'Ż' | 'Ž' => 'Z',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}

// =============================================================================
// TESTS
// =============================================================================
