//! Name normalization passes
//!
//! Three composable folds, applied in a fixed order to build hash keys:
//! `lower` (casefold + de-accent), `abbrev` (particle rewriting), `crush`
//! (phonetic fold). `crush_lower` is the canonical composition. Crushed
//! forms are only ever hash keys, never displayed.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Casefold and de-accent a name
///
/// ASCII runs take a fast path. Non-ASCII characters go through NFD with
/// combining marks dropped, so "é" folds to "e". Runs of separators
/// collapse to a single space; `.` counts as alphanumeric so initials like
/// "J." survive.
pub fn lower(s: &str) -> String {
    if s.is_ascii() {
        return lower_ascii(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut pending_sep = false;
    for c in s.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        if c.is_alphanumeric() || c == '.' {
            if pending_sep && !out.is_empty() {
                out.push(' ');
            }
            pending_sep = false;
            for lc in c.to_lowercase() {
                out.push(lc);
            }
        } else {
            pending_sep = true;
        }
    }
    out
}

fn lower_ascii(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_sep = false;
    for c in s.bytes() {
        if c.is_ascii_alphanumeric() || c == b'.' {
            if pending_sep && !out.is_empty() {
                out.push(' ');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase() as char);
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Particle words dropped outright by `abbrev`
const ABBREV_DROP: &[&str] = &["a", "af", "d", "de", "di", "of", "van", "von", "zu", "zur"];

/// Particle words rewritten by `abbrev`
const ABBREV_REWRITE: &[(&str, &str)] = &[("saint", "st"), ("sainte", "ste"), ("ier", "i")];

/// Rewrite the fixed particle table on whole-word matches
///
/// Expects `lower`-normalized input (single-space separated).
pub fn abbrev(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split(' ') {
        let replacement = if ABBREV_DROP.contains(&word) {
            None
        } else if let Some((_, to)) = ABBREV_REWRITE.iter().find(|(from, _)| *from == word) {
            Some(*to)
        } else {
            Some(word)
        };
        if let Some(w) = replacement {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(w);
        }
    }
    out
}

/// Phonetic fold
///
/// Rules, applied per word:
/// - uppercase Roman-numeral tokens are kept verbatim ("XIV" stays "XIV");
/// - a word-initial vowel run becomes 'e', any other vowel run is dropped;
/// - 'h' is dropped, "ph" becomes 'f', 'k' and 'q' become 'c';
/// - a word-final 'z' becomes 's';
/// - spaces between words are dropped.
pub fn crush(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split(' ').filter(|w| !w.is_empty()) {
        if is_roman_number(word) {
            out.push_str(word);
            continue;
        }
        let chars: Vec<char> = word.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if is_vowel(c) {
                if i == 0 {
                    out.push('e');
                }
                while i + 1 < chars.len() && is_vowel(chars[i + 1]) {
                    i += 1;
                }
            } else if c == 'h' {
                // dropped
            } else if c == 'p' && chars.get(i + 1) == Some(&'h') {
                out.push('f');
                i += 1;
            } else if c == 'k' || c == 'q' {
                out.push('c');
            } else if c == 'z' && i == chars.len() - 1 {
                out.push('s');
            } else {
                out.push(c);
            }
            i += 1;
        }
    }
    out
}

/// The canonical hash key function: `crush(abbrev(lower(s)))`
pub fn crush_lower(s: &str) -> String {
    crush(&abbrev(&lower(s)))
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

fn is_roman_number(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| matches!(c, 'I' | 'V' | 'X' | 'L' | 'C' | 'D' | 'M'))
}
