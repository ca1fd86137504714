//! Cheap similarity checks tuned for OCR noise.
//!
//! - Bounded edit distance: a single-pass walk that gives up as soon as the
//!   tolerance is exceeded.
//! - Phonetic key: consonant skeleton of the name, compared with the same
//!   bounded walk.

/// Maximum number of single-character edits tolerated between two names.
pub const EDIT_TOLERANCE: usize = 1;

/// Number of consonants kept in a phonetic key.
pub const PHONETIC_KEY_LEN: usize = 4;

/// Shortest phonetic key that may be compared.
pub const MIN_PHONETIC_KEY_LEN: usize = 3;

/// Check whether `a` and `b` are equal or one substitution, insertion or
/// deletion apart.
pub fn within_one_edit(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > EDIT_TOLERANCE {
        return false;
    }

    let (mut i, mut j, mut edits) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            i += 1;
            j += 1;
            continue;
        }

        edits += 1;
        if edits > EDIT_TOLERANCE {
            return false;
        }

        // Skip the extra character in the longer string, or substitute.
        if a.len() > b.len() {
            i += 1;
        } else if b.len() > a.len() {
            j += 1;
        } else {
            i += 1;
            j += 1;
        }
    }

    if i < a.len() || j < b.len() {
        edits += 1;
    }

    edits <= EDIT_TOLERANCE
}

/// Reduce a name to its consonant skeleton: lowercase, vowels and
/// non-letters dropped, truncated to [`PHONETIC_KEY_LEN`] characters.
pub fn phonetic_reduce(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() && !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
        .take(PHONETIC_KEY_LEN)
        .collect()
}

/// Compare two names by their phonetic keys.
///
/// Both keys must be at least [`MIN_PHONETIC_KEY_LEN`] long; short keys carry
/// too little signal to compare.
pub fn phonetic_match(a: &str, b: &str) -> bool {
    let key_a = phonetic_reduce(a);
    let key_b = phonetic_reduce(b);

    key_a.len() >= MIN_PHONETIC_KEY_LEN
        && key_b.len() >= MIN_PHONETIC_KEY_LEN
        && within_one_edit(&key_a, &key_b)
}
