//! Text normalization shared by the index and the query side.
//!
//! Both corpus text and queries go through [`tokenize`], so a query typed
//! without diacritics still matches fully vocalized verse text.

use std::collections::HashMap;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const TATWEEL: char = '\u{0640}';
const ALEF_WASLA: char = '\u{0671}';
const ALEF: char = '\u{0627}';

/// Qur'anic annotation signs, small high letters, and the Uthmani small waw
/// and yeh. Some are letters (Lm) rather than combining marks, so they are
/// dropped by range.
fn is_quranic_annotation(c: char) -> bool {
    matches!(c, '\u{06D6}'..='\u{06ED}')
}

/// Normalize text for matching.
///
/// 1. NFD decompose (splits hamza/madda carriers and Latin accents off their base letter)
/// 2. Drop combining marks (harakat, accents), Qur'anic annotation signs, and tatweel
/// 3. Fold alef wasla to bare alef
/// 4. Lowercase
/// 5. Replace everything that is not a letter or digit with a space, collapse whitespace
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c) && !is_quranic_annotation(*c) && *c != TATWEEL)
        .map(|c| if c == ALEF_WASLA { ALEF } else { c })
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into normalized terms, in order of appearance.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Term frequencies for a piece of text.
pub fn term_counts<'a>(texts: impl IntoIterator<Item = &'a str>) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for text in texts {
        for term in tokenize(text) {
            *counts.entry(term).or_insert(0) += 1;
        }
    }
    counts
}
