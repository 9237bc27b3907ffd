//! Title-casing normalization for artist, album, and track strings.

use std::sync::LazyLock;

use regex::Regex;
use tracing::instrument;

/// Characters that split a string into words. Apostrophes and `&` are
/// deliberately absent: `Can'T` is one word, a lone `&` is left as-is.
const DELIMITERS: [char; 10] = [':', '-', '_', ' ', '/', ',', '(', ')', '[', ']'];

/// Words kept lowercase unless they open the string.
const SMALL_WORDS: [&str; 9] = ["of", "the", "and", "in", "on", "at", "for", "to", "a"];

/// Tokens composed entirely of Roman-numeral letters are never re-cased.
#[allow(clippy::expect_used)]
static ROMAN_NUMERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[IVXLCDM]+$").expect("Roman numeral regex is valid") // Static pattern, safe to panic
});

/// Normalizes raw catalog display text into comparison-safe title case.
///
/// The pass is deterministic, pure, and total: it never fails, and empty or
/// whitespace-only input produces an empty string. Applying it twice gives
/// the same result as applying it once.
///
/// Steps:
/// 1. Fold en/em dashes to `-` and the horizontal ellipsis to `...`.
/// 2. Split into alternating word/delimiter runs over the fixed delimiter
///    set `: - _ space / , ( ) [ ]`, preserving every delimiter character.
/// 3. Re-case each word: Roman-numeral tokens are left untouched; small
///    words (`of`, `the`, ...) are lower-cased unless they are the first
///    word; everything else is lower-cased and then capitalized.
/// 4. Reassemble in original order.
///
/// # Known limitation
///
/// The Roman-numeral skip also exempts the single letter "I", so the English
/// pronoun is never re-cased either ("i want" stays "i Want"). Catalog data
/// does not distinguish the two cases, so this is left as observed behavior.
///
/// # Examples
///
/// ```
/// use tunematch_core::text::normalize;
///
/// assert_eq!(normalize("The Best Of"), "The Best of");
/// assert_eq!(normalize("Some – Dashes"), "Some - Dashes");
/// assert_eq!(normalize("XXI XV:IV, X"), "XXI XV:IV, X");
/// ```
#[must_use]
#[instrument(level = "trace", skip(text), fields(len = text.len()))]
pub fn normalize(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let folded = text.replace(['\u{2013}', '\u{2014}'], "-").replace('\u{2026}', "...");

    let mut output = String::with_capacity(folded.len());
    let mut word = String::new();
    let mut is_first_word = true;

    for ch in folded.chars() {
        if DELIMITERS.contains(&ch) {
            if !word.is_empty() {
                output.push_str(&recase_word(&word, is_first_word));
                is_first_word = false;
                word.clear();
            }
            output.push(ch);
        } else {
            word.push(ch);
        }
    }

    if !word.is_empty() {
        output.push_str(&recase_word(&word, is_first_word));
    }

    output
}

/// Re-cases a single word according to the Roman-numeral and small-word rules.
fn recase_word(word: &str, is_first_word: bool) -> String {
    if ROMAN_NUMERAL.is_match(word) {
        return word.to_string();
    }

    let lowered = word.to_lowercase();

    if !is_first_word && SMALL_WORDS.contains(&lowered.as_str()) {
        return lowered;
    }

    capitalize_first(&lowered)
}

/// Upper-cases the first character, leaving the rest as-is.
fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
