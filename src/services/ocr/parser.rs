use regex::Regex;
use std::sync::OnceLock;

use crate::models::config::DigitHeuristics;

/// Everything except digits and `(` is noise
fn noise_pattern() -> Option<&'static Regex> {
    static NOISE: OnceLock<Option<Regex>> = OnceLock::new();
    NOISE.get_or_init(|| Regex::new(r"[^0-9(]").ok()).as_ref()
}

/// Clean raw OCR text into a specimen number.
///
/// Rules run in this exact order, each seeing the output of the previous:
/// 1. drop every character except `0-9` and `(`
/// 2. empty → invalid
/// 3. `paren_fix_len` chars starting with `(` → leading `(` becomes `1`
/// 4. `drop_leading_len` chars → drop the leading char
/// 5. `eight_fix_len` chars starting with `8` → leading `8` becomes `3`
/// 6. parse as integer, failure → invalid
/// 7. must lie in `[min_value, max_value]`
///
/// Applied once per sample. With the default range every valid output has
/// at most five digits, so feeding an output back in returns it unchanged.
pub fn clean_text(text: &str, rules: &DigitHeuristics) -> Option<u32> {
    let mut cleaned = noise_pattern()?.replace_all(text, "").into_owned();

    if cleaned.is_empty() {
        return None;
    }

    if cleaned.len() == rules.paren_fix_len && cleaned.starts_with('(') {
        cleaned.replace_range(..1, "1");
    }

    if cleaned.len() == rules.drop_leading_len {
        cleaned.remove(0);
    }

    if cleaned.len() == rules.eight_fix_len && cleaned.starts_with('8') {
        cleaned.replace_range(..1, "3");
    }

    let number: u32 = cleaned.parse().ok()?;

    if validate_specimen_number(number, rules) {
        Some(number)
    } else {
        None
    }
}

/// Clean with the default label heuristics
pub fn clean_text_default(text: &str) -> Option<u32> {
    clean_text(text, &DigitHeuristics::default())
}

/// Validate number is within the configured specimen range
pub fn validate_specimen_number(number: u32, rules: &DigitHeuristics) -> bool {
    number >= rules.min_value && number <= rules.max_value
}
