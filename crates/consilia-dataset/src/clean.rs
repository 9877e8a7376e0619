//! Text cleaning for raw conversation fields.
//!
//! Cleaning fails closed: empty input comes back as an empty string, never an
//! error. The allow-list keeps word characters, whitespace, and the
//! punctuation set `. , ! ? ; : ( ) - " '`; anything else becomes a space and
//! whitespace runs collapse to single spaces.

use regex::Regex;

/// Reusable text cleaner with pre-compiled patterns.
///
/// Construct once and reuse across rows; compilation is the expensive part.
pub struct TextCleaner {
    whitespace: Regex,
    disallowed: Regex,
}

impl TextCleaner {
    pub fn new() -> Self {
        Self {
            whitespace: Regex::new(r"\s+").unwrap(),
            disallowed: Regex::new(r#"[^\w\s.,!?;:()\-"']"#).unwrap(),
        }
    }

    /// Clean one text field.
    ///
    /// Idempotent: `clean(clean(x)) == clean(x)`. The output never contains
    /// consecutive whitespace, leading/trailing whitespace, or a character
    /// outside the allow-list.
    pub fn clean(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let collapsed = self.whitespace.replace_all(text, " ");
        let allowed = self.disallowed.replace_all(&collapsed, " ");
        let recollapsed = self.whitespace.replace_all(&allowed, " ");

        recollapsed.trim().to_string()
    }
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self::new()
    }
}
