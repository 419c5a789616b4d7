//! Text normalization for Persian social media posts
//!
//! [`TextCleaner`] strips the artifacts that dominate channel posts (links,
//! markup, emoji, numbers) and folds Arabic letter variants into their
//! Persian forms, so downstream analysis sees one spelling per word.

use regex::Regex;

use crate::error::{Error, Result};

/// Arabic-script diacritics (fathatan through sukun)
const DIACRITICS: std::ops::RangeInclusive<char> = '\u{064B}'..='\u{0652}';

/// Arabic tatweel (kashida), used purely for elongation
const TATWEEL: char = '\u{0640}';

/// Cleans and normalizes message text
///
/// Construct once and reuse; the patterns are compiled in [`TextCleaner::new`].
#[derive(Clone, Debug)]
pub struct TextCleaner {
    urls: Regex,
    html_tags: Regex,
    symbols: Regex,
    digits: Regex,
    whitespace: Regex,
}

impl TextCleaner {
    /// Compile the cleaning patterns
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| Error::Other(format!("invalid cleaning pattern '{pattern}': {e}")))
        };

        Ok(Self {
            urls: compile(r"https?\S+|www\S+")?,
            html_tags: compile(r"<.*?>")?,
            // Anything that is not a word character, whitespace or Arabic script
            symbols: compile(r"[^\w\s\x{0600}-\x{06FF}]+")?,
            digits: compile(r"\d+")?,
            whitespace: compile(r"\s+")?,
        })
    }

    /// Clean one message body
    ///
    /// ```
    /// use channel_harvest::preprocess::TextCleaner;
    ///
    /// let cleaner = TextCleaner::new().unwrap();
    /// assert_eq!(
    ///     cleaner.clean_text("خبر فوری!! https://t.me/x <b>۱۲ كشته</b>"),
    ///     "خبر فوری کشته"
    /// );
    /// ```
    pub fn clean_text(&self, text: &str) -> String {
        let text = self.urls.replace_all(text, "");
        let text = self.html_tags.replace_all(&text, "");
        let text = self.symbols.replace_all(&text, " ");
        let text = self.digits.replace_all(&text, "");
        let text = self.whitespace.replace_all(&text, " ");
        normalize_persian(text.trim())
    }

    /// Trim a flattened reactions field
    pub fn clean_reactions(&self, reactions: &str) -> String {
        reactions.trim().to_string()
    }
}

/// Fold Arabic letter variants into Persian and drop decorations
pub fn normalize_persian(text: &str) -> String {
    text.chars()
        .filter(|c| *c != TATWEEL && !DIACRITICS.contains(c))
        .map(|c| match c {
            'ي' | 'ى' => 'ی',
            'ك' => 'ک',
            other => other,
        })
        .collect()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn cleaner() -> TextCleaner {
        TextCleaner::new().unwrap()
    }

    #[test]
    fn removes_urls() {
        assert_eq!(
            cleaner().clean_text("see https://example.com/a?b=1 and www.example.org now"),
            "see and now"
        );
    }

    #[test]
    fn removes_html_tags() {
        assert_eq!(cleaner().clean_text("<p>hello <i>world</i></p>"), "hello world");
    }

    #[test]
    fn removes_emoji_and_punctuation() {
        assert_eq!(cleaner().clean_text("wow!!! 🔥🔥 ok?"), "wow ok");
    }

    #[test]
    fn removes_latin_and_persian_digits() {
        assert_eq!(cleaner().clean_text("year 2024 سال ۱۴۰۳"), "year سال");
    }

    #[test]
    fn collapses_whitespace_and_newlines() {
        assert_eq!(cleaner().clean_text("  a \n\n b\t c  "), "a b c");
    }

    #[test]
    fn folds_arabic_letters_into_persian() {
        assert_eq!(normalize_persian("كتاب علي"), "کتاب علی");
        assert_eq!(normalize_persian("مـــرد"), "مرد");
        assert_eq!(normalize_persian("کِتاب"), "کتاب");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(cleaner().clean_text(""), "");
        assert_eq!(cleaner().clean_reactions("   "), "");
    }

    #[test]
    fn clean_reactions_trims() {
        assert_eq!(cleaner().clean_reactions(" 👍:3, ❤:1 "), "👍:3, ❤:1");
    }
}
