//! Free-text normalization into comparable tokens.
//!
//! Rules, applied in order:
//! 1. Unicode lowercase
//! 2. anything that is neither a word character nor whitespace becomes a space
//! 3. digits are removed
//! 4. split on whitespace runs, dropping empties
//!
//! Word characters follow the Unicode definition, so letters from any script
//! survive. No stemming, lemmatization or stopword removal is performed.

use regex::Regex;
use std::sync::LazyLock;

static NON_WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid non-word pattern"));

static DIGIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid digit pattern"));

/// Tokenize `text` into lowercase, punctuation-free, digit-free words.
///
/// Duplicates are preserved in order of appearance; repeated words count
/// once per occurrence when scored.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let spaced = NON_WORD_REGEX.replace_all(&lowered, " ");
    let stripped = DIGIT_REGEX.replace_all(&spaced, "");

    stripped
        .split_whitespace()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n\t ").is_empty());
    }

    #[test]
    fn strips_punctuation_and_numbers() {
        assert_eq!(tokenize("Hello, World! 123"), vec!["hello", "world"]);
    }

    #[test]
    fn digits_inside_words_are_removed() {
        assert_eq!(tokenize("covid19 2024-yil"), vec!["covid", "yil"]);
    }

    #[test]
    fn keeps_duplicates_in_order() {
        assert_eq!(
            tokenize("cat dog CAT"),
            vec!["cat", "dog", "cat"]
        );
    }

    #[test]
    fn lowercases_non_ascii_scripts() {
        assert_eq!(tokenize("KITOB Ўзбек Öz"), vec!["kitob", "ўзбек", "öz"]);
    }

    #[test]
    fn apostrophe_splits_words() {
        // ASCII apostrophe is punctuation; the modifier letter ʻ is a letter.
        assert_eq!(tokenize("o'zbek"), vec!["o", "zbek"]);
        assert_eq!(tokenize("oʻzbek"), vec!["oʻzbek"]);
    }

    #[test]
    fn underscore_is_a_word_character() {
        assert_eq!(tokenize("snake_case-name"), vec!["snake_case", "name"]);
    }
}
