use crate::dictionary::Dictionary;
use crate::tokenizer::tokenize;
use crate::types::*;
use std::collections::HashMap;
use tracing::debug;

/// Lowercased keyword -> score contributions, built once per classification.
///
/// Each contribution is stored against the score-map slot of its category,
/// so scoring a token is a single hash lookup followed by direct additions.
pub struct KeywordIndex {
    contributions: HashMap<String, Vec<(usize, f64)>>,
    skipped_rows: usize,
}

impl KeywordIndex {
    /// Rows whose category is not in `scores` are left out.
    pub fn build(keywords: &[KeywordWeight], scores: &ScoreMap) -> Self {
        let slots: HashMap<CategoryId, usize> = scores
            .ids()
            .enumerate()
            .map(|(slot, id)| (id, slot))
            .collect();

        let mut contributions: HashMap<String, Vec<(usize, f64)>> = HashMap::new();
        let mut skipped_rows = 0;
        for keyword in keywords {
            match slots.get(&keyword.category_id) {
                Some(&slot) => contributions
                    .entry(keyword.key.to_lowercase())
                    .or_default()
                    .push((slot, keyword.percent)),
                None => skipped_rows += 1,
            }
        }

        Self {
            contributions,
            skipped_rows,
        }
    }

    pub fn lookup(&self, token: &str) -> &[(usize, f64)] {
        self.contributions
            .get(token)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn distinct_keys(&self) -> usize {
        self.contributions.len()
    }

    /// Rows dropped because they referenced an unknown category.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

/// Rule-based keyword classifier.
///
/// Scores are the sum of `percent` over every (token, matching row) pair;
/// the highest-scoring category wins, earliest in table order on ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify<S: AsRef<str>>(
        &self,
        tokens: &[S],
        categories: &[Category],
        keywords: &[KeywordWeight],
    ) -> ClassificationResult {
        let mut scores = ScoreMap::zeroed(categories.iter().map(|c| c.id));
        let index = KeywordIndex::build(keywords, &scores);

        let mut matched = 0usize;
        for token in tokens {
            let hits = index.lookup(&token.as_ref().to_lowercase());
            matched += hits.len();
            for &(slot, percent) in hits {
                scores.add_at(slot, percent);
            }
        }

        debug!(
            tokens = tokens.len(),
            categories = scores.len(),
            distinct_keys = index.distinct_keys(),
            skipped_rows = index.skipped_rows(),
            matched,
            "scored token sequence"
        );

        Self::decide(categories, scores)
    }

    /// Tokenize `text` and classify it against `dictionary`.
    pub fn classify_text(&self, text: &str, dictionary: &Dictionary) -> ClassificationResult {
        let tokens = tokenize(text);
        self.classify(&tokens, &dictionary.categories, &dictionary.keywords)
    }

    fn decide(categories: &[Category], scores: ScoreMap) -> ClassificationResult {
        let winner = if scores.all_zero() { None } else { scores.best() };

        let (predicted_category, confidence) = match winner {
            Some((id, score)) => {
                let name = categories
                    .iter()
                    .find(|c| c.id == id)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string());
                (name, score)
            }
            None => (UNKNOWN_CATEGORY.to_string(), 0.0),
        };

        ClassificationResult {
            predicted_category,
            confidence,
            all_scores: scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animals() -> (Vec<Category>, Vec<KeywordWeight>) {
        (
            vec![Category::new(1, "A"), Category::new(2, "B")],
            vec![KeywordWeight::new("cat", 0.8, 1), KeywordWeight::new("dog", 0.3, 2)],
        )
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn accumulates_repeated_tokens() {
        let (categories, keywords) = animals();
        let tokens = tokenize("I love my cat and my dog, the cat is nice");
        let result = KeywordClassifier::new().classify(&tokens, &categories, &keywords);

        assert_eq!(result.predicted_category, "A");
        assert_close(result.confidence, 1.6);
        assert_close(result.all_scores.get(1).unwrap(), 1.6);
        assert_close(result.all_scores.get(2).unwrap(), 0.3);
    }

    #[test]
    fn no_matches_yields_unknown() {
        let (categories, keywords) = animals();
        let result = KeywordClassifier::new().classify(&["fish"], &categories, &keywords);

        assert!(result.is_unknown());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.all_scores.len(), 2);
    }

    #[test]
    fn empty_tables_yield_unknown() {
        let result = KeywordClassifier::new().classify(&["cat"], &[], &[]);
        assert!(result.is_unknown());
        assert_eq!(result.confidence, 0.0);
        assert!(result.all_scores.is_empty());
    }

    #[test]
    fn every_category_appears_in_scores() {
        let categories = vec![
            Category::new(10, "x"),
            Category::new(20, "y"),
            Category::new(30, "z"),
        ];
        let result = KeywordClassifier::new().classify(&["a"], &categories, &[]);
        assert_eq!(result.all_scores.ids().collect::<Vec<_>>(), vec![10, 20, 30]);
    }

    #[test]
    fn duplicate_rows_are_additive() {
        let categories = vec![Category::new(1, "A")];
        let keywords = vec![KeywordWeight::new("x", 0.5, 1), KeywordWeight::new("x", 0.5, 1)];
        let result = KeywordClassifier::new().classify(&["x"], &categories, &keywords);
        assert_close(result.all_scores.get(1).unwrap(), 1.0);
    }

    #[test]
    fn one_token_can_feed_several_categories() {
        let (categories, _) = animals();
        let keywords = vec![KeywordWeight::new("pet", 0.2, 1), KeywordWeight::new("pet", 0.7, 2)];
        let result = KeywordClassifier::new().classify(&["pet"], &categories, &keywords);
        assert_eq!(result.predicted_category, "B");
        assert_close(result.all_scores.get(1).unwrap(), 0.2);
    }

    #[test]
    fn matching_ignores_case_on_both_sides() {
        let categories = vec![Category::new(1, "Books")];
        let keywords = vec![KeywordWeight::new("Kitob", 1.0, 1)];
        let tokens = tokenize("KITOB");
        let result = KeywordClassifier::new().classify(&tokens, &categories, &keywords);
        assert_eq!(result.predicted_category, "Books");

        let raw = KeywordClassifier::new().classify(&["KiToB"], &categories, &keywords);
        assert_eq!(raw.predicted_category, "Books");
    }

    #[test]
    fn no_substring_matching() {
        let categories = vec![Category::new(1, "A")];
        let keywords = vec![KeywordWeight::new("cat", 1.0, 1)];
        let result = KeywordClassifier::new().classify(&["category", "cats"], &categories, &keywords);
        assert!(result.is_unknown());
    }

    #[test]
    fn tie_goes_to_first_category_in_table_order() {
        let categories = vec![Category::new(2, "second-id"), Category::new(1, "first-id")];
        let keywords = vec![KeywordWeight::new("a", 1.0, 1), KeywordWeight::new("b", 1.0, 2)];
        let result = KeywordClassifier::new().classify(&["a", "b"], &categories, &keywords);
        assert_eq!(result.predicted_category, "second-id");
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn unknown_category_rows_are_ignored() {
        let categories = vec![Category::new(1, "A")];
        let keywords = vec![KeywordWeight::new("cat", 5.0, 42)];
        let scores = ScoreMap::zeroed([1]);
        let index = KeywordIndex::build(&keywords, &scores);
        assert_eq!(index.skipped_rows(), 1);

        let result = KeywordClassifier::new().classify(&["cat"], &categories, &keywords);
        assert!(result.is_unknown());
    }

    #[test]
    fn classify_text_tokenizes_first() {
        let (categories, keywords) = animals();
        let dictionary = Dictionary::new(categories, keywords);
        let result = KeywordClassifier::new().classify_text("Dog! DOG? 42 dogs", &dictionary);
        assert_eq!(result.predicted_category, "B");
        assert_close(result.confidence, 0.6);
    }
}
