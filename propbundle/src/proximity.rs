//! Similarity measures between two values, in `0.0..=1.0`.

use serde::{Deserialize, Serialize};

/// Measures how close two strings are; `1.0` means identical.
pub trait ProximityAnalyzer {
    fn analyse(&self, first: &str, second: &str) -> f64;
}

/// Share of words of the first value that also occur in the second.
///
/// Each word of the second value can be matched once. The count is divided by
/// the larger of the two word counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCountAnalyzer;

impl ProximityAnalyzer for WordCountAnalyzer {
    fn analyse(&self, first: &str, second: &str) -> f64 {
        let first_words: Vec<&str> = first.split_whitespace().collect();
        let mut second_words: Vec<&str> = second.split_whitespace().collect();
        let max_words = first_words.len().max(second_words.len());
        if max_words == 0 {
            return 0.0;
        }

        let mut matches = 0;
        for word in first_words {
            if let Some(position) = second_words.iter().position(|other| *other == word) {
                second_words.swap_remove(position);
                matches += 1;
            }
        }
        matches as f64 / max_words as f64
    }
}

/// `1 - distance / max(len1, len2)` over the Levenshtein edit distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinAnalyzer;

impl LevenshteinAnalyzer {
    pub fn distance(first: &str, second: &str) -> usize {
        let second: Vec<char> = second.chars().collect();
        let mut previous: Vec<usize> = (0..=second.len()).collect();
        let mut current = vec![0; second.len() + 1];

        for (i, a) in first.chars().enumerate() {
            current[0] = i + 1;
            for (j, b) in second.iter().enumerate() {
                let substitution = previous[j] + usize::from(a != *b);
                current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
            }
            std::mem::swap(&mut previous, &mut current);
        }
        previous[second.len()]
    }
}

impl ProximityAnalyzer for LevenshteinAnalyzer {
    fn analyse(&self, first: &str, second: &str) -> f64 {
        let longest = first.chars().count().max(second.chars().count());
        if longest == 0 {
            return 1.0;
        }
        1.0 - Self::distance(first, second) as f64 / longest as f64
    }
}

/// Selectable similarity measure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityAlgorithm {
    #[default]
    WordCount,
    Levenshtein,
}

impl SimilarityAlgorithm {
    pub fn analyzer(&self) -> Box<dyn ProximityAnalyzer> {
        match self {
            SimilarityAlgorithm::WordCount => Box::new(WordCountAnalyzer),
            SimilarityAlgorithm::Levenshtein => Box::new(LevenshteinAnalyzer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_word_count() {
        let analyzer = WordCountAnalyzer;
        assert!(close(analyzer.analyse("the quick fox", "the quick dog"), 2.0 / 3.0));
        assert!(close(analyzer.analyse("a b", "a b c d"), 0.5));
        assert!(close(analyzer.analyse("", ""), 0.0));
        assert!(close(analyzer.analyse("same words", "words same"), 1.0));
    }

    #[test]
    fn test_word_count_consumes_matches() {
        assert!(close(WordCountAnalyzer.analyse("go go go", "go"), 1.0 / 3.0));
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(LevenshteinAnalyzer::distance("kitten", "sitting"), 3);
        assert_eq!(LevenshteinAnalyzer::distance("", "abc"), 3);
        assert_eq!(LevenshteinAnalyzer::distance("café", "cafe"), 1);
        assert!(close(LevenshteinAnalyzer.analyse("kitten", "sitting"), 1.0 - 3.0 / 7.0));
        assert!(close(LevenshteinAnalyzer.analyse("", ""), 1.0));
    }

    #[test]
    fn test_algorithm_selection() {
        let analyzer = SimilarityAlgorithm::Levenshtein.analyzer();
        assert!(close(analyzer.analyse("abc", "abd"), 2.0 / 3.0));
        assert_eq!(SimilarityAlgorithm::default(), SimilarityAlgorithm::WordCount);
    }
}
