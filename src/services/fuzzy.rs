//! Approximate string comparison for course codes, sections and place names.
//!
//! Both sides are normalized (trimmed, lowercased, inner whitespace collapsed)
//! and compared with a Levenshtein-derived similarity in `0..=100`. Equal
//! normalized strings score exactly 100; anything else is rounded down, so a
//! fuzzy pair can never tie with an exact one.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FuzzyError {
    #[error("Cannot compare an empty value")]
    EmptyInput,

    #[error("Value '{0}' contains unsupported characters")]
    Malformed(String),
}

pub const DEFAULT_THRESHOLD: u8 = 80;

/// Similarity scorer with a pass/fail threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyMatcher {
    threshold: u8,
}

impl FuzzyMatcher {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold: threshold.min(100),
        }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn score(&self, a: &str, b: &str) -> Result<u8, FuzzyError> {
        similarity(a, b)
    }

    /// Scores the pair and returns the score only when it reaches the threshold.
    pub fn matching_score(&self, a: &str, b: &str) -> Result<Option<u8>, FuzzyError> {
        let score = similarity(a, b)?;
        Ok((score >= self.threshold).then_some(score))
    }

    pub fn is_match(&self, a: &str, b: &str) -> Result<bool, FuzzyError> {
        Ok(self.matching_score(a, b)?.is_some())
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

pub fn normalize(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn normalize_checked(input: &str) -> Result<String, FuzzyError> {
    if input.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        return Err(FuzzyError::Malformed(input.escape_debug().to_string()));
    }

    let normalized = normalize(input);
    if normalized.is_empty() {
        return Err(FuzzyError::EmptyInput);
    }
    Ok(normalized)
}

pub fn similarity(a: &str, b: &str) -> Result<u8, FuzzyError> {
    let a = normalize_checked(a)?;
    let b = normalize_checked(b)?;

    if a == b {
        return Ok(100);
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    let distance = levenshtein(&a, &b);

    // Strictly below 100 whenever distance > 0
    let score = ((longest - distance) * 100) / longest;
    Ok(score.min(99) as u8)
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_after_normalization_scores_100() {
        let pairs = [
            ("CSE321", "cse321"),
            ("  Dhanmondi ", "dhanmondi"),
            ("Mirpur   10", "mirpur 10"),
            ("UIU", "uiu"),
            ("a", "A"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), Ok(100), "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn test_near_misses_score_below_100() {
        let score = similarity("Dhanmondi", "Dhanmondy").unwrap_or_default();
        assert!(score >= 80 && score < 100, "score was {score}");

        // One edit in a long string must still not round up to an exact match
        let long_a = "a".repeat(300);
        let long_b = format!("{}b", "a".repeat(299));
        assert_eq!(similarity(&long_a, &long_b), Ok(99));
    }

    #[test]
    fn test_unrelated_values_score_low() {
        assert_eq!(similarity("A", "B"), Ok(0));
        assert!(similarity("Uttara", "Mohammadpur").unwrap_or(100) < 50);
    }

    #[test]
    fn test_empty_and_malformed_input_is_rejected() {
        assert_eq!(similarity("", "cse321"), Err(FuzzyError::EmptyInput));
        assert_eq!(similarity("cse321", "   "), Err(FuzzyError::EmptyInput));
        assert!(matches!(similarity("cse\u{0}321", "cse321"), Err(FuzzyError::Malformed(_))));
    }

    #[test]
    fn test_threshold_decides_match() {
        let matcher = FuzzyMatcher::new(90);
        assert_eq!(matcher.is_match("CSE321", "cse 321"), Ok(false));
        assert_eq!(matcher.is_match("CSE321", "CSE321"), Ok(true));

        let lenient = FuzzyMatcher::default();
        assert_eq!(lenient.threshold(), 80);
        assert_eq!(lenient.is_match("CSE321", "cse 321"), Ok(true));
    }

    #[test]
    fn test_levenshtein_distance() {
        let kitten: Vec<char> = "kitten".chars().collect();
        let sitting: Vec<char> = "sitting".chars().collect();
        assert_eq!(levenshtein(&kitten, &sitting), 3);
        assert_eq!(levenshtein(&[], &sitting), 7);
    }
}
