//! Channel similarity scoring
//!
//! Scores two *normalized* channel names on a 0-100 scale. Two independent
//! measures are computed and the higher one wins:
//!
//! - character overlap: the share of characters covered by recursively taking
//!   the longest common substring of both names
//! - edit similarity: `(1 - levenshtein / max_len) * 100`
//!
//! Numbered CCTV channels are special-cased. `cctv1` and `cctv11` share most of
//! their characters but are unrelated channels, so two CCTV keys only score
//! high when their numbers are identical.

use regex::Regex;
use std::sync::OnceLock;

/// Score awarded to two numbered CCTV keys with different numbers
pub const CCTV_MISMATCH_SCORE: u8 = 30;

fn cctv_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^cctv(\d+)$").expect("static CCTV key pattern is valid"))
}

/// Channel number of a normalized `cctv<digits>` key
pub fn cctv_number(normalized: &str) -> Option<&str> {
    cctv_key_regex()
        .captures(normalized)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// True when both keys are numbered CCTV channels with the same number
pub fn same_cctv_channel(a: &str, b: &str) -> bool {
    matches!((cctv_number(a), cctv_number(b)), (Some(x), Some(y)) if x == y)
}

/// Match score between two normalized names, within 0..=100
pub fn similarity_score(a: &str, b: &str) -> u8 {
    if a == b {
        return 100;
    }

    if let (Some(x), Some(y)) = (cctv_number(a), cctv_number(b)) {
        return if x == y { 100 } else { CCTV_MISMATCH_SCORE };
    }

    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let best = overlap_percent(&a_chars, &b_chars).max(levenshtein_percent(&a_chars, &b_chars));
    best.round().clamp(0.0, 100.0) as u8
}

/// Percentage of characters shared by both names
fn overlap_percent(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let common = common_char_count(a, b);
    (common * 2) as f64 * 100.0 / total as f64
}

/// Greedy longest-common-substring count: take the longest shared run, then
/// recurse into the pieces to its left and to its right.
fn common_char_count(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut best_len = 0;
    let mut best_a = 0;
    let mut best_b = 0;
    for i in 0..a.len() {
        for j in 0..b.len() {
            let run = a[i..]
                .iter()
                .zip(&b[j..])
                .take_while(|(x, y)| x == y)
                .count();
            if run > best_len {
                best_len = run;
                best_a = i;
                best_b = j;
            }
        }
    }

    if best_len == 0 {
        return 0;
    }

    best_len
        + common_char_count(&a[..best_a], &b[..best_b])
        + common_char_count(&a[best_a + best_len..], &b[best_b + best_len..])
}

/// Edit-distance similarity as a percentage of the longer name
fn levenshtein_percent(a: &[char], b: &[char]) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 100.0;
    }
    let distance = levenshtein_distance(a, b);
    (1.0 - distance as f64 / max_len as f64) * 100.0
}

/// Levenshtein distance calculation
fn levenshtein_distance(s1: &[char], s2: &[char]) -> usize {
    let len1 = s1.len();
    let len2 = s2.len();

    let mut matrix = vec![vec![0; len2 + 1]; len1 + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=len2 {
        matrix[0][j] = j;
    }

    for i in 1..=len1 {
        for j in 1..=len2 {
            let cost = if s1[i - 1] == s2[j - 1] { 0 } else { 1 };
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[len1][len2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::channel_name::normalize_channel_name;
    use proptest::prelude::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_exact_match_scores_100() {
        assert_eq!(similarity_score("湖南卫视", "湖南卫视"), 100);
        assert_eq!(similarity_score("", ""), 100);
    }

    #[test]
    fn test_cctv_numbers() {
        assert_eq!(similarity_score("cctv5", "cctv5"), 100);
        assert_eq!(similarity_score("cctv1", "cctv11"), 30);
        assert_eq!(similarity_score("cctv11", "cctv1"), 30);
        assert_eq!(similarity_score("cctv01", "cctv1"), CCTV_MISMATCH_SCORE);
    }

    #[test]
    fn test_cctv_helpers() {
        assert_eq!(cctv_number("cctv13"), Some("13"));
        assert_eq!(cctv_number("cctv5plus"), None);
        assert_eq!(cctv_number("湖南卫视"), None);
        assert!(same_cctv_channel("cctv5", "cctv5"));
        assert!(!same_cctv_channel("cctv5", "cctv15"));
        assert!(!same_cctv_channel("cctv5", "湖南卫视"));
    }

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance(&chars("kitten"), &chars("sitting")), 3);
        assert_eq!(levenshtein_distance(&chars(""), &chars("abc")), 3);
        assert_eq!(levenshtein_distance(&chars("湖南卫视"), &chars("湖北卫视")), 1);
    }

    #[test]
    fn test_common_char_count() {
        assert_eq!(common_char_count(&chars("World"), &chars("Word")), 4);
        assert_eq!(common_char_count(&chars("湖南"), &chars("湖南卫视")), 2);
        assert_eq!(common_char_count(&chars("abc"), &chars("xyz")), 0);
    }

    #[test]
    fn test_score_takes_better_measure() {
        // overlap: 2 * 2 * 100 / 6 = 66.7, edit: (1 - 2/4) * 100 = 50
        assert_eq!(similarity_score("湖南", "湖南卫视"), 67);
        // edit distance 1 over 4 characters
        assert_eq!(similarity_score("湖南卫视", "湖北卫视"), 75);
    }

    #[test]
    fn test_unrelated_names_score_low() {
        assert_eq!(similarity_score("abc", "xyz"), 0);
        assert_eq!(similarity_score("", "cctv1"), 0);
        assert!(similarity_score("湖南卫视", "cctv1") < 50);
    }

    proptest! {
        #[test]
        fn prop_self_score_is_100(raw in "\\PC{0,16}") {
            let key = normalize_channel_name(&raw);
            prop_assert_eq!(similarity_score(&key, &key), 100);
        }

        #[test]
        fn prop_score_is_bounded(a in "\\PC{0,12}", b in "\\PC{0,12}") {
            prop_assert!(similarity_score(&a, &b) <= 100);
        }
    }
}
