// src/matching/similarity.rs
//! Fuzzy string similarity on a 0-100 integer scale.
//!
//! All three metrics are built on the same matching-block similarity
//! (`2 * matched / total characters`), computed over Unicode scalar values.
//! Scores are rounded half-to-even.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::models::FieldValue;

/// Window similarity above which a partial match counts as exact.
const PARTIAL_EXACT_CUTOFF: f64 = 0.995;
/// Sequences at least this long drop their most frequent characters from the
/// match index.
const AUTOJUNK_MIN_LEN: usize = 200;

static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W").expect("invalid NON_WORD_RE"));

type MatchingBlock = (usize, usize, usize);

/// Longest-common-block matcher over two character sequences.
struct SequenceMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> SequenceMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }
        let n = b.len();
        if n >= AUTOJUNK_MIN_LEN {
            let ntest = n / 100 + 1;
            b2j.retain(|_, indices| indices.len() <= ntest);
        }
        Self { a, b, b2j }
    }

    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchingBlock {
        let (mut besti, mut bestj, mut bestsize) = (alo, blo, 0usize);
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut new_j2len: HashMap<usize, usize> = HashMap::new();
            if let Some(indices) = self.b2j.get(&self.a[i]) {
                for &j in indices {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let previous = if j > 0 {
                        j2len.get(&(j - 1)).copied().unwrap_or(0)
                    } else {
                        0
                    };
                    let k = previous + 1;
                    new_j2len.insert(j, k);
                    if k > bestsize {
                        besti = i + 1 - k;
                        bestj = j + 1 - k;
                        bestsize = k;
                    }
                }
            }
            j2len = new_j2len;
        }

        // Grow over characters left out of the index.
        while besti > alo && bestj > blo && self.a[besti - 1] == self.b[bestj - 1] {
            besti -= 1;
            bestj -= 1;
            bestsize += 1;
        }
        while besti + bestsize < ahi
            && bestj + bestsize < bhi
            && self.a[besti + bestsize] == self.b[bestj + bestsize]
        {
            bestsize += 1;
        }
        (besti, bestj, bestsize)
    }

    /// Non-adjacent matching blocks in order, terminated by `(len_a, len_b, 0)`.
    fn matching_blocks(&self) -> Vec<MatchingBlock> {
        let (la, lb) = (self.a.len(), self.b.len());
        let mut queue = vec![(0, la, 0, lb)];
        let mut blocks = Vec::new();
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.find_longest_match(alo, ahi, blo, bhi);
            if k > 0 {
                blocks.push((i, j, k));
                if alo < i && blo < j {
                    queue.push((alo, i, blo, j));
                }
                if i + k < ahi && j + k < bhi {
                    queue.push((i + k, ahi, j + k, bhi));
                }
            }
        }
        blocks.sort_unstable();

        let mut collapsed = Vec::with_capacity(blocks.len() + 1);
        let (mut i1, mut j1, mut k1) = (0, 0, 0);
        for (i2, j2, k2) in blocks {
            if i1 + k1 == i2 && j1 + k1 == j2 {
                k1 += k2;
            } else {
                if k1 > 0 {
                    collapsed.push((i1, j1, k1));
                }
                i1 = i2;
                j1 = j2;
                k1 = k2;
            }
        }
        if k1 > 0 {
            collapsed.push((i1, j1, k1));
        }
        collapsed.push((la, lb, 0));
        collapsed
    }

    fn ratio(&self) -> f64 {
        let matches: usize = self.matching_blocks().iter().map(|(_, _, k)| k).sum();
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        2.0 * matches as f64 / total as f64
    }
}

fn to_score(similarity: f64) -> u32 {
    (100.0 * similarity).round_ties_even() as u32
}

/// Whole-string similarity.
pub fn ratio(s1: &str, s2: &str) -> u32 {
    if s1 == s2 {
        return 100;
    }
    if s1.is_empty() || s2.is_empty() {
        return 0;
    }
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    to_score(SequenceMatcher::new(&a, &b).ratio())
}

/// Best similarity of the shorter string against same-length windows of the
/// longer one, aligned on each matching block.
pub fn partial_ratio(s1: &str, s2: &str) -> u32 {
    if s1 == s2 {
        return 100;
    }
    if s1.is_empty() || s2.is_empty() {
        return 0;
    }
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    let blocks = SequenceMatcher::new(shorter, longer).matching_blocks();
    let mut best = 0.0_f64;
    for (i, j, _) in blocks {
        let long_start = j.saturating_sub(i);
        let long_end = (long_start + shorter.len()).min(longer.len());
        let window = &longer[long_start.min(long_end)..long_end];
        let r = SequenceMatcher::new(shorter, window).ratio();
        if r > PARTIAL_EXACT_CUTOFF {
            return 100;
        }
        best = best.max(r);
    }
    to_score(best)
}

/// Similarity after lower-casing, stripping symbols and sorting tokens.
pub fn token_sort_ratio(s1: &str, s2: &str) -> u32 {
    ratio(&sorted_tokens(s1), &sorted_tokens(s2))
}

/// Lower-cased word tokens, sorted and joined with single spaces.
fn sorted_tokens(value: &str) -> String {
    let mut tokens: Vec<String> = process_tokens(value)
        .split_whitespace()
        .map(str::to_string)
        .collect();
    tokens.sort();
    tokens.join(" ")
}

fn process_tokens(value: &str) -> String {
    // Latin-1 high characters are dropped outright; everything else that is
    // not a word character becomes a separator.
    let ascii_folded: String = value
        .chars()
        .filter(|c| !('\u{80}'..='\u{ff}').contains(c))
        .collect();
    NON_WORD_RE
        .replace_all(&ascii_folded, " ")
        .to_lowercase()
        .trim()
        .to_string()
}

fn score_fields<F>(left: &FieldValue, right: &FieldValue, metric: F) -> u32
where
    F: Fn(&str, &str) -> u32,
{
    match (left.as_text(), right.as_text()) {
        (Some(l), Some(r)) => metric(l, r),
        _ => 0,
    }
}

/// [`ratio`] over raw fields; non-text operands score 0.
pub fn fuzzy_ratio(left: &FieldValue, right: &FieldValue) -> u32 {
    score_fields(left, right, ratio)
}

/// [`token_sort_ratio`] over raw fields; non-text operands score 0.
pub fn fuzzy_token_sort_ratio(left: &FieldValue, right: &FieldValue) -> u32 {
    score_fields(left, right, token_sort_ratio)
}

/// [`partial_ratio`] over raw fields; non-text operands score 0.
pub fn fuzzy_partial_ratio(left: &FieldValue, right: &FieldValue) -> u32 {
    score_fields(left, right, partial_ratio)
}

/// Only scored for names that have not already passed the exact name check.
pub fn fuzzy_ratio_check(full_name_check: u8, left: &FieldValue, right: &FieldValue) -> u32 {
    if full_name_check == 0 {
        fuzzy_ratio(left, right)
    } else {
        0
    }
}

pub fn fuzzy_token_sort_ratio_check(
    full_name_check: u8,
    left: &FieldValue,
    right: &FieldValue,
) -> u32 {
    if full_name_check == 0 {
        fuzzy_token_sort_ratio(left, right)
    } else {
        0
    }
}

pub fn fuzzy_partial_ratio_check(full_name_check: u8, left: &FieldValue, right: &FieldValue) -> u32 {
    if full_name_check == 0 {
        fuzzy_partial_ratio(left, right)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio() {
        assert_eq!(ratio("123456789", "123456789"), 100);
        assert_eq!(ratio("123456789", "123456780"), 89);
        assert_eq!(ratio("JOHNSMITH", "JOHNSMYTH"), 89);
        assert_eq!(ratio("JOHNSMITH", "JONSMITH"), 94);
        assert_eq!(ratio("JOHNSMITH", "SMITHJOHN"), 56);
        assert_eq!(ratio("ROBERTDEMPSEY", "BOBDEMPSEY"), 78);
    }

    #[test]
    fn test_ratio_empty_inputs() {
        assert_eq!(ratio("", ""), 100);
        assert_eq!(ratio("", "SMITH"), 0);
        assert_eq!(ratio("SMITH", ""), 0);
    }

    #[test]
    fn test_token_sort_ratio() {
        assert_eq!(token_sort_ratio("03/01/56", "01/03/56"), 100);
        assert_eq!(token_sort_ratio("JOHNSMITH", "JOHNMissing"), 60);
        assert_eq!(token_sort_ratio("fuzzy wuzzy", "wuzzy fuzzy"), 100);
        assert_eq!(token_sort_ratio("MISSING", "03/03/15"), 0);
        // Both sides reduce to nothing.
        assert_eq!(token_sort_ratio("--", "//"), 100);
    }

    #[test]
    fn test_partial_ratio() {
        assert_eq!(partial_ratio("test", "this is a test!"), 100);
        assert_eq!(partial_ratio("JOHNSMITH", "JOHNMissing"), 56);
        assert_eq!(partial_ratio("JOHNSMITH", "JOHNASMITH"), 89);
        assert_eq!(partial_ratio("ROBERTDEMPSEY", "ROBERTDEMPSY"), 92);
        assert_eq!(partial_ratio("03/01/56", "01/03/56"), 77);
    }

    #[test]
    fn test_scores_stay_in_range() {
        let pairs = [
            ("JOHNSMITH", "JOHNMissing"),
            ("a", "bbbbbbbbbbbbbbbbbbb"),
            ("MISSING", "INCOMPLETE"),
            ("ÅSA", "ASA"),
        ];
        for (l, r) in pairs {
            for score in [ratio(l, r), token_sort_ratio(l, r), partial_ratio(l, r)] {
                assert!(score <= 100);
            }
        }
    }

    #[test]
    fn test_non_text_fields_score_zero() {
        let name = FieldValue::text("JOHNSMITH");
        assert_eq!(fuzzy_ratio(&name, &FieldValue::Null), 0);
        assert_eq!(fuzzy_token_sort_ratio(&FieldValue::Number(1.0), &name), 0);
        assert_eq!(fuzzy_partial_ratio(&FieldValue::Null, &FieldValue::Null), 0);
    }

    #[test]
    fn test_checked_variants_short_circuit() {
        let full_name = FieldValue::text("JOHNSMITH");
        let combo = FieldValue::text("JOHNSMYTH");
        assert_eq!(fuzzy_ratio_check(0, &full_name, &combo), 89);
        assert_eq!(fuzzy_ratio_check(1, &full_name, &combo), 0);
        assert_eq!(fuzzy_token_sort_ratio_check(1, &full_name, &combo), 0);
        assert_eq!(fuzzy_partial_ratio_check(1, &full_name, &full_name), 0);
        assert_eq!(fuzzy_partial_ratio_check(0, &full_name, &full_name), 100);
    }

    #[test]
    fn test_long_sequences_drop_popular_characters() {
        let long_a = "a".repeat(250);
        let long_b = format!("{}b", "a".repeat(250));
        // Every 'a' in the longer sequence is too frequent to index, yet the
        // block still grows over them.
        assert!(ratio(&long_a, &long_b) >= 99);
    }
}
