//! Bag-of-words similarity between step patterns

use std::collections::HashMap;

/// Word overlap ratio in `[0, 1]`
///
/// Shared words are counted as a multiset intersection and divided by the
/// larger of the two word counts. Inputs are lower-cased here, so raw text is
/// accepted. Either side without words scores `0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = word_counts(a);
    let right = word_counts(b);

    let left_total: usize = left.values().sum();
    let right_total: usize = right.values().sum();
    if left_total == 0 || right_total == 0 {
        return 0.0;
    }

    let shared: usize = left
        .iter()
        .map(|(word, count)| right.get(word).map_or(0, |other| (*count).min(*other)))
        .sum();

    shared as f64 / left_total.max(right_total) as f64
}

fn word_counts(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for word in text.split_whitespace() {
        *counts.entry(word.to_lowercase()).or_insert(0) += 1;
    }
    counts
}
