//! Lexical similarity between a tokenized query and a tokenized fragment.
//!
//! The score is a cosine similarity over term-frequency vectors plus two
//! additive boosts, clamped to `1.0`:
//!
//! | Component | Value |
//! |-----------|-------|
//! | cosine(tf(query), tf(fragment)) | `[0, 1]` |
//! | query phrase appears verbatim in the fragment's token stream | `+0.3` |
//! | more than one distinct shared term | `+0.1 × shared` |
//!
//! The boost weights are a fixed legacy contract, not a tuned ranking model.

use std::collections::{HashMap, HashSet};

/// Boost for an exact phrase match.
pub const PHRASE_BOOST: f64 = 0.3;

/// Boost per distinct shared term, applied only when more than one is shared.
pub const SHARED_TERM_BOOST: f64 = 0.1;

/// Upper bound of every score.
pub const MAX_SCORE: f64 = 1.0;

fn term_frequencies(tokens: &[String]) -> HashMap<&str, usize> {
    let mut tf = HashMap::new();
    for t in tokens {
        *tf.entry(t.as_str()).or_insert(0) += 1;
    }
    tf
}

fn norm(tf: &HashMap<&str, usize>) -> f64 {
    tf.values()
        .map(|&count| (count * count) as f64)
        .sum::<f64>()
        .sqrt()
}

/// Cosine similarity of the two token streams' term-frequency vectors.
///
/// Returns `0.0` if either stream is empty.
pub fn cosine_similarity(a: &[String], b: &[String]) -> f64 {
    let tf_a = term_frequencies(a);
    let tf_b = term_frequencies(b);

    let dot: usize = tf_a
        .iter()
        .filter_map(|(term, count_a)| tf_b.get(term).map(|count_b| count_a * count_b))
        .sum();

    let mag_a = norm(&tf_a);
    let mag_b = norm(&tf_b);
    if mag_a == 0.0 || mag_b == 0.0 {
        0.0
    } else {
        dot as f64 / (mag_a * mag_b)
    }
}

/// Composite relevance score in `[0.0, 1.0]`.
///
/// ```rust
/// use aula_core::score::score;
///
/// let q = vec!["memoria".to_string(), "virtual".to_string()];
/// let f = vec!["memoria".to_string(), "virtual".to_string(), "paginación".to_string()];
/// assert_eq!(score(&q, &f), 1.0);
/// assert_eq!(score(&[], &f), 0.0);
/// ```
pub fn score(query_tokens: &[String], fragment_tokens: &[String]) -> f64 {
    if query_tokens.is_empty() || fragment_tokens.is_empty() {
        return 0.0;
    }

    let mut similarity = cosine_similarity(query_tokens, fragment_tokens);

    let query_phrase = query_tokens.join(" ");
    let fragment_text = fragment_tokens.join(" ");
    if fragment_text.contains(&query_phrase) {
        similarity += PHRASE_BOOST;
    }

    let query_terms: HashSet<&str> = query_tokens.iter().map(String::as_str).collect();
    let shared = fragment_tokens
        .iter()
        .map(String::as_str)
        .collect::<HashSet<_>>()
        .intersection(&query_terms)
        .count();
    if shared > 1 {
        similarity += SHARED_TERM_BOOST * shared as f64;
    }

    similarity.min(MAX_SCORE)
}
