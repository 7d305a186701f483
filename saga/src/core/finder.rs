//! Deterministic identifier matching for epics and stories.
//!
//! An exact slug match always wins. Otherwise candidates are ranked by bigram
//! similarity against slug and title; scores below the acceptance threshold
//! miss, and near-ties are surfaced as ambiguous rather than silently picking
//! one.

use thiserror::Error;

/// Minimum best score for a fuzzy match to be accepted at all.
pub const DEFAULT_ACCEPT_THRESHOLD: f64 = 0.4;
/// Candidates scoring within this window of the best are considered tied.
pub const DEFAULT_AMBIGUITY_WINDOW: f64 = 0.1;

/// Slug matches outrank equally-similar title matches.
const TITLE_WEIGHT: f64 = 0.9;

/// One entity offered to the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub slug: String,
    pub title: String,
}

/// Outcome of ranking a query against a candidate list, as indices into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Unique(usize),
    Ambiguous(Vec<usize>),
    None,
}

/// Resolver misses, surfaced to the caller for clarification.
#[derive(Debug, Error)]
pub enum FindError {
    #[error("no match found for '{query}'")]
    NotFound { query: String },
    #[error("query '{query}' is ambiguous between: {}", .candidates.join("; "))]
    Ambiguous {
        query: String,
        /// Human-readable snippets for each tied candidate.
        candidates: Vec<String>,
    },
}

/// Normalize an identifier for comparison: lowercase, `-`/`_` become spaces.
pub fn normalize(s: &str) -> String {
    s.to_lowercase().replace(['-', '_'], " ")
}

/// Rank `query` against `candidates`.
///
/// Exact (normalized) slug matches short-circuit the fuzzy ranking; more than
/// one exact match is ambiguous (same story slug under different epics).
pub fn resolve(
    query: &str,
    candidates: &[Candidate],
    accept_threshold: f64,
    ambiguity_window: f64,
) -> Resolution {
    let normalized = normalize(query);

    let exact: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| normalize(&c.slug) == normalized)
        .map(|(i, _)| i)
        .collect();
    match exact.len() {
        1 => return Resolution::Unique(exact[0]),
        n if n > 1 => return Resolution::Ambiguous(exact),
        _ => {}
    }

    let scores: Vec<f64> = candidates
        .iter()
        .map(|c| score(&normalized, c))
        .collect();
    let best = scores.iter().copied().fold(0.0_f64, f64::max);
    if best < accept_threshold {
        return Resolution::None;
    }

    let tied: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|(_, s)| best - **s <= ambiguity_window)
        .map(|(i, _)| i)
        .collect();
    if tied.len() > 1 {
        return Resolution::Ambiguous(tied);
    }
    Resolution::Unique(tied[0])
}

fn score(normalized_query: &str, candidate: &Candidate) -> f64 {
    let slug_score = similarity(normalized_query, &normalize(&candidate.slug));
    let title_score = similarity(normalized_query, &normalize(&candidate.title));
    slug_score.max(TITLE_WEIGHT * title_score)
}

/// Sørensen–Dice coefficient over character bigrams, in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let a_bigrams = bigrams(a);
    let mut b_bigrams = bigrams(b);
    if a_bigrams.is_empty() || b_bigrams.is_empty() {
        return 0.0;
    }
    let total = a_bigrams.len() + b_bigrams.len();
    let mut overlap = 0usize;
    for bigram in a_bigrams {
        if let Some(pos) = b_bigrams.iter().position(|other| *other == bigram) {
            b_bigrams.swap_remove(pos);
            overlap += 1;
        }
    }
    (2.0 * overlap as f64) / total as f64
}

fn bigrams(s: &str) -> Vec<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|pair| (pair[0], pair[1])).collect()
}
