//! "Did you mean" suggestions for unknown resource names.

use std::collections::BTreeSet;

/// Minimum score for a candidate to be suggested.
pub const SIMILARITY_THRESHOLD: f32 = 0.3;

const CONTAINMENT_BONUS: f32 = 0.5;

/// Score two names in `[0, 1]`: shared distinct characters over the larger
/// character set, boosted when one name contains the other.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn similarity(a: &str, b: &str) -> f32 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let set_a: BTreeSet<char> = a.chars().collect();
    let set_b: BTreeSet<char> = b.chars().collect();
    let shared = set_a.intersection(&set_b).count();
    let mut score = shared as f32 / set_a.len().max(set_b.len()) as f32;

    if a.contains(&b) || b.contains(&a) {
        score += CONTAINMENT_BONUS;
    }
    score.min(1.0)
}

/// Up to `limit` candidates scoring at least [`SIMILARITY_THRESHOLD`], best first.
#[must_use]
pub fn find_similar<'a>(
    name: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    limit: usize,
) -> Vec<String> {
    let mut scored: Vec<(&str, f32)> = candidates
        .into_iter()
        .map(|c| (c, similarity(name, c)))
        .filter(|(_, s)| *s >= SIMILARITY_THRESHOLD)
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    scored.truncate(limit);
    scored.into_iter().map(|(c, _)| c.to_owned()).collect()
}
