// Fuzzy label matching for "did you mean" suggestions.
//
// The scorer sits behind a narrow trait so the algorithm and threshold can
// be swapped without touching the validator's control flow.

/// Normalized string similarity in [0.0, 1.0]; 1.0 means identical.
pub trait SimilarityScorer {
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Edit-distance ratio: `1 - levenshtein(a, b) / max(len)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditDistance;

impl SimilarityScorer for EditDistance {
    fn score(&self, a: &str, b: &str) -> f64 {
        let a_len = a.chars().count();
        let b_len = b.chars().count();
        if a_len == 0 && b_len == 0 {
            return 1.0;
        }
        let distance = levenshtein(a, b);
        1.0 - distance as f64 / a_len.max(b_len) as f64
    }
}

/// Classic two-row dynamic-programming edit distance over chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Up to `max_results` candidates scoring at least `cutoff` against `target`,
/// best first. Ties keep candidate order, so output is deterministic for a
/// deterministic candidate sequence.
pub fn find_similar<'a>(
    scorer: &dyn SimilarityScorer,
    target: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    max_results: usize,
    cutoff: f64,
) -> Vec<String> {
    let mut scored: Vec<(f64, &str)> = candidates
        .into_iter()
        .map(|candidate| (scorer.score(target, candidate), candidate))
        .filter(|(score, _)| *score >= cutoff)
        .collect();

    scored.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    scored
        .into_iter()
        .take(max_results)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}
