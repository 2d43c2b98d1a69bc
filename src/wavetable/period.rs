//! Pitch period estimation
//!
//! Brute-force time-domain self-similarity search. This stays O(N * window)
//! on purpose: cycle extraction anchors on the exact offset found here, and a
//! frequency-domain estimator would not reproduce the same phase alignment.

/// Smallest offset considered as a period
pub const MIN_PERIOD: usize = 10;

/// Find the offset at which `block` best repeats its first `window` samples.
///
/// Candidates are offsets in `[MIN_PERIOD, block.len() - window)`; the score is
/// the sum of absolute differences and the first minimum wins. Returns `None`
/// when the search range is empty.
pub fn estimate_period(block: &[f64], window: usize) -> Option<usize> {
    if block.len() < window {
        return None;
    }
    let reference = &block[..window];
    let mut best: Option<(usize, f64)> = None;

    for offset in MIN_PERIOD..block.len() - window {
        let shifted = &block[offset..offset + window];
        let diff: f64 = reference
            .iter()
            .zip(shifted)
            .map(|(a, b)| (a - b).abs())
            .sum();
        match best {
            Some((_, best_diff)) if diff >= best_diff => {}
            _ => best = Some((offset, diff)),
        }
    }

    best.map(|(offset, _)| offset)
}
