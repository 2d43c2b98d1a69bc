//! Phase-aligned single cycle extraction

/// Take the first `period` samples of `block` and rotate them so the cycle
/// starts just after the last non-positive sample preceding its peak.
///
/// Slices that never change sign are returned as-is.
pub fn extract_cycle(block: &[f64], period: usize) -> Vec<f64> {
    let slice = &block[..period.min(block.len())];
    let len = slice.len();

    let max = slice.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = slice.iter().copied().fold(f64::INFINITY, f64::min);
    if len == 0 || max <= 0.0 || min >= 0.0 {
        return slice.to_vec();
    }

    let peak = slice
        .iter()
        .enumerate()
        .fold(0, |best, (i, &v)| if v > slice[best] { i } else { best });

    // Terminates: the slice holds at least one negative sample
    let mut i = peak;
    while slice[i] > 0.0 {
        i = (i + len - 1) % len;
    }

    let start = (i + 1) % len;
    slice[start..].iter().chain(&slice[..start]).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_signed_unchanged() {
        let positive = [0.1, 0.5, 0.0, 0.3];
        assert_eq!(extract_cycle(&positive, 4), positive.to_vec());

        let negative = [-0.1, -0.5, 0.0, -0.3];
        assert_eq!(extract_cycle(&negative, 4), negative.to_vec());

        let silent = [0.0; 6];
        assert_eq!(extract_cycle(&silent, 6), silent.to_vec());
    }

    #[test]
    fn test_rotates_to_rising_edge() {
        let block = [0.6, 0.2, -0.3, -0.7, -0.2, 0.3, 0.9, 0.8, 0.1, 0.0];
        let cycle = extract_cycle(&block, 10);
        assert_eq!(cycle, vec![0.3, 0.9, 0.8, 0.1, 0.0, 0.6, 0.2, -0.3, -0.7, -0.2]);
    }

    #[test]
    fn test_anchor_follows_negative_sample() {
        let block: Vec<f64> = (0..30)
            .map(|i| ((i as f64 + 0.5) * std::f64::consts::TAU / 23.0).sin())
            .collect();
        let period = 23;
        let cycle = extract_cycle(&block, period);
        assert_eq!(cycle.len(), period);
        assert!(cycle[0] >= 0.0);
        assert!(cycle[period - 1] < 0.0);

        // The output is a rotation of the source slice
        let start = block[..period].iter().position(|&v| v == cycle[0]).unwrap();
        let prev = block[(start + period - 1) % period];
        assert!(prev < 0.0);
    }

    #[test]
    fn test_wraps_backwards_past_start() {
        // Peak at index 0, last negative sample at the end of the slice
        let block = [0.9, 0.4, -0.2, -0.5, 0.2];
        let cycle = extract_cycle(&block, 5);
        assert_eq!(cycle, vec![0.2, 0.9, 0.4, -0.2, -0.5]);
    }

    #[test]
    fn test_uses_only_first_period() {
        let block = [0.5, -0.5, 0.5, -0.5, 2.0, 2.0];
        let cycle = extract_cycle(&block, 4);
        assert_eq!(cycle.len(), 4);
        assert!(!cycle.contains(&2.0));
    }
}
