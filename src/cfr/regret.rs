//! Regret matching.
//!
//! Both rules here fall back to the uniform distribution when there is
//! nothing to normalize, so an untouched or fully negative row never turns
//! into a fixed "first action" choice.

/// Current strategy from a row of cumulative regrets.
///
/// Each action gets probability proportional to its positive regret. If no
/// action has positive regret the result is uniform.
///
/// # Example
/// ```
/// use efg_solver::cfr::regret_matching;
///
/// assert_eq!(regret_matching(&[3.0, -1.0, 1.0]), vec![0.75, 0.0, 0.25]);
/// assert_eq!(regret_matching(&[-2.0, 0.0]), vec![0.5, 0.5]);
/// ```
pub fn regret_matching(regrets: &[f64]) -> Vec<f64> {
    let positive: Vec<f64> = regrets.iter().map(|&r| r.max(0.0)).collect();
    normalize(&positive)
}

/// Distribution proportional to a non-negative row, uniform if it sums to 0.
///
/// Used to turn strategy sums into the average strategy.
pub fn normalize(weights: &[f64]) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        weights.iter().map(|&w| w / total).collect()
    } else {
        uniform(weights.len())
    }
}

/// Uniform distribution over `num_actions` actions.
pub fn uniform(num_actions: usize) -> Vec<f64> {
    vec![1.0 / num_actions as f64; num_actions]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_regrets_are_normalized() {
        let strategy = regret_matching(&[2.0, -5.0, 6.0, 0.0]);

        assert_eq!(strategy, vec![0.25, 0.0, 0.75, 0.0]);
        assert!((strategy.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_positive_regrets_fall_back_to_uniform() {
        assert_eq!(regret_matching(&[0.0, 0.0, 0.0]), vec![1.0 / 3.0; 3]);
        assert_eq!(regret_matching(&[-1.0, -0.5]), vec![0.5, 0.5]);
    }

    #[test]
    fn test_single_positive_regret_is_pure() {
        assert_eq!(regret_matching(&[-3.0, 1e-9, -1.0]), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_normalize_strategy_sums() {
        assert_eq!(normalize(&[1.0, 3.0]), vec![0.25, 0.75]);
        assert_eq!(normalize(&[0.0, 0.0, 0.0, 0.0]), vec![0.25; 4]);
    }

    #[test]
    fn test_empty_row() {
        assert!(regret_matching(&[]).is_empty());
        assert!(normalize(&[]).is_empty());
    }
}
