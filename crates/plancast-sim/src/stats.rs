//! Small descriptive statistics over `f64` samples.

/// Arithmetic mean, or `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`), or `None` when empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// `stddev / mean`, with `neutral` returned when the mean is zero.
#[must_use]
pub fn coefficient_of_variation(values: &[f64], neutral: f64) -> Option<f64> {
    let m = mean(values)?;
    let s = population_std(values)?;
    if m == 0.0 { Some(neutral) } else { Some(s / m) }
}

/// Percentile of an ascending slice with linear interpolation between ranks.
///
/// `p` is in `[0, 100]`. Returns `None` for an empty slice.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = (p.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_yield_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(population_std(&[]), None);
        assert_eq!(coefficient_of_variation(&[], 0.5), None);
        assert_eq!(percentile_sorted(&[], 50.0), None);
    }

    #[test]
    fn population_std_matches_hand_computation() {
        // mean 5, squared deviations sum 32, n 8 -> variance 4
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values).unwrap() - 5.0).abs() < 1e-12);
        assert!((population_std(&values).unwrap() - 2.0).abs() < 1e-12);
        assert!((coefficient_of_variation(&values, 0.5).unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn zero_mean_uses_neutral_value() {
        assert_eq!(coefficient_of_variation(&[0.0, 0.0], 0.5), Some(0.5));
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((percentile_sorted(&sorted, 50.0).unwrap() - 3.0).abs() < 1e-12);
        assert!((percentile_sorted(&sorted, 90.0).unwrap() - 4.6).abs() < 1e-12);
        assert!((percentile_sorted(&sorted, 95.0).unwrap() - 4.8).abs() < 1e-12);
        assert!((percentile_sorted(&[7.0], 95.0).unwrap() - 7.0).abs() < 1e-12);
    }
}
