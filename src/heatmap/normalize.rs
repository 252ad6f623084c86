//! Magnitude normalization
//!
//! Prices span several orders of magnitude, so they are compared on a log
//! scale, standardized, squashed through the logistic function and finally
//! rescaled so the smallest value maps to 0 and the largest to 1.

use super::errors::NormalizeError;

/// Output used for every element when the input has no spread.
pub const DEGENERATE_VALUE: f64 = 0.5;

pub const DEFAULT_SPREAD_DIVISOR: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeParams {
    /// The standard deviation is divided by this before standardizing,
    /// stretching z-scores across more of the logistic curve.
    pub spread_divisor: f64,
}

impl Default for NormalizeParams {
    fn default() -> Self {
        Self {
            spread_divisor: DEFAULT_SPREAD_DIVISOR,
        }
    }
}

pub fn normalize(values: &[f64]) -> Result<Vec<f64>, NormalizeError> {
    normalize_with(values, NormalizeParams::default())
}

/// Map each magnitude into `[0, 1]`, preserving order.
pub fn normalize_with(values: &[f64], params: NormalizeParams) -> Result<Vec<f64>, NormalizeError> {
    if values.is_empty() {
        return Err(NormalizeError::EmptyInput);
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v <= 0.0) {
        return Err(NormalizeError::InvalidMagnitude(*bad));
    }

    let logged: Vec<f64> = values.iter().map(|v| v.ln()).collect();
    let (mean, sd) = mean_and_sd(&logged);
    let scale = sd / params.spread_divisor;
    if sd == 0.0 || !scale.is_normal() {
        return Ok(vec![DEGENERATE_VALUE; values.len()]);
    }

    let squashed: Vec<f64> = logged
        .iter()
        .map(|x| logistic((x - mean) / scale))
        .collect();

    let (mean2, _) = mean_and_sd(&squashed);
    let (min2, max2) = min_max(&squashed);
    let range = max2 - min2;
    if range == 0.0 {
        return Ok(vec![DEGENERATE_VALUE; values.len()]);
    }

    let rescaled: Vec<f64> = squashed.iter().map(|s| (s - mean2) / range).collect();
    let (min_r, _) = min_max(&rescaled);
    let shift = if min_r < 0.0 { -min_r } else { 0.0 };

    Ok(rescaled
        .into_iter()
        .map(|r| (r + shift).clamp(0.0, 1.0))
        .collect())
}

fn logistic(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Population mean and standard deviation.
fn mean_and_sd(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "{} != {}", a, e);
        }
    }

    #[test]
    fn test_reference_vector() {
        let normalized = normalize(&[5.0, 10.0, 15.0]).unwrap();
        assert_close(&normalized, &[0.0, 0.8148847, 1.0]);
    }

    #[test]
    fn test_order_is_preserved() {
        let normalized = normalize(&[300_000.0, 95_000.0, 1_250_000.0, 180_000.0]).unwrap();
        assert!(normalized[1] < normalized[3]);
        assert!(normalized[3] < normalized[0]);
        assert!(normalized[0] < normalized[2]);
        assert!(normalized.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_identical_values_collapse() {
        assert_eq!(normalize(&[5.0, 5.0, 5.0]).unwrap(), vec![0.5, 0.5, 0.5]);
        assert_eq!(normalize(&[42.0]).unwrap(), vec![0.5]);
    }

    #[test]
    fn test_rejects_empty_input() {
        assert_eq!(normalize(&[]), Err(NormalizeError::EmptyInput));
    }

    #[test]
    fn test_rejects_non_positive_magnitudes() {
        assert_eq!(
            normalize(&[-5.0, -15.0, -10.0]),
            Err(NormalizeError::InvalidMagnitude(-5.0))
        );
        assert_eq!(
            normalize(&[5.0, 0.0]),
            Err(NormalizeError::InvalidMagnitude(0.0))
        );
        assert!(normalize(&[5.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_spread_divisor_is_overridable() {
        let wide = normalize_with(&[5.0, 10.0, 15.0], NormalizeParams { spread_divisor: 1.0 })
            .unwrap();
        assert_eq!(wide[0], 0.0);
        assert!((wide[2] - 1.0).abs() < 1e-9);
        assert!((wide[1] - 0.8148847).abs() > 1e-3);
    }
}
