use bigdecimal::{BigDecimal, ToPrimitive};
use std::str::FromStr;

/// Decimal places kept on forecast point estimates.
pub const ESTIMATE_SCALE: i64 = 2;

/// Decimal places kept on growth fractions and means.
pub const RATIO_SCALE: i64 = 6;

/// Linear regression trend line for y-values using x = 0..n-1
/// Returns (slope m, intercept b) for y = m*x + b
///
/// Uses iterator folds rather than mutable loops.
pub fn regression_trend(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    if n == 1 {
        return (0.0, values[0]);
    }

    let n_f = n as f64;

    let (sum_x, sum_y, sum_xy, sum_x2) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0, 0.0, 0.0), |(sx, sy, sxy, sx2), (i, &y)| {
            let x = i as f64;
            (sx + x, sy + y, sxy + x * y, sx2 + x * x)
        });

    let denom = n_f * sum_x2 - sum_x * sum_x;
    if denom == 0.0 {
        return (0.0, sum_y / n_f);
    }

    let m = (n_f * sum_xy - sum_x * sum_y) / denom;
    let b = (sum_y - m * sum_x) / n_f;

    (m, b)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn sum_decimals<'a, I>(values: I) -> BigDecimal
where
    I: IntoIterator<Item = &'a BigDecimal>,
{
    values
        .into_iter()
        .fold(BigDecimal::from(0), |acc, v| acc + v)
}

pub fn is_zero(value: &BigDecimal) -> bool {
    *value == BigDecimal::from(0)
}

pub fn to_f64(value: &BigDecimal) -> Option<f64> {
    value.to_f64().filter(|v| v.is_finite())
}

/// Convert a model output back into a decimal with `scale` places.
/// Non-finite input yields `None`.
pub fn from_f64(value: f64, scale: i64) -> Option<BigDecimal> {
    if !value.is_finite() {
        return None;
    }
    let formatted = format!("{:.*}", scale.max(0) as usize, value);
    BigDecimal::from_str(&formatted).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regression_trend_exact_line() {
        let (m, b) = regression_trend(&[1.0, 3.0, 5.0, 7.0]);
        assert!((m - 2.0).abs() < 1e-12);
        assert!((b - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_regression_trend_degenerate() {
        assert_eq!(regression_trend(&[]), (0.0, 0.0));
        assert_eq!(regression_trend(&[4.0]), (0.0, 4.0));
    }

    #[test]
    fn test_decimal_helpers() {
        let values = vec![BigDecimal::from_str("0.1").unwrap(), BigDecimal::from_str("0.2").unwrap()];
        assert_eq!(sum_decimals(&values), BigDecimal::from_str("0.3").unwrap());
        assert!(is_zero(&BigDecimal::from_str("0.000").unwrap()));
        assert_eq!(from_f64(1234.5678, 2), Some(BigDecimal::from_str("1234.57").unwrap()));
        assert_eq!(from_f64(f64::NAN, 2), None);
    }
}
