use bigdecimal::BigDecimal;

use crate::errors::AnalyticsError;
use crate::models::{Growth, GrowthPoint, GrowthSeries, Period};
use crate::services::indicators::{is_zero, RATIO_SCALE};

/// Fractional change from `baseline` to `value`; undefined for a zero baseline.
pub fn pct_change(baseline: &BigDecimal, value: &BigDecimal) -> Growth {
    if is_zero(baseline) {
        return Growth::Undefined;
    }
    Growth::Change(((value - baseline) / baseline).round(RATIO_SCALE))
}

/// Period-over-period growth against the immediately preceding entry.
///
/// The previous entry is whatever precedes it in `series`, even when months
/// are missing in between. Use [`fill_missing_periods`] first for
/// calendar-adjacent growth.
pub fn compute_growth(series: &[(Period, BigDecimal)]) -> GrowthSeries {
    let points = series
        .iter()
        .enumerate()
        .map(|(i, (period, value))| {
            let previous = i.checked_sub(1).map(|p| &series[p].1);
            GrowthPoint {
                period: *period,
                value: value.clone(),
                change: previous.map(|prev| value - prev),
                pct_change: previous.map_or(Growth::Undefined, |prev| pct_change(prev, value)),
            }
        })
        .collect();

    GrowthSeries { points }
}

/// Growth between the first and last of the most recent `n` periods.
pub fn last_n_growth(series: &[(Period, BigDecimal)], n: usize) -> Result<Growth, AnalyticsError> {
    if n < 2 {
        return Err(AnalyticsError::InvalidParameter(format!(
            "growth window must span at least 2 periods, got {}",
            n
        )));
    }
    if series.len() < n {
        return Err(AnalyticsError::InsufficientPeriods {
            required: n,
            available: series.len(),
        });
    }

    let window = &series[series.len() - n..];
    Ok(pct_change(&window[0].1, &window[n - 1].1))
}

/// Mean of the defined period-over-period changes; `None` when none are defined.
pub fn mean_growth(series: &[(Period, BigDecimal)]) -> Option<BigDecimal> {
    let growth = compute_growth(series);
    let changes: Vec<&BigDecimal> = growth.changes().filter_map(Growth::as_change).collect();
    if changes.is_empty() {
        return None;
    }

    let total = changes
        .iter()
        .fold(BigDecimal::from(0), |acc, c| acc + *c);
    Some((total / BigDecimal::from(changes.len() as u64)).round(RATIO_SCALE))
}

/// Insert zero-valued periods for every month missing between the first
/// and last entry. Input must be ordered by period.
pub fn fill_missing_periods(series: &[(Period, BigDecimal)]) -> Vec<(Period, BigDecimal)> {
    let mut filled: Vec<(Period, BigDecimal)> = Vec::with_capacity(series.len());

    for (period, value) in series {
        if let Some((last, _)) = filled.last() {
            let mut next = last.next();
            while next < *period {
                filled.push((next, BigDecimal::from(0)));
                next = next.next();
            }
        }
        filled.push((*period, value.clone()));
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn series(values: &[i64]) -> Vec<(Period, BigDecimal)> {
        let mut period = Period::new(2023, 1).unwrap();
        values
            .iter()
            .map(|v| {
                let entry = (period, BigDecimal::from(*v));
                period = period.next();
                entry
            })
            .collect()
    }

    fn change(s: &str) -> Growth {
        Growth::Change(BigDecimal::from_str(s).unwrap())
    }

    #[test]
    fn test_growth_with_zero_baseline() {
        let growth = compute_growth(&series(&[100, 150, 150, 0, 50]));
        let changes: Vec<Growth> = growth.changes().cloned().collect();
        assert_eq!(
            changes,
            vec![
                Growth::Undefined,
                change("0.5"),
                change("0"),
                change("-1"),
                Growth::Undefined,
            ]
        );
    }

    #[test]
    fn test_absolute_change_is_defined_across_zero_baseline() {
        let growth = compute_growth(&series(&[100, 150, 150, 0, 50]));
        let deltas: Vec<Option<BigDecimal>> = growth.points.iter().map(|p| p.change.clone()).collect();
        assert_eq!(
            deltas,
            vec![
                None,
                Some(BigDecimal::from(50)),
                Some(BigDecimal::from(0)),
                Some(BigDecimal::from(-150)),
                Some(BigDecimal::from(50)),
            ]
        );
        assert_eq!(growth.points[4].pct_change, Growth::Undefined);
    }

    #[test]
    fn test_growth_uses_previous_entry_not_calendar_month() {
        let jan = Period::new(2023, 1).unwrap();
        let apr = Period::new(2023, 4).unwrap();
        let input = vec![(jan, BigDecimal::from(100)), (apr, BigDecimal::from(120))];
        let growth = compute_growth(&input);
        assert_eq!(growth.points[1].pct_change, change("0.2"));
    }

    #[test]
    fn test_empty_series() {
        assert!(compute_growth(&[]).is_empty());
        assert!(mean_growth(&[]).is_none());
    }

    #[test]
    fn test_repeating_fraction_is_rounded() {
        let growth = compute_growth(&series(&[300, 400]));
        assert_eq!(growth.points[1].pct_change, change("0.333333"));
    }

    #[test]
    fn test_last_n_growth() {
        let input = series(&[50, 100, 110, 200]);
        // last three: 100 -> 200
        assert_eq!(last_n_growth(&input, 3).unwrap(), change("1"));
        assert_eq!(last_n_growth(&input, 4).unwrap(), change("3"));
    }

    #[test]
    fn test_last_n_growth_insufficient_periods() {
        let err = last_n_growth(&series(&[1, 2]), 3).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::InsufficientPeriods { required: 3, available: 2 }
        ));
    }

    #[test]
    fn test_last_n_growth_zero_baseline_is_undefined() {
        assert_eq!(last_n_growth(&series(&[0, 5, 9]), 3).unwrap(), Growth::Undefined);
    }

    #[test]
    fn test_last_n_growth_rejects_tiny_window() {
        assert!(matches!(
            last_n_growth(&series(&[1, 2, 3]), 1),
            Err(AnalyticsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_mean_growth_skips_undefined() {
        // changes: +100%, -100%, undefined (zero baseline), +50%
        let mean = mean_growth(&series(&[100, 200, 0, 10, 15])).unwrap();
        // (1 + -1 + 0.5) / 3
        assert_eq!(mean, BigDecimal::from_str("0.166667").unwrap());
    }

    #[test]
    fn test_fill_missing_periods() {
        let nov = Period::new(2023, 11).unwrap();
        let feb = Period::new(2024, 2).unwrap();
        let filled = fill_missing_periods(&[(nov, BigDecimal::from(10)), (feb, BigDecimal::from(20))]);
        let periods: Vec<String> = filled.iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(periods, vec!["2023-11", "2023-12", "2024-01", "2024-02"]);
        assert_eq!(filled[1].1, BigDecimal::from(0));
    }
}
