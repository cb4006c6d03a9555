use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month, the unit of time-series aggregation.
///
/// Ordering is chronological. Serialized as `"YYYY-MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Returns `None` when `month` is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Truncates a date to its calendar month.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The period immediately after this one.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("Invalid period '{}', expected YYYY-MM", s))?;

        let year: i32 = year
            .parse()
            .map_err(|_| format!("Invalid year in period '{}'", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("Invalid month in period '{}'", s))?;

        Period::new(year, month).ok_or_else(|| format!("Month out of range in period '{}'", s))
    }
}

impl TryFrom<String> for Period {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_rolls_over_year() {
        let dec = Period::new(2023, 12).unwrap();
        assert_eq!(dec.next(), Period::new(2024, 1).unwrap());
        assert_eq!(Period::new(2024, 5).unwrap().next(), Period::new(2024, 6).unwrap());
    }

    #[test]
    fn test_from_date_truncates_to_month() {
        let date = NaiveDate::from_ymd_opt(2018, 2, 24).unwrap();
        assert_eq!(Period::from_date(date).to_string(), "2018-02");
    }

    #[test]
    fn test_parse_and_display() {
        let p: Period = "2019-07".parse().unwrap();
        assert_eq!(p.year(), 2019);
        assert_eq!(p.month(), 7);
        assert!("2019-13".parse::<Period>().is_err());
        assert!("201907".parse::<Period>().is_err());
    }

    #[test]
    fn test_ordering_is_chronological() {
        let a = Period::new(2019, 12).unwrap();
        let b = Period::new(2020, 1).unwrap();
        assert!(a < b);
        assert_eq!(a.next(), b);
    }

    #[test]
    fn test_serde_as_string() {
        let p = Period::new(2020, 3).unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"2020-03\"");
        let back: Period = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
