use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::Period;

/// Period-over-period change.
///
/// `Undefined` is a normal outcome (first period, zero baseline), not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Growth {
    /// Fractional change, e.g. 0.5 for +50%
    Change(BigDecimal),
    Undefined,
}

impl Growth {
    pub fn as_change(&self) -> Option<&BigDecimal> {
        match self {
            Growth::Change(value) => Some(value),
            Growth::Undefined => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthPoint {
    pub period: Period,
    pub value: BigDecimal,
    /// `value` minus the previous value; `None` for the first point
    pub change: Option<BigDecimal>,
    pub pct_change: Growth,
}

/// Growth over a period-ordered series of a single dimension value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GrowthSeries {
    pub points: Vec<GrowthPoint>,
}

impl GrowthSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn changes(&self) -> impl Iterator<Item = &Growth> {
        self.points.iter().map(|p| &p.pct_change)
    }
}
