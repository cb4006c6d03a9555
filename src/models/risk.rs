use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Dimension, Period, SalesRecord};

/// Kind of entity a risk flag refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Customer,
    ProductLine,
    Country,
    ProductCode,
}

impl EntityType {
    pub fn dimension(&self) -> Dimension {
        match self {
            EntityType::Customer => Dimension::Customer,
            EntityType::ProductLine => Dimension::ProductLine,
            EntityType::Country => Dimension::Country,
            EntityType::ProductCode => Dimension::ProductCode,
        }
    }

    pub fn id_of<'a>(&self, record: &'a SalesRecord) -> Option<&'a str> {
        self.dimension().value_of(record)
    }
}

/// How far behind the dataset's latest order an entity may fall before it is flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyWindow {
    Days(i64),
    /// Calendar months, clamped to month end (31 March minus one month is 28/29 February)
    Months(u32),
}

impl RecencyWindow {
    /// Latest activity date that is still not flagged. `None` if the
    /// subtraction leaves chrono's date range, in which case nothing with
    /// history is stale.
    pub fn cutoff(&self, max_date: NaiveDate) -> Option<NaiveDate> {
        match self {
            RecencyWindow::Days(days) => {
                Duration::try_days(*days).and_then(|d| max_date.checked_sub_signed(d))
            }
            RecencyWindow::Months(months) => max_date.checked_sub_months(Months::new(*months)),
        }
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, RecencyWindow::Days(days) if *days < 0)
    }
}

impl fmt::Display for RecencyWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecencyWindow::Days(days) => write!(f, "{} days", days),
            RecencyWindow::Months(months) => write!(f, "{} months", months),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskReason {
    Inactive { days_since_last_activity: i64 },
    NoActivity,
}

impl fmt::Display for RiskReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskReason::Inactive {
                days_since_last_activity,
            } => write!(f, "no activity in the last {} days", days_since_last_activity),
            RiskReason::NoActivity => f.write_str("no activity in dataset"),
        }
    }
}

/// An entity whose activity is stale relative to the recency window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFlag {
    pub entity_id: String,
    pub entity_type: EntityType,
    pub last_activity_period: Option<Period>,
    pub last_activity_date: Option<NaiveDate>,
    pub reason: RiskReason,
}
