use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::{DealSize, OrderStatus, Period, SalesRecord};

/// Categorical grouping key for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    ProductLine,
    Country,
    Customer,
    ProductCode,
}

impl Dimension {
    /// Value of this dimension on a record. `None` only for a missing product code.
    pub fn value_of<'a>(&self, record: &'a SalesRecord) -> Option<&'a str> {
        match self {
            Dimension::ProductLine => Some(record.product_line.as_str()),
            Dimension::Country => Some(record.country.as_str()),
            Dimension::Customer => Some(record.customer_name.as_str()),
            Dimension::ProductCode => record.product_code.as_deref(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::ProductLine => "product_line",
            Dimension::Country => "country",
            Dimension::Customer => "customer",
            Dimension::ProductCode => "product_code",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "product_line" | "productline" => Ok(Dimension::ProductLine),
            "country" => Ok(Dimension::Country),
            "customer" | "customer_name" => Ok(Dimension::Customer),
            "product_code" | "productcode" => Ok(Dimension::ProductCode),
            other => Err(format!("Unknown dimension: {}", other)),
        }
    }
}

/// Time bucket used when grouping by period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    #[default]
    Month,
}

/// One (period, dimension value) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub period: Period,
    /// `None` for the global series
    pub dimension_value: Option<String>,
    pub total_sales: BigDecimal,
    /// Distinct order ids in the group
    pub order_count: usize,
    /// Line items in the group
    pub row_count: usize,
    /// `total_sales / order_count`, absent when there are no orders
    pub mean_sales: Option<BigDecimal>,
}

/// Unperiodized total for one dimension value, used for rankings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionTotal {
    pub dimension_value: Option<String>,
    pub total_sales: BigDecimal,
    pub order_count: usize,
    /// Fraction of overall sales; absent when overall sales are zero
    pub share: Option<BigDecimal>,
}

/// Headline KPIs for a record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallTotals {
    pub total_revenue: BigDecimal,
    pub order_count: usize,
    pub line_item_count: usize,
    pub avg_order_value: Option<BigDecimal>,
    pub estimated_profit: BigDecimal,
    pub unique_customers: usize,
    /// Customers with more than one distinct order
    pub repeat_customers: usize,
    pub status_counts: BTreeMap<OrderStatus, usize>,
    /// Line items per deal size; rows without one are not counted
    pub deal_size_counts: BTreeMap<DealSize, usize>,
    pub latest_period: Option<Period>,
    pub latest_period_line_items: usize,
    pub first_order_date: Option<NaiveDate>,
    pub last_order_date: Option<NaiveDate>,
}
