use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Period;

/// One transaction line.
///
/// `order_id` is not unique: an order spanning several products has one
/// record per line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub order_id: String,
    pub order_date: NaiveDate,
    pub product_line: String,
    pub product_code: Option<String>,
    pub customer_name: String,
    pub country: String,
    pub status: OrderStatus,
    pub quantity_ordered: Option<u32>,
    pub price_each: Option<BigDecimal>,
    pub msrp: Option<BigDecimal>,
    pub sales: BigDecimal,
    pub deal_size: Option<DealSize>,
    /// `(msrp - price_each) * quantity_ordered`, not clamped at zero
    pub estimated_profit: Option<BigDecimal>,
}

impl SalesRecord {
    /// Month the order was placed in.
    pub fn period(&self) -> Period {
        Period::from_date(self.order_date)
    }
}

/// Estimated profit for a line item. Requires all three inputs.
pub fn estimated_profit(
    msrp: Option<&BigDecimal>,
    price_each: Option<&BigDecimal>,
    quantity_ordered: Option<u32>,
) -> Option<BigDecimal> {
    match (msrp, price_each, quantity_ordered) {
        (Some(msrp), Some(price), Some(qty)) => Some((msrp - price) * BigDecimal::from(qty)),
        _ => None,
    }
}

/// A raw row excluded during loading, with why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedRow {
    /// Zero-based position in the input
    pub row: usize,
    pub reason: String,
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Shipped,
    OnHold,
    Cancelled,
    InProcess,
    Disputed,
    Resolved,
}

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Shipped => "Shipped",
            OrderStatus::OnHold => "On Hold",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::InProcess => "In Process",
            OrderStatus::Disputed => "Disputed",
            OrderStatus::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    /// Case-insensitive; spaces, underscores and hyphens are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match squash(s).as_str() {
            "shipped" => Ok(OrderStatus::Shipped),
            "onhold" => Ok(OrderStatus::OnHold),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            "inprocess" => Ok(OrderStatus::InProcess),
            "disputed" => Ok(OrderStatus::Disputed),
            "resolved" => Ok(OrderStatus::Resolved),
            _ => Err(format!("Unknown order status: {}", s)),
        }
    }
}

/// Deal size bucket assigned by the sales team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealSize {
    Small,
    Medium,
    Large,
}

impl fmt::Display for DealSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DealSize::Small => "Small",
            DealSize::Medium => "Medium",
            DealSize::Large => "Large",
        };
        f.write_str(label)
    }
}

impl FromStr for DealSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match squash(s).as_str() {
            "small" => Ok(DealSize::Small),
            "medium" => Ok(DealSize::Medium),
            "large" => Ok(DealSize::Large),
            _ => Err(format!("Unknown deal size: {}", s)),
        }
    }
}

fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_is_lenient() {
        assert_eq!("On Hold".parse::<OrderStatus>().unwrap(), OrderStatus::OnHold);
        assert_eq!("on_hold".parse::<OrderStatus>().unwrap(), OrderStatus::OnHold);
        assert_eq!("IN PROCESS".parse::<OrderStatus>().unwrap(), OrderStatus::InProcess);
        assert_eq!("Canceled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert!("Lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_deal_size_parsing() {
        assert_eq!("Medium".parse::<DealSize>().unwrap(), DealSize::Medium);
        assert_eq!(" large ".parse::<DealSize>().unwrap(), DealSize::Large);
        assert!("Huge".parse::<DealSize>().is_err());
    }

    #[test]
    fn test_estimated_profit_can_be_negative() {
        let msrp = BigDecimal::from(90);
        let price = BigDecimal::from(100);
        let profit = estimated_profit(Some(&msrp), Some(&price), Some(3)).unwrap();
        assert_eq!(profit, BigDecimal::from(-30));
    }

    #[test]
    fn test_estimated_profit_requires_all_inputs() {
        let msrp = BigDecimal::from(90);
        assert!(estimated_profit(Some(&msrp), None, Some(3)).is_none());
    }
}
