use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::errors::AnalyticsError;
use crate::models::{estimated_profit, DealSize, DroppedRow, OrderStatus, SalesRecord};

/// One input row keyed by canonical field name (`order_id`, `order_date`, ...).
pub type RawRow = BTreeMap<String, String>;

/// Fields every row must carry. `sales` is checked separately because it
/// may be derived from `price_each` and `quantity_ordered`.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "order_id",
    "order_date",
    "status",
    "product_line",
    "customer_name",
    "country",
];

// day-first wins for ambiguous slashed dates
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Largest fraction of rows that may be dropped before the load fails
    pub max_dropped_fraction: f64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_dropped_fraction: 0.5,
        }
    }
}

/// Validated, immutable collection of sales records for one analysis pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    records: Vec<SalesRecord>,
    dropped: Vec<DroppedRow>,
}

impl RecordSet {
    pub fn load<I>(rows: I) -> Result<RecordSet, AnalyticsError>
    where
        I: IntoIterator<Item = RawRow>,
    {
        Self::load_with(rows, &LoadOptions::default())
    }

    /// Validate raw rows and derive per-record fields.
    ///
    /// A required column missing from the whole input fails the load. A row
    /// that lacks a key, or whose values are unusable, is dropped and
    /// recorded in the diagnostics.
    pub fn load_with<I>(rows: I, options: &LoadOptions) -> Result<RecordSet, AnalyticsError>
    where
        I: IntoIterator<Item = RawRow>,
    {
        if !(0.0..=1.0).contains(&options.max_dropped_fraction) {
            return Err(AnalyticsError::InvalidParameter(format!(
                "max_dropped_fraction must be between 0 and 1, got {}",
                options.max_dropped_fraction
            )));
        }

        let rows: Vec<RawRow> = rows.into_iter().collect();
        check_required_columns(&rows)?;

        let mut records = Vec::new();
        let mut dropped = Vec::new();
        let total = rows.len();

        for (index, row) in rows.iter().enumerate() {
            match parse_row(row) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    debug!("Dropping row {}: {}", index, reason);
                    dropped.push(DroppedRow { row: index, reason });
                }
            }
        }

        if total > 0 && dropped.len() as f64 / total as f64 > options.max_dropped_fraction {
            warn!(
                "Rejecting input: {} of {} rows unusable",
                dropped.len(),
                total
            );
            return Err(AnalyticsError::TooManyDroppedRows {
                dropped: dropped.len(),
                total,
                max_fraction: options.max_dropped_fraction,
            });
        }

        if !dropped.is_empty() {
            warn!("Dropped {} of {} rows during load", dropped.len(), total);
        }
        info!("Loaded {} sales records", records.len());

        Ok(RecordSet { records, dropped })
    }

    /// Build directly from already-typed records.
    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        Self {
            records,
            dropped: Vec::new(),
        }
    }

    pub fn rows(&self) -> std::slice::Iter<'_, SalesRecord> {
        self.records.iter()
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dropped_rows(&self) -> &[DroppedRow] {
        &self.dropped
    }

    pub fn dropped_row_count(&self) -> usize {
        self.dropped.len()
    }

    /// Earliest and latest order date, `None` when empty.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.order_date).min()?;
        let max = self.records.iter().map(|r| r.order_date).max()?;
        Some((min, max))
    }

    /// New record set holding the rows that match. Load diagnostics carry over.
    pub fn filter<F>(&self, predicate: F) -> RecordSet
    where
        F: Fn(&SalesRecord) -> bool,
    {
        RecordSet {
            records: self.records.iter().filter(|r| predicate(*r)).cloned().collect(),
            dropped: self.dropped.clone(),
        }
    }

    pub fn apply(&self, filter: &RecordFilter) -> RecordSet {
        self.filter(|r| filter.matches(r))
    }
}

/// Dashboard-style row filter. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub product_lines: Option<BTreeSet<String>>,
    pub deal_sizes: Option<BTreeSet<DealSize>>,
    pub countries: Option<BTreeSet<String>>,
}

impl RecordFilter {
    /// Inclusive on both ends.
    pub fn between(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn product_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.product_lines = Some(lines.into_iter().map(Into::into).collect());
        self
    }

    pub fn deal_sizes<I>(mut self, sizes: I) -> Self
    where
        I: IntoIterator<Item = DealSize>,
    {
        self.deal_sizes = Some(sizes.into_iter().collect());
        self
    }

    pub fn countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.countries = Some(countries.into_iter().map(Into::into).collect());
        self
    }

    pub fn matches(&self, record: &SalesRecord) -> bool {
        if self.start.is_some_and(|start| record.order_date < start) {
            return false;
        }
        if self.end.is_some_and(|end| record.order_date > end) {
            return false;
        }
        if let Some(lines) = &self.product_lines {
            if !lines.contains(&record.product_line) {
                return false;
            }
        }
        if let Some(sizes) = &self.deal_sizes {
            match record.deal_size {
                Some(size) if sizes.contains(&size) => {}
                _ => return false,
            }
        }
        if let Some(countries) = &self.countries {
            if !countries.contains(&record.country) {
                return false;
            }
        }
        true
    }
}

/// A required column absent from every row is structural. A row that merely
/// lacks the key (a truncated CSV line) is dropped by `parse_row` instead.
fn check_required_columns(rows: &[RawRow]) -> Result<(), AnalyticsError> {
    if rows.is_empty() {
        return Ok(());
    }
    let columns: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();

    if let Some(field) = REQUIRED_FIELDS.iter().find(|f| !columns.contains(**f)) {
        return Err(AnalyticsError::MissingField {
            row: 0,
            field: field.to_string(),
        });
    }

    let can_derive_sales = columns.contains("price_each") && columns.contains("quantity_ordered");
    if !columns.contains("sales") && !can_derive_sales {
        return Err(AnalyticsError::MissingField {
            row: 0,
            field: "sales".to_string(),
        });
    }

    Ok(())
}

fn parse_row(row: &RawRow) -> Result<SalesRecord, String> {
    let order_id = required_text(row, "order_id")?;
    let order_date = parse_date(&required_text(row, "order_date")?)?;
    let status = OrderStatus::from_str(&required_text(row, "status")?)?;
    let product_line = required_text(row, "product_line")?;
    let customer_name = required_text(row, "customer_name")?;
    let country = required_text(row, "country")?;
    let product_code = optional_text(row, "product_code");

    let quantity_ordered = optional_text(row, "quantity_ordered")
        .map(|q| parse_quantity(&q))
        .transpose()?;
    let price_each = parse_non_negative(row, "price_each")?;
    let msrp = parse_non_negative(row, "msrp")?;

    let sales = match parse_non_negative(row, "sales")? {
        Some(value) => value,
        None => match (&price_each, quantity_ordered) {
            (Some(price), Some(qty)) => price * BigDecimal::from(qty),
            _ => return Err("no sales value and no price/quantity to derive it from".to_string()),
        },
    };

    let deal_size = optional_text(row, "deal_size").and_then(|d| match d.parse::<DealSize>() {
        Ok(size) => Some(size),
        Err(e) => {
            debug!("Ignoring deal size: {}", e);
            None
        }
    });

    let estimated_profit = estimated_profit(msrp.as_ref(), price_each.as_ref(), quantity_ordered);

    Ok(SalesRecord {
        order_id,
        order_date,
        product_line,
        product_code,
        customer_name,
        country,
        status,
        quantity_ordered,
        price_each,
        msrp,
        sales,
        deal_size,
        estimated_profit,
    })
}

fn optional_text(row: &RawRow, field: &str) -> Option<String> {
    row.get(field)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required_text(row: &RawRow, field: &str) -> Result<String, String> {
    optional_text(row, field).ok_or_else(|| format!("missing or empty {}", field))
}

/// Parse a calendar date, accepting the date and date-time layouts seen in sales exports.
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    let value = value.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(datetime.date());
        }
    }

    Err(format!("unparseable order date '{}'", value))
}

/// Parse a money-like string, tolerating currency symbols and thousands separators.
pub fn parse_decimal(value: &str) -> Result<BigDecimal, String> {
    let cleaned = value
        .replace(['$', '£', '€', ','], "")
        .trim()
        .to_string();

    BigDecimal::from_str(&cleaned).map_err(|_| format!("unparseable number '{}'", value))
}

fn parse_non_negative(row: &RawRow, field: &str) -> Result<Option<BigDecimal>, String> {
    match optional_text(row, field) {
        Some(value) => {
            let parsed = parse_decimal(&value)?;
            if parsed < BigDecimal::from(0) {
                return Err(format!("negative {} '{}'", field, value));
            }
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn parse_quantity(value: &str) -> Result<u32, String> {
    if let Ok(qty) = value.parse::<u32>() {
        return Ok(qty);
    }

    // Spreadsheet exports sometimes write integers as "30.0"
    match value.parse::<f64>() {
        Ok(qty) if qty >= 0.0 && qty.fract() == 0.0 && qty <= u32::MAX as f64 => Ok(qty as u32),
        _ => Err(format!("invalid quantity '{}'", value)),
    }
}
