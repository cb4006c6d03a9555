use anyhow::{Context, Result};
use csv::{ByteRecord, ReaderBuilder, Trim};
use regex::Regex;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::services::record_set::RawRow;

/// Normalised export header → canonical field name.
const HEADER_ALIASES: &[(&str, &str)] = &[
    ("ordernumber", "order_id"),
    ("orderid", "order_id"),
    ("orderdate", "order_date"),
    ("productline", "product_line"),
    ("productcode", "product_code"),
    ("customername", "customer_name"),
    ("customer", "customer_name"),
    ("country", "country"),
    ("status", "status"),
    ("quantityordered", "quantity_ordered"),
    ("quantity", "quantity_ordered"),
    ("priceeach", "price_each"),
    ("price", "price_each"),
    ("msrp", "msrp"),
    ("sales", "sales"),
    ("dealsize", "deal_size"),
];

/// Maps CSV headers to canonical field names.
pub struct HeaderNormalizer {
    non_alphanumeric: Regex,
}

impl HeaderNormalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            non_alphanumeric: Regex::new(r"[^a-z0-9]+").context("Invalid header pattern")?,
        })
    }

    /// Headers are lower-cased and stripped of everything but letters and
    /// digits before the alias lookup, so `ORDERNUMBER`, `Order Number` and
    /// `order_number` all land on `order_id`. Unknown headers come back in
    /// their normalised form.
    pub fn normalize(&self, header: &str) -> String {
        let squashed = self
            .non_alphanumeric
            .replace_all(&header.trim().to_lowercase(), "")
            .into_owned();

        HEADER_ALIASES
            .iter()
            .find(|(alias, _)| *alias == squashed)
            .map(|(_, canonical)| canonical.to_string())
            .unwrap_or(squashed)
    }
}

/// Read raw rows from any CSV source with a header line.
///
/// Cells are trimmed; invalid UTF-8 is replaced rather than rejected since
/// sales exports are frequently Latin-1. Blank cells are kept as empty
/// strings so the record set can report them per row.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let normalizer = HeaderNormalizer::new()?;
    let headers: Vec<String> = reader
        .byte_headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(|h| normalizer.normalize(&String::from_utf8_lossy(h)))
        .collect();
    debug!("CSV columns: {:?}", headers);

    let mut rows = Vec::new();
    let mut record = ByteRecord::new();
    let mut line_num = 1;

    while reader
        .read_byte_record(&mut record)
        .with_context(|| format!("Failed to parse CSV row at line {}", line_num + 1))?
    {
        line_num += 1;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.clone(), String::from_utf8_lossy(cell).into_owned()))
            .collect();
        rows.push(row);
    }

    info!("Read {} CSV rows with {} columns", rows.len(), headers.len());
    Ok(rows)
}

pub fn read_csv_file(file_path: &Path) -> Result<Vec<RawRow>> {
    let file = std::fs::File::open(file_path)
        .with_context(|| format!("Failed to open file: {:?}", file_path))?;
    read_csv(file).with_context(|| format!("Failed to read CSV file: {:?}", file_path))
}
