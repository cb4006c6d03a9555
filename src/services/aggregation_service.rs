use bigdecimal::BigDecimal;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::models::{
    Dimension, DimensionTotal, Granularity, MonthlyAggregate, OverallTotals, Period,
};
use crate::services::indicators::{is_zero, RATIO_SCALE};
use crate::services::record_set::RecordSet;

#[derive(Default)]
struct GroupAccumulator<'a> {
    total_sales: BigDecimal,
    order_ids: BTreeSet<&'a str>,
    rows: usize,
}

impl<'a> GroupAccumulator<'a> {
    fn add(&mut self, order_id: &'a str, sales: &BigDecimal) {
        self.total_sales += sales;
        self.order_ids.insert(order_id);
        self.rows += 1;
    }
}

/// Group a record set by (period, dimension value) and reduce each group.
///
/// Output is ordered by period, then dimension value, so two calls over the
/// same input always produce identical vectors. `None` as the dimension
/// yields the single global series.
pub fn aggregate(
    record_set: &RecordSet,
    dimension: Option<Dimension>,
    granularity: Granularity,
) -> Vec<MonthlyAggregate> {
    let mut groups: BTreeMap<(Period, Option<&str>), GroupAccumulator> = BTreeMap::new();

    for record in record_set.rows() {
        let period = match granularity {
            Granularity::Month => record.period(),
        };
        let key_value = dimension.and_then(|d| d.value_of(record));
        groups
            .entry((period, key_value))
            .or_default()
            .add(&record.order_id, &record.sales);
    }

    debug!(
        "Aggregated {} rows into {} groups (dimension: {:?})",
        record_set.row_count(),
        groups.len(),
        dimension
    );

    groups
        .into_iter()
        .map(|((period, value), acc)| {
            let order_count = acc.order_ids.len();
            MonthlyAggregate {
                period,
                dimension_value: value.map(str::to_string),
                mean_sales: mean_per_order(&acc.total_sales, order_count),
                total_sales: acc.total_sales,
                order_count,
                row_count: acc.rows,
            }
        })
        .collect()
}

/// Ordered (period, total_sales) series for one dimension value.
pub fn series_for(
    aggregates: &[MonthlyAggregate],
    dimension_value: Option<&str>,
) -> Vec<(Period, BigDecimal)> {
    aggregates
        .iter()
        .filter(|a| a.dimension_value.as_deref() == dimension_value)
        .map(|a| (a.period, a.total_sales.clone()))
        .collect()
}

/// Global monthly revenue series.
pub fn monthly_revenue(record_set: &RecordSet) -> Vec<(Period, BigDecimal)> {
    let aggregates = aggregate(record_set, None, Granularity::Month);
    series_for(&aggregates, None)
}

/// Unperiodized totals per dimension value, largest first (ties by value).
pub fn dimension_totals(record_set: &RecordSet, dimension: Dimension) -> Vec<DimensionTotal> {
    let mut groups: BTreeMap<Option<&str>, GroupAccumulator> = BTreeMap::new();
    let mut overall = BigDecimal::from(0);

    for record in record_set.rows() {
        overall += &record.sales;
        groups
            .entry(dimension.value_of(record))
            .or_default()
            .add(&record.order_id, &record.sales);
    }

    let mut totals: Vec<DimensionTotal> = groups
        .into_iter()
        .map(|(value, acc)| DimensionTotal {
            dimension_value: value.map(str::to_string),
            share: if is_zero(&overall) {
                None
            } else {
                Some((&acc.total_sales / &overall).round(RATIO_SCALE))
            },
            order_count: acc.order_ids.len(),
            total_sales: acc.total_sales,
        })
        .collect();

    // BTreeMap order already sorts by value; stable sort keeps that for ties
    totals.sort_by(|a, b| b.total_sales.cmp(&a.total_sales));
    totals
}

pub fn top_n(record_set: &RecordSet, dimension: Dimension, n: usize) -> Vec<DimensionTotal> {
    let mut totals = dimension_totals(record_set, dimension);
    totals.truncate(n);
    totals
}

/// Headline KPIs: revenue, distinct orders, average order value, profit,
/// customer counts and status and deal size breakdowns.
pub fn overall_totals(record_set: &RecordSet) -> OverallTotals {
    let mut total_revenue = BigDecimal::from(0);
    let mut estimated_profit = BigDecimal::from(0);
    let mut order_ids = BTreeSet::new();
    let mut orders_by_customer: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut status_counts = BTreeMap::new();
    let mut deal_size_counts = BTreeMap::new();

    for record in record_set.rows() {
        total_revenue += &record.sales;
        if let Some(profit) = &record.estimated_profit {
            estimated_profit += profit;
        }
        order_ids.insert(record.order_id.as_str());
        orders_by_customer
            .entry(record.customer_name.as_str())
            .or_default()
            .insert(record.order_id.as_str());
        *status_counts.entry(record.status).or_insert(0) += 1;
        if let Some(size) = record.deal_size {
            *deal_size_counts.entry(size).or_insert(0) += 1;
        }
    }

    let latest_period = record_set.rows().map(|r| r.period()).max();
    let latest_period_line_items = latest_period
        .map(|latest| record_set.rows().filter(|r| r.period() == latest).count())
        .unwrap_or(0);
    let date_range = record_set.date_range();

    OverallTotals {
        avg_order_value: mean_per_order(&total_revenue, order_ids.len()),
        total_revenue,
        order_count: order_ids.len(),
        line_item_count: record_set.row_count(),
        estimated_profit,
        unique_customers: orders_by_customer.len(),
        repeat_customers: orders_by_customer.values().filter(|o| o.len() > 1).count(),
        status_counts,
        deal_size_counts,
        latest_period,
        latest_period_line_items,
        first_order_date: date_range.map(|(min, _)| min),
        last_order_date: date_range.map(|(_, max)| max),
    }
}

fn mean_per_order(total: &BigDecimal, order_count: usize) -> Option<BigDecimal> {
    if order_count == 0 {
        return None;
    }
    Some((total / BigDecimal::from(order_count as u64)).round(RATIO_SCALE))
}
