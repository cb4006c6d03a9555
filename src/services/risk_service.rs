use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::models::{EntityType, Period, RecencyWindow, RiskFlag, RiskReason};
use crate::services::record_set::RecordSet;

/// Flag entities whose last activity is older than `recency_window`,
/// measured back from the latest order date in the whole record set.
///
/// # Arguments
/// * `record_set` – validated sales rows
/// * `entities` – ids to classify; the output keeps this order
/// * `entity_type` – which column the ids refer to
/// * `recency_window` – `Days(n)` flags when `max_date - last > n days`;
///   `Months(n)` flags when `last < max_date - n months`
///
/// # Returns
/// One flag per at-risk entity. Entities without a single row are always
/// flagged with `RiskReason::NoActivity`. A negative day window flags
/// nothing else, and a window reaching past chrono's date range leaves
/// every active entity unflagged.
pub fn classify(
    record_set: &RecordSet,
    entities: &[String],
    entity_type: EntityType,
    recency_window: RecencyWindow,
) -> Vec<RiskFlag> {
    if recency_window.is_negative() {
        warn!("Ignoring negative recency window ({})", recency_window);
    }
    let last_activity = last_activity_by_entity(record_set, entity_type);
    let cutoff = record_set
        .date_range()
        .filter(|_| !recency_window.is_negative())
        .and_then(|(_, max_date)| recency_window.cutoff(max_date).map(|c| (max_date, c)));

    let flags: Vec<RiskFlag> = entities
        .iter()
        .filter_map(|entity_id| {
            let reason = match last_activity.get(entity_id.as_str()) {
                None => RiskReason::NoActivity,
                Some(last) => {
                    let (max_date, cutoff) = cutoff?;
                    if *last >= cutoff {
                        return None;
                    }
                    RiskReason::Inactive {
                        days_since_last_activity: (max_date - *last).num_days(),
                    }
                }
            };
            let last_date = last_activity.get(entity_id.as_str()).copied();

            Some(RiskFlag {
                entity_id: entity_id.clone(),
                entity_type,
                last_activity_period: last_date.map(Period::from_date),
                last_activity_date: last_date,
                reason,
            })
        })
        .collect();

    info!(
        "Flagged {} of {} {:?} entities (window: {})",
        flags.len(),
        entities.len(),
        entity_type,
        recency_window
    );
    flags
}

/// Distinct ids of `entity_type` present in the record set, sorted.
pub fn entity_ids(record_set: &RecordSet, entity_type: EntityType) -> Vec<String> {
    record_set
        .rows()
        .filter_map(|r| entity_type.id_of(r))
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn last_activity_by_entity(
    record_set: &RecordSet,
    entity_type: EntityType,
) -> BTreeMap<&str, NaiveDate> {
    let mut last: BTreeMap<&str, NaiveDate> = BTreeMap::new();
    for record in record_set.rows() {
        let Some(id) = entity_type.id_of(record) else {
            continue;
        };
        last.entry(id)
            .and_modify(|d| *d = (*d).max(record.order_date))
            .or_insert(record.order_date);
    }
    debug!("Tracked last activity for {} {:?} entities", last.len(), entity_type);
    last
}
