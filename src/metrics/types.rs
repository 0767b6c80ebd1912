//! Result types for metric reads

use super::error::{MetricsError, MetricsResult};
use crate::keys::{period_label, Granularity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Header of the first column in a pivoted history
pub const PERIOD_HEADER: &str = "Period";

/// Current-period totals of one metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricCounts {
    pub day: i64,
    pub week: i64,
    pub month: i64,
    pub year: i64,
}

impl MetricCounts {
    /// Build from the values of the four keys `build_keys(slug, date, None)`
    /// returns, in that order. Missing keys count as zero.
    pub(crate) fn from_values(keys: &[String], values: &[Option<String>]) -> MetricsResult<Self> {
        let count = |i: usize| parse_count(&keys[i], values.get(i).and_then(|v| v.as_deref()));
        Ok(Self {
            day: count(0)?,
            week: count(1)?,
            month: count(2)?,
            year: count(3)?,
        })
    }

    /// Total for one granularity
    pub fn get(&self, granularity: Granularity) -> i64 {
        match granularity {
            Granularity::Daily => self.day,
            Granularity::Weekly => self.week,
            Granularity::Monthly => self.month,
            Granularity::Yearly => self.year,
        }
    }
}

/// Parse a counter value read from `key`; absent reads as zero
pub fn parse_count(key: &str, value: Option<&str>) -> MetricsResult<i64> {
    match value {
        None => Ok(0),
        Some(v) => v.trim().parse().map_err(|_| MetricsError::InvalidCount {
            key: key.to_string(),
            value: v.to_string(),
        }),
    }
}

/// Pivot `(key, value)` history into a table with one column per slug
///
/// The first row is `Period, slug_1, .., slug_n`; each following row is one
/// period label (ascending) with that period's value for every slug in the
/// order given. Keys that no requested slug owns are ignored, and slugs
/// without a value for a period show `"0"`.
pub fn history_to_columns(
    slugs: &[String],
    history: &[(String, Option<String>)],
) -> Vec<Vec<String>> {
    let mut periods: BTreeMap<&str, Vec<Option<&str>>> = BTreeMap::new();

    for (key, value) in history {
        for (column, slug) in slugs.iter().enumerate() {
            if let Some(period) = period_label(slug, key) {
                let row = periods
                    .entry(period)
                    .or_insert_with(|| vec![None; slugs.len()]);
                row[column] = value.as_deref();
            }
        }
    }

    let mut table = Vec::with_capacity(periods.len() + 1);

    let mut header = Vec::with_capacity(slugs.len() + 1);
    header.push(PERIOD_HEADER.to_string());
    header.extend(slugs.iter().cloned());
    table.push(header);

    for (period, values) in periods {
        let mut row = Vec::with_capacity(values.len() + 1);
        row.push(period.to_string());
        row.extend(values.into_iter().map(|v| v.unwrap_or("0").to_string()));
        table.push(row);
    }

    table
}
