//! Metric key derivation
//!
//! Maps a slug and a calendar date onto the storage keys that hold its
//! counters. A single write fans out to four rollup keys:
//!
//! ```text
//! m:{slug}:{YYYY-MM-DD}        daily
//! m:{slug}:w:{YYYY-WW}         weekly (%U week-of-year, weeks start on Sunday)
//! m:{slug}:m:{YYYY-MM}         monthly
//! m:{slug}:y:{YYYY}            yearly
//! c:{category}                 JSON array of slugs
//! g:{slug}                     gauge value
//! ```
//!
//! Existing data is addressed by exactly these strings, so the layout is
//! fixed. The week label is `%U` (days before the first Sunday of the year
//! fall in week 00), not the ISO-8601 week.

use crate::metrics::MetricsError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Aggregation window of a metric counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Granularity {
    /// Every granularity, in the order keys are produced for a write
    pub fn all() -> &'static [Granularity] {
        &[
            Granularity::Daily,
            Granularity::Weekly,
            Granularity::Monthly,
            Granularity::Yearly,
        ]
    }

    /// The period label for `date`, i.e. the part of the key after the slug
    pub fn period_label(&self, date: NaiveDate) -> String {
        match self {
            Self::Daily => date.format("%Y-%m-%d").to_string(),
            Self::Weekly => date.format("w:%Y-%U").to_string(),
            Self::Monthly => date.format("m:%Y-%m").to_string(),
            Self::Yearly => date.format("y:%Y").to_string(),
        }
    }

    /// Recognise which granularity produced a period label
    ///
    /// Returns `None` unless the label has exactly the shape
    /// [`period_label`](Self::period_label) emits.
    pub fn of_label(label: &str) -> Option<Granularity> {
        if let Some(rest) = label.strip_prefix("w:") {
            return is_date_shape(rest, &[4], 7).then_some(Self::Weekly);
        }
        if let Some(rest) = label.strip_prefix("m:") {
            return is_date_shape(rest, &[4], 7).then_some(Self::Monthly);
        }
        if let Some(rest) = label.strip_prefix("y:") {
            return is_date_shape(rest, &[], 4).then_some(Self::Yearly);
        }
        is_date_shape(label, &[4, 7], 10).then_some(Self::Daily)
    }

    /// Parse a granularity scope where `"all"` selects every rollup
    pub fn parse_scope(s: &str) -> Result<Option<Granularity>, MetricsError> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(None)
        } else {
            s.parse().map(Some)
        }
    }
}

impl FromStr for Granularity {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(MetricsError::InvalidGranularity(s.to_string())),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Yearly => write!(f, "yearly"),
        }
    }
}

/// ASCII digits of length `len`, with `-` at each index in `dashes`
fn is_date_shape(s: &str, dashes: &[usize], len: usize) -> bool {
    s.len() == len
        && s.bytes().enumerate().all(|(i, b)| {
            if dashes.contains(&i) {
                b == b'-'
            } else {
                b.is_ascii_digit()
            }
        })
}

/// Key of one counter: `m:{slug}:{period}`
pub fn metric_key(slug: &str, date: NaiveDate, granularity: Granularity) -> String {
    format!("m:{}:{}", slug, granularity.period_label(date))
}

/// Keys for `slug` on `date`
///
/// With a granularity, exactly one key. Without one, all four keys in the
/// order daily, weekly, monthly, yearly; this is the fan-out a write uses
/// so every rollup is updated together.
pub fn build_keys(slug: &str, date: NaiveDate, granularity: Option<Granularity>) -> Vec<String> {
    match granularity {
        Some(g) => vec![metric_key(slug, date, g)],
        None => Granularity::all()
            .iter()
            .map(|g| metric_key(slug, date, *g))
            .collect(),
    }
}

/// Key holding the JSON slug list of a category
pub fn category_key(category: &str) -> String {
    format!("c:{}", category)
}

/// Key holding a gauge's current value
pub fn gauge_key(slug: &str) -> String {
    format!("g:{}", slug)
}

/// Inverse of [`metric_key`]: the period label of `key` if it belongs to `slug`
///
/// The remainder after `m:{slug}:` must be a well-formed label, which keeps
/// slugs containing `:` (`a` vs `a:b`) from claiming each other's keys.
pub fn period_label<'a>(slug: &str, key: &'a str) -> Option<&'a str> {
    let label = key.strip_prefix("m:")?.strip_prefix(slug)?.strip_prefix(':')?;
    Granularity::of_label(label).map(|_| label)
}

/// Slug that owns the counter `key`, e.g. `m:foo:w:2012-14` → `foo`
///
/// `None` unless `key` ends in a well-formed period label. The metric
/// registry holds counter keys, so this turns its members back into slugs.
pub fn metric_slug(key: &str) -> Option<&str> {
    let rest = key.strip_prefix("m:")?;
    let (head, tail) = rest.rsplit_once(':')?;

    // Daily labels carry no colon; the others are `w:`, `m:` or `y:` prefixed
    let slug = if Granularity::of_label(tail) == Some(Granularity::Daily) {
        head
    } else {
        let (slug, _) = head.rsplit_once(':')?;
        Granularity::of_label(&rest[slug.len() + 1..])?;
        slug
    };

    (!slug.is_empty()).then_some(slug)
}

/// `key` without its leading `m:`, for display; other strings pass through
pub fn strip_metric_prefix(key: &str) -> &str {
    key.strip_prefix("m:").unwrap_or(key)
}

/// Slug of the gauge stored at `key`, e.g. `g:load` → `load`
pub fn gauge_slug(key: &str) -> Option<&str> {
    key.strip_prefix("g:").filter(|slug| !slug.is_empty())
}
