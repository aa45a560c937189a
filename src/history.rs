use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One day's count for a single metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficSample {
    pub timestamp: DateTime<Utc>,
    pub count: u64,
    /// Unique visitors/cloners as reported by the API. Older history may lack it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniques: Option<u64>,
}

impl TrafficSample {
    pub fn new(timestamp: DateTime<Utc>, count: u64) -> Self {
        Self {
            timestamp,
            count,
            uniques: None,
        }
    }
}

/// Which traffic series a request or chart panel refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficMetric {
    Views,
    Clones,
}

impl TrafficMetric {
    /// Path segment under `/traffic/`, also the key of the list in the response.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Views => "views",
            Self::Clones => "clones",
        }
    }
}

/// Accumulated traffic history plus derived totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryDocument {
    pub views: Vec<TrafficSample>,
    pub clones: Vec<TrafficSample>,
    pub total_views: u64,
    pub total_clones: u64,
    #[serde(deserialize_with = "deserialize_lenient_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl HistoryDocument {
    /// Merge freshly fetched samples into the history, then recompute the
    /// totals from scratch and stamp the update time.
    pub fn absorb(
        &mut self,
        views: Vec<TrafficSample>,
        clones: Vec<TrafficSample>,
        now: DateTime<Utc>,
    ) {
        self.views = merge_samples(std::mem::take(&mut self.views), views);
        self.clones = merge_samples(std::mem::take(&mut self.clones), clones);
        self.recompute_totals();
        self.last_updated = Some(now);
    }

    pub fn recompute_totals(&mut self) {
        self.total_views = self.views.iter().map(|s| s.count).sum();
        self.total_clones = self.clones.iter().map(|s| s.count).sum();
    }

    pub fn series(&self, metric: TrafficMetric) -> &[TrafficSample] {
        match metric {
            TrafficMetric::Views => &self.views,
            TrafficMetric::Clones => &self.clones,
        }
    }

    pub fn total(&self, metric: TrafficMetric) -> u64 {
        match metric {
            TrafficMetric::Views => self.total_views,
            TrafficMetric::Clones => self.total_clones,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty() && self.clones.is_empty()
    }
}

/// Union of `existing` and `incoming` keyed by timestamp, sorted ascending.
///
/// An incoming sample whose timestamp is already present is dropped: the
/// stored value wins, even if the API now reports a different count.
pub fn merge_samples(
    mut existing: Vec<TrafficSample>,
    incoming: Vec<TrafficSample>,
) -> Vec<TrafficSample> {
    let mut seen: HashSet<DateTime<Utc>> = existing.iter().map(|s| s.timestamp).collect();
    for sample in incoming {
        if seen.insert(sample.timestamp) {
            existing.push(sample);
        }
    }
    existing.sort_by_key(|s| s.timestamp);
    existing
}

/// Accept RFC 3339 as well as naive ISO-8601 (no offset, read as UTC),
/// which is what older snapshots carry.
fn deserialize_lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    parse_timestamp(&raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
