use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{AutofillError, AutofillResult};
use crate::models::point::Point;

/// Named screen coordinates produced by calibration.
///
/// Built once by the resolver and read-only afterwards; consumers look
/// keys up with [`CoordinateMap::get`], which fails instead of handing out
/// a point that was never resolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CoordinateMap {
    points: BTreeMap<String, Point>,
}

impl CoordinateMap {
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Point)>,
        K: Into<String>,
    {
        Self {
            points: entries.into_iter().map(|(k, p)| (k.into(), p)).collect(),
        }
    }

    /// Resolved point for `key`
    pub fn get(&self, key: &str) -> AutofillResult<Point> {
        self.points
            .get(key)
            .copied()
            .ok_or_else(|| AutofillError::MissingCoordinate(key.to_string()))
    }

    pub fn try_get(&self, key: &str) -> Option<Point> {
        self.points.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.points.contains_key(key)
    }

    /// Fail with the first key in `keys` that is missing
    pub fn require(&self, keys: &[&str]) -> AutofillResult<()> {
        for key in keys {
            self.get(key)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Point)> + '_ {
        self.points.iter().map(|(k, p)| (k.as_str(), *p))
    }

    pub(crate) fn insert(&mut self, key: impl Into<String>, point: Point) {
        self.points.insert(key.into(), point);
    }
}

/// Persisted outcome of one calibration pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalibrationReport {
    pub resolved_at: DateTime<Utc>,
    pub confidence: f32,
    pub extended: bool,
    /// Optional keys that could not be resolved
    #[serde(default)]
    pub unresolved: Vec<String>,
    pub coordinates: CoordinateMap,
}
