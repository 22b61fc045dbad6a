//! Device, position and time range types.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

use super::time::iso_instant;
use crate::style::{sensor_color, Rgb, ANCHOR_COLOR};

/// Kind of tracked device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Fixed infrastructure node used as a spatial reference.
    Anchor,
    /// Mobile tag whose position changes over time.
    Sensor,
}

impl DeviceKind {
    pub fn label(&self) -> &'static str {
        match self {
            DeviceKind::Anchor => "Anchor",
            DeviceKind::Sensor => "Sensor",
        }
    }
}

/// A tracked device with its current position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub mac: String,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    /// Floor-plan pixel coordinates at native resolution.
    pub x: f64,
    pub y: f64,
    #[serde(with = "iso_instant")]
    pub last_seen: DateTime<Utc>,
    /// Sensor palette selection. Anchors ignore it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_index: Option<i64>,
}

impl Device {
    /// Display color for markers and trails.
    pub fn color(&self) -> Rgb {
        match self.kind {
            DeviceKind::Anchor => ANCHOR_COLOR,
            DeviceKind::Sensor => sensor_color(self.color_index),
        }
    }
}

/// One observed position sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalPosition {
    /// Weak reference to `Device::id`.
    pub device_id: String,
    #[serde(with = "iso_instant")]
    pub timestamp: DateTime<Utc>,
    pub x: f64,
    pub y: f64,
}

/// A selected time window. `start_time` may exceed `end_time` while the
/// user is still editing; queries go through [`TimeRange::ordered`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    #[serde(with = "iso_instant")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "iso_instant")]
    pub end_time: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self { start_time, end_time }
    }

    /// From midnight (UTC) of `now`'s day until `now`.
    pub fn today(now: DateTime<Utc>) -> Self {
        let midnight = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or(now);
        Self::new(midnight, now)
    }

    /// The range with its bounds swapped if they are inverted.
    pub fn ordered(&self) -> Self {
        if self.start_time > self.end_time {
            Self::new(self.end_time, self.start_time)
        } else {
            *self
        }
    }

    pub fn duration(&self) -> ChronoDuration {
        let r = self.ordered();
        r.end_time - r.start_time
    }
}
