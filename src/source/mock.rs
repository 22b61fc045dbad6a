//! Offline stand-in for the positioning API.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;

use crate::model::{Device, DeviceKind, HistoricalPosition, TimeRange};

/// Number of intervals a synthesized trail is split into (one more sample
/// than this is produced per device).
pub const HISTORY_STEPS: i64 = 12;

/// Half-width of the random offset applied to synthesized samples.
pub const HISTORY_JITTER: i64 = 50;

/// In-memory demo roster and history generator.
///
/// Each [`DeviceService`](super::DeviceService) owns its own instance.
#[derive(Debug, Clone)]
pub struct MockProvider {
    devices: Vec<Device>,
    steps: i64,
    jitter: i64,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(demo_devices())
    }
}

impl MockProvider {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices,
            steps: HISTORY_STEPS,
            jitter: HISTORY_JITTER,
        }
    }

    /// The roster, stamped as seen at `now`.
    pub fn roster(&self, now: DateTime<Utc>) -> Vec<Device> {
        self.devices
            .iter()
            .cloned()
            .map(|mut d| {
                d.last_seen = now;
                d
            })
            .collect()
    }

    /// Synthesize `steps + 1` evenly spaced samples per device across
    /// `range`, each offset from the device's position by up to `jitter`
    /// pixels per axis and clamped to the floor plan's origin.
    pub fn historical<R: Rng>(&self, range: TimeRange, rng: &mut R) -> Vec<HistoricalPosition> {
        let range = range.ordered();
        let span_ms = range.duration().num_milliseconds();
        let mut positions = Vec::with_capacity(self.devices.len() * (self.steps as usize + 1));

        for device in &self.devices {
            for i in 0..=self.steps {
                let offset = ChronoDuration::milliseconds(span_ms * i / self.steps);
                let dx = rng.gen_range(-self.jitter..self.jitter) as f64;
                let dy = rng.gen_range(-self.jitter..self.jitter) as f64;

                positions.push(HistoricalPosition {
                    device_id: device.id.clone(),
                    timestamp: range.start_time + offset,
                    x: (device.x + dx).max(0.0),
                    y: (device.y + dy).max(0.0),
                });
            }
        }

        positions
    }
}

/// Three anchors and five sensors spread over the reference floor plan.
pub fn demo_devices() -> Vec<Device> {
    let now = Utc::now();
    let entry = |id: &str, kind: DeviceKind, x: f64, y: f64, color: i64| Device {
        id: id.to_string(),
        mac: format!("AA:BB:CC:DD:EE:0{}", id),
        kind,
        x,
        y,
        last_seen: now,
        color_index: Some(color),
    };

    vec![
        entry("1", DeviceKind::Anchor, 150.0, 200.0, 0),
        entry("2", DeviceKind::Anchor, 450.0, 150.0, 0),
        entry("3", DeviceKind::Anchor, 750.0, 300.0, 0),
        entry("4", DeviceKind::Sensor, 200.0, 250.0, 1),
        entry("5", DeviceKind::Sensor, 500.0, 400.0, 2),
        entry("6", DeviceKind::Sensor, 600.0, 200.0, 3),
        entry("7", DeviceKind::Sensor, 300.0, 350.0, 4),
        entry("8", DeviceKind::Sensor, 700.0, 250.0, 5),
    ]
}
