//! Historical trail aggregation.
//!
//! Groups a flat list of position samples by device, orders each group in
//! time and derives the geometry the map draws for it.

use std::collections::HashMap;

use crate::model::{Device, HistoricalPosition};

/// Dot size for a trail sample, in pixels.
pub const DOT_SIZE: f64 = 8.0;
/// Dot size for the most recent sample of a trail.
pub const LATEST_DOT_SIZE: f64 = 12.0;

/// A point in scaled overlay coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One dot of a trail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailDot {
    pub at: Point,
    pub size: f64,
    /// Set only on the latest sample.
    pub outlined: bool,
}

/// The chronologically ordered samples of one known device.
#[derive(Debug, Clone)]
pub struct Trail<'a> {
    pub device: &'a Device,
    pub samples: Vec<&'a HistoricalPosition>,
}

impl<'a> Trail<'a> {
    /// Polyline vertices, oldest first.
    pub fn polyline(&self, scale: f64) -> Vec<Point> {
        self.samples
            .iter()
            .map(|p| Point {
                x: p.x * scale,
                y: p.y * scale,
            })
            .collect()
    }

    /// One dot per sample; the last one is larger and outlined.
    pub fn dots(&self, scale: f64) -> Vec<TrailDot> {
        let last = self.samples.len().saturating_sub(1);
        self.polyline(scale)
            .into_iter()
            .enumerate()
            .map(|(i, at)| TrailDot {
                at,
                size: if i == last { LATEST_DOT_SIZE } else { DOT_SIZE },
                outlined: i == last,
            })
            .collect()
    }

    pub fn latest(&self) -> Option<&'a HistoricalPosition> {
        self.samples.last().copied()
    }
}

/// Build one trail per device that has samples and is present in the roster.
///
/// Trails appear in the order their device first shows up in `positions`.
/// Samples for unknown devices are dropped. Ties on timestamp keep their
/// input order.
pub fn aggregate<'a>(positions: &'a [HistoricalPosition], devices: &'a [Device]) -> Vec<Trail<'a>> {
    let roster: HashMap<&str, &Device> = devices.iter().map(|d| (d.id.as_str(), d)).collect();

    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&HistoricalPosition>> = HashMap::new();

    for pos in positions {
        let id = pos.device_id.as_str();
        groups
            .entry(id)
            .or_insert_with(|| {
                order.push(id);
                Vec::new()
            })
            .push(pos);
    }

    order
        .into_iter()
        .filter_map(|id| {
            let device = *roster.get(id)?;
            let mut samples = groups.remove(id)?;
            samples.sort_by_key(|p| p.timestamp);
            Some(Trail { device, samples })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceKind;
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn device(id: &str, kind: DeviceKind) -> Device {
        Device {
            id: id.to_string(),
            mac: format!("AA:BB:CC:DD:EE:{}", id),
            kind,
            x: 0.0,
            y: 0.0,
            last_seen: t0(),
            color_index: None,
        }
    }

    fn sample(id: &str, minutes: i64, x: f64) -> HistoricalPosition {
        HistoricalPosition {
            device_id: id.to_string(),
            timestamp: t0() + ChronoDuration::minutes(minutes),
            x,
            y: x,
        }
    }

    #[test]
    fn test_groups_sorts_and_drops_orphans() {
        let devices = vec![device("a", DeviceKind::Sensor), device("b", DeviceKind::Anchor)];
        let positions = vec![
            sample("b", 5, 50.0),
            sample("a", 10, 10.0),
            sample("ghost", 1, 1.0),
            sample("a", 0, 0.0),
            sample("b", 1, 10.0),
        ];

        let trails = aggregate(&positions, &devices);
        assert_eq!(trails.len(), 2);
        assert_eq!(trails[0].device.id, "b");
        assert_eq!(trails[1].device.id, "a");

        let xs: Vec<f64> = trails[1].samples.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 10.0]);
        assert_eq!(trails[0].latest().map(|p| p.x), Some(50.0));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let devices = vec![device("a", DeviceKind::Sensor)];
        let positions = vec![sample("a", 3, 1.0), sample("a", 3, 2.0), sample("a", 1, 3.0)];

        let trails = aggregate(&positions, &devices);
        let xs: Vec<f64> = trails[0].samples.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let devices = vec![device("a", DeviceKind::Sensor), device("b", DeviceKind::Sensor)];
        let positions = vec![
            sample("a", 9, 1.0),
            sample("b", 2, 2.0),
            sample("a", 4, 3.0),
            sample("b", 2, 4.0),
            sample("a", 4, 5.0),
        ];

        let flatten = |trails: &[Trail<'_>]| -> Vec<HistoricalPosition> {
            trails
                .iter()
                .flat_map(|t| t.samples.iter().map(|p| (*p).clone()))
                .collect()
        };

        let first = flatten(&aggregate(&positions, &devices));
        let second = flatten(&aggregate(&first, &devices));
        assert_eq!(first, second);
    }

    #[test]
    fn test_device_without_samples_contributes_nothing() {
        let devices = vec![device("a", DeviceKind::Sensor), device("idle", DeviceKind::Sensor)];
        let positions = vec![sample("a", 0, 1.0)];

        let trails = aggregate(&positions, &devices);
        assert_eq!(trails.len(), 1);
        assert!(trails.iter().all(|t| t.device.id != "idle"));

        assert!(aggregate(&[], &devices).is_empty());
    }

    #[test]
    fn test_geometry_is_scaled_and_latest_emphasized() {
        let devices = vec![device("a", DeviceKind::Sensor)];
        let positions = vec![sample("a", 2, 200.0), sample("a", 1, 100.0)];
        let trails = aggregate(&positions, &devices);

        let line = trails[0].polyline(0.5);
        assert_eq!(line, vec![Point { x: 50.0, y: 50.0 }, Point { x: 100.0, y: 100.0 }]);

        let dots = trails[0].dots(0.5);
        assert_eq!(dots[0].size, DOT_SIZE);
        assert!(!dots[0].outlined);
        assert_eq!(dots[1].size, LATEST_DOT_SIZE);
        assert!(dots[1].outlined);
    }
}
