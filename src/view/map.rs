//! Floor plan with live markers or historical trails.

use std::fmt::Write as _;

use crate::model::{format_timestamp, Device, DeviceKind, HistoricalPosition};
use crate::style::{sensor_color, Rgb, ANCHOR_COLOR, SENSOR_PALETTE};
use crate::trail::{aggregate, Trail};

use super::escape_html;

/// Native floor-plan resolution all coordinates refer to.
pub const FLOOR_PLAN_WIDTH: f64 = 1200.0;
pub const FLOOR_PLAN_HEIGHT: f64 = 800.0;

/// URL of the embedded floor-plan image.
pub const FLOOR_PLAN_URL: &str = "/assets/floorplan.svg";

const ANCHOR_MARKER_SIZE: f64 = 20.0;
const SENSOR_MARKER_SIZE: f64 = 16.0;

/// The rendered map container and the scale derived from its width.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MapViewport {
    width: Option<f64>,
}

impl MapViewport {
    /// A viewport that has not been measured yet (scale 1).
    pub fn unmeasured() -> Self {
        Self { width: None }
    }

    pub fn measured(width: f64) -> Self {
        let mut viewport = Self::unmeasured();
        viewport.resize(width);
        viewport
    }

    /// Record a new container width. Zero, negative or non-finite widths
    /// count as not measured.
    pub fn resize(&mut self, width: f64) {
        self.width = (width.is_finite() && width > 0.0).then_some(width);
    }

    pub fn scale(&self) -> f64 {
        self.width.map_or(1.0, |w| w / FLOOR_PLAN_WIDTH)
    }
}

/// Marker outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Square,
    Circle,
}

impl From<DeviceKind> for Shape {
    fn from(kind: DeviceKind) -> Self {
        match kind {
            DeviceKind::Anchor => Shape::Square,
            DeviceKind::Sensor => Shape::Circle,
        }
    }
}

impl Shape {
    fn border_radius(&self) -> &'static str {
        match self {
            Shape::Square => "2px",
            Shape::Circle => "50%",
        }
    }
}

/// A positioned overlay element, centered on `(left, top)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub device_id: String,
    pub left: f64,
    pub top: f64,
    pub size: f64,
    pub shape: Shape,
    pub color: Rgb,
    pub outlined: bool,
}

/// One marker per device at its current position.
pub fn live_markers(devices: &[Device], scale: f64) -> Vec<Marker> {
    devices
        .iter()
        .map(|d| Marker {
            device_id: d.id.clone(),
            left: d.x * scale,
            top: d.y * scale,
            size: match d.kind {
                DeviceKind::Anchor => ANCHOR_MARKER_SIZE,
                DeviceKind::Sensor => SENSOR_MARKER_SIZE,
            },
            shape: d.kind.into(),
            color: d.color(),
            outlined: true,
        })
        .collect()
}

/// Dots for every sample of a trail.
pub fn trail_markers(trail: &Trail<'_>, scale: f64) -> Vec<Marker> {
    trail
        .dots(scale)
        .into_iter()
        .map(|dot| Marker {
            device_id: trail.device.id.clone(),
            left: dot.at.x,
            top: dot.at.y,
            size: dot.size,
            shape: trail.device.kind.into(),
            color: trail.device.color(),
            outlined: dot.outlined,
        })
        .collect()
}

fn write_marker(out: &mut String, marker: &Marker, class: &str, extra_style: &str) {
    let _ = write!(
        out,
        r#"<div class="{}" data-device-id="{}" style="position:absolute;left:{:.2}px;top:{:.2}px;transform:translate(-50%,-50%);width:{}px;height:{}px;background-color:{};border-radius:{};border:{};{}"></div>"#,
        class,
        escape_html(&marker.device_id),
        marker.left,
        marker.top,
        marker.size,
        marker.size,
        marker.color,
        marker.shape.border_radius(),
        if marker.outlined { "2px solid white" } else { "none" },
        extra_style,
    );
}

/// Live overlay; markers glide between polls.
pub fn render_live(devices: &[Device], viewport: &MapViewport) -> String {
    let mut out = String::new();
    for marker in live_markers(devices, viewport.scale()) {
        write_marker(
            &mut out,
            &marker,
            "marker live",
            "box-shadow:0 0 0 1px rgba(0,0,0,0.1),0 2px 4px rgba(0,0,0,0.2);z-index:10;transition:left 0.5s, top 0.5s;",
        );
        out.push('\n');
    }
    out
}

/// Historical overlay: a dashed path plus dots per device with samples.
pub fn render_trails(trails: &[Trail<'_>], viewport: &MapViewport) -> String {
    let scale = viewport.scale();
    let mut out = String::from(
        r#"<svg class="trails" style="position:absolute;top:0;left:0;width:100%;height:100%;pointer-events:none;z-index:5">"#,
    );

    for trail in trails {
        let points = trail
            .polyline(scale)
            .iter()
            .map(|p| format!("{:.2},{:.2}", p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = write!(
            out,
            r#"<polyline data-device-id="{}" data-last-seen="{}" points="{}" fill="none" stroke="{}" stroke-width="2" stroke-opacity="0.6" stroke-linecap="round" stroke-linejoin="round" stroke-dasharray="5,5"/>"#,
            escape_html(&trail.device.id),
            trail.latest().map(|p| format_timestamp(&p.timestamp)).unwrap_or_default(),
            points,
            trail.device.color(),
        );
    }
    out.push_str("</svg>\n");

    for trail in trails {
        for marker in trail_markers(trail, scale) {
            write_marker(&mut out, &marker, "marker trail", "opacity:0.7;z-index:6;");
            out.push('\n');
        }
    }

    out
}

/// Key for the anchor color and the eight sensor colors.
pub fn render_legend() -> String {
    let mut out = String::from(r#"<div class="legend">"#);
    let _ = write!(
        out,
        r#"<div class="legend-row"><span class="swatch" style="background-color:{};border-radius:2px"></span><span>Anchor</span></div>"#,
        ANCHOR_COLOR
    );
    out.push_str(r#"<div class="legend-title">Sensors:</div><div class="legend-grid">"#);
    for index in 1..=SENSOR_PALETTE.len() as i64 {
        let _ = write!(
            out,
            r#"<div class="legend-row"><span class="swatch" style="background-color:{};border-radius:50%"></span><span>Sensor {}</span></div>"#,
            sensor_color(Some(index)),
            index
        );
    }
    out.push_str("</div></div>");
    out
}

/// What the map should show.
pub enum Overlay<'a> {
    Live(&'a [Device]),
    Historical {
        devices: &'a [Device],
        positions: &'a [HistoricalPosition],
    },
}

/// The complete map: floor plan, overlay and legend.
pub fn render_map(overlay: Overlay<'_>, viewport: &MapViewport) -> String {
    let (mode, body) = match overlay {
        Overlay::Live(devices) => ("live", render_live(devices, viewport)),
        Overlay::Historical { devices, positions } => {
            ("historical", render_trails(&aggregate(positions, devices), viewport))
        }
    };

    // The page script patches live markers in place by `data-device-id` while
    // mode and scale stay the same, so their CSS transition can run.
    format!(
        r#"<div class="map" data-mode="{}" data-scale="{:.4}"><img class="floor-plan" src="{}" alt="Floor Map" width="{}" height="{}">
{}{}</div>"#,
        mode,
        viewport.scale(),
        FLOOR_PLAN_URL,
        FLOOR_PLAN_WIDTH,
        FLOOR_PLAN_HEIGHT,
        body,
        render_legend()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::demo_devices;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    #[test]
    fn test_viewport_scale() {
        assert_eq!(MapViewport::unmeasured().scale(), 1.0);
        assert_eq!(MapViewport::measured(0.0).scale(), 1.0);
        assert_eq!(MapViewport::measured(f64::NAN).scale(), 1.0);
        assert_eq!(MapViewport::measured(600.0).scale(), 0.5);

        let mut viewport = MapViewport::measured(1200.0);
        assert_eq!(viewport.scale(), 1.0);
        viewport.resize(2400.0);
        assert_eq!(viewport.scale(), 2.0);
    }

    #[test]
    fn test_resize_halves_offsets() {
        let devices = demo_devices();
        let mut viewport = MapViewport::measured(1200.0);
        let wide = live_markers(&devices, viewport.scale());

        viewport.resize(600.0);
        let narrow = live_markers(&devices, viewport.scale());

        for (w, n) in wide.iter().zip(&narrow) {
            assert_eq!(n.left, w.left / 2.0);
            assert_eq!(n.top, w.top / 2.0);
            assert_eq!(n.size, w.size);
        }
    }

    #[test]
    fn test_live_marker_styles() {
        let devices = demo_devices();
        let markers = live_markers(&devices, 1.0);

        let anchor = &markers[0];
        assert_eq!(anchor.shape, Shape::Square);
        assert_eq!(anchor.size, 20.0);
        assert_eq!(anchor.color, ANCHOR_COLOR);

        let sensor = &markers[3];
        assert_eq!(sensor.shape, Shape::Circle);
        assert_eq!(sensor.size, 16.0);
        assert_eq!(sensor.color, sensor_color(Some(1)));

        let html = render_live(&devices, &MapViewport::unmeasured());
        assert_eq!(html.matches("marker live").count(), 8);
        assert!(html.contains("transition:left 0.5s, top 0.5s"));
        assert!(html.contains("left:150.00px;top:200.00px"));
    }

    #[test]
    fn test_live_fragment_keys_markers_by_device() {
        let devices = demo_devices();
        let html = render_map(Overlay::Live(&devices), &MapViewport::measured(600.0));

        assert!(html.starts_with(r#"<div class="map" data-mode="live" data-scale="0.5000">"#));
        for d in &devices {
            let hook = format!(r#"class="marker live" data-device-id="{}""#, d.id);
            assert_eq!(html.matches(&hook).count(), 1, "device {}", d.id);
        }

        // Same ids and hooks on the next poll, only positions differ.
        let mut moved = devices.clone();
        moved[3].x += 40.0;
        let next = render_map(Overlay::Live(&moved), &MapViewport::measured(600.0));
        assert!(next.contains(r#"class="marker live" data-device-id="4""#));
        assert_ne!(html, next);

        let trails = render_map(
            Overlay::Historical { devices: &devices, positions: &[] },
            &MapViewport::measured(600.0),
        );
        assert!(trails.starts_with(r#"<div class="map" data-mode="historical""#));
    }

    #[test]
    fn test_trails_render_paths_and_dots() {
        let devices = demo_devices();
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let positions = vec![
            HistoricalPosition { device_id: "4".into(), timestamp: start + ChronoDuration::minutes(5), x: 300.0, y: 300.0 },
            HistoricalPosition { device_id: "4".into(), timestamp: start, x: 100.0, y: 100.0 },
            HistoricalPosition { device_id: "nope".into(), timestamp: start, x: 1.0, y: 1.0 },
        ];

        let html = render_map(
            Overlay::Historical { devices: &devices, positions: &positions },
            &MapViewport::measured(600.0),
        );
        assert_eq!(html.matches("<polyline").count(), 1);
        assert!(html.contains(r#"points="50.00,50.00 150.00,150.00""#));
        assert!(html.contains("stroke-dasharray=\"5,5\""));
        assert_eq!(html.matches("marker trail").count(), 2);
        assert!(html.contains("width:12px;height:12px"));
        assert!(!html.contains("data-device-id=\"nope\""));
    }

    #[test]
    fn test_legend_always_present() {
        let html = render_map(Overlay::Live(&[]), &MapViewport::unmeasured());
        assert!(html.contains("Anchor"));
        for i in 1..=8 {
            assert!(html.contains(&format!("Sensor {}", i)));
        }
        assert!(html.contains(FLOOR_PLAN_URL));
    }
}
