//! Server-side rendering of the visualizer page.

mod map;
mod table;
mod time_selector;

pub use map::*;
pub use table::*;
pub use time_selector::*;

use crate::controller::PageSnapshot;

// ============================================================================
// Templates (simple string replacement)
// ============================================================================

const LAYOUT_TEMPLATE: &str = include_str!("templates/layout.html");
const INDEX_TEMPLATE: &str = include_str!("templates/index.html");

/// Escape text for HTML bodies and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Map area: a loading placeholder while a fetch is pending, otherwise the
/// floor plan with the overlay for the current mode.
pub fn render_map_fragment(snapshot: &PageSnapshot, viewport: &MapViewport) -> String {
    if snapshot.loading {
        return r#"<div class="loading"><div class="spinner"></div><p>Loading...</p></div>"#.to_string();
    }

    let overlay = match snapshot.mode {
        ViewMode::Live => Overlay::Live(&snapshot.devices),
        ViewMode::Historical => Overlay::Historical {
            devices: &snapshot.devices,
            positions: &snapshot.historical_positions,
        },
    };
    render_map(overlay, viewport)
}

pub fn render_devices_fragment(snapshot: &PageSnapshot, filter: &DeviceFilter) -> String {
    DeviceTable::new(&snapshot.devices, filter).render()
}

/// The full page.
pub fn render_page(
    snapshot: &PageSnapshot,
    selector: &TimeSelector,
    viewport: &MapViewport,
    filter: &DeviceFilter,
    poll_interval_ms: u128,
) -> String {
    let checked = |kind: KindFilter| if filter.kind == kind { " active" } else { "" };

    let content = INDEX_TEMPLATE
        .replace("{{time_selector}}", &selector.render())
        .replace("{{map}}", &render_map_fragment(snapshot, viewport))
        .replace("{{devices}}", &render_devices_fragment(snapshot, filter))
        .replace("{{search}}", &escape_html(&filter.search))
        .replace("{{type}}", filter.kind.as_str())
        .replace("{{type_all}}", checked(KindFilter::All))
        .replace("{{type_anchor}}", checked(KindFilter::Anchor))
        .replace("{{type_sensor}}", checked(KindFilter::Sensor))
        .replace("{{mode}}", if selector.is_live() { "live" } else { "historical" })
        .replace("{{poll_interval_ms}}", &poll_interval_ms.to_string());

    LAYOUT_TEMPLATE
        .replace("{{title}}", "Device Location Visualizer")
        .replace("{{content}}", &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TimeRange;
    use crate::source::demo_devices;
    use chrono::{TimeZone, Utc};

    fn snapshot(mode: ViewMode, loading: bool) -> PageSnapshot {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        PageSnapshot {
            mode,
            time_range: TimeRange::today(now),
            devices: demo_devices(),
            historical_positions: Vec::new(),
            loading,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_loading_placeholder() {
        let html = render_map_fragment(&snapshot(ViewMode::Live, true), &MapViewport::unmeasured());
        assert!(html.contains("Loading..."));
        assert!(!html.contains("floor-plan"));
    }

    #[test]
    fn test_historical_without_samples_draws_no_trails() {
        let html = render_map_fragment(&snapshot(ViewMode::Historical, false), &MapViewport::unmeasured());
        assert!(!html.contains("<polyline"));
        assert!(!html.contains("marker live"));
        assert!(html.contains("legend"));
    }

    #[test]
    fn test_full_page() {
        let snap = snapshot(ViewMode::Live, false);
        let selector = TimeSelector::new(snap.time_range);
        let filter = DeviceFilter::new("<EE>", KindFilter::Sensor);
        let html = render_page(&snap, &selector, &MapViewport::measured(600.0), &filter, 2000);

        assert!(html.contains("<title>Device Location Visualizer</title>"));
        assert!(html.contains("&lt;EE&gt;"));
        assert!(html.contains("No devices found matching the filters"));
        assert!(html.contains(r#"data-scale="0.5000""#));
        assert!(!html.contains("{{"));
    }
}
