//! Device roster table with client-side filtering.

use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{Device, DeviceKind};

use super::escape_html;

/// Type filter for the roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindFilter {
    #[default]
    All,
    Anchor,
    Sensor,
}

impl KindFilter {
    pub fn matches(&self, kind: DeviceKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Anchor => kind == DeviceKind::Anchor,
            KindFilter::Sensor => kind == DeviceKind::Sensor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KindFilter::All => "all",
            KindFilter::Anchor => "anchor",
            KindFilter::Sensor => "sensor",
        }
    }
}

impl FromStr for KindFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(KindFilter::All),
            "anchor" => Ok(KindFilter::Anchor),
            "sensor" => Ok(KindFilter::Sensor),
            other => Err(format!("unknown device type filter: {}", other)),
        }
    }
}

/// MAC substring search combined with a type filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    pub search: String,
    pub kind: KindFilter,
}

impl DeviceFilter {
    pub fn new(search: impl Into<String>, kind: KindFilter) -> Self {
        Self {
            search: search.into(),
            kind,
        }
    }

    pub fn matches(&self, device: &Device) -> bool {
        let needle = self.search.to_lowercase();
        device.mac.to_lowercase().contains(&needle) && self.kind.matches(device.kind)
    }

    /// Matching devices, in roster order.
    pub fn apply<'a>(&self, devices: &'a [Device]) -> Vec<&'a Device> {
        devices.iter().filter(|d| self.matches(d)).collect()
    }
}

/// The filtered rows of the roster.
pub struct DeviceTable<'a> {
    rows: Vec<&'a Device>,
}

impl<'a> DeviceTable<'a> {
    pub fn new(devices: &'a [Device], filter: &DeviceFilter) -> Self {
        Self {
            rows: filter.apply(devices),
        }
    }

    /// Invoke `on_selected` with the id of the clicked row. Returns whether
    /// the id belongs to a visible row.
    pub fn select<F>(&self, id: &str, on_selected: F) -> bool
    where
        F: FnOnce(&str),
    {
        match self.rows.iter().find(|d| d.id == id) {
            Some(device) => {
                on_selected(&device.id);
                true
            }
            None => false,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from(
            "<table class=\"devices\"><thead><tr><th>Type</th><th>MAC Address</th><th>Last Seen</th><th>Position</th></tr></thead><tbody>\n",
        );

        if self.rows.is_empty() {
            out.push_str("<tr class=\"empty\"><td colspan=\"4\">No devices found matching the filters</td></tr>\n");
        }

        for device in &self.rows {
            let radius = match device.kind {
                DeviceKind::Anchor => "2px",
                DeviceKind::Sensor => "50%",
            };
            let _ = writeln!(
                out,
                r#"<tr data-device-id="{}"><td><span class="swatch" style="background-color:{};border-radius:{}"></span>{}</td><td class="mono">{}</td><td>{}</td><td>({}, {})</td></tr>"#,
                escape_html(&device.id),
                device.color(),
                radius,
                device.kind.label(),
                escape_html(&device.mac),
                device.last_seen.format("%Y-%m-%d %H:%M:%S"),
                device.x,
                device.y,
            );
        }

        out.push_str("</tbody></table>");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::demo_devices;

    fn ids(devices: &[&Device]) -> Vec<String> {
        devices.iter().map(|d| d.id.clone()).collect()
    }

    #[test]
    fn test_mac_search() {
        let devices = demo_devices();
        let filter = DeviceFilter::new("EE:04", KindFilter::All);
        assert_eq!(ids(&filter.apply(&devices)), vec!["4"]);

        let filter = DeviceFilter::new("ee:04", KindFilter::All);
        assert_eq!(ids(&filter.apply(&devices)), vec!["4"]);
    }

    #[test]
    fn test_type_filter() {
        let devices = demo_devices();

        let anchors = DeviceFilter::new("", KindFilter::Anchor).apply(&devices);
        assert_eq!(ids(&anchors), vec!["1", "2", "3"]);

        let sensors = DeviceFilter::new("", KindFilter::Sensor).apply(&devices);
        assert_eq!(ids(&sensors), vec!["4", "5", "6", "7", "8"]);

        assert_eq!(DeviceFilter::default().apply(&devices).len(), 8);
        assert!(DeviceFilter::new("EE:04", KindFilter::Anchor).apply(&devices).is_empty());
    }

    #[test]
    fn test_parse_kind_filter() {
        assert_eq!("".parse::<KindFilter>(), Ok(KindFilter::All));
        assert_eq!("Anchor".parse::<KindFilter>(), Ok(KindFilter::Anchor));
        assert_eq!("sensor".parse::<KindFilter>(), Ok(KindFilter::Sensor));
        assert!("gateway".parse::<KindFilter>().is_err());
    }

    #[test]
    fn test_empty_result_row() {
        let devices = demo_devices();
        let filter = DeviceFilter::new("zz", KindFilter::All);
        let html = DeviceTable::new(&devices, &filter).render();
        assert!(html.contains("No devices found matching the filters"));
        assert!(!html.contains("data-device-id"));
    }

    #[test]
    fn test_rows_render_in_roster_order() {
        let devices = demo_devices();
        let html = DeviceTable::new(&devices, &DeviceFilter::default()).render();
        let first = html.find("AA:BB:CC:DD:EE:01").unwrap();
        let last = html.find("AA:BB:CC:DD:EE:08").unwrap();
        assert!(first < last);
        assert!(html.contains("(150, 200)"));
    }

    #[test]
    fn test_select_invokes_callback() {
        let devices = demo_devices();
        let filter = DeviceFilter::new("", KindFilter::Sensor);
        let table = DeviceTable::new(&devices, &filter);

        let mut selected = None;
        assert!(table.select("5", |id| selected = Some(id.to_string())));
        assert_eq!(selected.as_deref(), Some("5"));

        // Hidden by the filter.
        assert!(!table.select("1", |_| panic!("anchor row is filtered out")));
    }
}
