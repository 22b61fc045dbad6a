//! Live/historical toggle and time range pickers.

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::TimeRange;

/// Minutes between selectable times of day.
pub const TIME_STEP_MINUTES: u32 = 30;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TimeError {
    #[error("invalid time of day: {0}")]
    InvalidTime(String),
    #[error("invalid date: {0}")]
    InvalidDate(String),
}

/// Display mode of the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Live,
    Historical,
}

/// Which end of the range an edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeEdge {
    Start,
    End,
}

/// A selectable time of day, on a 30-minute boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self, TimeError> {
        if hour > 23 || minute > 59 || minute % TIME_STEP_MINUTES != 0 {
            return Err(TimeError::InvalidTime(format!("{:02}:{:02}", hour, minute)));
        }
        Ok(Self { hour, minute })
    }

    /// All 48 options, `00:00` through `23:30`.
    pub fn options() -> Vec<TimeOfDay> {
        (0..24)
            .flat_map(|hour| (0..60).step_by(TIME_STEP_MINUTES as usize).map(move |minute| TimeOfDay { hour, minute }))
            .collect()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TimeError::InvalidTime(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour = h.parse().map_err(|_| invalid())?;
        let minute = m.parse().map_err(|_| invalid())?;
        TimeOfDay::new(hour, minute).map_err(|_| invalid())
    }
}

/// Parse a `YYYY-MM-DD` picker value.
pub fn parse_date(s: &str) -> Result<NaiveDate, TimeError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| TimeError::InvalidDate(s.to_string()))
}

/// Mode toggle plus the stored time range.
///
/// Changing the mode never touches the range. Pickers operate on UTC
/// wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSelector {
    mode: ViewMode,
    range: TimeRange,
}

impl TimeSelector {
    pub fn new(range: TimeRange) -> Self {
        Self {
            mode: ViewMode::Live,
            range,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn is_live(&self) -> bool {
        self.mode == ViewMode::Live
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    /// Returns whether the mode changed.
    pub fn set_mode(&mut self, mode: ViewMode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }

    pub fn set_range(&mut self, range: TimeRange) {
        self.range = range;
    }

    /// Move one end to `date`, keeping its hour and minute.
    pub fn set_date(&mut self, edge: RangeEdge, date: NaiveDate) {
        let current = self.edge(edge);
        if let Some(dt) = date.and_hms_opt(current.hour(), current.minute(), 0) {
            *self.edge_mut(edge) = dt.and_utc();
        }
    }

    /// Move one end to `time` on the same day.
    pub fn set_time(&mut self, edge: RangeEdge, time: TimeOfDay) {
        let current = self.edge(edge);
        if let Some(dt) = current.with_hour(time.hour).and_then(|dt| dt.with_minute(time.minute)) {
            *self.edge_mut(edge) = dt;
        }
    }

    fn edge(&self, edge: RangeEdge) -> DateTime<Utc> {
        match edge {
            RangeEdge::Start => self.range.start_time,
            RangeEdge::End => self.range.end_time,
        }
    }

    fn edge_mut(&mut self, edge: RangeEdge) -> &mut DateTime<Utc> {
        match edge {
            RangeEdge::Start => &mut self.range.start_time,
            RangeEdge::End => &mut self.range.end_time,
        }
    }

    /// Mode buttons, plus the pickers when historical.
    pub fn render(&self) -> String {
        let active = |mode: ViewMode| if self.mode == mode { " active" } else { "" };
        let mut out = format!(
            r#"<div class="time-selector"><div class="modes"><button class="mode{}" data-mode="live">Real-Time</button><button class="mode{}" data-mode="historical">Historical</button></div>"#,
            active(ViewMode::Live),
            active(ViewMode::Historical),
        );

        if self.mode == ViewMode::Historical {
            out.push_str(r#"<div class="pickers">"#);
            self.render_edge(&mut out, RangeEdge::Start, "Start:");
            self.render_edge(&mut out, RangeEdge::End, "End:");
            out.push_str("</div>");
        }

        out.push_str("</div>");
        out
    }

    fn render_edge(&self, out: &mut String, edge: RangeEdge, label: &str) {
        let dt = self.edge(edge);
        let name = match edge {
            RangeEdge::Start => "start",
            RangeEdge::End => "end",
        };
        let current = format!("{:02}:{:02}", dt.hour(), dt.minute());

        let _ = write!(
            out,
            r#"<label class="edge" data-edge="{}"><span>{}</span><input type="date" name="date" value="{}"><select name="time">"#,
            name,
            label,
            dt.format("%Y-%m-%d"),
        );
        // An off-grid stored time is shown as its own disabled entry so the
        // picker never claims a slot the range isn't set to.
        let mut pending = (dt.minute() % TIME_STEP_MINUTES != 0).then_some(current.as_str());
        for option in TimeOfDay::options() {
            let value = option.to_string();
            if let Some(off_grid) = pending.filter(|c| *c < value.as_str()) {
                let _ = write!(out, r#"<option value="{}" selected disabled>{}</option>"#, off_grid, off_grid);
                pending = None;
            }
            let selected = if value == current { " selected" } else { "" };
            let _ = write!(out, r#"<option value="{}"{}>{}</option>"#, value, selected, value);
        }
        if let Some(off_grid) = pending {
            let _ = write!(out, r#"<option value="{}" selected disabled>{}</option>"#, off_grid, off_grid);
        }
        out.push_str("</select></label>");
    }
}
