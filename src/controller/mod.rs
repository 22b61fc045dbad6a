//! Page controller: owns the view state and drives data refreshes.
//!
//! Live mode runs a [`PollHandle`]; historical mode fetches once per range
//! or mode change. Both paths tag their requests so a response that has
//! been overtaken by a newer request, or by a mode change, is dropped.

mod poller;

pub use poller::*;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use crate::model::{Device, HistoricalPosition, TimeRange};
use crate::source::DeviceService;
use crate::view::{DeviceFilter, DeviceTable, RangeEdge, TimeOfDay, TimeSelector, ViewMode};

/// Pending notifications kept for the page; older ones are dropped.
const MAX_NOTICES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A transient user-facing notification.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Read-only copy of the view state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub mode: ViewMode,
    pub time_range: TimeRange,
    pub devices: Vec<Device>,
    pub historical_positions: Vec<HistoricalPosition>,
    pub loading: bool,
}

/// The single in-memory view state.
#[derive(Debug)]
pub struct PageState {
    devices: Vec<Device>,
    historical: Vec<HistoricalPosition>,
    selector: TimeSelector,
    loading: bool,
    notices: VecDeque<Notice>,
    /// Bumped whenever a historical fetch starts or the mode leaves historical.
    history_epoch: u64,
    /// Bumped whenever a poller starts or stops.
    live_epoch: u64,
    last_poll_applied: u64,
}

impl PageState {
    pub fn new(range: TimeRange) -> Self {
        Self {
            devices: Vec::new(),
            historical: Vec::new(),
            selector: TimeSelector::new(range),
            loading: false,
            notices: VecDeque::new(),
            history_epoch: 0,
            live_epoch: 0,
            last_poll_applied: 0,
        }
    }

    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            mode: self.selector.mode(),
            time_range: self.selector.range(),
            devices: self.devices.clone(),
            historical_positions: self.historical.clone(),
            loading: self.loading,
        }
    }

    pub fn selector(&self) -> &TimeSelector {
        &self.selector
    }

    /// Apply a poll result unless the poller it came from was stopped, the
    /// page left live mode, or a newer poll already landed.
    pub fn apply_poll(&mut self, epoch: u64, ticket: u64, devices: Vec<Device>) -> bool {
        if epoch != self.live_epoch || !self.selector.is_live() || ticket <= self.last_poll_applied {
            return false;
        }
        self.devices = devices;
        self.last_poll_applied = ticket;
        true
    }

    fn push_notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        if self.notices.len() >= MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            level,
            message: message.into(),
            at: Utc::now(),
        });
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }
}

/// Top-level page state plus the tasks that keep it fresh.
#[derive(Clone)]
pub struct PageController {
    service: Arc<DeviceService>,
    state: Arc<RwLock<PageState>>,
    poller: Arc<Mutex<Option<PollHandle>>>,
    tickets: Arc<AtomicU64>,
    poll_interval: Duration,
}

impl PageController {
    /// Create a controller in live mode with today's range selected.
    pub fn new(service: Arc<DeviceService>, poll_interval: Duration) -> Self {
        Self {
            service,
            state: Arc::new(RwLock::new(PageState::new(TimeRange::today(Utc::now())))),
            poller: Arc::new(Mutex::new(None)),
            tickets: Arc::new(AtomicU64::new(0)),
            poll_interval,
        }
    }

    pub fn service(&self) -> &DeviceService {
        &self.service
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub async fn snapshot(&self) -> PageSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn selector(&self) -> TimeSelector {
        self.state.read().await.selector().clone()
    }

    /// Initial roster load, then live polling if the page is in live mode.
    pub async fn start(&self) {
        self.state.write().await.loading = true;

        let loaded = self.service.load_devices().await;
        let live = {
            let mut st = self.state.write().await;
            tracing::info!("Loaded {} devices ({:?})", loaded.data.len(), loaded.origin);
            st.devices = loaded.data;
            st.loading = false;
            if loaded.origin.is_network() {
                st.push_notice(NoticeLevel::Success, "Devices loaded successfully");
            } else {
                st.push_notice(NoticeLevel::Error, "Failed to load devices, showing demo data");
            }
            st.selector.is_live()
        };

        if live {
            let mut poller = self.poller.lock().await;
            if self.state.read().await.selector.is_live() {
                self.start_poller(&mut poller).await;
            }
        }
    }

    /// Switch between live and historical display.
    ///
    /// Entering live clears the historical samples and resumes polling;
    /// entering historical stops polling and fetches the selected range.
    /// The stored time range is never touched.
    pub async fn set_view_mode(&self, mode: ViewMode) {
        // Held across the mode flip and the poller change so concurrent
        // switches can't leave the two out of step.
        let mut poller = self.poller.lock().await;
        let changed = {
            let mut st = self.state.write().await;
            let changed = st.selector.set_mode(mode);
            if changed && mode == ViewMode::Live {
                st.historical.clear();
                st.history_epoch += 1;
                st.loading = false;
            }
            changed
        };

        if !changed {
            return;
        }
        tracing::info!("View mode changed to {:?}", mode);

        match mode {
            ViewMode::Live => self.start_poller(&mut poller).await,
            ViewMode::Historical => {
                self.stop_poller(&mut poller).await;
                drop(poller);
                self.refresh_history().await;
            }
        }
    }

    /// Replace the whole time range.
    pub async fn set_time_range(&self, range: TimeRange) {
        self.state.write().await.selector.set_range(range);
        self.refresh_history().await;
    }

    /// Edit one end of the range from the date and/or time pickers.
    pub async fn edit_time_range(&self, edge: RangeEdge, date: Option<NaiveDate>, time: Option<TimeOfDay>) {
        {
            let mut st = self.state.write().await;
            if let Some(date) = date {
                st.selector.set_date(edge, date);
            }
            if let Some(time) = time {
                st.selector.set_time(edge, time);
            }
        }
        self.refresh_history().await;
    }

    /// Fetch samples for the selected range. No-op outside historical mode.
    pub async fn refresh_history(&self) {
        let (epoch, range) = {
            let mut st = self.state.write().await;
            if st.selector.is_live() {
                return;
            }
            st.history_epoch += 1;
            st.loading = true;
            (st.history_epoch, st.selector.range())
        };

        let loaded = self.service.load_historical_positions(range).await;

        let mut st = self.state.write().await;
        if st.history_epoch != epoch || st.selector.is_live() {
            tracing::debug!("Discarding stale historical response (epoch {})", epoch);
            return;
        }
        tracing::info!("Loaded {} historical positions ({:?})", loaded.data.len(), loaded.origin);
        st.historical = loaded.data;
        st.loading = false;
        if !loaded.origin.is_network() {
            st.push_notice(NoticeLevel::Error, "Failed to load historical data, showing generated positions");
        }
    }

    /// Row selection from the device table.
    pub async fn select_device(&self, id: &str) -> bool {
        let mut st = self.state.write().await;
        let mut selected = None;
        let found = DeviceTable::new(&st.devices, &DeviceFilter::default())
            .select(id, |id| selected = Some(id.to_string()));

        if let Some(id) = selected {
            st.push_notice(NoticeLevel::Info, format!("Selected device: {}", id));
        }
        found
    }

    pub async fn drain_notices(&self) -> Vec<Notice> {
        self.state.write().await.drain_notices()
    }

    #[cfg(test)]
    pub async fn is_polling(&self) -> bool {
        self.poller.lock().await.is_some()
    }

    /// Stop background work.
    pub async fn shutdown(&self) {
        let mut poller = self.poller.lock().await;
        self.stop_poller(&mut poller).await;
    }

    /// Callers hold the `poller` lock. Lock order is poller, then state.
    async fn start_poller(&self, poller: &mut Option<PollHandle>) {
        if poller.is_some() {
            return;
        }

        let epoch = {
            let mut st = self.state.write().await;
            st.live_epoch += 1;
            st.live_epoch
        };

        tracing::info!("Starting live polling every {:?}", self.poll_interval);
        *poller = Some(start_polling(
            self.service.clone(),
            self.state.clone(),
            self.tickets.clone(),
            self.poll_interval,
            epoch,
        ));
    }

    async fn stop_poller(&self, poller: &mut Option<PollHandle>) {
        if let Some(handle) = poller.take() {
            tracing::info!("Stopping live polling");
            handle.cancel();
            self.state.write().await.live_epoch += 1;
        }
    }
}
