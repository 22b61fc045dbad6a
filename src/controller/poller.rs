//! Live-mode polling task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

use super::PageState;
use crate::source::{DeviceService, Origin};

/// Running poller. Dropping or cancelling it stops the timer; polls still
/// in flight are discarded by the epoch check in [`PageState::apply_poll`].
pub struct PollHandle {
    stop: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        let _ = self.stop.send(());
        self.task.abort();
    }
}

/// Start polling the roster every `interval`. The first poll happens one
/// interval after the call.
///
/// Each tick spawns its own fetch so a slow response never delays the next
/// poll. Responses carry a ticket taken from `tickets` and are applied only
/// if they are newer than what the state already shows.
pub fn start_polling(
    service: Arc<DeviceService>,
    state: Arc<RwLock<PageState>>,
    tickets: Arc<AtomicU64>,
    interval: Duration,
    epoch: u64,
) -> PollHandle {
    let (stop, mut stop_rx) = broadcast::channel(1);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = stop_rx.recv() => {
                    break;
                }
                _ = ticker.tick() => {
                    let ticket = tickets.fetch_add(1, Ordering::SeqCst) + 1;
                    let service = service.clone();
                    let state = state.clone();

                    tokio::spawn(async move {
                        let loaded = service.load_devices().await;
                        if loaded.origin == Origin::Fallback {
                            tracing::debug!("Poll {} served from offline roster", ticket);
                        }

                        let mut st = state.write().await;
                        if !st.apply_poll(epoch, ticket, loaded.data) {
                            tracing::debug!("Discarding stale poll {}", ticket);
                        }
                    });
                }
            }
        }

        tracing::debug!("Poller {} stopped", epoch);
    });

    PollHandle { stop, task }
}
