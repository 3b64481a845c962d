//! Background timer that drives the autosave pump.

use recdraft_core::edit_session::EditSession;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tokio_util::sync::CancellationToken;

/// Handle to one running timer task. Dropping it stops the task.
pub(crate) struct AutosaveTimer {
    epoch: u64,
    cancel: CancellationToken,
    dirty_edge: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl AutosaveTimer {
    /// Spawns a timer that ticks the session every `period`.
    ///
    /// With a `debounce`, a dirty edge schedules one extra tick `debounce`
    /// after the edge. The first periodic tick fires one full period after
    /// start.
    pub(crate) fn spawn(
        session: Arc<Mutex<EditSession>>,
        epoch: u64,
        period: Duration,
        debounce: Option<Duration>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let dirty_edge = Arc::new(Notify::new());

        let task_cancel = cancel.clone();
        let task_edge = Arc::clone(&dirty_edge);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!(
                target: "autosave",
                "Timer started (epoch {}, {}ms interval)",
                epoch,
                period.as_millis()
            );

            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                    _ = task_edge.notified(), if debounce.is_some() => {
                        let delay = debounce.unwrap_or_default();
                        tokio::select! {
                            _ = task_cancel.cancelled() => break,
                            _ = sleep(delay) => {}
                        }
                    }
                }

                let report = session.lock().await.autosave_tick(epoch);
                match report {
                    Some(report) => {
                        tracing::trace!(
                            target: "autosave",
                            "Tick (epoch {}): {} dirty section(s)",
                            epoch,
                            report.dirty_sections.len()
                        );
                    }
                    None => {
                        tracing::debug!(target: "autosave", "Epoch {} is stale, timer exits", epoch);
                        break;
                    }
                }
            }
        });

        Self {
            epoch,
            cancel,
            dirty_edge,
            handle: Some(handle),
        }
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Signals that a section just turned dirty.
    pub(crate) fn poke(&self) {
        self.dirty_edge.notify_one();
    }

    /// Cancels the task and waits for it to finish.
    pub(crate) async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            tracing::error!(target: "autosave", "Timer task failed: {}", e);
        }
    }
}

impl Drop for AutosaveTimer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
