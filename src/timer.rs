//! Elapsed-time engine for the charging timer
//!
//! This module tracks elapsed time for a charging session, supports
//! pause/resume, and publishes the current elapsed value once per tick as an
//! observable value.

use crate::logging::get_logger;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, interval};
use tokio_stream::wrappers::WatchStream;

/// Elapsed-time engine with pause/resume support
///
/// Elapsed time is re-based on the wall clock (`offset + (now - start)`)
/// rather than accumulated from tick counts, so delayed scheduling never
/// drifts the value. At most one tick task exists per engine instance.
pub struct ElapsedTimer {
    /// Interval between published updates
    tick_interval: Duration,

    /// Publisher for the current elapsed value in whole seconds
    elapsed_tx: Arc<watch::Sender<u64>>,

    /// Running tick task, if any
    tick_task: Option<JoinHandle<()>>,

    /// Accumulated elapsed time carried across pause/resume boundaries
    offset: Duration,

    /// Start instant of the current running stretch
    started_at: Option<Instant>,

    /// Logger
    logger: crate::logging::StructuredLogger,
}

impl ElapsedTimer {
    /// Create a new engine publishing updates at the given interval
    pub fn new(tick_interval: Duration) -> Self {
        let (elapsed_tx, _elapsed_rx) = watch::channel(0u64);
        Self {
            tick_interval,
            elapsed_tx: Arc::new(elapsed_tx),
            tick_task: None,
            offset: Duration::ZERO,
            started_at: None,
            logger: get_logger("timer"),
        }
    }

    /// Start (or restart) the engine from the given offset
    ///
    /// Any previously running tick task is cancelled first, so a repeated
    /// start is an idempotent restart.
    pub fn start(&mut self, initial_offset: Duration) {
        self.cancel_tick_task();

        let started = Instant::now();
        self.offset = initial_offset;
        self.started_at = Some(started);

        let tx = Arc::clone(&self.elapsed_tx);
        let offset = initial_offset;
        let tick_interval = self.tick_interval;
        self.tick_task = Some(tokio::spawn(async move {
            let mut tick = interval(tick_interval);
            loop {
                tick.tick().await;
                tx.send_replace((offset + started.elapsed()).as_secs());
            }
        }));

        self.logger.debug(&format!(
            "Timer started at offset {}s",
            initial_offset.as_secs()
        ));
    }

    /// Pause the engine, retaining the elapsed value as the resume offset
    pub fn pause(&mut self) {
        if let Some(started) = self.started_at.take() {
            self.offset += started.elapsed();
        }
        self.cancel_tick_task();
        self.elapsed_tx.send_replace(self.offset.as_secs());
        self.logger
            .debug(&format!("Timer paused at {}s", self.offset.as_secs()));
    }

    /// Resume from the offset retained by a previous pause
    ///
    /// A no-op while the engine is already running.
    pub fn resume(&mut self) {
        if self.started_at.is_none() {
            self.start(self.offset);
        }
    }

    /// Stop the engine and reset the elapsed value to zero
    pub fn stop(&mut self) {
        self.cancel_tick_task();
        self.offset = Duration::ZERO;
        self.started_at = None;
        self.elapsed_tx.send_replace(0);
        self.logger.debug("Timer stopped");
    }

    /// Current elapsed time
    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started) => self.offset + started.elapsed(),
            None => self.offset,
        }
    }

    /// Current elapsed time in whole seconds
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed().as_secs()
    }

    /// Whether a tick task is currently producing updates
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Subscribe to elapsed-value updates
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.elapsed_tx.subscribe()
    }

    /// Elapsed-value updates as an async stream
    pub fn elapsed_stream(&self) -> WatchStream<u64> {
        WatchStream::new(self.subscribe())
    }

    fn cancel_tick_task(&mut self) {
        if let Some(task) = self.tick_task.take() {
            task.abort();
        }
    }
}

impl Default for ElapsedTimer {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Drop for ElapsedTimer {
    fn drop(&mut self) {
        self.cancel_tick_task();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn elapsed_tracks_wall_clock() {
        let mut timer = ElapsedTimer::default();
        timer.start(Duration::ZERO);
        advance(Duration::from_secs(3)).await;
        assert_eq!(timer.elapsed_seconds(), 3);
        assert!(timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn start_replaces_running_task() {
        let mut timer = ElapsedTimer::default();
        timer.start(Duration::ZERO);
        advance(Duration::from_secs(10)).await;
        // Restart from a fresh offset; the old tick task must not survive
        timer.start(Duration::from_secs(2));
        advance(Duration::from_secs(1)).await;
        assert_eq!(timer.elapsed_seconds(), 3);
    }
}
