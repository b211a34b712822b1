//! Timed purge of expired quarantine records.
//!
//! Runs on its own thread driving a single-threaded tokio runtime, so it
//! works whether or not the host has an event loop of its own. The check
//! cadence is fixed and independent of the retention window.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::Local;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

use crate::engine::QuarantineEngine;

/// How often the sweep checks for expired records.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(10 * 60);

pub struct AutoPurgeScheduler {
    engine: Arc<QuarantineEngine>,
    check_interval: Duration,
    running: Mutex<Option<RunningSweep>>,
}

struct RunningSweep {
    shutdown: Arc<AtomicBool>,
    wake: Arc<Notify>,
    handle: JoinHandle<()>,
    retention_hours: u32,
}

impl AutoPurgeScheduler {
    pub fn new(engine: Arc<QuarantineEngine>) -> Self {
        Self::with_interval(engine, DEFAULT_CHECK_INTERVAL)
    }

    pub fn with_interval(engine: Arc<QuarantineEngine>, check_interval: Duration) -> Self {
        Self {
            engine,
            check_interval,
            running: Mutex::new(None),
        }
    }

    /// Starts sweeping with the given retention window.
    ///
    /// Returns `false` without doing anything when a sweep is already
    /// running or `retention_hours` is 0.
    pub fn start(&self, retention_hours: u32) -> bool {
        if retention_hours == 0 {
            return false;
        }

        let mut running = self.lock_running();
        if running.is_some() {
            return false;
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());
        let handle = {
            let engine = Arc::clone(&self.engine);
            let shutdown = Arc::clone(&shutdown);
            let wake = Arc::clone(&wake);
            let interval = self.check_interval;
            std::thread::spawn(move || run_loop(engine, interval, retention_hours, shutdown, wake))
        };

        log::info!(
            "Auto-purge started: retention {}h, checking every {:?}",
            retention_hours,
            self.check_interval
        );
        *running = Some(RunningSweep {
            shutdown,
            wake,
            handle,
            retention_hours,
        });
        true
    }

    /// Stops the sweep and waits for its thread. Does not wait for the next
    /// tick. Returns `false` if nothing was running.
    pub fn stop(&self) -> bool {
        let Some(sweep) = self.lock_running().take() else {
            return false;
        };

        sweep.shutdown.store(true, Ordering::Release);
        sweep.wake.notify_one();
        if sweep.handle.join().is_err() {
            log::error!("Auto-purge thread panicked");
        }
        log::info!("Auto-purge stopped");
        true
    }

    /// Restarts with a new retention window; 0 leaves it stopped.
    pub fn set_retention_hours(&self, retention_hours: u32) {
        self.stop();
        self.start(retention_hours);
    }

    /// Runs a sweep now instead of waiting for the next tick.
    pub fn trigger(&self) {
        if let Some(sweep) = self.lock_running().as_ref() {
            sweep.wake.notify_one();
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_running().is_some()
    }

    /// Retention window of the running sweep.
    pub fn retention_hours(&self) -> Option<u32> {
        self.lock_running().as_ref().map(|s| s.retention_hours)
    }

    fn lock_running(&self) -> MutexGuard<'_, Option<RunningSweep>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for AutoPurgeScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    engine: Arc<QuarantineEngine>,
    interval: Duration,
    retention_hours: u32,
    shutdown: Arc<AtomicBool>,
    wake: Arc<Notify>,
) {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to build auto-purge runtime: {}", e);
            return;
        }
    };

    rt.block_on(async {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        timer.tick().await; // skip immediate first tick

        loop {
            if shutdown.load(Ordering::Acquire) {
                break;
            }

            tokio::select! {
                _ = timer.tick() => {},
                _ = wake.notified() => {
                    log::debug!("Auto-purge woken");
                },
            }

            if shutdown.load(Ordering::Acquire) {
                break;
            }

            sweep(&engine, retention_hours);
        }
    });
}

fn sweep(engine: &QuarantineEngine, retention_hours: u32) {
    match engine.purge_expired(retention_hours, Local::now().naive_local()) {
        Ok(report) if !report.purged.is_empty() || !report.failed.is_empty() => {
            log::info!(
                "Auto-purge: {} purged, {} failed, {} kept",
                report.purged.len(),
                report.failed.len(),
                report.retained
            );
        }
        Ok(_) => log::debug!("Auto-purge: nothing expired"),
        Err(e) => log::error!("Auto-purge sweep failed: {}", e),
    }
}
