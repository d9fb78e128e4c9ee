//! # Auto-Sync Scheduler
//!
//! Background push loop for the lifetime of an authenticated session.
//!
//! ## Run Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     AutoSyncScheduler Loop                              │
//! │                                                                         │
//! │   every interval (default 60s):                                        │
//! │       engine.run_scheduled_pass()                                      │
//! │           └── push-only, try_lock: SKIPS if a pass is running          │
//! │                                                                         │
//! │   shutdown channel: break immediately                                  │
//! │                                                                         │
//! │  LIFECYCLE:                                                            │
//! │  • started when a (non-trial) session is established                   │
//! │  • stopped and restarted on every session transition                   │
//! │  • a pass can never overlap itself or a manual force_sync              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::SyncEngine;

/// Background push scheduler.
pub struct AutoSyncScheduler {
    /// Engine to drive.
    engine: Arc<SyncEngine>,

    /// Interval between passes.
    interval: Duration,

    /// Shutdown receiver.
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping a running scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SchedulerHandle {
    /// Triggers graceful shutdown. Safe to call after the loop has already
    /// stopped.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl AutoSyncScheduler {
    /// Creates a scheduler and its control handle.
    pub fn new(engine: Arc<SyncEngine>, interval: Duration) -> (Self, SchedulerHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let scheduler = AutoSyncScheduler {
            engine,
            interval,
            shutdown_rx,
        };

        (scheduler, SchedulerHandle { shutdown_tx })
    }

    /// Creates and spawns a scheduler, returning its handle.
    pub fn spawn(engine: Arc<SyncEngine>, interval: Duration) -> SchedulerHandle {
        let (scheduler, handle) = Self::new(engine, interval);
        tokio::spawn(scheduler.run());
        handle
    }

    /// Runs the scheduler loop.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        info!(interval_secs = self.interval.as_secs(), "Auto-sync scheduler starting");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; consume it so the first real
        // pass lands one interval after startup (the initializer has just
        // synced).
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    debug!("Scheduled sync pass");
                    self.engine.run_scheduled_pass().await;
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Auto-sync scheduler shutting down");
                    break;
                }
            }
        }

        info!("Auto-sync scheduler stopped");
    }
}
