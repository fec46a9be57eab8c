//! Periodic cycle scheduler.
//!
//! Owns the timer that drives collection cycles. The scheduler is a plain
//! value held in application state, not a process-wide singleton; `start`
//! is idempotent per instance, guarded by an atomic flag, so a retrying
//! startup path can call it twice without doubling the schedule.
//!
//! The timer is unconditional: cycle outcomes (including total failure) are
//! counters and log lines, never a reason to stop ticking.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::collector::cycle::CycleRunner;

/// Scheduler counters exposed on the status endpoint
#[derive(Clone, Copy, Debug, Serialize)]
pub struct SchedulerStatus {
    pub started: bool,
    pub cycles_completed: u64,
    pub cycles_in_flight: u32,
    pub cycles_until_maintenance: u32,
}

/// Drives a [`CycleRunner`] on a fixed period
pub struct FeeScheduler {
    runner: Arc<dyn CycleRunner>,
    period: Duration,
    maintenance_cadence: u32,
    started: AtomicBool,
    /// Cycles since the last maintenance pass
    cycle_counter: AtomicU32,
    cycles_completed: AtomicU64,
    in_flight: AtomicU32,
}

impl FeeScheduler {
    pub fn new(runner: Arc<dyn CycleRunner>, period: Duration, maintenance_cadence: u32) -> Self {
        Self {
            runner,
            period,
            maintenance_cadence,
            started: AtomicBool::new(false),
            cycle_counter: AtomicU32::new(0),
            cycles_completed: AtomicU64::new(0),
            in_flight: AtomicU32::new(0),
        }
    }

    /// Start the periodic schedule: first cycle immediately, then one per
    /// period. Returns false (and spawns nothing) if already started.
    pub fn start(self: Arc<Self>) -> bool {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Scheduler already started, ignoring duplicate start");
            return false;
        }

        info!(
            period_secs = self.period.as_secs(),
            maintenance_cadence = self.maintenance_cadence,
            "Starting fee-collection schedule"
        );

        let scheduler = self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(scheduler.period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                scheduler.run_cycle().await;
            }
        });

        true
    }

    async fn run_cycle(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.runner.run_collection().await;

        let since_maintenance = self.cycle_counter.fetch_add(1, Ordering::SeqCst) + 1;
        if since_maintenance >= self.maintenance_cadence {
            self.runner.run_maintenance().await;
            self.cycle_counter.store(0, Ordering::SeqCst);
        }

        self.cycles_completed.fetch_add(1, Ordering::SeqCst);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> SchedulerStatus {
        let since_maintenance = self.cycle_counter.load(Ordering::SeqCst);
        SchedulerStatus {
            started: self.is_started(),
            cycles_completed: self.cycles_completed.load(Ordering::SeqCst),
            cycles_in_flight: self.in_flight.load(Ordering::SeqCst),
            cycles_until_maintenance: self.maintenance_cadence.saturating_sub(since_maintenance),
        }
    }
}
