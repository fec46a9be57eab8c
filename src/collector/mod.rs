//! Periodic fee collection: scheduler, per-cycle batch, co-signing builder.

pub mod builder;
pub mod cycle;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::CoSigner;
pub use cycle::{CycleOutcome, CycleRunner, FeeCollector};
pub use scheduler::{FeeScheduler, SchedulerStatus};
