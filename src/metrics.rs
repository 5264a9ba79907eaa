//! Phase timing collection and the logging bootstrap.
//!
//! The engine performs no I/O of its own; everything observable goes
//! through `tracing`, with per-phase wall-clock timings at debug level and
//! rare events (zone shifts, migrations, extinctions) at info/debug.

use std::time::Duration;

/// Wall-clock cost of each phase of the most recent tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseTimings {
    pub caches: Duration,
    pub aging: Duration,
    pub movement: Duration,
    pub predation: Duration,
    pub reproduction: Duration,
    pub total: Duration,
}

impl PhaseTimings {
    pub fn log(&self, generation: u64) {
        tracing::debug!(
            generation,
            total_us = self.total.as_micros() as u64,
            caches_us = self.caches.as_micros() as u64,
            aging_us = self.aging.as_micros() as u64,
            movement_us = self.movement.as_micros() as u64,
            predation_us = self.predation.as_micros() as u64,
            reproduction_us = self.reproduction.as_micros() as u64,
            "tick timings"
        );
    }
}

/// Install the global tracing subscriber. Safe to call more than once;
/// later calls are ignored.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).try_init().ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timings_default_to_zero() {
        let timings = PhaseTimings::default();
        assert_eq!(timings.total, Duration::ZERO);
        timings.log(0);
    }

    #[test]
    fn init_logging_is_idempotent() {
        init_logging();
        init_logging();
    }
}
