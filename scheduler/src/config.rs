//! Simulation parameters.

use crate::scheduler::Tick;
use std::time::Duration;

pub const DEFAULT_LEVELS: u32 = 20;
pub const DEFAULT_STARVATION_THRESHOLD: Tick = 20;
/// One tick of virtual time lasts one wall-clock second.
pub const DEFAULT_QUANTUM_MS: u64 = 1000;
pub const DEFAULT_DRAIN_DELAY_MS: u64 = 1000;
pub const DEFAULT_QUANTUM: Duration = Duration::from_millis(DEFAULT_QUANTUM_MS);
pub const DEFAULT_DRAIN_DELAY: Duration = Duration::from_millis(DEFAULT_DRAIN_DELAY_MS);

/// Smallest bank that still has a feedback level next to the real-time one.
pub const MIN_LEVELS: u32 = 2;
pub const MAX_LEVELS: u32 = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Total number of priority levels, real-time level included.
    pub levels: u32,
    /// Ready-queue wait (in ticks) at which a non-real-time task is evicted.
    pub starvation_threshold: Tick,
    /// Wall-clock pacing of one tick.
    pub quantum: Duration,
    /// Pause after the last task leaves the system.
    pub drain_delay: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            levels: DEFAULT_LEVELS,
            starvation_threshold: DEFAULT_STARVATION_THRESHOLD,
            quantum: DEFAULT_QUANTUM,
            drain_delay: DEFAULT_DRAIN_DELAY,
        }
    }
}

impl SimulationConfig {
    /// Default levels and threshold without any wall-clock pacing.
    #[must_use]
    pub fn unpaced() -> Self {
        Self::default()
            .with_quantum(Duration::ZERO)
            .with_drain_delay(Duration::ZERO)
    }

    #[must_use]
    pub const fn with_levels(mut self, levels: u32) -> Self {
        self.levels = levels;
        self
    }

    #[must_use]
    pub const fn with_starvation_threshold(mut self, threshold: Tick) -> Self {
        self.starvation_threshold = threshold;
        self
    }

    #[must_use]
    pub const fn with_quantum(mut self, quantum: Duration) -> Self {
        self.quantum = quantum;
        self
    }

    #[must_use]
    pub const fn with_drain_delay(mut self, drain_delay: Duration) -> Self {
        self.drain_delay = drain_delay;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_LEVELS..=MAX_LEVELS).contains(&self.levels) {
            return Err(ConfigError::InvalidLevels(self.levels));
        }
        if self.starvation_threshold == 0 {
            return Err(ConfigError::ZeroStarvationThreshold);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("level count must be between {MIN_LEVELS} and {MAX_LEVELS}, got {0}")]
    InvalidLevels(u32),

    #[error("starvation threshold must be at least one tick")]
    ZeroStarvationThreshold,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.levels, 20);
        assert_eq!(config.starvation_threshold, 20);
        assert_eq!(config.quantum, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_banks() {
        assert_eq!(
            SimulationConfig::unpaced().with_levels(1).validate(),
            Err(ConfigError::InvalidLevels(1))
        );
        assert_eq!(
            SimulationConfig::unpaced().with_levels(257).validate(),
            Err(ConfigError::InvalidLevels(257))
        );
        assert_eq!(
            SimulationConfig::unpaced()
                .with_starvation_threshold(0)
                .validate(),
            Err(ConfigError::ZeroStarvationThreshold)
        );
    }
}
