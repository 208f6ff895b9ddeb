//! Replay configuration and validation.
//!
//! [`ReplayConfig`] controls when a replay stops and how cycle deltas are
//! turned into displayed time. [`validate()`](ReplayConfig::validate) runs
//! when a [`Replayer`](crate::Replayer) is constructed.

use thiserror::Error;

/// Conversion rate used when nothing better is known: one cycle per
/// nanosecond.
pub const DEFAULT_CYCLES_PER_SECOND: f64 = 1.0e9;

/// Source of the cycles-to-time conversion rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimeConversion {
    /// Always use this rate. Checkpoints are reported but ignored.
    Fixed {
        /// Cycle counter frequency in Hz.
        cycles_per_second: f64,
    },
    /// Use the rate from the most recent checkpoint, or the fallback until
    /// the first usable checkpoint arrives.
    Checkpoint {
        /// Rate used before any checkpoint is seen.
        fallback_cycles_per_second: f64,
    },
}

impl TimeConversion {
    /// The rate in effect before any checkpoint is applied.
    pub fn initial_rate(&self) -> f64 {
        match *self {
            Self::Fixed { cycles_per_second } => cycles_per_second,
            Self::Checkpoint {
                fallback_cycles_per_second,
            } => fallback_cycles_per_second,
        }
    }

    /// Whether checkpoint rates replace the initial rate.
    pub fn follows_checkpoints(&self) -> bool {
        matches!(self, Self::Checkpoint { .. })
    }
}

impl Default for TimeConversion {
    fn default() -> Self {
        Self::Fixed {
            cycles_per_second: DEFAULT_CYCLES_PER_SECOND,
        }
    }
}

/// Settings for one replay run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReplayConfig {
    /// Stop after this many messages. `None` = run to end of stream.
    pub message_limit: Option<u64>,
    /// How elapsed cycles are converted for display.
    pub time_conversion: TimeConversion,
}

impl ReplayConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.message_limit == Some(0) {
            return Err(ConfigError::ZeroMessageLimit);
        }
        let rate = self.time_conversion.initial_rate();
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::InvalidCyclesPerSecond { value: rate });
        }
        Ok(())
    }
}

/// Errors detected during [`ReplayConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A limit of zero messages would stop before the first entry; use
    /// `None` for an unlimited run.
    #[error("message limit must be positive (use no limit to replay everything)")]
    ZeroMessageLimit,
    /// The conversion rate is NaN, infinite, zero, or negative.
    #[error("cycles per second must be finite and positive, got {value}")]
    InvalidCyclesPerSecond {
        /// The invalid value.
        value: f64,
    },
}
