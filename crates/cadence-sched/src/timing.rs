//! Two-channel timing model.
//!
//! An operation occupies its qubits for its whole duration, but its effect on
//! classical bits happens at a single instant inside that interval:
//!
//! - a conditional operation reads its condition register
//!   `conditional_latency` ticks before it starts;
//! - a measurement's result becomes visible `clbit_write_latency` ticks after
//!   it starts.

use crate::config::{BackendTiming, TimingConfig, WriteLatency};

/// Effective latencies for one scheduling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingModel {
    conditional_latency: u64,
    write_latency: WriteLatency,
}

impl Default for TimingModel {
    fn default() -> Self {
        Self {
            conditional_latency: 0,
            write_latency: WriteLatency::Ticks(0),
        }
    }
}

impl TimingModel {
    /// Resolve explicit settings against backend defaults.
    pub fn new(timing: &TimingConfig, backend: Option<&BackendTiming>) -> Self {
        let conditional_latency = timing
            .conditional_latency
            .or(backend.map(|b| b.conditional_latency))
            .unwrap_or(0);
        let write_latency = timing
            .clbit_write_latency
            .map(WriteLatency::Ticks)
            .or(backend.map(|b| b.clbit_write_latency))
            .unwrap_or(WriteLatency::Ticks(0));
        Self {
            conditional_latency,
            write_latency,
        }
    }

    /// Ticks between a condition read and the conditional operation's start.
    pub fn conditional_latency(&self) -> u64 {
        self.conditional_latency
    }

    /// Write latency of an operation lasting `duration` ticks.
    ///
    /// Never exceeds `duration`: a result cannot appear after the writing
    /// operation has ended.
    pub fn write_latency(&self, duration: u64) -> u64 {
        match self.write_latency {
            WriteLatency::Ticks(ticks) => ticks.min(duration),
            WriteLatency::FullDuration => duration,
        }
    }

    /// Earliest start of a conditional operation whose register is free at
    /// `available`. `None` on overflow.
    pub fn condition_ready_at(&self, available: u64) -> Option<u64> {
        available.checked_add(self.conditional_latency)
    }

    /// Instant at which a write by an operation starting at `start` is
    /// visible. `None` on overflow.
    pub fn write_visible_at(&self, start: u64, duration: u64) -> Option<u64> {
        start.checked_add(self.write_latency(duration))
    }
}
