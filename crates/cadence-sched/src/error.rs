//! Error types for scheduling and configuration.

use std::fmt;

use cadence_ir::{IrError, NodeIndex, QubitId};
use thiserror::Error;

/// Identifies the operation an error refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeContext {
    /// Node in the DAG.
    pub node: NodeIndex,
    /// Operation name.
    pub name: String,
    /// Qubits the operation acts on.
    pub qubits: Vec<QubitId>,
}

impl fmt::Display for NodeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let qubits: Vec<_> = self.qubits.iter().map(ToString::to_string).collect();
        write!(
            f,
            "'{}' on [{}] (node {})",
            self.name,
            qubits.join(", "),
            self.node.index()
        )
    }
}

/// Errors that can occur while scheduling.
///
/// Every variant is fatal: a failed run returns no partial schedule.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScheduleError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] IrError),

    /// The duration is still a symbolic expression.
    #[error("Duration of {context} depends on unbound parameters: {symbols}")]
    UnboundParameter {
        /// The offending operation.
        context: NodeContext,
        /// Unbound symbol names, comma separated.
        symbols: String,
    },

    /// No calibration, instruction duration or backend entry applies.
    #[error("No duration available for {context}")]
    MissingDuration {
        /// The offending operation.
        context: NodeContext,
    },

    /// The duration is not a non-negative whole number of ticks.
    #[error("Invalid duration {value} for {context}: expected a non-negative whole number of ticks")]
    InvalidDuration {
        /// The offending operation.
        context: NodeContext,
        /// The value that was found.
        value: f64,
    },

    /// The graph cannot be scheduled.
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    /// A start or end time does not fit in 64 bits.
    #[error("Time overflow while placing {context}: schedule exceeds {max} ticks", max = u64::MAX)]
    TimeOverflow {
        /// The offending operation.
        context: NodeContext,
    },

    /// ALAP placed an operation earlier than ASAP did.
    #[error("Inconsistent schedule for {context}: ALAP start {alap} before ASAP start {asap}")]
    InconsistentSchedule {
        /// The offending operation.
        context: NodeContext,
        /// Earliest feasible start.
        asap: u64,
        /// Start chosen by the latest-feasible pass.
        alap: u64,
    },
}

/// Result type for scheduling operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the configuration failed.
    #[error("IO error: {0}")]
    Io(String),

    /// The configuration is not valid YAML for this schema.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configuration parsed but holds unusable values.
    #[error("Validation error: {0}")]
    Validation(String),
}
