//! Scheduling results.

use std::fmt;

use cadence_ir::{CircuitDag, NodeIndex, WireId};
use rustc_hash::FxHashMap;
use serde::Serialize;

/// A non-fatal condition found while scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleWarning {
    /// The DAG already carried a schedule, which has been replaced.
    AlreadyScheduled {
        /// Length of the replaced schedule.
        previous_length: u64,
    },
    /// The requested ALAP length was shorter than the minimum and was
    /// ignored.
    TargetLengthTooShort {
        /// Length the caller asked for.
        requested: u64,
        /// Minimum feasible length, used instead.
        required: u64,
    },
}

impl fmt::Display for ScheduleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleWarning::AlreadyScheduled { previous_length } => write!(
                f,
                "circuit was already scheduled (length {previous_length}); the old schedule was overwritten"
            ),
            ScheduleWarning::TargetLengthTooShort {
                requested,
                required,
            } => write!(
                f,
                "target length {requested} is shorter than the minimum {required}; using {required}"
            ),
        }
    }
}

/// Start times and durations of every operation of one DAG.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    /// Start time of every operation node.
    pub start_times: FxHashMap<NodeIndex, u64>,
    /// Resolved duration of every operation node.
    pub durations: FxHashMap<NodeIndex, u64>,
    /// Total length in ticks.
    pub total_duration: u64,
    /// Diagnostics collected during the run.
    pub warnings: Vec<ScheduleWarning>,
}

impl Schedule {
    /// Start time of a node.
    pub fn start_time(&self, node: NodeIndex) -> Option<u64> {
        self.start_times.get(&node).copied()
    }

    /// Resolved duration of a node.
    pub fn duration(&self, node: NodeIndex) -> Option<u64> {
        self.durations.get(&node).copied()
    }

    /// End time of a node, `None` if unscheduled or past `u64::MAX`.
    pub fn end_time(&self, node: NodeIndex) -> Option<u64> {
        self.start_time(node)?.checked_add(self.duration(node)?)
    }

    /// Number of scheduled nodes.
    pub fn len(&self) -> usize {
        self.start_times.len()
    }

    /// Check if nothing was scheduled.
    pub fn is_empty(&self) -> bool {
        self.start_times.is_empty()
    }
}

/// One operation on a wire's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    /// Node in the DAG.
    #[serde(skip)]
    pub node: NodeIndex,
    /// Operation name.
    pub name: String,
    /// Start time in ticks.
    pub start: u64,
    /// Duration in ticks.
    pub duration: u64,
    /// Whether the scheduler inserted this node to fill idle time.
    pub idle: bool,
}

/// A scheduled (and possibly padded) circuit.
#[derive(Debug, Clone)]
pub struct ScheduledCircuit {
    /// The annotated DAG.
    pub dag: CircuitDag,
    /// Timing of every node of `dag`.
    pub schedule: Schedule,
    /// Delay nodes inserted to fill idle time.
    pub idle_nodes: Vec<NodeIndex>,
}

impl ScheduledCircuit {
    /// Total length in ticks.
    pub fn total_duration(&self) -> u64 {
        self.schedule.total_duration
    }

    /// Warnings raised while scheduling.
    pub fn warnings(&self) -> &[ScheduleWarning] {
        &self.schedule.warnings
    }

    /// Operations on one wire, in wire order.
    pub fn timeline(&self, wire: WireId) -> Vec<TimelineEntry> {
        self.dag
            .wire_ops(wire)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|node| {
                let inst = self.dag.get_instruction(node)?;
                Some(TimelineEntry {
                    node,
                    name: inst.name().to_string(),
                    start: self.schedule.start_time(node)?,
                    duration: self.schedule.duration(node)?,
                    idle: self.idle_nodes.contains(&node),
                })
            })
            .collect()
    }
}
