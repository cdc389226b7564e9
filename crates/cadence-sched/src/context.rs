//! Per-run scheduling state.

use cadence_ir::{CircuitDag, NodeIndex, QubitId};
use rustc_hash::FxHashMap;

use crate::availability::ResourceAvailability;
use crate::duration::DurationResolver;
use crate::error::ScheduleResult;
use crate::schedule::{Schedule, ScheduleWarning};

/// Mutable state owned by a single scheduling run.
///
/// A context is created fresh for every run and consumed into the
/// resulting [`Schedule`]; nothing is shared between runs.
#[derive(Debug, Clone)]
pub struct ScheduleContext {
    availability: ResourceAvailability,
    start_times: FxHashMap<NodeIndex, u64>,
    durations: FxHashMap<NodeIndex, u64>,
    warnings: Vec<ScheduleWarning>,
    qubit_indices: FxHashMap<QubitId, u32>,
}

impl ScheduleContext {
    /// Fresh state for scheduling `dag`.
    ///
    /// Qubits are indexed by their position in the DAG's sorted qubit list.
    pub fn new(dag: &CircuitDag) -> Self {
        Self {
            availability: ResourceAvailability::new(dag.wires()),
            start_times: FxHashMap::default(),
            durations: FxHashMap::default(),
            warnings: Vec::new(),
            qubit_indices: dag.qubits().into_iter().zip(0u32..).collect(),
        }
    }

    /// Wire availability.
    pub fn availability(&self) -> &ResourceAvailability {
        &self.availability
    }

    /// Mutable wire availability.
    pub fn availability_mut(&mut self) -> &mut ResourceAvailability {
        &mut self.availability
    }

    /// Qubit to index map used for calibration lookup.
    pub fn qubit_indices(&self) -> &FxHashMap<QubitId, u32> {
        &self.qubit_indices
    }

    /// Duration of `node`, resolving it on first use.
    pub fn duration_of(
        &mut self,
        dag: &mut CircuitDag,
        node: NodeIndex,
        resolver: &DurationResolver<'_>,
    ) -> ScheduleResult<u64> {
        if let Some(&duration) = self.durations.get(&node) {
            return Ok(duration);
        }
        let duration = resolver.resolve(dag, node, &self.qubit_indices)?;
        self.durations.insert(node, duration);
        Ok(duration)
    }

    /// Record the start time of a node.
    pub fn set_start(&mut self, node: NodeIndex, start: u64) {
        self.start_times.insert(node, start);
    }

    /// Start time recorded for a node.
    pub fn start_time(&self, node: NodeIndex) -> Option<u64> {
        self.start_times.get(&node).copied()
    }

    /// All recorded start times.
    pub fn start_times(&self) -> &FxHashMap<NodeIndex, u64> {
        &self.start_times
    }

    /// Replace every start time at once.
    pub fn replace_start_times(&mut self, start_times: FxHashMap<NodeIndex, u64>) {
        self.start_times = start_times;
    }

    /// Resolved duration of a node, if already known.
    pub fn duration(&self, node: NodeIndex) -> Option<u64> {
        self.durations.get(&node).copied()
    }

    /// Append a diagnostic.
    pub fn warn(&mut self, warning: ScheduleWarning) {
        self.warnings.push(warning);
    }

    /// Diagnostics collected so far.
    pub fn warnings(&self) -> &[ScheduleWarning] {
        &self.warnings
    }

    /// Finish the run.
    pub fn into_schedule(self, total_duration: u64) -> Schedule {
        Schedule {
            start_times: self.start_times,
            durations: self.durations,
            total_duration,
            warnings: self.warnings,
        }
    }
}
