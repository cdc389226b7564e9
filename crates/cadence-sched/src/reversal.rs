//! Reverse-time arithmetic for latest-feasible scheduling.
//!
//! The ALAP pass walks the DAG backwards and places every operation as early
//! as possible in *reverse* time, where an operation occupying `[s, s + d)`
//! in forward time occupies `[L - s - d, L - s)` for horizon `L`. Classical
//! bit accesses happen at an offset inside the operation, so their offsets
//! flip sides:
//!
//! | access | forward instant | reverse instant |
//! |--------|-----------------|-----------------|
//! | condition read | `s - conditional_latency` | `r + d + conditional_latency` |
//! | register write | `s + write_latency` | `r + d - write_latency` |
//!
//! Ordering constraints between accesses are the same in both directions,
//! so the reverse pass produces the latest solution of exactly the
//! constraints the forward pass solves earliest.

use cadence_ir::{CircuitDag, NodeIndex};
use rustc_hash::FxHashMap;

use crate::duration::node_context;
use crate::error::{ScheduleError, ScheduleResult};
use crate::timing::TimingModel;

/// Classical-bit latencies mirrored into reverse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirroredLatencies {
    model: TimingModel,
}

impl MirroredLatencies {
    /// Mirror a forward timing model.
    pub fn new(model: TimingModel) -> Self {
        Self { model }
    }

    /// Earliest reverse start of a conditional operation whose condition bit
    /// is released at `clbit_free` (reverse time).
    pub fn reader_earliest(&self, clbit_free: u64, duration: u64) -> u64 {
        clbit_free.saturating_sub(duration)
    }

    /// Reverse time at which the condition bit is released by a conditional
    /// operation starting at `start`. `None` on overflow.
    pub fn reader_release(&self, start: u64, duration: u64) -> Option<u64> {
        start
            .checked_add(duration)?
            .checked_add(self.model.conditional_latency())
    }

    /// Earliest reverse start of a writer whose target bit is released at
    /// `clbit_free`.
    pub fn writer_earliest(&self, clbit_free: u64, duration: u64) -> u64 {
        clbit_free.saturating_sub(duration - self.model.write_latency(duration))
    }

    /// Reverse time at which the target bit is released by a writer starting
    /// at `start`. `None` on overflow.
    pub fn writer_release(&self, start: u64, duration: u64) -> Option<u64> {
        start.checked_add(duration - self.model.write_latency(duration))
    }
}

/// Convert a reverse start time into a forward start time for `horizon`.
///
/// `None` if the operation would end after the horizon.
pub fn to_forward_start(horizon: u64, reverse_start: u64, duration: u64) -> Option<u64> {
    horizon.checked_sub(reverse_start.checked_add(duration)?)
}

/// Check that no operation starts earlier under ALAP than under ASAP.
///
/// Nodes are checked in index order so the first violation reported is
/// deterministic.
pub fn validate_against_asap(
    dag: &CircuitDag,
    asap: &FxHashMap<NodeIndex, u64>,
    alap: &FxHashMap<NodeIndex, u64>,
) -> ScheduleResult<()> {
    let mut nodes: Vec<_> = alap.keys().copied().collect();
    nodes.sort_unstable();

    for node in nodes {
        let alap_start = alap[&node];
        let Some(&asap_start) = asap.get(&node) else {
            return Err(ScheduleError::InvalidGraph(format!(
                "node {} has no ASAP start time",
                node.index()
            )));
        };
        if alap_start < asap_start {
            let inst = dag.get_instruction(node).ok_or_else(|| {
                ScheduleError::InvalidGraph(format!("node {} is not an operation", node.index()))
            })?;
            return Err(ScheduleError::InconsistentSchedule {
                context: node_context(node, inst),
                asap: asap_start,
                alap: alap_start,
            });
        }
    }
    Ok(())
}
