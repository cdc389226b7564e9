//! Latest-feasible (ALAP) scheduling.
//!
//! Runs the forward pass first to learn the minimal length and the earliest
//! start of every node, then walks the DAG in reverse topological order
//! placing nodes as early as possible in reverse time. See
//! [`crate::reversal`] for how classical latencies mirror.

use cadence_ir::{CircuitDag, NodeIndex, WireId};
use rustc_hash::FxHashMap;
use tracing::{debug, instrument};

use crate::asap::forward_pass;
use crate::availability::ResourceAvailability;
use crate::config::SchedulerConfig;
use crate::context::ScheduleContext;
use crate::duration::{DurationResolver, node_context};
use crate::error::{ScheduleError, ScheduleResult};
use crate::reversal::{MirroredLatencies, to_forward_start, validate_against_asap};
use crate::schedule::{Schedule, ScheduleWarning};
use crate::strategy::{self, ClbitAccess, SchedulingStrategy, clbit_access};
use crate::timing::TimingModel;

/// Places every operation at its latest feasible start.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlapScheduler {
    /// Requested total length. Ignored, with a warning, when shorter than
    /// the minimum.
    pub target_length: Option<u64>,
}

impl AlapScheduler {
    /// ALAP with the minimal total length.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stretch the schedule to `target_length` ticks.
    pub fn with_target_length(target_length: u64) -> Self {
        Self {
            target_length: Some(target_length),
        }
    }

    fn horizon(&self, ctx: &mut ScheduleContext, required: u64) -> u64 {
        match self.target_length {
            Some(requested) if requested >= required => requested,
            Some(requested) => {
                debug!(requested, required, "target length too short, ignoring");
                ctx.warn(ScheduleWarning::TargetLengthTooShort {
                    requested,
                    required,
                });
                required
            }
            None => required,
        }
    }
}

impl SchedulingStrategy for AlapScheduler {
    fn name(&self) -> &'static str {
        "alap"
    }

    #[instrument(skip_all, fields(ops = dag.num_ops(), target = ?self.target_length))]
    fn schedule(
        &self,
        dag: &mut CircuitDag,
        config: &SchedulerConfig,
    ) -> ScheduleResult<Schedule> {
        let mut ctx = strategy::begin(dag);
        let timing = TimingModel::new(&config.timing, config.backend.as_ref());
        let resolver = DurationResolver::new().with_table(&config.durations);

        let forward_length = forward_pass(dag, &mut ctx, &timing, &resolver)?;
        let asap = ctx.start_times().clone();

        let mirrored = MirroredLatencies::new(timing);
        let mut reverse = ResourceAvailability::new(dag.wires());
        let mut reverse_starts = Vec::with_capacity(asap.len());
        for node in strategy::topological_order(dag)?.into_iter().rev() {
            let duration = resolved_duration(&ctx, node)?;
            let start = place_reverse(dag, &mut reverse, &mirrored, node, duration)?;
            reverse_starts.push((node, start, duration));
        }

        let required = forward_length.max(reverse.horizon());
        let horizon = self.horizon(&mut ctx, required);

        let mut alap = FxHashMap::default();
        for (node, reverse_start, duration) in reverse_starts {
            let start = to_forward_start(horizon, reverse_start, duration).ok_or_else(|| {
                ScheduleError::InvalidGraph(format!(
                    "node {} ends after the schedule horizon {horizon}",
                    node.index()
                ))
            })?;
            alap.insert(node, start);
        }
        validate_against_asap(dag, &asap, &alap)?;

        ctx.replace_start_times(alap);
        debug!(total = horizon, "ALAP schedule complete");
        Ok(strategy::finish(dag, ctx, horizon))
    }
}

fn resolved_duration(ctx: &ScheduleContext, node: NodeIndex) -> ScheduleResult<u64> {
    ctx.duration(node).ok_or_else(|| {
        ScheduleError::InvalidGraph(format!(
            "node {} was not visited by the forward pass",
            node.index()
        ))
    })
}

fn place_reverse(
    dag: &CircuitDag,
    avail: &mut ResourceAvailability,
    mirrored: &MirroredLatencies,
    node: NodeIndex,
    duration: u64,
) -> ScheduleResult<u64> {
    let inst = dag.get_instruction(node).ok_or_else(|| {
        ScheduleError::InvalidGraph(format!("node {} is not an operation", node.index()))
    })?;
    let qubits = inst.qubits.iter().copied().map(WireId::Qubit);
    let earliest_data = avail.latest(qubits.clone());
    let overflow = || ScheduleError::TimeOverflow {
        context: node_context(node, inst),
    };

    let start = match clbit_access(inst)? {
        ClbitAccess::Read => {
            let cond = inst.condition_clbits().iter().copied().map(WireId::Clbit);
            let start =
                earliest_data.max(mirrored.reader_earliest(avail.latest(cond.clone()), duration));
            let released = mirrored
                .reader_release(start, duration)
                .ok_or_else(overflow)?;
            for wire in cond {
                avail.advance(wire, released);
            }
            start
        }
        ClbitAccess::Write => {
            let written = inst.clbits.iter().copied().map(WireId::Clbit);
            let start =
                earliest_data.max(mirrored.writer_earliest(avail.latest(written.clone()), duration));
            let released = mirrored
                .writer_release(start, duration)
                .ok_or_else(overflow)?;
            for wire in written {
                avail.advance(wire, released);
            }
            start
        }
        ClbitAccess::None => earliest_data,
    };

    let end = start.checked_add(duration).ok_or_else(overflow)?;
    for wire in qubits {
        avail.advance(wire, end);
    }
    Ok(start)
}
