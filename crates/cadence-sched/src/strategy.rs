//! Scheduling strategies.

use std::fmt;

use cadence_ir::{CircuitDag, Instruction, IrError, NodeIndex, ScheduleAnnotation};

use crate::alap::AlapScheduler;
use crate::asap::AsapScheduler;
use crate::config::SchedulerConfig;
use crate::context::ScheduleContext;
use crate::error::{ScheduleError, ScheduleResult};
use crate::schedule::{Schedule, ScheduleWarning};

/// A way of assigning start times to every operation of a DAG.
///
/// Strategies resolve durations (writing them back onto the DAG), record
/// the resulting start times as the DAG's schedule annotation and return
/// the schedule. They never add or remove nodes.
pub trait SchedulingStrategy: Send + Sync {
    /// Get the name of this strategy.
    fn name(&self) -> &str;

    /// Schedule `dag`.
    fn schedule(&self, dag: &mut CircuitDag, config: &SchedulerConfig)
    -> ScheduleResult<Schedule>;
}

/// Which strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulingPolicy {
    /// Earliest feasible start for every operation.
    #[default]
    Asap,
    /// Latest feasible start, keeping the minimal total length unless a
    /// longer `target_length` is requested.
    Alap {
        /// Requested total length in ticks.
        target_length: Option<u64>,
    },
}

impl SchedulingPolicy {
    /// Instantiate the strategy for this policy.
    pub fn strategy(&self) -> Box<dyn SchedulingStrategy> {
        match *self {
            SchedulingPolicy::Asap => Box::new(AsapScheduler),
            SchedulingPolicy::Alap { target_length } => Box::new(AlapScheduler { target_length }),
        }
    }
}

impl fmt::Display for SchedulingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingPolicy::Asap => write!(f, "asap"),
            SchedulingPolicy::Alap {
                target_length: None,
            } => write!(f, "alap"),
            SchedulingPolicy::Alap {
                target_length: Some(target),
            } => write!(f, "alap(target={target})"),
        }
    }
}

/// How an operation interacts with classical bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClbitAccess {
    /// Touches no classical bits.
    None,
    /// Reads its condition bits before starting.
    Read,
    /// Writes its classical bits while running.
    Write,
}

/// Classify an instruction, rejecting combinations that cannot be timed.
pub(crate) fn clbit_access(inst: &Instruction) -> ScheduleResult<ClbitAccess> {
    if inst.is_conditional() {
        if !(inst.is_gate() || inst.is_delay()) {
            return Err(ScheduleError::InvalidGraph(format!(
                "conditional '{}' cannot be scheduled; only gates and delays may carry a condition",
                inst.name()
            )));
        }
        return Ok(ClbitAccess::Read);
    }
    if inst.is_measure() {
        return Ok(ClbitAccess::Write);
    }
    if !inst.clbits.is_empty() {
        return Err(ScheduleError::InvalidGraph(format!(
            "'{}' writes classical bits but is not a measurement",
            inst.name()
        )));
    }
    Ok(ClbitAccess::None)
}

/// Operation nodes in the fixed topological order.
///
/// A DAG without one (it contains a cycle) cannot be scheduled.
pub(crate) fn topological_order(dag: &CircuitDag) -> ScheduleResult<Vec<NodeIndex>> {
    dag.topological_op_nodes().map_err(unschedulable)
}

fn unschedulable(err: IrError) -> ScheduleError {
    ScheduleError::InvalidGraph(err.to_string())
}

/// Start a run: fresh context, plus a warning if the DAG was already
/// scheduled.
pub(crate) fn begin(dag: &CircuitDag) -> ScheduleContext {
    let mut ctx = ScheduleContext::new(dag);
    if let Some(previous) = dag.schedule() {
        ctx.warn(ScheduleWarning::AlreadyScheduled {
            previous_length: previous.duration,
        });
    }
    ctx
}

/// Finish a run: annotate the DAG and hand back the schedule.
pub(crate) fn finish(dag: &mut CircuitDag, ctx: ScheduleContext, total_duration: u64) -> Schedule {
    dag.set_schedule(ScheduleAnnotation {
        start_times: ctx.start_times().clone(),
        duration: total_duration,
    });
    ctx.into_schedule(total_duration)
}
