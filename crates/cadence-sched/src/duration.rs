//! Duration resolution.

use cadence_ir::{CircuitDag, Instruction, NodeIndex, ParameterExpression, QubitId};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::config::DurationTable;
use crate::error::{NodeContext, ScheduleError, ScheduleResult};

/// Tolerance when checking that a duration is a whole number of ticks.
const TICK_TOLERANCE: f64 = 1e-9;

/// Build the error context for an operation node.
pub(crate) fn node_context(node: NodeIndex, inst: &Instruction) -> NodeContext {
    NodeContext {
        node,
        name: inst.name().to_string(),
        qubits: inst.qubits.clone(),
    }
}

/// Resolves the duration of each operation.
///
/// Sources, in order of precedence:
/// 1. a calibration attached to the DAG for this exact site and parameters;
/// 2. the instruction's own duration;
/// 3. the backend [`DurationTable`], if one is configured.
///
/// Barriers always take zero time. A resolved duration is written back onto
/// the instruction as a constant.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationResolver<'a> {
    table: Option<&'a DurationTable>,
}

impl<'a> DurationResolver<'a> {
    /// Resolver without backend fallback.
    pub fn new() -> Self {
        Self { table: None }
    }

    /// Fall back to `table` when a node carries no duration.
    #[must_use]
    pub fn with_table(mut self, table: &'a DurationTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Resolve the duration of `node` in ticks.
    ///
    /// `qubit_indices` maps each qubit to its position in the DAG's sorted
    /// qubit list; calibrations and site durations are keyed by position.
    pub fn resolve(
        &self,
        dag: &mut CircuitDag,
        node: NodeIndex,
        qubit_indices: &FxHashMap<QubitId, u32>,
    ) -> ScheduleResult<u64> {
        let inst = dag.get_instruction(node).ok_or_else(|| {
            ScheduleError::InvalidGraph(format!("node {} is not an operation", node.index()))
        })?;

        if inst.is_barrier() {
            return Ok(0);
        }

        let indices = inst
            .qubits
            .iter()
            .map(|q| {
                qubit_indices.get(q).copied().ok_or_else(|| {
                    ScheduleError::InvalidGraph(format!("qubit {q} is not part of the circuit"))
                })
            })
            .collect::<ScheduleResult<Vec<u32>>>()?;

        let calibrated = dag
            .calibrations()
            .duration_for(inst.name(), &indices, &inst.params());

        let duration = match (calibrated, &inst.duration) {
            (Some(ticks), _) => {
                trace!(node = node.index(), ticks, "calibrated duration");
                ticks
            }
            (None, Some(expr)) => ticks_from_expression(node, inst, expr)?,
            (None, None) => self
                .table
                .and_then(|t| t.duration_for(inst.name(), &indices))
                .ok_or_else(|| ScheduleError::MissingDuration {
                    context: node_context(node, inst),
                })?,
        };

        if let Some(inst) = dag.get_instruction_mut(node) {
            inst.duration = Some(ParameterExpression::from(duration));
        }
        Ok(duration)
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn ticks_from_expression(
    node: NodeIndex,
    inst: &Instruction,
    expr: &ParameterExpression,
) -> ScheduleResult<u64> {
    if expr.is_symbolic() {
        let symbols: Vec<_> = expr.symbols().into_iter().collect();
        return Err(ScheduleError::UnboundParameter {
            context: node_context(node, inst),
            symbols: symbols.join(", "),
        });
    }

    let value = expr.as_f64().unwrap_or(f64::NAN);
    let rounded = value.round();
    if !value.is_finite()
        || value < 0.0
        || (value - rounded).abs() > TICK_TOLERANCE
        || rounded >= u64::MAX as f64
    {
        return Err(ScheduleError::InvalidDuration {
            context: node_context(node, inst),
            value,
        });
    }
    Ok(rounded as u64)
}
