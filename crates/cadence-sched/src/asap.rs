//! Earliest-feasible (ASAP) scheduling.

use cadence_ir::{CircuitDag, NodeIndex, WireId};
use tracing::{debug, instrument};

use crate::config::SchedulerConfig;
use crate::context::ScheduleContext;
use crate::duration::{DurationResolver, node_context};
use crate::error::{ScheduleError, ScheduleResult};
use crate::schedule::Schedule;
use crate::strategy::{self, ClbitAccess, SchedulingStrategy, clbit_access};
use crate::timing::TimingModel;

/// Places every operation at its earliest feasible start.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsapScheduler;

impl SchedulingStrategy for AsapScheduler {
    fn name(&self) -> &'static str {
        "asap"
    }

    #[instrument(skip_all, fields(ops = dag.num_ops()))]
    fn schedule(
        &self,
        dag: &mut CircuitDag,
        config: &SchedulerConfig,
    ) -> ScheduleResult<Schedule> {
        let mut ctx = strategy::begin(dag);
        let timing = TimingModel::new(&config.timing, config.backend.as_ref());
        let resolver = DurationResolver::new().with_table(&config.durations);

        let total = forward_pass(dag, &mut ctx, &timing, &resolver)?;
        debug!(total, "ASAP schedule complete");
        Ok(strategy::finish(dag, ctx, total))
    }
}

/// Visit nodes in topological order, placing each at its earliest start.
///
/// Fills `ctx` with start times and durations and returns the total length.
pub(crate) fn forward_pass(
    dag: &mut CircuitDag,
    ctx: &mut ScheduleContext,
    timing: &TimingModel,
    resolver: &DurationResolver<'_>,
) -> ScheduleResult<u64> {
    for node in strategy::topological_order(dag)? {
        let duration = ctx.duration_of(dag, node, resolver)?;
        let start = place_forward(dag, ctx, timing, node, duration)?;
        ctx.set_start(node, start);
    }
    Ok(ctx.availability().horizon())
}

fn place_forward(
    dag: &CircuitDag,
    ctx: &mut ScheduleContext,
    timing: &TimingModel,
    node: NodeIndex,
    duration: u64,
) -> ScheduleResult<u64> {
    let inst = dag.get_instruction(node).ok_or_else(|| {
        ScheduleError::InvalidGraph(format!("node {} is not an operation", node.index()))
    })?;
    let qubits = inst.qubits.iter().copied().map(WireId::Qubit);
    let avail = ctx.availability_mut();
    let earliest_data = avail.latest(qubits.clone());

    let overflow = || ScheduleError::TimeOverflow {
        context: node_context(node, inst),
    };

    let start = match clbit_access(inst)? {
        ClbitAccess::Read => {
            let cond = inst.condition_clbits().iter().copied().map(WireId::Clbit);
            let ready = timing
                .condition_ready_at(avail.latest(cond.clone()))
                .ok_or_else(overflow)?;
            let start = earliest_data.max(ready);
            // The read has completed once the operation starts.
            for wire in cond {
                avail.advance(wire, start);
            }
            start
        }
        ClbitAccess::Write => {
            let written = inst.clbits.iter().copied().map(WireId::Clbit);
            let latency = timing.write_latency(duration);
            let start = earliest_data.max(avail.latest(written.clone()).saturating_sub(latency));
            let visible = timing
                .write_visible_at(start, duration)
                .ok_or_else(overflow)?;
            for wire in written {
                avail.advance(wire, visible);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendTiming, TimingConfig};
    use crate::schedule::ScheduleWarning;
    use cadence_ir::{Circuit, ClbitId, Instruction, QubitId, StandardGate};

    fn x(q: u32) -> Instruction {
        Instruction::single_qubit_gate(StandardGate::X, QubitId(q)).with_duration(160_u64)
    }

    #[test]
    fn test_serial_on_one_qubit() {
        let mut circuit = Circuit::with_size("serial", 1, 0);
        let a = circuit.append(x(0)).unwrap();
        let b = circuit.append(x(0)).unwrap();
        let mut dag = circuit.into_dag();

        let schedule = AsapScheduler
            .schedule(&mut dag, &SchedulerConfig::default())
            .unwrap();
        assert_eq!(schedule.start_time(a), Some(0));
        assert_eq!(schedule.start_time(b), Some(160));
        assert_eq!(schedule.total_duration, 320);
        assert_eq!(dag.schedule().map(|s| s.duration), Some(320));
    }

    #[test]
    fn test_two_qubit_gate_waits_for_both() {
        let mut circuit = Circuit::with_size("cx", 2, 0);
        circuit.append(x(0)).unwrap();
        circuit.append(x(0)).unwrap();
        let cx = circuit
            .append(
                Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(1))
                    .with_duration(800_u64),
            )
            .unwrap();
        let mut dag = circuit.into_dag();

        let schedule = AsapScheduler
            .schedule(&mut dag, &SchedulerConfig::default())
            .unwrap();
        assert_eq!(schedule.start_time(cx), Some(320));
        assert_eq!(schedule.total_duration, 1120);
    }

    #[test]
    fn test_measure_then_conditional_full_duration() {
        let mut circuit = Circuit::with_size("ff", 2, 1);
        let m = circuit
            .append(Instruction::measure(QubitId(0), ClbitId(0)).with_duration(500_u64))
            .unwrap();
        let cx = circuit.append(x(1).c_if(ClbitId(0), true)).unwrap();
        let mut dag = circuit.into_dag();

        let config = SchedulerConfig {
            backend: Some(BackendTiming::default()),
            ..SchedulerConfig::default()
        };
        let schedule = AsapScheduler.schedule(&mut dag, &config).unwrap();
        assert_eq!(schedule.start_time(m), Some(0));
        assert_eq!(schedule.start_time(cx), Some(500));
        assert_eq!(schedule.total_duration, 660);
    }

    #[test]
    fn test_measure_then_conditional_zero_latency() {
        let mut circuit = Circuit::with_size("ff", 2, 1);
        circuit
            .append(Instruction::measure(QubitId(0), ClbitId(0)).with_duration(500_u64))
            .unwrap();
        let cx = circuit.append(x(1).c_if(ClbitId(0), true)).unwrap();
        let mut dag = circuit.into_dag();

        let schedule = AsapScheduler
            .schedule(&mut dag, &SchedulerConfig::default())
            .unwrap();
        // Without write latency the register is visible as the measurement starts.
        assert_eq!(schedule.start_time(cx), Some(0));
    }

    #[test]
    fn test_second_measure_on_same_clbit_orders_writes() {
        let mut circuit = Circuit::with_size("mm", 2, 1);
        circuit.append(x(0)).unwrap();
        circuit
            .append(Instruction::measure(QubitId(0), ClbitId(0)).with_duration(500_u64))
            .unwrap();
        let m2 = circuit
            .append(Instruction::measure(QubitId(1), ClbitId(0)).with_duration(1000_u64))
            .unwrap();
        let mut dag = circuit.into_dag();

        // First write lands at 160 + 200; the second may start early enough
        // for its own write to land at the same instant, not before.
        let config = SchedulerConfig {
            timing: TimingConfig::new(0, 200),
            ..SchedulerConfig::default()
        };
        let schedule = AsapScheduler.schedule(&mut dag, &config).unwrap();
        assert_eq!(schedule.start_time(m2), Some(160));
        assert_eq!(schedule.total_duration, 1160);

        // With full-duration latency the writes are 500 and 1000 ticks in.
        let config = SchedulerConfig {
            backend: Some(BackendTiming::default()),
            ..SchedulerConfig::default()
        };
        let schedule = AsapScheduler.schedule(&mut dag, &config).unwrap();
        assert_eq!(schedule.start_time(m2), Some(0));
    }

    #[test]
    fn test_rescheduling_warns_and_overwrites() {
        let mut circuit = Circuit::with_size("again", 1, 0);
        circuit.append(x(0)).unwrap();
        let mut dag = circuit.into_dag();

        let first = AsapScheduler
            .schedule(&mut dag, &SchedulerConfig::default())
            .unwrap();
        assert!(first.warnings.is_empty());

        let second = AsapScheduler
            .schedule(&mut dag, &SchedulerConfig::default())
            .unwrap();
        assert_eq!(
            second.warnings,
            vec![ScheduleWarning::AlreadyScheduled {
                previous_length: 160
            }]
        );
        assert_eq!(second.start_times, first.start_times);
    }

    #[test]
    fn test_conditional_reset_fails_closed() {
        let mut circuit = Circuit::with_size("bad", 1, 1);
        circuit
            .append(Instruction::reset(QubitId(0)).with_duration(100_u64).c_if(ClbitId(0), true))
            .unwrap();
        let mut dag = circuit.into_dag();

        let err = AsapScheduler
            .schedule(&mut dag, &SchedulerConfig::default())
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidGraph(_)));
        assert!(dag.schedule().is_none());
    }
}
