//! Idle-time padding.

use cadence_ir::{CircuitDag, Instruction, NodeIndex, QubitId, ScheduleAnnotation};
use rustc_hash::FxHashMap;
use tracing::{debug, instrument};

use crate::duration::node_context;
use crate::error::{ScheduleError, ScheduleResult};
use crate::schedule::{Schedule, ScheduledCircuit};
use crate::strategy;

/// Fills every idle interval on every qubit with an explicit delay.
///
/// The DAG is rebuilt in topological order. Start times of existing
/// operations are kept; only delay nodes are added. Classical bits are not
/// padded, since their accesses are instants inside operations.
#[derive(Debug, Clone, Copy)]
pub struct DelayInsertion {
    fill_very_end: bool,
}

impl Default for DelayInsertion {
    fn default() -> Self {
        Self {
            fill_very_end: true,
        }
    }
}

impl DelayInsertion {
    /// Padding up to the end of the schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether to pad every qubit up to the total length.
    #[must_use]
    pub fn with_fill_very_end(mut self, fill_very_end: bool) -> Self {
        self.fill_very_end = fill_very_end;
        self
    }

    /// Build the padded copy of a scheduled DAG.
    #[instrument(skip_all, fields(total = schedule.total_duration))]
    pub fn run(&self, dag: &CircuitDag, schedule: &Schedule) -> ScheduleResult<ScheduledCircuit> {
        let mut padded = Padded {
            dag: dag.copy_empty_like(),
            start_times: FxHashMap::default(),
            durations: FxHashMap::default(),
            idle_nodes: Vec::new(),
        };
        let mut idle_after: FxHashMap<QubitId, u64> =
            dag.qubits().into_iter().map(|q| (q, 0)).collect();

        for node in strategy::topological_order(dag)? {
            let inst = dag.get_instruction(node).ok_or_else(|| {
                ScheduleError::InvalidGraph(format!("node {} is not an operation", node.index()))
            })?;
            let (Some(start), Some(duration)) = (schedule.start_time(node), schedule.duration(node))
            else {
                return Err(ScheduleError::InvalidGraph(format!(
                    "node {} has no start time; schedule the circuit first",
                    node.index()
                )));
            };

            for &qubit in &inst.qubits {
                let free = idle_after.get(&qubit).copied().unwrap_or(0);
                if start < free {
                    return Err(ScheduleError::InvalidGraph(format!(
                        "{} starts at {start} but qubit {qubit} is busy until {free}",
                        node_context(node, inst)
                    )));
                }
                padded.delay(qubit, free, start)?;
            }

            let new_node = padded.dag.apply(inst.clone())?;
            padded.start_times.insert(new_node, start);
            padded.durations.insert(new_node, duration);
            let end = start
                .checked_add(duration)
                .ok_or_else(|| ScheduleError::TimeOverflow {
                    context: node_context(node, inst),
                })?;
            for &qubit in &inst.qubits {
                idle_after.insert(qubit, end);
            }
        }

        if self.fill_very_end {
            let mut tails: Vec<_> = idle_after.into_iter().collect();
            tails.sort_unstable();
            for (qubit, free) in tails {
                padded.delay(qubit, free, schedule.total_duration)?;
            }
        }

        debug!(inserted = padded.idle_nodes.len(), "padded idle time");
        Ok(padded.finish(schedule))
    }
}

/// The DAG being rebuilt and its timing.
struct Padded {
    dag: CircuitDag,
    start_times: FxHashMap<NodeIndex, u64>,
    durations: FxHashMap<NodeIndex, u64>,
    idle_nodes: Vec<NodeIndex>,
}

impl Padded {
    /// Cover `[from, to)` on `qubit`, if non-empty.
    fn delay(&mut self, qubit: QubitId, from: u64, to: u64) -> ScheduleResult<()> {
        if to <= from {
            return Ok(());
        }
        let node = self.dag.apply(Instruction::delay(qubit, to - from))?;
        self.start_times.insert(node, from);
        self.durations.insert(node, to - from);
        self.idle_nodes.push(node);
        Ok(())
    }

    fn finish(mut self, schedule: &Schedule) -> ScheduledCircuit {
        self.dag.set_schedule(ScheduleAnnotation {
            start_times: self.start_times.clone(),
            duration: schedule.total_duration,
        });
        ScheduledCircuit {
            dag: self.dag,
            schedule: Schedule {
                start_times: self.start_times,
                durations: self.durations,
                total_duration: schedule.total_duration,
                warnings: schedule.warnings.clone(),
            },
            idle_nodes: self.idle_nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alap::AlapScheduler;
    use crate::asap::AsapScheduler;
    use crate::config::SchedulerConfig;
    use crate::strategy::SchedulingStrategy;
    use cadence_ir::{Circuit, StandardGate, WireId};

    fn x(q: u32) -> Instruction {
        Instruction::single_qubit_gate(StandardGate::X, QubitId(q)).with_duration(160_u64)
    }

    fn scheduled(circuit: Circuit, alap: bool) -> (CircuitDag, Schedule) {
        let mut dag = circuit.into_dag();
        let config = SchedulerConfig::default();
        let schedule = if alap {
            AlapScheduler::new().schedule(&mut dag, &config).unwrap()
        } else {
            AsapScheduler.schedule(&mut dag, &config).unwrap()
        };
        (dag, schedule)
    }

    #[test]
    fn test_gap_before_late_gate() {
        let mut circuit = Circuit::with_size("gap", 2, 0);
        circuit.append(x(0)).unwrap();
        circuit.append(x(0)).unwrap();
        circuit.append(x(1)).unwrap();
        let (dag, schedule) = scheduled(circuit, true);

        let result = DelayInsertion::new().run(&dag, &schedule).unwrap();
        assert_eq!(result.idle_nodes.len(), 1);
        let timeline = result.timeline(WireId::Qubit(QubitId(1)));
        assert_eq!(timeline.len(), 2);
        assert!(timeline[0].idle);
        assert_eq!((timeline[0].start, timeline[0].duration), (0, 160));
        assert_eq!(timeline[1].start, 160);
        assert_eq!(result.dag.schedule().map(|s| s.duration), Some(320));
    }

    #[test]
    fn test_fill_very_end() {
        let mut circuit = Circuit::with_size("tail", 3, 0);
        circuit.append(x(0)).unwrap();
        circuit.append(x(0)).unwrap();
        circuit.append(x(1)).unwrap();
        let (dag, schedule) = scheduled(circuit, false);

        let padded = DelayInsertion::new().run(&dag, &schedule).unwrap();
        // q1 tail and all of the untouched q2.
        assert_eq!(padded.idle_nodes.len(), 2);
        let q2 = padded.timeline(WireId::Qubit(QubitId(2)));
        assert_eq!(q2.len(), 1);
        assert_eq!((q2[0].start, q2[0].duration), (0, 320));

        let bare = DelayInsertion::new()
            .with_fill_very_end(false)
            .run(&dag, &schedule)
            .unwrap();
        assert!(bare.idle_nodes.is_empty());
    }

    #[test]
    fn test_existing_delays_count_as_busy() {
        let mut circuit = Circuit::with_size("d", 1, 0);
        circuit.append(Instruction::delay(QubitId(0), 40_u64)).unwrap();
        circuit.append(x(0)).unwrap();
        let (dag, schedule) = scheduled(circuit, false);

        let padded = DelayInsertion::new().run(&dag, &schedule).unwrap();
        assert!(padded.idle_nodes.is_empty());
        assert_eq!(padded.dag.num_ops(), 2);
    }

    #[test]
    fn test_unscheduled_dag_is_rejected() {
        let mut circuit = Circuit::with_size("u", 1, 0);
        circuit.append(x(0)).unwrap();
        let dag = circuit.into_dag();
        let err = DelayInsertion::new()
            .run(&dag, &Schedule::default())
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidGraph(_)));
    }

    #[test]
    fn test_overlap_is_rejected() {
        let mut circuit = Circuit::with_size("o", 1, 0);
        let a = circuit.append(x(0)).unwrap();
        let b = circuit.append(x(0)).unwrap();
        let dag = circuit.into_dag();

        let mut schedule = Schedule::default();
        for node in [a, b] {
            schedule.start_times.insert(node, 0);
            schedule.durations.insert(node, 160);
        }
        schedule.total_duration = 160;
        assert!(DelayInsertion::new().run(&dag, &schedule).is_err());
    }
}
