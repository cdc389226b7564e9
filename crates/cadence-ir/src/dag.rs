//! DAG-based circuit representation.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex as PetNodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::calibration::CalibrationTable;
use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, QubitId, WireId};

/// Node index type for the circuit DAG.
pub type NodeIndex = PetNodeIndex<u32>;

/// A node in the circuit DAG.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DagNode {
    /// Input node for a wire.
    In(WireId),
    /// Output node for a wire.
    Out(WireId),
    /// Operation node containing an instruction.
    Op(Instruction),
}

impl DagNode {
    #[inline]
    fn is_op(&self) -> bool {
        matches!(self, DagNode::Op(_))
    }

    #[inline]
    fn instruction(&self) -> Option<&Instruction> {
        match self {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }

    #[inline]
    fn instruction_mut(&mut self) -> Option<&mut Instruction> {
        match self {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }
}

/// An edge in the circuit DAG, carrying the wire it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct DagEdge {
    wire: WireId,
}

/// Timing attached to a scheduled DAG.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleAnnotation {
    /// Start time of every operation node, in ticks.
    pub start_times: FxHashMap<NodeIndex, u64>,
    /// Total length of the schedule, in ticks.
    pub duration: u64,
}

/// DAG-based circuit representation.
///
/// The circuit is represented as a directed acyclic graph where:
/// - Nodes are either input nodes, output nodes, or operation nodes
/// - Edges represent wires (quantum or classical)
/// - Each wire has exactly one input and one output node
/// - Operations are threaded onto every wire they touch, including the
///   classical bits read by their condition
///
/// Nodes are never removed, so a `NodeIndex` stays valid for the lifetime
/// of the DAG and doubles as the insertion order of operations.
///
/// ## Performance
///
/// The DAG maintains a `wire_front` index that maps each wire to the
/// last node before the output node, giving O(1) predecessor lookups in
/// `apply()`.
#[derive(Debug, Clone, Default)]
pub struct CircuitDag {
    /// The underlying graph.
    graph: DiGraph<DagNode, DagEdge, u32>,
    /// Map from wire to its input node.
    inputs: FxHashMap<WireId, NodeIndex>,
    /// Map from wire to its output node.
    outputs: FxHashMap<WireId, NodeIndex>,
    /// Wire front: maps each wire to the node just before the output node.
    wire_front: FxHashMap<WireId, NodeIndex>,
    /// Calibrated durations for specific operation sites.
    calibrations: CalibrationTable,
    /// Schedule written by the last scheduling run.
    schedule: Option<ScheduleAnnotation>,
}

impl CircuitDag {
    /// Create a new empty circuit DAG.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a DAG with the same wires and calibrations but no operations
    /// and no schedule.
    pub fn copy_empty_like(&self) -> Self {
        let mut dag = Self::new();
        for qubit in self.qubits() {
            dag.add_qubit(qubit);
        }
        for clbit in self.clbits() {
            dag.add_clbit(clbit);
        }
        dag.calibrations = self.calibrations.clone();
        dag
    }

    fn add_wire(&mut self, wire: WireId) {
        if self.inputs.contains_key(&wire) {
            return;
        }
        let in_node = self.graph.add_node(DagNode::In(wire));
        let out_node = self.graph.add_node(DagNode::Out(wire));
        self.graph.add_edge(in_node, out_node, DagEdge { wire });
        self.inputs.insert(wire, in_node);
        self.outputs.insert(wire, out_node);
        // Initially the input node is the predecessor of the output.
        self.wire_front.insert(wire, in_node);
    }

    /// Add a qubit to the circuit.
    pub fn add_qubit(&mut self, qubit: QubitId) {
        self.add_wire(WireId::Qubit(qubit));
    }

    /// Add a classical bit to the circuit.
    pub fn add_clbit(&mut self, clbit: ClbitId) {
        self.add_wire(WireId::Clbit(clbit));
    }

    fn validate(&self, instruction: &Instruction) -> IrResult<()> {
        let gate_name = match &instruction.kind {
            InstructionKind::Gate(gate) => Some(gate.name().to_string()),
            _ => None,
        };

        if let InstructionKind::Gate(gate) = &instruction.kind {
            let expected = gate.num_qubits() as usize;
            let got = instruction.qubits.len();
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected: gate.num_qubits(),
                    got: u32::try_from(got).unwrap_or(u32::MAX),
                });
            }
        }

        if instruction.is_measure() && instruction.qubits.len() != instruction.clbits.len() {
            return Err(IrError::MeasureArityMismatch {
                qubits: instruction.qubits.len(),
                clbits: instruction.clbits.len(),
            });
        }

        for &qubit in &instruction.qubits {
            if !self.inputs.contains_key(&WireId::Qubit(qubit)) {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        for &clbit in instruction
            .clbits
            .iter()
            .chain(instruction.condition_clbits())
        {
            if !self.inputs.contains_key(&WireId::Clbit(clbit)) {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        let mut seen = FxHashSet::default();
        for &qubit in &instruction.qubits {
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit { qubit, gate_name });
            }
        }

        Ok(())
    }

    /// Apply an instruction to the circuit.
    ///
    /// The new node is threaded onto every wire in [`Instruction::wires`].
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<NodeIndex> {
        self.validate(&instruction)?;

        let wires = instruction.wires();
        let op_node = self.graph.add_node(DagNode::Op(instruction));

        for wire in wires {
            let out_node = self.outputs[&wire];
            let prev_node = self.wire_front[&wire];

            let edge_id = self
                .graph
                .edges_directed(prev_node, Direction::Outgoing)
                .find(|e| e.weight().wire == wire && e.target() == out_node)
                .map(|e| e.id())
                .ok_or_else(|| {
                    IrError::InvalidDag(format!(
                        "Missing edge from predecessor to output for wire {wire}"
                    ))
                })?;
            self.graph.remove_edge(edge_id);
            self.graph.add_edge(prev_node, op_node, DagEdge { wire });
            self.graph.add_edge(op_node, out_node, DagEdge { wire });
            self.wire_front.insert(wire, op_node);
        }

        Ok(op_node)
    }

    /// Operation nodes in the fixed topological order.
    ///
    /// This is the lexicographic topological order keyed by node index:
    /// among all nodes whose predecessors are done, the one inserted first
    /// comes next. For circuits built by appending, this is program order.
    pub fn topological_op_nodes(&self) -> IrResult<Vec<NodeIndex>> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph.edges_directed(n, Direction::Incoming).count())
            .collect();

        let mut ready: BinaryHeap<Reverse<NodeIndex>> = self
            .graph
            .node_indices()
            .filter(|n| in_degree[n.index()] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(self.num_ops());
        let mut visited = 0usize;

        while let Some(Reverse(node)) = ready.pop() {
            visited += 1;
            if self.graph[node].is_op() {
                order.push(node);
            }
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                let target = edge.target();
                in_degree[target.index()] -= 1;
                if in_degree[target.index()] == 0 {
                    ready.push(Reverse(target));
                }
            }
        }

        if visited != self.graph.node_count() {
            return Err(IrError::InvalidDag("Graph contains a cycle".into()));
        }
        Ok(order)
    }

    /// Operations with their instructions in the fixed topological order.
    pub fn topological_ops(&self) -> IrResult<Vec<(NodeIndex, &Instruction)>> {
        Ok(self
            .topological_op_nodes()?
            .into_iter()
            .filter_map(|idx| self.get_instruction(idx).map(|inst| (idx, inst)))
            .collect())
    }

    /// Operation nodes along one wire, from input to output.
    pub fn wire_ops(&self, wire: WireId) -> IrResult<Vec<NodeIndex>> {
        let (Some(&in_node), Some(&out_node)) = (self.inputs.get(&wire), self.outputs.get(&wire))
        else {
            return Err(IrError::InvalidDag(format!("Unknown wire {wire}")));
        };

        let mut ops = Vec::new();
        let mut current = in_node;
        let max_steps = self.graph.node_count();

        while current != out_node {
            current = self
                .graph
                .edges_directed(current, Direction::Outgoing)
                .find(|e| e.weight().wire == wire)
                .map(|e| e.target())
                .ok_or_else(|| {
                    IrError::InvalidDag(format!(
                        "Wire {wire} is broken: no outgoing edge from node {current:?}"
                    ))
                })?;
            if current != out_node {
                ops.push(current);
            }
            if ops.len() > max_steps {
                return Err(IrError::InvalidDag(format!(
                    "Wire {wire} has too many steps (possible infinite loop)"
                )));
            }
        }

        Ok(ops)
    }

    /// Get an instruction by node index.
    #[inline]
    pub fn get_instruction(&self, node: NodeIndex) -> Option<&Instruction> {
        self.graph.node_weight(node).and_then(|n| n.instruction())
    }

    /// Get a mutable instruction by node index.
    #[inline]
    pub fn get_instruction_mut(&mut self, node: NodeIndex) -> Option<&mut Instruction> {
        self.graph
            .node_weight_mut(node)
            .and_then(|n| n.instruction_mut())
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.inputs
            .keys()
            .filter(|w| matches!(w, WireId::Qubit(_)))
            .count()
    }

    /// Get the number of classical bits.
    #[inline]
    pub fn num_clbits(&self) -> usize {
        self.inputs.len() - self.num_qubits()
    }

    /// Get the number of operations.
    ///
    /// Computed as total nodes minus input and output nodes (2 per wire).
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.graph
            .node_count()
            .saturating_sub(2 * self.inputs.len())
    }

    /// Qubits in ascending order.
    pub fn qubits(&self) -> Vec<QubitId> {
        let mut qubits: Vec<_> = self
            .inputs
            .keys()
            .filter_map(|w| match w {
                WireId::Qubit(q) => Some(*q),
                WireId::Clbit(_) => None,
            })
            .collect();
        qubits.sort_unstable();
        qubits
    }

    /// Classical bits in ascending order.
    pub fn clbits(&self) -> Vec<ClbitId> {
        let mut clbits: Vec<_> = self
            .inputs
            .keys()
            .filter_map(|w| match w {
                WireId::Clbit(c) => Some(*c),
                WireId::Qubit(_) => None,
            })
            .collect();
        clbits.sort_unstable();
        clbits
    }

    /// All wires, qubits first, each group ascending.
    pub fn wires(&self) -> Vec<WireId> {
        let mut wires: Vec<_> = self.inputs.keys().copied().collect();
        wires.sort_unstable();
        wires
    }

    /// Calibrations attached to this circuit.
    pub fn calibrations(&self) -> &CalibrationTable {
        &self.calibrations
    }

    /// Mutable access to the calibrations.
    pub fn calibrations_mut(&mut self) -> &mut CalibrationTable {
        &mut self.calibrations
    }

    /// Schedule written by the last scheduling run, if any.
    pub fn schedule(&self) -> Option<&ScheduleAnnotation> {
        self.schedule.as_ref()
    }

    /// Attach a schedule, returning the one it replaces.
    pub fn set_schedule(&mut self, schedule: ScheduleAnnotation) -> Option<ScheduleAnnotation> {
        self.schedule.replace(schedule)
    }

    /// Verify the structural integrity of the DAG.
    ///
    /// Checks that:
    /// - Every wire has exactly one In node and one Out node
    /// - The graph is acyclic
    /// - Wire edges form valid paths from In to Out for each wire
    /// - Every operation node sits on each of the wires it touches
    pub fn verify_integrity(&self) -> IrResult<()> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(IrError::InvalidDag("Graph contains a cycle".into()));
        }

        for wire in self.inputs.keys() {
            if !self.outputs.contains_key(wire) {
                return Err(IrError::InvalidDag(format!(
                    "Wire {wire} has an In node but no Out node"
                )));
            }
        }
        for wire in self.outputs.keys() {
            if !self.inputs.contains_key(wire) {
                return Err(IrError::InvalidDag(format!(
                    "Wire {wire} has an Out node but no In node"
                )));
            }
        }
        for (&wire, &node) in &self.inputs {
            if self.graph.node_weight(node) != Some(&DagNode::In(wire)) {
                return Err(IrError::InvalidDag(format!("In node of wire {wire} is misplaced")));
            }
        }
        for (&wire, &node) in &self.outputs {
            if self.graph.node_weight(node) != Some(&DagNode::Out(wire)) {
                return Err(IrError::InvalidDag(format!("Out node of wire {wire} is misplaced")));
            }
        }

        let mut on_wire: FxHashMap<NodeIndex, Vec<WireId>> = FxHashMap::default();
        for wire in self.wires() {
            for node in self.wire_ops(wire)? {
                on_wire.entry(node).or_default().push(wire);
            }
        }

        for node in self.graph.node_indices() {
            let Some(inst) = self.get_instruction(node) else {
                continue;
            };
            let mut expected = inst.wires();
            expected.sort_unstable();
            let mut found = on_wire.remove(&node).unwrap_or_default();
            found.sort_unstable();
            if expected != found {
                return Err(IrError::InvalidDag(format!(
                    "Operation '{}' at {node:?} is not threaded onto its wires",
                    inst.name()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::StandardGate;

    #[test]
    fn test_empty_dag() {
        let dag = CircuitDag::new();
        assert_eq!(dag.num_qubits(), 0);
        assert_eq!(dag.num_clbits(), 0);
        assert_eq!(dag.num_ops(), 0);
        assert!(dag.topological_op_nodes().unwrap().is_empty());
    }

    #[test]
    fn test_add_wires_is_idempotent() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(1));
        dag.add_qubit(QubitId(0));
        dag.add_qubit(QubitId(1));
        dag.add_clbit(ClbitId(0));
        assert_eq!(dag.qubits(), vec![QubitId(0), QubitId(1)]);
        assert_eq!(dag.num_clbits(), 1);
        assert_eq!(
            dag.wires(),
            vec![
                WireId::Qubit(QubitId(0)),
                WireId::Qubit(QubitId(1)),
                WireId::Clbit(ClbitId(0)),
            ]
        );
    }

    #[test]
    fn test_topological_order_is_program_order() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.add_qubit(QubitId(1));

        // Independent ops come out in insertion order, not by wire.
        let a = dag
            .apply(Instruction::single_qubit_gate(StandardGate::X, QubitId(1)))
            .unwrap();
        let b = dag
            .apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        let c = dag
            .apply(Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(1)))
            .unwrap();

        assert_eq!(dag.topological_op_nodes().unwrap(), vec![a, b, c]);
    }

    #[test]
    fn test_condition_threads_clbit_wire() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.add_qubit(QubitId(1));
        dag.add_clbit(ClbitId(0));

        let m = dag
            .apply(Instruction::measure(QubitId(0), ClbitId(0)))
            .unwrap();
        let x = dag
            .apply(Instruction::single_qubit_gate(StandardGate::X, QubitId(1)).c_if(ClbitId(0), true))
            .unwrap();

        assert_eq!(dag.wire_ops(WireId::Clbit(ClbitId(0))).unwrap(), vec![m, x]);
        assert_eq!(dag.wire_ops(WireId::Qubit(QubitId(1))).unwrap(), vec![x]);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_gate_arity_mismatch() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.add_qubit(QubitId(1));

        let result = dag.apply(Instruction::gate(StandardGate::CX, [QubitId(0)]));
        match result {
            Err(IrError::QubitCountMismatch {
                gate_name,
                expected,
                got,
            }) => {
                assert_eq!(gate_name, "cx");
                assert_eq!(expected, 2);
                assert_eq!(got, 1);
            }
            _ => panic!("Expected QubitCountMismatch error"),
        }
    }

    #[test]
    fn test_qubit_not_found_with_context() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));

        let inst = Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(99));
        match dag.apply(inst) {
            Err(IrError::QubitNotFound { qubit, gate_name }) => {
                assert_eq!(qubit, QubitId(99));
                assert_eq!(gate_name, Some("cx".to_string()));
            }
            _ => panic!("Expected QubitNotFound error"),
        }
    }

    #[test]
    fn test_condition_clbit_must_exist() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));

        let inst = Instruction::single_qubit_gate(StandardGate::X, QubitId(0)).c_if(ClbitId(3), true);
        assert!(matches!(
            dag.apply(inst),
            Err(IrError::ClbitNotFound { clbit: ClbitId(3), .. })
        ));
    }

    #[test]
    fn test_duplicate_qubit() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        let inst = Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(0));
        assert!(matches!(
            dag.apply(inst),
            Err(IrError::DuplicateQubit { .. })
        ));
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        let a = dag
            .apply(Instruction::single_qubit_gate(StandardGate::X, QubitId(0)))
            .unwrap();
        let b = dag
            .apply(Instruction::single_qubit_gate(StandardGate::X, QubitId(0)))
            .unwrap();
        dag.graph.add_edge(
            b,
            a,
            DagEdge {
                wire: WireId::Qubit(QubitId(0)),
            },
        );

        assert!(matches!(
            dag.topological_op_nodes(),
            Err(IrError::InvalidDag(_))
        ));
        assert!(dag.verify_integrity().is_err());
    }

    #[test]
    fn test_copy_empty_like_keeps_wires_and_calibrations() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.add_clbit(ClbitId(0));
        dag.calibrations_mut().insert("x", &[0], &[], 160);
        dag.apply(Instruction::measure(QubitId(0), ClbitId(0)))
            .unwrap();
        dag.set_schedule(ScheduleAnnotation::default());

        let empty = dag.copy_empty_like();
        assert_eq!(empty.num_ops(), 0);
        assert_eq!(empty.qubits(), dag.qubits());
        assert_eq!(empty.clbits(), dag.clbits());
        assert_eq!(empty.calibrations().len(), 1);
        assert!(empty.schedule().is_none());
    }

    #[test]
    fn test_set_schedule_returns_previous() {
        let mut dag = CircuitDag::new();
        assert!(
            dag.set_schedule(ScheduleAnnotation {
                start_times: FxHashMap::default(),
                duration: 10,
            })
            .is_none()
        );
        let previous = dag.set_schedule(ScheduleAnnotation::default());
        assert_eq!(previous.map(|s| s.duration), Some(10));
    }

    #[test]
    fn test_verify_integrity_multi_qubit_circuit() {
        let mut dag = CircuitDag::new();
        for i in 0..3 {
            dag.add_qubit(QubitId(i));
            dag.add_clbit(ClbitId(i));
        }

        dag.apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        dag.apply(Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(1)))
            .unwrap();
        dag.apply(Instruction::two_qubit_gate(StandardGate::CX, QubitId(1), QubitId(2)))
            .unwrap();
        for i in 0..3 {
            dag.apply(Instruction::measure(QubitId(i), ClbitId(i)))
                .unwrap();
        }

        dag.verify_integrity().unwrap();
        assert_eq!(dag.num_ops(), 6);
    }
}
