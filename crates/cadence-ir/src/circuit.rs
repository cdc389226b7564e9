//! High-level circuit builder API.

use crate::calibration::CalibrationTable;
use crate::condition::ClassicalCondition;
use crate::dag::{CircuitDag, NodeIndex};
use crate::error::IrResult;
use crate::gate::{Gate, StandardGate};
use crate::instruction::Instruction;
use crate::parameter::ParameterExpression;
use crate::qubit::{ClbitId, QubitId};

/// A quantum circuit.
///
/// This provides a high-level API for building circuits that are then
/// handed to the scheduler as a [`CircuitDag`]. Every builder method
/// appends, so insertion order is program order.
#[derive(Debug, Clone)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// The underlying DAG representation.
    dag: CircuitDag,
    /// Counter for generating qubit IDs.
    next_qubit_id: u32,
    /// Counter for generating classical bit IDs.
    next_clbit_id: u32,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dag: CircuitDag::new(),
            next_qubit_id: 0,
            next_clbit_id: 0,
        }
    }

    /// Create a circuit with a given number of qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        for _ in 0..num_qubits {
            circuit.add_qubit();
        }
        for _ in 0..num_clbits {
            circuit.add_clbit();
        }
        circuit
    }

    /// Add a single qubit to the circuit.
    pub fn add_qubit(&mut self) -> QubitId {
        let id = QubitId(self.next_qubit_id);
        self.next_qubit_id += 1;
        self.dag.add_qubit(id);
        id
    }

    /// Add a single classical bit to the circuit.
    pub fn add_clbit(&mut self) -> ClbitId {
        let id = ClbitId(self.next_clbit_id);
        self.next_clbit_id += 1;
        self.dag.add_clbit(id);
        id
    }

    /// Append an arbitrary instruction.
    pub fn append(&mut self, instruction: Instruction) -> IrResult<NodeIndex> {
        self.dag.apply(instruction)
    }

    fn push(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        self.dag.apply(instruction)?;
        Ok(self)
    }

    // =========================================================================
    // Gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::H, qubit))
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::X, qubit))
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(StandardGate::SX, qubit))
    }

    /// Apply Rx rotation.
    pub fn rx(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(
            StandardGate::Rx(theta.into()),
            qubit,
        ))
    }

    /// Apply Rz rotation.
    pub fn rz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::single_qubit_gate(
            StandardGate::Rz(theta.into()),
            qubit,
        ))
    }

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(StandardGate::CX, control, target))
    }

    /// Apply echoed cross-resonance gate.
    pub fn ecr(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::two_qubit_gate(StandardGate::ECR, q1, q2))
    }

    /// Apply a gate.
    pub fn gate(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::gate(gate, qubits))
    }

    /// Apply a gate that only runs when `condition` holds.
    pub fn gate_if(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = QubitId>,
        condition: ClassicalCondition,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::gate(gate, qubits).with_condition(condition))
    }

    // =========================================================================
    // Non-unitary operations
    // =========================================================================

    /// Measure a qubit into a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.push(Instruction::measure(qubit, clbit))
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::reset(qubit))
    }

    /// Add a barrier.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.push(Instruction::barrier(qubits))
    }

    /// Idle a qubit for `duration` ticks.
    pub fn delay(
        &mut self,
        qubit: QubitId,
        duration: impl Into<ParameterExpression>,
    ) -> IrResult<&mut Self> {
        self.push(Instruction::delay(qubit, duration))
    }

    /// Register a calibrated duration for one operation site.
    pub fn add_calibration(
        &mut self,
        name: &str,
        qubits: &[u32],
        params: &[f64],
        duration: u64,
    ) -> &mut Self {
        self.dag
            .calibrations_mut()
            .insert(name, qubits, params, duration);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.dag.num_qubits()
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.dag.num_clbits()
    }

    /// Get the calibrations.
    pub fn calibrations(&self) -> &CalibrationTable {
        self.dag.calibrations()
    }

    /// Get the underlying DAG.
    pub fn dag(&self) -> &CircuitDag {
        &self.dag
    }

    /// Get mutable access to the underlying DAG.
    pub fn dag_mut(&mut self) -> &mut CircuitDag {
        &mut self.dag
    }

    /// Consume the circuit and return the DAG.
    pub fn into_dag(self) -> CircuitDag {
        self.dag
    }

    /// Create a circuit from a DAG.
    pub fn from_dag(name: impl Into<String>, dag: CircuitDag) -> Self {
        let next_qubit_id = dag.qubits().last().map_or(0, |q| q.0 + 1);
        let next_clbit_id = dag.clbits().last().map_or(0, |c| c.0 + 1);
        Self {
            name: name.into(),
            dag,
            next_qubit_id,
            next_clbit_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let mut circuit = Circuit::with_size("echo", 2, 1);
        circuit
            .h(QubitId(0))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .delay(QubitId(1), 100_u64)
            .unwrap()
            .measure(QubitId(0), ClbitId(0))
            .unwrap();

        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.num_clbits(), 1);
        assert_eq!(circuit.dag().num_ops(), 4);
        circuit.dag().verify_integrity().unwrap();
    }

    #[test]
    fn test_conditional_gate() {
        let mut circuit = Circuit::with_size("feedforward", 2, 1);
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();
        circuit
            .gate_if(
                StandardGate::X,
                [QubitId(1)],
                ClassicalCondition::on_clbit(ClbitId(0), true),
            )
            .unwrap();

        let ops = circuit.dag().topological_ops().unwrap();
        assert_eq!(ops.len(), 2);
        assert!(ops[1].1.is_conditional());
    }

    #[test]
    fn test_add_calibration() {
        let mut circuit = Circuit::with_size("cal", 1, 0);
        circuit.add_calibration("sx", &[0], &[], 144);
        assert_eq!(circuit.calibrations().duration_for("sx", &[0], &[]), Some(144));
    }

    #[test]
    fn test_from_dag_continues_ids() {
        let circuit = Circuit::with_size("src", 3, 2);
        let mut rebuilt = Circuit::from_dag("copy", circuit.into_dag());
        assert_eq!(rebuilt.add_qubit(), QubitId(3));
        assert_eq!(rebuilt.add_clbit(), ClbitId(2));
        assert_eq!(rebuilt.name(), "copy");
    }
}
