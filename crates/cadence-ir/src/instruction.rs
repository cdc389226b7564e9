//! Circuit instructions combining operations with operands and timing.

use serde::{Deserialize, Serialize};

use crate::condition::ClassicalCondition;
use crate::gate::{Gate, StandardGate};
use crate::parameter::ParameterExpression;
use crate::qubit::{ClbitId, QubitId, WireId};

/// The kind of instruction in a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// A quantum gate operation.
    Gate(Gate),
    /// Measurement operation. Writes its classical bits.
    Measure,
    /// Reset qubit to |0⟩.
    Reset,
    /// Barrier (synchronization point). Always takes zero time.
    Barrier,
    /// Idle period. The length lives in [`Instruction::duration`].
    Delay,
}

/// A complete instruction with operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The kind of instruction.
    pub kind: InstructionKind,
    /// Qubits this instruction operates on.
    pub qubits: Vec<QubitId>,
    /// Classical bits this instruction writes (measure only).
    pub clbits: Vec<ClbitId>,
    /// Classical condition gating execution, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ClassicalCondition>,
    /// Duration in device ticks (dt). `None` until a duration is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<ParameterExpression>,
}

impl Instruction {
    fn new(kind: InstructionKind, qubits: Vec<QubitId>, clbits: Vec<ClbitId>) -> Self {
        Self {
            kind,
            qubits,
            clbits,
            condition: None,
            duration: None,
        }
    }

    /// Create a gate instruction.
    pub fn gate(gate: impl Into<Gate>, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self::new(
            InstructionKind::Gate(gate.into()),
            qubits.into_iter().collect(),
            vec![],
        )
    }

    /// Create a single-qubit gate instruction.
    pub fn single_qubit_gate(gate: StandardGate, qubit: QubitId) -> Self {
        Self::gate(gate, [qubit])
    }

    /// Create a two-qubit gate instruction.
    pub fn two_qubit_gate(gate: StandardGate, q1: QubitId, q2: QubitId) -> Self {
        Self::gate(gate, [q1, q2])
    }

    /// Create a measurement instruction.
    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self::new(InstructionKind::Measure, vec![qubit], vec![clbit])
    }

    /// Create a reset instruction.
    pub fn reset(qubit: QubitId) -> Self {
        Self::new(InstructionKind::Reset, vec![qubit], vec![])
    }

    /// Create a barrier instruction.
    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self::new(InstructionKind::Barrier, qubits.into_iter().collect(), vec![])
    }

    /// Create a delay instruction of the given length in ticks.
    pub fn delay(qubit: QubitId, duration: impl Into<ParameterExpression>) -> Self {
        Self::new(InstructionKind::Delay, vec![qubit], vec![]).with_duration(duration)
    }

    /// Attach a classical condition.
    #[must_use]
    pub fn with_condition(mut self, condition: ClassicalCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Condition execution on a single classical bit.
    #[must_use]
    pub fn c_if(self, clbit: ClbitId, value: bool) -> Self {
        self.with_condition(ClassicalCondition::on_clbit(clbit, value))
    }

    /// Attach a duration.
    #[must_use]
    pub fn with_duration(mut self, duration: impl Into<ParameterExpression>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    /// Check if this is a gate instruction.
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, InstructionKind::Gate(_))
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::Measure)
    }

    /// Check if this is a barrier.
    pub fn is_barrier(&self) -> bool {
        matches!(self.kind, InstructionKind::Barrier)
    }

    /// Check if this is a delay.
    pub fn is_delay(&self) -> bool {
        matches!(self.kind, InstructionKind::Delay)
    }

    /// Check if this instruction carries a classical condition.
    pub fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }

    /// Get the gate if this is a gate instruction.
    pub fn as_gate(&self) -> Option<&Gate> {
        match &self.kind {
            InstructionKind::Gate(g) => Some(g),
            _ => None,
        }
    }

    /// Classical bits read by the condition, empty if unconditional.
    pub fn condition_clbits(&self) -> &[ClbitId] {
        match &self.condition {
            Some(condition) => &condition.clbits,
            None => &[],
        }
    }

    /// Gate parameters, empty for non-gate instructions.
    pub fn params(&self) -> Vec<&ParameterExpression> {
        self.as_gate().map(Gate::parameters).unwrap_or_default()
    }

    /// Every wire the instruction is threaded onto: qubits, written clbits,
    /// then condition clbits not already written. No duplicates.
    pub fn wires(&self) -> Vec<WireId> {
        let mut wires: Vec<WireId> = self.qubits.iter().copied().map(WireId::Qubit).collect();
        for &clbit in self.clbits.iter().chain(self.condition_clbits()) {
            let wire = WireId::Clbit(clbit);
            if !wires.contains(&wire) {
                wires.push(wire);
            }
        }
        wires
    }

    /// Get the name of the instruction.
    pub fn name(&self) -> &str {
        match &self.kind {
            InstructionKind::Gate(g) => g.name(),
            InstructionKind::Measure => "measure",
            InstructionKind::Reset => "reset",
            InstructionKind::Barrier => "barrier",
            InstructionKind::Delay => "delay",
        }
    }
}
