//! Shared helpers for CLI commands.
//!
//! Circuits are read from a JSON description:
//!
//! ```json
//! {
//!   "name": "feedforward",
//!   "qubits": 2,
//!   "clbits": 1,
//!   "instructions": [
//!     { "name": "measure", "qubits": [0], "clbits": [0], "duration": 500 },
//!     { "name": "x", "qubits": [1], "duration": 160,
//!       "condition": { "clbits": [0], "value": 1 } }
//!   ],
//!   "calibrations": [
//!     { "name": "rx", "qubits": [1], "params": [0.5], "duration": 96 }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use cadence_ir::{
    CalibrationEntry, Circuit, ClassicalCondition, ClbitId, CustomGate, Instruction,
    ParameterExpression, QubitId, StandardGate,
};
use cadence_sched::SchedulerConfig;

/// A circuit as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CircuitFile {
    /// Circuit name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Number of qubits.
    pub qubits: u32,
    /// Number of classical bits.
    #[serde(default)]
    pub clbits: u32,
    /// Operations in program order.
    #[serde(default)]
    pub instructions: Vec<InstructionSpec>,
    /// Site-specific durations.
    #[serde(default)]
    pub calibrations: Vec<CalibrationEntry>,
}

fn default_name() -> String {
    "circuit".into()
}

/// One operation of a [`CircuitFile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstructionSpec {
    /// Operation name: a standard gate, `measure`, `reset`, `barrier`,
    /// `delay`, or any other name for a custom gate.
    pub name: String,
    /// Qubit operands.
    pub qubits: Vec<u32>,
    /// Classical bits written (measure only).
    #[serde(default)]
    pub clbits: Vec<u32>,
    /// Gate parameters.
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    /// Classical condition.
    #[serde(default)]
    pub condition: Option<ConditionSpec>,
    /// Duration in ticks, or a symbol name left unbound.
    #[serde(default)]
    pub duration: Option<ParamSpec>,
}

/// A number or a symbol name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamSpec {
    /// Numeric value.
    Number(f64),
    /// Unbound symbol.
    Symbol(String),
}

impl From<&ParamSpec> for ParameterExpression {
    fn from(spec: &ParamSpec) -> Self {
        match spec {
            ParamSpec::Number(value) => ParameterExpression::constant(*value),
            ParamSpec::Symbol(name) => ParameterExpression::symbol(name.as_str()),
        }
    }
}

/// Condition on classical bits: `clbits` read as an integer, little-endian.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionSpec {
    /// Condition bits.
    pub clbits: Vec<u32>,
    /// Expected value.
    pub value: u64,
}

impl InstructionSpec {
    /// Build the IR instruction.
    pub fn to_instruction(&self) -> Result<Instruction> {
        let qubits: Vec<QubitId> = self.qubits.iter().copied().map(QubitId).collect();
        let params: Vec<ParameterExpression> = self.params.iter().map(Into::into).collect();

        let mut inst = match self.name.as_str() {
            "measure" => {
                if self.qubits.len() != 1 || self.clbits.len() != 1 {
                    anyhow::bail!(
                        "measure takes exactly one qubit and one clbit, got {} and {}",
                        self.qubits.len(),
                        self.clbits.len()
                    );
                }
                Instruction::measure(QubitId(self.qubits[0]), ClbitId(self.clbits[0]))
            }
            "reset" => match qubits.as_slice() {
                [q] => Instruction::reset(*q),
                _ => anyhow::bail!("reset takes exactly one qubit"),
            },
            "barrier" => Instruction::barrier(qubits),
            "delay" => {
                let [q] = qubits.as_slice() else {
                    anyhow::bail!("delay takes exactly one qubit");
                };
                let length = self
                    .duration
                    .as_ref()
                    .or(self.params.first())
                    .context("delay needs a duration")?;
                Instruction::delay(*q, ParameterExpression::from(length))
            }
            name => match StandardGate::from_name(name, &params) {
                Some(gate) => {
                    if gate.num_qubits() as usize != qubits.len() {
                        anyhow::bail!(
                            "'{name}' acts on {} qubit(s), got {}",
                            gate.num_qubits(),
                            qubits.len()
                        );
                    }
                    Instruction::gate(gate, qubits)
                }
                None => {
                    let num_qubits = u32::try_from(qubits.len())?;
                    let gate = CustomGate::new(name, num_qubits).with_params(params);
                    Instruction::gate(gate, qubits)
                }
            },
        };

        if !self.clbits.is_empty() && !inst.is_measure() {
            anyhow::bail!("only measure may write classical bits, not '{}'", self.name);
        }
        if let Some(condition) = &self.condition {
            inst = inst.with_condition(ClassicalCondition::new(
                condition.clbits.iter().copied().map(ClbitId),
                condition.value,
            ));
        }
        if let Some(duration) = &self.duration {
            inst = inst.with_duration(ParameterExpression::from(duration));
        }
        Ok(inst)
    }
}

impl CircuitFile {
    /// Parse a circuit description.
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).context("Invalid circuit description")
    }

    /// Build the circuit.
    pub fn to_circuit(&self) -> Result<Circuit> {
        let mut circuit = Circuit::with_size(self.name.clone(), self.qubits, self.clbits);
        for entry in &self.calibrations {
            if !circuit.dag_mut().calibrations_mut().insert_entry(entry) {
                anyhow::bail!("Calibration for '{}' has a non-finite parameter", entry.name);
            }
        }
        for (i, spec) in self.instructions.iter().enumerate() {
            let inst = spec
                .to_instruction()
                .with_context(|| format!("instruction {i} ('{}')", spec.name))?;
            circuit
                .append(inst)
                .with_context(|| format!("instruction {i} ('{}')", spec.name))?;
        }
        Ok(circuit)
    }
}

/// Load a circuit from a JSON file.
pub fn load_circuit(path: &str) -> Result<Circuit> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        anyhow::bail!("File not found: {path}");
    }

    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;

    CircuitFile::from_json(&source)
        .and_then(|file| file.to_circuit())
        .with_context(|| format!("Failed to load circuit: {path}"))
}

/// Load the scheduler configuration, applying environment overrides.
pub fn load_config(path: Option<&str>) -> Result<SchedulerConfig> {
    SchedulerConfig::load(path.map(Path::new)).map_err(|e| match path {
        Some(p) => anyhow::anyhow!("Failed to load config {p}: {e}"),
        None => anyhow::anyhow!("Invalid configuration: {e}"),
    })
}
