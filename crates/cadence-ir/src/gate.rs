//! Gate types.
//!
//! Only the information the timing layer needs is modelled here: a name for
//! duration and calibration lookup, an arity, and the numeric parameters that
//! take part in the calibration key.

use serde::{Deserialize, Serialize};

use crate::parameter::ParameterExpression;

/// Standard gates found in superconducting basis sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// Hadamard gate.
    H,
    /// sqrt(X) gate.
    SX,
    /// Rotation around X axis.
    Rx(ParameterExpression),
    /// Rotation around Y axis.
    Ry(ParameterExpression),
    /// Rotation around Z axis (virtual on most hardware, duration 0).
    Rz(ParameterExpression),
    /// Universal single-qubit gate U(θ, φ, λ).
    U(
        ParameterExpression,
        ParameterExpression,
        ParameterExpression,
    ),
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Z gate.
    CZ,
    /// Echoed cross-resonance gate.
    ECR,
    /// SWAP gate.
    Swap,
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::SX => "sx",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::U(_, _, _) => "u",
            StandardGate::CX => "cx",
            StandardGate::CZ => "cz",
            StandardGate::ECR => "ecr",
            StandardGate::Swap => "swap",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::CX | StandardGate::CZ | StandardGate::ECR | StandardGate::Swap => 2,
            _ => 1,
        }
    }

    /// Parameters in declaration order.
    pub fn parameters(&self) -> Vec<&ParameterExpression> {
        match self {
            StandardGate::Rx(p) | StandardGate::Ry(p) | StandardGate::Rz(p) => vec![p],
            StandardGate::U(a, b, c) => vec![a, b, c],
            _ => vec![],
        }
    }

    /// Look up a standard gate by name, consuming parameters as needed.
    ///
    /// Returns `None` for unknown names or when the parameter count does not
    /// match.
    pub fn from_name(name: &str, params: &[ParameterExpression]) -> Option<Self> {
        let gate = match (name, params) {
            ("id", []) => StandardGate::I,
            ("x", []) => StandardGate::X,
            ("y", []) => StandardGate::Y,
            ("z", []) => StandardGate::Z,
            ("h", []) => StandardGate::H,
            ("sx", []) => StandardGate::SX,
            ("rx", [p]) => StandardGate::Rx(p.clone()),
            ("ry", [p]) => StandardGate::Ry(p.clone()),
            ("rz", [p]) => StandardGate::Rz(p.clone()),
            ("u", [a, b, c]) => StandardGate::U(a.clone(), b.clone(), c.clone()),
            ("cx", []) => StandardGate::CX,
            ("cz", []) => StandardGate::CZ,
            ("ecr", []) => StandardGate::ECR,
            ("swap", []) => StandardGate::Swap,
            _ => return None,
        };
        Some(gate)
    }
}

/// A gate, either standard or custom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateKind {
    /// A standard gate with known semantics.
    Standard(StandardGate),
    /// A custom gate, typically backed by a calibration.
    Custom(CustomGate),
}

impl GateKind {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            GateKind::Standard(g) => g.name(),
            GateKind::Custom(g) => &g.name,
        }
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            GateKind::Standard(g) => g.num_qubits(),
            GateKind::Custom(g) => g.num_qubits,
        }
    }

    /// Parameters in declaration order.
    pub fn parameters(&self) -> Vec<&ParameterExpression> {
        match self {
            GateKind::Standard(g) => g.parameters(),
            GateKind::Custom(g) => g.params.iter().collect(),
        }
    }
}

/// A user-defined gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomGate {
    /// The name of the gate.
    pub name: String,
    /// The number of qubits it operates on.
    pub num_qubits: u32,
    /// Parameters of the gate.
    pub params: Vec<ParameterExpression>,
}

impl CustomGate {
    /// Create a new custom gate.
    pub fn new(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            params: vec![],
        }
    }

    /// Add parameters to the gate.
    #[must_use]
    pub fn with_params(mut self, params: Vec<ParameterExpression>) -> Self {
        self.params = params;
        self
    }
}

/// A gate applied by an instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// The kind of gate.
    pub kind: GateKind,
}

impl Gate {
    /// Create a new gate from a standard gate.
    pub fn standard(gate: StandardGate) -> Self {
        Self {
            kind: GateKind::Standard(gate),
        }
    }

    /// Create a new gate from a custom gate.
    pub fn custom(gate: CustomGate) -> Self {
        Self {
            kind: GateKind::Custom(gate),
        }
    }

    /// Get the name of this gate.
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.kind.num_qubits()
    }

    /// Parameters in declaration order.
    pub fn parameters(&self) -> Vec<&ParameterExpression> {
        self.kind.parameters()
    }
}

impl From<StandardGate> for Gate {
    fn from(gate: StandardGate) -> Self {
        Gate::standard(gate)
    }
}

impl From<CustomGate> for Gate {
    fn from(gate: CustomGate) -> Self {
        Gate::custom(gate)
    }
}
