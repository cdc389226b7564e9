//! Site-specific duration overrides.
//!
//! A calibration pins the duration of one operation on exact qubit indices
//! with exact parameter values. Parameters are compared after rounding to
//! [`CALIBRATION_DECIMALS`] decimal places, stored as fixed-point integers so
//! that keys hash and compare exactly.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::parameter::ParameterExpression;

/// Number of decimal places kept when matching calibration parameters.
pub const CALIBRATION_DECIMALS: i32 = 9;

/// Round a parameter to the fixed-point representation used in calibration
/// keys. `None` for values that cannot be represented (NaN, infinities,
/// magnitudes beyond `i64`).
#[allow(clippy::cast_possible_truncation)]
pub fn round_parameter(value: f64) -> Option<i64> {
    let scaled = (value * 10f64.powi(CALIBRATION_DECIMALS)).round();
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    if !scaled.is_finite() || scaled >= i64::MAX as f64 || scaled < i64::MIN as f64 {
        return None;
    }
    Some(scaled as i64)
}

/// Lookup key of a calibration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CalibrationKey {
    /// Operation name.
    pub name: String,
    /// Physical qubit indices, in operand order.
    pub qubits: Vec<u32>,
    /// Rounded parameters, in declaration order.
    pub params: Vec<i64>,
}

impl CalibrationKey {
    /// Build a key from concrete parameter values.
    ///
    /// Returns `None` if any parameter is not representable.
    pub fn new(name: impl Into<String>, qubits: &[u32], params: &[f64]) -> Option<Self> {
        let params = params
            .iter()
            .map(|&p| round_parameter(p))
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            name: name.into(),
            qubits: qubits.to_vec(),
            params,
        })
    }

    /// Build a key from parameter expressions.
    ///
    /// Symbolic parameters never match a calibration, so they yield `None`.
    pub fn from_expressions(
        name: &str,
        qubits: &[u32],
        params: &[&ParameterExpression],
    ) -> Option<Self> {
        let values = params
            .iter()
            .map(|p| p.as_f64())
            .collect::<Option<Vec<_>>>()?;
        Self::new(name, qubits, &values)
    }
}

/// A serializable calibration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationEntry {
    /// Operation name.
    pub name: String,
    /// Physical qubit indices.
    pub qubits: Vec<u32>,
    /// Parameter values.
    #[serde(default)]
    pub params: Vec<f64>,
    /// Duration in ticks.
    pub duration: u64,
}

/// Calibrated durations attached to a circuit.
#[derive(Debug, Clone, Default)]
pub struct CalibrationTable {
    durations: FxHashMap<CalibrationKey, u64>,
}

impl CalibrationTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a calibration, replacing any previous entry with the same key.
    ///
    /// Returns `false` (and stores nothing) if a parameter is not
    /// representable.
    pub fn insert(&mut self, name: &str, qubits: &[u32], params: &[f64], duration: u64) -> bool {
        match CalibrationKey::new(name, qubits, params) {
            Some(key) => {
                self.durations.insert(key, duration);
                true
            }
            None => false,
        }
    }

    /// Register a serialized calibration record.
    pub fn insert_entry(&mut self, entry: &CalibrationEntry) -> bool {
        self.insert(&entry.name, &entry.qubits, &entry.params, entry.duration)
    }

    /// Calibrated duration for an operation on the given qubits.
    pub fn duration_for(
        &self,
        name: &str,
        qubits: &[u32],
        params: &[&ParameterExpression],
    ) -> Option<u64> {
        let key = CalibrationKey::from_expressions(name, qubits, params)?;
        self.durations.get(&key).copied()
    }

    /// Check if any calibration exists for this operation name.
    pub fn has_calibration_for(&self, name: &str) -> bool {
        self.durations.keys().any(|k| k.name == name)
    }

    /// Number of calibrations.
    pub fn len(&self) -> usize {
        self.durations.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }
}
