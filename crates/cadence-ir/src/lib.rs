//! Cadence Circuit Intermediate Representation
//!
//! This crate provides the circuit data structures consumed by the Cadence
//! scheduler: a DAG of timed operations over qubit and classical-bit wires.
//!
//! # Overview
//!
//! The circuit IR uses a DAG (Directed Acyclic Graph) representation in
//! which each wire has an input and an output node and every operation is
//! threaded onto the wires it touches. Conditional operations are threaded
//! onto the classical bits their condition reads, so the graph already
//! encodes every ordering constraint the scheduler has to respect.
//!
//! # Core Components
//!
//! - **Wires**: [`QubitId`], [`ClbitId`] and [`WireId`]
//! - **Gates**: [`StandardGate`] for common basis gates and [`CustomGate`]
//!   for calibrated or user-defined operations
//! - **Parameters**: [`ParameterExpression`] for gate angles and durations,
//!   possibly symbolic until bound
//! - **Instructions**: [`Instruction`] with operands, optional
//!   [`ClassicalCondition`] and optional duration
//! - **Calibrations**: [`CalibrationTable`] of site-specific durations
//! - **DAG**: [`CircuitDag`], the graph the scheduler annotates
//! - **Circuit**: [`Circuit`] high-level builder API
//!
//! # Example: Measurement feeding a conditional gate
//!
//! ```rust
//! use cadence_ir::{Circuit, ClassicalCondition, ClbitId, QubitId, StandardGate};
//!
//! let mut circuit = Circuit::with_size("feedforward", 2, 1);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.measure(QubitId(0), ClbitId(0)).unwrap();
//! circuit
//!     .gate_if(
//!         StandardGate::X,
//!         [QubitId(1)],
//!         ClassicalCondition::on_clbit(ClbitId(0), true),
//!     )
//!     .unwrap();
//!
//! let dag = circuit.into_dag();
//! assert_eq!(dag.num_ops(), 3);
//! dag.verify_integrity().unwrap();
//! ```

pub mod calibration;
pub mod circuit;
pub mod condition;
pub mod dag;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod parameter;
pub mod qubit;

pub use calibration::{CalibrationEntry, CalibrationKey, CalibrationTable, round_parameter};
pub use circuit::Circuit;
pub use condition::ClassicalCondition;
pub use dag::{CircuitDag, NodeIndex, ScheduleAnnotation};
pub use error::{IrError, IrResult};
pub use gate::{CustomGate, Gate, GateKind, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use parameter::ParameterExpression;
pub use qubit::{ClbitId, QubitId, WireId};
