//! Cadence Instruction Scheduling
//!
//! This crate assigns a start time to every operation of a [`CircuitDag`]
//! and fills the idle time on every qubit with explicit delays.
//!
//! # Overview
//!
//! Operations share two kinds of wire. Qubits are occupied for the whole
//! duration of an operation. Classical bits are touched at a single instant
//! inside it: a conditional operation reads its condition
//! `conditional_latency` ticks before it starts, and a measurement's result
//! becomes visible `clbit_write_latency` ticks after it starts. The
//! scheduler respects both channels and never reorders operations that share
//! a classical bit.
//!
//! # Architecture
//!
//! ```text
//! CircuitDag + SchedulerConfig
//!       │
//!       ▼
//! ┌───────────┐
//! │ Scheduler │ ◄── ScheduleContext (availability, start times, warnings)
//! └───────────┘
//!       │
//!       ├── DurationResolver (calibration, instruction, backend table)
//!       ├── AsapScheduler / AlapScheduler
//!       └── DelayInsertion
//!       │
//!       ▼
//! ScheduledCircuit (padded DAG, schedule, warnings)
//! ```
//!
//! # Example: Measurement feeding a conditional gate
//!
//! ```rust
//! use cadence_ir::{Circuit, ClbitId, Instruction, QubitId, StandardGate};
//! use cadence_sched::{BackendTiming, Scheduler, SchedulerConfig, SchedulingPolicy};
//!
//! let mut circuit = Circuit::with_size("feedforward", 2, 1);
//! circuit
//!     .append(Instruction::measure(QubitId(0), ClbitId(0)).with_duration(500_u64))
//!     .unwrap();
//! let x = circuit
//!     .append(
//!         Instruction::single_qubit_gate(StandardGate::X, QubitId(1))
//!             .with_duration(160_u64)
//!             .c_if(ClbitId(0), true),
//!     )
//!     .unwrap();
//!
//! // The measured value becomes visible when the measurement ends.
//! let config = SchedulerConfig {
//!     backend: Some(BackendTiming::default()),
//!     ..SchedulerConfig::default()
//! };
//! let scheduled = Scheduler::new(SchedulingPolicy::Asap)
//!     .with_config(config)
//!     .with_padding(false)
//!     .run(circuit.into_dag())
//!     .unwrap();
//!
//! assert_eq!(scheduled.schedule.start_time(x), Some(500));
//! assert_eq!(scheduled.total_duration(), 660);
//! ```
//!
//! # Duration sources
//!
//! | Precedence | Source |
//! |------------|--------|
//! | 1 | Calibration attached to the DAG for the exact site and parameters |
//! | 2 | The instruction's own duration |
//! | 3 | The configured [`DurationTable`] (site entry, then default) |
//!
//! Barriers always take zero time. Anything else without a duration is a
//! [`ScheduleError::MissingDuration`].
//!
//! # Custom Strategies
//!
//! Implement the [`SchedulingStrategy`] trait to plug in another policy:
//!
//! ```rust
//! use cadence_ir::CircuitDag;
//! use cadence_sched::{Schedule, ScheduleResult, SchedulerConfig, SchedulingStrategy};
//!
//! struct MyStrategy;
//!
//! impl SchedulingStrategy for MyStrategy {
//!     fn name(&self) -> &str { "my_strategy" }
//!
//!     fn schedule(&self, dag: &mut CircuitDag, config: &SchedulerConfig) -> ScheduleResult<Schedule> {
//!         // Your timing logic here
//!         Ok(Schedule::default())
//!     }
//! }
//! ```
//!
//! [`CircuitDag`]: cadence_ir::CircuitDag

pub mod alap;
pub mod asap;
pub mod availability;
pub mod config;
pub mod context;
pub mod duration;
pub mod error;
pub mod padding;
pub mod reversal;
pub mod schedule;
pub mod scheduler;
pub mod strategy;
pub mod timing;

pub use alap::AlapScheduler;
pub use asap::AsapScheduler;
pub use availability::ResourceAvailability;
pub use config::{
    BackendTiming, DurationTable, ENV_CLBIT_WRITE_LATENCY, ENV_CONDITIONAL_LATENCY, PaddingConfig,
    SchedulerConfig, SiteDuration, TimingConfig, WriteLatency,
};
pub use context::ScheduleContext;
pub use duration::DurationResolver;
pub use error::{ConfigError, NodeContext, ScheduleError, ScheduleResult};
pub use padding::DelayInsertion;
pub use reversal::{MirroredLatencies, to_forward_start, validate_against_asap};
pub use schedule::{Schedule, ScheduleWarning, ScheduledCircuit, TimelineEntry};
pub use scheduler::Scheduler;
pub use strategy::{SchedulingPolicy, SchedulingStrategy};
pub use timing::TimingModel;
