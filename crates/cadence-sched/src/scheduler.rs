//! Scheduling driver.

use cadence_ir::CircuitDag;
use tracing::{debug, info, instrument};

use crate::config::SchedulerConfig;
use crate::error::ScheduleResult;
use crate::padding::DelayInsertion;
use crate::schedule::ScheduledCircuit;
use crate::strategy::SchedulingPolicy;

/// Runs a scheduling strategy and, optionally, idle-time padding.
///
/// # Example
///
/// ```rust
/// use cadence_ir::{Circuit, ClbitId, QubitId};
/// use cadence_sched::{Scheduler, SchedulerConfig, SchedulingPolicy};
///
/// let mut config = SchedulerConfig::default();
/// config.durations.set_default("x", 160).set_default("measure", 500);
///
/// let mut circuit = Circuit::with_size("ff", 2, 1);
/// circuit.measure(QubitId(0), ClbitId(0)).unwrap();
/// circuit.x(QubitId(1)).unwrap();
///
/// let scheduled = Scheduler::new(SchedulingPolicy::Alap { target_length: None })
///     .with_config(config)
///     .run(circuit.into_dag())
///     .unwrap();
/// assert_eq!(scheduled.total_duration(), 500);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    policy: SchedulingPolicy,
    config: SchedulerConfig,
    padding: Option<bool>,
}

impl Scheduler {
    /// Create a scheduler with the default configuration.
    pub fn new(policy: SchedulingPolicy) -> Self {
        Self {
            policy,
            config: SchedulerConfig::default(),
            padding: None,
        }
    }

    /// Use the given configuration.
    #[must_use]
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable or disable delay insertion, overriding the configuration.
    #[must_use]
    pub fn with_padding(mut self, enabled: bool) -> Self {
        self.padding = Some(enabled);
        self
    }

    /// The scheduling policy.
    pub fn policy(&self) -> SchedulingPolicy {
        self.policy
    }

    /// The configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn padding_enabled(&self) -> bool {
        self.padding.unwrap_or(self.config.padding.enabled)
    }

    /// Schedule `dag`, consuming it.
    ///
    /// With padding enabled the returned DAG is a rebuilt copy containing
    /// the inserted delays; otherwise it is `dag` with durations resolved and
    /// the schedule annotated.
    #[instrument(skip(self, dag), fields(policy = %self.policy, ops = dag.num_ops()))]
    pub fn run(&self, mut dag: CircuitDag) -> ScheduleResult<ScheduledCircuit> {
        let strategy = self.policy.strategy();
        debug!(strategy = strategy.name(), "scheduling");
        let schedule = strategy.schedule(&mut dag, &self.config)?;

        // Warnings are returned to the caller, who decides how to surface them.
        for warning in &schedule.warnings {
            debug!(%warning, "schedule warning");
        }

        let scheduled = if self.padding_enabled() {
            DelayInsertion::new()
                .with_fill_very_end(self.config.padding.fill_very_end)
                .run(&dag, &schedule)?
        } else {
            ScheduledCircuit {
                dag,
                schedule,
                idle_nodes: Vec::new(),
            }
        };

        info!(
            total = scheduled.total_duration(),
            ops = scheduled.dag.num_ops(),
            idle = scheduled.idle_nodes.len(),
            "Scheduling complete"
        );
        Ok(scheduled)
    }
}
