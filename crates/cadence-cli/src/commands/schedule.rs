//! Schedule command implementation.

use std::fmt::Write as _;
use std::fs;

use anyhow::{Context, Result};
use clap::ValueEnum;
use console::style;
use serde::Serialize;
use tracing::debug;

use cadence_ir::WireId;
use cadence_sched::{
    ScheduleWarning, ScheduledCircuit, Scheduler, SchedulingPolicy, TimelineEntry,
};

use super::common::{load_circuit, load_config};

/// Output format of the schedule command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable per-wire timelines
    Table,
    /// Machine-readable report
    Json,
}

/// Arguments of the schedule command.
pub struct ScheduleArgs<'a> {
    pub input: &'a str,
    pub config: Option<&'a str>,
    pub policy: SchedulingPolicy,
    pub pad: bool,
    pub format: Format,
    pub output: Option<&'a str>,
}

/// Execute the schedule command.
pub fn execute(args: &ScheduleArgs<'_>) -> Result<()> {
    eprintln!(
        "{} Scheduling {} ({})",
        style("→").cyan().bold(),
        style(args.input).green(),
        style(args.policy).yellow()
    );

    let circuit = load_circuit(args.input)?;
    let config = load_config(args.config)?;
    debug!(timing = ?config.timing, backend = ?config.backend, "Loaded scheduler configuration");
    eprintln!(
        "  Loaded: {} qubits, {} clbits, {} ops",
        circuit.num_qubits(),
        circuit.num_clbits(),
        circuit.dag().num_ops()
    );

    let name = circuit.name().to_string();
    let scheduled = Scheduler::new(args.policy)
        .with_config(config)
        .with_padding(args.pad)
        .run(circuit.into_dag())
        .context("Scheduling failed")?;

    for warning in scheduled.warnings() {
        eprintln!("  {} {warning}", style("warning:").yellow().bold());
    }
    eprintln!(
        "{} Total duration {} ticks, {} delays inserted",
        style("✓").green().bold(),
        scheduled.total_duration(),
        scheduled.idle_nodes.len()
    );

    let report = ScheduleReport::new(&name, args.policy, &scheduled);
    let content = match args.format {
        Format::Table => report.render_table(),
        Format::Json => {
            let mut json = serde_json::to_string_pretty(&report)?;
            json.push('\n');
            json
        }
    };

    match args.output {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write file: {path}"))?;
            eprintln!("  Output: {}", style(path).green());
        }
        None => print!("{content}"),
    }

    Ok(())
}

/// Everything the command reports about one run.
#[derive(Debug, Serialize)]
pub struct ScheduleReport<'a> {
    pub circuit: &'a str,
    pub policy: String,
    pub total_duration: u64,
    pub warnings: &'a [ScheduleWarning],
    pub wires: Vec<WireReport>,
}

/// Timeline of one wire.
#[derive(Debug, Serialize)]
pub struct WireReport {
    pub wire: String,
    pub timeline: Vec<TimelineEntry>,
}

impl<'a> ScheduleReport<'a> {
    pub fn new(circuit: &'a str, policy: SchedulingPolicy, scheduled: &'a ScheduledCircuit) -> Self {
        // Clbits without accesses carry no information.
        let wires = scheduled
            .dag
            .wires()
            .into_iter()
            .filter_map(|wire| {
                let timeline = scheduled.timeline(wire);
                (matches!(wire, WireId::Qubit(_)) || !timeline.is_empty()).then(|| WireReport {
                    wire: wire.to_string(),
                    timeline,
                })
            })
            .collect();
        Self {
            circuit,
            policy: policy.to_string(),
            total_duration: scheduled.total_duration(),
            warnings: scheduled.warnings(),
            wires,
        }
    }

    /// Plain-text rendering, one block per wire.
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} [{}] total {} ticks",
            self.circuit, self.policy, self.total_duration
        );
        for wire in &self.wires {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", wire.wire);
            for entry in &wire.timeline {
                let _ = writeln!(
                    out,
                    "  {:>8} {:>8}  {}{}",
                    entry.start,
                    entry.start.saturating_add(entry.duration),
                    entry.name,
                    if entry.idle { " (idle)" } else { "" }
                );
            }
        }
        out
    }
}
