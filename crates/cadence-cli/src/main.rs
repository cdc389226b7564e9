//! Cadence Command-Line Interface
//!
//! The main entry point for the Cadence CLI tool.
//!
//! ```text
//! q0  ──[ measure ]──────────────────────────
//!                 ╲ c0
//! q1  ──[  delay  ]──[ x if c0 ]─────────────
//!
//!              C A D E N C E
//!     instruction timing for feedforward circuits
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{schedule, version};

/// Cadence - ASAP/ALAP instruction scheduling for quantum circuits
#[derive(Parser)]
#[command(name = "cadence")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule a circuit and print per-wire timelines
    Schedule {
        /// Input circuit (JSON)
        #[arg(short, long)]
        input: String,

        /// Timing configuration (YAML)
        #[arg(short, long)]
        config: Option<String>,

        /// Scheduling policy
        #[arg(short, long, value_enum, default_value_t = Policy::Asap)]
        policy: Policy,

        /// Requested total length in ticks (ALAP only)
        #[arg(long)]
        target_length: Option<u64>,

        /// Do not insert delays into idle time
        #[arg(long)]
        no_pad: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = schedule::Format::Table)]
        format: schedule::Format,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show version information
    Version,
}

/// Scheduling policy selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Policy {
    /// As soon as possible
    Asap,
    /// As late as possible
    Alap,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Schedule {
            input,
            config,
            policy,
            target_length,
            no_pad,
            format,
            output,
        } => {
            let policy = match policy {
                Policy::Asap => {
                    if target_length.is_some() {
                        eprintln!(
                            "{} --target-length only applies to ALAP; ignoring",
                            style("warning:").yellow().bold()
                        );
                    }
                    cadence_sched::SchedulingPolicy::Asap
                }
                Policy::Alap => cadence_sched::SchedulingPolicy::Alap { target_length },
            };
            schedule::execute(&schedule::ScheduleArgs {
                input: &input,
                config: config.as_deref(),
                policy,
                pad: !no_pad,
                format,
                output: output.as_deref(),
            })
        }

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
