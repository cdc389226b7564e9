//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - instruction timing for quantum circuits",
        style("Cadence").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  cadence-ir     Circuit DAG, instructions and calibrations");
    println!("  cadence-sched  ASAP/ALAP scheduling and delay padding");
    println!("  cadence-cli    Command-line interface");
    println!();
    println!("License:    {}", style("Apache-2.0").dim());
}
