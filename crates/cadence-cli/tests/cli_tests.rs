//! CLI command parsing and end-to-end tests.
//!
//! Tests cover argument parsing (via clap `try_parse_from` on a mirror of the
//! binary's structs) and full runs of the `cadence` binary on temporary
//! circuit and configuration files.

// ============================================================================
// Clap argument parsing (test via try_parse_from on equivalent structs)
// ============================================================================

mod clap_parsing {
    use clap::{Parser, Subcommand, ValueEnum};

    // Mirror the CLI struct for testing (since main.rs is a binary)
    #[derive(Parser)]
    #[command(name = "cadence")]
    struct TestCli {
        #[arg(short, long, action = clap::ArgAction::Count, global = true)]
        verbose: u8,

        #[command(subcommand)]
        command: TestCommands,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    enum Policy {
        Asap,
        Alap,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    enum Format {
        Table,
        Json,
    }

    #[derive(Subcommand)]
    enum TestCommands {
        Schedule {
            #[arg(short, long)]
            input: String,
            #[arg(short, long)]
            config: Option<String>,
            #[arg(short, long, value_enum, default_value_t = Policy::Asap)]
            policy: Policy,
            #[arg(long)]
            target_length: Option<u64>,
            #[arg(long)]
            no_pad: bool,
            #[arg(short, long, value_enum, default_value_t = Format::Table)]
            format: Format,
            #[arg(short, long)]
            output: Option<String>,
        },
        Version,
    }

    #[test]
    fn test_schedule_defaults() {
        let cli = TestCli::try_parse_from(["cadence", "schedule", "-i", "circuit.json"]).unwrap();
        match cli.command {
            TestCommands::Schedule {
                input,
                config,
                policy,
                target_length,
                no_pad,
                format,
                output,
            } => {
                assert_eq!(input, "circuit.json");
                assert!(config.is_none());
                assert_eq!(policy, Policy::Asap);
                assert!(target_length.is_none());
                assert!(!no_pad);
                assert_eq!(format, Format::Table);
                assert!(output.is_none());
            }
            TestCommands::Version => panic!("expected schedule"),
        }
    }

    #[test]
    fn test_schedule_all_flags() {
        let cli = TestCli::try_parse_from([
            "cadence",
            "schedule",
            "--input",
            "c.json",
            "--config",
            "timing.yaml",
            "--policy",
            "alap",
            "--target-length",
            "1000",
            "--no-pad",
            "--format",
            "json",
            "--output",
            "out.json",
        ])
        .unwrap();
        match cli.command {
            TestCommands::Schedule {
                policy,
                target_length,
                no_pad,
                format,
                output,
                ..
            } => {
                assert_eq!(policy, Policy::Alap);
                assert_eq!(target_length, Some(1000));
                assert!(no_pad);
                assert_eq!(format, Format::Json);
                assert_eq!(output.as_deref(), Some("out.json"));
            }
            TestCommands::Version => panic!("expected schedule"),
        }
    }

    #[test]
    fn test_schedule_requires_input() {
        assert!(TestCli::try_parse_from(["cadence", "schedule"]).is_err());
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let result =
            TestCli::try_parse_from(["cadence", "schedule", "-i", "c.json", "-p", "greedy"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbose_count() {
        let cli = TestCli::try_parse_from(["cadence", "-vv", "version"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, TestCommands::Version));
    }

    #[test]
    fn test_no_subcommand() {
        assert!(TestCli::try_parse_from(["cadence"]).is_err());
    }
}

// ============================================================================
// End-to-end runs of the binary
// ============================================================================

mod binary {
    use std::fs;
    use std::path::Path;
    use std::process::{Command, Output};

    const FEEDFORWARD: &str = r#"{
        "name": "feedforward",
        "qubits": 2,
        "clbits": 1,
        "instructions": [
            { "name": "measure", "qubits": [0], "clbits": [0], "duration": 500 },
            { "name": "x", "qubits": [1], "duration": 160,
              "condition": { "clbits": [0], "value": 1 } }
        ]
    }"#;

    const FULL_DURATION: &str = "backend:\n  clbit_write_latency: full_duration\n";

    fn cadence(args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_cadence"))
            .args(args)
            .env_remove("CADENCE_CONDITIONAL_LATENCY")
            .env_remove("CADENCE_CLBIT_WRITE_LATENCY")
            .output()
            .unwrap()
    }

    fn write(dir: &Path, name: &str, contents: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn json_report(output: &Output) -> serde_json::Value {
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    #[test]
    fn test_alap_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "ff.json", FEEDFORWARD);
        let config = write(dir.path(), "timing.yaml", FULL_DURATION);

        let output = cadence(&[
            "schedule", "-i", &input, "-c", &config, "-p", "alap", "-f", "json",
        ]);
        let report = json_report(&output);

        assert_eq!(report["circuit"], "feedforward");
        assert_eq!(report["policy"], "alap");
        assert_eq!(report["total_duration"], 660);

        let q1 = &report["wires"][1];
        assert_eq!(q1["wire"], "q1");
        assert_eq!(q1["timeline"][0]["name"], "delay");
        assert_eq!(q1["timeline"][0]["duration"], 500);
        assert_eq!(q1["timeline"][0]["idle"], true);
        assert_eq!(q1["timeline"][1]["name"], "x");
        assert_eq!(q1["timeline"][1]["start"], 500);
    }

    #[test]
    fn test_environment_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "ff.json", FEEDFORWARD);
        let config = write(dir.path(), "timing.yaml", FULL_DURATION);

        let output = Command::new(env!("CARGO_BIN_EXE_cadence"))
            .args([
                "schedule",
                "-i",
                input.as_str(),
                "-c",
                config.as_str(),
                "-f",
                "json",
                "--no-pad",
            ])
            .env("CADENCE_CLBIT_WRITE_LATENCY", "100")
            .env("CADENCE_CONDITIONAL_LATENCY", "20")
            .output()
            .unwrap();
        let report = json_report(&output);
        assert_eq!(report["wires"][1]["timeline"][0]["start"], 120);
    }

    #[test]
    fn test_short_target_length_warns() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "ff.json", FEEDFORWARD);

        let output = cadence(&[
            "schedule",
            "-i",
            &input,
            "-p",
            "alap",
            "--target-length",
            "10",
            "-f",
            "json",
        ]);
        let report = json_report(&output);
        assert_eq!(report["total_duration"], 500);
        assert_eq!(report["warnings"][0]["kind"], "target_length_too_short");
        assert_eq!(report["warnings"][0]["requested"], 10);

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert_eq!(
            stderr.matches("target length 10 is shorter").count(),
            1,
            "stderr: {stderr}"
        );
    }

    #[test]
    fn test_table_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "ff.json", FEEDFORWARD);
        let out_path = dir.path().join("timeline.txt");

        let output = cadence(&[
            "schedule",
            "-i",
            &input,
            "-o",
            out_path.to_str().unwrap(),
        ]);
        assert!(output.status.success());
        assert!(output.stdout.is_empty());

        let table = fs::read_to_string(&out_path).unwrap();
        assert!(table.starts_with("feedforward [asap] total 500 ticks"));
        assert!(table.contains("measure"));
        assert!(table.contains("(idle)"));
    }

    #[test]
    fn test_missing_duration_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(
            dir.path(),
            "bare.json",
            r#"{ "qubits": 1, "instructions": [ { "name": "sx", "qubits": [0] } ] }"#,
        );

        let output = cadence(&["schedule", "-i", &input]);
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("No duration available"), "stderr: {stderr}");
    }

    #[test]
    fn test_duration_table_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(
            dir.path(),
            "bare.json",
            r#"{ "qubits": 1, "instructions": [ { "name": "sx", "qubits": [0] } ] }"#,
        );
        let config = write(dir.path(), "timing.yaml", "durations:\n  defaults:\n    sx: 160\n");

        let output = cadence(&["schedule", "-i", &input, "-c", &config, "-f", "json"]);
        let report = json_report(&output);
        assert_eq!(report["total_duration"], 160);
    }

    #[test]
    fn test_missing_input_file() {
        let output = cadence(&["schedule", "-i", "/nonexistent/circuit.json"]);
        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("File not found"));
    }

    #[test]
    fn test_version() {
        let output = cadence(&["version"]);
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
        assert!(stdout.contains("cadence-sched"));
    }
}
