//! Scheduler configuration.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with `CADENCE_` prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values
//!
//! ```yaml
//! timing:
//!   conditional_latency: 30
//! backend:
//!   conditional_latency: 0
//!   clbit_write_latency: full_duration
//! durations:
//!   defaults:
//!     sx: 160
//!     measure: 4000
//!   sites:
//!     - name: ecr
//!       qubits: [0, 1]
//!       duration: 660
//! padding:
//!   fill_very_end: true
//! ```

use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable overriding [`TimingConfig::conditional_latency`].
pub const ENV_CONDITIONAL_LATENCY: &str = "CADENCE_CONDITIONAL_LATENCY";
/// Environment variable overriding [`TimingConfig::clbit_write_latency`].
pub const ENV_CLBIT_WRITE_LATENCY: &str = "CADENCE_CLBIT_WRITE_LATENCY";

/// Complete scheduler configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Explicit latency settings for this run.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Defaults supplied by the target backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendTiming>,

    /// Generic per-operation durations.
    #[serde(default)]
    pub durations: DurationTable,

    /// Idle-time padding settings.
    #[serde(default)]
    pub padding: PaddingConfig,
}

/// Latency settings for one scheduling run.
///
/// Unset values fall back to [`BackendTiming`], then to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Ticks between reading a condition register and starting the
    /// conditional operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_latency: Option<u64>,

    /// Ticks between the start of a measurement and the moment its result
    /// is visible on the classical bit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clbit_write_latency: Option<u64>,
}

impl TimingConfig {
    /// Create a config with both latencies set.
    pub fn new(conditional_latency: u64, clbit_write_latency: u64) -> Self {
        Self {
            conditional_latency: Some(conditional_latency),
            clbit_write_latency: Some(clbit_write_latency),
        }
    }
}

/// When a written classical bit becomes visible, relative to the start of
/// the writing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WriteLatencyRepr", into = "WriteLatencyRepr")]
pub enum WriteLatency {
    /// A fixed number of ticks.
    Ticks(u64),
    /// At the end of the writing operation.
    FullDuration,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WriteLatencyRepr {
    Ticks(u64),
    Keyword(String),
}

impl TryFrom<WriteLatencyRepr> for WriteLatency {
    type Error = String;

    fn try_from(repr: WriteLatencyRepr) -> Result<Self, Self::Error> {
        match repr {
            WriteLatencyRepr::Ticks(ticks) => Ok(WriteLatency::Ticks(ticks)),
            WriteLatencyRepr::Keyword(word) if word == "full_duration" => {
                Ok(WriteLatency::FullDuration)
            }
            WriteLatencyRepr::Keyword(word) => Err(format!(
                "invalid clbit_write_latency '{word}': expected ticks or 'full_duration'"
            )),
        }
    }
}

impl From<WriteLatency> for WriteLatencyRepr {
    fn from(latency: WriteLatency) -> Self {
        match latency {
            WriteLatency::Ticks(ticks) => WriteLatencyRepr::Ticks(ticks),
            WriteLatency::FullDuration => WriteLatencyRepr::Keyword("full_duration".into()),
        }
    }
}

/// Timing defaults supplied by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendTiming {
    /// Default conditional latency in ticks.
    #[serde(default)]
    pub conditional_latency: u64,

    /// Default register write latency.
    #[serde(default = "default_write_latency")]
    pub clbit_write_latency: WriteLatency,
}

fn default_write_latency() -> WriteLatency {
    WriteLatency::FullDuration
}

impl Default for BackendTiming {
    fn default() -> Self {
        Self {
            conditional_latency: 0,
            clbit_write_latency: default_write_latency(),
        }
    }
}

/// Duration of one operation on specific qubits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDuration {
    /// Operation name.
    pub name: String,
    /// Qubit indices, in operand order.
    pub qubits: Vec<u32>,
    /// Duration in ticks.
    pub duration: u64,
}

#[derive(Default, Serialize, Deserialize)]
struct DurationTableRepr {
    #[serde(default)]
    defaults: FxHashMap<String, u64>,
    #[serde(default)]
    sites: Vec<SiteDuration>,
}

/// Backend durations: per-site entries first, then per-name defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DurationTableRepr", into = "DurationTableRepr")]
pub struct DurationTable {
    defaults: FxHashMap<String, u64>,
    sites: FxHashMap<(String, Vec<u32>), u64>,
}

impl From<DurationTableRepr> for DurationTable {
    fn from(repr: DurationTableRepr) -> Self {
        let mut table = DurationTable {
            defaults: repr.defaults,
            sites: FxHashMap::default(),
        };
        for site in repr.sites {
            table.set_site(site.name, site.qubits, site.duration);
        }
        table
    }
}

impl From<DurationTable> for DurationTableRepr {
    fn from(table: DurationTable) -> Self {
        let mut sites: Vec<_> = table
            .sites
            .into_iter()
            .map(|((name, qubits), duration)| SiteDuration {
                name,
                qubits,
                duration,
            })
            .collect();
        sites.sort_by(|a, b| (&a.name, &a.qubits).cmp(&(&b.name, &b.qubits)));
        DurationTableRepr {
            defaults: table.defaults,
            sites,
        }
    }
}

impl DurationTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration used for `name` on any qubits without a site entry.
    pub fn set_default(&mut self, name: impl Into<String>, duration: u64) -> &mut Self {
        self.defaults.insert(name.into(), duration);
        self
    }

    /// Set the duration of `name` on exactly these qubits.
    pub fn set_site(&mut self, name: impl Into<String>, qubits: Vec<u32>, duration: u64) -> &mut Self {
        self.sites.insert((name.into(), qubits), duration);
        self
    }

    /// Look up a duration, preferring the exact site.
    pub fn duration_for(&self, name: &str, qubits: &[u32]) -> Option<u64> {
        self.sites
            .get(&(name.to_string(), qubits.to_vec()))
            .or_else(|| self.defaults.get(name))
            .copied()
    }

    /// Check if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty() && self.sites.is_empty()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.defaults.keys().any(String::is_empty) {
            return Err(ConfigError::Validation(
                "duration defaults must not use an empty operation name".to_string(),
            ));
        }
        for (name, qubits) in self.sites.keys() {
            if name.is_empty() {
                return Err(ConfigError::Validation(
                    "duration sites must not use an empty operation name".to_string(),
                ));
            }
            if qubits.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "duration site for '{name}' lists no qubits"
                )));
            }
            let mut sorted = qubits.clone();
            sorted.sort_unstable();
            sorted.dedup();
            if sorted.len() != qubits.len() {
                return Err(ConfigError::Validation(format!(
                    "duration site for '{name}' repeats a qubit: {qubits:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Idle-time padding settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaddingConfig {
    /// Insert delays into idle periods after scheduling.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Pad every qubit up to the total schedule length.
    #[serde(default = "default_true")]
    pub fill_very_end: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PaddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fill_very_end: true,
        }
    }
}

impl SchedulerConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: SchedulerConfig =
            serde_yaml_ng::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_yaml_str(&contents)
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => SchedulerConfig::default(),
        };
        let config = config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Merge environment variables into this configuration.
    ///
    /// Only variables that are set override the current values.
    pub fn merge_env(self) -> Result<Self, ConfigError> {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Merge overrides from an arbitrary variable source.
    pub fn merge_env_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let parse = |key: &str, value: String| {
            value.trim().parse::<u64>().map_err(|_| {
                ConfigError::Validation(format!(
                    "{key} must be a non-negative integer, got '{value}'"
                ))
            })
        };

        if let Some(v) = lookup(ENV_CONDITIONAL_LATENCY) {
            self.timing.conditional_latency = Some(parse(ENV_CONDITIONAL_LATENCY, v)?);
        }
        if let Some(v) = lookup(ENV_CLBIT_WRITE_LATENCY) {
            self.timing.clbit_write_latency = Some(parse(ENV_CLBIT_WRITE_LATENCY, v)?);
        }

        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.durations.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.timing, TimingConfig::default());
        assert!(config.backend.is_none());
        assert!(config.durations.is_empty());
        assert!(config.padding.enabled);
        assert!(config.padding.fill_very_end);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_yaml() {
        let yaml = r"
timing:
  conditional_latency: 30
backend:
  clbit_write_latency: full_duration
durations:
  defaults:
    sx: 160
    measure: 4000
  sites:
    - name: ecr
      qubits: [0, 1]
      duration: 660
padding:
  fill_very_end: false
";
        let config = SchedulerConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.timing.conditional_latency, Some(30));
        assert_eq!(config.timing.clbit_write_latency, None);
        let backend = config.backend.unwrap();
        assert_eq!(backend.conditional_latency, 0);
        assert_eq!(backend.clbit_write_latency, WriteLatency::FullDuration);
        assert_eq!(config.durations.duration_for("ecr", &[0, 1]), Some(660));
        assert_eq!(config.durations.duration_for("ecr", &[1, 0]), None);
        assert_eq!(config.durations.duration_for("sx", &[7]), Some(160));
        assert!(config.padding.enabled);
        assert!(!config.padding.fill_very_end);
    }

    #[test]
    fn test_write_latency_ticks() {
        let config = SchedulerConfig::from_yaml_str("backend:\n  clbit_write_latency: 120\n").unwrap();
        assert_eq!(
            config.backend.map(|b| b.clbit_write_latency),
            Some(WriteLatency::Ticks(120))
        );
    }

    #[test]
    fn test_write_latency_unknown_keyword() {
        let err = SchedulerConfig::from_yaml_str("backend:\n  clbit_write_latency: half\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_negative_latency_is_rejected() {
        let err =
            SchedulerConfig::from_yaml_str("timing:\n  conditional_latency: -5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_site_with_repeated_qubit_is_invalid() {
        let yaml = "durations:\n  sites:\n    - name: cx\n      qubits: [1, 1]\n      duration: 300\n";
        let err = SchedulerConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_env_overrides() {
        let config = SchedulerConfig::from_yaml_str("timing:\n  conditional_latency: 10\n")
            .unwrap()
            .merge_env_from(|key| match key {
                ENV_CONDITIONAL_LATENCY => Some("45".to_string()),
                ENV_CLBIT_WRITE_LATENCY => Some(" 0 ".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.timing, TimingConfig::new(45, 0));
    }

    #[test]
    fn test_env_override_must_be_integer() {
        let err = SchedulerConfig::default()
            .merge_env_from(|key| (key == ENV_CLBIT_WRITE_LATENCY).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timing.yaml");
        std::fs::write(&path, "timing:\n  clbit_write_latency: 200\n").unwrap();

        let config = SchedulerConfig::from_file(&path).unwrap();
        assert_eq!(config.timing.clbit_write_latency, Some(200));

        let missing = SchedulerConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io(_)));
    }

    #[test]
    fn test_duration_table_round_trips_through_yaml() {
        let mut config = SchedulerConfig::default();
        config
            .durations
            .set_default("x", 160)
            .set_site("cx", vec![0, 1], 800);
        let yaml = serde_yaml_ng::to_string(&config).unwrap();
        let parsed = SchedulerConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }
}
