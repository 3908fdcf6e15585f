//! Configuration loading and collection of application blocks.
//!
//! A configuration file looks like:
//!
//! ```yaml
//! general:
//!   stop_time: 60s
//!   dce_path: ["/opt/dce/bin"]
//!
//! hosts:
//!   - id: left/host0
//!   - id: right/host0
//!     node: 7
//!
//! applications:
//!   - Id: left/host0/server
//!     Binary: udp-server
//!     Arguments: "--port 7"
//!     StartTime: 1s
//!   - Id: right/host0/client
//!     Binary: udp-client
//!     Environment: "TARGET=10.0.0.1,COUNT=10"
//!     StartTime: 2s
//!     StopTime: 30s
//! ```
//!
//! Application blocks can also be given on the command line as
//! `Key:Value;Key:Value` strings.

use crate::config::{ApplicationConfig, ValidationError};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Separator between entries of a command-line application block.
const BLOCK_ENTRY_SEPARATOR: char = ';';
/// Separator between key and value inside a block entry.
const BLOCK_KEY_SEPARATOR: char = ':';

/// Simulation-wide settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Simulation stop time (e.g. "60s", "5min")
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<Duration>,
    /// Directories searched for bare binary names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dce_path: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// A simulated host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    pub id: String,
    /// Fixed node number; allocated automatically when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<u32>,
    /// Host without an execution node
    #[serde(default)]
    pub detached: bool,
}

/// On-disk layout of a configuration file
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub hosts: Vec<HostConfig>,
    #[serde(default)]
    pub applications: Vec<ApplicationConfig>,
}

impl SimulationConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = std::collections::HashSet::new();
        for host in &self.hosts {
            if host.id.is_empty() {
                return Err(ValidationError::EmptyId);
            }
            if !seen.insert(host.id.as_str()) {
                return Err(ValidationError::InvalidValue {
                    field: "hosts".to_string(),
                    value: host.id.clone(),
                    reason: "duplicate host id".to_string(),
                });
            }
            if host.detached && host.node.is_some() {
                return Err(ValidationError::InvalidValue {
                    field: "node".to_string(),
                    value: host.id.clone(),
                    reason: "a detached host cannot have a node".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> color_eyre::Result<SimulationConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)?;
    let config: SimulationConfig = serde_yaml::from_reader(file)?;
    config.validate()?;

    Ok(config)
}

/// Parse a command-line application block (`Key:Value;Key:Value`).
///
/// Each entry is split at its first `:`, so values may contain `:`.
/// Empty entries are skipped. A value may not contain `;`.
pub fn parse_application_block(block: &str) -> Result<ApplicationConfig, ValidationError> {
    let mut fields = Vec::new();
    for entry in block.split(BLOCK_ENTRY_SEPARATOR) {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (key, value) = entry
            .split_once(BLOCK_KEY_SEPARATOR)
            .ok_or_else(|| ValidationError::MalformedBlock {
                block: block.to_string(),
                reason: format!("entry '{}' is missing ':'", entry),
            })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ValidationError::MalformedBlock {
                block: block.to_string(),
                reason: format!("entry '{}' has an empty key", entry),
            });
        }
        fields.push((key.to_string(), Some(value.to_string())));
    }
    Ok(ApplicationConfig::from_fields(fields))
}

/// Collects application configurations in the order they were parsed.
#[derive(Debug, Default)]
pub struct ConfigParser {
    general: GeneralConfig,
    hosts: Vec<HostConfig>,
    applications: Vec<ApplicationConfig>,
}

impl ConfigParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration file and append its hosts and applications.
    ///
    /// General settings from the file replace the current ones.
    pub fn parse_file(&mut self, path: &Path) -> color_eyre::Result<()> {
        let config = load_config(path)?;
        info!(
            "Loaded {} host(s) and {} application(s) from {:?}",
            config.hosts.len(),
            config.applications.len(),
            path
        );
        self.general = config.general;
        self.hosts.extend(config.hosts);
        self.applications.extend(config.applications);
        Ok(())
    }

    /// Parse a command-line block and append it.
    pub fn add_application_arg(&mut self, block: &str) -> Result<(), ValidationError> {
        let config = parse_application_block(block)?;
        debug!("Collected application '{}' from command line", config.id());
        self.applications.push(config);
        Ok(())
    }

    pub fn add_application(&mut self, config: ApplicationConfig) {
        self.applications.push(config);
    }

    pub fn add_host(&mut self, host: HostConfig) {
        self.hosts.push(host);
    }

    /// Collected application configurations, in parse order.
    pub fn application_configs(&self) -> &[ApplicationConfig] {
        &self.applications
    }

    pub fn host_configs(&self) -> &[HostConfig] {
        &self.hosts
    }

    pub fn general(&self) -> &GeneralConfig {
        &self.general
    }

    pub fn general_mut(&mut self) -> &mut GeneralConfig {
        &mut self.general
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
general:
  stop_time: 60s
hosts:
  - id: left/host0
  - id: right/host0
    node: 7
applications:
  - Id: left/host0/server
    Binary: udp-server
    StartTime: 1s
  - Id: right/host0/client
    Binary: udp-client
    Environment: "TARGET=10.0.0.1,COUNT=10"
"#;

    #[test]
    fn test_empty_parser() {
        let parser = ConfigParser::new();
        assert!(parser.application_configs().is_empty());
        assert!(parser.host_configs().is_empty());
    }

    #[test]
    fn test_parse_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", SAMPLE).unwrap();

        let mut parser = ConfigParser::new();
        parser.parse_file(temp_file.path()).unwrap();

        assert_eq!(parser.general().stop_time, Some(Duration::from_secs(60)));
        assert_eq!(parser.host_configs().len(), 2);
        assert_eq!(parser.host_configs()[1].node, Some(7));

        let ids: Vec<&str> = parser.application_configs().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["left/host0/server", "right/host0/client"]);
    }

    #[test]
    fn test_order_is_append_order() {
        let mut parser = ConfigParser::new();
        parser.add_application_arg("Id:a/b/first;Binary:one").unwrap();
        parser.add_application(ApplicationConfig::from_fields([(
            "Id",
            Some("a/b/second".to_string()),
        )]));
        parser.add_application_arg("Id:a/b/first;Binary:dup").unwrap();

        let ids: Vec<&str> = parser.application_configs().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["a/b/first", "a/b/second", "a/b/first"]);
    }

    #[test]
    fn test_parse_application_block() {
        let cfg = parse_application_block("Id:left/h0/app; Binary:/bin/app;Arguments:-t 10;;").unwrap();
        assert_eq!(cfg.id(), "left/h0/app");
        assert_eq!(cfg.find_value("Binary"), Some("/bin/app"));
        assert_eq!(cfg.find_value("Arguments"), Some("-t 10"));

        let cfg = parse_application_block("Id:a/b/c;Environment:URL=http://x:80").unwrap();
        assert_eq!(cfg.find_value("Environment"), Some("URL=http://x:80"));
    }

    #[test]
    fn test_parse_application_block_errors() {
        assert!(matches!(
            parse_application_block("Id:a/b/c;Binary"),
            Err(ValidationError::MalformedBlock { .. })
        ));
        assert!(matches!(
            parse_application_block(":value"),
            Err(ValidationError::MalformedBlock { .. })
        ));
    }

    #[test]
    fn test_validate_hosts() {
        let config: SimulationConfig = serde_yaml::from_str(
            "hosts:\n  - id: h\n  - id: h\n",
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config: SimulationConfig = serde_yaml::from_str(
            "hosts:\n  - id: h\n    node: 1\n    detached: true\n",
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config: SimulationConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.validate().is_ok());
    }
}
