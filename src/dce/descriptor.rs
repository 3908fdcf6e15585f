//! Launch descriptor for one external binary.

use crate::config::ValidationError;
use serde::Serialize;

/// Stack size used when a configuration does not set one (1 MiB).
pub const DEFAULT_STACK_SIZE: u64 = 1 << 20;

/// Everything the runtime needs to start one external process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchDescriptor {
    binary: String,
    stack_size: u64,
    arguments: Vec<String>,
    environment: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdin_file: Option<String>,
}

impl LaunchDescriptor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            stack_size: DEFAULT_STACK_SIZE,
            arguments: Vec::new(),
            environment: Vec::new(),
            stdin_file: None,
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn stack_size(&self) -> u64 {
        self.stack_size
    }

    pub fn set_stack_size(&mut self, bytes: u64) {
        self.stack_size = bytes;
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Append the whitespace-separated tokens of `args`.
    pub fn parse_arguments(&mut self, args: &str) {
        self.arguments
            .extend(args.split_ascii_whitespace().map(str::to_string));
    }

    pub fn reset_arguments(&mut self) {
        self.arguments.clear();
    }

    pub fn environment(&self) -> &[(String, String)] {
        &self.environment
    }

    /// Look up an environment variable.
    pub fn env(&self, key: &str) -> Option<&str> {
        self.environment
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an environment variable. A repeated key replaces the earlier
    /// value and keeps its original position.
    pub fn add_environment(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.environment.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.environment.push((key, value)),
        }
    }

    pub fn reset_environment(&mut self) {
        self.environment.clear();
    }

    pub fn stdin_file(&self) -> Option<&str> {
        self.stdin_file.as_deref()
    }

    pub fn set_stdin_file(&mut self, path: impl Into<String>) {
        self.stdin_file = Some(path.into());
    }
}

/// Parse an environment string of the form `KEY1=VALUE1,KEY2=VALUE2,...`.
///
/// The key of each entry ends at its first `=`; the value runs to the next
/// `,` and may itself contain `=`. There is no escaping. A trailing comma
/// is accepted; any other entry without `=` is rejected.
pub fn parse_environment(env: &str) -> Result<Vec<(String, String)>, ValidationError> {
    let mut pairs = Vec::new();
    let mut rest = env;

    while !rest.is_empty() {
        let (entry, tail) = rest.split_once(',').unwrap_or((rest, ""));
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| ValidationError::InvalidEnvironment {
                entry: entry.to_string(),
            })?;
        pairs.push((key.to_string(), value.to_string()));
        rest = tail;
    }

    Ok(pairs)
}
