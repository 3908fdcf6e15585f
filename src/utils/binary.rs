//! Binary path resolution and validation utilities.
//!
//! DCE looks binaries up by name in the directories listed in `DCE_PATH`.
//! These helpers repeat that lookup ahead of time so that a typo in a
//! `Binary` field is reported before the simulation starts.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable listing binary search directories.
pub const DCE_PATH_VAR: &str = "DCE_PATH";

/// Errors that can occur during binary resolution or validation
#[derive(Debug, thiserror::Error)]
pub enum BinaryError {
    #[error("Binary not found: {path}")]
    NotFound { path: String },

    #[error("Binary is not executable: {path}")]
    NotExecutable { path: String },

    #[error("Binary '{name}' not found in search path [{dirs}]")]
    NotInSearchPath { name: String, dirs: String },

    #[error("Cannot determine home directory")]
    NoHomeDir,
}

/// Get the user's home directory from the HOME environment variable
fn get_home_dir() -> Result<PathBuf, BinaryError> {
    env::var("HOME")
        .map(PathBuf::from)
        .map_err(|_| BinaryError::NoHomeDir)
}

/// Read the binary search directories from `DCE_PATH`.
pub fn search_path_from_env() -> Vec<PathBuf> {
    env::var_os(DCE_PATH_VAR)
        .map(|value| env::split_paths(&value).collect())
        .unwrap_or_default()
}

/// Whether a binary spec names a path rather than a bare name.
pub fn is_explicit_path(name_or_path: &str) -> bool {
    name_or_path.contains('/') || name_or_path.starts_with('~')
}

/// Expand a leading `~/` in an explicit path.
pub fn expand_home(path: &str) -> Result<PathBuf, BinaryError> {
    match path.strip_prefix("~/") {
        Some(rest) => Ok(get_home_dir()?.join(rest)),
        None if path == "~" => get_home_dir(),
        None => Ok(PathBuf::from(path)),
    }
}

/// Validate that a binary exists and is executable.
pub fn validate_binary(path: &Path) -> Result<(), BinaryError> {
    let metadata = path.metadata().map_err(|_| BinaryError::NotFound {
        path: path.display().to_string(),
    })?;

    if !metadata.is_file() || !is_executable(&metadata) {
        return Err(BinaryError::NotExecutable {
            path: path.display().to_string(),
        });
    }

    Ok(())
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}

/// Resolve a binary spec against the search directories and validate it.
///
/// Explicit paths are checked as given. Bare names are looked up in each
/// directory in order; the first executable match wins.
pub fn resolve_binary(name_or_path: &str, search_dirs: &[PathBuf]) -> Result<PathBuf, BinaryError> {
    if is_explicit_path(name_or_path) {
        let path = expand_home(name_or_path)?;
        validate_binary(&path)?;
        return Ok(path);
    }

    for dir in search_dirs {
        let candidate = dir.join(name_or_path);
        if validate_binary(&candidate).is_ok() {
            log::debug!("Resolved binary '{}' to {:?}", name_or_path, candidate);
            return Ok(candidate);
        }
    }

    Err(BinaryError::NotInSearchPath {
        name: name_or_path.to_string(),
        dirs: search_dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        }
        #[cfg(not(unix))]
        let _ = mode;
        path
    }

    #[test]
    fn test_explicit_path_detection() {
        assert!(is_explicit_path("/usr/bin/iperf"));
        assert!(is_explicit_path("./iperf"));
        assert!(is_explicit_path("~/bin/iperf"));
        assert!(!is_explicit_path("iperf"));
    }

    #[test]
    fn test_expand_home() {
        let expanded = expand_home("~/bin/iperf").unwrap();
        assert!(expanded.ends_with("bin/iperf"));
        assert!(!expanded.starts_with("~"));
        assert_eq!(expand_home("/opt/iperf").unwrap(), PathBuf::from("/opt/iperf"));
    }

    #[test]
    fn test_resolve_from_search_path() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let expected = write_file(second.path(), "udp-client", 0o755);

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(resolve_binary("udp-client", &dirs).unwrap(), expected);
    }

    #[test]
    fn test_resolve_missing_name() {
        let dir = TempDir::new().unwrap();
        let err = resolve_binary("nope", &[dir.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, BinaryError::NotInSearchPath { .. }));
    }

    #[test]
    fn test_resolve_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "server", 0o755);
        let spec = path.to_string_lossy().to_string();
        assert_eq!(resolve_binary(&spec, &[]).unwrap(), path);

        let missing = dir.path().join("absent").to_string_lossy().to_string();
        assert!(matches!(
            resolve_binary(&missing, &[]),
            Err(BinaryError::NotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_rejects_non_executable() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "data.txt", 0o644);
        assert!(matches!(
            validate_binary(&path),
            Err(BinaryError::NotExecutable { .. })
        ));
    }
}
