//! Shared utilities: simulation time parsing and binary lookup.

pub mod binary;
pub mod time;

pub use binary::{resolve_binary, search_path_from_env, validate_binary, BinaryError};
pub use time::{SimTime, TimeError};
