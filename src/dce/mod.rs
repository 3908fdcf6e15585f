//! DCE application support.
//!
//! - `descriptor.rs`: the launch descriptor and the environment grammar
//! - `application.rs`: the component that builds and installs a descriptor

pub mod application;
pub mod descriptor;

pub use application::DceApplication;
pub use descriptor::{parse_environment, LaunchDescriptor, DEFAULT_STACK_SIZE};

use crate::config::ValidationError;
use crate::runtime::RuntimeError;
use crate::utils::{SimTime, TimeError};

/// Errors raised while binding an application to a host
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("trying to install DCE application '{id}' on host '{host}' with no node")]
    NoNode { id: String, host: String },
    #[error("runtime installed no application for '{id}'")]
    NothingInstalled { id: String },
    #[error("invalid time for DCE application '{id}'")]
    InvalidTime {
        id: String,
        #[source]
        source: TimeError,
    },
    #[error("DCE application '{id}' stops at {stop} before it starts at {start}")]
    StopBeforeStart {
        id: String,
        start: SimTime,
        stop: SimTime,
    },
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
