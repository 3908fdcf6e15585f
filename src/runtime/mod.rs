//! Simulator runtime port.
//!
//! The event loop, the virtualized process environment and the network
//! stack belong to the simulator. Components reach them only through
//! [`DceRuntime`], so any implementation can stand in: the recording
//! [`plan::PlanRuntime`] shipped here, or a fake in tests.

pub mod plan;

use crate::dce::LaunchDescriptor;
use crate::utils::SimTime;
use serde::Serialize;
use std::fmt;

pub use plan::{LaunchPlan, PlanRuntime};

/// Identifier of a simulated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node{}", self.0)
    }
}

/// Opaque reference to an application installed on a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ApplicationHandle {
    id: u64,
    node: NodeId,
    binary: String,
}

impl ApplicationHandle {
    pub fn new(id: u64, node: NodeId, binary: impl Into<String>) -> Self {
        Self {
            id,
            node,
            binary: binary.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

/// Errors reported by a runtime implementation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node {0} already exists")]
    DuplicateNode(NodeId),
    #[error("DCE manager is not installed on {0}")]
    ManagerMissing(NodeId),
    #[error("unknown application {0}")]
    UnknownApplication(u64),
    #[error("application {id} stop time {stop} is before its start time {start}")]
    StopBeforeStart {
        id: u64,
        start: SimTime,
        stop: SimTime,
    },
}

/// Framework calls a DCE application needs.
pub trait DceRuntime {
    /// Install DCE runtime support on a node.
    fn install_manager(&mut self, node: NodeId) -> Result<(), RuntimeError>;

    /// Install a launch descriptor on a node, returning the created
    /// application instances.
    fn install_in_node(
        &mut self,
        node: NodeId,
        descriptor: &LaunchDescriptor,
    ) -> Result<Vec<ApplicationHandle>, RuntimeError>;

    fn set_start_time(&mut self, app: &ApplicationHandle, at: SimTime) -> Result<(), RuntimeError>;

    fn set_stop_time(&mut self, app: &ApplicationHandle, at: SimTime) -> Result<(), RuntimeError>;
}
