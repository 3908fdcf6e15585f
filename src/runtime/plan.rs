//! Recording runtime that turns framework calls into a launch plan.
//!
//! ## Plan Structure
//!
//! ```yaml
//! nodes:
//!   0:
//!     dce_manager: true
//!     applications:
//!       - id: 0
//!         component: left/host0/iperf
//!         binary: iperf
//!         stack_size: 1048576
//!         arguments: ["-s"]
//!         environment: [["HOME", "/"]]
//!         start_time: 1s
//! ```

use super::{ApplicationHandle, DceRuntime, NodeId, RuntimeError};
use crate::dce::LaunchDescriptor;
use crate::utils::SimTime;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

/// A launch plan: every node and the applications installed on it.
#[derive(Debug, Default, Serialize)]
pub struct LaunchPlan {
    /// Simulation stop time, if configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<SimTime>,
    /// Nodes keyed by node number
    pub nodes: BTreeMap<u32, PlannedNode>,
}

impl LaunchPlan {
    pub fn application_count(&self) -> usize {
        self.nodes.values().map(|n| n.applications.len()).sum()
    }
}

/// One node in the plan.
#[derive(Debug, Default, Serialize)]
pub struct PlannedNode {
    /// Host attached to this node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Whether DCE runtime support is installed
    pub dce_manager: bool,
    /// Applications in installation order
    pub applications: Vec<PlannedApplication>,
}

/// One application in the plan.
#[derive(Debug, Serialize)]
pub struct PlannedApplication {
    pub id: u64,
    #[serde(flatten)]
    pub descriptor: LaunchDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<SimTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<SimTime>,
}

/// [`DceRuntime`] that records calls instead of executing them.
#[derive(Debug, Default)]
pub struct PlanRuntime {
    plan: LaunchPlan,
    next_node: u32,
    next_application: u64,
    manager_installs: usize,
}

impl PlanRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node with the next free number.
    pub fn add_node(&mut self) -> NodeId {
        while self.plan.nodes.contains_key(&self.next_node) {
            self.next_node += 1;
        }
        let id = NodeId(self.next_node);
        self.plan.nodes.insert(id.0, PlannedNode::default());
        self.next_node += 1;
        id
    }

    /// Create a node with a fixed number.
    pub fn add_node_with_id(&mut self, id: NodeId) -> Result<NodeId, RuntimeError> {
        if self.plan.nodes.contains_key(&id.0) {
            return Err(RuntimeError::DuplicateNode(id));
        }
        self.plan.nodes.insert(id.0, PlannedNode::default());
        Ok(id)
    }

    /// Record which host a node belongs to.
    pub fn set_node_host(&mut self, node: NodeId, host: &str) -> Result<(), RuntimeError> {
        self.node_mut(node)?.host = Some(host.to_string());
        Ok(())
    }

    pub fn set_stop_time_limit(&mut self, stop: Option<SimTime>) {
        self.plan.stop_time = stop;
    }

    /// Number of times runtime support was actually installed.
    pub fn manager_installs(&self) -> usize {
        self.manager_installs
    }

    pub fn plan(&self) -> &LaunchPlan {
        &self.plan
    }

    pub fn into_plan(self) -> LaunchPlan {
        self.plan
    }

    pub fn application(&self, app: &ApplicationHandle) -> Option<&PlannedApplication> {
        self.plan
            .nodes
            .get(&app.node().0)?
            .applications
            .iter()
            .find(|a| a.id == app.id())
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut PlannedNode, RuntimeError> {
        self.plan
            .nodes
            .get_mut(&node.0)
            .ok_or(RuntimeError::UnknownNode(node))
    }

    fn application_mut(
        &mut self,
        app: &ApplicationHandle,
    ) -> Result<&mut PlannedApplication, RuntimeError> {
        self.plan
            .nodes
            .get_mut(&app.node().0)
            .and_then(|n| n.applications.iter_mut().find(|a| a.id == app.id()))
            .ok_or(RuntimeError::UnknownApplication(app.id()))
    }
}

impl DceRuntime for PlanRuntime {
    fn install_manager(&mut self, node: NodeId) -> Result<(), RuntimeError> {
        let planned = self.node_mut(node)?;
        if planned.dce_manager {
            debug!("DCE manager already installed on {}", node);
            return Ok(());
        }
        planned.dce_manager = true;
        self.manager_installs += 1;
        debug!("Installed DCE manager on {}", node);
        Ok(())
    }

    fn install_in_node(
        &mut self,
        node: NodeId,
        descriptor: &LaunchDescriptor,
    ) -> Result<Vec<ApplicationHandle>, RuntimeError> {
        let id = self.next_application;
        let planned = self.node_mut(node)?;
        if !planned.dce_manager {
            return Err(RuntimeError::ManagerMissing(node));
        }
        planned.applications.push(PlannedApplication {
            id,
            descriptor: descriptor.clone(),
            start_time: None,
            stop_time: None,
        });
        self.next_application += 1;

        debug!("Installed '{}' on {} as application {}", descriptor.binary(), node, id);
        Ok(vec![ApplicationHandle::new(id, node, descriptor.binary())])
    }

    fn set_start_time(&mut self, app: &ApplicationHandle, at: SimTime) -> Result<(), RuntimeError> {
        let planned = self.application_mut(app)?;
        if let Some(stop) = planned.stop_time {
            if stop < at {
                return Err(RuntimeError::StopBeforeStart { id: app.id(), start: at, stop });
            }
        }
        planned.start_time = Some(at);
        Ok(())
    }

    fn set_stop_time(&mut self, app: &ApplicationHandle, at: SimTime) -> Result<(), RuntimeError> {
        let planned = self.application_mut(app)?;
        if let Some(start) = planned.start_time {
            if at < start {
                return Err(RuntimeError::StopBeforeStart { id: app.id(), start, stop: at });
            }
        }
        planned.stop_time = Some(at);
        Ok(())
    }
}
