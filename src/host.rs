//! Simulated hosts and the components attached to them.
//!
//! A [`Host`] owns every component registered with it. Components only
//! remember the id of the host they were bound to.

use crate::runtime::{ApplicationHandle, DceRuntime, NodeId, RuntimeError};
use log::debug;
use std::fmt;

/// A named, path-addressed unit of behavior attached to a host.
pub trait Component: fmt::Debug {
    fn id(&self) -> &str;

    fn id_path(&self) -> &[String];

    /// Short type name used in logs and listings.
    fn kind(&self) -> &'static str;

    /// The application this component runs, if it runs one.
    fn application(&self) -> Option<&ApplicationHandle> {
        None
    }
}

/// A simulated host.
#[derive(Debug)]
pub struct Host {
    id: String,
    node: Option<NodeId>,
    dce_manager_installed: bool,
    components: Vec<Box<dyn Component>>,
}

impl Host {
    pub fn new(id: impl Into<String>, node: Option<NodeId>) -> Self {
        Self {
            id: id.into(),
            node,
            dce_manager_installed: false,
            components: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Install DCE runtime support on this host's node once.
    ///
    /// Does nothing for a host without a node; binding reports that case.
    pub fn ensure_dce_manager(&mut self, runtime: &mut dyn DceRuntime) -> Result<(), RuntimeError> {
        let Some(node) = self.node else {
            return Ok(());
        };
        if !self.dce_manager_installed {
            runtime.install_manager(node)?;
            self.dce_manager_installed = true;
            debug!("Host '{}': DCE manager installed on {}", self.id, node);
        }
        Ok(())
    }

    pub fn has_dce_manager(&self) -> bool {
        self.dce_manager_installed
    }

    /// Take ownership of a component.
    pub fn add_component(&mut self, component: Box<dyn Component>) {
        debug!(
            "Host '{}': registered {} '{}'",
            self.id,
            component.kind(),
            component.id()
        );
        self.components.push(component);
    }

    pub fn components(&self) -> &[Box<dyn Component>] {
        &self.components
    }

    pub fn component(&self, id: &str) -> Option<&dyn Component> {
        self.components
            .iter()
            .find(|c| c.id() == id)
            .map(|c| c.as_ref())
    }
}
