//! Launch plan orchestration.
//!
//! Drives the flow from collected configuration to a written plan:
//! hosts and nodes are created first, then every application block is
//! turned into a [`DceApplication`] and bound to its host.

use crate::config_loader::ConfigParser;
use crate::dce::DceApplication;
use crate::host::Host;
use crate::runtime::{LaunchPlan, NodeId, PlanRuntime};
use crate::utils::{resolve_binary, search_path_from_env, SimTime};
use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use log::{info, warn};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Options controlling plan generation
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Check that every binary resolves to an executable file
    pub check_binaries: bool,
}

/// Create a host (and its node) for every host configuration.
pub fn build_hosts(parser: &ConfigParser, runtime: &mut PlanRuntime) -> Result<BTreeMap<String, Host>> {
    let mut hosts = BTreeMap::new();

    for host_config in parser.host_configs() {
        if hosts.contains_key(&host_config.id) {
            bail!("Duplicate host '{}'", host_config.id);
        }
        let node = if host_config.detached {
            None
        } else {
            let node = match host_config.node {
                Some(n) => runtime.add_node_with_id(NodeId(n))?,
                None => runtime.add_node(),
            };
            runtime.set_node_host(node, &host_config.id)?;
            Some(node)
        };
        info!(
            "Created host '{}'{}",
            host_config.id,
            node.map(|n| format!(" on {}", n)).unwrap_or_default()
        );
        hosts.insert(host_config.id.clone(), Host::new(host_config.id.clone(), node));
    }

    Ok(hosts)
}

/// Build every configured application and bind it to its host.
///
/// A host named by an application path but absent from the configured
/// hosts is created with the next free node.
///
/// Returns the hosts, which own the bound applications, and the plan.
pub fn generate_launch_plan(
    parser: &ConfigParser,
    options: &PlanOptions,
) -> Result<(BTreeMap<String, Host>, LaunchPlan)> {
    let mut runtime = PlanRuntime::new();
    let mut hosts = build_hosts(parser, &mut runtime)?;

    let stop_limit = parser.general().stop_time.map(SimTime::from);
    runtime.set_stop_time_limit(stop_limit);

    let search_dirs = binary_search_dirs(parser);

    for (index, config) in parser.application_configs().iter().enumerate() {
        let application = DceApplication::create(config).wrap_err_with(|| {
            format!("Invalid application block #{} ('{}')", index, config.id())
        })?;

        if options.check_binaries {
            let binary = application.descriptor().binary();
            let resolved = resolve_binary(binary, &search_dirs)
                .wrap_err_with(|| format!("Binary check failed for '{}'", config.id()))?;
            info!("Binary for '{}' resolved to {:?}", config.id(), resolved);
        }

        let host_id = application.host_id();
        let host = match hosts.entry(host_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let node = runtime.add_node();
                runtime.set_node_host(node, entry.key())?;
                info!("Created host '{}' on {} for '{}'", entry.key(), node, config.id());
                let host = Host::new(entry.key().clone(), Some(node));
                entry.insert(host)
            }
        };

        let handle = application
            .add_to_host(host, &mut runtime)
            .wrap_err_with(|| format!("Failed to install application '{}'", config.id()))?;

        let stop = runtime.application(&handle).and_then(|a| a.stop_time);
        if let (Some(limit), Some(stop)) = (stop_limit, stop) {
            if stop > limit {
                warn!(
                    "Application '{}' stops at {} after the simulation ends at {}",
                    config.id(),
                    stop,
                    limit
                );
            }
        }
    }

    let plan = runtime.into_plan();
    info!(
        "Launch plan: {} node(s), {} application(s)",
        plan.nodes.len(),
        plan.application_count()
    );
    Ok((hosts, plan))
}

/// Search directories: `general.dce_path` first, then `DCE_PATH`.
fn binary_search_dirs(parser: &ConfigParser) -> Vec<PathBuf> {
    let mut dirs = parser.general().dce_path.clone();
    dirs.extend(search_path_from_env());
    dirs
}

/// Write the plan as JSON for a `.json` path, YAML otherwise.
pub fn write_plan(plan: &LaunchPlan, path: &Path) -> Result<()> {
    let content = if path.extension().map_or(false, |ext| ext == "json") {
        serde_json::to_string_pretty(plan)?
    } else {
        serde_yaml::to_string(plan)?
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create output directory '{}'", parent.display()))?;
    }
    fs::write(path, content)
        .wrap_err_with(|| format!("Failed to write launch plan '{}'", path.display()))?;

    info!("Wrote launch plan to {:?}", path);
    Ok(())
}
