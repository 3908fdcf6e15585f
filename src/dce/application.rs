//! DCE application component.
//!
//! Turns one [`ApplicationConfig`] into a [`LaunchDescriptor`] at
//! construction and installs it on a host's node when bound.

use super::descriptor::{parse_environment, LaunchDescriptor};
use super::LaunchError;
use crate::config::{convert_arg_to_uinteger, ApplicationConfig, ValidationError};
use crate::host::{Component, Host};
use crate::runtime::{ApplicationHandle, DceRuntime};
use crate::utils::SimTime;
use log::{debug, info};

/// Number of segments in a DCE application path: `<group>/<host>/<app>`.
pub const DCE_PATH_LENGTH: usize = 3;

/// An external binary run as a simulated application.
#[derive(Debug)]
pub struct DceApplication {
    id: String,
    id_path: Vec<String>,
    descriptor: LaunchDescriptor,
    start_time: Option<String>,
    stop_time: Option<String>,
    application: Option<ApplicationHandle>,
    host: Option<String>,
}

impl DceApplication {
    /// Validate `config` and build the launch descriptor.
    pub fn new(config: &ApplicationConfig) -> Result<Self, ValidationError> {
        let id = config.id().to_string();
        if id.is_empty() {
            return Err(ValidationError::EmptyId);
        }
        let id_path = config.id_path().to_vec();
        if id_path.len() != DCE_PATH_LENGTH {
            return Err(ValidationError::InvalidPathLength {
                id,
                len: id_path.len(),
                expected: DCE_PATH_LENGTH,
            });
        }

        let start_time = config.find_value("StartTime").map(str::to_string);
        let stop_time = config.find_value("StopTime").map(str::to_string);

        let binary = config
            .find_value("Binary")
            .ok_or_else(|| ValidationError::MissingField {
                id: id.clone(),
                field: "Binary",
            })?;
        let mut descriptor = LaunchDescriptor::new(binary);

        if let Some(stack_size) = config.find_value("StackSize") {
            descriptor.set_stack_size(convert_arg_to_uinteger("StackSize", stack_size)?);
        }

        descriptor.reset_arguments();
        descriptor.reset_environment();
        if let Some(arguments) = config.find_value("Arguments") {
            descriptor.parse_arguments(arguments);
        }
        if let Some(environment) = config.find_value("Environment") {
            for (key, value) in parse_environment(environment)? {
                descriptor.add_environment(key, value);
            }
        }

        if let Some(stdin_file) = config.find_value("StdinFile") {
            descriptor.set_stdin_file(stdin_file);
        }

        debug!(
            "DCE application '{}': binary={} stack={} args={:?}",
            id,
            descriptor.binary(),
            descriptor.stack_size(),
            descriptor.arguments()
        );

        Ok(Self {
            id,
            id_path,
            descriptor,
            start_time,
            stop_time,
            application: None,
            host: None,
        })
    }

    /// Factory used when building components from collected configs.
    pub fn create(config: &ApplicationConfig) -> Result<Self, ValidationError> {
        Self::new(config)
    }

    pub fn descriptor(&self) -> &LaunchDescriptor {
        &self.descriptor
    }

    pub fn start_time(&self) -> Option<&str> {
        self.start_time.as_deref()
    }

    pub fn stop_time(&self) -> Option<&str> {
        self.stop_time.as_deref()
    }

    /// Id of the host this application was bound to.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Id of the host this application belongs on, from its path.
    pub fn host_id(&self) -> String {
        self.id_path[..DCE_PATH_LENGTH - 1].join("/")
    }

    /// Install on `host`'s node and hand the component over to the host.
    ///
    /// Consumes the component; an application is bound at most once.
    pub fn add_to_host(
        mut self,
        host: &mut Host,
        runtime: &mut dyn DceRuntime,
    ) -> Result<ApplicationHandle, LaunchError> {
        let node = host.node().ok_or_else(|| LaunchError::NoNode {
            id: self.id.clone(),
            host: host.id().to_string(),
        })?;

        let start = self.start_time.as_deref().map(|t| parse_time(&self.id, t)).transpose()?;
        let stop = self.stop_time.as_deref().map(|t| parse_time(&self.id, t)).transpose()?;
        if let (Some(start), Some(stop)) = (start, stop) {
            if stop < start {
                return Err(LaunchError::StopBeforeStart { id: self.id.clone(), start, stop });
            }
        }

        host.ensure_dce_manager(runtime)?;

        let application = runtime
            .install_in_node(node, &self.descriptor)?
            .into_iter()
            .next()
            .ok_or_else(|| LaunchError::NothingInstalled { id: self.id.clone() })?;

        if let Some(start) = start {
            runtime.set_start_time(&application, start)?;
        }
        if let Some(stop) = stop {
            runtime.set_stop_time(&application, stop)?;
        }

        info!(
            "Installed DCE application '{}' ({}) on host '{}' {}",
            self.id,
            self.descriptor.binary(),
            host.id(),
            node
        );

        self.application = Some(application.clone());
        self.host = Some(host.id().to_string());
        host.add_component(Box::new(self));
        Ok(application)
    }
}

fn parse_time(id: &str, value: &str) -> Result<SimTime, LaunchError> {
    SimTime::parse(value).map_err(|source| LaunchError::InvalidTime {
        id: id.to_string(),
        source,
    })
}

impl Component for DceApplication {
    fn id(&self) -> &str {
        &self.id
    }

    fn id_path(&self) -> &[String] {
        &self.id_path
    }

    fn kind(&self) -> &'static str {
        "dce-application"
    }

    fn application(&self) -> Option<&ApplicationHandle> {
        self.application.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dce::descriptor::DEFAULT_STACK_SIZE;
    use crate::runtime::{NodeId, PlanRuntime, RuntimeError};

    fn config(fields: &[(&str, &str)]) -> ApplicationConfig {
        ApplicationConfig::from_fields(
            fields.iter().map(|(k, v)| (k.to_string(), Some(v.to_string()))),
        )
    }

    fn minimal() -> ApplicationConfig {
        config(&[("Id", "left/host0/app"), ("Binary", "udp-echo")])
    }

    /// Runtime that installs nothing.
    struct EmptyRuntime;

    impl DceRuntime for EmptyRuntime {
        fn install_manager(&mut self, _node: NodeId) -> Result<(), RuntimeError> {
            Ok(())
        }

        fn install_in_node(
            &mut self,
            _node: NodeId,
            _descriptor: &LaunchDescriptor,
        ) -> Result<Vec<ApplicationHandle>, RuntimeError> {
            Ok(Vec::new())
        }

        fn set_start_time(&mut self, _app: &ApplicationHandle, _at: SimTime) -> Result<(), RuntimeError> {
            Ok(())
        }

        fn set_stop_time(&mut self, _app: &ApplicationHandle, _at: SimTime) -> Result<(), RuntimeError> {
            Ok(())
        }
    }

    #[test]
    fn test_missing_binary() {
        let err = DceApplication::new(&config(&[("Id", "left/host0/app")])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField { id: "left/host0/app".to_string(), field: "Binary" }
        );
    }

    #[test]
    fn test_empty_id() {
        let err = DceApplication::new(&config(&[("Binary", "udp-echo")])).unwrap_err();
        assert_eq!(err, ValidationError::EmptyId);

        let err = DceApplication::new(&config(&[("Id", ""), ("Binary", "udp-echo")])).unwrap_err();
        assert_eq!(err, ValidationError::EmptyId);
    }

    #[test]
    fn test_path_length_must_be_three() {
        for id in ["app", "host0/app", "a/b/c/d"] {
            let err = DceApplication::new(&config(&[("Id", id), ("Binary", "x")])).unwrap_err();
            assert!(matches!(err, ValidationError::InvalidPathLength { expected: 3, .. }), "{}", id);
        }
    }

    #[test]
    fn test_stack_size() {
        let app = DceApplication::new(&minimal()).unwrap();
        assert_eq!(app.descriptor().stack_size(), DEFAULT_STACK_SIZE);

        let app = DceApplication::new(&config(&[
            ("Id", "left/host0/app"),
            ("Binary", "udp-echo"),
            ("StackSize", "2097152"),
        ]))
        .unwrap();
        assert_eq!(app.descriptor().stack_size(), 2_097_152);

        let err = DceApplication::new(&config(&[
            ("Id", "left/host0/app"),
            ("Binary", "udp-echo"),
            ("StackSize", "big"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
    }

    #[test]
    fn test_descriptor_fields() {
        let app = DceApplication::new(&config(&[
            ("Id", "left/host0/app"),
            ("Binary", "udp-echo"),
            ("Arguments", "--port 7 --verbose"),
            ("Environment", "A=1,B=2,A=3"),
            ("StdinFile", "/input.txt"),
            ("StartTime", "1s"),
        ]))
        .unwrap();

        let d = app.descriptor();
        assert_eq!(d.binary(), "udp-echo");
        assert_eq!(d.arguments(), &["--port", "7", "--verbose"]);
        assert_eq!(d.env("A"), Some("3"));
        assert_eq!(d.env("B"), Some("2"));
        assert_eq!(d.stdin_file(), Some("/input.txt"));
        assert_eq!(app.start_time(), Some("1s"));
        assert_eq!(app.stop_time(), None);
        assert_eq!(app.host_id(), "left/host0");
        assert!(app.application().is_none());
    }

    #[test]
    fn test_malformed_environment() {
        let err = DceApplication::new(&config(&[
            ("Id", "left/host0/app"),
            ("Binary", "udp-echo"),
            ("Environment", "A=1,B=2,C"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidEnvironment { .. }));
    }

    #[test]
    fn test_add_to_host_without_node() {
        let mut rt = PlanRuntime::new();
        let mut host = Host::new("left/host0", None);
        let app = DceApplication::new(&minimal()).unwrap();

        let err = app.add_to_host(&mut host, &mut rt).unwrap_err();
        assert!(matches!(err, LaunchError::NoNode { .. }));
        assert!(host.components().is_empty());
        assert_eq!(rt.plan().application_count(), 0);
    }

    #[test]
    fn test_add_to_host_applies_present_times_only() {
        let mut rt = PlanRuntime::new();
        let node = rt.add_node();
        let mut host = Host::new("left/host0", Some(node));

        let app = DceApplication::new(&config(&[
            ("Id", "left/host0/app"),
            ("Binary", "udp-echo"),
            ("StopTime", "10s"),
        ]))
        .unwrap();
        let handle = app.add_to_host(&mut host, &mut rt).unwrap();

        let planned = rt.application(&handle).unwrap();
        assert_eq!(planned.start_time, None);
        assert_eq!(planned.stop_time, Some(SimTime::from_secs(10)));

        let registered = host.component("left/host0/app").unwrap();
        assert_eq!(registered.application(), Some(&handle));
        assert_eq!(registered.kind(), "dce-application");
    }

    #[test]
    fn test_add_to_host_invalid_time() {
        let mut rt = PlanRuntime::new();
        let node = rt.add_node();
        let mut host = Host::new("left/host0", Some(node));
        let app = DceApplication::new(&config(&[
            ("Id", "left/host0/app"),
            ("Binary", "udp-echo"),
            ("StartTime", "later"),
        ]))
        .unwrap();

        let err = app.add_to_host(&mut host, &mut rt).unwrap_err();
        assert!(matches!(err, LaunchError::InvalidTime { .. }));
        assert_eq!(rt.plan().application_count(), 0);
        assert_eq!(rt.manager_installs(), 0);
        assert!(host.components().is_empty());
    }

    #[test]
    fn test_add_to_host_stop_before_start() {
        let mut rt = PlanRuntime::new();
        let node = rt.add_node();
        let mut host = Host::new("left/host0", Some(node));
        let app = DceApplication::new(&config(&[
            ("Id", "left/host0/app"),
            ("Binary", "udp-echo"),
            ("StartTime", "5s"),
            ("StopTime", "1s"),
        ]))
        .unwrap();

        let err = app.add_to_host(&mut host, &mut rt).unwrap_err();
        assert!(matches!(err, LaunchError::StopBeforeStart { .. }));
        assert_eq!(rt.plan().application_count(), 0);
        assert!(host.components().is_empty());
    }

    #[test]
    fn test_add_to_host_nothing_installed() {
        let mut host = Host::new("left/host0", Some(NodeId(0)));
        let app = DceApplication::new(&minimal()).unwrap();
        let err = app.add_to_host(&mut host, &mut EmptyRuntime).unwrap_err();
        assert!(matches!(err, LaunchError::NothingInstalled { .. }));
    }
}
