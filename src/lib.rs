//! # dcelaunch - External binaries as simulated network applications
//!
//! This library describes external compiled binaries that run as
//! applications inside simulated hosts of a discrete-event network
//! simulator using Direct Code Execution (DCE).
//!
//! ## Overview
//!
//! Each application is declared as a block of string fields. A block is
//! validated and turned into a launch descriptor (binary, stack size,
//! arguments, environment, stdin redirection), then bound to a host: DCE
//! support is installed on the host's node, the descriptor is installed,
//! and optional start/stop times are applied.
//!
//! The simulator is reached only through the [`runtime::DceRuntime`] trait.
//! The bundled [`runtime::PlanRuntime`] records every call into a launch
//! plan that can be written as YAML or JSON.
//!
//! ## Architecture
//!
//! - `config`: application configuration records and validation errors
//! - `config_loader`: configuration file loading and the block collector
//! - `dce`: launch descriptor and the DCE application component
//! - `host`: simulated hosts and the component trait
//! - `runtime`: the simulator port and the recording plan runtime
//! - `orchestrator`: config to launch plan
//! - `utils`: simulation time parsing and binary lookup
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use dcelaunch::config_loader::ConfigParser;
//! use dcelaunch::orchestrator::{generate_launch_plan, write_plan, PlanOptions};
//! use std::path::Path;
//!
//! let mut parser = ConfigParser::new();
//! parser.parse_file(Path::new("apps.yaml"))?;
//!
//! let (_hosts, plan) = generate_launch_plan(&parser, &PlanOptions::default())?;
//! write_plan(&plan, Path::new("dce_plan.yaml"))?;
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Application Fields
//!
//! | Field         | Required | Meaning                                   |
//! |---------------|----------|-------------------------------------------|
//! | `Id`          | yes      | `<group>/<host>/<application>`            |
//! | `Binary`      | yes      | binary name or path                       |
//! | `StackSize`   | no       | bytes, default 1 MiB                      |
//! | `Arguments`   | no       | whitespace-separated arguments            |
//! | `Environment` | no       | `KEY1=VALUE1,KEY2=VALUE2,...`             |
//! | `StdinFile`   | no       | file redirected to standard input         |
//! | `StartTime`   | no       | simulation time, e.g. `1s`, `500ms`       |
//! | `StopTime`    | no       | simulation time                           |
//!
//! ## Error Handling
//!
//! Library operations return typed errors (`thiserror`). The orchestrator
//! and the binary wrap them with `color_eyre` context.

pub mod config;
pub mod config_loader;
pub mod dce;
pub mod host;
pub mod orchestrator;
pub mod runtime;
pub mod utils;
