//! # Netpush - CSV-driven network device configuration
//!
//! This library turns spreadsheet rows into device configuration and pushes
//! it to Cisco IOS switches and routers over SSH, or to Shelly smart plugs
//! over their local HTTP API.
//!
//! ## Overview
//!
//! Each job reads a CSV sheet (VLANs and ports for a switch, interfaces and
//! gateways for a router), builds one ordered command plan, and hands that
//! plan to a sink. A local run writes the plan to a text file; a remote run
//! sends the very same commands over an interactive SSH session.
//!
//! ## Architecture
//!
//! - `config`: typed job file sections and secret resolution
//! - `config_loader`: job file loading and CSV header checks
//! - `rows`: CSV row types and reading
//! - `vlan`: VLAN id and range parsing
//! - `commands`: command plan builders (layer-2, layer-3, router)
//! - `sink`: plan consumers (text file, SSH session, in-memory recorder)
//! - `plug`: Shelly plug request plan and HTTP client
//! - `orchestrator`: end-to-end runs for each job type
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use netpush::{config_loader, orchestrator};
//! use netpush::orchestrator::OutputMode;
//! use std::path::Path;
//!
//! let config = config_loader::load_config(Path::new("netpush.yaml"))?;
//! let plan = orchestrator::plan_switch(&config, None)?;
//! let report = orchestrator::deliver(
//!     &plan,
//!     &config,
//!     OutputMode::Local,
//!     Path::new("switch_config.txt"),
//!     false,
//! )?;
//! assert!(report.is_clean());
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Library modules return typed `thiserror` errors (`RowError`,
//! `SessionError`, `PlugError`, `ValidationError`). The orchestrator and the
//! binary wrap them with `color_eyre` context. Failing to connect ends a run;
//! a device rejecting a block is recorded in the run report and the run
//! continues.

pub mod commands;
pub mod config;
pub mod config_loader;
pub mod orchestrator;
pub mod plug;
pub mod rows;
pub mod sink;
pub mod vlan;
