//! Job orchestrator.
//!
//! Coordinates a run from job file to device: read and check the CSV sheet,
//! build the command plan once, then hand it to the sink chosen by the output
//! mode. Connection failures are fatal; device rejections are collected in
//! the returned report.

use crate::commands::{build_router_plan, build_switch_plan, CommandPlan, SwitchKind};
use crate::config::Config;
use crate::config_loader::{check_csv_headers, ROUTER_COLUMNS, SWITCH_COLUMNS};
use crate::plug::{apply_requests, build_requests, PlugReport, ShellyClient};
use crate::rows::{read_rows, ConfigRow, RouterRow};
use crate::sink::{apply_plan, CommandSink, RunReport, SshSession, TextSink};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::path::{Path, PathBuf};

/// Default local artifact for switch jobs
pub const DEFAULT_SWITCH_OUTPUT: &str = "switch_config.txt";
/// Default local artifact for router jobs
pub const DEFAULT_ROUTER_OUTPUT: &str = "router_config.txt";

/// Where a command plan goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputMode {
    /// Write a configuration text file
    Local,
    /// Send the commands over SSH to the device
    Remote,
}

/// Read the switch sheet and build its plan
pub fn plan_switch(config: &Config, kind_override: Option<SwitchKind>) -> Result<CommandPlan> {
    let switch = config.switch()?;
    let csv_path = config.csv_path()?;
    let delimiter = config.csv.delimiter_byte()?;

    let mut options = switch.options();
    if let Some(kind) = kind_override {
        options.kind = kind;
    }

    info!("Reading CSV file: {:?}", csv_path);
    check_csv_headers(csv_path, delimiter, SWITCH_COLUMNS, &["IP Address", "Address", "Netmask", "Switch"])?;
    let rows: Vec<ConfigRow> = read_rows(csv_path, delimiter)?;
    info!("Read {} rows for a {:?} switch", rows.len(), options.kind);

    let vtp = switch.vtp_settings()?;
    let plan = build_switch_plan(&rows, &options, vtp.as_ref())?;
    Ok(plan)
}

/// Read the router sheet and build its plan
pub fn plan_router(config: &Config) -> Result<CommandPlan> {
    let csv_path = config.csv_path()?;
    let delimiter = config.csv.delimiter_byte()?;

    info!("Reading CSV file: {:?}", csv_path);
    check_csv_headers(csv_path, delimiter, ROUTER_COLUMNS, &["description", "vlan"])?;
    let rows: Vec<RouterRow> = read_rows(csv_path, delimiter)?;
    info!("Read {} router rows", rows.len());

    let plan = build_router_plan(&rows, config.router().save)?;
    Ok(plan)
}

/// Resolve the local artifact path: CLI flag, then job file, then default
pub fn output_path(config: &Config, cli_output: Option<&Path>, default: &str) -> PathBuf {
    cli_output
        .map(Path::to_path_buf)
        .or_else(|| config.output.as_ref().map(|output| output.path.clone()))
        .unwrap_or_else(|| PathBuf::from(default))
}

/// Send a plan to its sink
///
/// With `dry_run`, both modes print the plan to stdout instead.
pub fn deliver(
    plan: &CommandPlan,
    config: &Config,
    mode: OutputMode,
    output: &Path,
    dry_run: bool,
) -> Result<RunReport> {
    if dry_run {
        info!("Dry run: printing {} commands", plan.command_count());
        return run_sink(&mut TextSink::stdout(), plan);
    }

    match mode {
        OutputMode::Local => {
            let mut sink = TextSink::create(output)
                .wrap_err_with(|| format!("Failed to create output file '{}'", output.display()))?;
            let report = run_sink(&mut sink, plan)?;
            info!("Configuration written to {:?}", output);
            Ok(report)
        }
        OutputMode::Remote => {
            let target = config.device()?.target()?;
            let mut session = SshSession::connect(&target)
                .wrap_err_with(|| format!("Failed to connect to {}:{}", target.host, target.port))?;
            let report = run_sink(&mut session, plan)?;
            info!("Configuration complete");
            Ok(report)
        }
    }
}

fn run_sink<S: CommandSink>(sink: &mut S, plan: &CommandPlan) -> Result<RunReport> {
    let report = apply_plan(sink, plan).wrap_err("Failed while sending commands")?;
    Ok(report)
}

/// Configure a Shelly plug from the `plug` section
pub fn run_plug(config: &Config, name_override: Option<&str>, cloud: bool, dry_run: bool) -> Result<PlugReport> {
    let plug = config.plug()?;
    let settings = plug.settings(name_override, cloud)?;
    let requests = build_requests(&settings);

    if dry_run {
        for request in &requests {
            println!("POST {}{} {}", plug.base_url, request.path, request.payload);
        }
        return Ok(PlugReport::default());
    }

    let mut client = ShellyClient::new(&plug.base_url, plug.timeout)?;
    client
        .identify()
        .wrap_err_with(|| format!("Plug at {} is not reachable", plug.base_url))?;

    info!("Configuring plug '{}' with {} requests", settings.name, requests.len());
    Ok(apply_requests(&mut client, &requests))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CsvConfig, OutputConfig, SwitchConfig};
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn switch_config(csv_path: &Path) -> Config {
        Config {
            csv: CsvConfig {
                path: Some(csv_path.to_path_buf()),
                delimiter: ";".to_string(),
            },
            switch: Some(SwitchConfig {
                kind: SwitchKind::Layer3,
                interface_prefix: "FastEthernet 0/".to_string(),
                save: false,
                vtp: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_output_path_precedence() {
        let mut config = Config::default();
        assert_eq!(output_path(&config, None, DEFAULT_SWITCH_OUTPUT), PathBuf::from("switch_config.txt"));

        config.output = Some(OutputConfig {
            path: PathBuf::from("from_job.txt"),
        });
        assert_eq!(output_path(&config, None, DEFAULT_SWITCH_OUTPUT), PathBuf::from("from_job.txt"));
        assert_eq!(
            output_path(&config, Some(Path::new("cli.txt")), DEFAULT_SWITCH_OUTPUT),
            PathBuf::from("cli.txt")
        );
    }

    #[test]
    fn test_plan_switch_and_deliver_locally() {
        let mut csv = NamedTempFile::new().unwrap();
        writeln!(csv, "Vlan;Description;Ports;IP Address;Netmask;Switch").unwrap();
        writeln!(csv, "10;Staff;1-4;;;1").unwrap();

        let config = switch_config(csv.path());
        let plan = plan_switch(&config, None).unwrap();
        assert!(plan.commands().contains(&"switchport access vlan 10"));

        let dir = tempdir().unwrap();
        let out = dir.path().join("switch.txt");
        let report = deliver(&plan, &config, OutputMode::Local, &out, false).unwrap();
        assert!(report.is_clean());
        assert!(std::fs::read_to_string(&out).unwrap().contains("switchport access vlan 10"));
    }

    #[test]
    fn test_kind_override() {
        let mut csv = NamedTempFile::new().unwrap();
        writeln!(csv, "Vlan;Description;Ports").unwrap();
        writeln!(csv, "10-11;Staff;1-4").unwrap();

        let config = switch_config(csv.path());
        assert!(plan_switch(&config, None).is_ok());
        // Layer-2 sheets cannot name ranges
        assert!(plan_switch(&config, Some(SwitchKind::Layer2)).is_err());
    }

    #[test]
    fn test_remote_without_device_section_fails() {
        let config = Config::default();
        let plan = CommandPlan::new();
        let result = deliver(&plan, &config, OutputMode::Remote, Path::new("unused.txt"), false);
        assert!(result.is_err());
    }

    #[test]
    fn test_plan_router_requires_csv_path() {
        assert!(plan_router(&Config::default()).is_err());
    }
}
