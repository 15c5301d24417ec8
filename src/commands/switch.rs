//! Switch plan assembly shared by the layer-2 and layer-3 builders.

use super::{finish_block, layer2, layer3, CommandBlock, CommandPlan, CONFIGURE};
use crate::rows::{ConfigRow, RowError};
use log::info;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Default interface type and module prefix for `interface range`
pub const DEFAULT_INTERFACE_PREFIX: &str = "FastEthernet 0/";

/// Which builder a switch job uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SwitchKind {
    /// Access ports or a routed VLAN interface per row
    Layer2,
    /// Routed VLAN interfaces, trunks and access ports
    Layer3,
}

/// Options that shape the generated switch commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchOptions {
    pub kind: SwitchKind,
    pub interface_prefix: String,
    /// Append `wr mem` after the final `end`
    pub save: bool,
}

impl Default for SwitchOptions {
    fn default() -> Self {
        Self {
            kind: SwitchKind::Layer3,
            interface_prefix: DEFAULT_INTERFACE_PREFIX.to_string(),
            save: true,
        }
    }
}

impl SwitchOptions {
    /// `interface range` line for a port expression
    pub fn interface_range(&self, ports: &str) -> String {
        format!("interface range {}{}", self.interface_prefix, ports)
    }
}

/// Resolved VTP bootstrap settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VtpSettings {
    pub mode: String,
    pub domain: String,
    /// Resolved secret, never read from the job file directly
    pub password: Option<String>,
}

impl VtpSettings {
    /// Commands issued once per session before any row
    pub fn commands(&self) -> Vec<String> {
        let mut lines = vec![
            format!("vtp mode {}", self.mode),
            format!("vtp domain {}", self.domain),
        ];
        if let Some(password) = &self.password {
            lines.push(format!("vtp password {}", password));
        }
        lines
    }
}

/// Build the complete plan for a switch job
///
/// The plan enters configuration mode, bootstraps VTP (when configured),
/// adds one or more blocks per row in file order and closes with `end`
/// (plus `wr mem` when saving). The first invalid row aborts the build.
pub fn build_switch_plan(
    rows: &[ConfigRow],
    options: &SwitchOptions,
    vtp: Option<&VtpSettings>,
) -> Result<CommandPlan, RowError> {
    let mut plan = CommandPlan::new();

    let mut bootstrap = CommandBlock::new("bootstrap").line(CONFIGURE);
    if let Some(vtp) = vtp {
        info!("Configuring VTP mode '{}' and domain '{}'", vtp.mode, vtp.domain);
        bootstrap.lines.extend(vtp.commands());
    }
    plan.push(bootstrap);

    for row in rows {
        info!("Processing row {}: VLAN {} - {}", row.number, row.vlan, row.description);
        let blocks = match options.kind {
            SwitchKind::Layer2 => layer2::build_row(row, options)?,
            SwitchKind::Layer3 => layer3::build_row(row, options)?,
        };
        plan.extend(blocks);
    }

    plan.push(finish_block(options.save));
    Ok(plan)
}

/// Check an address or mask field and return it unchanged
pub(crate) fn ipv4_field<'a>(row: usize, field: &'static str, value: &'a str) -> Result<&'a str, RowError> {
    value
        .parse::<Ipv4Addr>()
        .map(|_| value)
        .map_err(|_| RowError::InvalidAddress {
            row,
            field,
            value: value.to_string(),
        })
}

/// Address and mask of a row, or `None` for a row without addressing.
/// An address without a mask (or the reverse) is rejected.
pub(crate) fn row_addressing(row: &ConfigRow) -> Result<Option<(&str, &str)>, RowError> {
    match (row.ip_address.is_empty(), row.netmask.is_empty()) {
        (true, true) => Ok(None),
        (false, false) => {
            let address = ipv4_field(row.number, "address", &row.ip_address)?;
            let mask = ipv4_field(row.number, "netmask", &row.netmask)?;
            Ok(Some((address, mask)))
        }
        (false, true) => Err(RowError::MissingField {
            row: row.number,
            field: "Netmask",
        }),
        (true, false) => Err(RowError::MissingField {
            row: row.number,
            field: "IP Address",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(vlan: &str, description: &str, ports: &str) -> ConfigRow {
        ConfigRow {
            number: 1,
            vlan: vlan.to_string(),
            description: description.to_string(),
            ports: ports.to_string(),
            ..Default::default()
        }
    }

    fn vtp() -> VtpSettings {
        VtpSettings {
            mode: "transparent".to_string(),
            domain: "campus".to_string(),
            password: Some("vtpsecret".to_string()),
        }
    }

    #[test]
    fn test_plan_order_bootstrap_rows_end() {
        let rows = vec![row("10", "Staff", "1-4")];
        let plan = build_switch_plan(&rows, &SwitchOptions::default(), Some(&vtp())).unwrap();
        let commands = plan.commands();

        assert_eq!(
            &commands[..4],
            &["conf t", "vtp mode transparent", "vtp domain campus", "vtp password vtpsecret"]
        );
        assert_eq!(&commands[commands.len() - 2..], &["end", "wr mem"]);
    }

    #[test]
    fn test_vtp_password_is_optional() {
        let settings = VtpSettings {
            password: None,
            ..vtp()
        };
        assert_eq!(settings.commands().len(), 2);
    }

    #[test]
    fn test_plan_without_vtp_or_save() {
        let options = SwitchOptions {
            save: false,
            ..SwitchOptions::default()
        };
        let plan = build_switch_plan(&[], &options, None).unwrap();
        assert_eq!(plan.commands(), vec!["conf t", "end"]);
    }

    #[test]
    fn test_plan_stops_at_invalid_row() {
        let mut broken = row("abc", "Broken", "5");
        broken.number = 2;
        let rows = vec![row("10", "Staff", "1-4"), broken];
        let err = build_switch_plan(&rows, &SwitchOptions::default(), None).unwrap_err();
        assert!(matches!(err, RowError::InvalidVlan { row: 2, .. }));
    }

    #[test]
    fn test_address_without_mask_is_rejected() {
        let mut r = row("10", "Mgmt", "1");
        r.ip_address = "10.0.0.1".to_string();
        assert!(matches!(
            row_addressing(&r),
            Err(RowError::MissingField { field: "Netmask", .. })
        ));
        r.netmask = "255.255.255.300".to_string();
        assert!(matches!(
            row_addressing(&r),
            Err(RowError::InvalidAddress { field: "netmask", .. })
        ));
    }

    #[test]
    fn test_interface_prefix_is_configurable() {
        let options = SwitchOptions {
            interface_prefix: "GigabitEthernet 1/0/".to_string(),
            ..SwitchOptions::default()
        };
        assert_eq!(options.interface_range("1-24"), "interface range GigabitEthernet 1/0/1-24");
    }
}
