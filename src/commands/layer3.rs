//! Layer-3 switch rows.
//!
//! Three cases, checked in order:
//!
//! 1. address and mask present: routed VLAN interface for the first VLAN of
//!    the row, followed by a separate access-port block for the same VLAN
//! 2. description mentions `trunk` or `uplink` (any case): trunk ports,
//!    restricted to the row's VLANs when it names more than one, and
//!    unrestricted when the VLAN column is blank
//! 3. otherwise: access ports on the first VLAN of the row

use super::switch::{row_addressing, SwitchOptions};
use super::CommandBlock;
use crate::rows::{required, ConfigRow, RowError};
use crate::vlan::VlanRange;
use log::warn;

/// Keywords that turn a row without addressing into a trunk row
const TRUNK_KEYWORDS: [&str; 2] = ["trunk", "uplink"];

/// True when the description asks for trunk ports
pub fn is_trunk_description(description: &str) -> bool {
    let lowered = description.to_lowercase();
    TRUNK_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

/// Build the command blocks for one layer-3 row
pub fn build_row(row: &ConfigRow, options: &SwitchOptions) -> Result<Vec<CommandBlock>, RowError> {
    let description = required(row.number, "Description", &row.description)?;
    let ports = required(row.number, "Ports", &row.ports)?;
    let addressing = row_addressing(row)?;

    // A trunk row may leave the VLAN column blank to carry every VLAN
    if addressing.is_none() && is_trunk_description(description) && row.vlan.is_empty() {
        return Ok(vec![trunk_block(ports, None, options)]);
    }

    let range = parse_row_vlan(row)?;
    let first = range.first();

    if let Some((address, mask)) = addressing {
        let interface = CommandBlock::new(format!("interface vlan{}", first))
            .line(format!("vlan {}", first))
            .line(format!("name {}", description))
            .line(format!("interface vlan{}", first))
            .line(format!("description {}", description))
            .line(format!("ip address {} {}", address, mask))
            .line("no shut");
        return Ok(vec![interface, access_block(first, ports, options)]);
    }

    if is_trunk_description(description) {
        return Ok(vec![trunk_block(ports, Some(&range), options)]);
    }

    if range.is_multiple() {
        warn!(
            "Row {}: access ports only use VLAN {} of range {}",
            row.number, first, range
        );
    }
    let mut access = CommandBlock::new(format!("vlan {}", first))
        .line(format!("vlan {}", first))
        .line(format!("name {}", description));
    access.lines.extend(access_block(first, ports, options).lines);
    Ok(vec![access])
}

fn parse_row_vlan(row: &ConfigRow) -> Result<VlanRange, RowError> {
    let vlan = required(row.number, "Vlan", &row.vlan)?;
    VlanRange::parse(vlan).map_err(|source| RowError::InvalidVlan {
        row: row.number,
        source,
    })
}

/// Trunk ports, restricted to `range` when it names more than one VLAN
fn trunk_block(ports: &str, range: Option<&VlanRange>, options: &SwitchOptions) -> CommandBlock {
    let mut trunk = CommandBlock::new(format!("trunk {}", ports))
        .line(options.interface_range(ports))
        .line("switchport mode trunk");
    if let Some(range) = range.filter(|range| range.is_multiple()) {
        trunk.push(format!("switchport trunk allowed vlan {}", range.joined()));
    }
    trunk.push("no shut");
    trunk
}

fn access_block(vlan_id: &str, ports: &str, options: &SwitchOptions) -> CommandBlock {
    CommandBlock::new(format!("access {}", ports))
        .line(options.interface_range(ports))
        .line("switchport mode access")
        .line(format!("switchport access vlan {}", vlan_id))
        .line("no shut")
}
