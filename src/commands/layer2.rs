//! Layer-2 switch rows.
//!
//! A row either assigns its ports to the VLAN as access ports, or, when an
//! address and mask are present, creates a routed VLAN interface instead.
//! Exactly one of the two blocks is produced per row.

use super::switch::{row_addressing, SwitchOptions};
use super::CommandBlock;
use crate::rows::{required, ConfigRow, RowError};
use crate::vlan::VlanRange;

/// Build the command block for one layer-2 row
pub fn build_row(row: &ConfigRow, options: &SwitchOptions) -> Result<Vec<CommandBlock>, RowError> {
    let vlan = required(row.number, "Vlan", &row.vlan)?;
    let description = required(row.number, "Description", &row.description)?;

    // Layer-2 sheets name a single VLAN per row
    let range = VlanRange::parse(vlan).map_err(|source| RowError::InvalidVlan {
        row: row.number,
        source,
    })?;
    if range.is_multiple() {
        return Err(RowError::Invalid {
            row: row.number,
            message: format!("VLAN range '{}' is not supported on a layer-2 switch", vlan),
        });
    }
    let vlan_id = range.first();

    let label = format!("vlan {}", vlan_id);
    let block = match row_addressing(row)? {
        Some((address, mask)) => CommandBlock::new(label)
            .line(format!("vlan {}", vlan_id))
            .line(format!("name {}", description))
            .line(format!("interface vlan{}", vlan_id))
            .line(format!("desc {}", description))
            .line(format!("ip address {} {}", address, mask))
            .line("no shut"),
        None => {
            let ports = required(row.number, "Ports", &row.ports)?;
            CommandBlock::new(label)
                .line(format!("vlan {}", vlan_id))
                .line(format!("name {}", description))
                .line(options.interface_range(ports))
                .line("switchport mode access")
                .line(format!("switchport access vlan {}", vlan_id))
                .line("no shut")
        }
    };

    Ok(vec![block])
}
