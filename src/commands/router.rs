//! Broadband router rows.
//!
//! Each row with an interface name becomes an interface block. Gateways are
//! collected across all rows: the last WAN gateway becomes the default route,
//! every LAN gateway adds a static route for the row's network. The routing
//! block is emitted once, after the last interface.

use super::switch::ipv4_field;
use super::{finish_block, CommandBlock, CommandPlan, CONFIGURE};
use crate::rows::{NetworkType, RouterRow, RowError};
use log::{debug, info, warn};
use std::net::Ipv4Addr;

pub const FILE_HEADER: [&str; 3] = ["! Cisco Router Configuration", "! Generated from CSV", ""];
pub const FILE_FOOTER: [&str; 1] = ["! End of Configuration"];

/// Accumulates interface blocks and routing state over a router sheet
#[derive(Debug, Default)]
pub struct RouterPlanner {
    interfaces: Vec<CommandBlock>,
    default_gateway: Option<String>,
    static_routes: Vec<String>,
}

impl RouterPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one row: interface commands and routing state
    pub fn add_row(&mut self, row: &RouterRow) -> Result<(), RowError> {
        info!("Processing row {}: interface '{}' ({})", row.number, row.interface, row.network);

        if let Some(block) = interface_block(row)? {
            self.interfaces.push(block);
        }

        let Some(gateway) = row.gateway() else {
            return Ok(());
        };
        let gateway = ipv4_field(row.number, "gateway", gateway)?;

        match row.network_type() {
            NetworkType::Wan => {
                if let Some(previous) = self.default_gateway.replace(gateway.to_string()) {
                    warn!(
                        "Row {}: WAN gateway {} replaces earlier gateway {}",
                        row.number, gateway, previous
                    );
                }
            }
            NetworkType::Lan => {
                let (network, mask) = lan_network(row)?;
                let route = format!("ip route {} {} {}", network, mask, gateway);
                debug!("Row {}: queued static route '{}'", row.number, route);
                self.static_routes.push(route);
            }
            NetworkType::Other(kind) => {
                debug!("Row {}: gateway ignored for network type '{}'", row.number, kind);
            }
        }
        Ok(())
    }

    pub fn default_gateway(&self) -> Option<&str> {
        self.default_gateway.as_deref()
    }

    pub fn static_routes(&self) -> &[String] {
        &self.static_routes
    }

    /// Routing commands: default route first, then static routes in row order
    pub fn routing_block(&self) -> CommandBlock {
        let mut block = CommandBlock::new("routing");
        if let Some(gateway) = &self.default_gateway {
            block.push(format!("ip route 0.0.0.0 0.0.0.0 {}", gateway));
        }
        block.lines.extend(self.static_routes.iter().cloned());
        block
    }

    /// Assemble the final plan
    pub fn finish(self, save: bool) -> CommandPlan {
        let routing = self.routing_block();
        let mut plan = CommandPlan::new()
            .with_header(&FILE_HEADER)
            .with_footer(&FILE_FOOTER);
        plan.push(CommandBlock::new("bootstrap").line(CONFIGURE));
        plan.extend(self.interfaces);
        plan.push(routing);
        plan.push(finish_block(save));
        plan
    }
}

/// Build the plan for a whole router sheet
pub fn build_router_plan(rows: &[RouterRow], save: bool) -> Result<CommandPlan, RowError> {
    let mut planner = RouterPlanner::new();
    for row in rows {
        planner.add_row(row)?;
    }
    Ok(planner.finish(save))
}

fn interface_block(row: &RouterRow) -> Result<Option<CommandBlock>, RowError> {
    if row.interface.is_empty() {
        return Ok(None);
    }

    let mut block = CommandBlock::new(format!("interface {}", row.interface))
        .line(format!("interface {}", row.interface));
    if !row.description.is_empty() {
        block.push(format!(" description {}", row.description));
    }

    if row.is_dhcp() {
        block.push(" ip address dhcp");
    } else if !row.ipaddress.is_empty() && !row.subnetmask.is_empty() {
        let address = ipv4_field(row.number, "address", &row.ipaddress)?;
        let mask = ipv4_field(row.number, "netmask", &row.subnetmask)?;
        block.push(format!(" ip address {} {}", address, mask));
    }

    if !row.vlan.is_empty() && row.vlan != "0" {
        block.push(format!(" switchport access vlan {}", row.vlan));
    }
    block.push(" no shutdown");
    Ok(Some(block))
}

/// Network address and mask of a LAN row
fn lan_network(row: &RouterRow) -> Result<(Ipv4Addr, Ipv4Addr), RowError> {
    let parse = |field: &'static str, value: &str| {
        value.parse::<Ipv4Addr>().map_err(|_| RowError::InvalidAddress {
            row: row.number,
            field,
            value: value.to_string(),
        })
    };
    let address = parse("address", &row.ipaddress)?;
    let mask = parse("netmask", &row.subnetmask)?;
    let network = Ipv4Addr::from(u32::from(address) & u32::from(mask));
    Ok((network, mask))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(network: &str, interface: &str, ip: &str, mask: &str, gateway: &str) -> RouterRow {
        RouterRow {
            number: 1,
            network: network.to_string(),
            interface: interface.to_string(),
            description: format!("{} link", network),
            vlan: "0".to_string(),
            ipaddress: ip.to_string(),
            subnetmask: mask.to_string(),
            defaultgateway: gateway.to_string(),
        }
    }

    #[test]
    fn test_interface_block_static_address() {
        let mut r = row("lan", "Gi0/1", "192.168.1.1", "255.255.255.0", "");
        r.vlan = "10".to_string();
        let block = interface_block(&r).unwrap().unwrap();
        assert_eq!(
            block.lines,
            vec![
                "interface Gi0/1",
                " description lan link",
                " ip address 192.168.1.1 255.255.255.0",
                " switchport access vlan 10",
                " no shutdown",
            ]
        );
    }

    #[test]
    fn test_interface_block_dhcp_ignores_mask() {
        let r = row("wan", "Gi0/0", "DHCP", "255.255.255.0", "");
        let block = interface_block(&r).unwrap().unwrap();
        assert_eq!(
            block.lines,
            vec!["interface Gi0/0", " description wan link", " ip address dhcp", " no shutdown"]
        );
    }

    #[test]
    fn test_row_without_interface_only_routes() {
        let mut planner = RouterPlanner::new();
        planner
            .add_row(&row("lan", "", "10.9.0.0", "255.255.0.0", "10.0.0.254"))
            .unwrap();
        let plan = planner.finish(false);
        assert_eq!(
            plan.commands(),
            vec!["conf t", "ip route 10.9.0.0 255.255.0.0 10.0.0.254", "end"]
        );
    }

    #[test]
    fn test_last_wan_gateway_wins() {
        let rows = vec![
            row("wan", "Gi0/0", "dhcp", "", "198.51.100.1"),
            row("wan", "Gi0/2", "dhcp", "", "198.51.100.2"),
            row("lan", "Gi0/1", "172.16.5.1", "255.255.255.0", "172.16.5.254"),
        ];
        let mut planner = RouterPlanner::new();
        for r in &rows {
            planner.add_row(r).unwrap();
        }

        assert_eq!(planner.default_gateway(), Some("198.51.100.2"));
        assert_eq!(
            planner.routing_block().lines,
            vec![
                "ip route 0.0.0.0 0.0.0.0 198.51.100.2",
                "ip route 172.16.5.0 255.255.255.0 172.16.5.254",
            ]
        );
    }

    #[test]
    fn test_routing_block_follows_interfaces() {
        let rows = vec![
            row("lan", "Gi0/1", "192.168.1.1", "255.255.255.0", "192.168.1.254"),
            row("wan", "Gi0/0", "dhcp", "", "203.0.113.1"),
        ];
        let plan = build_router_plan(&rows, true).unwrap();
        let commands = plan.commands();
        let routes: Vec<_> = commands.iter().filter(|c| c.starts_with("ip route")).collect();

        assert_eq!(routes.len(), 2);
        assert_eq!(*routes[0], "ip route 0.0.0.0 0.0.0.0 203.0.113.1");
        let last_interface = commands.iter().rposition(|c| *c == " no shutdown").unwrap();
        let first_route = commands.iter().position(|c| c.starts_with("ip route")).unwrap();
        assert!(first_route > last_interface);
        assert_eq!(&commands[commands.len() - 2..], &["end", "wr mem"]);
    }

    #[test]
    fn test_lan_gateway_needs_address() {
        let err = RouterPlanner::new()
            .add_row(&row("lan", "Gi0/1", "dhcp", "", "10.0.0.1"))
            .unwrap_err();
        assert!(matches!(err, RowError::InvalidAddress { field: "address", .. }));
    }

    #[test]
    fn test_invalid_gateway_is_rejected() {
        let err = RouterPlanner::new()
            .add_row(&row("wan", "Gi0/0", "dhcp", "", "gateway"))
            .unwrap_err();
        assert!(matches!(err, RowError::InvalidAddress { field: "gateway", .. }));
    }

    #[test]
    fn test_other_network_gateway_is_ignored() {
        let mut planner = RouterPlanner::new();
        planner
            .add_row(&row("dmz", "Gi0/3", "10.5.0.1", "255.255.255.0", "10.5.0.254"))
            .unwrap();
        assert!(planner.routing_block().is_empty());
    }
}
