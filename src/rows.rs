//! CSV row input.
//!
//! Rows are read header-driven: columns are matched by name, header names and
//! values are trimmed, and the delimiter comes from the job configuration.
//! Empty cells are treated as absent values.

use crate::vlan::VlanRangeError;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// Errors raised while reading or interpreting a CSV row
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    #[error("row {row}: missing required field '{field}'")]
    MissingField { row: usize, field: &'static str },

    #[error("row {row}: {source}")]
    InvalidVlan {
        row: usize,
        #[source]
        source: VlanRangeError,
    },

    #[error("row {row}: '{value}' is not a valid IPv4 {field}")]
    InvalidAddress {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("row {row}: {message}")]
    Invalid { row: usize, message: String },

    #[error("CSV header has no '{column}' column (found: {found})")]
    MissingColumn { column: String, found: String },

    #[error("failed to read CSV input: {0}")]
    Csv(#[from] csv::Error),
}

/// Rows that remember their 1-based position in the file
pub trait NumberedRow {
    fn set_number(&mut self, number: usize);
}

/// One record of a switch VLAN sheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigRow {
    /// Position in the file (first data row is 1)
    #[serde(skip)]
    pub number: usize,
    /// Single id or `start-end` range
    #[serde(rename = "Vlan", alias = "vlan", alias = "VLAN", default)]
    pub vlan: String,
    #[serde(rename = "Description", alias = "description", default)]
    pub description: String,
    /// Port expression, passed through to `interface range` unmodified
    #[serde(rename = "Ports", alias = "ports", default)]
    pub ports: String,
    /// Interface address, may be empty
    #[serde(rename = "IP Address", alias = "Address", alias = "ipaddress", default)]
    pub ip_address: String,
    #[serde(rename = "Netmask", alias = "netmask", alias = "subnetmask", default)]
    pub netmask: String,
}

/// Fail with `MissingField` when a mandatory column is empty
pub fn required<'a>(row: usize, field: &'static str, value: &'a str) -> Result<&'a str, RowError> {
    if value.is_empty() {
        Err(RowError::MissingField { row, field })
    } else {
        Ok(value)
    }
}

impl NumberedRow for ConfigRow {
    fn set_number(&mut self, number: usize) {
        self.number = number;
    }
}

/// Role of a router interface row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkType {
    Wan,
    Lan,
    Other(String),
}

impl NetworkType {
    pub fn from_field(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "wan" => NetworkType::Wan,
            "lan" => NetworkType::Lan,
            _ => NetworkType::Other(value.to_string()),
        }
    }
}

/// One record of a broadband router sheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RouterRow {
    #[serde(skip)]
    pub number: usize,
    /// `wan`, `lan` or anything else
    #[serde(alias = "Network", default)]
    pub network: String,
    #[serde(alias = "Interface", default)]
    pub interface: String,
    #[serde(alias = "Description", default)]
    pub description: String,
    /// Access VLAN, `0` or empty for none
    #[serde(alias = "Vlan", default)]
    pub vlan: String,
    /// Interface address or the literal `dhcp`
    #[serde(alias = "IP Address", default)]
    pub ipaddress: String,
    #[serde(alias = "Netmask", default)]
    pub subnetmask: String,
    #[serde(alias = "Gateway", default)]
    pub defaultgateway: String,
}

impl RouterRow {
    pub fn network_type(&self) -> NetworkType {
        NetworkType::from_field(&self.network)
    }

    pub fn is_dhcp(&self) -> bool {
        self.ipaddress.eq_ignore_ascii_case("dhcp")
    }

    pub fn gateway(&self) -> Option<&str> {
        (!self.defaultgateway.is_empty()).then_some(self.defaultgateway.as_str())
    }
}

impl NumberedRow for RouterRow {
    fn set_number(&mut self, number: usize) {
        self.number = number;
    }
}

/// Read all rows from a CSV file
pub fn read_rows<T>(path: &Path, delimiter: u8) -> Result<Vec<T>, RowError>
where
    T: DeserializeOwned + NumberedRow,
{
    debug!("Reading CSV rows from {:?} (delimiter {:?})", path, delimiter as char);
    let reader = builder(delimiter).from_path(path)?;
    collect_rows(reader)
}

/// Read all rows from any reader, used for in-memory input
pub fn read_rows_from<T, R>(input: R, delimiter: u8) -> Result<Vec<T>, RowError>
where
    T: DeserializeOwned + NumberedRow,
    R: Read,
{
    collect_rows(builder(delimiter).from_reader(input))
}

fn builder(delimiter: u8) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All);
    builder
}

fn collect_rows<T, R>(mut reader: csv::Reader<R>) -> Result<Vec<T>, RowError>
where
    T: DeserializeOwned + NumberedRow,
    R: Read,
{
    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<T>().enumerate() {
        let mut row = record?;
        row.set_number(index + 1);
        rows.push(row);
    }
    Ok(rows)
}
