//! VLAN id and range parsing.
//!
//! CSV rows carry either a single VLAN id (`"10"`) or an inclusive range
//! (`"300-400"`). This module expands both forms into the ordered list of ids
//! the command builders work with.

use std::fmt;

/// Lowest usable 802.1Q VLAN id
pub const MIN_VLAN_ID: u16 = 1;

/// Highest usable 802.1Q VLAN id
pub const MAX_VLAN_ID: u16 = 4094;

/// Errors produced when a VLAN field cannot be expanded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VlanRangeError {
    #[error("VLAN field is empty")]
    Empty,

    #[error("VLAN '{value}' is not a number")]
    NotNumeric { value: String },

    #[error("VLAN {id} is outside {MIN_VLAN_ID}-{MAX_VLAN_ID}")]
    OutOfBounds { id: u32 },

    #[error("VLAN range {start}-{end} is reversed")]
    Reversed { start: u16, end: u16 },
}

/// An expanded VLAN field: one or more ids in ascending order.
///
/// A bare value keeps its original spelling, a range `A-B` becomes the
/// inclusive sequence `A..=B`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanRange {
    ids: Vec<String>,
}

impl VlanRange {
    /// Parse a VLAN field (`"10"` or `"300-400"`)
    ///
    /// # Examples
    /// ```
    /// use netpush::vlan::VlanRange;
    ///
    /// let range = VlanRange::parse("300-302").unwrap();
    /// assert_eq!(range.ids(), ["300", "301", "302"]);
    /// assert_eq!(VlanRange::parse("10").unwrap().ids(), ["10"]);
    /// assert!(VlanRange::parse("400-300").is_err());
    /// ```
    pub fn parse(value: &str) -> Result<Self, VlanRangeError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(VlanRangeError::Empty);
        }

        match value.split_once('-') {
            Some((start, end)) => {
                let start = parse_id(start)?;
                let end = parse_id(end)?;
                if start > end {
                    return Err(VlanRangeError::Reversed { start, end });
                }
                Ok(Self {
                    ids: (start..=end).map(|id| id.to_string()).collect(),
                })
            }
            None => {
                // Validate, but keep the value exactly as written
                parse_id(value)?;
                Ok(Self {
                    ids: vec![value.to_string()],
                })
            }
        }
    }

    /// All ids in the range, in ascending order
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// The first (lowest) id
    pub fn first(&self) -> &str {
        // Construction guarantees at least one element
        &self.ids[0]
    }

    /// True when the field named a range of more than one VLAN
    pub fn is_multiple(&self) -> bool {
        self.ids.len() > 1
    }

    /// Comma separated list for `switchport trunk allowed vlan`
    pub fn joined(&self) -> String {
        self.ids.join(",")
    }
}

impl fmt::Display for VlanRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_multiple() {
            write!(f, "{}-{}", self.first(), self.ids[self.ids.len() - 1])
        } else {
            f.write_str(self.first())
        }
    }
}

/// Expand a VLAN field into its list of ids
pub fn parse_vlan_range(value: &str) -> Result<Vec<String>, VlanRangeError> {
    VlanRange::parse(value).map(|range| range.ids)
}

fn parse_id(raw: &str) -> Result<u16, VlanRangeError> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(VlanRangeError::NotNumeric {
            value: raw.to_string(),
        });
    }

    let id: u32 = raw.parse().map_err(|_| VlanRangeError::OutOfBounds { id: u32::MAX })?;
    if id < u32::from(MIN_VLAN_ID) || id > u32::from(MAX_VLAN_ID) {
        return Err(VlanRangeError::OutOfBounds { id });
    }
    Ok(id as u16)
}
