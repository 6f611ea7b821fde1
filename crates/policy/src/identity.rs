use serde::{Deserialize, Serialize};
use std::fmt;

/// An external caller identity, e.g. an account address.
///
/// Identities arrive already authenticated. They are compared byte for byte
/// and never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The four participant roles of the supply chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    RawMaterialSupplier,
    Manufacturer,
    Distributor,
    Retailer,
}

impl RoleKind {
    /// All role kinds in handoff order.
    pub const ALL: [RoleKind; 4] = [
        RoleKind::RawMaterialSupplier,
        RoleKind::Manufacturer,
        RoleKind::Distributor,
        RoleKind::Retailer,
    ];

    /// Stable snake_case name, matching the serde form.
    pub fn name(self) -> &'static str {
        match self {
            RoleKind::RawMaterialSupplier => "raw_material_supplier",
            RoleKind::Manufacturer => "manufacturer",
            RoleKind::Distributor => "distributor",
            RoleKind::Retailer => "retailer",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            RoleKind::RawMaterialSupplier => "Raw Material Supplier",
            RoleKind::Manufacturer => "Manufacturer",
            RoleKind::Distributor => "Distributor",
            RoleKind::Retailer => "Retailer",
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for RoleKind {
    type Err = String;

    /// Accepts the snake_case name or the short forms `rms`, `man`, `dis`, `ret`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw_material_supplier" | "rms" | "supplier" => Ok(RoleKind::RawMaterialSupplier),
            "manufacturer" | "man" => Ok(RoleKind::Manufacturer),
            "distributor" | "dis" => Ok(RoleKind::Distributor),
            "retailer" | "ret" => Ok(RoleKind::Retailer),
            other => Err(format!("unknown role kind: {other}")),
        }
    }
}

/// Per-role participant number, assigned at registration starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceId(pub u64);

impl SequenceId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lookup contract the access policy needs from the identity registry.
pub trait RoleDirectory {
    /// Resolve the role an identity holds, if any.
    fn resolve_role(&self, identity: &Identity) -> Option<(RoleKind, SequenceId)>;
}
