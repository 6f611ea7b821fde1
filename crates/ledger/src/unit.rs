use crate::Stage;
use policy::{RoleKind, SequenceId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a tracked unit, assigned from 1 upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u64);

impl UnitId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle record of one physical item.
///
/// Each handler field is written once, on the transition into the stage the
/// role is responsible for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub unit_id: UnitId,
    pub name: String,
    pub description: String,
    pub raw_material_supplier_id: Option<SequenceId>,
    pub manufacturer_id: Option<SequenceId>,
    pub distributor_id: Option<SequenceId>,
    pub retailer_id: Option<SequenceId>,
    pub stage: Stage,
}

impl Unit {
    pub(crate) fn ordered(unit_id: UnitId, name: String, description: String) -> Self {
        Self {
            unit_id,
            name,
            description,
            raw_material_supplier_id: None,
            manufacturer_id: None,
            distributor_id: None,
            retailer_id: None,
            stage: Stage::Ordered,
        }
    }

    /// The participant of `role` that handled this unit, if any.
    pub fn handler(&self, role: RoleKind) -> Option<SequenceId> {
        match role {
            RoleKind::RawMaterialSupplier => self.raw_material_supplier_id,
            RoleKind::Manufacturer => self.manufacturer_id,
            RoleKind::Distributor => self.distributor_id,
            RoleKind::Retailer => self.retailer_id,
        }
    }

    pub(crate) fn handler_mut(&mut self, role: RoleKind) -> &mut Option<SequenceId> {
        match role {
            RoleKind::RawMaterialSupplier => &mut self.raw_material_supplier_id,
            RoleKind::Manufacturer => &mut self.manufacturer_id,
            RoleKind::Distributor => &mut self.distributor_id,
            RoleKind::Retailer => &mut self.retailer_id,
        }
    }

    /// Portable record for out-of-band verification.
    pub fn summary(&self) -> UnitSummary {
        UnitSummary {
            unit_id: self.unit_id,
            name: self.name.clone(),
            description: self.description.clone(),
            current_stage: self.stage.label().to_string(),
        }
    }
}

/// Exportable summary of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSummary {
    pub unit_id: UnitId,
    pub name: String,
    pub description: String,
    pub current_stage: String,
}

impl UnitSummary {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_json_shape() {
        let unit = Unit::ordered(UnitId(1), "Cell-100".into(), "LFP cell".into());
        let json: serde_json::Value = serde_json::from_str(&unit.summary().to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "unitId": 1,
                "name": "Cell-100",
                "description": "LFP cell",
                "currentStage": "Unit Ordered",
            })
        );
    }
}
