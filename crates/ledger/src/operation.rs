//! Mutating operations and their outcomes.

use crate::{Participant, Stage, Transition, Unit, UnitId};
use policy::{Handoff, Identity, Requirement, RoleKind, SequenceId};
use serde::{Deserialize, Serialize};

/// Every mutating call the ledger accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    /// Register a participant. Administrator only.
    Register {
        role: RoleKind,
        identity: Identity,
        display_name: String,
        location: String,
    },
    /// Hand administration to another identity. Administrator only.
    TransferAdministration { new_administrator: Identity },
    /// Create a new unit. Open to anyone.
    Order { name: String, description: String },
    SupplyRawMaterial { unit_id: UnitId },
    Manufacture { unit_id: UnitId },
    Distribute { unit_id: UnitId },
    Retail { unit_id: UnitId },
    /// Close out a sale. Only the retailer of record.
    Sell { unit_id: UnitId },
}

impl Operation {
    /// Build the stage-advancing operation for `transition`.
    pub fn advance(transition: Transition, unit_id: UnitId) -> Self {
        match transition {
            Transition::SupplyRawMaterial => Operation::SupplyRawMaterial { unit_id },
            Transition::Manufacture => Operation::Manufacture { unit_id },
            Transition::Distribute => Operation::Distribute { unit_id },
            Transition::Retail => Operation::Retail { unit_id },
            Transition::Sell => Operation::Sell { unit_id },
        }
    }

    /// What the caller must be for this operation to proceed.
    pub fn requirement(&self) -> Requirement {
        match self {
            Operation::Register { .. } | Operation::TransferAdministration { .. } => {
                Requirement::Administrator
            }
            Operation::Order { .. } => Requirement::Open,
            Operation::SupplyRawMaterial { .. } => Requirement::Role(RoleKind::RawMaterialSupplier),
            Operation::Manufacture { .. } => Requirement::Role(RoleKind::Manufacturer),
            Operation::Distribute { .. } => Requirement::Role(RoleKind::Distributor),
            Operation::Retail { .. } | Operation::Sell { .. } => Requirement::Role(RoleKind::Retailer),
        }
    }

    /// The stage transition and target unit, for stage-advancing operations.
    pub fn transition(&self) -> Option<(Transition, UnitId)> {
        match *self {
            Operation::SupplyRawMaterial { unit_id } => Some((Transition::SupplyRawMaterial, unit_id)),
            Operation::Manufacture { unit_id } => Some((Transition::Manufacture, unit_id)),
            Operation::Distribute { unit_id } => Some((Transition::Distribute, unit_id)),
            Operation::Retail { unit_id } => Some((Transition::Retail, unit_id)),
            Operation::Sell { unit_id } => Some((Transition::Sell, unit_id)),
            Operation::Register { .. }
            | Operation::TransferAdministration { .. }
            | Operation::Order { .. } => None,
        }
    }

    /// Stable snake_case name, matching the serde tag.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Register { .. } => "register",
            Operation::TransferAdministration { .. } => "transfer_administration",
            Operation::Order { .. } => "order",
            Operation::SupplyRawMaterial { .. } => "supply_raw_material",
            Operation::Manufacture { .. } => "manufacture",
            Operation::Distribute { .. } => "distribute",
            Operation::Retail { .. } => "retail",
            Operation::Sell { .. } => "sell",
        }
    }
}

/// What a successful operation produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Registered { role: RoleKind, sequence_id: SequenceId },
    AdministrationTransferred { administrator: Identity },
    Ordered { unit_id: UnitId },
    Advanced { unit_id: UnitId, stage: Stage },
}

/// A fully validated change, ready to commit.
#[derive(Debug)]
pub(crate) enum Effect {
    Register(Participant),
    TransferAdministration(Handoff),
    Order(Unit),
    Advance(crate::ledger::Advance),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirements() {
        let register = Operation::Register {
            role: RoleKind::Retailer,
            identity: "r".into(),
            display_name: "R".into(),
            location: "Oslo".into(),
        };
        assert_eq!(register.requirement(), Requirement::Administrator);
        assert_eq!(
            Operation::Order { name: "a".into(), description: "".into() }.requirement(),
            Requirement::Open
        );
        assert_eq!(
            Operation::Sell { unit_id: UnitId(1) }.requirement(),
            Requirement::Role(RoleKind::Retailer)
        );
        assert_eq!(
            Operation::Manufacture { unit_id: UnitId(1) }.requirement(),
            Requirement::Role(RoleKind::Manufacturer)
        );
    }

    #[test]
    fn test_name_matches_serde_tag() {
        let ops = vec![
            Operation::TransferAdministration { new_administrator: "ops".into() },
            Operation::Order { name: "a".into(), description: "b".into() },
            Operation::SupplyRawMaterial { unit_id: UnitId(3) },
            Operation::Sell { unit_id: UnitId(3) },
        ];
        for op in ops {
            let json = serde_json::to_value(&op).unwrap();
            assert_eq!(json["kind"], op.name());
            let back: Operation = serde_json::from_value(json).unwrap();
            assert_eq!(back, op);
        }
    }

    #[test]
    fn test_advance_builds_matching_operation() {
        for transition in Transition::ALL {
            let op = Operation::advance(transition, UnitId(7));
            assert_eq!(op.transition(), Some((transition, UnitId(7))));
            assert_eq!(op.name(), transition.name());
            assert_eq!(op.requirement(), Requirement::Role(transition.required_role()));
        }
    }
}
