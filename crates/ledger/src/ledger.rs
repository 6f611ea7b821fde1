//! Unit lifecycle state machine.

use crate::{Error, Result, Stage, Unit, UnitId};
use policy::{AccessPolicy, Identity, RoleDirectory, RoleKind, SequenceId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// One of the five stage-advancing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    SupplyRawMaterial,
    Manufacture,
    Distribute,
    Retail,
    Sell,
}

impl Transition {
    pub const ALL: [Transition; 5] = [
        Transition::SupplyRawMaterial,
        Transition::Manufacture,
        Transition::Distribute,
        Transition::Retail,
        Transition::Sell,
    ];

    /// Role the caller must hold.
    pub fn required_role(self) -> RoleKind {
        match self {
            Transition::SupplyRawMaterial => RoleKind::RawMaterialSupplier,
            Transition::Manufacture => RoleKind::Manufacturer,
            Transition::Distribute => RoleKind::Distributor,
            Transition::Retail | Transition::Sell => RoleKind::Retailer,
        }
    }

    /// Stage the unit must be at.
    pub fn from_stage(self) -> Stage {
        match self {
            Transition::SupplyRawMaterial => Stage::Ordered,
            Transition::Manufacture => Stage::RawMaterialSupplied,
            Transition::Distribute => Stage::Manufactured,
            Transition::Retail => Stage::Distributed,
            Transition::Sell => Stage::Retailed,
        }
    }

    /// Stage the unit moves to.
    pub fn to_stage(self) -> Stage {
        match self {
            Transition::SupplyRawMaterial => Stage::RawMaterialSupplied,
            Transition::Manufacture => Stage::Manufactured,
            Transition::Distribute => Stage::Distributed,
            Transition::Retail => Stage::Retailed,
            Transition::Sell => Stage::Sold,
        }
    }

    /// Whether this transition stamps the caller onto the unit record.
    ///
    /// `Sell` checks the retailer of record instead of writing it.
    pub fn stamps_handler(self) -> bool {
        !matches!(self, Transition::Sell)
    }

    /// The transition that starts from `stage`, if any.
    pub fn starting_at(stage: Stage) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.from_stage() == stage)
    }

    pub fn name(self) -> &'static str {
        match self {
            Transition::SupplyRawMaterial => "supply_raw_material",
            Transition::Manufacture => "manufacture",
            Transition::Distribute => "distribute",
            Transition::Retail => "retail",
            Transition::Sell => "sell",
        }
    }
}

/// A validated stage advance, ready to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Advance {
    pub unit_id: UnitId,
    pub transition: Transition,
    pub handler: SequenceId,
}

/// Owns every tracked unit and advances them one stage at a time.
#[derive(Debug, Clone, Default)]
pub struct UnitLedger {
    /// Highest unit id handed out so far.
    assigned: u64,
    units: BTreeMap<UnitId, Unit>,
}

impl UnitLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of units ever ordered.
    pub fn count(&self) -> u64 {
        self.assigned
    }

    /// Fetch a unit, failing with `UnitNotFound` outside `1..=count`.
    pub fn get(&self, unit_id: UnitId) -> Result<&Unit> {
        self.units.get(&unit_id).ok_or(Error::UnitNotFound {
            unit_id,
            count: self.assigned,
        })
    }

    /// Current stage of a unit.
    pub fn show_stage(&self, unit_id: UnitId) -> Result<Stage> {
        Ok(self.get(unit_id)?.stage)
    }

    /// All units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Create a new unit at `Ordered`. Open to any caller.
    pub fn order(&mut self, name: impl Into<String>, description: impl Into<String>) -> UnitId {
        let unit = self.prepare_order(name.into(), description.into());
        self.insert(unit)
    }

    pub(crate) fn prepare_order(&self, name: String, description: String) -> Unit {
        Unit::ordered(UnitId(self.assigned + 1), name, description)
    }

    pub(crate) fn insert(&mut self, unit: Unit) -> UnitId {
        debug_assert_eq!(unit.unit_id.get(), self.assigned + 1);
        let unit_id = unit.unit_id;
        self.assigned = unit_id.get();
        info!(%unit_id, name = %unit.name, "unit ordered");
        self.units.insert(unit_id, unit);
        unit_id
    }

    /// Validate `transition` on `unit_id` for `caller` without mutating.
    ///
    /// Checks run in a fixed order: the unit exists, the caller holds the
    /// required role, the unit is at the starting stage, and for `Sell` the
    /// caller is the retailer of record.
    pub(crate) fn plan(
        &self,
        transition: Transition,
        unit_id: UnitId,
        caller: &Identity,
        directory: &impl RoleDirectory,
    ) -> Result<Advance> {
        let unit = self.get(unit_id)?;
        let handler = AccessPolicy::authorize(transition.required_role(), caller, directory)?;

        if unit.stage != transition.from_stage() {
            warn!(
                %unit_id,
                actual = %unit.stage,
                required = %transition.from_stage(),
                operation = transition.name(),
                "stage precondition failed"
            );
            return Err(Error::InvalidStageTransition {
                unit_id,
                actual: unit.stage,
                required: transition.from_stage(),
            });
        }

        if !transition.stamps_handler() {
            let role = transition.required_role();
            if unit.handler(role) != Some(handler) {
                warn!(%unit_id, %caller, "caller is not the retailer of record");
                return Err(Error::Unauthorized(format!(
                    "{caller} did not retail unit {unit_id}"
                )));
            }
        }

        Ok(Advance {
            unit_id,
            transition,
            handler,
        })
    }

    /// Apply a validated advance.
    ///
    /// Fails with `UnitNotFound` if the advance was planned against a
    /// different ledger.
    pub(crate) fn apply(&mut self, advance: Advance) -> Result<Stage> {
        let Advance {
            unit_id,
            transition,
            handler,
        } = advance;
        let count = self.assigned;
        let unit = self
            .units
            .get_mut(&unit_id)
            .ok_or(Error::UnitNotFound { unit_id, count })?;
        debug_assert_eq!(unit.stage, transition.from_stage());

        if transition.stamps_handler() {
            let slot = unit.handler_mut(transition.required_role());
            debug_assert!(slot.is_none(), "handler already set");
            *slot = Some(handler);
        }
        unit.stage = transition.to_stage();

        info!(
            %unit_id,
            operation = transition.name(),
            stage = %unit.stage,
            handler = %handler,
            "unit advanced"
        );
        Ok(unit.stage)
    }

    /// Validate and apply `transition` in one step.
    pub fn transition(
        &mut self,
        transition: Transition,
        unit_id: UnitId,
        caller: &Identity,
        directory: &impl RoleDirectory,
    ) -> Result<Stage> {
        let advance = self.plan(transition, unit_id, caller, directory)?;
        self.apply(advance)
    }
}
