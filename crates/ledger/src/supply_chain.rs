//! The ledger as one bootstrapped unit.

use crate::ledger::Advance;
use crate::operation::Effect;
use crate::{
    IdentityRegistry, Operation, Outcome, Participant, Provenance, Result, Stage, Transition,
    Unit, UnitId, UnitLedger, UnitSummary,
};
use policy::{AccessPolicy, AdminGate, Handoff, Identity, Requirement, RoleKind, SequenceId};
use tracing::debug;

/// Identity registry, admin gate and unit ledger, owned together.
///
/// Mutations go through [`execute`](Self::execute) or one of the named
/// wrappers. Queries perform no authorization.
#[derive(Debug, Clone)]
pub struct SupplyChain {
    gate: AdminGate,
    registry: IdentityRegistry,
    ledger: UnitLedger,
}

impl SupplyChain {
    /// Instantiate an empty ledger administered by `deployer`.
    pub fn bootstrap(deployer: Identity) -> Self {
        Self {
            gate: AdminGate::new(deployer),
            registry: IdentityRegistry::new(),
            ledger: UnitLedger::new(),
        }
    }

    /// Validate and apply one operation.
    pub fn execute(&mut self, caller: &Identity, operation: Operation) -> Result<Outcome> {
        let effect = self.plan(caller, operation)?;
        self.commit(effect)
    }

    /// Check every precondition of `operation` without mutating anything.
    pub(crate) fn plan(&self, caller: &Identity, operation: Operation) -> Result<Effect> {
        debug!(%caller, operation = operation.name(), "planning");

        let effect = match operation {
            Operation::Register {
                role,
                identity,
                display_name,
                location,
            } => Effect::Register(self.plan_register(caller, role, identity, display_name, location)?),
            Operation::TransferAdministration { new_administrator } => {
                Effect::TransferAdministration(self.plan_transfer(caller, new_administrator)?)
            }
            Operation::Order { name, description } => {
                Effect::Order(self.plan_order(caller, name, description)?)
            }
            Operation::SupplyRawMaterial { unit_id } => {
                Effect::Advance(self.plan_advance(caller, Transition::SupplyRawMaterial, unit_id)?)
            }
            Operation::Manufacture { unit_id } => {
                Effect::Advance(self.plan_advance(caller, Transition::Manufacture, unit_id)?)
            }
            Operation::Distribute { unit_id } => {
                Effect::Advance(self.plan_advance(caller, Transition::Distribute, unit_id)?)
            }
            Operation::Retail { unit_id } => {
                Effect::Advance(self.plan_advance(caller, Transition::Retail, unit_id)?)
            }
            Operation::Sell { unit_id } => {
                Effect::Advance(self.plan_advance(caller, Transition::Sell, unit_id)?)
            }
        };
        Ok(effect)
    }

    /// Apply a planned effect.
    ///
    /// Only fails if the effect was planned against different state.
    pub(crate) fn commit(&mut self, effect: Effect) -> Result<Outcome> {
        let outcome = match effect {
            Effect::Register(participant) => Outcome::Registered {
                role: participant.role,
                sequence_id: self.registry.insert(participant),
            },
            Effect::TransferAdministration(handoff) => {
                let administrator = handoff.new_administrator().clone();
                self.gate.apply(handoff)?;
                Outcome::AdministrationTransferred { administrator }
            }
            Effect::Order(unit) => Outcome::Ordered {
                unit_id: self.ledger.insert(unit),
            },
            Effect::Advance(advance) => Outcome::Advanced {
                unit_id: advance.unit_id,
                stage: self.ledger.apply(advance)?,
            },
        };
        Ok(outcome)
    }

    fn admit(&self, caller: &Identity, requirement: Requirement) -> Result<()> {
        AccessPolicy::check(requirement, caller, &self.registry, &self.gate).into_result()?;
        Ok(())
    }

    fn plan_register(
        &self,
        caller: &Identity,
        role: RoleKind,
        identity: Identity,
        display_name: String,
        location: String,
    ) -> Result<Participant> {
        self.admit(caller, Requirement::Administrator)?;
        self.registry.prepare(role, identity, display_name, location)
    }

    fn plan_transfer(&self, caller: &Identity, new_administrator: Identity) -> Result<Handoff> {
        self.admit(caller, Requirement::Administrator)?;
        Ok(self.gate.plan_transfer(caller, new_administrator)?)
    }

    fn plan_order(&self, caller: &Identity, name: String, description: String) -> Result<Unit> {
        self.admit(caller, Requirement::Open)?;
        Ok(self.ledger.prepare_order(name, description))
    }

    /// Unit existence is checked before the caller's role.
    fn plan_advance(&self, caller: &Identity, transition: Transition, unit_id: UnitId) -> Result<Advance> {
        self.ledger.plan(transition, unit_id, caller, &self.registry)
    }

    /// Register a participant. Returns its per-role sequence id.
    pub fn register(
        &mut self,
        caller: &Identity,
        role: RoleKind,
        identity: Identity,
        display_name: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<SequenceId> {
        let participant =
            self.plan_register(caller, role, identity, display_name.into(), location.into())?;
        Ok(self.registry.insert(participant))
    }

    pub fn transfer_administration(
        &mut self,
        caller: &Identity,
        new_administrator: Identity,
    ) -> Result<()> {
        let handoff = self.plan_transfer(caller, new_administrator)?;
        Ok(self.gate.apply(handoff)?)
    }

    /// Order a new unit. Any caller may do this.
    pub fn order(
        &mut self,
        caller: &Identity,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<UnitId> {
        let unit = self.plan_order(caller, name.into(), description.into())?;
        Ok(self.ledger.insert(unit))
    }

    fn advance(&mut self, caller: &Identity, transition: Transition, unit_id: UnitId) -> Result<Stage> {
        let advance = self.plan_advance(caller, transition, unit_id)?;
        self.ledger.apply(advance)
    }

    pub fn supply_raw_material(&mut self, caller: &Identity, unit_id: UnitId) -> Result<Stage> {
        self.advance(caller, Transition::SupplyRawMaterial, unit_id)
    }

    pub fn manufacture(&mut self, caller: &Identity, unit_id: UnitId) -> Result<Stage> {
        self.advance(caller, Transition::Manufacture, unit_id)
    }

    pub fn distribute(&mut self, caller: &Identity, unit_id: UnitId) -> Result<Stage> {
        self.advance(caller, Transition::Distribute, unit_id)
    }

    pub fn retail(&mut self, caller: &Identity, unit_id: UnitId) -> Result<Stage> {
        self.advance(caller, Transition::Retail, unit_id)
    }

    pub fn sell(&mut self, caller: &Identity, unit_id: UnitId) -> Result<Stage> {
        self.advance(caller, Transition::Sell, unit_id)
    }

    // Queries

    pub fn show_stage(&self, unit_id: UnitId) -> Result<Stage> {
        self.ledger.show_stage(unit_id)
    }

    pub fn unit(&self, unit_id: UnitId) -> Result<&Unit> {
        self.ledger.get(unit_id)
    }

    pub fn unit_count(&self) -> u64 {
        self.ledger.count()
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.ledger.units()
    }

    pub fn lookup(&self, role: RoleKind, sequence_id: SequenceId) -> Option<&Participant> {
        self.registry.lookup(role, sequence_id)
    }

    pub fn count_by_role(&self, role: RoleKind) -> u64 {
        self.registry.count_by_role(role)
    }

    pub fn participants(&self, role: RoleKind) -> impl Iterator<Item = &Participant> {
        self.registry.participants(role)
    }

    pub fn resolve_role(&self, identity: &Identity) -> Option<(RoleKind, SequenceId)> {
        self.registry.resolve_role(identity)
    }

    pub fn administrator(&self) -> &Identity {
        self.gate.administrator()
    }

    pub fn is_administrator(&self, identity: &Identity) -> bool {
        self.gate.is_administrator(identity)
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// Reconstruct the handoff chain of a unit.
    pub fn provenance(&self, unit_id: UnitId) -> Result<Provenance> {
        Ok(Provenance::build(self.ledger.get(unit_id)?, &self.registry))
    }

    /// Portable summary of a unit.
    pub fn summary(&self, unit_id: UnitId) -> Result<UnitSummary> {
        Ok(self.ledger.get(unit_id)?.summary())
    }
}
