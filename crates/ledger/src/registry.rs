//! Participant registry.

use crate::{Error, Result};
use policy::{AdminGate, Identity, RoleDirectory, RoleKind, SequenceId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// A registered supply chain actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub identity: Identity,
    pub sequence_id: SequenceId,
    pub role: RoleKind,
    pub display_name: String,
    pub location: String,
}

/// Participants of one role kind.
#[derive(Debug, Clone, Default)]
struct Roster {
    /// Highest sequence id handed out so far.
    assigned: u64,
    members: BTreeMap<SequenceId, Participant>,
}

/// Maps identities to at most one role and stores participant metadata.
///
/// Participants are never removed or edited once inserted.
#[derive(Debug, Clone, Default)]
pub struct IdentityRegistry {
    roles: HashMap<Identity, (RoleKind, SequenceId)>,
    rosters: BTreeMap<RoleKind, Roster>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `target` under `role`, returning its new sequence id.
    ///
    /// Fails with `Unauthorized` unless `caller` is the administrator, then
    /// with `AlreadyRegistered` if `target` already holds any role.
    pub fn register(
        &mut self,
        gate: &AdminGate,
        caller: &Identity,
        role: RoleKind,
        target: Identity,
        display_name: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<SequenceId> {
        gate.require_administrator(caller)?;
        let participant = self.prepare(role, target, display_name.into(), location.into())?;
        Ok(self.insert(participant))
    }

    /// Build the participant a registration would create, without storing it.
    pub(crate) fn prepare(
        &self,
        role: RoleKind,
        identity: Identity,
        display_name: String,
        location: String,
    ) -> Result<Participant> {
        if let Some((held, _)) = self.roles.get(&identity) {
            return Err(Error::AlreadyRegistered {
                identity,
                role: *held,
            });
        }
        let assigned = self.rosters.get(&role).map_or(0, |r| r.assigned);
        Ok(Participant {
            identity,
            sequence_id: SequenceId(assigned + 1),
            role,
            display_name,
            location,
        })
    }

    /// Store a participant produced by [`prepare`](Self::prepare).
    pub(crate) fn insert(&mut self, participant: Participant) -> SequenceId {
        let roster = self.rosters.entry(participant.role).or_default();
        debug_assert_eq!(participant.sequence_id.get(), roster.assigned + 1);
        debug_assert!(!self.roles.contains_key(&participant.identity));

        roster.assigned = participant.sequence_id.get();
        self.roles.insert(
            participant.identity.clone(),
            (participant.role, participant.sequence_id),
        );
        info!(
            identity = %participant.identity,
            role = participant.role.name(),
            sequence_id = %participant.sequence_id,
            name = %participant.display_name,
            "participant registered"
        );
        let sequence_id = participant.sequence_id;
        roster.members.insert(sequence_id, participant);
        sequence_id
    }

    /// Role and sequence id held by `identity`, if any.
    pub fn resolve_role(&self, identity: &Identity) -> Option<(RoleKind, SequenceId)> {
        self.roles.get(identity).copied()
    }

    /// Participant `sequence_id` of `role`, if registered.
    pub fn lookup(&self, role: RoleKind, sequence_id: SequenceId) -> Option<&Participant> {
        self.rosters.get(&role)?.members.get(&sequence_id)
    }

    /// Number of participants registered under `role`.
    pub fn count_by_role(&self, role: RoleKind) -> u64 {
        self.rosters.get(&role).map_or(0, |r| r.assigned)
    }

    /// All participants of `role` in sequence order.
    pub fn participants(&self, role: RoleKind) -> impl Iterator<Item = &Participant> {
        self.rosters
            .get(&role)
            .into_iter()
            .flat_map(|r| r.members.values())
    }

    /// Total number of participants across all roles.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl RoleDirectory for IdentityRegistry {
    fn resolve_role(&self, identity: &Identity) -> Option<(RoleKind, SequenceId)> {
        IdentityRegistry::resolve_role(self, identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Identity {
        Identity::from("admin")
    }

    fn setup() -> (IdentityRegistry, AdminGate) {
        (IdentityRegistry::new(), AdminGate::new(admin()))
    }

    #[test]
    fn test_register_assigns_per_role_sequence() {
        let (mut registry, gate) = setup();
        let a = registry
            .register(&gate, &admin(), RoleKind::RawMaterialSupplier, "a".into(), "A", "Perth")
            .unwrap();
        let b = registry
            .register(&gate, &admin(), RoleKind::Manufacturer, "b".into(), "B", "Shenzhen")
            .unwrap();
        let c = registry
            .register(&gate, &admin(), RoleKind::RawMaterialSupplier, "c".into(), "C", "Santiago")
            .unwrap();

        assert_eq!(a, SequenceId(1));
        assert_eq!(b, SequenceId(1));
        assert_eq!(c, SequenceId(2));
        assert_eq!(registry.count_by_role(RoleKind::RawMaterialSupplier), 2);
        assert_eq!(registry.count_by_role(RoleKind::Manufacturer), 1);
        assert_eq!(registry.count_by_role(RoleKind::Retailer), 0);
    }

    #[test]
    fn test_register_requires_administrator() {
        let (mut registry, gate) = setup();
        let err = registry
            .register(&gate, &Identity::from("mallory"), RoleKind::Retailer, "m".into(), "M", "X")
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
        assert!(registry.is_empty());
        assert_eq!(registry.count_by_role(RoleKind::Retailer), 0);
    }

    #[test]
    fn test_identity_holds_at_most_one_role() {
        let (mut registry, gate) = setup();
        registry
            .register(&gate, &admin(), RoleKind::Distributor, "d".into(), "D", "Rotterdam")
            .unwrap();

        for role in RoleKind::ALL {
            let err = registry
                .register(&gate, &admin(), role, "d".into(), "D again", "Elsewhere")
                .unwrap_err();
            assert!(matches!(
                err,
                Error::AlreadyRegistered { role: RoleKind::Distributor, .. }
            ));
        }
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.count_by_role(RoleKind::Distributor), 1);
    }

    #[test]
    fn test_unauthorized_checked_before_duplicate() {
        let (mut registry, gate) = setup();
        registry
            .register(&gate, &admin(), RoleKind::Retailer, "r".into(), "R", "Oslo")
            .unwrap();
        let err = registry
            .register(&gate, &Identity::from("r"), RoleKind::Retailer, "r".into(), "R", "Oslo")
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[test]
    fn test_lookup_and_resolve() {
        let (mut registry, gate) = setup();
        registry
            .register(&gate, &admin(), RoleKind::Retailer, "r".into(), "Corner Shop", "Oslo")
            .unwrap();

        assert_eq!(
            registry.resolve_role(&Identity::from("r")),
            Some((RoleKind::Retailer, SequenceId(1)))
        );
        assert_eq!(registry.resolve_role(&Identity::from("nobody")), None);

        let participant = registry.lookup(RoleKind::Retailer, SequenceId(1)).unwrap();
        assert_eq!(participant.display_name, "Corner Shop");
        assert_eq!(participant.location, "Oslo");
        assert!(registry.lookup(RoleKind::Retailer, SequenceId(2)).is_none());
        assert!(registry.lookup(RoleKind::Retailer, SequenceId(0)).is_none());
        assert!(registry.lookup(RoleKind::Manufacturer, SequenceId(1)).is_none());
    }

    #[test]
    fn test_administrator_may_register_itself() {
        let (mut registry, gate) = setup();
        let id = registry
            .register(&gate, &admin(), RoleKind::Manufacturer, admin(), "HQ", "Berlin")
            .unwrap();
        assert_eq!(id, SequenceId(1));
    }
}
