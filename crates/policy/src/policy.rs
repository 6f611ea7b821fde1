//! Access decisions for ledger operations.

use crate::{AdminGate, Error, Identity, Result, RoleDirectory, RoleKind, SequenceId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What a caller must be for an operation to proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "requires", content = "role", rename_all = "snake_case")]
pub enum Requirement {
    /// Anyone may call.
    Open,
    /// Only the current administrator.
    Administrator,
    /// A registered participant holding this role.
    Role(RoleKind),
}

/// Result of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Allowed. Carries the caller's sequence id for role requirements.
    Allow { sequence_id: Option<SequenceId> },
    Deny { reason: String },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow { .. })
    }

    /// Convert into a `Result`, turning a denial into `Unauthorized`.
    pub fn into_result(self) -> Result<Option<SequenceId>> {
        match self {
            Decision::Allow { sequence_id } => Ok(sequence_id),
            Decision::Deny { reason } => Err(Error::Unauthorized(reason)),
        }
    }
}

/// Stateless access policy.
///
/// Every decision is a pure function of the caller, the requirement and the
/// registry/gate snapshot passed in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy;

impl AccessPolicy {
    /// Require `caller` to hold `role`, returning its sequence id.
    pub fn authorize(
        role: RoleKind,
        caller: &Identity,
        directory: &impl RoleDirectory,
    ) -> Result<SequenceId> {
        match directory.resolve_role(caller) {
            Some((held, sequence_id)) if held == role => {
                debug!(%caller, role = role.name(), %sequence_id, "role authorized");
                Ok(sequence_id)
            }
            Some((held, _)) => {
                warn!(%caller, required = role.name(), held = held.name(), "role mismatch");
                Err(Error::Unauthorized(format!(
                    "{caller} is a {held}, not a {role}"
                )))
            }
            None => {
                warn!(%caller, required = role.name(), "caller holds no role");
                Err(Error::Unauthorized(format!(
                    "{caller} is not a registered {role}"
                )))
            }
        }
    }

    /// Evaluate any requirement against the current snapshot.
    pub fn check(
        requirement: Requirement,
        caller: &Identity,
        directory: &impl RoleDirectory,
        gate: &AdminGate,
    ) -> Decision {
        match requirement {
            Requirement::Open => Decision::Allow { sequence_id: None },
            Requirement::Administrator => match gate.require_administrator(caller) {
                Ok(()) => Decision::Allow { sequence_id: None },
                Err(Error::Unauthorized(reason)) => Decision::Deny { reason },
            },
            Requirement::Role(role) => match Self::authorize(role, caller, directory) {
                Ok(sequence_id) => Decision::Allow {
                    sequence_id: Some(sequence_id),
                },
                Err(Error::Unauthorized(reason)) => Decision::Deny { reason },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fixed(HashMap<Identity, (RoleKind, SequenceId)>);

    impl RoleDirectory for Fixed {
        fn resolve_role(&self, identity: &Identity) -> Option<(RoleKind, SequenceId)> {
            self.0.get(identity).copied()
        }
    }

    fn directory() -> Fixed {
        let mut map = HashMap::new();
        map.insert(Identity::from("supplier"), (RoleKind::RawMaterialSupplier, SequenceId(1)));
        map.insert(Identity::from("maker"), (RoleKind::Manufacturer, SequenceId(3)));
        Fixed(map)
    }

    #[test]
    fn test_authorize_matching_role_returns_sequence_id() {
        let id = AccessPolicy::authorize(RoleKind::Manufacturer, &Identity::from("maker"), &directory())
            .unwrap();
        assert_eq!(id, SequenceId(3));
    }

    #[test]
    fn test_authorize_wrong_role_is_unauthorized() {
        let err = AccessPolicy::authorize(RoleKind::Manufacturer, &Identity::from("supplier"), &directory())
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[test]
    fn test_authorize_unknown_caller_is_unauthorized() {
        assert!(AccessPolicy::authorize(RoleKind::Retailer, &Identity::from("nobody"), &directory()).is_err());
    }

    #[test]
    fn test_check_open_allows_anyone() {
        let gate = AdminGate::new(Identity::from("admin"));
        let decision = AccessPolicy::check(Requirement::Open, &Identity::from("nobody"), &directory(), &gate);
        assert_eq!(decision, Decision::Allow { sequence_id: None });
    }

    #[test]
    fn test_check_administrator() {
        let gate = AdminGate::new(Identity::from("admin"));
        let dir = directory();
        assert!(AccessPolicy::check(Requirement::Administrator, &Identity::from("admin"), &dir, &gate).is_allowed());
        // Holding a participant role does not confer administration.
        assert!(!AccessPolicy::check(Requirement::Administrator, &Identity::from("maker"), &dir, &gate).is_allowed());
    }

    #[test]
    fn test_check_role_carries_sequence_id() {
        let gate = AdminGate::new(Identity::from("admin"));
        let decision = AccessPolicy::check(
            Requirement::Role(RoleKind::RawMaterialSupplier),
            &Identity::from("supplier"),
            &directory(),
            &gate,
        );
        assert_eq!(decision.into_result().unwrap(), Some(SequenceId(1)));
    }
}
