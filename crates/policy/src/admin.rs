//! Single-administrator gate for registry mutations.

use crate::{Error, Identity, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Holds the one identity allowed to register participants.
///
/// Only the current administrator may hand the role to someone else. No
/// history of prior administrators is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminGate {
    administrator: Identity,
}

impl AdminGate {
    /// Create a gate administered by the bootstrapping identity.
    pub fn new(administrator: Identity) -> Self {
        Self { administrator }
    }

    pub fn administrator(&self) -> &Identity {
        &self.administrator
    }

    pub fn is_administrator(&self, identity: &Identity) -> bool {
        self.administrator == *identity
    }

    /// Fail with `Unauthorized` unless `caller` is the administrator.
    pub fn require_administrator(&self, caller: &Identity) -> Result<()> {
        if self.is_administrator(caller) {
            Ok(())
        } else {
            Err(Error::Unauthorized(format!("{caller} is not the administrator")))
        }
    }

    /// Replace the administrator. Only the current administrator may do this.
    pub fn transfer_administration(&mut self, caller: &Identity, new_administrator: Identity) -> Result<()> {
        let handoff = self.plan_transfer(caller, new_administrator)?;
        self.apply(handoff)
    }

    /// Validate a transfer without applying it.
    pub fn plan_transfer(&self, caller: &Identity, new_administrator: Identity) -> Result<Handoff> {
        self.require_administrator(caller)?;
        Ok(Handoff {
            approved_by: caller.clone(),
            new_administrator,
        })
    }

    /// Apply a validated transfer.
    ///
    /// Fails with `Unauthorized` if its approver is no longer the
    /// administrator.
    pub fn apply(&mut self, handoff: Handoff) -> Result<()> {
        self.require_administrator(&handoff.approved_by)?;
        info!(from = %self.administrator, to = %handoff.new_administrator, "administration transferred");
        self.administrator = handoff.new_administrator;
        Ok(())
    }
}

/// A transfer of administration that has passed the gate.
///
/// Only [`AdminGate::plan_transfer`] can produce one, and it is consumed
/// when applied.
#[derive(Debug, PartialEq, Eq)]
pub struct Handoff {
    approved_by: Identity,
    new_administrator: Identity,
}

impl Handoff {
    pub fn approved_by(&self) -> &Identity {
        &self.approved_by
    }

    pub fn new_administrator(&self) -> &Identity {
        &self.new_administrator
    }
}
