//! Identity and access policy for the supply chain ledger.
//!
//! Core principle: **every mutation names the role it requires, and the
//! policy decides it once.**

mod admin;
mod error;
mod identity;
mod policy;

pub use admin::{AdminGate, Handoff};
pub use error::{Error, Result};
pub use identity::{Identity, RoleDirectory, RoleKind, SequenceId};
pub use policy::{AccessPolicy, Decision, Requirement};
