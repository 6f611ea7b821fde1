//! Supply chain ledger: participant registry and unit lifecycle engine.
//!
//! This crate is the authoritative record of who may hand a unit on, and of
//! who did. It tracks every unit through a fixed five-party chain (raw
//! material supplier, manufacturer, distributor, retailer, consumer) and
//! refuses any handoff made out of order or by the wrong party.
//!
//! # Overview
//!
//! - **IdentityRegistry**: maps an identity to at most one [`RoleKind`] and
//!   hands out per-role [`SequenceId`]s.
//! - **AdminGate** and **AccessPolicy** (from the `policy` crate): decide
//!   whether the caller may perform an [`Operation`].
//! - **UnitLedger**: the state machine. A [`Unit`] moves
//!   `Ordered → RawMaterialSupplied → Manufactured → Distributed → Retailed
//!   → Sold`, one step per successful call.
//! - **SupplyChain**: the three above, bootstrapped together.
//! - **JournaledChain**: a `SupplyChain` backed by a `storage::Journal`, so state
//!   survives restarts by replay.
//!
//! Every failure is reported before any state changes.
//!
//! # Example
//!
//! ```
//! use ledger::{Identity, RoleKind, Stage, SupplyChain};
//!
//! let admin = Identity::from("0xadmin");
//! let supplier = Identity::from("0xsupplier");
//!
//! let mut chain = SupplyChain::bootstrap(admin.clone());
//! chain.register(&admin, RoleKind::RawMaterialSupplier, supplier.clone(), "Lithium Co", "Atacama")?;
//!
//! let unit = chain.order(&Identity::from("0xbuyer"), "Cell-100", "LFP cell")?;
//! chain.supply_raw_material(&supplier, unit)?;
//!
//! assert_eq!(chain.show_stage(unit)?, Stage::RawMaterialSupplied);
//! # Ok::<(), ledger::Error>(())
//! ```

mod error;
mod journaled;
mod ledger;
mod operation;
mod provenance;
mod registry;
mod stage;
mod supply_chain;
mod unit;

pub use error::{Error, Result};
pub use journaled::JournaledChain;
pub use ledger::{Transition, UnitLedger};
pub use operation::{Operation, Outcome};
pub use provenance::{Provenance, ProvenanceStep};
pub use registry::{IdentityRegistry, Participant};
pub use stage::Stage;
pub use supply_chain::SupplyChain;
pub use unit::{Unit, UnitId, UnitSummary};

pub use policy::{Identity, RoleKind, SequenceId};
