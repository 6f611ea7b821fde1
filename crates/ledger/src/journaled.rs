//! Journal-backed supply chain.

use crate::{Error, Operation, Outcome, Result, SupplyChain};
use policy::Identity;
use serde::{Deserialize, Serialize};
use storage::{Entry, Journal, NewEntry};
use tracing::{debug, info, warn};

const BOOTSTRAP_KIND: &str = "bootstrap";

#[derive(Debug, Serialize, Deserialize)]
struct BootstrapRecord {
    administrator: Identity,
}

/// A [`SupplyChain`] whose committed operations are appended to a journal.
///
/// An operation is journaled only after it has been fully validated and is
/// applied in memory only after the append succeeded, so neither side ever
/// holds a partial effect. Several handles may share one journal file: each
/// write first replays whatever other handles committed since this one last
/// looked, under the journal's write lock.
#[derive(Debug)]
pub struct JournaledChain {
    chain: SupplyChain,
    journal: Journal,
    /// Sequence of the last entry reflected in `chain`.
    last_sequence: u64,
}

impl JournaledChain {
    /// Bootstrap a fresh ledger into an empty journal.
    pub fn bootstrap(mut journal: Journal, deployer: Identity) -> Result<Self> {
        let record = BootstrapRecord {
            administrator: deployer.clone(),
        };
        let new_entry = NewEntry::encode(deployer.as_str(), BOOTSTRAP_KIND, &record)?;
        let (entry, ()) = journal.append_after(0, |existing| {
            if !existing.is_empty() {
                return Err(Error::AlreadyBootstrapped);
            }
            Ok((new_entry, ()))
        })?;
        info!(administrator = %deployer, "ledger bootstrapped");

        Ok(Self {
            chain: SupplyChain::bootstrap(deployer),
            journal,
            last_sequence: entry.sequence,
        })
    }

    /// Rebuild state by replaying every journaled entry in order.
    pub fn open(journal: Journal) -> Result<Self> {
        let entries = journal.load_all()?;
        let mut entries = entries.iter();

        let first = entries.next().ok_or(Error::NotBootstrapped)?;
        if first.kind != BOOTSTRAP_KIND {
            return Err(replay_error(first, "first entry is not a bootstrap"));
        }
        let record: BootstrapRecord = first
            .decode()
            .map_err(|e| replay_error(first, e.to_string()))?;
        let mut chain = SupplyChain::bootstrap(record.administrator);
        let mut last_sequence = first.sequence;

        let mut replayed = 0usize;
        for entry in entries {
            replay_entry(&mut chain, entry)?;
            last_sequence = entry.sequence;
            replayed += 1;
        }
        info!(replayed, units = chain.unit_count(), "journal replayed");

        Ok(Self {
            chain,
            journal,
            last_sequence,
        })
    }

    /// Catch up, validate, journal, then apply one operation.
    pub fn execute(&mut self, caller: &Identity, operation: Operation) -> Result<Outcome> {
        let Self {
            chain,
            journal,
            last_sequence,
        } = self;
        let new_entry = NewEntry::encode(caller.as_str(), operation.name(), &operation)?;

        let (entry, effect) = journal.append_after(*last_sequence, |newer| {
            for entry in newer {
                replay_entry(chain, entry)?;
                *last_sequence = entry.sequence;
            }
            let effect = chain.plan(caller, operation)?;
            Ok::<_, Error>((new_entry, effect))
        })?;
        *last_sequence = entry.sequence;
        chain.commit(effect)
    }

    /// Apply entries other handles committed since this one last looked.
    /// Returns how many were applied.
    pub fn refresh(&mut self) -> Result<usize> {
        let newer = self.journal.load_after(self.last_sequence)?;
        for entry in &newer {
            replay_entry(&mut self.chain, entry)?;
            self.last_sequence = entry.sequence;
        }
        if !newer.is_empty() {
            debug!(applied = newer.len(), last_sequence = self.last_sequence, "caught up");
        }
        Ok(newer.len())
    }

    /// Current in-memory state.
    pub fn chain(&self) -> &SupplyChain {
        &self.chain
    }

    /// Every journaled entry in commit order.
    pub fn history(&self) -> Result<Vec<Entry>> {
        Ok(self.journal.load_all()?)
    }

    /// Journaled entries of one kind in commit order.
    pub fn history_of(&self, kind: &str) -> Result<Vec<Entry>> {
        Ok(self.journal.load_kind(kind)?)
    }
}

fn replay_entry(chain: &mut SupplyChain, entry: &Entry) -> Result<()> {
    if entry.kind == BOOTSTRAP_KIND {
        return Err(replay_error(entry, "duplicate bootstrap"));
    }
    let operation: Operation = entry
        .decode()
        .map_err(|e| replay_error(entry, e.to_string()))?;
    let caller = Identity::new(entry.caller.clone());
    chain
        .execute(&caller, operation)
        .map_err(|e| replay_error(entry, e.to_string()))?;
    Ok(())
}

fn replay_error(entry: &Entry, reason: impl Into<String>) -> Error {
    let reason = reason.into();
    warn!(sequence = entry.sequence, kind = %entry.kind, %reason, "replay failed");
    Error::Replay {
        sequence: entry.sequence,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Stage, UnitId};
    use policy::{RoleKind, SequenceId};

    fn id(s: &str) -> Identity {
        Identity::from(s)
    }

    fn register(role: RoleKind, who: &str) -> Operation {
        Operation::Register {
            role,
            identity: id(who),
            display_name: who.to_uppercase(),
            location: "Somewhere".into(),
        }
    }

    #[test]
    fn test_failed_operation_is_not_journaled() {
        let mut chain = JournaledChain::bootstrap(Journal::in_memory().unwrap(), id("admin")).unwrap();
        let err = chain
            .execute(&id("mallory"), register(RoleKind::Retailer, "mallory"))
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
        assert_eq!(chain.history().unwrap().len(), 1);
    }

    #[test]
    fn test_bootstrap_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let first = Journal::open(&path).unwrap();
        let second = Journal::open(&path).unwrap();
        // Both handles saw an empty journal; only one bootstrap may land.
        JournaledChain::bootstrap(first, id("admin")).unwrap();
        let err = JournaledChain::bootstrap(second, id("other")).unwrap_err();
        assert!(matches!(err, Error::AlreadyBootstrapped));

        let chain = JournaledChain::open(Journal::open(&path).unwrap()).unwrap();
        assert_eq!(chain.chain().administrator(), &id("admin"));
        assert_eq!(chain.history().unwrap().len(), 1);
    }

    #[test]
    fn test_open_empty_journal_fails() {
        let err = JournaledChain::open(Journal::in_memory().unwrap()).unwrap_err();
        assert!(matches!(err, Error::NotBootstrapped));
    }

    #[test]
    fn test_replay_restores_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        {
            let mut chain = JournaledChain::bootstrap(Journal::open(&path).unwrap(), id("deployer")).unwrap();
            chain
                .execute(&id("deployer"), Operation::TransferAdministration { new_administrator: id("ops") })
                .unwrap();
            chain.execute(&id("ops"), register(RoleKind::RawMaterialSupplier, "rms")).unwrap();
            chain
                .execute(&id("buyer"), Operation::Order { name: "Cell-100".into(), description: "".into() })
                .unwrap();
            chain
                .execute(&id("rms"), Operation::SupplyRawMaterial { unit_id: UnitId(1) })
                .unwrap();
            // Rejected calls leave no trace for replay to trip over.
            let _ = chain.execute(&id("rms"), Operation::SupplyRawMaterial { unit_id: UnitId(1) });
        }

        let chain = JournaledChain::open(Journal::open(&path).unwrap()).unwrap();
        let state = chain.chain();
        assert_eq!(state.administrator(), &id("ops"));
        assert_eq!(state.count_by_role(RoleKind::RawMaterialSupplier), 1);
        assert_eq!(state.show_stage(UnitId(1)).unwrap(), Stage::RawMaterialSupplied);
        assert_eq!(chain.history().unwrap().len(), 5);
    }

    fn shared_ledger() -> (tempfile::TempDir, JournaledChain, JournaledChain) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let mut first = JournaledChain::bootstrap(Journal::open(&path).unwrap(), id("admin")).unwrap();
        first.execute(&id("admin"), register(RoleKind::RawMaterialSupplier, "rms1")).unwrap();
        first.execute(&id("admin"), register(RoleKind::RawMaterialSupplier, "rms2")).unwrap();
        first
            .execute(&id("buyer"), Operation::Order { name: "Cell-100".into(), description: "".into() })
            .unwrap();
        let second = JournaledChain::open(Journal::open(&path).unwrap()).unwrap();
        (dir, first, second)
    }

    #[test]
    fn test_second_handle_sees_committed_advance() {
        let (dir, mut first, mut second) = shared_ledger();

        first
            .execute(&id("rms1"), Operation::SupplyRawMaterial { unit_id: UnitId(1) })
            .unwrap();
        // The second handle still holds the Ordered snapshot in memory.
        assert_eq!(second.chain().show_stage(UnitId(1)).unwrap(), Stage::Ordered);

        let err = second
            .execute(&id("rms2"), Operation::SupplyRawMaterial { unit_id: UnitId(1) })
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidStageTransition {
                actual: Stage::RawMaterialSupplied,
                ..
            }
        ));
        assert_eq!(second.chain().show_stage(UnitId(1)).unwrap(), Stage::RawMaterialSupplied);

        let reopened = JournaledChain::open(Journal::open(dir.path().join("ledger.db")).unwrap()).unwrap();
        let unit = reopened.chain().unit(UnitId(1)).unwrap();
        assert_eq!(unit.raw_material_supplier_id, Some(SequenceId(1)));
        assert_eq!(reopened.history().unwrap().len(), 5);
    }

    #[test]
    fn test_interleaved_orders_get_distinct_ids() {
        let (dir, mut first, mut second) = shared_ledger();

        let a = first
            .execute(&id("x"), Operation::Order { name: "a".into(), description: "".into() })
            .unwrap();
        let b = second
            .execute(&id("y"), Operation::Order { name: "b".into(), description: "".into() })
            .unwrap();
        assert_eq!(a, Outcome::Ordered { unit_id: UnitId(2) });
        assert_eq!(b, Outcome::Ordered { unit_id: UnitId(3) });

        let reopened = JournaledChain::open(Journal::open(dir.path().join("ledger.db")).unwrap()).unwrap();
        assert_eq!(reopened.chain().unit_count(), 3);
        assert_eq!(reopened.chain().unit(UnitId(3)).unwrap().name, "b");
    }

    #[test]
    fn test_refresh_applies_other_handles_entries() {
        let (_dir, mut first, mut second) = shared_ledger();
        first
            .execute(&id("admin"), Operation::TransferAdministration { new_administrator: id("ops") })
            .unwrap();

        assert_eq!(second.refresh().unwrap(), 1);
        assert_eq!(second.chain().administrator(), &id("ops"));
        assert_eq!(second.refresh().unwrap(), 0);
    }

    #[test]
    fn test_history_of_filters_by_kind() {
        let (_dir, first, _second) = shared_ledger();
        let registrations = first.history_of("register").unwrap();
        assert_eq!(registrations.len(), 2);
        assert!(registrations.iter().all(|e| e.kind == "register"));
        assert_eq!(first.history_of(BOOTSTRAP_KIND).unwrap().len(), 1);
        assert!(first.history_of("sell").unwrap().is_empty());
    }

    #[test]
    fn test_replay_rejects_tampered_entry() {
        let journal = Journal::in_memory().unwrap();
        journal
            .append(&NewEntry::encode("admin", BOOTSTRAP_KIND, &BootstrapRecord { administrator: id("admin") }).unwrap())
            .unwrap();
        // A registration by a non-administrator can never have been committed.
        journal
            .append(&NewEntry::encode("mallory", "register", &register(RoleKind::Retailer, "mallory")).unwrap())
            .unwrap();

        let err = JournaledChain::open(journal).unwrap_err();
        assert!(matches!(err, Error::Replay { sequence: 2, .. }));
    }
}
