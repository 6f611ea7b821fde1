//! Provenance reconstruction.

use crate::{IdentityRegistry, Participant, Stage, Transition, Unit};
use policy::RoleKind;
use serde::{Deserialize, Serialize};

/// One handoff in a unit's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceStep {
    /// Stage reached by this handoff.
    pub stage: Stage,
    pub role: RoleKind,
    /// Whether the unit has reached `stage`.
    pub reached: bool,
    /// The participant that performed the handoff.
    pub participant: Option<Participant>,
}

/// Full handoff chain of a unit: supplier, manufacturer, distributor,
/// retailer, sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub unit: Unit,
    pub current_stage: String,
    pub steps: Vec<ProvenanceStep>,
}

impl Provenance {
    pub(crate) fn build(unit: &Unit, registry: &IdentityRegistry) -> Self {
        let steps = Transition::ALL
            .into_iter()
            .map(|transition| {
                let role = transition.required_role();
                let stage = transition.to_stage();
                let reached = unit.stage >= stage;
                let participant = unit
                    .handler(role)
                    .filter(|_| reached)
                    .and_then(|sequence_id| registry.lookup(role, sequence_id))
                    .cloned();
                ProvenanceStep {
                    stage,
                    role,
                    reached,
                    participant,
                }
            })
            .collect();

        Self {
            unit: unit.clone(),
            current_stage: unit.stage.label().to_string(),
            steps,
        }
    }

    /// Steps that have already happened.
    pub fn completed(&self) -> impl Iterator<Item = &ProvenanceStep> {
        self.steps.iter().filter(|s| s.reached)
    }
}

#[cfg(test)]
mod tests {
    use crate::SupplyChain;
    use policy::{Identity, RoleKind};

    #[test]
    fn test_partial_chain() {
        let admin = Identity::from("admin");
        let mut chain = SupplyChain::bootstrap(admin.clone());
        chain
            .register(&admin, RoleKind::RawMaterialSupplier, "rms".into(), "Lithium Co", "Atacama")
            .unwrap();
        chain
            .register(&admin, RoleKind::Manufacturer, "man".into(), "Cell Works", "Shenzhen")
            .unwrap();
        let unit = chain.order(&"buyer".into(), "Cell-100", "").unwrap();
        chain.supply_raw_material(&"rms".into(), unit).unwrap();
        chain.manufacture(&"man".into(), unit).unwrap();

        let provenance = chain.provenance(unit).unwrap();
        assert_eq!(provenance.current_stage, "Manufacturing Stage");
        assert_eq!(provenance.steps.len(), 5);
        assert_eq!(provenance.completed().count(), 2);

        let supplier = provenance.steps[0].participant.as_ref().unwrap();
        assert_eq!(supplier.display_name, "Lithium Co");
        let maker = provenance.steps[1].participant.as_ref().unwrap();
        assert_eq!(maker.location, "Shenzhen");
        assert!(provenance.steps[2..].iter().all(|s| s.participant.is_none() && !s.reached));
    }

    #[test]
    fn test_sold_step_names_retailer() {
        let admin = Identity::from("admin");
        let mut chain = SupplyChain::bootstrap(admin.clone());
        for (role, who) in [
            (RoleKind::RawMaterialSupplier, "rms"),
            (RoleKind::Manufacturer, "man"),
            (RoleKind::Distributor, "dis"),
            (RoleKind::Retailer, "ret"),
        ] {
            chain.register(&admin, role, who.into(), who, "x").unwrap();
        }
        let unit = chain.order(&"buyer".into(), "Cell-100", "").unwrap();
        chain.supply_raw_material(&"rms".into(), unit).unwrap();
        chain.manufacture(&"man".into(), unit).unwrap();
        chain.distribute(&"dis".into(), unit).unwrap();
        chain.retail(&"ret".into(), unit).unwrap();
        chain.sell(&"ret".into(), unit).unwrap();

        let provenance = chain.provenance(unit).unwrap();
        assert_eq!(provenance.current_stage, "Unit Sold");
        assert_eq!(provenance.completed().count(), 5);
        let sold = provenance.steps.last().unwrap();
        assert_eq!(sold.participant.as_ref().unwrap().identity, Identity::from("ret"));
    }
}
