//! The `Event` trait (C6) and the fixed pipeline of concrete events.
//!
//! Every event is constructed once, against a [`crate::config::Config`] and
//! a [`crate::config::TableSource`], before the run starts; `execute` does
//! no I/O and is the only method called per-Person per-timestep. Events
//! hold no reference to any `Person` between calls (§9, Ownership graph).

mod aging;
mod behavior_changes;
mod clearance;
mod death;
mod fibrosis_progression;
mod fibrosis_staging;
mod hcc_progression;
mod hcv_infection;
mod hiv_infection;
mod linking;
mod moud;
mod overdose;
mod pregnancy;
mod screening;
mod treatment_hcv;
mod treatment_hiv;
mod voluntary_relinking;

pub use aging::Aging;
pub use behavior_changes::BehaviorChanges;
pub use clearance::Clearance;
pub use death::Death;
pub use fibrosis_progression::FibrosisProgression;
pub use fibrosis_staging::FibrosisStaging;
pub use hcc_progression::HccProgression;
pub use hcv_infection::HcvInfection;
pub use hiv_infection::HivInfection;
pub use linking::Linking;
pub use moud::Moud;
pub use overdose::Overdose;
pub use pregnancy::Pregnancy;
pub use screening::Screening;
pub use treatment_hcv::TreatmentHcv;
pub use treatment_hiv::TreatmentHiv;
pub use voluntary_relinking::VoluntaryRelinking;

use crate::config::{Config, TableSource};
use crate::error::{HepceError, Result};
use crate::person::types::InfectionType;
use crate::person::Person;
use crate::sampler::Sampler;
use std::sync::Arc;

/// Shared by every event. Preconditions: `person.alive`; the Engine never
/// calls `execute` on a dead Person, so implementations may assume it.
pub trait Event: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(&self, person: &mut Person, sampler: &mut Sampler) -> Result<()>;
}

/// Builds the ordered event vector named by `simulation.events`. Unrecognized
/// names are a fatal [`HepceError::UnknownEvent`] (§7).
pub fn create_events(
    config: &Config,
    tables: Arc<dyn TableSource>,
) -> Result<Vec<Box<dyn Event>>> {
    let names = config.get_csv_list("simulation.events")?;
    let mut events: Vec<Box<dyn Event>> = Vec::with_capacity(names.len());
    for name in names {
        let event: Box<dyn Event> = match name.as_str() {
            "Aging" => Box::new(Aging::new(config, tables.clone())?),
            "BehaviorChanges" => Box::new(BehaviorChanges::new(config, tables.clone())?),
            "Clearance" => Box::new(Clearance::new(config)?),
            "Death" => Box::new(Death::new(config, tables.clone())?),
            "FibrosisProgression" => Box::new(FibrosisProgression::new(config, tables.clone())?),
            "FibrosisStaging" => Box::new(FibrosisStaging::new(config, tables.clone())?),
            "HCCProgression" => Box::new(HccProgression::new(config, tables.clone())?),
            "HCVInfection" => Box::new(HcvInfection::new(config, tables.clone())?),
            "HIVInfection" => Box::new(HivInfection::new(config, tables.clone())?),
            "HCVScreening" => Box::new(Screening::new(config, tables.clone(), InfectionType::Hcv)?),
            "HIVScreening" => Box::new(Screening::new(config, tables.clone(), InfectionType::Hiv)?),
            "HCVLinking" => Box::new(Linking::new(config, tables.clone(), InfectionType::Hcv)?),
            "HIVLinking" => Box::new(Linking::new(config, tables.clone(), InfectionType::Hiv)?),
            "Treatment" | "HCVTreatment" => Box::new(TreatmentHcv::new(config, tables.clone())?),
            "HIVTreatment" => Box::new(TreatmentHiv::new(config, tables.clone())?),
            "Overdose" => Box::new(Overdose::new(config, tables.clone())?),
            "MOUD" => Box::new(Moud::new(config, tables.clone())?),
            "Pregnancy" => Box::new(Pregnancy::new(config, tables.clone())?),
            "VoluntaryRelinking" => Box::new(VoluntaryRelinking::new(config)?),
            other => return Err(HepceError::UnknownEvent(other.to_string())),
        };
        events.push(event);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_event_name_is_fatal() {
        let mut config = Config::new();
        config.set("simulation.events", "Aging,NotARealEvent");
        let tables: Arc<dyn TableSource> = Arc::new(crate::config::InMemoryTables::new());
        let err = create_events(&config, tables).unwrap_err();
        assert!(matches!(err, HepceError::UnknownEvent(name) if name == "NotARealEvent"));
    }
}
