use super::Event;
use crate::config::{Config, StratumKey, TableSource};
use crate::error::Result;
use crate::person::types::Hiv;
use crate::person::Person;
use crate::sampler::Sampler;
use std::sync::Arc;

/// Incidence draw for the uninfected, analogous to `HCVInfection` but
/// without a genotype or acute/chronic split: a new infection starts
/// unsuppressed at high CD4.
pub struct HivInfection {
    tables: Arc<dyn TableSource>,
}

impl HivInfection {
    pub fn new(_config: &Config, tables: Arc<dyn TableSource>) -> Result<Self> {
        tracing::debug!(event = "HivInfection", "tables resolved");
        Ok(Self { tables })
    }
}

impl Event for HivInfection {
    fn name(&self) -> &'static str {
        "HIVInfection"
    }

    fn execute(&self, person: &mut Person, sampler: &mut Sampler) -> Result<()> {
        if person.hiv.hiv != Hiv::None {
            return Ok(());
        }
        let key = StratumKey {
            age_years: person.age_years(),
            sex: person.sex,
            behavior: person.behavior.behavior,
            moud_current: false,
            fibrosis: None,
        };
        let probability = self
            .tables
            .lookup("hiv_incidence", &key)
            .map(|row| row.first().copied().unwrap_or(0.0))
            .unwrap_or(0.0);
        if sampler.get_bool(probability)? {
            person.set_hiv_state(Hiv::HighCd4Unsuppressed);
        }
        Ok(())
    }
}
