use super::Event;
use crate::config::{Config, TableSource};
use crate::error::Result;
use crate::person::Person;
use crate::sampler::Sampler;
use crate::utility::UtilityCategory;
use std::sync::Arc;

/// Advances `MOUDDetails` per a `(current_state, age, sex)` transition
/// table, independent of `BehaviorChanges`' own hook.
pub struct Moud {
    tables: Arc<dyn TableSource>,
}

impl Moud {
    pub fn new(_config: &Config, tables: Arc<dyn TableSource>) -> Result<Self> {
        tracing::debug!(event = "Moud", "tables resolved");
        Ok(Self { tables })
    }
}

impl Event for Moud {
    fn name(&self) -> &'static str {
        "MOUD"
    }

    fn execute(&self, person: &mut Person, sampler: &mut Sampler) -> Result<()> {
        let state = format!("{:?}", person.moud.moud);
        let age = person.age_years().to_string();
        let sex = format!("{:?}", person.sex);
        let probability = self
            .tables
            .lookup_by("moud_transitions", &[("moud", &state), ("age_years", &age), ("sex", &sex)])
            .map(|row| row.first().copied().unwrap_or(0.0))
            .unwrap_or(0.0);
        if sampler.get_bool(probability)? {
            person.transition_moud();
        }

        let new_state = format!("{:?}", person.moud.moud);
        if let Ok(row) = self
            .tables
            .lookup_by("moud_utility", &[("moud", &new_state), ("age_years", &age), ("sex", &sex)])
        {
            let utility = row.first().copied().unwrap_or(1.0);
            let _ = person.set_utility(utility.clamp(0.0, 1.0), UtilityCategory::Moud);
        }
        Ok(())
    }
}
