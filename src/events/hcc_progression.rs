use super::Event;
use crate::config::{Config, TableSource};
use crate::error::Result;
use crate::person::types::{FibrosisState, HccState};
use crate::person::Person;
use crate::sampler::Sampler;
use std::sync::Arc;

/// Applies only to F3/F4/Decomp fibrosis. Advances HCC state by at most one
/// step per timestep; a diagnosis may be drawn once the person reaches
/// `Late`.
pub struct HccProgression {
    tables: Arc<dyn TableSource>,
    diagnosis_probability: f64,
}

impl HccProgression {
    pub fn new(config: &Config, tables: Arc<dyn TableSource>) -> Result<Self> {
        tracing::debug!(event = "HccProgression", "tables resolved");
        Ok(Self {
            tables,
            diagnosis_probability: config.get_f64_or("hcc.diagnosis_prob", 0.0),
        })
    }
}

impl Event for HccProgression {
    fn name(&self) -> &'static str {
        "HCCProgression"
    }

    fn execute(&self, person: &mut Person, sampler: &mut Sampler) -> Result<()> {
        let eligible = matches!(
            person.hcv.fibrosis_state,
            FibrosisState::F3 | FibrosisState::F4 | FibrosisState::Decomp
        );
        if !eligible {
            return Ok(());
        }

        let key = format!("{:?}", person.hcv.fibrosis_state);
        if let Ok(row) = self.tables.lookup_by("hcc_progression", &[("fibrosis", &key)]) {
            let probability = row.first().copied().unwrap_or(0.0);
            if sampler.get_bool(probability)? {
                person.set_hcc(person.hcc.hcc.advance());
            }
        }

        if person.hcc.hcc == HccState::Late && !person.hcc.diagnosed {
            if sampler.get_bool(self.diagnosis_probability)? {
                person.diagnose_hcc();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InMemoryTables;
    use crate::person::types::{Behavior, Sex};

    #[test]
    fn noop_before_f3() {
        let config = Config::new();
        let event = HccProgression::new(&config, Arc::new(InMemoryTables::new())).unwrap();
        let mut person = Person::new(1, Sex::Male, 300, Behavior::Injection, false);
        person.hcv.fibrosis_state = FibrosisState::F2;
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.hcc.hcc, HccState::None);
    }

    #[test]
    fn advances_one_step_at_f4() {
        let mut tables = InMemoryTables::new();
        tables.insert("hcc_progression", &[("fibrosis", "F4")], vec![1.0]);
        let config = Config::new();
        let event = HccProgression::new(&config, Arc::new(tables)).unwrap();
        let mut person = Person::new(1, Sex::Male, 300, Behavior::Injection, false);
        person.hcv.fibrosis_state = FibrosisState::F4;
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.hcc.hcc, HccState::Early);
    }

    #[test]
    fn diagnoses_once_late() {
        let mut tables = InMemoryTables::new();
        tables.insert("hcc_progression", &[("fibrosis", "F4")], vec![1.0]);
        let mut config = Config::new();
        config.set("hcc.diagnosis_prob", "1.0");
        let event = HccProgression::new(&config, Arc::new(tables)).unwrap();
        let mut person = Person::new(1, Sex::Male, 300, Behavior::Injection, false);
        person.hcv.fibrosis_state = FibrosisState::F4;
        person.set_hcc(HccState::Late);
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert!(person.hcc.diagnosed);
    }
}
