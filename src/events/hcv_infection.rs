use super::Event;
use crate::config::{Config, StratumKey, TableSource};
use crate::error::Result;
use crate::person::types::Hcv;
use crate::person::Person;
use crate::sampler::Sampler;
use std::sync::Arc;

const CHRONIC_AFTER_MONTHS: i64 = 6;

/// Incidence draw for the uninfected, genotype draw on new infection, and
/// the fixed acute-to-chronic transition at six months.
pub struct HcvInfection {
    tables: Arc<dyn TableSource>,
    genotype_three_probability: f64,
}

impl HcvInfection {
    pub fn new(config: &Config, tables: Arc<dyn TableSource>) -> Result<Self> {
        tracing::debug!(event = "HcvInfection", "tables resolved");
        Ok(Self {
            tables,
            genotype_three_probability: config.get_f64_or("infection.genotype_three_prob", 0.0),
        })
    }
}

impl Event for HcvInfection {
    fn name(&self) -> &'static str {
        "HCVInfection"
    }

    fn execute(&self, person: &mut Person, sampler: &mut Sampler) -> Result<()> {
        if person.hcv.hcv == Hcv::None {
            let key = StratumKey {
                age_years: person.age_years(),
                sex: person.sex,
                behavior: person.behavior.behavior,
                moud_current: false,
                fibrosis: None,
            };
            let probability = self
                .tables
                .lookup("hcv_incidence", &key)
                .map(|row| row.first().copied().unwrap_or(0.0))
                .unwrap_or(0.0);
            if sampler.get_bool(probability)? {
                person.infect_hcv();
                if sampler.get_bool(self.genotype_three_probability)? {
                    person.set_genotype_three(true);
                }
            }
            return Ok(());
        }

        if person.hcv.hcv == Hcv::Acute
            && person.current_timestep - person.hcv.time_changed >= CHRONIC_AFTER_MONTHS
        {
            person.progress_to_chronic();
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
    fn infects_on_successful_draw() {
        let mut tables = InMemoryTables::new();
        tables.insert(
            "hcv_incidence",
            &[("age_years", "25"), ("sex", "Male"), ("behavior", "Injection")],
            vec![1.0],
        );
        let mut config = Config::new();
        config.set("infection.genotype_three_prob", "1.0");
        let event = HcvInfection::new(&config, Arc::new(tables)).unwrap();
        let mut person = Person::new(1, Sex::Male, 300, Behavior::Injection, false);
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.hcv.hcv, Hcv::Acute);
        assert!(person.hcv.genotype_three);
    }

    #[test]
    fn becomes_chronic_after_six_months() {
        let config = Config::new();
        let event = HcvInfection::new(&config, Arc::new(InMemoryTables::new())).unwrap();
        let mut person = Person::new(1, Sex::Male, 300, Behavior::Injection, false);
        person.infect_hcv();
        let mut sampler = Sampler::from_seed(1);
        for _ in 0..6 {
            person.current_timestep += 1;
        }
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.hcv.hcv, Hcv::Chronic);
    }

    #[test]
    fn chronic_is_a_noop() {
        let config = Config::new();
        let event = HcvInfection::new(&config, Arc::new(InMemoryTables::new())).unwrap();
        let mut person = Person::new(1, Sex::Male, 300, Behavior::Injection, false);
        person.infect_hcv();
        person.progress_to_chronic();
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.hcv.hcv, Hcv::Chronic);
    }
}
