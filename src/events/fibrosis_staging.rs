use super::Event;
use crate::config::{Config, TableSource};
use crate::cost::CostCategory;
use crate::econ::discount;
use crate::error::Result;
use crate::person::types::{FibrosisState, MeasuredFibrosisState};
use crate::person::Person;
use crate::sampler::Sampler;
use std::sync::Arc;

const ORDER: [MeasuredFibrosisState; 5] = [
    MeasuredFibrosisState::None,
    MeasuredFibrosisState::F01,
    MeasuredFibrosisState::F23,
    MeasuredFibrosisState::F4,
    MeasuredFibrosisState::Decomp,
];

fn draw_result(
    tables: &dyn TableSource,
    table: &str,
    true_state: FibrosisState,
    sampler: &mut Sampler,
) -> Result<Option<MeasuredFibrosisState>> {
    let key = format!("{true_state:?}");
    let row = match tables.lookup_by(table, &[("fibrosis", &key)]) {
        Ok(row) => row,
        Err(_) => return Ok(None),
    };
    let decision = sampler.get_decision(&row)?;
    Ok(ORDER.get(decision).copied())
}

/// Runs at most once every `fibrosis_staging.period` months. Diagnoses a
/// possibly-noisy `MeasuredFibrosisState`, optionally confirmed by a second
/// test, combined per `multitest_result_method`.
pub struct FibrosisStaging {
    tables: Arc<dyn TableSource>,
    discount_rate: f64,
    period: i64,
    test_one_cost: f64,
    test_two_cost: f64,
    test_two_enabled: bool,
    test_two_eligible: Vec<String>,
    multitest_result_method: String,
}

impl FibrosisStaging {
    pub fn new(config: &Config, tables: Arc<dyn TableSource>) -> Result<Self> {
        tracing::debug!(event = "FibrosisStaging", "tables resolved");
        Ok(Self {
            tables,
            discount_rate: config.get_f64("cost.discounting_rate")?,
            period: config.get_i64("fibrosis_staging.period")?,
            test_one_cost: config.get_f64_or("fibrosis_staging.test_one_cost", 0.0),
            test_two_cost: config.get_f64_or("fibrosis_staging.test_two_cost", 0.0),
            test_two_enabled: config.get_bool("fibrosis_staging.test_two_enabled").unwrap_or(false),
            test_two_eligible: config
                .get_csv_list("fibrosis_staging.test_two_eligible_states")
                .unwrap_or_default(),
            multitest_result_method: config
                .get_str("fibrosis_staging.multitest_result_method")
                .unwrap_or("latest")
                .to_string(),
        })
    }

    fn charge(&self, person: &mut Person, cost: f64) {
        let discounted = discount(cost, self.discount_rate, person.current_timestep as f64);
        person.add_cost(cost, discounted, CostCategory::Staging);
    }
}

impl Event for FibrosisStaging {
    fn name(&self) -> &'static str {
        "FibrosisStaging"
    }

    fn execute(&self, person: &mut Person, sampler: &mut Sampler) -> Result<()> {
        if person.hcv.fibrosis_state == FibrosisState::None {
            return Ok(());
        }
        let since_last = person.current_timestep - person.staging.time_of_last_staging;
        if person.staging.time_of_last_staging >= 0 && since_last < self.period {
            return Ok(());
        }

        let true_state = person.hcv.fibrosis_state;
        let result_one =
            match draw_result(self.tables.as_ref(), "fibrosis_staging_test_one", true_state, sampler)? {
                Some(r) => r,
                None => return Ok(()),
            };
        person.diagnose_fibrosis(result_one);
        self.charge(person, self.test_one_cost);

        let eligible = self
            .test_two_eligible
            .iter()
            .any(|s| s == &format!("{result_one:?}"));
        if !self.test_two_enabled || !eligible {
            return Ok(());
        }

        let result_two =
            match draw_result(self.tables.as_ref(), "fibrosis_staging_test_two", true_state, sampler)? {
                Some(r) => r,
                None => return Ok(()),
            };
        self.charge(person, self.test_two_cost);
        person.staging.had_second_test = true;

        let combined = match self.multitest_result_method.as_str() {
            "latest" => Some(result_two),
            "maximum" => Some(result_one.max(result_two)),
            other => {
                tracing::error!(method = other, "unrecognized multitest_result_method");
                None
            }
        };
        if let Some(state) = combined {
            person.diagnose_fibrosis(state);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InMemoryTables;
    use crate::person::types::{Behavior, Sex};

    fn config() -> Config {
        let mut c = Config::new();
        c.set("cost.discounting_rate", "0.0");
        c.set("fibrosis_staging.period", "12");
        c
    }

    #[test]
    fn noop_before_infection() {
        let event = FibrosisStaging::new(&config(), Arc::new(InMemoryTables::new())).unwrap();
        let mut person = Person::new(1, Sex::Male, 300, Behavior::Injection, false);
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.staging.measured_fibrosis_state, MeasuredFibrosisState::None);
    }

    #[test]
    fn diagnoses_from_test_one_and_skips_too_soon() {
        let mut tables = InMemoryTables::new();
        tables.insert("fibrosis_staging_test_one", &[("fibrosis", "F2")], vec![0.0, 0.0, 1.0, 0.0, 0.0]);
        let event = FibrosisStaging::new(&config(), Arc::new(tables)).unwrap();
        let mut person = Person::new(1, Sex::Male, 300, Behavior::Injection, false);
        person.hcv.fibrosis_state = FibrosisState::F2;
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.staging.measured_fibrosis_state, MeasuredFibrosisState::F23);

        // too soon for a second round
        let before = person.staging.time_of_last_staging;
        person.current_timestep += 1;
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.staging.time_of_last_staging, before);
    }

    #[test]
    fn maximum_method_takes_the_higher_of_two_results() {
        let mut tables = InMemoryTables::new();
        tables.insert("fibrosis_staging_test_one", &[("fibrosis", "F4")], vec![0.0, 1.0, 0.0, 0.0, 0.0]);
        tables.insert("fibrosis_staging_test_two", &[("fibrosis", "F4")], vec![0.0, 0.0, 0.0, 1.0, 0.0]);
        let mut cfg = config();
        cfg.set("fibrosis_staging.test_two_enabled", "true");
        cfg.set("fibrosis_staging.test_two_eligible_states", "F01,F23");
        cfg.set("fibrosis_staging.multitest_result_method", "maximum");
        let event = FibrosisStaging::new(&cfg, Arc::new(tables)).unwrap();
        let mut person = Person::new(1, Sex::Male, 300, Behavior::Injection, false);
        person.hcv.fibrosis_state = FibrosisState::F4;
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.staging.measured_fibrosis_state, MeasuredFibrosisState::F4);
        assert!(person.staging.had_second_test);
    }
}
