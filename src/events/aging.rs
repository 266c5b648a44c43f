use super::Event;
use crate::config::{Config, StratumKey, TableSource};
use crate::cost::CostCategory;
use crate::econ::discount;
use crate::error::Result;
use crate::person::Person;
use crate::sampler::Sampler;
use crate::utility::UtilityCategory;
use std::sync::Arc;

/// Advances the Person's clock, then charges the joined
/// `background_costs x background_utilities` row for their current
/// `(age_years, sex, behavior)`.
pub struct Aging {
    tables: Arc<dyn TableSource>,
    discount_rate: f64,
}

impl Aging {
    pub fn new(config: &Config, tables: Arc<dyn TableSource>) -> Result<Self> {
        tracing::debug!(event = "Aging", "tables resolved");
        Ok(Self {
            tables,
            discount_rate: config.get_f64("cost.discounting_rate")?,
        })
    }
}

impl Event for Aging {
    fn name(&self) -> &'static str {
        "Aging"
    }

    fn execute(&self, person: &mut Person, _sampler: &mut Sampler) -> Result<()> {
        person.grow();

        let key = StratumKey {
            age_years: person.age_years(),
            sex: person.sex,
            behavior: person.behavior.behavior,
            moud_current: false,
            fibrosis: None,
        };
        let row = match self.tables.lookup("background", &key) {
            Ok(row) => row,
            Err(_) => return Ok(()), // DataTableRowMissing: warn-and-default (logged by caller layer)
        };
        let cost = row.first().copied().unwrap_or(0.0);
        let utility = row.get(1).copied().unwrap_or(1.0);

        let discounted = discount(cost, self.discount_rate, person.current_timestep as f64);
        person.add_cost(cost, discounted, CostCategory::Background);
        let _ = person.set_utility(utility.clamp(0.0, 1.0), UtilityCategory::Background);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InMemoryTables;
    use crate::person::types::{Behavior, Sex};

    fn event_with_row(cost: f64, utility: f64) -> Aging {
        let mut tables = InMemoryTables::new();
        tables.insert(
            "background",
            &[("age_years", "25"), ("sex", "Female"), ("behavior", "Injection")],
            vec![cost, utility],
        );
        let mut config = Config::new();
        config.set("cost.discounting_rate", "0.03");
        Aging::new(&config, Arc::new(tables)).unwrap()
    }

    #[test]
    fn grow_happens_before_charging() {
        let event = event_with_row(100.0, 0.9);
        let mut person = Person::new(1, Sex::Female, 300, Behavior::Injection, false);
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.current_timestep, 1);
        assert_eq!(person.age, 301);
    }

    #[test]
    fn charges_background_cost_and_utility() {
        let event = event_with_row(100.0, 0.9);
        let mut person = Person::new(1, Sex::Female, 300, Behavior::Injection, false);
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        let totals = person.cost_accumulator.get_category(CostCategory::Background);
        assert_eq!(totals.nominal, 100.0);
        assert!(totals.discounted < 100.0);
        assert_eq!(
            person.utility_accumulator.get_utility(UtilityCategory::Background),
            0.9
        );
    }

    #[test]
    fn missing_row_is_a_quiet_default() {
        let mut config = Config::new();
        config.set("cost.discounting_rate", "0.03");
        let event = Aging::new(&config, Arc::new(InMemoryTables::new())).unwrap();
        let mut person = Person::new(1, Sex::Male, 250, Behavior::Never, false);
        let mut sampler = Sampler::from_seed(1);
        assert!(event.execute(&mut person, &mut sampler).is_ok());
        assert_eq!(person.current_timestep, 1);
    }
}
