use super::Event;
use crate::config::{Config, TableSource};
use crate::cost::CostCategory;
use crate::econ::discount;
use crate::error::Result;
use crate::person::types::{Hcv, InfectionType};
use crate::person::Person;
use crate::sampler::Sampler;
use crate::utility::UtilityCategory;
use std::sync::Arc;

/// Advances fibrosis one step on success, then charges a liver cost/utility
/// keyed by `(infected, fibrosis_state)`. Decomp is absorbing (enforced by
/// [`crate::person::types::FibrosisState::advance`]).
pub struct FibrosisProgression {
    tables: Arc<dyn TableSource>,
    discount_rate: f64,
    cost_only_if_identified: bool,
}

impl FibrosisProgression {
    pub fn new(config: &Config, tables: Arc<dyn TableSource>) -> Result<Self> {
        tracing::debug!(event = "FibrosisProgression", "tables resolved");
        Ok(Self {
            tables,
            discount_rate: config.get_f64("cost.discounting_rate")?,
            cost_only_if_identified: config
                .get_bool("fibrosis.add_cost_only_if_identified")
                .unwrap_or(false),
        })
    }
}

impl Event for FibrosisProgression {
    fn name(&self) -> &'static str {
        "FibrosisProgression"
    }

    fn execute(&self, person: &mut Person, sampler: &mut Sampler) -> Result<()> {
        if person.hcv.hcv == Hcv::None {
            return Ok(());
        }

        let state = format!("{:?}", person.hcv.fibrosis_state);
        if let Ok(row) = self
            .tables
            .lookup_by("fibrosis_progression", &[("fibrosis", &state)])
        {
            let probability = row.first().copied().unwrap_or(0.0);
            if sampler.get_bool(probability)? {
                person.set_fibrosis(person.hcv.fibrosis_state.advance());
            }
        }

        let infected = (person.hcv.hcv != Hcv::None).to_string();
        let new_state = format!("{:?}", person.hcv.fibrosis_state);
        if let Ok(impact) = self
            .tables
            .lookup_by("liver_impacts", &[("infected", &infected), ("fibrosis", &new_state)])
        {
            let cost = impact.first().copied().unwrap_or(0.0);
            let utility = impact.get(1).copied().unwrap_or(1.0);

            let charge_cost = !self.cost_only_if_identified || person.is_identified(InfectionType::Hcv);
            if charge_cost {
                let discounted = discount(cost, self.discount_rate, person.current_timestep as f64);
                person.add_cost(cost, discounted, CostCategory::Liver);
            }
            let _ = person.set_utility(utility.clamp(0.0, 1.0), UtilityCategory::Liver);
        }
        Ok(())
    }
}
