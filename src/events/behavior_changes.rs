use super::Event;
use crate::config::{Config, StratumKey, TableSource};
use crate::cost::CostCategory;
use crate::econ::discount;
use crate::error::Result;
use crate::person::types::Behavior;
use crate::person::Person;
use crate::sampler::Sampler;
use crate::utility::UtilityCategory;
use std::sync::Arc;

/// Order matches the table's five outgoing-probability columns; index 5
/// ("none of the above") is a no-op.
const ORDER: [Behavior; 5] = [
    Behavior::Never,
    Behavior::FormerNonInjection,
    Behavior::FormerInjection,
    Behavior::NonInjection,
    Behavior::Injection,
];

/// Draws a new behavior state from `behavior_transitions`, then charges the
/// `(sex, behavior)` cost/utility from `behavior_impacts`.
///
/// Standalone `Moud` is the canonical way to advance MOUD state in this
/// crate; this event does not also drive MOUD transitions (see DESIGN.md).
pub struct BehaviorChanges {
    tables: Arc<dyn TableSource>,
    discount_rate: f64,
}

impl BehaviorChanges {
    pub fn new(config: &Config, tables: Arc<dyn TableSource>) -> Result<Self> {
        tracing::debug!(event = "BehaviorChanges", "tables resolved");
        Ok(Self {
            tables,
            discount_rate: config.get_f64("cost.discounting_rate")?,
        })
    }
}

impl Event for BehaviorChanges {
    fn name(&self) -> &'static str {
        "BehaviorChanges"
    }

    fn execute(&self, person: &mut Person, sampler: &mut Sampler) -> Result<()> {
        let key = StratumKey {
            age_years: person.age_years(),
            sex: person.sex,
            behavior: person.behavior.behavior,
            moud_current: person.moud.moud == crate::person::types::Moud::Current,
            fibrosis: None,
        };
        let weights = match self.tables.lookup("behavior_transitions", &key) {
            Ok(row) => row,
            Err(_) => return Ok(()), // empty row: no-op + (caller-level) warning
        };

        let decision = sampler.get_decision(&weights)?;
        if decision < ORDER.len() {
            person.set_behavior(ORDER[decision]);
        }

        let impact_key = StratumKey {
            age_years: person.age_years(),
            sex: person.sex,
            behavior: person.behavior.behavior,
            moud_current: false,
            fibrosis: None,
        };
        if let Ok(impact) = self.tables.lookup("behavior_impacts", &impact_key) {
            let cost = impact.first().copied().unwrap_or(0.0);
            let utility = impact.get(1).copied().unwrap_or(1.0);
            let discounted = discount(cost, self.discount_rate, person.current_timestep as f64);
            person.add_cost(cost, discounted, CostCategory::Behavior);
            let _ = person.set_utility(utility.clamp(0.0, 1.0), UtilityCategory::Behavior);
        }
        Ok(())
    }
}
