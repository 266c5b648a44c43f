use super::Event;
use crate::config::{Config, TableSource};
use crate::cost::CostCategory;
use crate::econ::discount;
use crate::error::Result;
use crate::person::types::{Hiv, InfectionType, LinkageState};
use crate::person::Person;
use crate::sampler::Sampler;
use crate::utility::UtilityCategory;
use std::sync::Arc;

/// Same skeleton as [`super::TreatmentHcv`] without SVR/clearance: tracks
/// time on treatment to move CD4-suppression state instead.
pub struct TreatmentHiv {
    tables: Arc<dyn TableSource>,
    discount_rate: f64,
    ltfu_probability: f64,
    treatment_initiation_probability: f64,
    treatment_cost: f64,
    suppression_months: i64,
    restore_high_cd4_months: i64,
}

impl TreatmentHiv {
    pub fn new(config: &Config, tables: Arc<dyn TableSource>) -> Result<Self> {
        tracing::debug!(event = "TreatmentHiv", "tables resolved");
        Ok(Self {
            tables,
            discount_rate: config.get_f64("cost.discounting_rate")?,
            ltfu_probability: config.get_f64_or("hiv_treatment.ltfu_probability", 0.0),
            treatment_initiation_probability: config
                .get_f64_or("hiv_treatment.treatment_initiation", 1.0),
            treatment_cost: config.get_f64_or("hiv_treatment.treatment_cost", 0.0),
            suppression_months: config.get_i64("hiv_treatment.suppression_months").unwrap_or(6),
            restore_high_cd4_months: config
                .get_i64("hiv_treatment.restore_high_cd4_months")
                .unwrap_or(12),
        })
    }

    fn charge(&self, person: &mut Person, cost: f64) {
        let discounted = discount(cost, self.discount_rate, person.current_timestep as f64);
        person.add_cost(cost, discounted, CostCategory::Hiv);
    }

    fn set_treatment_utility(&self, person: &mut Person) {
        let on_treatment = person.treatment[&InfectionType::Hiv].initiated.to_string();
        let high_cd4 = (!person.hiv.hiv.is_low_cd4()).to_string();
        if let Ok(row) = self
            .tables
            .lookup_by("hiv_treatment_utility", &[("on_treatment", &on_treatment), ("high_cd4", &high_cd4)])
        {
            let utility = row.first().copied().unwrap_or(1.0);
            let _ = person.set_utility(utility.clamp(0.0, 1.0), UtilityCategory::Hiv);
        }
    }
}

impl Event for TreatmentHiv {
    fn name(&self) -> &'static str {
        "HIVTreatment"
    }

    fn execute(&self, person: &mut Person, sampler: &mut Sampler) -> Result<()> {
        if person.link_state(InfectionType::Hiv) != LinkageState::Linked {
            return Ok(());
        }
        let initiated = person.treatment[&InfectionType::Hiv].initiated;

        if sampler.get_bool(self.ltfu_probability)? {
            person.end_treatment(InfectionType::Hiv);
            person.unlink(InfectionType::Hiv);
            if person.hiv.hiv.is_suppressed() {
                person.set_hiv_state(person.hiv.hiv.unsuppress());
            }
            self.set_treatment_utility(person);
            return Ok(());
        }

        self.charge(person, self.treatment_cost);

        if !initiated {
            if !sampler.get_bool(self.treatment_initiation_probability)? {
                return Ok(());
            }
            person.initiate_treatment(InfectionType::Hiv);
        }
        self.set_treatment_utility(person);

        let time_initiated = person.treatment[&InfectionType::Hiv].time_initiated;
        let months_on_treatment = person.current_timestep - time_initiated;

        if !person.hiv.hiv.is_suppressed() && months_on_treatment >= self.suppression_months {
            person.set_hiv_state(person.hiv.hiv.suppress());
        }
        if person.hiv.hiv.is_low_cd4() && months_on_treatment >= self.restore_high_cd4_months {
            person.set_hiv_state(person.hiv.hiv.restore_high_cd4());
        }
        Ok(())
    }
}
