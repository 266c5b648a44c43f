use super::Event;
use crate::config::{Config, StratumKey, TableSource};
use crate::cost::CostCategory;
use crate::econ::discount;
use crate::error::Result;
use crate::person::types::{Hcv, Hiv, InfectionType, LinkageState, ScreeningTest, ScreeningType};
use crate::person::Person;
use crate::sampler::Sampler;
use std::sync::Arc;

fn prefix(it: InfectionType) -> &'static str {
    match it {
        InfectionType::Hcv => "hcv_screening",
        InfectionType::Hiv => "hiv_screening",
    }
}

fn table_name(it: InfectionType, suffix: &str) -> String {
    format!("{}_{}", prefix(it), suffix)
}

/// Shared background/intervention screening cascade for HCV and HIV: an
/// acceptance draw, then antibody and (if positive) RNA tests.
pub struct Screening {
    tables: Arc<dyn TableSource>,
    infection_type: InfectionType,
    discount_rate: f64,
    intervention_type: String,
    period: i64,
    ab_sensitivity: f64,
    ab_specificity: f64,
    ab_cost: f64,
    rna_sensitivity: f64,
    rna_specificity: f64,
    rna_cost: f64,
}

impl Screening {
    pub fn new(config: &Config, tables: Arc<dyn TableSource>, infection_type: InfectionType) -> Result<Self> {
        tracing::debug!(event = "Screening", "tables resolved");
        let p = prefix(infection_type);
        Ok(Self {
            tables,
            infection_type,
            discount_rate: config.get_f64("cost.discounting_rate")?,
            intervention_type: config
                .get_str(&format!("{p}.intervention_type"))
                .unwrap_or("periodic")
                .to_string(),
            period: config.get_i64(&format!("{p}.period")).unwrap_or(12),
            ab_sensitivity: config.get_f64_or(&format!("{p}.ab_sensitivity"), 1.0),
            ab_specificity: config.get_f64_or(&format!("{p}.ab_specificity"), 1.0),
            ab_cost: config.get_f64_or(&format!("{p}.ab_cost"), 0.0),
            rna_sensitivity: config.get_f64_or(&format!("{p}.rna_sensitivity"), 1.0),
            rna_specificity: config.get_f64_or(&format!("{p}.rna_specificity"), 1.0),
            rna_cost: config.get_f64_or(&format!("{p}.rna_cost"), 0.0),
        })
    }

    fn truly_infected(&self, person: &Person) -> bool {
        match self.infection_type {
            InfectionType::Hcv => person.hcv.hcv != Hcv::None,
            InfectionType::Hiv => person.hiv.hiv != Hiv::None,
        }
    }

    fn charge(&self, person: &mut Person, cost: f64) {
        let discounted = discount(cost, self.discount_rate, person.current_timestep as f64);
        person.add_cost(cost, discounted, CostCategory::Screening);
    }
}

impl Event for Screening {
    fn name(&self) -> &'static str {
        match self.infection_type {
            InfectionType::Hcv => "HCVScreening",
            InfectionType::Hiv => "HIVScreening",
        }
    }

    fn execute(&self, person: &mut Person, sampler: &mut Sampler) -> Result<()> {
        if person.link_state(self.infection_type) == LinkageState::Linked {
            return Ok(());
        }

        let time_since_last = person.current_timestep - person.screening[&self.infection_type].time_last_screen;
        let use_intervention = match self.intervention_type.as_str() {
            "one-time" => person.current_timestep == 1,
            "periodic" => time_since_last >= self.period,
            _ => false,
        };
        let chosen_type = if use_intervention {
            ScreeningType::Intervention
        } else {
            ScreeningType::Background
        };
        let stratum_table = if use_intervention {
            table_name(self.infection_type, "intervention")
        } else {
            table_name(self.infection_type, "background")
        };

        let key = StratumKey {
            age_years: person.age_years(),
            sex: person.sex,
            behavior: person.behavior.behavior,
            moud_current: false,
            fibrosis: None,
        };
        let acceptance = self
            .tables
            .lookup(&stratum_table, &key)
            .map(|row| row.first().copied().unwrap_or(0.0))
            .unwrap_or(0.0);
        if !sampler.get_bool(acceptance)? {
            return Ok(());
        }

        let infected = self.truly_infected(person);

        person.screen(self.infection_type, ScreeningTest::Antibody, chosen_type);
        self.charge(person, self.ab_cost);
        let ab_positive_probability = if infected {
            self.ab_sensitivity
        } else {
            1.0 - self.ab_specificity
        };
        if !sampler.get_bool(ab_positive_probability)? {
            if infected {
                person.add_false_negative(self.infection_type);
            }
            return Ok(());
        }

        person.screen(self.infection_type, ScreeningTest::Rna, chosen_type);
        self.charge(person, self.rna_cost);
        let rna_positive_probability = if infected {
            self.rna_sensitivity
        } else {
            1.0 - self.rna_specificity
        };
        if sampler.get_bool(rna_positive_probability)? {
            person.diagnose(self.infection_type);
        } else if infected {
            person.add_false_negative(self.infection_type);
        }
        Ok(())
    }
}
