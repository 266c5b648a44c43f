use super::Event;
use crate::config::{Config, StratumKey, TableSource};
use crate::error::Result;
use crate::person::types::{Child, Hcv, PregnancyState, Sex};
use crate::person::Person;
use crate::sampler::Sampler;
use std::sync::Arc;

const MIN_AGE_MONTHS: i64 = 15 * 12;
const MAX_AGE_MONTHS: i64 = 45 * 12;
const RESTRICTED_POSTPARTUM_MONTHS: i64 = 3;
const POSTPARTUM_YEAR_MONTHS: i64 = 12;
const TERM_GESTATION_MONTHS: i64 = 9;

/// Gestation, delivery, and postpartum state machine. Runs only for
/// females of reproductive age; every other precondition (restricted
/// postpartum duration, gestation length) comes from `PregnancyDetails`.
pub struct Pregnancy {
    tables: Arc<dyn TableSource>,
    multiple_delivery_probability: f64,
    vertical_hcv_transition_probability: f64,
    infant_hcv_tested_probability: f64,
}

impl Pregnancy {
    pub fn new(config: &Config, tables: Arc<dyn TableSource>) -> Result<Self> {
        tracing::debug!(event = "Pregnancy", "tables resolved");
        Ok(Self {
            tables,
            multiple_delivery_probability: config
                .get_f64_or("pregnancy.multiple_delivery_probability", 0.0),
            vertical_hcv_transition_probability: config
                .get_f64_or("pregnancy.vertical_hcv_transition_probability", 0.0),
            infant_hcv_tested_probability: config
                .get_f64_or("pregnancy.infant_hcv_tested_probability", 0.0),
        })
    }

    fn draw_child(&self, mother: &Person, sampler: &mut Sampler) -> Result<Child> {
        let infected = mother.hcv.hcv == Hcv::Chronic && sampler.get_bool(self.vertical_hcv_transition_probability)?;
        let tested = sampler.get_bool(self.infant_hcv_tested_probability)?;
        Ok(Child {
            hcv: if infected { Hcv::Acute } else { Hcv::None },
            tested,
        })
    }
}

impl Event for Pregnancy {
    fn name(&self) -> &'static str {
        "Pregnancy"
    }

    fn execute(&self, person: &mut Person, sampler: &mut Sampler) -> Result<()> {
        if person.sex != Sex::Female || person.age < MIN_AGE_MONTHS || person.age >= MAX_AGE_MONTHS {
            return Ok(());
        }

        let elapsed = person.time_in_pregnancy_state();
        match person.pregnancy.state {
            PregnancyState::RestrictedPostpartum if elapsed < RESTRICTED_POSTPARTUM_MONTHS => {
                return Ok(());
            }
            PregnancyState::YearTwoPostpartum if elapsed >= POSTPARTUM_YEAR_MONTHS => {
                person.end_postpartum();
                return Ok(());
            }
            PregnancyState::YearOnePostpartum if elapsed >= POSTPARTUM_YEAR_MONTHS => {
                person.set_pregnancy_state(PregnancyState::YearTwoPostpartum);
                return Ok(());
            }
            PregnancyState::RestrictedPostpartum if elapsed >= RESTRICTED_POSTPARTUM_MONTHS => {
                person.set_pregnancy_state(PregnancyState::YearOnePostpartum);
                return Ok(());
            }
            _ => {}
        }

        if person.pregnancy.state == PregnancyState::Pregnant {
            let gestation = elapsed.to_string();
            let miscarriage_probability = self
                .tables
                .lookup_by("pregnancy_miscarriage", &[("gestation", &gestation)])
                .map(|row| row.first().copied().unwrap_or(0.0))
                .unwrap_or(0.0);

            if elapsed < TERM_GESTATION_MONTHS {
                if sampler.get_bool(miscarriage_probability)? {
                    person.stillbirth();
                }
                return Ok(());
            }

            if sampler.get_bool(miscarriage_probability)? {
                person.stillbirth();
                return Ok(());
            }

            let twins = sampler.get_bool(self.multiple_delivery_probability)?;
            let count = if twins { 2 } else { 1 };
            for _ in 0..count {
                let child = self.draw_child(person, sampler)?;
                person.birth(child);
            }
            return Ok(());
        }

        if person.pregnancy.state == PregnancyState::None {
            let key = StratumKey {
                age_years: person.age_years(),
                sex: person.sex,
                behavior: person.behavior.behavior,
                moud_current: false,
                fibrosis: None,
            };
            let probability = self
                .tables
                .lookup("pregnancy_incidence", &key)
                .map(|row| row.first().copied().unwrap_or(0.0))
                .unwrap_or(0.0);
            if sampler.get_bool(probability)? {
                person.impregnate();
            }
        }
        Ok(())
    }
}
