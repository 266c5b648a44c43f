use super::Event;
use crate::config::{Config, StratumKey, TableSource};
use crate::error::Result;
use crate::person::types::{DeathReason, FibrosisState, Hiv};
use crate::person::Person;
use crate::sampler::Sampler;
use std::sync::Arc;

const MAX_AGE_MONTHS: i64 = 1200;

pub struct Death {
    tables: Arc<dyn TableSource>,
    f4_infected: f64,
    f4_uninfected: f64,
    decomp_infected: f64,
    decomp_uninfected: f64,
    hiv_mortality: f64,
}

impl Death {
    pub fn new(config: &Config, tables: Arc<dyn TableSource>) -> Result<Self> {
        tracing::debug!(event = "Death", "tables resolved");
        Ok(Self {
            tables,
            f4_infected: config.get_f64("mortality.f4_infected")?,
            f4_uninfected: config.get_f64("mortality.f4_uninfected")?,
            decomp_infected: config.get_f64("mortality.decomp_infected")?,
            decomp_uninfected: config.get_f64("mortality.decomp_uninfected")?,
            hiv_mortality: config.get_f64_or("mortality.hiv", 0.0),
        })
    }

    fn fibrosis_probability(&self, person: &Person) -> f64 {
        let infected = person.hcv.hcv != crate::person::types::Hcv::None;
        match person.hcv.fibrosis_state {
            FibrosisState::F4 => {
                if infected {
                    self.f4_infected
                } else {
                    self.f4_uninfected
                }
            }
            FibrosisState::Decomp => {
                if infected {
                    self.decomp_infected
                } else {
                    self.decomp_uninfected
                }
            }
            _ => 0.0,
        }
    }

    fn overdose_probability(&self, person: &Person) -> f64 {
        if !person.overdose.currently_overdosing {
            return 0.0;
        }
        let moud = if person.moud.moud == crate::person::types::Moud::Current {
            "current"
        } else {
            "not_current"
        };
        let behavior = format!("{:?}", person.behavior.behavior);
        self.tables
            .lookup_by("overdoses", &[("moud", moud), ("behavior", &behavior)])
            .map(|row| row.first().copied().unwrap_or(0.0))
            .unwrap_or(0.0)
    }

    fn background_times_smr(&self, person: &Person) -> f64 {
        let key = StratumKey {
            age_years: person.age_years(),
            sex: person.sex,
            behavior: person.behavior.behavior,
            moud_current: false,
            fibrosis: None,
        };
        let background = self
            .tables
            .lookup("background_mortality", &key)
            .map(|row| row.first().copied().unwrap_or(0.0))
            .unwrap_or(0.0);
        let sex = format!("{:?}", person.sex);
        let smr = self
            .tables
            .lookup_by("smr", &[("sex", &sex)])
            .map(|row| row.first().copied().unwrap_or(1.0))
            .unwrap_or(1.0);
        background * smr
    }
}

impl Event for Death {
    fn name(&self) -> &'static str {
        "Death"
    }

    fn execute(&self, person: &mut Person, sampler: &mut Sampler) -> Result<()> {
        if person.age >= MAX_AGE_MONTHS {
            person.die(DeathReason::Age);
            return Ok(());
        }

        let background = self.background_times_smr(person);
        let fibrosis = self.fibrosis_probability(person);
        let hiv = if person.hiv.hiv != Hiv::None {
            self.hiv_mortality
        } else {
            0.0
        };
        let overdose = self.overdose_probability(person);

        let weights = vec![background, fibrosis, hiv, overdose];
        let decision = sampler.get_decision(&weights)?;
        match decision {
            0 => person.die(DeathReason::Background),
            1 => person.die(DeathReason::Liver),
            2 => person.die(DeathReason::Hiv),
            3 => person.die(DeathReason::Overdose),
            _ => {} // survives this timestep
        }
        Ok(())
    }
}
