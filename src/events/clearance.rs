use super::Event;
use crate::config::Config;
use crate::econ::rate_to_probability;
use crate::error::Result;
use crate::person::types::Hcv;
use crate::person::Person;
use crate::sampler::Sampler;

/// Default: one sixth of `RateToProbability(0.25)`, representing that ~25%
/// of acute infections clear within the six-month acute window.
fn default_clearance_probability() -> f64 {
    rate_to_probability(0.25) / 6.0
}

pub struct Clearance {
    probability: f64,
}

impl Clearance {
    pub fn new(config: &Config) -> Result<Self> {
        tracing::debug!(event = "Clearance", "config resolved");
        Ok(Self {
            probability: config.get_f64_or("infection.clearance_prob", default_clearance_probability()),
        })
    }
}

impl Event for Clearance {
    fn name(&self) -> &'static str {
        "Clearance"
    }

    fn execute(&self, person: &mut Person, sampler: &mut Sampler) -> Result<()> {
        if person.hcv.hcv != Hcv::Acute {
            return Ok(());
        }
        if sampler.get_bool(self.probability)? {
            person.clear_hcv(true);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::types::{Behavior, Sex};

    #[test]
    fn noop_when_not_acute() {
        let config = Config::new();
        let event = Clearance::new(&config).unwrap();
        let mut person = Person::new(1, Sex::Male, 300, Behavior::Never, false);
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.hcv.hcv, Hcv::None);
    }

    #[test]
    fn clears_acute_infection_on_success() {
        let mut config = Config::new();
        config.set("infection.clearance_prob", "1.0");
        let event = Clearance::new(&config).unwrap();
        let mut person = Person::new(1, Sex::Female, 300, Behavior::Injection, false);
        person.infect_hcv();
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.hcv.hcv, Hcv::None);
        assert_eq!(person.hcv.times_acute_cleared, 1);
    }

    #[test]
    fn default_probability_matches_one_sixth_of_rate_to_probability() {
        let config = Config::new();
        let event = Clearance::new(&config).unwrap();
        let expected = rate_to_probability(0.25) / 6.0;
        assert!((event.probability - expected).abs() < 1e-12);
    }
}
