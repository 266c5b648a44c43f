use super::Event;
use crate::config::Config;
use crate::error::Result;
use crate::person::types::{InfectionType, LinkageState};
use crate::person::Person;
use crate::sampler::Sampler;

/// For persons unlinked no longer than `linking.voluntary_relinkage_window`
/// months, draws against `linking.voluntary_relinkage_probability`.
/// Discontinued once the window has passed.
pub struct VoluntaryRelinking {
    window: i64,
    probability: f64,
}

impl VoluntaryRelinking {
    pub fn new(config: &Config) -> Result<Self> {
        tracing::debug!(event = "VoluntaryRelinking", "config resolved");
        Ok(Self {
            window: config.get_i64("linking.voluntary_relinkage_window").unwrap_or(0),
            probability: config.get_f64_or("linking.voluntary_relinkage_probability", 0.0),
        })
    }
}

impl Event for VoluntaryRelinking {
    fn name(&self) -> &'static str {
        "VoluntaryRelinking"
    }

    fn execute(&self, person: &mut Person, sampler: &mut Sampler) -> Result<()> {
        for it in InfectionType::all() {
            if person.link_state(it) != LinkageState::Unlinked {
                continue;
            }
            let elapsed = person.current_timestep - person.linkage[&it].time_changed;
            if elapsed > self.window {
                continue;
            }
            if sampler.get_bool(self.probability)? {
                person.link(it);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::types::{Behavior, Sex};

    #[test]
    fn relinks_within_window() {
        let mut config = Config::new();
        config.set("linking.voluntary_relinkage_window", "6");
        config.set("linking.voluntary_relinkage_probability", "1.0");
        let event = VoluntaryRelinking::new(&config).unwrap();
        let mut person = Person::new(1, Sex::Male, 300, Behavior::Injection, false);
        person.link(InfectionType::Hcv);
        person.unlink(InfectionType::Hcv);
        person.current_timestep = 3;
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.link_state(InfectionType::Hcv), LinkageState::Linked);
    }

    #[test]
    fn discontinued_after_window() {
        let mut config = Config::new();
        config.set("linking.voluntary_relinkage_window", "6");
        config.set("linking.voluntary_relinkage_probability", "1.0");
        let event = VoluntaryRelinking::new(&config).unwrap();
        let mut person = Person::new(1, Sex::Male, 300, Behavior::Injection, false);
        person.link(InfectionType::Hcv);
        person.unlink(InfectionType::Hcv);
        person.current_timestep = 10;
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.link_state(InfectionType::Hcv), LinkageState::Unlinked);
    }
}
