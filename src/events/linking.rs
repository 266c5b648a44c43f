use super::Event;
use crate::config::{Config, TableSource};
use crate::cost::CostCategory;
use crate::econ::{discount, probability_to_rate, rate_to_probability};
use crate::error::Result;
use crate::person::types::{Hcv, Hiv, InfectionType, LinkageState, ScreeningType};
use crate::person::Person;
use crate::sampler::Sampler;
use std::sync::Arc;

fn prefix(it: InfectionType) -> &'static str {
    match it {
        InfectionType::Hcv => "hcv_linking",
        InfectionType::Hiv => "hiv_linking",
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Recency scaling applied to the base linkage probability when the
/// person's last screening happened within `recent_screen_cutoff` months.
fn scale_probability(scaling_type: &str, coefficient: f64, cutoff: f64, elapsed: f64, p: f64) -> f64 {
    let rate = probability_to_rate(p);
    let scaled_rate = match scaling_type {
        "multiplier" => rate * coefficient,
        "exponential" => rate * (-coefficient * (elapsed + 1.0)).exp(),
        "sigmoidal" => rate * sigmoid(coefficient * (cutoff - (elapsed + 1.0))),
        _ => rate,
    };
    rate_to_probability(scaled_rate)
}

/// Shared background/intervention linkage cascade for HCV and HIV.
pub struct Linking {
    tables: Arc<dyn TableSource>,
    infection_type: InfectionType,
    discount_rate: f64,
    scaling_type: String,
    scaling_coefficient: f64,
    recent_screen_cutoff: f64,
    false_positive_test_cost: f64,
    intervention_cost: f64,
    pregnancy_event_present: bool,
}

impl Linking {
    pub fn new(config: &Config, tables: Arc<dyn TableSource>, infection_type: InfectionType) -> Result<Self> {
        tracing::debug!(event = "Linking", "tables resolved");
        let p = prefix(infection_type);
        let pregnancy_event_present = config
            .get_csv_list("simulation.events")
            .map(|names| names.iter().any(|n| n == "Pregnancy"))
            .unwrap_or(false);
        Ok(Self {
            tables,
            infection_type,
            discount_rate: config.get_f64("cost.discounting_rate")?,
            scaling_type: config.get_str(&format!("{p}.scaling_type")).unwrap_or("multiplier").to_string(),
            scaling_coefficient: config.get_f64_or(&format!("{p}.scaling_coefficient"), 1.0),
            recent_screen_cutoff: config.get_f64_or(&format!("{p}.recent_screen_cutoff"), 0.0),
            false_positive_test_cost: config.get_f64_or(&format!("{p}.false_positive_test_cost"), 0.0),
            intervention_cost: config.get_f64_or(&format!("{p}.intervention_cost"), 0.0),
            pregnancy_event_present,
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
        person.add_cost(cost, discounted, CostCategory::Linking);
    }
}

impl Event for Linking {
    fn name(&self) -> &'static str {
        match self.infection_type {
            InfectionType::Hcv => "HCVLinking",
            InfectionType::Hiv => "HIVLinking",
        }
    }

    fn execute(&self, person: &mut Person, sampler: &mut Sampler) -> Result<()> {
        if person.link_state(self.infection_type) == LinkageState::Linked {
            return Ok(());
        }
        if !person.is_identified(self.infection_type) {
            return Ok(());
        }
        if !self.truly_infected(person) {
            person.false_positive(self.infection_type);
            self.charge(person, self.false_positive_test_cost);
            return Ok(());
        }

        let screen_details = &person.screening[&self.infection_type];
        let chosen_type = screen_details.identifying_screen_type;
        let table = format!(
            "{}_{}",
            prefix(self.infection_type),
            if chosen_type == ScreeningType::Intervention {
                "intervention"
            } else {
                "background"
            }
        );
        let pregnancy_col = if self.pregnancy_event_present {
            format!("{:?}", person.pregnancy.state)
        } else {
            "-1".to_string()
        };
        let age = person.age_years().to_string();
        let sex = format!("{:?}", person.sex);
        let behavior = format!("{:?}", person.behavior.behavior);
        let base = self
            .tables
            .lookup_by(
                &table,
                &[
                    ("age_years", &age),
                    ("sex", &sex),
                    ("behavior", &behavior),
                    ("pregnancy", &pregnancy_col),
                ],
            )
            .map(|row| row.first().copied().unwrap_or(0.0))
            .unwrap_or(0.0);

        let time_since_last_screen = (person.current_timestep - screen_details.time_last_screen) as f64;
        let probability = if time_since_last_screen <= self.recent_screen_cutoff {
            scale_probability(
                &self.scaling_type,
                self.scaling_coefficient,
                self.recent_screen_cutoff,
                time_since_last_screen,
                base,
            )
        } else {
            base
        };

        if sampler.get_bool(probability)? {
            person.link(self.infection_type);
            if chosen_type == ScreeningType::Intervention {
                self.charge(person, self.intervention_cost);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InMemoryTables;
    use crate::person::types::{Behavior, Sex};

    #[test]
    fn multiplier_scaling_matches_closed_form() {
        let p = 0.03;
        let scaled = scale_probability("multiplier", 0.5, 10.0, 5.0, p);
        let expected = rate_to_probability(probability_to_rate(p) * 0.5);
        assert!((scaled - expected).abs() < 1e-12);
        assert!((scaled - 0.015_11).abs() < 1e-4);
    }

    #[test]
    fn exponential_scaling_matches_closed_form() {
        let p = 0.03;
        let scaled = scale_probability("exponential", 1.0, 10.0, 5.0, p);
        assert!((scaled - 7.55e-5).abs() < 1e-6);
    }

    #[test]
    fn sigmoidal_scaling_matches_closed_form() {
        let p = 0.03;
        let scaled = scale_probability("sigmoidal", 3.0, 3.0, 1.0, p);
        assert!((scaled - 0.02860).abs() < 1e-4);
    }

    #[test]
    fn false_positive_charges_and_does_not_link() {
        let mut config = Config::new();
        config.set("cost.discounting_rate", "0.0");
        config.set("hcv_linking.false_positive_test_cost", "25.0");
        let event = Linking::new(&config, Arc::new(InMemoryTables::new()), InfectionType::Hcv).unwrap();
        let mut person = Person::new(1, Sex::Male, 300, Behavior::Injection, false);
        person.diagnose(InfectionType::Hcv); // identified but never truly infected
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.link_state(InfectionType::Hcv), LinkageState::Never);
        assert_eq!(
            person.cost_accumulator.get_category(CostCategory::Linking).nominal,
            25.0
        );
    }
}
