use super::Event;
use crate::config::{Config, TableSource};
use crate::cost::CostCategory;
use crate::econ::discount;
use crate::error::Result;
use crate::person::types::{Behavior, FibrosisState, InfectionType, LinkageState, PregnancyState};
use crate::person::Person;
use crate::sampler::Sampler;
use crate::utility::UtilityCategory;
use std::sync::Arc;

/// HCV direct-acting-antiviral course: initiation, toxicity, withdrawal,
/// completion, and SVR-driven salvage retreatment.
pub struct TreatmentHcv {
    tables: Arc<dyn TableSource>,
    discount_rate: f64,
    ltfu_probability: f64,
    treatment_initiation_probability: f64,
    allow_retreatment: bool,
    eligible_fibrosis_states: Vec<String>,
    ineligible_behaviors: Vec<String>,
    ineligible_pregnancy_states: Vec<String>,
    ineligible_time_former_threshold: i64,
    ineligible_time_since_linked: i64,
    treatment_cost: f64,
    retreatment_cost: f64,
}

impl TreatmentHcv {
    pub fn new(config: &Config, tables: Arc<dyn TableSource>) -> Result<Self> {
        tracing::debug!(event = "TreatmentHcv", "tables resolved");
        Ok(Self {
            tables,
            discount_rate: config.get_f64("cost.discounting_rate")?,
            ltfu_probability: config.get_f64_or("hcv_treatment.ltfu_probability", 0.0),
            treatment_initiation_probability: config
                .get_f64_or("hcv_treatment.treatment_initiation", 1.0),
            allow_retreatment: config.get_bool("hcv_treatment.allow_retreatment").unwrap_or(true),
            eligible_fibrosis_states: config
                .get_csv_list("hcv_treatment.eligible_fibrosis_states")
                .unwrap_or_default(),
            ineligible_behaviors: config
                .get_csv_list("hcv_treatment.ineligible_behaviors")
                .unwrap_or_default(),
            ineligible_pregnancy_states: config
                .get_csv_list("hcv_treatment.ineligible_pregnancy_states")
                .unwrap_or_default(),
            ineligible_time_former_threshold: config
                .get_i64("hcv_treatment.ineligible_time_former_threshold")
                .unwrap_or(0),
            ineligible_time_since_linked: config
                .get_i64("hcv_treatment.ineligible_time_since_linked")
                .unwrap_or(0),
            treatment_cost: config.get_f64_or("hcv_treatment.treatment_cost", 0.0),
            retreatment_cost: config.get_f64_or("hcv_treatment.retreatment_cost", 0.0),
        })
    }

    fn eligible(&self, person: &Person) -> bool {
        if !self.eligible_fibrosis_states.is_empty() {
            let state = format!("{:?}", person.hcv.fibrosis_state);
            if !self.eligible_fibrosis_states.iter().any(|s| s == &state) {
                return false;
            }
        }
        let behavior = format!("{:?}", person.behavior.behavior);
        if self.ineligible_behaviors.iter().any(|b| b == &behavior) {
            return false;
        }
        let pregnancy = format!("{:?}", person.pregnancy.state);
        if person.pregnancy.state != PregnancyState::NotApplicable
            && self.ineligible_pregnancy_states.iter().any(|s| s == &pregnancy)
        {
            return false;
        }
        if person.behavior.time_last_active >= 0
            && person.current_timestep - person.behavior.time_last_active
                < self.ineligible_time_former_threshold
        {
            return false;
        }
        let linkage = &person.linkage[&InfectionType::Hcv];
        if person.current_timestep - linkage.time_changed < self.ineligible_time_since_linked {
            return false;
        }
        true
    }

    fn course_key(&self, person: &Person) -> (String, String, String) {
        let details = &person.treatment[&InfectionType::Hcv];
        (
            details.in_salvage.to_string(),
            person.hcv.genotype_three.to_string(),
            (person.hcv.fibrosis_state == FibrosisState::Decomp).to_string(),
        )
    }

    fn lookup(&self, table: &str, key: &(String, String, String)) -> Option<Vec<f64>> {
        self.tables
            .lookup_by(
                table,
                &[
                    ("in_retreatment", &key.0),
                    ("genotype_three", &key.1),
                    ("cirrhotic", &key.2),
                ],
            )
            .ok()
    }

    fn charge(&self, person: &mut Person, cost: f64) {
        let discounted = discount(cost, self.discount_rate, person.current_timestep as f64);
        person.add_cost(cost, discounted, CostCategory::Treatment);
    }
}

impl Event for TreatmentHcv {
    fn name(&self) -> &'static str {
        "HCVTreatment"
    }

    fn execute(&self, person: &mut Person, sampler: &mut Sampler) -> Result<()> {
        if person.link_state(InfectionType::Hcv) != LinkageState::Linked {
            return Ok(());
        }
        let initiated = person.treatment[&InfectionType::Hcv].initiated;
        if !initiated && !self.eligible(person) {
            return Ok(());
        }
        if !self.allow_retreatment && person.treatment[&InfectionType::Hcv].completions > 0 {
            return Ok(());
        }

        if sampler.get_bool(self.ltfu_probability)? {
            person.end_treatment(InfectionType::Hcv);
            person.unlink(InfectionType::Hcv);
            let _ = person.set_utility(1.0, UtilityCategory::Treatment);
            return Ok(());
        }

        let details = &person.treatment[&InfectionType::Hcv];
        let retreating = details.completions > 0 || details.withdrawals > 0;
        let visit_cost = if retreating { self.retreatment_cost } else { self.treatment_cost };
        self.charge(person, visit_cost);

        if !initiated {
            if !sampler.get_bool(self.treatment_initiation_probability)? {
                return Ok(());
            }
            person.initiate_treatment(InfectionType::Hcv);
        }

        let key = self.course_key(person);
        if let Some(course) = self.lookup("hcv_treatment_course", &key) {
            let cost = course.first().copied().unwrap_or(0.0);
            let utility = course.get(1).copied().unwrap_or(1.0);
            self.charge(person, cost);
            let _ = person.set_utility(utility.clamp(0.0, 1.0), UtilityCategory::Treatment);
        }

        if let Some(tox) = self.lookup("hcv_treatment_toxicity", &key) {
            let probability = tox.first().copied().unwrap_or(0.0);
            if sampler.get_bool(probability)? {
                person.add_toxic_reaction(InfectionType::Hcv);
                self.charge(person, tox.get(1).copied().unwrap_or(0.0));
                let _ = person.set_utility(
                    tox.get(2).copied().unwrap_or(1.0).clamp(0.0, 1.0),
                    UtilityCategory::Treatment,
                );
            }
        }

        if let Some(withdrawal) = self.lookup("hcv_treatment_withdrawal", &key) {
            let probability = withdrawal.first().copied().unwrap_or(0.0);
            if sampler.get_bool(probability)? {
                person.add_withdrawal(InfectionType::Hcv);
                person.end_treatment(InfectionType::Hcv);
                person.unlink(InfectionType::Hcv);
                let _ = person.set_utility(1.0, UtilityCategory::Treatment);
                return Ok(());
            }
        }

        let duration = self
            .lookup("hcv_treatment_duration", &key)
            .and_then(|row| row.first().copied())
            .unwrap_or(f64::INFINITY);
        let time_initiated = person.treatment[&InfectionType::Hcv].time_initiated;
        let months_in_course = (person.current_timestep - time_initiated) as f64;
        if (months_in_course - duration).abs() < 0.5 {
            person.add_completed_treatment(InfectionType::Hcv);
            let svr_probability = self
                .lookup("hcv_treatment_svr", &key)
                .and_then(|row| row.first().copied())
                .unwrap_or(0.0);
            if sampler.get_bool(svr_probability)? {
                person.add_svr();
                person.clear_hcv(false);
                person.clear_diagnosis(InfectionType::Hcv);
                person.end_treatment(InfectionType::Hcv);
                person.unlink(InfectionType::Hcv);
                let _ = person.set_utility(1.0, UtilityCategory::Treatment);
            } else if !person.treatment[&InfectionType::Hcv].in_salvage {
                person.initiate_treatment(InfectionType::Hcv);
            } else {
                person.end_treatment(InfectionType::Hcv);
                person.unlink(InfectionType::Hcv);
                let _ = person.set_utility(1.0, UtilityCategory::Treatment);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InMemoryTables;
    use crate::person::types::Sex;

    fn config() -> Config {
        let mut c = Config::new();
        c.set("cost.discounting_rate", "0.0");
        c
    }

    fn linked_person() -> Person {
        let mut person = Person::new(1, Sex::Male, 300, Behavior::Injection, false);
        person.infect_hcv();
        person.link(InfectionType::Hcv);
        person
    }

    #[test]
    fn ltfu_unlinks_and_ends_treatment() {
        let mut cfg = config();
        cfg.set("hcv_treatment.ltfu_probability", "1.0");
        let event = TreatmentHcv::new(&cfg, Arc::new(InMemoryTables::new())).unwrap();
        let mut person = linked_person();
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.link_state(InfectionType::Hcv), LinkageState::Unlinked);
    }

    #[test]
    fn initiates_on_first_pass() {
        let cfg = config();
        let event = TreatmentHcv::new(&cfg, Arc::new(InMemoryTables::new())).unwrap();
        let mut person = linked_person();
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert!(person.treatment[&InfectionType::Hcv].initiated);
    }

    #[test]
    fn svr_clears_hcv_and_unlinks() {
        let mut tables = InMemoryTables::new();
        tables.insert(
            "hcv_treatment_duration",
            &[
                ("in_retreatment", "false"),
                ("genotype_three", "false"),
                ("cirrhotic", "false"),
            ],
            vec![0.0],
        );
        tables.insert(
            "hcv_treatment_svr",
            &[
                ("in_retreatment", "false"),
                ("genotype_three", "false"),
                ("cirrhotic", "false"),
            ],
            vec![1.0],
        );
        let cfg = config();
        let event = TreatmentHcv::new(&cfg, Arc::new(tables)).unwrap();
        let mut person = linked_person();
        person.initiate_treatment(InfectionType::Hcv);
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert_eq!(person.hcv.hcv, crate::person::types::Hcv::None);
        assert_eq!(person.hcv.svrs, 1);
        assert_eq!(person.link_state(InfectionType::Hcv), LinkageState::Unlinked);
    }
}
