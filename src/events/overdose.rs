use super::Event;
use crate::config::{Config, TableSource};
use crate::error::Result;
use crate::person::Person;
use crate::sampler::Sampler;
use std::sync::Arc;

/// Active users only; draws an overdose probability stratified by
/// `(behavior, moud_state)`.
pub struct Overdose {
    tables: Arc<dyn TableSource>,
}

impl Overdose {
    pub fn new(_config: &Config, tables: Arc<dyn TableSource>) -> Result<Self> {
        tracing::debug!(event = "Overdose", "tables resolved");
        Ok(Self { tables })
    }
}

impl Event for Overdose {
    fn name(&self) -> &'static str {
        "Overdose"
    }

    fn execute(&self, person: &mut Person, sampler: &mut Sampler) -> Result<()> {
        if !person.behavior.behavior.is_active() {
            return Ok(());
        }
        let behavior = format!("{:?}", person.behavior.behavior);
        let moud = format!("{:?}", person.moud.moud);
        let probability = self
            .tables
            .lookup_by("overdoses", &[("behavior", &behavior), ("moud", &moud)])
            .map(|row| row.first().copied().unwrap_or(0.0))
            .unwrap_or(0.0);
        if sampler.get_bool(probability)? {
            person.toggle_overdose();
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
    fn inactive_users_never_overdose() {
        let event = Overdose::new(&Config::new(), Arc::new(InMemoryTables::new())).unwrap();
        let mut person = Person::new(1, Sex::Male, 300, Behavior::FormerInjection, false);
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert!(!person.overdose.currently_overdosing);
    }

    #[test]
    fn toggles_on_and_increments_count() {
        let mut tables = InMemoryTables::new();
        tables.insert("overdoses", &[("behavior", "Injection"), ("moud", "None")], vec![1.0]);
        let event = Overdose::new(&Config::new(), Arc::new(tables)).unwrap();
        let mut person = Person::new(1, Sex::Male, 300, Behavior::Injection, false);
        let mut sampler = Sampler::from_seed(1);
        event.execute(&mut person, &mut sampler).unwrap();
        assert!(person.overdose.currently_overdosing);
        assert_eq!(person.overdose.cumulative_count, 1);
    }
}
