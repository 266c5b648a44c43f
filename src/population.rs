//! Initial cohort and population-snapshot construction (C8, §4.7).

use crate::config::Config;
use crate::error::{HepceError, Result};
use crate::output::OutputSchema;
use crate::person::types::{Behavior, FibrosisState, Hcv, LinkageState, PregnancyState, Sex};
use crate::person::Person;
use std::path::Path;
use std::str::FromStr;

/// Loads the starting population for a run, selecting between an initial
/// cohort and a population snapshot per `simulation.use_population_table`.
pub struct PopulationLoader;

impl PopulationLoader {
    pub fn load(config: &Config, input_dir: &Path, schema: OutputSchema) -> Result<Vec<Person>> {
        if config.get_bool("simulation.use_population_table").unwrap_or(false) {
            Self::load_snapshot(input_dir, schema)
        } else {
            Self::load_cohort(config, input_dir)
        }
    }

    /// Reads the first `simulation.population_size` rows of `init_cohort`
    /// and builds one Person per row. Assigns sequential ids starting at 1
    /// since the cohort table carries no id column of its own.
    fn load_cohort(config: &Config, input_dir: &Path) -> Result<Vec<Person>> {
        let size = config.get_i64("simulation.population_size").unwrap_or(0).max(0) as usize;
        let path = input_dir.join("init_cohort.csv");
        let mut reader = csv::Reader::from_path(&path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let mut people = Vec::with_capacity(size);
        for (i, record) in reader.records().enumerate() {
            if i >= size {
                break;
            }
            let record = record?;
            let row: std::collections::HashMap<&str, &str> = headers
                .iter()
                .map(String::as_str)
                .zip(record.iter())
                .collect();
            let get = |col: &str| -> Result<&str> {
                row.get(col).copied().ok_or_else(|| {
                    HepceError::PopulationRowInvalid(format!("init_cohort missing column {col}"))
                })
            };
            people.push(Person::from_cohort_row(
                (i + 1) as u64,
                get("age_months")?.parse().map_err(|_| {
                    HepceError::PopulationRowInvalid("age_months must be an integer".into())
                })?,
                Sex::from_str(get("sex")?)?,
                Behavior::from_str(get("behavior")?)?,
                get("time_last_active_drug_use")?.parse().map_err(|_| {
                    HepceError::PopulationRowInvalid(
                        "time_last_active_drug_use must be an integer".into(),
                    )
                })?,
                parse_bool(get("seropositive")?)?,
                parse_bool(get("genotype_three")?)?,
                FibrosisState::from_str(get("fibrosis_state")?)?,
                parse_bool(get("identified_as_hcv_positive")?)?,
                LinkageState::from_str(get("link_state")?)?,
                Hcv::from_str(get("hcv_status")?)?,
                PregnancyState::from_str(get("pregnancy_state")?)?,
            ));
        }
        Ok(people)
    }

    /// Reads a full `population` snapshot table — one row per Person, in
    /// the exact column order of `output::population_headers(schema)` —
    /// and reconstructs each Person for a restarted run (§8 round trip).
    fn load_snapshot(input_dir: &Path, schema: OutputSchema) -> Result<Vec<Person>> {
        let path = input_dir.join("population.csv");
        let mut reader = csv::Reader::from_path(&path)?;
        let mut people = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row: Vec<String> = record.iter().map(String::from).collect();
            people.push(Person::from_population_row(&row, schema)?);
        }
        Ok(people)
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(HepceError::PopulationRowInvalid(format!(
            "'{other}' is not a valid boolean"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("hepce_population_test_{name}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn load_cohort_builds_requested_count_and_stops_early() {
        let dir = scratch_dir("cohort");
        std::fs::write(
            dir.join("init_cohort.csv"),
            "age_months,sex,behavior,time_last_active_drug_use,seropositive,genotype_three,fibrosis_state,identified_as_hcv_positive,link_state,hcv_status,pregnancy_state\n\
             300,Male,Injection,-1,true,false,F1,true,Linked,Chronic,NotApplicable\n\
             360,Female,Never,-1,false,false,None,false,Never,None,None\n\
             240,Male,NonInjection,-1,false,false,None,false,Never,None,NotApplicable\n",
        )
        .unwrap();
        let mut config = Config::new();
        config.set("simulation.use_population_table", "false");
        config.set("simulation.population_size", "2");
        let people = PopulationLoader::load(&config, &dir, OutputSchema::default()).unwrap();
        assert_eq!(people.len(), 2);
        assert_eq!(people[0].hcv.hcv, Hcv::Chronic);
        assert_eq!(people[0].hcv.fibrosis_state, FibrosisState::F1);
        assert_eq!(people[1].sex, Sex::Female);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_snapshot_round_trips_a_written_population_row() {
        let dir = scratch_dir("snapshot");
        let schema = OutputSchema::default();
        let mut person = Person::new(9, Sex::Male, 300, Behavior::Injection, false);
        person.infect_hcv();
        person.link(crate::person::types::InfectionType::Hcv);
        let header = crate::output::population_headers(schema);
        let row = person.make_population_row(schema);
        let mut contents = header.join(",");
        contents.push('\n');
        contents.push_str(&row.join(","));
        contents.push('\n');
        std::fs::write(dir.join("population.csv"), contents).unwrap();

        let mut config = Config::new();
        config.set("simulation.use_population_table", "true");
        let people = PopulationLoader::load(&config, &dir, schema).unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].id, 9);
        assert_eq!(people[0].hcv.hcv, Hcv::Acute);
        std::fs::remove_dir_all(&dir).ok();
    }
}
