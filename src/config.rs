//! External collaborator (C5): narrow, keyed access to configuration and
//! tabular inputs. This crate only specifies the interfaces; concrete
//! backends (JSON/key=value config files, CSV-backed tables) live here but
//! the event bodies in [`crate::events`] depend only on the traits.

use crate::error::{HepceError, Result};
use crate::person::types::{Behavior, FibrosisState, Sex};
use std::collections::HashMap;
use std::path::Path;

/// A flat, dotted-key configuration store (§6).
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Loads a flat JSON object of string keys to string/number/bool values.
    pub fn load_json(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let raw: serde_json::Value = serde_json::from_str(&text)?;
        let object = raw.as_object().ok_or_else(|| HepceError::ConfigInvalid {
            key: path.display().to_string(),
            reason: "expected a flat JSON object".to_string(),
        })?;
        let mut values = HashMap::new();
        for (key, value) in object {
            let as_string = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            values.insert(key.clone(), as_string);
        }
        Ok(Self { values })
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    fn require(&self, key: &str) -> Result<&str> {
        self.values
            .get(key)
            .map(|s| s.as_str())
            .ok_or_else(|| HepceError::ConfigMissing(key.to_string()))
    }

    pub fn get_str(&self, key: &str) -> Result<&str> {
        self.require(key)
    }

    pub fn get_f64(&self, key: &str) -> Result<f64> {
        let raw = self.require(key)?;
        raw.parse().map_err(|_| HepceError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("'{raw}' is not a valid number"),
        })
    }

    pub fn get_i64(&self, key: &str) -> Result<i64> {
        let raw = self.require(key)?;
        raw.parse().map_err(|_| HepceError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("'{raw}' is not a valid integer"),
        })
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        let raw = self.require(key)?;
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(HepceError::ConfigInvalid {
                key: key.to_string(),
                reason: format!("'{raw}' is not a valid boolean"),
            }),
        }
    }

    pub fn get_csv_list(&self, key: &str) -> Result<Vec<String>> {
        Ok(self
            .require(key)?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }

    pub fn get_f64_or(&self, key: &str, default: f64) -> f64 {
        self.get_f64(key).unwrap_or(default)
    }
}

/// Key used to look up a row in a stratified table. Not every field is
/// populated by every lookup; unused fields are simply ignored by the
/// implementing [`TableSource`].
#[derive(Debug, Clone, Copy)]
pub struct StratumKey {
    pub age_years: i64,
    pub sex: Sex,
    pub behavior: Behavior,
    pub moud_current: bool,
    pub fibrosis: Option<FibrosisState>,
}

/// Narrow interface over the tabular inputs of §6. Implementations must
/// support concurrent read-only access (§5) — in practice this means
/// "wraps an immutable map built once at construction."
pub trait TableSource: Send + Sync {
    /// Generic row lookup returning a vector of floats (probabilities,
    /// costs, or other numeric fields) in the column order the caller
    /// expects. Returns `DataTableRowMissing` if no row matches.
    fn lookup(&self, table: &str, key: &StratumKey) -> Result<Vec<f64>>;

    /// Lookup by an arbitrary set of named columns, used by tables keyed
    /// on fields [`StratumKey`] does not model (course keys, HCC stages,
    /// pregnancy gestation months, and so on).
    fn lookup_by(&self, table: &str, columns: &[(&str, &str)]) -> Result<Vec<f64>>;
}

/// An in-memory [`TableSource`] keyed by `(table, sorted "col=val" tuple)`.
/// This is the backend the crate's own tests and the CLI's CSV loader both
/// build against; it is not a database, just a narrow read-only map, per
/// §5's "DataSource is an external collaborator" framing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTables {
    rows: HashMap<String, Vec<f64>>,
}

impl InMemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: &str, columns: &[(&str, &str)], values: Vec<f64>) {
        self.rows.insert(Self::key(table, columns), values);
    }

    fn key(table: &str, columns: &[(&str, &str)]) -> String {
        let mut cols: Vec<String> = columns.iter().map(|(k, v)| format!("{k}={v}")).collect();
        cols.sort();
        format!("{table}|{}", cols.join(","))
    }

    fn stratum_columns(key: &StratumKey) -> Vec<(String, String)> {
        let mut cols = vec![
            ("age_years".to_string(), key.age_years.to_string()),
            ("sex".to_string(), format!("{:?}", key.sex)),
            ("behavior".to_string(), format!("{:?}", key.behavior)),
        ];
        if key.moud_current {
            cols.push(("moud".to_string(), "current".to_string()));
        }
        if let Some(f) = key.fibrosis {
            cols.push(("fibrosis".to_string(), format!("{f:?}")));
        }
        cols
    }
}

impl TableSource for InMemoryTables {
    fn lookup(&self, table: &str, key: &StratumKey) -> Result<Vec<f64>> {
        let owned = Self::stratum_columns(key);
        let refs: Vec<(&str, &str)> = owned.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        self.lookup_by(table, &refs)
    }

    fn lookup_by(&self, table: &str, columns: &[(&str, &str)]) -> Result<Vec<f64>> {
        self.rows
            .get(&Self::key(table, columns))
            .cloned()
            .ok_or_else(|| HepceError::DataTableRowMissing(Self::key(table, columns)))
    }
}

/// Column names treated as part of a row's key rather than a numeric
/// value when loading CSV tables. Every other column is parsed as `f64`
/// and appended to the row's value vector in file order.
const KEY_COLUMNS: &[&str] = &[
    "age_years",
    "sex",
    "behavior",
    "moud",
    "fibrosis",
    "gestation",
    "course",
    "in_retreatment",
    "genotype_three",
    "cirrhotic",
    "pregnancy",
    "infection_type",
];

impl InMemoryTables {
    /// Loads one table per `*.csv` file in `dir`, named after the file
    /// stem (§6's tabular input list; see also III.2 on event/table
    /// binding). A directory that does not exist yields an empty table
    /// set rather than an error — callers decide whether an absent table
    /// is fatal via `DataTableMissing`/`DataTableRowMissing` at lookup
    /// time (§7).
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut tables = Self::new();
        if !dir.is_dir() {
            return Ok(tables);
        }
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let table_name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let mut reader = csv::Reader::from_path(&path)?;
            let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
            for record in reader.records() {
                let record = record?;
                let mut key_cols: Vec<(String, String)> = Vec::new();
                let mut values: Vec<f64> = Vec::new();
                for (col, field) in headers.iter().zip(record.iter()) {
                    if KEY_COLUMNS.contains(&col.as_str()) {
                        key_cols.push((col.clone(), field.to_string()));
                    } else {
                        values.push(field.parse().unwrap_or(0.0));
                    }
                }
                let refs: Vec<(&str, &str)> =
                    key_cols.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
                tables.insert(&table_name, &refs, values);
            }
        }
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_missing_key_errors() {
        let cfg = Config::new();
        assert!(matches!(
            cfg.get_f64("simulation.seed"),
            Err(HepceError::ConfigMissing(_))
        ));
    }

    #[test]
    fn config_parses_typed_values() {
        let mut cfg = Config::new();
        cfg.set("simulation.seed", "42");
        cfg.set("linking.scaling_type", "multiplier");
        assert_eq!(cfg.get_i64("simulation.seed").unwrap(), 42);
        assert_eq!(cfg.get_str("linking.scaling_type").unwrap(), "multiplier");
    }

    #[test]
    fn config_invalid_number_is_reported() {
        let mut cfg = Config::new();
        cfg.set("cost.discounting_rate", "not-a-number");
        assert!(matches!(
            cfg.get_f64("cost.discounting_rate"),
            Err(HepceError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn in_memory_tables_round_trip_by_stratum() {
        let mut tables = InMemoryTables::new();
        let key = StratumKey {
            age_years: 30,
            sex: Sex::Female,
            behavior: Behavior::Injection,
            moud_current: false,
            fibrosis: None,
        };
        tables.insert(
            "incidence",
            &[("age_years", "30"), ("sex", "Female"), ("behavior", "Injection")],
            vec![0.01],
        );
        assert_eq!(tables.lookup("incidence", &key).unwrap(), vec![0.01]);
    }

    #[test]
    fn missing_row_is_reported() {
        let tables = InMemoryTables::new();
        let key = StratumKey {
            age_years: 99,
            sex: Sex::Male,
            behavior: Behavior::Never,
            moud_current: false,
            fibrosis: None,
        };
        assert!(matches!(
            tables.lookup("incidence", &key),
            Err(HepceError::DataTableRowMissing(_))
        ));
    }

    #[test]
    fn load_dir_parses_key_and_value_columns() {
        let dir = std::env::temp_dir().join(format!("hepce_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("hcv_incidence.csv"),
            "age_years,sex,behavior,probability\n30,Female,Injection,0.02\n",
        )
        .unwrap();
        let tables = InMemoryTables::load_dir(&dir).unwrap();
        let key = StratumKey {
            age_years: 30,
            sex: Sex::Female,
            behavior: Behavior::Injection,
            moud_current: false,
            fibrosis: None,
        };
        assert_eq!(tables.lookup("hcv_incidence", &key).unwrap(), vec![0.02]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_dir_on_missing_directory_is_empty_not_fatal() {
        let dir = std::env::temp_dir().join("hepce_test_does_not_exist_xyz");
        let tables = InMemoryTables::load_dir(&dir).unwrap();
        let key = StratumKey {
            age_years: 1,
            sex: Sex::Male,
            behavior: Behavior::Never,
            moud_current: false,
            fibrosis: None,
        };
        assert!(tables.lookup("anything", &key).is_err());
    }
}
