//! Current and lifetime quality-adjusted-life-year tracking (C3).

use crate::econ::discount;
use crate::error::{HepceError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UtilityCategory {
    Behavior,
    Liver,
    Treatment,
    Background,
    Hiv,
    Moud,
    Overdose,
}

impl UtilityCategory {
    pub fn all() -> [UtilityCategory; 7] {
        use UtilityCategory::*;
        [Behavior, Liver, Treatment, Background, Hiv, Moud, Overdose]
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TotalUtility {
    pub min_util: f64,
    pub mult_util: f64,
    pub discount_min_util: f64,
    pub discount_mult_util: f64,
}

/// Tracks current per-category utility (default 1.0) and the lifetime
/// min-aggregated and product-aggregated QALY sums, nominal and
/// discounted, so downstream cost-effectiveness analyses may choose either
/// combining convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilityAccumulator {
    current: HashMap<UtilityCategory, f64>,
    total: TotalUtility,
}

impl UtilityAccumulator {
    pub fn new() -> Self {
        let mut current = HashMap::new();
        for category in UtilityCategory::all() {
            current.insert(category, 1.0);
        }
        Self {
            current,
            total: TotalUtility::default(),
        }
    }

    pub fn set_utility(&mut self, value: f64, category: UtilityCategory) -> Result<()> {
        if !(0.0..=1.0).contains(&value) {
            return Err(HepceError::InvalidUtility {
                value,
                category: format!("{category:?}"),
            });
        }
        self.current.insert(category, value);
        Ok(())
    }

    /// Adds the minimum and the product over current categories to the
    /// lifetime totals, nominal and discounted at `discount_rate` for
    /// `months` months elapsed.
    pub fn accumulate_total_utility(&mut self, discount_rate: f64, months: f64) {
        let min_util = self
            .current
            .values()
            .cloned()
            .fold(f64::INFINITY, f64::min);
        let mult_util: f64 = self.current.values().product();

        self.total.min_util += min_util;
        self.total.mult_util += mult_util;
        self.total.discount_min_util += discount(min_util, discount_rate, months);
        self.total.discount_mult_util += discount(mult_util, discount_rate, months);
    }

    pub fn get_utilities(&self) -> &HashMap<UtilityCategory, f64> {
        &self.current
    }

    pub fn get_utility(&self, category: UtilityCategory) -> f64 {
        *self.current.get(&category).unwrap_or(&1.0)
    }

    pub fn get_total_utility(&self) -> TotalUtility {
        self.total
    }

    /// Overwrites the lifetime totals wholesale. Used only by the
    /// population-snapshot loader to restore a Person mid-simulation; the
    /// per-category `current` values are not part of the snapshot schema
    /// and are left at their fresh defaults.
    pub fn restore_total_utility(&mut self, total: TotalUtility) {
        self.total = total;
    }
}

impl Default for UtilityAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_one_for_every_category() {
        let acc = UtilityAccumulator::new();
        for category in UtilityCategory::all() {
            assert_eq!(acc.get_utility(category), 1.0);
        }
    }

    #[test]
    fn set_utility_rejects_out_of_range() {
        let mut acc = UtilityAccumulator::new();
        let err = acc.set_utility(1.5, UtilityCategory::Liver).unwrap_err();
        assert!(matches!(err, HepceError::InvalidUtility { .. }));
        // rejected value must not overwrite current
        assert_eq!(acc.get_utility(UtilityCategory::Liver), 1.0);
    }

    #[test]
    fn accumulate_total_utility_tracks_min_and_product() {
        let mut acc = UtilityAccumulator::new();
        acc.set_utility(0.5, UtilityCategory::Liver).unwrap();
        acc.set_utility(0.8, UtilityCategory::Behavior).unwrap();
        acc.accumulate_total_utility(0.0, 1.0);
        let total = acc.get_total_utility();
        assert!((total.min_util - 0.5).abs() < 1e-9);
        // product of the two set categories (0.5, 0.8) times five remaining 1.0s
        assert!((total.mult_util - 0.4).abs() < 1e-9);
    }

    #[test]
    fn discounted_totals_shrink_over_time() {
        let mut acc = UtilityAccumulator::new();
        acc.accumulate_total_utility(0.03, 0.0);
        let immediate = acc.get_total_utility().discount_min_util;
        let mut acc2 = UtilityAccumulator::new();
        acc2.accumulate_total_utility(0.03, 120.0);
        let later = acc2.get_total_utility().discount_min_util;
        assert!(later < immediate);
    }
}
