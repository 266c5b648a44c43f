//! Per-category running cost totals (C2).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostCategory {
    Misc,
    Behavior,
    Screening,
    Linking,
    Staging,
    Liver,
    Treatment,
    Background,
    Hiv,
}

impl CostCategory {
    pub fn all() -> [CostCategory; 9] {
        use CostCategory::*;
        [
            Misc, Behavior, Screening, Linking, Staging, Liver, Treatment, Background, Hiv,
        ]
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CostTotals {
    pub nominal: f64,
    pub discounted: f64,
}

/// Maintains `CostCategory -> (nominal_total, discounted_total)`, all
/// initialized to zero. A pure adder; callers compute discounting
/// themselves via [`crate::econ::discount`] before calling [`Self::add_cost`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostAccumulator {
    totals: HashMap<CostCategory, CostTotals>,
}

impl CostAccumulator {
    pub fn new() -> Self {
        let mut totals = HashMap::new();
        for category in CostCategory::all() {
            totals.insert(category, CostTotals::default());
        }
        Self { totals }
    }

    pub fn add_cost(&mut self, base: f64, discounted: f64, category: CostCategory) {
        let entry = self.totals.entry(category).or_default();
        entry.nominal += base;
        entry.discounted += discounted;
    }

    pub fn get_totals(&self) -> CostTotals {
        self.totals.values().fold(CostTotals::default(), |acc, t| CostTotals {
            nominal: acc.nominal + t.nominal,
            discounted: acc.discounted + t.discounted,
        })
    }

    pub fn get_costs(&self) -> &HashMap<CostCategory, CostTotals> {
        &self.totals
    }

    pub fn get_category(&self, category: CostCategory) -> CostTotals {
        self.totals.get(&category).copied().unwrap_or_default()
    }

    /// Restores an aggregate total under [`CostCategory::Misc`]. The
    /// population-snapshot schema carries only the grand total, not a
    /// per-category breakdown, so a restored Person's subsequent costs
    /// accrue on top of this bucket rather than the original categories.
    pub fn restore_totals(&mut self, totals: CostTotals) {
        self.totals.insert(CostCategory::Misc, totals);
    }
}

impl Default for CostAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
