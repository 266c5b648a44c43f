//! The simulated entity (C4): clinical, behavioral, screening, linkage,
//! treatment, and pregnancy substate, plus its cost/utility accumulators.
//!
//! `Person` exposes state only through getters and the semantically-named
//! mutators below; event bodies never write fields directly, so the
//! invariants of the data model (fibrosis monotonicity, absorbing death,
//! re-infection guards) live in one place.

pub mod types;

use crate::cost::{CostAccumulator, CostCategory};
use crate::error::Result;
use crate::utility::{UtilityAccumulator, UtilityCategory};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use types::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: u64,

    pub current_timestep: i64,
    pub age: i64,
    pub life_span: i64,
    pub discounted_life_span: f64,
    pub alive: bool,
    pub death_reason: DeathReason,

    pub sex: Sex,
    pub boomer: bool,

    pub behavior: BehaviorDetails,
    pub hcv: HcvDetails,
    pub hiv: HivDetails,
    pub hcc: HccDetails,
    pub overdose: OverdoseDetails,
    pub moud: MoudDetails,
    pub pregnancy: PregnancyDetails,
    pub staging: StagingDetails,

    pub linkage: HashMap<InfectionType, LinkageDetails>,
    pub screening: HashMap<InfectionType, ScreeningDetails>,
    pub treatment: HashMap<InfectionType, TreatmentDetails>,

    pub cost_accumulator: CostAccumulator,
    pub utility_accumulator: UtilityAccumulator,
}

impl Person {
    pub fn new(id: u64, sex: Sex, age: i64, behavior: Behavior, boomer: bool) -> Self {
        let mut linkage = HashMap::new();
        let mut screening = HashMap::new();
        let mut treatment = HashMap::new();
        for it in InfectionType::all() {
            linkage.insert(it, LinkageDetails::default());
            screening.insert(it, ScreeningDetails::default());
            treatment.insert(it, TreatmentDetails::default());
        }

        Self {
            id,
            current_timestep: 0,
            age,
            life_span: 0,
            discounted_life_span: 0.0,
            alive: true,
            death_reason: DeathReason::NotDead,
            sex,
            boomer,
            behavior: BehaviorDetails::new(behavior),
            hcv: HcvDetails::default(),
            hiv: HivDetails::default(),
            hcc: HccDetails::default(),
            overdose: OverdoseDetails::default(),
            moud: MoudDetails::default(),
            pregnancy: PregnancyDetails {
                state: if sex == Sex::Female {
                    PregnancyState::None
                } else {
                    PregnancyState::NotApplicable
                },
                ..Default::default()
            },
            staging: StagingDetails::default(),
            linkage,
            screening,
            treatment,
            cost_accumulator: CostAccumulator::new(),
            utility_accumulator: UtilityAccumulator::new(),
        }
    }

    pub fn age_years(&self) -> i64 {
        self.age / 12
    }

    // --- Clock -----------------------------------------------------------

    /// Advances the Person's local clock by one month. Increments
    /// `current_timestep`, `age`, and `life_span`; updates
    /// `time_last_active` while actively using; accrues MOUD/low-CD4 month
    /// counters; always increments the MOUD current-state counter.
    pub fn grow(&mut self) {
        self.current_timestep += 1;
        self.age += 1;
        self.life_span += 1;

        if self.behavior.behavior.is_active() {
            self.behavior.time_last_active = self.current_timestep;
        }
        if self.moud.moud == Moud::Current {
            self.moud.total_moud_months += 1;
        }
        if self.hiv.hiv.is_low_cd4() {
            self.hiv.low_cd4_months_count += 1;
        }
        self.moud.current_state_concurrent_months += 1;
    }

    pub fn die(&mut self, reason: DeathReason) {
        self.alive = false;
        self.death_reason = reason;
    }

    // --- HCV ---------------------------------------------------------------

    pub fn infect_hcv(&mut self) {
        if self.hcv.hcv != Hcv::None {
            return;
        }
        self.hcv.hcv = Hcv::Acute;
        self.hcv.time_changed = self.current_timestep;
        self.hcv.seropositive = true;
        self.hcv.times_infected += 1;
        if self.hcv.fibrosis_state == FibrosisState::None {
            self.hcv.fibrosis_state = FibrosisState::F0;
        }
    }

    pub fn clear_hcv(&mut self, is_acute: bool) {
        self.hcv.hcv = Hcv::None;
        self.hcv.time_changed = self.current_timestep;
        if is_acute {
            self.hcv.times_acute_cleared += 1;
        }
    }

    pub fn set_genotype_three(&mut self, value: bool) {
        self.hcv.genotype_three = value;
    }

    /// Moves an acute infection into its chronic phase. No-op unless acute.
    pub fn progress_to_chronic(&mut self) {
        if self.hcv.hcv == Hcv::Acute {
            self.hcv.hcv = Hcv::Chronic;
            self.hcv.time_changed = self.current_timestep;
        }
    }

    /// Monotonicity is the caller's responsibility; only
    /// `events::FibrosisProgression` calls this, and it only ever advances.
    pub fn set_fibrosis(&mut self, state: FibrosisState) {
        self.hcv.time_fibrosis_changed = self.current_timestep;
        self.hcv.fibrosis_state = state;
    }

    pub fn set_hiv_state(&mut self, state: Hiv) {
        self.hiv.hiv = state;
        self.hiv.time_changed = self.current_timestep;
    }

    pub fn set_hcc(&mut self, state: HccState) {
        self.hcc.hcc = state;
    }

    pub fn diagnose_hcc(&mut self) {
        self.hcc.diagnosed = true;
    }

    pub fn diagnose_fibrosis(&mut self, state: MeasuredFibrosisState) {
        self.staging.measured_fibrosis_state = state;
        self.staging.time_of_last_staging = self.current_timestep;
    }

    // --- Screening / diagnosis ----------------------------------------

    pub fn screen(&mut self, it: InfectionType, test: ScreeningTest, screening_type: ScreeningType) {
        let details = self.screening.get_mut(&it).expect("InfectionType always present");
        details.time_last_screen = self.current_timestep;
        match test {
            ScreeningTest::Antibody => {
                details.ab_test_count += 1;
                details.ab_positive = true;
            }
            ScreeningTest::Rna => details.rna_test_count += 1,
        }
        details.identifying_screen_type = screening_type;
    }

    pub fn diagnose(&mut self, it: InfectionType) {
        let details = self.screening.get_mut(&it).expect("InfectionType always present");
        details.identified = true;
        details.time_identified = self.current_timestep;
        details.times_identified += 1;
    }

    pub fn clear_diagnosis(&mut self, it: InfectionType) {
        let details = self.screening.get_mut(&it).expect("InfectionType always present");
        details.identified = false;
        details.identifications_cleared += 1;
    }

    /// Charges a false-positive diagnosis; reverses `diagnose`'s effect on
    /// `times_identified` so the counter nets to the true diagnose/false-
    /// positive balance (invariant 3, §3).
    pub fn false_positive(&mut self, it: InfectionType) {
        let details = self.screening.get_mut(&it).expect("InfectionType always present");
        details.identified = false;
        details.times_identified -= 1;
    }

    pub fn add_false_negative(&mut self, it: InfectionType) {
        let details = self.screening.get_mut(&it).expect("InfectionType always present");
        details.false_negative_count += 1;
    }

    pub fn is_identified(&self, it: InfectionType) -> bool {
        self.screening[&it].identified
    }

    // --- Linkage ---------------------------------------------------------

    pub fn link(&mut self, it: InfectionType) {
        let details = self.linkage.get_mut(&it).expect("InfectionType always present");
        details.state = LinkageState::Linked;
        details.time_changed = self.current_timestep;
        details.link_count += 1;
    }

    pub fn unlink(&mut self, it: InfectionType) {
        let details = self.linkage.get_mut(&it).expect("InfectionType always present");
        details.state = LinkageState::Unlinked;
        details.time_changed = self.current_timestep;
    }

    pub fn link_state(&self, it: InfectionType) -> LinkageState {
        self.linkage[&it].state
    }

    // --- Treatment ---------------------------------------------------------

    /// If already in salvage, no-op. Else, if already initiated, moves to
    /// salvage; else starts a fresh course.
    pub fn initiate_treatment(&mut self, it: InfectionType) {
        let details = self.treatment.get_mut(&it).expect("InfectionType always present");
        if details.in_salvage {
            return;
        }
        if details.initiated {
            details.in_salvage = true;
            details.salvage_count += 1;
        } else {
            details.initiated = true;
            details.starts += 1;
            details.time_initiated = self.current_timestep;
        }
    }

    pub fn add_withdrawal(&mut self, it: InfectionType) {
        self.treatment.get_mut(&it).expect("present").withdrawals += 1;
    }

    pub fn add_toxic_reaction(&mut self, it: InfectionType) {
        self.treatment.get_mut(&it).expect("present").toxic_reactions += 1;
    }

    pub fn add_completed_treatment(&mut self, it: InfectionType) {
        self.treatment.get_mut(&it).expect("present").completions += 1;
    }

    pub fn add_svr(&mut self) {
        self.hcv.svrs += 1;
    }

    pub fn end_treatment(&mut self, it: InfectionType) {
        let details = self.treatment.get_mut(&it).expect("present");
        details.initiated = false;
        details.in_salvage = false;
    }

    // --- Behavior ----------------------------------------------------------

    /// Refuses transitions to `Never`; stamps `time_last_active` if the
    /// resulting state is active.
    pub fn set_behavior(&mut self, behavior: Behavior) {
        if behavior == Behavior::Never {
            return;
        }
        self.behavior.behavior = behavior;
        if behavior.is_active() {
            self.behavior.time_last_active = self.current_timestep;
        }
    }

    /// Only advances when called explicitly by the MOUD event.
    pub fn transition_moud(&mut self) {
        let next = self.moud.moud.next();
        if next != self.moud.moud && next == Moud::Current {
            self.moud.time_started = self.current_timestep;
        }
        self.moud.moud = next;
        self.moud.current_state_concurrent_months = 0;
    }

    pub fn toggle_overdose(&mut self) {
        self.overdose.currently_overdosing = !self.overdose.currently_overdosing;
        if self.overdose.currently_overdosing {
            self.overdose.cumulative_count += 1;
        }
    }

    // --- Pregnancy -----------------------------------------------------

    pub fn set_pregnancy_state(&mut self, state: PregnancyState) {
        self.pregnancy.state = state;
        self.pregnancy.time_changed = self.current_timestep;
    }

    pub fn impregnate(&mut self) {
        self.set_pregnancy_state(PregnancyState::Pregnant);
        self.pregnancy.pregnancy_count += 1;
    }

    pub fn stillbirth(&mut self) {
        self.pregnancy.stillbirth_count += 1;
        self.set_pregnancy_state(PregnancyState::RestrictedPostpartum);
    }

    pub fn birth(&mut self, child: Child) {
        self.pregnancy.infant_count += 1;
        self.pregnancy.hcv_exposed_infants += 1;
        if child.hcv != Hcv::None {
            self.pregnancy.hcv_infected_infants += 1;
        }
        if child.tested {
            self.pregnancy.hcv_tested_infants += 1;
        }
        self.pregnancy.children.push(child);
        self.set_pregnancy_state(PregnancyState::RestrictedPostpartum);
    }

    pub fn add_infant_exposure(&mut self) {
        self.pregnancy.hcv_exposed_infants += 1;
    }

    pub fn end_postpartum(&mut self) {
        self.set_pregnancy_state(PregnancyState::None);
    }

    pub fn time_in_pregnancy_state(&self) -> i64 {
        self.current_timestep - self.pregnancy.time_changed
    }

    // --- Cost / utility delegation ------------------------------------

    pub fn add_cost(&mut self, base: f64, discounted: f64, category: CostCategory) {
        self.cost_accumulator.add_cost(base, discounted, category);
    }

    pub fn set_utility(&mut self, value: f64, category: UtilityCategory) -> Result<()> {
        self.utility_accumulator.set_utility(value, category)
    }

    pub fn accumulate_total_utility(&mut self, discount_rate: f64) {
        self.utility_accumulator
            .accumulate_total_utility(discount_rate, self.current_timestep as f64);
        self.discounted_life_span +=
            crate::econ::discount(1.0, discount_rate, self.current_timestep as f64);
    }

    /// Emits a CSV row matching `output::population_headers(schema)`.
    pub fn make_population_row(&self, schema: crate::output::OutputSchema) -> Vec<String> {
        crate::output::person_row(self, schema)
    }

    /// Builds a Person from an `init_cohort` row (§4.7): a short column
    /// list describing starting state, with everything else left at
    /// [`Person::new`]'s defaults.
    #[allow(clippy::too_many_arguments)]
    pub fn from_cohort_row(
        id: u64,
        age_months: i64,
        sex: Sex,
        behavior: Behavior,
        time_last_active_drug_use: i64,
        seropositive: bool,
        genotype_three: bool,
        fibrosis_state: FibrosisState,
        identified_as_hcv_positive: bool,
        link_state: LinkageState,
        hcv_status: Hcv,
        pregnancy_state: PregnancyState,
    ) -> Self {
        let mut person = Self::new(id, sex, age_months, behavior, false);
        person.behavior.time_last_active = time_last_active_drug_use;
        person.hcv.hcv = hcv_status;
        person.hcv.fibrosis_state = fibrosis_state;
        person.hcv.genotype_three = genotype_three;
        person.hcv.seropositive = seropositive;
        if identified_as_hcv_positive {
            person.diagnose(InfectionType::Hcv);
        }
        person.linkage.get_mut(&InfectionType::Hcv).expect("present").state = link_state;
        if sex == Sex::Female {
            person.pregnancy.state = pregnancy_state;
        }
        person
    }

    /// Reconstructs a Person from a `population` snapshot row in exactly
    /// the column order `output::population_headers(schema)` names. The
    /// per-category current utility values and per-category cost
    /// breakdown are not part of that schema; only the lifetime totals
    /// round-trip (see `UtilityAccumulator::restore_total_utility`,
    /// `CostAccumulator::restore_totals`).
    pub fn from_population_row(row: &[String], schema: crate::output::OutputSchema) -> Result<Self> {
        let id = parse_field::<u64>(row, 0)?;
        let sex = parse_field::<Sex>(row, 1)?;
        let age = parse_field::<i64>(row, 2)?;
        let alive = parse_field::<bool>(row, 3)?;
        let boomer = parse_field::<bool>(row, 4)?;
        let death_reason = parse_field::<DeathReason>(row, 5)?;
        let behavior = parse_field::<Behavior>(row, 6)?;
        let time_last_active = parse_field::<i64>(row, 7)?;
        let hcv = parse_field::<Hcv>(row, 8)?;
        let fibrosis_state = parse_field::<FibrosisState>(row, 9)?;
        let genotype_three = parse_field::<bool>(row, 10)?;
        let seropositive = parse_field::<bool>(row, 11)?;
        let times_infected = parse_field::<u32>(row, 12)?;
        let times_acute_cleared = parse_field::<u32>(row, 13)?;
        let svrs = parse_field::<u32>(row, 14)?;

        let mut person = Self::new(id, sex, age, behavior, boomer);
        person.alive = alive;
        person.death_reason = death_reason;
        person.behavior.time_last_active = time_last_active;
        person.hcv.hcv = hcv;
        person.hcv.fibrosis_state = fibrosis_state;
        person.hcv.genotype_three = genotype_three;
        person.hcv.seropositive = seropositive;
        person.hcv.times_infected = times_infected;
        person.hcv.times_acute_cleared = times_acute_cleared;
        person.hcv.svrs = svrs;

        let mut idx = 15;
        if schema.hiv {
            person.hiv.hiv = parse_field::<Hiv>(row, idx)?;
            idx += 1;
            person.hiv.low_cd4_months_count = parse_field::<u32>(row, idx)?;
            idx += 1;
        }
        if schema.hcc {
            person.hcc.hcc = parse_field::<HccState>(row, idx)?;
            idx += 1;
            person.hcc.diagnosed = parse_field::<bool>(row, idx)?;
            idx += 1;
        }
        if schema.overdose {
            person.overdose.currently_overdosing = parse_field::<bool>(row, idx)?;
            idx += 1;
            person.overdose.cumulative_count = parse_field::<u32>(row, idx)?;
            idx += 1;
        }
        if schema.moud {
            person.moud.moud = parse_field::<Moud>(row, idx)?;
            idx += 1;
            person.moud.total_moud_months = parse_field::<u32>(row, idx)?;
            idx += 1;
        }
        if schema.pregnancy {
            person.pregnancy.state = parse_field::<PregnancyState>(row, idx)?;
            idx += 1;
            person.pregnancy.infant_count = parse_field::<u32>(row, idx)?;
            idx += 1;
            person.pregnancy.stillbirth_count = parse_field::<u32>(row, idx)?;
            idx += 1;
        }

        person.staging.measured_fibrosis_state = parse_field::<MeasuredFibrosisState>(row, idx)?;
        idx += 1;
        person.linkage.get_mut(&InfectionType::Hcv).expect("present").state =
            parse_field::<LinkageState>(row, idx)?;
        idx += 1;
        person.linkage.get_mut(&InfectionType::Hiv).expect("present").state =
            parse_field::<LinkageState>(row, idx)?;
        idx += 1;
        person.screening.get_mut(&InfectionType::Hcv).expect("present").identified =
            parse_field::<bool>(row, idx)?;
        idx += 1;
        person.screening.get_mut(&InfectionType::Hiv).expect("present").identified =
            parse_field::<bool>(row, idx)?;
        idx += 1;
        person.treatment.get_mut(&InfectionType::Hcv).expect("present").initiated =
            parse_field::<bool>(row, idx)?;
        idx += 1;
        person.treatment.get_mut(&InfectionType::Hiv).expect("present").initiated =
            parse_field::<bool>(row, idx)?;
        idx += 1;

        let min_util = parse_field::<f64>(row, idx)?;
        idx += 1;
        let mult_util = parse_field::<f64>(row, idx)?;
        idx += 1;
        let discount_min_util = parse_field::<f64>(row, idx)?;
        idx += 1;
        let discount_mult_util = parse_field::<f64>(row, idx)?;
        idx += 1;
        person.utility_accumulator.restore_total_utility(crate::utility::TotalUtility {
            min_util,
            mult_util,
            discount_min_util,
            discount_mult_util,
        });

        person.life_span = parse_field::<i64>(row, idx)?;
        person.current_timestep = person.life_span;
        idx += 1;
        person.discounted_life_span = parse_field::<f64>(row, idx)?;
        idx += 1;

        let nominal = parse_field::<f64>(row, idx)?;
        idx += 1;
        let discounted = parse_field::<f64>(row, idx)?;
        person.cost_accumulator.restore_totals(crate::cost::CostTotals { nominal, discounted });

        Ok(person)
    }
}

fn parse_field<T>(row: &[String], idx: usize) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = row.get(idx).ok_or_else(|| {
        crate::error::HepceError::PopulationRowInvalid(format!(
            "row has fewer than {} columns",
            idx + 1
        ))
    })?;
    raw.parse::<T>().map_err(|e| {
        crate::error::HepceError::PopulationRowInvalid(format!("column {idx} ('{raw}'): {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_person() -> Person {
        Person::new(1, Sex::Female, 300, Behavior::Injection, false)
    }

    #[test]
    fn grow_n_times_advances_age_by_exactly_n() {
        let mut p = new_person();
        let start = p.age;
        for _ in 0..12 {
            p.grow();
        }
        assert_eq!(p.age, start + 12);
        assert_eq!(p.current_timestep, 12);
    }

    #[test]
    fn infect_hcv_is_noop_when_already_infected() {
        let mut p = new_person();
        p.infect_hcv();
        assert_eq!(p.hcv.times_infected, 1);
        p.infect_hcv();
        assert_eq!(p.hcv.times_infected, 1, "re-infection must be a no-op");
    }

    #[test]
    fn infect_hcv_seeds_fibrosis_to_f0() {
        let mut p = new_person();
        assert_eq!(p.hcv.fibrosis_state, FibrosisState::None);
        p.infect_hcv();
        assert_eq!(p.hcv.fibrosis_state, FibrosisState::F0);
    }

    #[test]
    fn false_positive_reverses_diagnose() {
        let mut p = new_person();
        let before = p.screening[&InfectionType::Hcv].times_identified;
        p.diagnose(InfectionType::Hcv);
        p.false_positive(InfectionType::Hcv);
        assert_eq!(p.screening[&InfectionType::Hcv].times_identified, before);
        assert!(!p.is_identified(InfectionType::Hcv));
    }

    #[test]
    fn initiate_treatment_moves_to_salvage_on_second_call() {
        let mut p = new_person();
        p.initiate_treatment(InfectionType::Hcv);
        assert!(p.treatment[&InfectionType::Hcv].initiated);
        assert!(!p.treatment[&InfectionType::Hcv].in_salvage);
        p.initiate_treatment(InfectionType::Hcv);
        assert!(p.treatment[&InfectionType::Hcv].in_salvage);
        assert_eq!(p.treatment[&InfectionType::Hcv].salvage_count, 1);
    }

    #[test]
    fn set_behavior_refuses_never() {
        let mut p = new_person();
        p.set_behavior(Behavior::Never);
        assert_eq!(p.behavior.behavior, Behavior::Injection);
    }

    #[test]
    fn die_sets_alive_false_and_records_reason() {
        let mut p = new_person();
        p.die(DeathReason::Liver);
        assert!(!p.alive);
        assert_eq!(p.death_reason, DeathReason::Liver);
    }

    #[test]
    fn link_count_tracks_number_of_transitions_into_linked() {
        let mut p = new_person();
        p.link(InfectionType::Hcv);
        p.unlink(InfectionType::Hcv);
        p.link(InfectionType::Hcv);
        assert_eq!(p.linkage[&InfectionType::Hcv].link_count, 2);
    }

    #[test]
    fn from_cohort_row_seeds_hcv_and_linkage_state() {
        let p = Person::from_cohort_row(
            5,
            300,
            Sex::Male,
            Behavior::Injection,
            -1,
            true,
            false,
            FibrosisState::F2,
            true,
            LinkageState::Linked,
            Hcv::Chronic,
            PregnancyState::NotApplicable,
        );
        assert_eq!(p.hcv.hcv, Hcv::Chronic);
        assert_eq!(p.hcv.fibrosis_state, FibrosisState::F2);
        assert!(p.is_identified(InfectionType::Hcv));
        assert_eq!(p.link_state(InfectionType::Hcv), LinkageState::Linked);
    }

    #[test]
    fn population_row_round_trips_through_from_population_row() {
        let mut p = new_person();
        p.infect_hcv();
        p.link(InfectionType::Hcv);
        for _ in 0..6 {
            p.grow();
        }
        p.accumulate_total_utility(0.0);
        let schema = crate::output::OutputSchema::default();
        let row = p.make_population_row(schema);
        let restored = Person::from_population_row(&row, schema).unwrap();
        assert_eq!(restored.id, p.id);
        assert_eq!(restored.hcv.hcv, p.hcv.hcv);
        assert_eq!(restored.link_state(InfectionType::Hcv), p.link_state(InfectionType::Hcv));
        assert_eq!(restored.life_span, p.life_span);
        assert_eq!(restored.current_timestep, p.life_span);
    }

    proptest::proptest! {
        #[test]
        fn times_infected_bounds_cleared_plus_svrs(ops in proptest::collection::vec(0u8..3, 0..50)) {
            let mut p = new_person();
            for op in ops {
                match op {
                    0 => p.infect_hcv(),
                    1 => {
                        if p.hcv.hcv == Hcv::Acute {
                            p.clear_hcv(true);
                        }
                    }
                    _ => {
                        if p.hcv.hcv != Hcv::None {
                            p.clear_hcv(false);
                            p.add_svr();
                        }
                    }
                }
                prop_assert!(p.hcv.times_infected >= p.hcv.times_acute_cleared + p.hcv.svrs);
            }
        }

        #[test]
        fn grow_advances_age_by_exactly_n_steps(n in 0u32..100) {
            let mut p = new_person();
            let start = p.age;
            for _ in 0..n {
                p.grow();
            }
            prop_assert_eq!(p.age, start + n as i64);
            prop_assert_eq!(p.current_timestep, n as i64);
        }
    }
}
