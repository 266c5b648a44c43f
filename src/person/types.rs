//! Closed enumerations and substate records that make up a [`super::Person`].

use crate::error::HepceError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Implements `FromStr` for a field-less enum by matching its `{:?}`
/// spelling exactly, so population-snapshot rows round-trip through
/// `Debug`/`FromStr` without a separate wire format.
macro_rules! debug_from_str {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = HepceError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok($ty::$variant),)+
                    other => Err(HepceError::PopulationRowInvalid(format!(
                        concat!("'{}' is not a valid ", stringify!($ty)),
                        other
                    ))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

/// "Never" is absorbing-from-above: no transition returns to it.
/// `Behavior::is_active()` is `{NonInjection, Injection}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Behavior {
    Never,
    FormerNonInjection,
    FormerInjection,
    NonInjection,
    Injection,
}

impl Behavior {
    pub fn is_active(&self) -> bool {
        matches!(self, Behavior::NonInjection | Behavior::Injection)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hcv {
    None,
    Acute,
    Chronic,
}

/// Strictly non-decreasing over a Person's lifetime; `Decomp` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FibrosisState {
    None,
    F0,
    F1,
    F2,
    F3,
    F4,
    Decomp,
}

impl FibrosisState {
    /// The next state in the monotone progression, or `self` if already at
    /// the absorbing `Decomp` state (or at the `None` sentinel, which only
    /// `InfectHCV` may leave).
    pub fn advance(self) -> FibrosisState {
        use FibrosisState::*;
        match self {
            None => None,
            F0 => F1,
            F1 => F2,
            F2 => F3,
            F3 => F4,
            F4 => Decomp,
            Decomp => Decomp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MeasuredFibrosisState {
    None,
    F01,
    F23,
    F4,
    Decomp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HccState {
    None,
    Early,
    Late,
}

impl HccState {
    pub fn advance(self) -> HccState {
        match self {
            HccState::None => HccState::Early,
            HccState::Early => HccState::Late,
            HccState::Late => HccState::Late,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hiv {
    None,
    HighCd4Unsuppressed,
    HighCd4Suppressed,
    LowCd4Unsuppressed,
    LowCd4Suppressed,
}

impl Hiv {
    pub fn is_low_cd4(&self) -> bool {
        matches!(self, Hiv::LowCd4Unsuppressed | Hiv::LowCd4Suppressed)
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Hiv::HighCd4Suppressed | Hiv::LowCd4Suppressed)
    }

    pub fn suppress(self) -> Hiv {
        match self {
            Hiv::HighCd4Unsuppressed => Hiv::HighCd4Suppressed,
            Hiv::LowCd4Unsuppressed => Hiv::LowCd4Suppressed,
            other => other,
        }
    }

    pub fn unsuppress(self) -> Hiv {
        match self {
            Hiv::HighCd4Suppressed => Hiv::HighCd4Unsuppressed,
            Hiv::LowCd4Suppressed => Hiv::LowCd4Unsuppressed,
            other => other,
        }
    }

    pub fn restore_high_cd4(self) -> Hiv {
        match self {
            Hiv::LowCd4Unsuppressed => Hiv::HighCd4Unsuppressed,
            Hiv::LowCd4Suppressed => Hiv::HighCd4Suppressed,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Moud {
    None,
    Current,
    Post,
}

impl Moud {
    /// Cyclic `none -> current -> post -> none`, only advanced when the
    /// MOUD event explicitly calls `Person::transition_moud`.
    pub fn next(self) -> Moud {
        match self {
            Moud::None => Moud::Current,
            Moud::Current => Moud::Post,
            Moud::Post => Moud::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkageState {
    Never,
    Linked,
    Unlinked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScreeningType {
    None,
    Background,
    Intervention,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScreeningTest {
    Antibody,
    Rna,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PregnancyState {
    NotApplicable,
    None,
    Pregnant,
    RestrictedPostpartum,
    YearOnePostpartum,
    YearTwoPostpartum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathReason {
    NotDead,
    Background,
    Liver,
    Infection,
    Age,
    Overdose,
    Hiv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InfectionType {
    Hcv,
    Hiv,
}

impl InfectionType {
    pub fn all() -> [InfectionType; 2] {
        [InfectionType::Hcv, InfectionType::Hiv]
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BehaviorDetails {
    pub behavior: Behavior,
    /// -1 sentinel: never been in an active-use state.
    pub time_last_active: i64,
}

impl BehaviorDetails {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            time_last_active: -1,
        }
    }
}

impl Default for Behavior {
    fn default() -> Self {
        Behavior::Never
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HcvDetails {
    pub hcv: Hcv,
    pub fibrosis_state: FibrosisState,
    pub genotype_three: bool,
    pub seropositive: bool,
    pub time_changed: i64,
    pub time_fibrosis_changed: i64,
    pub times_infected: u32,
    pub times_acute_cleared: u32,
    pub svrs: u32,
}

impl Default for HcvDetails {
    fn default() -> Self {
        Self {
            hcv: Hcv::None,
            fibrosis_state: FibrosisState::None,
            genotype_three: false,
            seropositive: false,
            time_changed: -1,
            time_fibrosis_changed: -1,
            times_infected: 0,
            times_acute_cleared: 0,
            svrs: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HivDetails {
    pub hiv: Hiv,
    pub time_changed: i64,
    pub low_cd4_months_count: u32,
}

impl Default for Hiv {
    fn default() -> Self {
        Hiv::None
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HccDetails {
    pub hcc: HccState,
    pub diagnosed: bool,
}

impl Default for HccState {
    fn default() -> Self {
        HccState::None
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OverdoseDetails {
    pub currently_overdosing: bool,
    pub cumulative_count: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoudDetails {
    pub moud: Moud,
    pub time_started: i64,
    pub current_state_concurrent_months: u32,
    pub total_moud_months: u32,
}

impl Default for MoudDetails {
    fn default() -> Self {
        Self {
            moud: Moud::None,
            time_started: -1,
            current_state_concurrent_months: 0,
            total_moud_months: 0,
        }
    }
}

impl Default for Moud {
    fn default() -> Self {
        Moud::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    pub hcv: Hcv,
    pub tested: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PregnancyDetails {
    pub state: PregnancyState,
    pub time_changed: i64,
    pub pregnancy_count: u32,
    pub infant_count: u32,
    pub stillbirth_count: u32,
    pub hcv_exposed_infants: u32,
    pub hcv_infected_infants: u32,
    pub hcv_tested_infants: u32,
    pub children: Vec<Child>,
}

impl Default for PregnancyState {
    fn default() -> Self {
        PregnancyState::NotApplicable
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StagingDetails {
    pub measured_fibrosis_state: MeasuredFibrosisState,
    pub had_second_test: bool,
    pub time_of_last_staging: i64,
}

impl Default for MeasuredFibrosisState {
    fn default() -> Self {
        MeasuredFibrosisState::None
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LinkageDetails {
    pub state: LinkageState,
    pub time_changed: i64,
    pub link_count: u32,
}

impl Default for LinkageState {
    fn default() -> Self {
        LinkageState::Never
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScreeningDetails {
    pub time_last_screen: i64,
    pub ab_test_count: u32,
    pub rna_test_count: u32,
    pub ab_positive: bool,
    pub identified: bool,
    pub time_identified: i64,
    pub times_identified: i64,
    pub identifying_screen_type: ScreeningType,
    pub false_negative_count: u32,
    pub identifications_cleared: u32,
}

impl Default for ScreeningType {
    fn default() -> Self {
        ScreeningType::None
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TreatmentDetails {
    pub initiated: bool,
    pub time_initiated: i64,
    pub starts: u32,
    pub withdrawals: u32,
    pub toxic_reactions: u32,
    pub completions: u32,
    pub salvage_count: u32,
    pub in_salvage: bool,
}

debug_from_str!(Sex { Male, Female });
debug_from_str!(Behavior {
    Never,
    FormerNonInjection,
    FormerInjection,
    NonInjection,
    Injection,
});
debug_from_str!(Hcv { None, Acute, Chronic });
debug_from_str!(FibrosisState {
    None,
    F0,
    F1,
    F2,
    F3,
    F4,
    Decomp,
});
debug_from_str!(MeasuredFibrosisState {
    None,
    F01,
    F23,
    F4,
    Decomp,
});
debug_from_str!(HccState { None, Early, Late });
debug_from_str!(Hiv {
    None,
    HighCd4Unsuppressed,
    HighCd4Suppressed,
    LowCd4Unsuppressed,
    LowCd4Suppressed,
});
debug_from_str!(Moud { None, Current, Post });
debug_from_str!(LinkageState { Never, Linked, Unlinked });
debug_from_str!(PregnancyState {
    NotApplicable,
    None,
    Pregnant,
    RestrictedPostpartum,
    YearOnePostpartum,
    YearTwoPostpartum,
});
debug_from_str!(DeathReason {
    NotDead,
    Background,
    Liver,
    Infection,
    Age,
    Overdose,
    Hiv,
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fibrosis_from_str_round_trips_with_debug() {
        for state in [
            FibrosisState::None,
            FibrosisState::F0,
            FibrosisState::F4,
            FibrosisState::Decomp,
        ] {
            let text = format!("{state:?}");
            assert_eq!(FibrosisState::from_str(&text).unwrap(), state);
        }
    }

    #[test]
    fn unknown_variant_is_population_row_invalid() {
        assert!(matches!(
            Sex::from_str("NotASex"),
            Err(HepceError::PopulationRowInvalid(_))
        ));
    }

    #[test]
    fn fibrosis_advances_monotonically_and_saturates_at_decomp() {
        let mut state = FibrosisState::F0;
        for _ in 0..10 {
            state = state.advance();
        }
        assert_eq!(state, FibrosisState::Decomp);
    }

    #[test]
    fn fibrosis_ordinal_order_is_significant() {
        assert!(FibrosisState::F0 < FibrosisState::F4);
        assert!(FibrosisState::F4 < FibrosisState::Decomp);
    }

    #[test]
    fn behavior_active_set_is_injection_and_non_injection_only() {
        assert!(Behavior::Injection.is_active());
        assert!(Behavior::NonInjection.is_active());
        assert!(!Behavior::FormerInjection.is_active());
        assert!(!Behavior::Never.is_active());
    }

    #[test]
    fn hiv_suppression_round_trips() {
        let h = Hiv::LowCd4Unsuppressed;
        let suppressed = h.suppress();
        assert!(suppressed.is_suppressed());
        assert_eq!(suppressed.unsuppress(), h);
    }

    #[test]
    fn moud_cycle_is_none_current_post_none() {
        let mut m = Moud::None;
        m = m.next();
        assert_eq!(m, Moud::Current);
        m = m.next();
        assert_eq!(m, Moud::Post);
        m = m.next();
        assert_eq!(m, Moud::None);
    }

    proptest::proptest! {
        #[test]
        fn fibrosis_advance_never_decreases(start in 0u8..7, steps in 0u8..20) {
            let states = [
                FibrosisState::None,
                FibrosisState::F0,
                FibrosisState::F1,
                FibrosisState::F2,
                FibrosisState::F3,
                FibrosisState::F4,
                FibrosisState::Decomp,
            ];
            let mut state = states[start as usize];
            for _ in 0..steps {
                let next = state.advance();
                prop_assert!(next >= state);
                state = next;
            }
        }

        #[test]
        fn fibrosis_advance_reaches_decomp_and_stays(steps in 7u8..20) {
            let mut state = FibrosisState::None;
            for _ in 0..steps {
                state = state.advance();
            }
            prop_assert_eq!(state, FibrosisState::Decomp);
        }
    }
}
