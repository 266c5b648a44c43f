//! CSV population output (§6): a fixed-schema header built by
//! [`population_headers`] and matching per-Person rows from [`person_row`].

use crate::person::types::InfectionType;
use crate::person::Person;

/// Which optional sub-event blocks are active for this run, and therefore
/// which columns `population_headers`/`person_row` include.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputSchema {
    pub pregnancy: bool,
    pub hcc: bool,
    pub overdose: bool,
    pub hiv: bool,
    pub moud: bool,
}

pub fn population_headers(schema: OutputSchema) -> Vec<String> {
    let mut headers: Vec<String> = [
        "id", "sex", "age", "alive", "boomer", "death_reason", "behavior",
        "time_last_active_drug_use",
        "hcv_status", "fibrosis_state", "genotype_three", "seropositive",
        "times_infected", "times_acute_cleared", "svrs",
    ]
    .map(String::from)
    .to_vec();

    if schema.hiv {
        headers.extend(["hiv_status", "low_cd4_months_count"].map(String::from));
    }
    if schema.hcc {
        headers.extend(["hcc_state", "hcc_diagnosed"].map(String::from));
    }
    if schema.overdose {
        headers.extend(["currently_overdosing", "overdose_count"].map(String::from));
    }
    if schema.moud {
        headers.extend(["moud_state", "total_moud_months"].map(String::from));
    }
    if schema.pregnancy {
        headers.extend(["pregnancy_state", "infant_count", "stillbirth_count"].map(String::from));
    }

    headers.extend(
        [
            "measured_fibrosis_state",
            "hcv_link_state",
            "hiv_link_state",
            "hcv_identified",
            "hiv_identified",
            "hcv_treatment_initiated",
            "hiv_treatment_initiated",
            "min_utility",
            "mult_utility",
            "discount_min_utility",
            "discount_mult_utility",
            "life_span",
            "discounted_life_span",
            "total_cost_nominal",
            "total_cost_discounted",
        ]
        .map(String::from),
    );
    headers
}

/// Emits exactly the columns `population_headers(schema)` names, in the
/// same order.
pub fn person_row(person: &Person, schema: OutputSchema) -> Vec<String> {
    let mut row: Vec<String> = vec![
        person.id.to_string(),
        format!("{:?}", person.sex),
        person.age.to_string(),
        person.alive.to_string(),
        person.boomer.to_string(),
        format!("{:?}", person.death_reason),
        format!("{:?}", person.behavior.behavior),
        person.behavior.time_last_active.to_string(),
        format!("{:?}", person.hcv.hcv),
        format!("{:?}", person.hcv.fibrosis_state),
        person.hcv.genotype_three.to_string(),
        person.hcv.seropositive.to_string(),
        person.hcv.times_infected.to_string(),
        person.hcv.times_acute_cleared.to_string(),
        person.hcv.svrs.to_string(),
    ];

    if schema.hiv {
        row.push(format!("{:?}", person.hiv.hiv));
        row.push(person.hiv.low_cd4_months_count.to_string());
    }
    if schema.hcc {
        row.push(format!("{:?}", person.hcc.hcc));
        row.push(person.hcc.diagnosed.to_string());
    }
    if schema.overdose {
        row.push(person.overdose.currently_overdosing.to_string());
        row.push(person.overdose.cumulative_count.to_string());
    }
    if schema.moud {
        row.push(format!("{:?}", person.moud.moud));
        row.push(person.moud.total_moud_months.to_string());
    }
    if schema.pregnancy {
        row.push(format!("{:?}", person.pregnancy.state));
        row.push(person.pregnancy.infant_count.to_string());
        row.push(person.pregnancy.stillbirth_count.to_string());
    }

    row.push(format!("{:?}", person.staging.measured_fibrosis_state));
    row.push(format!("{:?}", person.linkage[&InfectionType::Hcv].state));
    row.push(format!("{:?}", person.linkage[&InfectionType::Hiv].state));
    row.push(person.screening[&InfectionType::Hcv].identified.to_string());
    row.push(person.screening[&InfectionType::Hiv].identified.to_string());
    row.push(person.treatment[&InfectionType::Hcv].initiated.to_string());
    row.push(person.treatment[&InfectionType::Hiv].initiated.to_string());

    let total_utility = person.utility_accumulator.get_total_utility();
    row.push(total_utility.min_util.to_string());
    row.push(total_utility.mult_util.to_string());
    row.push(total_utility.discount_min_util.to_string());
    row.push(total_utility.discount_mult_util.to_string());
    row.push(person.life_span.to_string());
    row.push(person.discounted_life_span.to_string());

    let totals = person.cost_accumulator.get_totals();
    row.push(totals.nominal.to_string());
    row.push(totals.discounted.to_string());
    row
}
