//! Shared numeric conventions: discounting and rate/probability conversion.

/// Converts a nominal monthly value to a present-value equivalent at annual
/// rate `r`, `t` months out: `v / (1 + r/12)^t`.
pub fn discount(value: f64, annual_rate: f64, months: f64) -> f64 {
    value / (1.0 + annual_rate / 12.0).powf(months)
}

/// `1 - exp(-r)`.
pub fn rate_to_probability(rate: f64) -> f64 {
    1.0 - (-rate).exp()
}

/// `-ln(1 - p)`.
pub fn probability_to_rate(probability: f64) -> f64 {
    -(1.0 - probability).ln()
}
