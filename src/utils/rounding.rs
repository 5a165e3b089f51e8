//! Rounding and number formatting for result records

/// Round to 2 decimal places (half away from zero)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format an application rate in kg/hectare
///
/// Whole numbers print without a fractional part ("60 kg/hectare"); anything else is
/// rounded to 2 decimals so float noise such as `22.000000000000004` never leaks into
/// the record.
pub fn format_rate(kg_per_hectare: f64) -> String {
    let rounded = round2(kg_per_hectare);
    if rounded.fract() == 0.0 {
        format!("{:.0} kg/hectare", rounded)
    } else {
        format!("{} kg/hectare", rounded)
    }
}
