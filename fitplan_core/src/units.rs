//! Unit conversions used at the presentation boundary.
//!
//! Everything inside the crate is metric (kg, cm). These helpers convert
//! to and from what the user sees when imperial units are selected.

const LB_PER_KG: f64 = 2.20462;
const KG_PER_LB: f64 = 0.453592;
const CM_PER_INCH: f64 = 2.54;

pub fn kg_to_lb(kg: f64) -> f64 {
    kg * LB_PER_KG
}

pub fn lb_to_kg(lb: f64) -> f64 {
    lb * KG_PER_LB
}

/// Height in whole feet and inches, rounded to the nearest inch
pub fn cm_to_feet_inches(cm: f64) -> (u32, u32) {
    let total_inches = (cm / CM_PER_INCH).round().max(0.0) as u32;
    (total_inches / 12, total_inches % 12)
}

/// Height in whole centimetres
pub fn feet_inches_to_cm(feet: u32, inches: u32) -> f64 {
    (f64::from(feet * 12 + inches) * CM_PER_INCH).round()
}

/// Round to one decimal place, e.g. a weight typed in pounds stored as kg
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
