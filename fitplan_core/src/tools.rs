//! Quick calculators: a standalone TDEE estimate and a one-rep-max estimate.

use crate::calculator::round_half_up;
use crate::onboarding::load_profile;
use crate::store::{keys, KeyValueStore, StoreExt};
use crate::types::{Gender, Locale};
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Activity multipliers for levels 1..=5
pub const QUICK_ACTIVITY_FACTORS: [f64; 5] = [1.2, 1.375, 1.55, 1.725, 1.9];

/// Answers of the quick calorie wizard, stored under `calorie_profile`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CalorieProfile {
    pub gender: Gender,
    pub height: f64,
    pub weight: f64,
    pub age: f64,
    pub activity: u8,
    pub tdee: i64,
    /// Date the answers were saved (`YYYY-MM-DD`)
    pub updated: NaiveDate,
}

/// Mifflin-St Jeor TDEE with a 1..=5 activity level.
///
/// Only the male constant is distinguished; every other answer uses the
/// female one. Returns 0 when height, weight or age is 0.
pub fn quick_tdee(gender: Gender, height_cm: f64, weight_kg: f64, age: f64, activity: u8) -> i64 {
    if height_cm == 0.0 || weight_kg == 0.0 || age == 0.0 {
        return 0;
    }
    let offset = if gender == Gender::Male { 5.0 } else { -161.0 };
    let bmr = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age + offset;
    if bmr == 0.0 {
        return 0;
    }
    let level = usize::from(activity.clamp(1, 5)) - 1;
    round_half_up(bmr * QUICK_ACTIVITY_FACTORS[level])
}

/// Epley estimate `w * (1 + reps / 30)`, rounded; 0 when either input is 0
pub fn one_rep_max(weight: f64, reps: u32) -> i64 {
    if weight == 0.0 || reps == 0 {
        return 0;
    }
    round_half_up(weight * (1.0 + f64::from(reps) / 30.0))
}

/// Compute the TDEE for the answers and store them
pub fn save_calorie_profile<S: KeyValueStore + ?Sized>(
    store: &mut S,
    gender: Gender,
    height: f64,
    weight: f64,
    age: f64,
    activity: u8,
    today: NaiveDate,
) -> Result<CalorieProfile> {
    let profile = CalorieProfile {
        gender,
        height,
        weight,
        age,
        activity,
        tdee: quick_tdee(gender, height, weight, age, activity),
        updated: today,
    };
    store.set_json(keys::CALORIE_PROFILE, &profile)?;
    Ok(profile)
}

pub fn load_calorie_profile<S: KeyValueStore + ?Sized>(store: &S) -> Option<CalorieProfile> {
    store.get_json(keys::CALORIE_PROFILE)
}

/// Interface language of the saved onboarding profile, English when none
pub fn profile_locale<S: KeyValueStore>(store: &S) -> Locale {
    load_profile(store).map_or(Locale::En, |profile| profile.locale)
}
