//! Nutrition plan calculator.
//!
//! Pure mapping from a profile snapshot to a [`PlanResult`]:
//! - BMR via Mifflin–St Jeor
//! - TDEE from the weekly workout bucket
//! - Deficit/surplus from the desired weekly rate
//! - Macro split with user overrides
//! - Weeks to goal, target date and a cosmetic metabolic age

use crate::{ActivityBucket, Gender, Goal, MacrosOverride, PlanResult};
use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// kcal per kg of body-mass change
pub const KCAL_PER_KG: f64 = 7700.0;

/// Allowed weekly rate of change, kg/week
pub const SPEED_MIN_KG_WEEK: f64 = 0.1;
pub const SPEED_MAX_KG_WEEK: f64 = 1.5;

pub const CALORIES_MIN: f64 = 1200.0;
pub const CALORIES_MAX: f64 = 3900.0;
pub const DEFICIT_MIN: f64 = 300.0;
pub const DEFICIT_MAX: f64 = 1100.0;
pub const SURPLUS_MIN: f64 = 200.0;
pub const SURPLUS_MAX: f64 = 800.0;

/// Protein, g per kg bodyweight
pub const PROTEIN_PER_KG_LOSE: f64 = 2.2;
pub const PROTEIN_PER_KG_GAIN: f64 = 2.0;
pub const PROTEIN_PER_KG_MAINTAIN: f64 = 2.0;

/// Fat, g per kg bodyweight
pub const FAT_PER_KG_MIN: f64 = 0.6;
pub const FAT_PER_KG_BASE: f64 = 0.8;

/// Desired and current weight closer than this count as equal
pub const GOAL_WEIGHT_TOLERANCE_KG: f64 = 0.25;
/// Upper bound on the goal horizon (100 years)
pub const WEEKS_TO_GOAL_MAX: u32 = 5200;

pub const METABOLIC_AGE_MIN: f64 = 18.0;
pub const METABOLIC_AGE_MAX: f64 = 75.0;

/// Everything the calculator needs, already validated by the wizard
#[derive(Clone, Debug, PartialEq)]
pub struct PlanInput {
    pub gender: Gender,
    pub age: i32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub desired_weight_kg: f64,
    pub goal: Goal,
    pub speed_kg_week: f64,
    pub activity: ActivityBucket,
    pub allow_rollover: bool,
    pub add_exercise_back: bool,
    pub overrides: MacrosOverride,
}

impl ActivityBucket {
    /// TDEE multiplier for this bucket
    pub fn factor(&self) -> f64 {
        match self {
            ActivityBucket::Low => 1.375,
            ActivityBucket::Moderate => 1.55,
            ActivityBucket::High => 1.725,
        }
    }
}

impl Gender {
    /// Mifflin–St Jeor constant; `Other` uses the midpoint of male and female
    pub fn bmr_offset(&self) -> f64 {
        match self {
            Gender::Male => 5.0,
            Gender::Female => -161.0,
            Gender::Other => -78.0,
        }
    }
}

impl Goal {
    pub fn protein_per_kg(&self) -> f64 {
        match self {
            Goal::Lose => PROTEIN_PER_KG_LOSE,
            Goal::Gain => PROTEIN_PER_KG_GAIN,
            Goal::Maintain => PROTEIN_PER_KG_MAINTAIN,
        }
    }
}

/// Compute the full plan for `input` as of `now`.
///
/// Identical `(input, now)` always yields an identical plan.
pub fn calculate_plan(input: &PlanInput, now: DateTime<Utc>) -> PlanResult {
    let speed = clamp_speed(input.speed_kg_week);

    let bmr = calculate_bmr(input.gender, input.weight_kg, input.height_cm, input.age);
    let tdee = calculate_tdee(bmr, input.activity);

    let daily_adjustment = daily_adjustment(input.goal, speed);
    let signed_adjustment = match input.goal {
        Goal::Lose => -daily_adjustment,
        Goal::Gain => daily_adjustment,
        Goal::Maintain => 0.0,
    };

    let mut target_calories = (tdee as f64 + signed_adjustment).clamp(CALORIES_MIN, CALORIES_MAX);
    // A zero override means "unset"
    if let Some(calories) = input.overrides.calories.filter(|c| *c != 0.0 && !c.is_nan()) {
        target_calories = calories.clamp(CALORIES_MIN, CALORIES_MAX);
    }

    // Protein and fat overrides apply before carbs so carbs absorb the change
    let protein_g = round_tenth(
        input
            .overrides
            .protein_g
            .unwrap_or(input.goal.protein_per_kg() * input.weight_kg),
    );
    let fat_g = round_tenth(
        input
            .overrides
            .fat_g
            .unwrap_or(FAT_PER_KG_MIN.max(FAT_PER_KG_BASE) * input.weight_kg),
    );
    let carbs_g = round_tenth(
        input
            .overrides
            .carbs_g
            .unwrap_or_else(|| ((target_calories - protein_g * 4.0 - fat_g * 9.0) / 4.0).max(0.0)),
    );

    let weeks_to_goal = weeks_to_goal(input.weight_kg, input.desired_weight_kg, speed);
    let target_date = now + Duration::weeks(i64::from(weeks_to_goal));

    let metabolic_age = estimate_metabolic_age(input.age, bmr, input.weight_kg);

    tracing::debug!(
        "Plan: bmr={} tdee={} target={} weeks={}",
        bmr,
        tdee,
        target_calories,
        weeks_to_goal
    );

    PlanResult {
        bmr,
        tdee,
        target_calories: round_half_up(target_calories),
        protein_g,
        fat_g,
        carbs_g,
        delta_per_day: round_half_up(signed_adjustment),
        weeks_to_goal,
        target_date_iso: target_date.to_rfc3339_opts(SecondsFormat::Millis, true),
        metabolic_age,
        allow_rollover: input.allow_rollover,
        add_exercise_back: input.add_exercise_back,
    }
}

/// Basal metabolic rate (Mifflin–St Jeor), kcal/day
pub fn calculate_bmr(gender: Gender, weight_kg: f64, height_cm: f64, age: i32) -> i64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age);
    round_half_up(base + gender.bmr_offset())
}

/// Total daily energy expenditure, kcal/day
pub fn calculate_tdee(bmr: i64, activity: ActivityBucket) -> i64 {
    round_half_up(bmr as f64 * activity.factor())
}

/// Cosmetic "metabolic age".
///
/// The `sin(weight)` term is a deterministic wobble with no physiological
/// meaning; it is kept so results match previously shown values.
pub fn estimate_metabolic_age(age: i32, bmr: i64, weight_kg: f64) -> i64 {
    let baseline = 370.0 + 21.6 * weight_kg;
    let delta = bmr as f64 - baseline;
    let noise = weight_kg.sin() * 2.0;
    let adjustment = delta / 50.0 + noise;
    round_half_up((f64::from(age) - adjustment).clamp(METABOLIC_AGE_MIN, METABOLIC_AGE_MAX))
}

/// Clamp a weekly rate into the supported range
pub fn clamp_speed(speed_kg_week: f64) -> f64 {
    speed_kg_week.clamp(SPEED_MIN_KG_WEEK, SPEED_MAX_KG_WEEK)
}

/// Unsigned daily kcal adjustment for `goal` at `speed` kg/week
fn daily_adjustment(goal: Goal, speed: f64) -> f64 {
    let daily = speed * KCAL_PER_KG / 7.0;
    match goal {
        Goal::Lose => daily.clamp(DEFICIT_MIN, DEFICIT_MAX),
        Goal::Gain => daily.clamp(SURPLUS_MIN, SURPLUS_MAX),
        Goal::Maintain => 0.0,
    }
}

fn weeks_to_goal(weight_kg: f64, desired_weight_kg: f64, speed: f64) -> u32 {
    let diff = (desired_weight_kg - weight_kg).abs();
    if diff < GOAL_WEIGHT_TOLERANCE_KG {
        return 0;
    }
    (diff / speed).ceil().clamp(0.0, f64::from(WEEKS_TO_GOAL_MAX)) as u32
}

/// Round half-way values towards positive infinity (-550.5 becomes -550)
pub(crate) fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn round_tenth(value: f64) -> f64 {
    round_half_up(value * 10.0) as f64 / 10.0
}
