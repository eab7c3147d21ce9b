//! Core domain types for fitplan.
//!
//! This module defines the fundamental types used throughout the system:
//! - Onboarding answers (gender, goal, activity bucket, diet, barriers)
//! - Macro overrides and the computed nutrition plan
//! - Workout programs, day plans and exercises
//! - Logged set rows

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares the wire string for each variant once and derives
/// `as_str`, `Display` and `FromStr` from it.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// All variants in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stored/display string for this variant
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> crate::Result<Self> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(crate::Error::InvalidInput(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

// ============================================================================
// Onboarding answers
// ============================================================================

/// Interface language
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Uk,
    En,
}
string_enum!(Locale { Uk => "uk", En => "en" });

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}
string_enum!(Gender { Male => "male", Female => "female", Other => "other" });

/// Display/input unit system. Stored magnitudes are always metric.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}
string_enum!(Units { Metric => "metric", Imperial => "imperial" });

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Lose,
    Maintain,
    Gain,
}
string_enum!(Goal { Lose => "lose", Maintain => "maintain", Gain => "gain" });

/// Weekly workout-frequency bucket
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActivityBucket {
    #[serde(rename = "0-2")]
    Low,
    #[serde(rename = "3-5")]
    Moderate,
    #[serde(rename = "6+")]
    High,
}
string_enum!(ActivityBucket { Low => "0-2", Moderate => "3-5", High => "6+" });

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Diet {
    Classic,
    Pescatarian,
    Vegetarian,
    Vegan,
}
string_enum!(Diet {
    Classic => "classic",
    Pescatarian => "pescatarian",
    Vegetarian => "vegetarian",
    Vegan => "vegan",
});

/// Things that slow the user down (multi-select)
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Barrier {
    Consistency,
    Habits,
    Busy,
    Inspiration,
}
string_enum!(Barrier {
    Consistency => "consistency",
    Habits => "habits",
    Busy => "busy",
    Inspiration => "inspiration",
});

/// Date of birth as entered in the wizard (not validated as a calendar date)
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BirthDate {
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

impl Default for BirthDate {
    fn default() -> Self {
        Self {
            day: 1,
            month: 1,
            year: 1995,
        }
    }
}

// ============================================================================
// Macro overrides and plan
// ============================================================================

/// Keys of the user-forced macro values
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MacroKey {
    #[serde(rename = "calories")]
    Calories,
    #[serde(rename = "protein_g")]
    Protein,
    #[serde(rename = "fat_g")]
    Fat,
    #[serde(rename = "carbs_g")]
    Carbs,
}
string_enum!(MacroKey {
    Calories => "calories",
    Protein => "protein_g",
    Fat => "fat_g",
    Carbs => "carbs_g",
});

/// Partial mapping of macro key to a user-forced value
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct MacrosOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs_g: Option<f64>,
}

impl MacrosOverride {
    pub fn get(&self, key: MacroKey) -> Option<f64> {
        match key {
            MacroKey::Calories => self.calories,
            MacroKey::Protein => self.protein_g,
            MacroKey::Fat => self.fat_g,
            MacroKey::Carbs => self.carbs_g,
        }
    }

    /// Set or (with `None`) delete a single override
    pub fn set(&mut self, key: MacroKey, value: Option<f64>) {
        let slot = match key {
            MacroKey::Calories => &mut self.calories,
            MacroKey::Protein => &mut self.protein_g,
            MacroKey::Fat => &mut self.fat_g,
            MacroKey::Carbs => &mut self.carbs_g,
        };
        *slot = value;
    }

    pub fn is_empty(&self) -> bool {
        MacroKey::ALL.iter().all(|k| self.get(*k).is_none())
    }
}

/// One entry of a `SetMacrosOverride` patch; `value: None` removes the key
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MacroPatch {
    pub key: MacroKey,
    pub value: Option<f64>,
}

/// Computed nutrition plan. Always fully re-derived from the profile.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    pub bmr: i64,
    pub tdee: i64,
    pub target_calories: i64,
    #[serde(rename = "protein_g")]
    pub protein_g: f64,
    #[serde(rename = "fat_g")]
    pub fat_g: f64,
    #[serde(rename = "carbs_g")]
    pub carbs_g: f64,
    pub delta_per_day: i64,
    pub weeks_to_goal: u32,
    #[serde(rename = "targetDateISO")]
    pub target_date_iso: String,
    pub metabolic_age: i64,
    pub allow_rollover: bool,
    pub add_exercise_back: bool,
}

// ============================================================================
// Workout catalog
// ============================================================================

/// Training experience level
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}
string_enum!(Level {
    Beginner => "beginner",
    Intermediate => "intermediate",
    Advanced => "advanced",
});

/// Training venue
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    Gym,
    Home,
}
string_enum!(Track { Gym => "gym", Home => "home" });

/// A catalog exercise; `sets` is free text such as "4×12" or "3×30 sec"
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Exercise {
    pub title: &'static str,
    pub sets: Option<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayPlan {
    pub title: &'static str,
    pub exercises: Vec<Exercise>,
}

/// A 3-day program for one (level, track) combination
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    pub level: Level,
    pub track: Track,
    pub goal: &'static str,
    pub days: [DayPlan; 3],
}

// ============================================================================
// Set logging
// ============================================================================

/// One logged set. Kept as raw text so in-progress input survives.
///
/// Any JSON value deserializes: numbers become their text, and missing or
/// non-scalar fields become empty, so a stored row list always keeps its length.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(from = "serde_json::Value")]
pub struct LogRow {
    pub kg: String,
    pub reps: String,
}

impl From<serde_json::Value> for LogRow {
    fn from(value: serde_json::Value) -> Self {
        let field = |name: &str| match value.get(name) {
            Some(serde_json::Value::String(text)) => text.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        Self {
            kg: field("kg"),
            reps: field("reps"),
        }
    }
}

impl LogRow {
    pub fn new(kg: impl Into<String>, reps: impl Into<String>) -> Self {
        Self {
            kg: kg.into(),
            reps: reps.into(),
        }
    }

    /// The placeholder row shown for an empty log
    pub fn blank() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_bucket_wire_names() {
        assert_eq!(
            serde_json::to_string(&ActivityBucket::High).unwrap(),
            "\"6+\""
        );
        assert_eq!("3-5".parse::<ActivityBucket>().unwrap(), ActivityBucket::Moderate);
    }

    #[test]
    fn test_unknown_variant_is_rejected() {
        assert!("tuesday".parse::<Goal>().is_err());
        assert_eq!(" Gain ".parse::<Goal>().unwrap(), Goal::Gain);
    }

    #[test]
    fn test_plan_result_uses_original_field_names() {
        let plan = PlanResult {
            bmr: 1420,
            tdee: 2201,
            target_calories: 1651,
            protein_g: 154.0,
            fat_g: 56.0,
            carbs_g: 132.8,
            delta_per_day: -550,
            weeks_to_goal: 10,
            target_date_iso: "2025-08-11T00:00:00.000Z".into(),
            metabolic_age: 30,
            allow_rollover: true,
            add_exercise_back: false,
        };
        let value = serde_json::to_value(&plan).unwrap();
        for key in [
            "targetCalories",
            "protein_g",
            "fat_g",
            "carbs_g",
            "deltaPerDay",
            "weeksToGoal",
            "targetDateISO",
            "metabolicAge",
            "addExerciseBack",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_macros_override_set_and_delete() {
        let mut overrides = MacrosOverride::default();
        assert!(overrides.is_empty());
        overrides.set(MacroKey::Protein, Some(120.0));
        assert_eq!(overrides.get(MacroKey::Protein), Some(120.0));
        assert_eq!(
            serde_json::to_string(&overrides).unwrap(),
            r#"{"protein_g":120.0}"#
        );
        overrides.set(MacroKey::Protein, None);
        assert!(overrides.is_empty());
    }
}
