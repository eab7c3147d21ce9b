//! Built-in workout programs.
//!
//! Three levels × two tracks, each with exactly three day plans. The table is
//! dense, so [`program`] is total over every `(Level, Track)` pair. Selecting
//! a program writes its titles and planned set counts to the store for the
//! calendar and log views.

use crate::store::{keys, KeyValueStore, StoreExt};
use crate::types::*;
use crate::Result;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of program days (Mon / Wed / Fri)
pub const PROGRAM_DAYS: u8 = 3;

/// Leading count of a "sets" string such as "4×12", "3x10" or "5*8"
static SETS_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*[x×*]").ok());

/// Dense table indexed by `level * 2 + track`
static PROGRAMS: Lazy<[Program; 6]> = Lazy::new(build_programs);

/// Look up the program for a level and track
pub fn program(level: Level, track: Track) -> &'static Program {
    let row = match level {
        Level::Beginner => 0,
        Level::Intermediate => 1,
        Level::Advanced => 2,
    };
    let col = match track {
        Track::Gym => 0,
        Track::Home => 1,
    };
    &PROGRAMS[row * 2 + col]
}

/// Planned set count from a "sets" string; missing or unparseable gives 0
pub fn parse_planned_sets(sets: Option<&str>) -> u32 {
    let pattern = SETS_PATTERN.as_ref();
    sets.and_then(|s| pattern?.captures(s))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

impl Program {
    /// Day plan for program day 1..=3 (out-of-range days are clamped)
    pub fn day(&self, day: u8) -> &DayPlan {
        let index = usize::from(day.clamp(1, PROGRAM_DAYS)) - 1;
        &self.days[index]
    }

    /// Exercise titles per program day, keyed "1".."3"
    pub fn day_titles(&self) -> BTreeMap<String, Vec<String>> {
        self.days
            .iter()
            .enumerate()
            .map(|(i, day)| {
                let titles = day.exercises.iter().map(|e| e.title.to_string()).collect();
                ((i + 1).to_string(), titles)
            })
            .collect()
    }

    /// Planned set counts per program day, parallel to [`Program::day_titles`]
    pub fn day_set_counts(&self) -> BTreeMap<String, Vec<u32>> {
        self.days
            .iter()
            .enumerate()
            .map(|(i, day)| ((i + 1).to_string(), day.planned_sets()))
            .collect()
    }
}

impl DayPlan {
    pub fn planned_sets(&self) -> Vec<u32> {
        self.exercises
            .iter()
            .map(|e| parse_planned_sets(e.sets))
            .collect()
    }

    /// Sum of planned sets for the whole day
    pub fn planned_total(&self) -> u32 {
        self.planned_sets().iter().sum()
    }
}

/// Stored under `program_meta`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgramMeta {
    pub level: Level,
    pub track: Track,
    /// Epoch milliseconds of the selection
    pub updated: i64,
}

/// Make `(level, track)` the active program and externalize it
pub fn select_program<S: KeyValueStore + ?Sized>(
    store: &mut S,
    level: Level,
    track: Track,
    now: DateTime<Utc>,
) -> Result<&'static Program> {
    let selected = program(level, track);

    store.set_json(
        keys::PROGRAM_META,
        &ProgramMeta {
            level,
            track,
            updated: now.timestamp_millis(),
        },
    )?;
    store.set_json(keys::PROGRAM_DAYS, &selected.day_titles())?;
    store.set_json(keys::PROGRAM_SETS, &selected.day_set_counts())?;

    tracing::info!("Selected program {} / {}", level, track);
    Ok(selected)
}

/// Currently selected program; beginner/gym when nothing was chosen yet
pub fn selected_program<S: KeyValueStore + ?Sized>(store: &S) -> &'static Program {
    match store.get_json::<ProgramMeta>(keys::PROGRAM_META) {
        Some(meta) => program(meta.level, meta.track),
        None => program(Level::Beginner, Track::Gym),
    }
}

fn ex(title: &'static str, sets: &'static str) -> Exercise {
    Exercise {
        title,
        sets: Some(sets),
    }
}

fn day(title: &'static str, exercises: Vec<Exercise>) -> DayPlan {
    DayPlan { title, exercises }
}

/// The same session repeated on all three days
fn repeated(exercises: Vec<Exercise>) -> [DayPlan; 3] {
    [
        day("Day 1", exercises.clone()),
        day("Day 2", exercises.clone()),
        day("Day 3", exercises),
    ]
}

fn build_programs() -> [Program; 6] {
    [
        Program {
            level: Level::Beginner,
            track: Track::Gym,
            goal: "Learn technique, strengthen the whole body, feel the muscles.",
            days: [
                day(
                    "Day 1: Legs + Glutes",
                    vec![
                        ex("Barbell squat / goblet squat", "3×12"),
                        ex("Glute bridge", "3×15"),
                        ex("Reverse lunges", "3×10"),
                        ex("Leg extension machine", "3×15"),
                        ex("Plank", "3×30 sec"),
                    ],
                ),
                day(
                    "Day 2: Back + Arms",
                    vec![
                        ex("Seated cable row", "3×12"),
                        ex("Assisted pull-up / lat pulldown", "3×10"),
                        ex("Seated dumbbell press", "3×12"),
                        ex("Dumbbell biceps curl", "3×12"),
                        ex("Crunches", "3×15"),
                    ],
                ),
                day(
                    "Day 3: Full body",
                    vec![
                        ex("Squat", "3×15"),
                        ex("Bent-over dumbbell row", "3×12"),
                        ex("Bench dips", "3×12"),
                        ex("Bicycle crunches", "3×20"),
                        ex("Plank", "3×40 sec"),
                    ],
                ),
            ],
        },
        Program {
            level: Level::Beginner,
            track: Track::Home,
            goal: "Bodyweight or resistance band only.",
            days: repeated(vec![
                ex("Squat", "4×15"),
                ex("Lunges", "3×12"),
                ex("Knee push-ups", "3×10"),
                ex("Plank", "3×30 sec"),
                ex("Glute bridge", "3×20"),
                ex("Crunches", "3×20"),
            ]),
        },
        Program {
            level: Level::Intermediate,
            track: Track::Gym,
            goal: "Build muscle with a focus on glutes and shoulders.",
            days: [
                day(
                    "Day 1: Glutes + Legs",
                    vec![
                        ex("Romanian deadlift", "4×10"),
                        ex("Squat", "4×10"),
                        ex("Back extensions", "3×15"),
                        ex("Walking lunges", "3×12"),
                        ex("Weighted glute bridge", "4×12"),
                    ],
                ),
                day(
                    "Day 2: Back + Shoulders + Core",
                    vec![
                        ex("Seated cable row", "4×10"),
                        ex("Bent-over dumbbell row", "3×12"),
                        ex("Overhead dumbbell press", "3×10"),
                        ex("Lateral raises", "3×15"),
                        ex("Hanging / lying leg raises", "3×15"),
                    ],
                ),
                day(
                    "Day 3: Full body",
                    vec![
                        ex("Light barbell deadlift", "4×8"),
                        ex("Bench press", "4×8"),
                        ex("Dumbbell squat", "3×12"),
                        ex("Plank", "3×30 sec"),
                    ],
                ),
            ],
        },
        Program {
            level: Level::Intermediate,
            track: Track::Home,
            goal: "Keep in shape, develop glutes and core.",
            days: repeated(vec![
                ex("Bulgarian split squats", "4×12"),
                ex("Banded glute bridge", "4×15"),
                ex("Push-ups", "4×10"),
                ex("Plank", "3×45 sec"),
                ex("Crunches + scissors", "3×20"),
                ex("Pause squats", "4×12"),
            ]),
        },
        Program {
            level: Level::Advanced,
            track: Track::Gym,
            goal: "Muscle gain with a focus on glutes, shoulders and back.",
            days: [
                day(
                    "Day 1: Glutes + Legs",
                    vec![
                        ex("Barbell back squat", "5×8"),
                        ex("Heavy glute bridge", "5×10"),
                        ex("Romanian deadlift", "4×10"),
                        ex("Bulgarian split squats", "3×12"),
                        ex("Cable kickbacks", "3×15"),
                    ],
                ),
                day(
                    "Day 2: Upper body",
                    vec![
                        ex("Barbell bench press", "4×8"),
                        ex("Barbell row", "4×10"),
                        ex("Overhead press", "4×10"),
                        ex("Dumbbell lateral raises", "4×15"),
                        ex("Tabata core (pendulum / climbers)", "—"),
                    ],
                ),
                day(
                    "Day 3: Combination",
                    vec![
                        ex("Deadlift", "4×6"),
                        ex("Smith machine front squat", "4×10"),
                        ex("Walking lunges", "3×14"),
                        ex("Crunches + plank", "3 rounds"),
                    ],
                ),
            ],
        },
        Program {
            level: Level::Advanced,
            track: Track::Home,
            goal: "Stay in shape with minimal equipment (dumbbells + band).",
            days: repeated(vec![
                ex("Dumbbell squat", "4×15"),
                ex("Weighted glute bridge", "4×15"),
                ex("Lunges", "4×12"),
                ex("Push-ups", "3×12"),
                ex("Plank", "3×1 min"),
                ex("Burpees", "3×15"),
            ]),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    #[test]
    fn test_lookup_is_total() {
        for level in Level::ALL {
            for track in Track::ALL {
                let p = program(*level, *track);
                assert_eq!(p.level, *level);
                assert_eq!(p.track, *track);
                for d in &p.days {
                    assert!(!d.exercises.is_empty(), "{level}/{track} has an empty day");
                }
            }
        }
    }

    #[test]
    fn test_parse_planned_sets() {
        assert_eq!(parse_planned_sets(Some("4×12")), 4);
        assert_eq!(parse_planned_sets(Some("3x10")), 3);
        assert_eq!(parse_planned_sets(Some("5 X 5")), 5);
        assert_eq!(parse_planned_sets(Some("12*8")), 12);
        assert_eq!(parse_planned_sets(Some("3×30 sec")), 3);
        assert_eq!(parse_planned_sets(Some("—")), 0);
        assert_eq!(parse_planned_sets(Some("3 rounds")), 0);
        assert_eq!(parse_planned_sets(None), 0);
    }

    #[test]
    fn test_select_program_externalizes_days_and_sets() {
        let mut store = MemoryStore::new();
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
        select_program(&mut store, Level::Advanced, Track::Gym, now).unwrap();

        let meta: ProgramMeta = store.get_json(keys::PROGRAM_META).unwrap();
        assert_eq!(meta.level, Level::Advanced);
        assert_eq!(meta.updated, now.timestamp_millis());

        let days: BTreeMap<String, Vec<String>> = store.get_json(keys::PROGRAM_DAYS).unwrap();
        let sets: BTreeMap<String, Vec<u32>> = store.get_json(keys::PROGRAM_SETS).unwrap();
        assert_eq!(days.len(), 3);
        assert_eq!(days["2"].len(), sets["2"].len());
        assert_eq!(sets["2"], vec![4, 4, 4, 4, 0]);
        assert_eq!(sets["3"], vec![4, 4, 3, 0]);

        assert_eq!(selected_program(&store).level, Level::Advanced);
    }

    #[test]
    fn test_selected_program_defaults_to_beginner_gym() {
        let store = MemoryStore::new();
        let p = selected_program(&store);
        assert_eq!((p.level, p.track), (Level::Beginner, Track::Gym));
    }

    #[test]
    fn test_planned_total() {
        let p = program(Level::Beginner, Track::Home);
        assert_eq!(p.day(1).planned_total(), 4 + 3 + 3 + 3 + 3 + 3);
        assert_eq!(p.day(9).title, "Day 3");
    }
}
