//! Day, month and streak summaries derived from the set log.
//!
//! Nothing here is persisted; every figure is recomputed from raw log rows
//! on read. Program days are fixed to weekdays: Monday is day 1, Wednesday
//! day 2 and Friday day 3.

use crate::set_log::{date_key, logged_sets, read_rows, variants_for_day};
use crate::store::{keys, KeyValueStore, StoreExt};
use crate::types::LogRow;
use crate::{Error, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default look-back for streaks
pub const STREAK_WINDOW_DAYS: u32 = 180;

/// Cells in a month grid (six weeks)
pub const MONTH_GRID_CELLS: usize = 42;

/// Total sets at which a day counts as complete on the heatmap
pub const COMPLETE_DAY_SETS: usize = 6;

/// Length of the demo course
pub const COURSE_DAYS: usize = 21;

/// Program day scheduled on `date`, if any
pub fn program_day_for(date: NaiveDate) -> Option<u8> {
    match date.weekday() {
        Weekday::Mon => Some(1),
        Weekday::Wed => Some(2),
        Weekday::Fri => Some(3),
        _ => None,
    }
}

/// Exercise titles of `day` from `program_days`, or placeholders when no
/// program has been selected yet
pub fn program_day_titles<S: KeyValueStore + ?Sized>(store: &S, day: u8) -> Vec<String> {
    store
        .get_json::<BTreeMap<String, Vec<String>>>(keys::PROGRAM_DAYS)
        .and_then(|mut days| days.remove(&day.to_string()))
        .unwrap_or_else(|| (1..=3).map(|n| format!("Exercise {}", n)).collect())
}

/// Planned set counts of `day` from `program_sets` (empty when absent)
pub fn planned_sets_for<S: KeyValueStore + ?Sized>(store: &S, day: u8) -> Vec<u32> {
    store
        .get_json::<BTreeMap<String, Vec<u32>>>(keys::PROGRAM_SETS)
        .and_then(|mut sets| sets.remove(&day.to_string()))
        .unwrap_or_default()
}

// ============================================================================
// Day summary
// ============================================================================

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ExerciseSummary {
    /// Variant title when one was chosen, else the program title
    pub title: String,
    pub sets: usize,
    /// Most recently logged row
    pub last: Option<LogRow>,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct DaySummary {
    pub program_day: Option<u8>,
    pub total_sets: usize,
    pub exercises: Vec<ExerciseSummary>,
}

/// Summarize what was logged on `date`.
///
/// With `include_legacy`, an exercise without a dated log falls back to the
/// undated key. Only the detail view does this; heatmap and streaks never do.
pub fn read_day_summary<S: KeyValueStore + ?Sized>(
    store: &S,
    date: NaiveDate,
    include_legacy: bool,
) -> DaySummary {
    let Some(day) = program_day_for(date) else {
        return DaySummary::default();
    };

    let variants = variants_for_day(store, day);
    let dated = date_key(date);
    let mut summary = DaySummary {
        program_day: Some(day),
        ..DaySummary::default()
    };

    for (index, title) in program_day_titles(store, day).into_iter().enumerate() {
        let dated_key = keys::dated_log(&dated, day, index);
        let present = store.get_raw(&dated_key).map(|_| dated_key).or_else(|| {
            let legacy = keys::legacy_log(day, index);
            (include_legacy && store.get_raw(&legacy).is_some()).then_some(legacy)
        });
        let rows = present
            .and_then(|key| read_rows(store, &key))
            .unwrap_or_default();

        summary.total_sets += rows.len();
        summary.exercises.push(ExerciseSummary {
            title: variants.get(&index).cloned().unwrap_or(title),
            sets: rows.len(),
            last: rows.last().cloned(),
        });
    }

    summary
}

/// Sets logged on `date` across all exercises (dated keys only)
pub fn total_sets_on<S: KeyValueStore + ?Sized>(store: &S, date: NaiveDate) -> usize {
    read_day_summary(store, date, false).total_sets
}

// ============================================================================
// Month view
// ============================================================================

/// Monday-first grid for a month: leading blanks, the days, trailing blanks
/// up to 42 cells
pub fn month_matrix(year: i32, month: u32) -> Result<Vec<Option<NaiveDate>>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::InvalidInput(format!("invalid month {}-{:02}", year, month)))?;

    let lead = first.weekday().num_days_from_monday() as usize;
    let mut cells = vec![None; lead];
    cells.extend(
        first
            .iter_days()
            .take_while(|d| d.month() == month)
            .map(Some),
    );
    cells.resize(cells.len().max(MONTH_GRID_CELLS), None);
    Ok(cells)
}

/// Heatmap shade of a day
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HeatLevel {
    Neutral,
    InProgress,
    Complete,
}

impl HeatLevel {
    pub fn from_total(total_sets: usize) -> Self {
        match total_sets {
            0 => HeatLevel::Neutral,
            n if n >= COMPLETE_DAY_SETS => HeatLevel::Complete,
            _ => HeatLevel::InProgress,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub total_sets: usize,
    pub heat: HeatLevel,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct MonthTotals {
    pub days: Vec<DayTotal>,
    /// Days with at least one logged set
    pub training_days: usize,
}

pub fn month_totals<S: KeyValueStore + ?Sized>(store: &S, year: i32, month: u32) -> Result<MonthTotals> {
    let days: Vec<DayTotal> = month_matrix(year, month)?
        .into_iter()
        .flatten()
        .map(|date| {
            let total_sets = total_sets_on(store, date);
            DayTotal {
                date,
                total_sets,
                heat: HeatLevel::from_total(total_sets),
            }
        })
        .collect();
    let training_days = days.iter().filter(|d| d.total_sets > 0).count();
    Ok(MonthTotals { days, training_days })
}

// ============================================================================
// Streaks
// ============================================================================

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct Streaks {
    pub current: u32,
    pub best: u32,
}

/// Walk back from `today` over `window_days` days.
///
/// A day is active when it has logged sets. Unscheduled weekdays report zero
/// sets and therefore break a run.
pub fn compute_streaks<S: KeyValueStore + ?Sized>(store: &S, today: NaiveDate, window_days: u32) -> Streaks {
    let mut streaks = Streaks::default();
    let mut running = 0u32;
    let mut still_current = true;

    for offset in 0..i64::from(window_days) {
        let date = today - Duration::days(offset);
        if total_sets_on(store, date) > 0 {
            running += 1;
            if still_current {
                streaks.current = running;
            }
            streaks.best = streaks.best.max(running);
        } else {
            running = 0;
            still_current = false;
        }
    }

    tracing::debug!(
        "Streaks as of {}: current {}, best {}",
        today,
        streaks.current,
        streaks.best
    );
    streaks
}

// ============================================================================
// Superset groups
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    NotStarted,
    Partial,
    Complete,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct SupersetGroup {
    /// "A", "B", ...
    pub label: String,
    /// Exercise indexes in the group (one or two)
    pub exercises: Vec<usize>,
    pub planned: u32,
    pub actual: usize,
    pub status: GroupStatus,
}

/// Pair consecutive exercises of `day` into groups and compare planned sets
/// with what was logged on `date`
pub fn superset_groups<S: KeyValueStore + ?Sized>(store: &S, date: NaiveDate, day: u8) -> Vec<SupersetGroup> {
    let planned = planned_sets_for(store, day);

    (0..planned.len())
        .step_by(2)
        .zip(b'A'..)
        .map(|(first, letter)| {
            let exercises: Vec<usize> = (first..planned.len().min(first + 2)).collect();
            let plan: u32 = exercises.iter().map(|&i| planned[i]).sum();
            let actual: usize = exercises
                .iter()
                .map(|&i| logged_sets(store, date, day, i))
                .sum();
            let status = if actual == 0 {
                GroupStatus::NotStarted
            } else if actual < plan as usize {
                GroupStatus::Partial
            } else {
                GroupStatus::Complete
            };
            SupersetGroup {
                label: char::from(letter).to_string(),
                exercises,
                planned: plan,
                actual,
                status,
            }
        })
        .collect()
}

// ============================================================================
// Course progress
// ============================================================================

/// Completed days of the demo course, stored under `progress`
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseProgress {
    #[serde(default)]
    pub done: Vec<u32>,
}

impl CourseProgress {
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        store.get_json(keys::COURSE_PROGRESS).unwrap_or_default()
    }

    /// Flip `day` between done and not done and persist the result
    pub fn toggle_day_done<S: KeyValueStore + ?Sized>(store: &mut S, day: u32) -> Result<Self> {
        let mut progress = Self::load(store);
        if progress.is_done(day) {
            progress.done.retain(|d| *d != day);
        } else {
            progress.done.push(day);
        }
        store.set_json(keys::COURSE_PROGRESS, &progress)?;
        Ok(progress)
    }

    pub fn is_done(&self, day: u32) -> bool {
        self.done.contains(&day)
    }

    /// Share of the course completed, capped at 100
    pub fn percent(&self) -> u32 {
        let pct = (self.done.len() as f64 / COURSE_DAYS as f64 * 100.0 + 0.5).floor();
        pct.min(100.0) as u32
    }
}
