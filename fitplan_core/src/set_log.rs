//! Logged sets per date, program day and exercise.
//!
//! Rows live under `log_<YYYY-MM-DD>_<day>_<index>`. An older undated key
//! `log_<day>_<index>` is still read as a fallback and, for the day that is
//! currently open, written as a mirror.

use crate::store::{keys, KeyValueStore, StoreExt};
use crate::types::LogRow;
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Calendar date as used in log keys
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Rows stored under `key`, or `None` when absent or malformed
pub(crate) fn read_rows<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Option<Vec<LogRow>> {
    store.get_json(key)
}

/// Number of sets logged on `date` (dated key only; 0 if absent or bad)
pub fn logged_sets<S: KeyValueStore + ?Sized>(
    store: &S,
    date: NaiveDate,
    day: u8,
    index: usize,
) -> usize {
    read_rows(store, &keys::dated_log(&date_key(date), day, index)).map_or(0, |rows| rows.len())
}

/// Copy legacy rows forward into the dated key.
///
/// Reads the dated key first; when it is missing, reads the undated key and,
/// if that exists, writes its raw value into the dated key. Never writes the
/// other way. Returns the raw value found, if any.
pub fn migrate_legacy<S: KeyValueStore + ?Sized>(
    store: &mut S,
    date: NaiveDate,
    day: u8,
    index: usize,
) -> Option<String> {
    let dated = keys::dated_log(&date_key(date), day, index);
    if let Some(raw) = store.get_raw(&dated) {
        return Some(raw);
    }

    let raw = store.get_raw(&keys::legacy_log(day, index))?;
    match store.set_raw(&dated, raw.clone()) {
        Ok(()) => tracing::debug!("Copied legacy log forward into {}", dated),
        Err(e) => tracing::warn!("Failed to copy legacy log into {}: {}", dated, e),
    }
    Some(raw)
}

/// Read/write access to the set log on top of a store
pub struct SetLogStore<'a, S: KeyValueStore + ?Sized> {
    store: &'a mut S,
    active_day: Option<u8>,
}

impl<'a, S: KeyValueStore + ?Sized> SetLogStore<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self {
            store,
            active_day: None,
        }
    }

    /// Program day currently open in the workout view; saves for this day
    /// are mirrored to the undated key
    pub fn with_active_day(mut self, day: u8) -> Self {
        self.active_day = Some(day);
        self
    }

    /// Overwrite the rows for `(date, day, index)`
    pub fn save_log(&mut self, date: NaiveDate, day: u8, index: usize, rows: &[LogRow]) -> Result<()> {
        let dated = keys::dated_log(&date_key(date), day, index);
        self.store.set_json(&dated, rows)?;
        tracing::debug!("Saved {} row(s) under {}", rows.len(), dated);

        if self.active_day == Some(day) {
            let legacy = keys::legacy_log(day, index);
            if let Err(e) = self.store.set_json(&legacy, rows) {
                tracing::warn!("Failed to mirror log into {}: {}", legacy, e);
            }
        }
        Ok(())
    }

    /// Rows for `(date, day, index)`; a single blank row when nothing is stored
    pub fn load_log(&mut self, date: NaiveDate, day: u8, index: usize) -> Vec<LogRow> {
        let Some(raw) = migrate_legacy(&mut *self.store, date, day, index) else {
            return vec![LogRow::blank()];
        };
        match serde_json::from_str(&raw) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("Malformed log for {} day {} #{}: {}", date, day, index, e);
                vec![LogRow::blank()]
            }
        }
    }

    pub fn logged_sets(&self, date: NaiveDate, day: u8, index: usize) -> usize {
        logged_sets(&*self.store, date, day, index)
    }

    /// Replace the title shown for exercise `index` of `day`
    ///
    /// Earlier choices are kept whichever layout they were stored in; both
    /// keys are rewritten in the current layout.
    pub fn choose_variant(&mut self, day: u8, index: usize, title: &str) -> Result<()> {
        let mut by_index = variants_for_day(&*self.store, day);
        by_index.insert(index, title.to_string());

        let by_day: BTreeMap<String, &String> = by_index
            .iter()
            .map(|(i, title)| (format!("{}_{}", day, i), title))
            .collect();
        self.store.set_json(&keys::variants(day), &by_day)?;

        let compact: BTreeMap<String, &String> = by_index
            .iter()
            .map(|(i, title)| (i.to_string(), title))
            .collect();
        self.store.set_json(&keys::variants_by_index(day), &compact)
    }

    pub fn variants_for_day(&self, day: u8) -> BTreeMap<usize, String> {
        variants_for_day(&*self.store, day)
    }

    pub fn set_intent(&mut self, intent: &LogIntent) -> Result<()> {
        self.store.set_json(keys::OPEN_LOG_INTENT, intent)
    }

    /// Consume the pending intent; it is removed even when malformed
    pub fn take_intent(&mut self) -> Result<Option<LogIntent>> {
        if self.store.get_raw(keys::OPEN_LOG_INTENT).is_none() {
            return Ok(None);
        }
        let intent = self.store.get_json(keys::OPEN_LOG_INTENT);
        self.store.remove(keys::OPEN_LOG_INTENT)?;
        Ok(intent)
    }
}

/// Chosen replacement titles for `day`, keyed by exercise index.
///
/// Prefers `variants_<day>_byIndex`; otherwise reads `variants_<day>`, which
/// either nests a `byIndex` map or uses `"<day>_<index>"` keys.
pub fn variants_for_day<S: KeyValueStore + ?Sized>(store: &S, day: u8) -> BTreeMap<usize, String> {
    if let Some(map) = store.get_json::<BTreeMap<String, serde_json::Value>>(&keys::variants_by_index(day)) {
        return index_map(map);
    }

    let Some(map) = store.get_json::<BTreeMap<String, serde_json::Value>>(&keys::variants(day)) else {
        return BTreeMap::new();
    };
    if let Some(serde_json::Value::Object(nested)) = map.get("byIndex") {
        return index_map(nested.clone().into_iter().collect());
    }
    let suffixed = map
        .into_iter()
        .filter_map(|(k, v)| Some((k.rsplit('_').next()?.to_string(), v)))
        .collect();
    index_map(suffixed)
}

fn index_map(map: BTreeMap<String, serde_json::Value>) -> BTreeMap<usize, String> {
    map.into_iter()
        .filter_map(|(k, v)| {
            let index = k.parse().ok()?;
            let title = match v {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => return None,
                other => other.to_string(),
            };
            Some((index, title))
        })
        .collect()
}

/// One-shot request from the calendar to open a log sheet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogIntent {
    pub date: NaiveDate,
    pub day: u8,
    #[serde(rename = "exId", default)]
    pub exercise: usize,
}

// Row editing

pub fn add_row(rows: &mut Vec<LogRow>) {
    rows.push(LogRow::blank());
}

/// Append a copy of the last row (blank when there is none)
pub fn clone_last_row(rows: &mut Vec<LogRow>) {
    let row = rows.last().cloned().unwrap_or_default();
    rows.push(row);
}

/// Remove row `index`; out-of-range indexes are ignored
pub fn remove_row(rows: &mut Vec<LogRow>, index: usize) {
    if index < rows.len() {
        rows.remove(index);
    }
}
