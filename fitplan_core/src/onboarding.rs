//! Onboarding wizard state machine.
//!
//! The wizard walks the user through 14 fixed steps. State changes go
//! through [`reduce`], a pure transition over [`OnboardingAction`];
//! [`OnboardingMachine`] wraps it with persistence so that every dispatched
//! action re-serializes the whole state to the store.

use crate::calculator::{self, PlanInput, SPEED_MAX_KG_WEEK, SPEED_MIN_KG_WEEK};
use crate::feedback::{Feedback, ImpactStyle};
use crate::store::{keys, KeyValueStore, StoreExt};
use crate::{
    ActivityBucket, Barrier, BirthDate, Diet, Gender, Goal, Locale, MacroPatch, MacrosOverride,
    PlanResult, Result, Units,
};
use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

pub const MIN_STEP: u8 = 1;
pub const MAX_STEP: u8 = 14;

/// Step on which the plan is computed before showing results
pub const LOADING_STEP: u8 = 13;

pub const HEIGHT_MIN_CM: f64 = 140.0;
pub const HEIGHT_MAX_CM: f64 = 220.0;
pub const WEIGHT_MIN_KG: f64 = 40.0;
pub const WEIGHT_MAX_KG: f64 = 200.0;
pub const AGE_MIN: i32 = 14;
pub const AGE_MAX: i32 = 80;

/// Weekly rate at or below which the pace is labelled slow
pub const SPEED_SLOW_KG_WEEK: f64 = 0.4;
/// Weekly rate from which the pace is labelled aggressive
pub const SPEED_AGGRESSIVE_KG_WEEK: f64 = 1.1;

/// Everything the wizard has collected so far
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OnboardingState {
    pub step: u8,
    pub locale: Locale,
    pub gender: Option<Gender>,
    pub birth: BirthDate,
    pub units: Units,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub goal: Option<Goal>,
    pub desired_weight_kg: f64,
    pub speed_kg_week: f64,
    pub activity: Option<ActivityBucket>,
    pub diet: Option<Diet>,
    pub barriers: BTreeSet<Barrier>,
    pub allow_rollover: bool,
    pub add_burned_back: bool,
    pub macros_override: MacrosOverride,
    pub last_plan: Option<PlanResult>,
}

impl Default for OnboardingState {
    fn default() -> Self {
        Self {
            step: MIN_STEP,
            locale: Locale::Uk,
            gender: None,
            birth: BirthDate::default(),
            units: Units::Metric,
            height_cm: 170.0,
            weight_kg: 68.0,
            goal: None,
            desired_weight_kg: 65.0,
            speed_kg_week: 0.5,
            activity: None,
            diet: None,
            barriers: BTreeSet::new(),
            allow_rollover: true,
            add_burned_back: true,
            macros_override: MacrosOverride::default(),
            last_plan: None,
        }
    }
}

/// State transitions of the wizard
#[derive(Clone, Debug, PartialEq)]
pub enum OnboardingAction {
    SetStep(i32),
    Next,
    Prev,
    SetLocale(Locale),
    SetGender(Gender),
    SetBirth(BirthDate),
    SetUnits(Units),
    SetHeightCm(f64),
    SetWeightKg(f64),
    SetGoal(Goal),
    SetDesiredWeightKg(f64),
    SetSpeedKgWeek(f64),
    SetActivity(ActivityBucket),
    ToggleBarrier(Barrier),
    SetDiet(Diet),
    SetAllowRollover(bool),
    SetAddBurnedBack(bool),
    /// Merge into the overrides; a `None` value deletes that key
    SetMacrosOverride(Vec<MacroPatch>),
    SetPlan(PlanResult),
    /// Shallow-merge a JSON object over the current state (load time only)
    Hydrate(Value),
}

/// Pure transition function.
///
/// Every action except `Hydrate` touches only the field it names.
pub fn reduce(state: OnboardingState, action: OnboardingAction) -> OnboardingState {
    use OnboardingAction::*;

    match action {
        Hydrate(payload) => hydrate(state, payload),
        SetStep(step) => OnboardingState {
            step: clamp_step(i64::from(step)),
            ..state
        },
        Next => OnboardingState {
            step: clamp_step(i64::from(state.step) + 1),
            ..state
        },
        Prev => OnboardingState {
            step: clamp_step(i64::from(state.step) - 1),
            ..state
        },
        SetLocale(locale) => OnboardingState { locale, ..state },
        SetGender(gender) => OnboardingState {
            gender: Some(gender),
            ..state
        },
        SetBirth(birth) => OnboardingState { birth, ..state },
        SetUnits(units) => OnboardingState { units, ..state },
        SetHeightCm(height_cm) if height_cm.is_finite() => {
            OnboardingState { height_cm, ..state }
        }
        SetWeightKg(weight_kg) if weight_kg.is_finite() => {
            OnboardingState { weight_kg, ..state }
        }
        SetGoal(goal) => OnboardingState {
            goal: Some(goal),
            ..state
        },
        SetDesiredWeightKg(desired_weight_kg) if desired_weight_kg.is_finite() => {
            OnboardingState {
                desired_weight_kg,
                ..state
            }
        }
        SetHeightCm(value) | SetWeightKg(value) | SetDesiredWeightKg(value) => {
            tracing::warn!("Ignoring non-finite body measurement {}", value);
            state
        }
        SetSpeedKgWeek(speed) => {
            if !speed.is_finite() {
                tracing::warn!("Ignoring non-finite weekly speed {}", speed);
                return state;
            }
            OnboardingState {
                speed_kg_week: clamp_speed(speed),
                ..state
            }
        }
        SetActivity(activity) => OnboardingState {
            activity: Some(activity),
            ..state
        },
        ToggleBarrier(barrier) => {
            let mut barriers = state.barriers;
            if !barriers.remove(&barrier) {
                barriers.insert(barrier);
            }
            OnboardingState { barriers, ..state }
        }
        SetDiet(diet) => OnboardingState {
            diet: Some(diet),
            ..state
        },
        SetAllowRollover(allow_rollover) => OnboardingState {
            allow_rollover,
            ..state
        },
        SetAddBurnedBack(add_burned_back) => OnboardingState {
            add_burned_back,
            ..state
        },
        SetMacrosOverride(patch) => {
            let mut macros_override = state.macros_override;
            for entry in patch {
                macros_override.set(entry.key, entry.value);
            }
            OnboardingState {
                macros_override,
                ..state
            }
        }
        SetPlan(plan) => OnboardingState {
            last_plan: Some(plan),
            ..state
        },
    }
}

/// Merge `payload` over `state` one field at a time.
///
/// A field whose value does not fit its type keeps the current value; the
/// rest of the payload still applies.
fn hydrate(state: OnboardingState, payload: Value) -> OnboardingState {
    let Value::Object(patch) = payload else {
        tracing::warn!("Ignoring onboarding payload that is not a JSON object");
        return state;
    };

    let mut merged = match serde_json::to_value(&state) {
        Ok(Value::Object(map)) => map,
        _ => return state,
    };

    for (key, value) in patch {
        let value = if key == "step" { step_value(value) } else { value };
        let previous = merged.insert(key.clone(), value);
        if let Err(e) = serde_json::from_value::<OnboardingState>(Value::Object(merged.clone())) {
            tracing::warn!("Ignoring malformed onboarding field {}: {}", key, e);
            match previous {
                Some(previous) => merged.insert(key, previous),
                None => merged.remove(&key),
            };
        }
    }

    match serde_json::from_value::<OnboardingState>(Value::Object(merged)) {
        Ok(mut next) => {
            next.step = clamp_step(i64::from(next.step));
            if next.speed_kg_week.is_finite() {
                next.speed_kg_week = clamp_speed(next.speed_kg_week);
            } else {
                next.speed_kg_week = state.speed_kg_week;
            }
            next
        }
        Err(e) => {
            tracing::warn!("Ignoring malformed onboarding payload: {}", e);
            state
        }
    }
}

/// Out-of-range step numbers are clamped rather than rejected
fn step_value(value: Value) -> Value {
    match value.as_f64() {
        Some(step) if step.is_finite() => Value::from(clamp_step(step as i64)),
        _ => value,
    }
}

fn clamp_step(step: i64) -> u8 {
    step.clamp(i64::from(MIN_STEP), i64::from(MAX_STEP)) as u8
}

/// Stored speed is a non-negative magnitude inside the supported range
fn clamp_speed(speed: f64) -> f64 {
    speed.abs().clamp(SPEED_MIN_KG_WEEK, SPEED_MAX_KG_WEEK)
}

// ============================================================================
// Validation
// ============================================================================

/// Whole years between `birth` and `today`.
///
/// A birth date that is not a real calendar date yields 0.
pub fn calc_age(birth: &BirthDate, today: NaiveDate) -> i32 {
    if NaiveDate::from_ymd_opt(birth.year, birth.month, birth.day).is_none() {
        return 0;
    }
    let mut age = today.year() - birth.year;
    if (today.month(), today.day()) < (birth.month, birth.day) {
        age -= 1;
    }
    age
}

/// Whether the current step has what it needs for "Continue"
pub fn is_step_valid(state: &OnboardingState, today: NaiveDate) -> bool {
    match Step::from_number(state.step) {
        Some(Step::Gender) => state.gender.is_some(),
        Some(Step::Birth) => (AGE_MIN..=AGE_MAX).contains(&calc_age(&state.birth, today)),
        Some(Step::Measurements) => {
            (HEIGHT_MIN_CM..=HEIGHT_MAX_CM).contains(&state.height_cm)
                && (WEIGHT_MIN_KG..=WEIGHT_MAX_KG).contains(&state.weight_kg)
        }
        Some(Step::Goal) => state.goal.is_some(),
        Some(Step::DesiredWeight) => {
            (WEIGHT_MIN_KG..=WEIGHT_MAX_KG).contains(&state.desired_weight_kg)
        }
        Some(Step::Speed) => {
            (SPEED_MIN_KG_WEEK..=SPEED_MAX_KG_WEEK).contains(&state.speed_kg_week)
        }
        Some(Step::Activity) => state.activity.is_some(),
        Some(Step::Diet) => state.diet.is_some(),
        _ => true,
    }
}

/// The 14 wizard screens, in order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Gender = 1,
    Birth,
    Measurements,
    Goal,
    DesiredWeight,
    DesiredConfirm,
    Speed,
    Activity,
    Diet,
    Barriers,
    Privacy,
    Options,
    Loading,
    Results,
}

impl Step {
    const ORDER: [Step; MAX_STEP as usize] = [
        Step::Gender,
        Step::Birth,
        Step::Measurements,
        Step::Goal,
        Step::DesiredWeight,
        Step::DesiredConfirm,
        Step::Speed,
        Step::Activity,
        Step::Diet,
        Step::Barriers,
        Step::Privacy,
        Step::Options,
        Step::Loading,
        Step::Results,
    ];

    pub fn from_number(step: u8) -> Option<Step> {
        Self::ORDER.get(usize::from(step).checked_sub(1)?).copied()
    }

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn heading(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Step::Gender, Locale::En) => "Choose your gender",
            (Step::Gender, Locale::Uk) => "Оберіть стать",
            (Step::Birth, Locale::En) => "When were you born?",
            (Step::Birth, Locale::Uk) => "Коли ви народилися?",
            (Step::Measurements, Locale::En) => "Height & weight",
            (Step::Measurements, Locale::Uk) => "Зріст і вага",
            (Step::Goal, Locale::En) => "What is your goal?",
            (Step::Goal, Locale::Uk) => "Яка ваша мета?",
            (Step::DesiredWeight, Locale::En) => "Desired weight",
            (Step::DesiredWeight, Locale::Uk) => "Бажана вага",
            (Step::DesiredConfirm, Locale::En) => "Confirm desired weight",
            (Step::DesiredConfirm, Locale::Uk) => "Підтвердіть бажану вагу",
            (Step::Speed, Locale::En) => "How fast do you want to reach your goal?",
            (Step::Speed, Locale::Uk) => "Як швидко ви хочете досягти мети?",
            (Step::Activity, Locale::En) => "Sessions per week",
            (Step::Activity, Locale::Uk) => "Тренувань на тиждень",
            (Step::Diet, Locale::En) => "Diet preference",
            (Step::Diet, Locale::Uk) => "Тип харчування",
            (Step::Barriers, Locale::En) => "What slows you down?",
            (Step::Barriers, Locale::Uk) => "Що вам заважає?",
            (Step::Privacy, Locale::En) => "Thank you for your trust",
            (Step::Privacy, Locale::Uk) => "Дякуємо за довіру",
            (Step::Options, Locale::En) => "Fine-tune your plan",
            (Step::Options, Locale::Uk) => "Налаштуйте план",
            (Step::Loading, Locale::En) => "Building your plan",
            (Step::Loading, Locale::Uk) => "Створюємо ваш план",
            (Step::Results, Locale::En) => "Congratulations",
            (Step::Results, Locale::Uk) => "Вітаємо",
        }
    }
}

/// Pace classification shown under the speed slider
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeedLabel {
    Slow,
    Recommended,
    Aggressive,
}

impl SpeedLabel {
    pub fn classify(speed_kg_week: f64) -> Self {
        if speed_kg_week <= SPEED_SLOW_KG_WEEK {
            SpeedLabel::Slow
        } else if speed_kg_week < SPEED_AGGRESSIVE_KG_WEEK {
            SpeedLabel::Recommended
        } else {
            SpeedLabel::Aggressive
        }
    }
}

// ============================================================================
// Persistent machine
// ============================================================================

/// Result of a "Continue" gesture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the given step
    Moved(u8),
    /// The current step is incomplete; nothing changed
    Blocked(u8),
    /// Final step confirmed; the profile snapshot was saved
    Finished,
}

/// Wizard state bound to a persisted store
pub struct OnboardingMachine<S: KeyValueStore> {
    store: S,
    state: OnboardingState,
}

impl<S: KeyValueStore> OnboardingMachine<S> {
    /// Create the machine, hydrating any previously saved state over defaults
    pub fn load(store: S) -> Self {
        let state = match store.get_json::<Value>(keys::ONBOARDING) {
            Some(payload) => reduce(OnboardingState::default(), OnboardingAction::Hydrate(payload)),
            None => OnboardingState::default(),
        };
        tracing::debug!("Onboarding loaded at step {}", state.step);
        Self { store, state }
    }

    pub fn state(&self) -> &OnboardingState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Apply `action` and persist the resulting state
    pub fn dispatch(&mut self, action: OnboardingAction) -> Result<()> {
        let current = std::mem::take(&mut self.state);
        self.state = reduce(current, action);
        self.store.set_json(keys::ONBOARDING, &self.state)
    }

    /// Step forward without validation
    pub fn next(&mut self) -> Result<()> {
        self.dispatch(OnboardingAction::Next)
    }

    /// Step back without validation
    pub fn prev(&mut self) -> Result<()> {
        self.dispatch(OnboardingAction::Prev)
    }

    /// Jump to `step` (the "review & edit" shortcut), clamped
    pub fn go(&mut self, step: i32) -> Result<()> {
        self.dispatch(OnboardingAction::SetStep(step))
    }

    pub fn age(&self, today: NaiveDate) -> i32 {
        calc_age(&self.state.birth, today)
    }

    pub fn is_current_step_valid(&self, today: NaiveDate) -> bool {
        is_step_valid(&self.state, today)
    }

    /// The "Continue" button: validate, compute the plan around the loading
    /// step, save the profile on the last step.
    pub fn advance(&mut self, now: DateTime<Local>, feedback: &dyn Feedback) -> Result<Advance> {
        let step = self.state.step;
        if !self.is_current_step_valid(now.date_naive()) {
            tracing::debug!("Step {} incomplete, not advancing", step);
            return Ok(Advance::Blocked(step));
        }

        if step == MAX_STEP {
            self.save_profile()?;
            return Ok(Advance::Finished);
        }

        if step == LOADING_STEP {
            self.compute_plan(now)?;
        }

        feedback.impact(ImpactStyle::Light);
        self.next()?;

        if self.state.step == LOADING_STEP {
            self.compute_plan(now)?;
        }
        Ok(Advance::Moved(self.state.step))
    }

    /// The "Back" button; ignored on the first step
    pub fn back(&mut self, feedback: &dyn Feedback) -> Result<u8> {
        if self.state.step > MIN_STEP {
            feedback.impact(ImpactStyle::Light);
            self.prev()?;
        }
        Ok(self.state.step)
    }

    /// Calculator input for the current answers.
    ///
    /// Unanswered questions fall back to female / maintain / 0-2.
    pub fn plan_input(&self, today: NaiveDate) -> PlanInput {
        let s = &self.state;
        PlanInput {
            gender: s.gender.unwrap_or(Gender::Female),
            age: calc_age(&s.birth, today),
            height_cm: s.height_cm,
            weight_kg: s.weight_kg,
            desired_weight_kg: s.desired_weight_kg,
            goal: s.goal.unwrap_or(Goal::Maintain),
            speed_kg_week: s.speed_kg_week,
            activity: s.activity.unwrap_or(ActivityBucket::Low),
            allow_rollover: s.allow_rollover,
            add_exercise_back: s.add_burned_back,
            overrides: s.macros_override,
        }
    }

    /// Recompute the plan from the current answers and store it
    pub fn compute_plan(&mut self, now: DateTime<Local>) -> Result<PlanResult> {
        let input = self.plan_input(now.date_naive());
        let plan = calculator::calculate_plan(&input, now.with_timezone(&Utc));
        tracing::info!(
            "Computed plan: {} kcal/day, {} weeks to goal",
            plan.target_calories,
            plan.weeks_to_goal
        );
        self.dispatch(OnboardingAction::SetPlan(plan.clone()))?;
        Ok(plan)
    }

    /// Save the profile snapshot read by the tools and results pages
    pub fn save_profile(&mut self) -> Result<()> {
        self.store.set_json(keys::PROFILE, &self.state)?;
        tracing::info!("Saved profile snapshot at step {}", self.state.step);
        Ok(())
    }
}

/// Read the saved profile snapshot, if any
pub fn load_profile(store: &impl KeyValueStore) -> Option<OnboardingState> {
    store.get_json(keys::PROFILE)
}
