#![forbid(unsafe_code)]

//! Core domain model and business logic for fitplan.
//!
//! This crate provides:
//! - Domain types (onboarding answers, nutrition plan, programs, log rows)
//! - The onboarding state machine and the nutrition plan calculator
//! - The built-in workout program catalog
//! - Set logging and progress summaries (calendar, streaks, supersets)
//! - Persistence through a key-value store port
//! - Rest timer and quick calculators

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod store;
pub mod feedback;
pub mod units;
pub mod calculator;
pub mod onboarding;
pub mod catalog;
pub mod set_log;
pub mod progress;
pub mod timer;
pub mod tools;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreExt};
pub use feedback::{Feedback, SilentFeedback, TracingFeedback};
pub use calculator::{calculate_plan, PlanInput};
pub use onboarding::{Advance, OnboardingAction, OnboardingMachine, OnboardingState};
pub use catalog::{program, select_program, selected_program};
pub use set_log::{LogIntent, SetLogStore};
pub use progress::{compute_streaks, read_day_summary, CourseProgress, Streaks};
pub use timer::RestTimer;
