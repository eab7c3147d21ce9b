use chrono::{Datelike, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use fitplan_core::onboarding::{Step, SpeedLabel};
use fitplan_core::progress::{month_totals, program_day_for, superset_groups, HeatLevel};
use fitplan_core::units::{feet_inches_to_cm, kg_to_lb, lb_to_kg, round_tenth};
use fitplan_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fitplan")]
#[command(about = "Nutrition plan and workout log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk through the onboarding questionnaire
    Onboard {
        #[command(subcommand)]
        action: OnboardCommand,
    },

    /// Choose or inspect the workout program
    Program {
        #[command(subcommand)]
        action: ProgramCommand,
    },

    /// Record and read logged sets
    Log {
        #[command(subcommand)]
        action: LogCommand,
    },

    /// Summary of one training day
    Day {
        /// Date (YYYY-MM-DD), today by default
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Month heatmap of logged sets
    Calendar {
        /// Month (YYYY-MM), the current month by default
        #[arg(long)]
        month: Option<String>,
    },

    /// Current and best training streaks
    Streaks {
        /// Days to look back
        #[arg(long)]
        window: Option<u32>,
    },

    /// Quick calculators
    Tools {
        #[command(subcommand)]
        action: ToolsCommand,
    },

    /// Rest timer between sets
    Timer {
        #[command(subcommand)]
        action: TimerCommand,
    },

    /// Demo course completion
    Course {
        #[command(subcommand)]
        action: CourseCommand,
    },
}

#[derive(Subcommand)]
enum OnboardCommand {
    /// Show the current step and answers
    Show,
    /// Answer a question (e.g. `gender female`, `birth 1995-01-01`, `weight 70`)
    Set { field: String, value: String },
    /// Step forward without validation
    Next,
    /// Step back
    Prev,
    /// Jump to a step
    Go {
        #[arg(allow_negative_numbers = true)]
        step: i32,
    },
    /// Continue: validate the current step and move on
    Advance,
    /// Compute and show the nutrition plan
    Plan,
    /// Save the profile snapshot
    Save,
}

#[derive(Subcommand)]
enum ProgramCommand {
    /// Make a program active
    Select {
        #[arg(long)]
        level: Level,
        #[arg(long)]
        track: Track,
    },
    /// Show the active program
    Show {
        /// Only this program day (1-3)
        #[arg(long)]
        day: Option<u8>,
    },
}

#[derive(Subcommand)]
enum LogCommand {
    /// Append a set
    Add {
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Program day (1-3); derived from the date when omitted
        #[arg(long)]
        day: Option<u8>,
        /// Exercise index within the day
        #[arg(long)]
        exercise: usize,
        #[arg(long)]
        kg: String,
        #[arg(long)]
        reps: String,
    },
    /// Show the sets of one exercise
    Show {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        day: Option<u8>,
        #[arg(long)]
        exercise: usize,
    },
    /// Replace an exercise title with a variant
    Variant {
        #[arg(long)]
        day: u8,
        #[arg(long)]
        exercise: usize,
        title: String,
    },
}

#[derive(Subcommand)]
enum ToolsCommand {
    /// Daily energy expenditure estimate
    Tdee {
        #[arg(long)]
        gender: Gender,
        #[arg(long)]
        height: f64,
        #[arg(long)]
        weight: f64,
        #[arg(long)]
        age: f64,
        /// Activity level 1-5
        #[arg(long, default_value_t = 3)]
        activity: u8,
        /// Remember these answers
        #[arg(long)]
        save: bool,
    },
    /// One-rep max estimate (Epley)
    OneRepMax {
        #[arg(long)]
        weight: f64,
        #[arg(long)]
        reps: u32,
    },
    /// Show the saved TDEE answers
    Profile,
}

#[derive(Subcommand)]
enum TimerCommand {
    /// Start a preset countdown
    Start { minutes: u32 },
    /// Show the remaining time
    Status,
    /// Advance the countdown
    Tick {
        #[arg(long, default_value_t = 1)]
        seconds: u32,
    },
    /// Stop and clear the timer
    Reset,
}

#[derive(Subcommand)]
enum CourseCommand {
    /// Mark a course day done or not done
    Toggle { day: u32 },
    /// Show completion
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    fitplan_core::logging::init(cli.verbose);

    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }
    let store_path = config.data.store_path();
    tracing::debug!("Using store at {:?}", store_path);
    let store = JsonFileStore::open(store_path)?;

    match cli.command {
        Commands::Onboard { action } => cmd_onboard(store, action),
        Commands::Program { action } => cmd_program(store, action),
        Commands::Log { action } => cmd_log(store, action),
        Commands::Day { date } => cmd_day(&store, date.unwrap_or_else(today)),
        Commands::Calendar { month } => cmd_calendar(&store, month),
        Commands::Streaks { window } => {
            let window = window.unwrap_or(config.calendar.streak_window_days);
            let streaks = compute_streaks(&store, today(), window);
            println!("Current streak: {}", streaks.current);
            println!("Best streak:    {} (last {} days)", streaks.best, window);
            Ok(())
        }
        Commands::Tools { action } => cmd_tools(store, action),
        Commands::Timer { action } => cmd_timer(store, action, &config),
        Commands::Course { action } => cmd_course(store, action),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ============================================================================
// Onboarding
// ============================================================================

fn cmd_onboard(store: JsonFileStore, action: OnboardCommand) -> Result<()> {
    let mut machine = OnboardingMachine::load(store);
    let feedback = TracingFeedback;

    match action {
        OnboardCommand::Show => display_onboarding(machine.state()),
        OnboardCommand::Set { field, value } => {
            let action = parse_answer(&field, &value, machine.state())?;
            machine.dispatch(action)?;
            display_onboarding(machine.state());
        }
        OnboardCommand::Next => {
            machine.next()?;
            display_step(machine.state());
        }
        OnboardCommand::Prev => {
            machine.back(&feedback)?;
            display_step(machine.state());
        }
        OnboardCommand::Go { step } => {
            machine.go(step)?;
            display_step(machine.state());
        }
        OnboardCommand::Advance => match machine.advance(Local::now(), &feedback)? {
            Advance::Moved(_) => display_step(machine.state()),
            Advance::Blocked(step) => {
                println!("Step {} is incomplete, answer it before continuing.", step)
            }
            Advance::Finished => println!("✓ Profile saved"),
        },
        OnboardCommand::Plan => {
            let plan = machine.compute_plan(Local::now())?;
            display_plan(&plan);
        }
        OnboardCommand::Save => {
            machine.save_profile()?;
            println!("✓ Profile saved");
        }
    }
    Ok(())
}

/// Turn `field value` into an action. Weights and heights are read in the
/// selected display units.
fn parse_answer(field: &str, value: &str, state: &OnboardingState) -> Result<OnboardingAction> {
    let imperial = state.units == Units::Imperial;
    let action = match field {
        "locale" => OnboardingAction::SetLocale(value.parse()?),
        "gender" => OnboardingAction::SetGender(value.parse()?),
        "birth" => OnboardingAction::SetBirth(parse_birth(value)?),
        "units" => OnboardingAction::SetUnits(value.parse()?),
        "height" if imperial => OnboardingAction::SetHeightCm(parse_feet_inches(value)?),
        "height" => OnboardingAction::SetHeightCm(parse_number(value)?),
        "weight" => OnboardingAction::SetWeightKg(parse_weight(value, imperial)?),
        "goal" => OnboardingAction::SetGoal(value.parse()?),
        "desired-weight" => OnboardingAction::SetDesiredWeightKg(parse_weight(value, imperial)?),
        "speed" => OnboardingAction::SetSpeedKgWeek(parse_number(value)?),
        "activity" => OnboardingAction::SetActivity(value.parse()?),
        "diet" => OnboardingAction::SetDiet(value.parse()?),
        "barrier" => OnboardingAction::ToggleBarrier(value.parse()?),
        "allow-rollover" => OnboardingAction::SetAllowRollover(parse_bool(value)?),
        "add-burned-back" => OnboardingAction::SetAddBurnedBack(parse_bool(value)?),
        other => match other.parse::<MacroKey>() {
            Ok(key) => {
                let value = match value {
                    "none" | "clear" => None,
                    v => Some(parse_number(v)?),
                };
                OnboardingAction::SetMacrosOverride(vec![MacroPatch { key, value }])
            }
            Err(_) => {
                return Err(Error::InvalidInput(format!("unknown field '{}'", other)));
            }
        },
    };
    Ok(action)
}

fn parse_number(value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| Error::InvalidInput(format!("'{}' is not a number", value)))
}

fn parse_weight(value: &str, imperial: bool) -> Result<f64> {
    let n = parse_number(value)?;
    Ok(if imperial { round_tenth(lb_to_kg(n)) } else { n })
}

/// `5'7` or `5'7"` to centimetres
fn parse_feet_inches(value: &str) -> Result<f64> {
    let invalid = || Error::InvalidInput(format!("height '{}' should look like 5'7", value));
    let (feet, inches) = value.trim().trim_end_matches('"').split_once('\'').ok_or_else(invalid)?;
    let feet: u32 = feet.trim().parse().map_err(|_| invalid())?;
    let inches: u32 = match inches.trim() {
        "" => 0,
        s => s.parse().map_err(|_| invalid())?,
    };
    Ok(feet_inches_to_cm(feet, inches))
}

/// `YYYY-MM-DD`, kept as entered even when it is not a real date
fn parse_birth(value: &str) -> Result<BirthDate> {
    let invalid = || Error::InvalidInput(format!("birth date '{}' should be YYYY-MM-DD", value));
    let mut parts = value.trim().splitn(3, '-');
    let mut next = || parts.next().and_then(|p| p.parse::<i64>().ok());
    let (year, month, day) = (next(), next(), next());
    match (year, month, day) {
        (Some(year), Some(month), Some(day)) => Ok(BirthDate {
            day: u32::try_from(day).map_err(|_| invalid())?,
            month: u32::try_from(month).map_err(|_| invalid())?,
            year: i32::try_from(year).map_err(|_| invalid())?,
        }),
        _ => Err(invalid()),
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(Error::InvalidInput(format!("'{}' is not yes/no", other))),
    }
}

fn display_step(state: &OnboardingState) {
    let heading = Step::from_number(state.step)
        .map(|s| s.heading(state.locale))
        .unwrap_or_default();
    println!("Step {}/{}: {}", state.step, onboarding::MAX_STEP, heading);
}

fn display_onboarding(state: &OnboardingState) {
    display_step(state);
    let complete = onboarding::is_step_valid(state, today());
    println!("  Complete: {}", if complete { "yes" } else { "no" });
    println!();

    let opt = |v: Option<&str>| v.unwrap_or("-").to_string();
    println!("  Gender:     {}", opt(state.gender.as_ref().map(|g| g.as_str())));
    println!(
        "  Birth:      {:04}-{:02}-{:02} (age {})",
        state.birth.year,
        state.birth.month,
        state.birth.day,
        onboarding::calc_age(&state.birth, today())
    );
    match state.units {
        Units::Metric => {
            println!("  Height:     {} cm", state.height_cm);
            println!("  Weight:     {} kg", state.weight_kg);
            println!("  Desired:    {} kg", state.desired_weight_kg);
        }
        Units::Imperial => {
            let (ft, inch) = units::cm_to_feet_inches(state.height_cm);
            println!("  Height:     {}'{}\"", ft, inch);
            println!("  Weight:     {} lb", round_tenth(kg_to_lb(state.weight_kg)));
            println!("  Desired:    {} lb", round_tenth(kg_to_lb(state.desired_weight_kg)));
        }
    }
    println!("  Goal:       {}", opt(state.goal.as_ref().map(|g| g.as_str())));
    println!(
        "  Speed:      {} kg/week ({:?})",
        state.speed_kg_week,
        SpeedLabel::classify(state.speed_kg_week)
    );
    println!("  Activity:   {}", opt(state.activity.as_ref().map(|a| a.as_str())));
    println!("  Diet:       {}", opt(state.diet.as_ref().map(|d| d.as_str())));
    let barriers: Vec<&str> = state.barriers.iter().map(|b| b.as_str()).collect();
    println!("  Barriers:   {}", if barriers.is_empty() { "-".into() } else { barriers.join(", ") });
    if !state.macros_override.is_empty() {
        for key in MacroKey::ALL {
            if let Some(v) = state.macros_override.get(*key) {
                println!("  Override:   {} = {}", key, v);
            }
        }
    }
    if let Some(plan) = &state.last_plan {
        println!();
        display_plan(plan);
    }
}

fn display_plan(plan: &PlanResult) {
    println!("Daily calories: {} kcal", plan.target_calories);
    println!("  Protein: {} g", plan.protein_g);
    println!("  Fat:     {} g", plan.fat_g);
    println!("  Carbs:   {} g", plan.carbs_g);
    println!("  BMR {} / TDEE {} / {:+} kcal per day", plan.bmr, plan.tdee, plan.delta_per_day);
    println!("  Weeks to goal: {} (target {})", plan.weeks_to_goal, plan.target_date_iso);
    println!("  Metabolic age: {}", plan.metabolic_age);
}

// ============================================================================
// Program and log
// ============================================================================

fn cmd_program(mut store: JsonFileStore, action: ProgramCommand) -> Result<()> {
    match action {
        ProgramCommand::Select { level, track } => {
            let program = select_program(&mut store, level, track, Utc::now())?;
            println!("✓ Active program: {} / {}", program.level, program.track);
            println!("  {}", program.goal);
        }
        ProgramCommand::Show { day } => {
            let program = selected_program(&store);
            println!("{} / {}: {}", program.level, program.track, program.goal);
            let days: Vec<u8> = match day {
                Some(d) => vec![validate_day(d)?],
                None => (1..=catalog::PROGRAM_DAYS).collect(),
            };
            for d in days {
                let plan = program.day(d);
                println!();
                println!("{} ({} sets)", plan.title, plan.planned_total());
                for (i, ex) in plan.exercises.iter().enumerate() {
                    println!("  {}. {}  {}", i, ex.title, ex.sets.unwrap_or("-"));
                }
            }
        }
    }
    Ok(())
}

fn validate_day(day: u8) -> Result<u8> {
    if (1..=catalog::PROGRAM_DAYS).contains(&day) {
        Ok(day)
    } else {
        Err(Error::InvalidInput(format!("program day must be 1-3, got {}", day)))
    }
}

fn resolve_day(date: NaiveDate, day: Option<u8>) -> Result<u8> {
    match day {
        Some(d) => validate_day(d),
        None => program_day_for(date).ok_or_else(|| {
            Error::InvalidInput(format!("{} has no scheduled workout; pass --day", date))
        }),
    }
}

fn cmd_log(mut store: JsonFileStore, action: LogCommand) -> Result<()> {
    let active = program_day_for(today());
    let mut log = SetLogStore::new(&mut store);
    if let Some(day) = active {
        log = log.with_active_day(day);
    }

    match action {
        LogCommand::Add {
            date,
            day,
            exercise,
            kg,
            reps,
        } => {
            let date = date.unwrap_or_else(today);
            let day = resolve_day(date, day)?;
            let mut rows = log.load_log(date, day, exercise);
            if rows == [LogRow::blank()] {
                rows.clear();
            }
            rows.push(LogRow::new(kg, reps));
            log.save_log(date, day, exercise, &rows)?;
            TracingFeedback.notify(feedback::NotificationKind::Success);
            println!("✓ Logged set {} for day {} exercise {} on {}", rows.len(), day, exercise, date);
        }
        LogCommand::Show {
            date,
            day,
            exercise,
        } => {
            let date = date.unwrap_or_else(today);
            let day = resolve_day(date, day)?;
            for (i, row) in log.load_log(date, day, exercise).iter().enumerate() {
                println!("  {}. {} kg × {}", i + 1, or_dash(&row.kg), or_dash(&row.reps));
            }
        }
        LogCommand::Variant {
            day,
            exercise,
            title,
        } => {
            let day = validate_day(day)?;
            log.choose_variant(day, exercise, &title)?;
            println!("✓ Day {} exercise {} is now '{}'", day, exercise, title);
        }
    }
    Ok(())
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

// ============================================================================
// Progress
// ============================================================================

fn cmd_day(store: &JsonFileStore, date: NaiveDate) -> Result<()> {
    let summary = read_day_summary(store, date, true);
    let Some(day) = summary.program_day else {
        println!("{}: rest day", date);
        return Ok(());
    };

    println!("{}: program day {} - total sets {}", date, day, summary.total_sets);
    for group in superset_groups(store, date, day) {
        println!("  Group {}: {}/{} ({:?})", group.label, group.actual, group.planned, group.status);
    }
    for (i, ex) in summary.exercises.iter().enumerate() {
        let last = ex
            .last
            .as_ref()
            .map(|r| format!(", last {} kg × {}", or_dash(&r.kg), or_dash(&r.reps)))
            .unwrap_or_default();
        println!("  {}. {}: {} set(s){}", i, ex.title, ex.sets, last);
    }
    Ok(())
}

fn cmd_calendar(store: &JsonFileStore, month: Option<String>) -> Result<()> {
    let (year, month) = match month {
        Some(m) => parse_month(&m)?,
        None => (today().year(), today().month()),
    };
    let totals = month_totals(store, year, month)?;
    let cells = fitplan_core::progress::month_matrix(year, month)?;

    println!("{:04}-{:02}", year, month);
    println!(" Mo  Tu  We  Th  Fr  Sa  Su");
    let mut days = totals.days.iter();
    for week in cells.chunks(7) {
        let line: Vec<String> = week
            .iter()
            .map(|cell| match cell.and_then(|_| days.next()) {
                Some(total) => {
                    let mark = match total.heat {
                        HeatLevel::Neutral => ' ',
                        HeatLevel::InProgress => '+',
                        HeatLevel::Complete => '#',
                    };
                    format!("{:>3}{}", total.date.day(), mark)
                }
                None => "    ".to_string(),
            })
            .collect();
        println!("{}", line.join("").trim_end());
    }
    println!();
    println!("Training days: {}", totals.training_days);
    Ok(())
}

fn parse_month(value: &str) -> Result<(i32, u32)> {
    let invalid = || Error::InvalidInput(format!("month '{}' should be YYYY-MM", value));
    let (y, m) = value.trim().split_once('-').ok_or_else(invalid)?;
    Ok((y.parse().map_err(|_| invalid())?, m.parse().map_err(|_| invalid())?))
}

// ============================================================================
// Tools, timer, course
// ============================================================================

fn cmd_tools(mut store: JsonFileStore, action: ToolsCommand) -> Result<()> {
    match action {
        ToolsCommand::Tdee {
            gender,
            height,
            weight,
            age,
            activity,
            save,
        } => {
            let tdee = if save {
                tools::save_calorie_profile(&mut store, gender, height, weight, age, activity, today())?.tdee
            } else {
                tools::quick_tdee(gender, height, weight, age, activity)
            };
            println!("TDEE: {} kcal/day", tdee);
        }
        ToolsCommand::OneRepMax { weight, reps } => {
            println!("1RM: {} kg", tools::one_rep_max(weight, reps));
        }
        ToolsCommand::Profile => {
            let locale = tools::profile_locale(&store);
            match (tools::load_calorie_profile(&store), locale) {
                (Some(profile), Locale::En) => {
                    println!("Calorie profile (saved {})", profile.updated);
                    println!(
                        "  {}, {} cm, {} kg, {} years, activity {}",
                        profile.gender, profile.height, profile.weight, profile.age, profile.activity
                    );
                    println!("TDEE: {} kcal/day", profile.tdee);
                }
                (Some(profile), Locale::Uk) => {
                    println!("Профіль калорій (збережено {})", profile.updated);
                    println!(
                        "  {}, {} см, {} кг, {} р., активність {}",
                        profile.gender, profile.height, profile.weight, profile.age, profile.activity
                    );
                    println!("TDEE: {} ккал/день", profile.tdee);
                }
                (None, Locale::En) => println!("No saved calorie profile"),
                (None, Locale::Uk) => println!("Профіль калорій не збережено"),
            }
        }
    }
    Ok(())
}

fn cmd_timer(mut store: JsonFileStore, action: TimerCommand, config: &Config) -> Result<()> {
    let feedback = TracingFeedback;
    let mut timer = RestTimer::load(&store);

    match action {
        TimerCommand::Start { minutes } => {
            if !config.timer.presets_minutes.contains(&minutes) {
                return Err(Error::InvalidInput(format!(
                    "{} min is not a preset ({:?})",
                    minutes, config.timer.presets_minutes
                )));
            }
            timer.start(&mut store, minutes, &feedback)?;
        }
        TimerCommand::Status => {}
        TimerCommand::Tick { seconds } => {
            for _ in 0..seconds {
                if timer.tick(&mut store, &feedback)? {
                    println!("✓ Rest is over");
                    break;
                }
            }
        }
        TimerCommand::Reset => timer.reset(&mut store, &feedback)?,
    }

    let state = if timer.is_running() { "running" } else { "stopped" };
    println!("Timer {} ({})", timer.display(), state);
    Ok(())
}

fn cmd_course(mut store: JsonFileStore, action: CourseCommand) -> Result<()> {
    let progress = match action {
        CourseCommand::Toggle { day } => {
            let progress = CourseProgress::toggle_day_done(&mut store, day)?;
            let state = if progress.is_done(day) { "done" } else { "not done" };
            println!("Day {} marked {}", day, state);
            progress
        }
        CourseCommand::Status => CourseProgress::load(&store),
    };
    println!(
        "Course: {}% ({}/{} days)",
        progress.percent(),
        progress.done.len(),
        fitplan_core::progress::COURSE_DAYS
    );
    Ok(())
}
