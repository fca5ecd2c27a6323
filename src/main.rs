//! circuitgen - Circuit workout builder with an interval timer

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};

use circuitgen::tui;
use circuitgen::exercises::{Equipment, JsonBankSource};
use circuitgen::selector::ExerciseSelector;
use circuitgen::session::{AppState, Session};
use circuitgen::storage::Storage;
use circuitgen::timer::RunOutcome;
use circuitgen::workout::{Preview, SlotChoice, TimerConfig};

#[derive(Parser)]
#[command(name = "circuitgen")]
#[command(author, version, about = "Circuit workout builder with an interval timer")]
struct Cli {
    /// Directory holding exercises.json and no_equipment_exercises.json
    #[arg(long, global = true, env = "CIRCUITGEN_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Directory for saved workouts and timer configs
    #[arg(long, global = true, env = "CIRCUITGEN_SAVE_DIR", default_value = "saved_data")]
    save_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List exercise categories and body parts
    Categories {
        #[arg(short, long, value_enum, default_value_t)]
        equipment: Equipment,
    },

    /// Build a workout and show the preview
    Build {
        #[command(flatten)]
        plan: PlanArgs,

        /// Save the built workout under this file name
        #[arg(long)]
        save_workout: Option<String>,

        /// Save the timer settings under this file name
        #[arg(long)]
        save_timer: Option<String>,
    },

    /// Build (or load) a workout and run the timer
    Run {
        #[command(flatten)]
        plan: PlanArgs,
    },

    /// List saved workouts and timer configs
    Saved,
}

#[derive(Args)]
struct PlanArgs {
    /// Exercise slot: `manual:<name>` or `random:<category>/<body part>`
    #[arg(short = 'x', long = "exercise")]
    exercises: Vec<SlotChoice>,

    /// Saved workout to use instead of the slots
    #[arg(long)]
    workout: Option<String>,

    /// Saved timer config to prefill the settings
    #[arg(long)]
    timer: Option<String>,

    /// Work duration in seconds
    #[arg(short, long)]
    work: Option<String>,

    /// Rest duration in seconds
    #[arg(short, long)]
    rest: Option<String>,

    /// Number of rounds
    #[arg(short = 'n', long)]
    rounds: Option<String>,

    #[arg(short, long, value_enum, default_value_t)]
    equipment: Equipment,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let storage = Storage::new(&cli.save_dir);

    match cli.command {
        Some(Commands::Categories { equipment }) => {
            let selector = open_selector(&cli.data_dir, equipment)?;
            println!("Exercise categories ({}):", equipment.label());
            println!("{:-<40}", "");
            for category in selector.exercise_categories() {
                let parts = selector
                    .bank()
                    .body_parts_of(&category)
                    .unwrap_or_default()
                    .join(", ");
                println!("{:16} | {}", category, parts);
            }
        }

        Some(Commands::Build {
            plan,
            save_workout,
            save_timer,
        }) => {
            let (_, preview) = build_preview(&cli.data_dir, &storage, plan)?;
            println!("{}", preview);

            if let Some(name) = save_workout {
                let path = storage.save_workout(&name, &preview.exercises)?;
                println!("Saved workout: {}", path.display());
            }
            if let Some(name) = save_timer {
                let path = storage.save_timer_config(&name, &preview.config)?;
                println!("Saved timer config: {}", path.display());
            }
        }

        Some(Commands::Run { plan }) => {
            let (mut session, preview) = build_preview(&cli.data_dir, &storage, plan)?;
            println!("{}", preview);

            let clock = session.start_run()?;
            match tui::run_in_terminal(clock).await? {
                RunOutcome::Completed => session.finish_run()?,
                RunOutcome::Cancelled => session.abandon_run()?,
            }
        }

        Some(Commands::Saved) => {
            println!("Saved workouts:");
            for name in storage.list_workouts()? {
                println!("  {}", name);
            }
            println!("Saved timers:");
            for name in storage.list_timer_configs()? {
                println!("  {}", name);
            }
        }

        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

fn open_selector(data_dir: &Path, equipment: Equipment) -> Result<ExerciseSelector> {
    ExerciseSelector::new(JsonBankSource::for_equipment(data_dir, equipment))
}

/// Walk a session from the main menu to the preview screen
fn build_preview(data_dir: &Path, storage: &Storage, plan: PlanArgs) -> Result<(Session, Preview)> {
    let mut session = Session::new(open_selector(data_dir, plan.equipment)?);
    session.load()?;

    let workout = match plan.workout.as_deref() {
        Some(name) => storage.load_workout(name)?,
        None => Vec::new(),
    };
    let saved_config = plan
        .timer
        .as_deref()
        .map(|name| storage.load_timer_config(name))
        .transpose()?
        .flatten();
    session.load_saved(workout, saved_config)?;

    if *session.state() == AppState::Configuring {
        session.configure(plan.exercises.len())?;
    }

    let defaults = session.timer_config();
    let config = TimerConfig::parse(
        &plan.work.unwrap_or_else(|| defaults.work_duration().to_string()),
        &plan.rest.unwrap_or_else(|| defaults.rest_duration().to_string()),
        &plan.rounds.unwrap_or_else(|| defaults.rounds().to_string()),
    )?;

    // A loaded workout fills the slots; `--exercise` entries replace it
    let slots = if plan.exercises.is_empty() {
        session.slots().map(<[SlotChoice]>::to_vec).unwrap_or_default()
    } else {
        plan.exercises
    };
    let preview = session.preview(slots, config)?.clone();
    Ok((session, preview))
}
