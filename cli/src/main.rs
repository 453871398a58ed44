mod backend;
mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{
    App, BodyInput, Credentials, NutritionInput, ProfileInput, StrengthInput, SupplementInput,
    cmd_body_history, cmd_body_log, cmd_habit_add, cmd_habit_delete, cmd_habit_done,
    cmd_habit_list, cmd_login, cmd_logout, cmd_measure_history, cmd_measure_log,
    cmd_nutrition_log, cmd_nutrition_show, cmd_photo_add, cmd_photo_delete, cmd_photo_favorite,
    cmd_photo_list, cmd_plan_set, cmd_plan_show, cmd_profile_set, cmd_profile_show, cmd_signup,
    cmd_status, cmd_strength_delete, cmd_strength_history, cmd_strength_log,
    cmd_supplement_add, cmd_supplement_delete, cmd_supplement_list, cmd_supplement_take,
    cmd_wipe,
};
use crate::config::Config;
use fitlog_core::models::{self, Measurement};

#[derive(Parser)]
#[command(
    name = "fitlog",
    version,
    about = "Track body metrics, training, habits and nutrition",
    long_about = "Track body metrics, training, habits and nutrition.\n\n\
        Data is kept on this machine until you log in; logging in uploads it \
        to your account and later commands read and write the account directly."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Body weight, height and composition
    Body {
        #[command(subcommand)]
        command: BodyCommands,
    },
    /// Circumference measurements
    Measure {
        #[command(subcommand)]
        command: MeasureCommands,
    },
    /// Strength training log
    Strength {
        #[command(subcommand)]
        command: StrengthCommands,
    },
    /// Progress photos
    Photo {
        #[command(subcommand)]
        command: PhotoCommands,
    },
    /// Daily habits
    Habit {
        #[command(subcommand)]
        command: HabitCommands,
    },
    /// Supplements and daily intake
    Supplement {
        #[command(subcommand)]
        command: SupplementCommands,
    },
    /// Daily calories, protein and water
    Nutrition {
        #[command(subcommand)]
        command: NutritionCommands,
    },
    /// Workout plan
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Personal profile and goals
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Sign in and upload local data to your account (password read from stdin)
    Login {
        #[arg(long)]
        email: String,
        /// Backend base URL (remembered for later commands)
        #[arg(long)]
        url: Option<String>,
        /// Backend public API key (remembered for later commands)
        #[arg(long)]
        api_key: Option<String>,
        /// Keep namespaces that failed to upload instead of clearing them
        #[arg(long)]
        keep_failed: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create an account (password read from stdin)
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        keep_failed: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sign out and forget the stored session
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show sign-in state and local record counts
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete all local data
    Wipe {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum BodyCommands {
    /// Log weight, height, body fat or muscle mass
    Log {
        /// Weight in kg
        #[arg(long)]
        weight: Option<f64>,
        /// Height in cm
        #[arg(long)]
        height: Option<f64>,
        /// Body fat percentage
        #[arg(long)]
        body_fat: Option<f64>,
        /// Muscle mass in kg
        #[arg(long)]
        muscle_mass: Option<f64>,
        /// Date (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show logged body measurements, newest first
    History {
        /// Only show the last N entries
        #[arg(short, long)]
        last: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum MeasureCommands {
    /// Log circumferences in cm
    Log {
        #[arg(long)]
        chest: Option<f64>,
        #[arg(long)]
        waist: Option<f64>,
        #[arg(long)]
        hips: Option<f64>,
        #[arg(long)]
        arm: Option<f64>,
        #[arg(long)]
        thigh: Option<f64>,
        #[arg(long)]
        calf: Option<f64>,
        #[arg(long)]
        neck: Option<f64>,
        /// Date (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show logged measurements, newest first
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum StrengthCommands {
    /// Log a lift
    Log {
        /// Exercise name
        exercise: String,
        #[arg(long)]
        sets: u32,
        #[arg(long)]
        reps: u32,
        /// Load in kg
        #[arg(long)]
        weight: f64,
        #[arg(long)]
        notes: Option<String>,
        /// Date (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show logged lifts, newest first
    History {
        /// Only show this exercise
        #[arg(short, long)]
        exercise: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a lift by ID (or unique ID prefix)
    Delete {
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PhotoCommands {
    /// Add a progress photo from a file or URL
    Add {
        /// Image file path or http(s) URL
        source: String,
        #[arg(long)]
        notes: Option<String>,
        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Date (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List progress photos, newest first
    List {
        /// Only show favorites
        #[arg(long)]
        favorites: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle the favorite flag
    Favorite {
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a progress photo
    Delete {
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum HabitCommands {
    /// Create a habit
    Add {
        name: String,
        /// Completions per day needed to count as done
        #[arg(short, long, default_value = "1")]
        target: u32,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show habits and their progress for a day
    List {
        /// Date (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record progress on a habit (default: mark it fully done)
    Done {
        id: String,
        /// Completion count for the day
        #[arg(short, long)]
        count: Option<u32>,
        /// Date (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a habit
    Delete {
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SupplementCommands {
    /// Add a supplement
    Add {
        name: String,
        /// e.g. "5 g"
        #[arg(long)]
        dosage: Option<String>,
        /// e.g. "morning", "post-workout"
        #[arg(long)]
        timing: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show supplements and whether they were taken on a day
    List {
        /// Date (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a supplement as taken
    Take {
        id: String,
        /// Mark as not taken instead
        #[arg(long)]
        undo: bool,
        /// Date (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a supplement
    Delete {
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum NutritionCommands {
    /// Record intake and targets for a day (omitted fields keep their value)
    Log {
        /// Calories eaten (kcal)
        #[arg(long)]
        calories: Option<f64>,
        /// Protein eaten (g)
        #[arg(long)]
        protein: Option<f64>,
        /// Water drunk (L)
        #[arg(long)]
        water: Option<f64>,
        #[arg(long)]
        target_calories: Option<f64>,
        #[arg(long)]
        target_protein: Option<f64>,
        #[arg(long)]
        target_water: Option<f64>,
        /// Date (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show intake against targets for a day
    Show {
        /// Date (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Save a workout plan from a JSON file
    Set {
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show saved workout plans
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Update profile fields (omitted fields keep their value)
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        /// Height in cm
        #[arg(long)]
        height: Option<f64>,
        /// Weight in kg
        #[arg(long)]
        weight: Option<f64>,
        /// Body fat percentage
        #[arg(long)]
        body_fat: Option<f64>,
        /// Daily calorie goal
        #[arg(long)]
        calories: Option<f64>,
        /// Daily protein goal (g)
        #[arg(long)]
        protein: Option<f64>,
        /// Sleep goal (hours)
        #[arg(long)]
        sleep: Option<f64>,
        /// Training days per week
        #[arg(long)]
        training_days: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let app = App::open(config)?;

    match cli.command {
        Commands::Body { command } => match command {
            BodyCommands::Log {
                weight,
                height,
                body_fat,
                muscle_mass,
                date,
                json,
            } => {
                let input = BodyInput {
                    weight,
                    height,
                    body_fat,
                    muscle_mass,
                };
                cmd_body_log(&app, input, date, json).await
            }
            BodyCommands::History { last, json } => cmd_body_history(&app, last, json).await,
        },
        Commands::Measure { command } => match command {
            MeasureCommands::Log {
                chest,
                waist,
                hips,
                arm,
                thigh,
                calf,
                neck,
                date,
                json,
            } => {
                let values = Measurement {
                    id: models::new_id(),
                    date: commands::parse_date(date)?,
                    chest,
                    waist,
                    hips,
                    arm,
                    thigh,
                    calf,
                    neck,
                };
                cmd_measure_log(&app, values, json).await
            }
            MeasureCommands::History { json } => cmd_measure_history(&app, json).await,
        },
        Commands::Strength { command } => match command {
            StrengthCommands::Log {
                exercise,
                sets,
                reps,
                weight,
                notes,
                date,
                json,
            } => {
                let input = StrengthInput {
                    exercise,
                    sets,
                    reps,
                    weight,
                    notes,
                };
                cmd_strength_log(&app, input, date, json).await
            }
            StrengthCommands::History { exercise, json } => {
                cmd_strength_history(&app, exercise.as_deref(), json).await
            }
            StrengthCommands::Delete { id, json } => cmd_strength_delete(&app, &id, json).await,
        },
        Commands::Photo { command } => match command {
            PhotoCommands::Add {
                source,
                notes,
                tags,
                date,
                json,
            } => cmd_photo_add(&app, &source, notes, tags, date, json).await,
            PhotoCommands::List { favorites, json } => cmd_photo_list(&app, favorites, json).await,
            PhotoCommands::Favorite { id, json } => cmd_photo_favorite(&app, &id, json).await,
            PhotoCommands::Delete { id, json } => cmd_photo_delete(&app, &id, json).await,
        },
        Commands::Habit { command } => match command {
            HabitCommands::Add {
                name,
                target,
                icon,
                description,
                json,
            } => cmd_habit_add(&app, &name, target, icon, description, json).await,
            HabitCommands::List { date, json } => cmd_habit_list(&app, date, json).await,
            HabitCommands::Done {
                id,
                count,
                date,
                json,
            } => cmd_habit_done(&app, &id, count, date, json).await,
            HabitCommands::Delete { id, json } => cmd_habit_delete(&app, &id, json).await,
        },
        Commands::Supplement { command } => match command {
            SupplementCommands::Add {
                name,
                dosage,
                timing,
                category,
                json,
            } => {
                let input = SupplementInput {
                    name,
                    dosage,
                    timing,
                    category,
                };
                cmd_supplement_add(&app, input, json).await
            }
            SupplementCommands::List { date, json } => cmd_supplement_list(&app, date, json).await,
            SupplementCommands::Take {
                id,
                undo,
                date,
                json,
            } => cmd_supplement_take(&app, &id, undo, date, json).await,
            SupplementCommands::Delete { id, json } => {
                cmd_supplement_delete(&app, &id, json).await
            }
        },
        Commands::Nutrition { command } => match command {
            NutritionCommands::Log {
                calories,
                protein,
                water,
                target_calories,
                target_protein,
                target_water,
                date,
                json,
            } => {
                let input = NutritionInput {
                    calories,
                    protein,
                    water,
                    target_calories,
                    target_protein,
                    target_water,
                };
                cmd_nutrition_log(&app, input, date, json).await
            }
            NutritionCommands::Show { date, json } => cmd_nutrition_show(&app, date, json).await,
        },
        Commands::Plan { command } => match command {
            PlanCommands::Set { file, json } => cmd_plan_set(&app, &file, json).await,
            PlanCommands::Show { json } => cmd_plan_show(&app, json).await,
        },
        Commands::Profile { command } => match command {
            ProfileCommands::Set {
                name,
                age,
                height,
                weight,
                body_fat,
                calories,
                protein,
                sleep,
                training_days,
                json,
            } => {
                let input = ProfileInput {
                    name,
                    age,
                    height,
                    weight,
                    body_fat,
                    calories,
                    protein,
                    sleep,
                    training_days,
                };
                cmd_profile_set(&app, input, json).await
            }
            ProfileCommands::Show { json } => cmd_profile_show(&app, json).await,
        },
        Commands::Login {
            email,
            url,
            api_key,
            keep_failed,
            json,
        } => {
            let creds = Credentials {
                email,
                url,
                api_key,
            };
            cmd_login(&app, creds, keep_failed, json).await
        }
        Commands::Signup {
            email,
            url,
            api_key,
            keep_failed,
            json,
        } => {
            let creds = Credentials {
                email,
                url,
                api_key,
            };
            cmd_signup(&app, creds, keep_failed, json).await
        }
        Commands::Logout { json } => cmd_logout(&app, json).await,
        Commands::Status { json } => cmd_status(&app, json),
        Commands::Wipe { yes, json } => cmd_wipe(&app, yes, json),
    }
}
