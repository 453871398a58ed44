use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;

use fitlog_core::mapping::PROFILE_TABLE;
use fitlog_core::models::{self, Profile, WorkoutPlan};
use fitlog_core::remote::TableBackend;

use super::helpers::{fmt_opt, print_json, short_id};
use super::{App, load_records, save_record, session_hint, warn_fallback};

// --- Workout plans ---

/// Parse a plan document, assigning a fresh id when the file has none.
fn parse_plan(contents: &str) -> Result<WorkoutPlan> {
    let mut value: Value = serde_json::from_str(contents).context("Plan file is not valid JSON")?;
    let Some(obj) = value.as_object_mut() else {
        bail!("Plan file must contain a JSON object");
    };
    let missing_id = obj
        .get("id")
        .and_then(Value::as_str)
        .is_none_or(|id| id.trim().is_empty());
    if missing_id {
        obj.insert("id".to_string(), Value::String(models::new_id()));
    }
    let plan: WorkoutPlan = serde_json::from_value(value).context("Invalid workout plan")?;
    models::validate_workout_plan(&plan)?;
    Ok(plan)
}

pub(crate) async fn cmd_plan_set(app: &App, file: &Path, json: bool) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let plan = parse_plan(&contents)?;
    let saved = save_record(app, plan, |t, p| t.save_workout_plan(p)).await?;

    if json {
        print_json(&saved)?;
    } else {
        println!(
            "Saved plan '{}' with {} day(s) [{}]",
            saved.split_name,
            saved.days.len(),
            short_id(&saved.id)
        );
    }
    Ok(())
}

pub(crate) async fn cmd_plan_show(app: &App, json: bool) -> Result<()> {
    let plans = load_records(app, |t| t.workout_plans()).await;

    if json {
        return print_json(&plans);
    }
    if plans.is_empty() {
        eprintln!("No workout plan saved. Use `fitlog plan set <file>`.");
        return Ok(());
    }
    for plan in &plans {
        println!("{} [{}]", plan.split_name, short_id(&plan.id));
        for day in &plan.days {
            match &day.focus {
                Some(focus) => println!("  {} ({focus})", day.name),
                None => println!("  {}", day.name),
            }
            for ex in &day.exercises {
                println!("    {:<28} {} x {}", ex.name, ex.sets, ex.reps);
            }
        }
        let n = &plan.nutrition;
        if n.calories.is_some() || n.protein.is_some() {
            println!(
                "  Nutrition: {} kcal, {} g protein, {} g carbs, {} g fat",
                fmt_opt(n.calories, 0),
                fmt_opt(n.protein, 0),
                fmt_opt(n.carbs, 0),
                fmt_opt(n.fat, 0)
            );
        }
        if !plan.supplements.is_empty() {
            println!("  Supplements: {}", plan.supplements.len());
        }
    }
    Ok(())
}

// --- Profile ---

#[derive(Default)]
pub(crate) struct ProfileInput {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub body_fat: Option<f64>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub sleep: Option<f64>,
    pub training_days: Option<u32>,
}

impl ProfileInput {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.height.is_none()
            && self.weight.is_none()
            && self.body_fat.is_none()
            && self.calories.is_none()
            && self.protein.is_none()
            && self.sleep.is_none()
            && self.training_days.is_none()
    }

    fn apply(self, profile: Profile) -> Profile {
        Profile {
            name: self.name.or(profile.name),
            age: self.age.or(profile.age),
            height: self.height.or(profile.height),
            weight: self.weight.or(profile.weight),
            body_fat: self.body_fat.or(profile.body_fat),
            calories: self.calories.or(profile.calories),
            protein: self.protein.or(profile.protein),
            sleep: self.sleep.or(profile.sleep),
            training_days: self.training_days.or(profile.training_days),
        }
    }
}

/// Remote profile when signed in, local otherwise or when the backend is
/// unreachable.
pub(super) async fn load_profile<B: TableBackend>(app: &App<B>) -> Option<Profile> {
    if let Some(remote) = app.remote() {
        match remote.get_profile().await {
            Ok(profile) => return profile,
            Err(e) => warn_fallback(PROFILE_TABLE, &e),
        }
    }
    app.tracker.profile()
}

pub(crate) async fn cmd_profile_set(app: &App, input: ProfileInput, json: bool) -> Result<()> {
    if input.is_empty() {
        bail!("Nothing to update. Pass at least one profile field");
    }
    let profile = input.apply(load_profile(app).await.unwrap_or_default());
    models::validate_profile(&profile)?;
    match app.remote() {
        Some(remote) => remote.save_profile(&profile).await.map_err(session_hint)?,
        None => app.tracker.save_profile(&profile)?,
    }

    if json {
        print_json(&profile)?;
    } else {
        println!("Profile updated");
        print_profile(&profile);
    }
    Ok(())
}

pub(crate) async fn cmd_profile_show(app: &App, json: bool) -> Result<()> {
    let profile = load_profile(app).await;

    if json {
        return print_json(&profile);
    }
    match profile {
        Some(p) => print_profile(&p),
        None => eprintln!("No profile yet. Use `fitlog profile set`."),
    }
    Ok(())
}

fn print_profile(p: &Profile) {
    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    println!("  Name:          {}", or_dash(p.name.clone()));
    println!("  Age:           {}", or_dash(p.age.map(|a| a.to_string())));
    println!("  Height:        {} cm", fmt_opt(p.height, 1));
    println!("  Weight:        {} kg", fmt_opt(p.weight, 1));
    println!("  Body fat:      {} %", fmt_opt(p.body_fat, 1));
    println!("  Calories:      {} kcal", fmt_opt(p.calories, 0));
    println!("  Protein:       {} g", fmt_opt(p.protein, 0));
    println!("  Sleep:         {} h", fmt_opt(p.sleep, 1));
    println!(
        "  Training days: {}",
        or_dash(p.training_days.map(|d| d.to_string()))
    );
}
