use anyhow::{Result, bail};
use tabled::Tabled;

use fitlog_core::models::{self, Habit, HabitCompletion, HabitStatus};
use fitlog_core::service::{habit_completion, habit_statuses};

use super::helpers::{parse_date, print_json, print_table, resolve_id, short_id, truncate};
use super::{App, delete_record, load_records, save_record, session_hint};

pub(crate) async fn cmd_habit_add(
    app: &App,
    name: &str,
    target: u32,
    icon: Option<String>,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let habit = Habit {
        id: models::new_id(),
        name: name.trim().to_string(),
        description,
        icon,
        target,
    };
    models::validate_habit(&habit)?;
    let saved = save_record(app, habit, |t, h| t.add_habit(h)).await?;

    if json {
        print_json(&saved)?;
    } else {
        println!(
            "Added habit '{}' ({}x per day) [{}]",
            saved.name,
            saved.target,
            short_id(&saved.id)
        );
    }
    Ok(())
}

pub(crate) async fn cmd_habit_list(app: &App, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let habits = load_records(app, |t| t.habits()).await;
    let completions = load_records(app, |t| t.habit_completions()).await;
    let statuses = habit_statuses(&habits, &completions, date);

    if json {
        return print_json(&statuses);
    }
    if statuses.is_empty() {
        eprintln!("No habits yet. Use `fitlog habit add` to create one.");
        return Ok(());
    }
    print_statuses(&statuses);
    let done = statuses.iter().filter(|s| s.done).count();
    println!("{done}/{} done on {date}", statuses.len());
    Ok(())
}

fn print_statuses(statuses: &[HabitStatus]) {
    #[derive(Tabled)]
    struct HabitRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Habit")]
        name: String,
        #[tabled(rename = "Progress")]
        progress: String,
        #[tabled(rename = "Done")]
        done: &'static str,
    }

    let rows: Vec<HabitRow> = statuses
        .iter()
        .map(|s| HabitRow {
            id: short_id(&s.habit.id),
            name: match &s.habit.icon {
                Some(icon) => format!("{icon} {}", truncate(&s.habit.name, 30)),
                None => truncate(&s.habit.name, 32),
            },
            progress: format!("{}/{}", s.count, s.habit.target),
            done: if s.done { "yes" } else { "" },
        })
        .collect();
    print_table(&rows, 2..3);
}

pub(crate) async fn cmd_habit_done(
    app: &App,
    id: &str,
    count: Option<u32>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let habits = load_records(app, |t| t.habits()).await;
    let id = resolve_id(habits.iter().map(|h| h.id.as_str()), id)?;

    let status = match app.remote() {
        Some(remote) => {
            let Some(habit) = habits.into_iter().find(|h| h.id == id) else {
                bail!("Habit not found: {id}");
            };
            let existing: Vec<HabitCompletion> = remote.get().await.map_err(session_hint)?;
            let count = count.unwrap_or(habit.target);
            remote
                .save(&[habit_completion(&existing, &id, date, count)])
                .await
                .map_err(session_hint)?;
            HabitStatus {
                done: habit.is_done(count),
                habit,
                date,
                count,
            }
        }
        None => {
            let target = habits.iter().find(|h| h.id == id).map_or(1, |h| h.target);
            app.tracker.set_habit_count(&id, date, count.unwrap_or(target))?
        }
    };

    if json {
        print_json(&status)?;
    } else if status.done {
        println!(
            "'{}' done for {} ({}/{})",
            status.habit.name, status.date, status.count, status.habit.target
        );
    } else {
        println!(
            "'{}' at {}/{} for {}",
            status.habit.name, status.count, status.habit.target, status.date
        );
    }
    Ok(())
}

pub(crate) async fn cmd_habit_delete(app: &App, id: &str, json: bool) -> Result<()> {
    let habits = load_records(app, |t| t.habits()).await;
    let id = resolve_id(habits.iter().map(|h| h.id.as_str()), id)?;
    let deleted = delete_record::<Habit, _>(app, &id, |t, id| t.delete_habit(id)).await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id, "found": deleted }));
    } else {
        println!("Deleted habit {}", short_id(&id));
    }
    Ok(())
}
