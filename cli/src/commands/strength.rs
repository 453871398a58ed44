use anyhow::Result;
use tabled::Tabled;

use fitlog_core::models::{self, StrengthRecord};

use super::helpers::{parse_date, print_json, print_table, resolve_id, short_id, truncate};
use super::{App, delete_record, load_records, save_record};

pub(crate) struct StrengthInput {
    pub exercise: String,
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
    pub notes: Option<String>,
}

pub(crate) async fn cmd_strength_log(
    app: &App,
    input: StrengthInput,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let record = StrengthRecord {
        id: models::new_id(),
        date: parse_date(date)?,
        exercise: input.exercise.trim().to_string(),
        sets: input.sets,
        reps: input.reps,
        weight: input.weight,
        notes: input.notes,
    };
    models::validate_strength_record(&record)?;
    let saved = save_record(app, record, |t, r| t.add_strength_record(r)).await?;

    if json {
        print_json(&saved)?;
    } else {
        println!(
            "Logged {} {}x{} @ {:.1} kg on {} [{}]",
            saved.exercise,
            saved.sets,
            saved.reps,
            saved.weight,
            saved.date,
            short_id(&saved.id)
        );
    }
    Ok(())
}

pub(crate) async fn cmd_strength_history(
    app: &App,
    exercise: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut records = load_records(app, |t| t.strength_records(None)).await;
    if let Some(name) = exercise {
        records.retain(|r| r.exercise.eq_ignore_ascii_case(name));
    }

    if json {
        return print_json(&records);
    }
    if records.is_empty() {
        eprintln!("No strength records found. Use `fitlog strength log` to add one.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct StrengthRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Exercise")]
        exercise: String,
        #[tabled(rename = "Sets")]
        sets: u32,
        #[tabled(rename = "Reps")]
        reps: u32,
        #[tabled(rename = "Weight (kg)")]
        weight: String,
        #[tabled(rename = "Volume")]
        volume: String,
        #[tabled(rename = "Notes")]
        notes: String,
    }

    let rows: Vec<StrengthRow> = records
        .iter()
        .map(|r| StrengthRow {
            id: short_id(&r.id),
            date: r.date.to_string(),
            exercise: truncate(&r.exercise, 24),
            sets: r.sets,
            reps: r.reps,
            weight: format!("{:.1}", r.weight),
            volume: format!("{:.0}", f64::from(r.sets * r.reps) * r.weight),
            notes: r.notes.as_deref().map(|n| truncate(n, 30)).unwrap_or_default(),
        })
        .collect();
    print_table(&rows, 3..7);
    Ok(())
}

pub(crate) async fn cmd_strength_delete(app: &App, id: &str, json: bool) -> Result<()> {
    let records = load_records(app, |t| t.strength_records(None)).await;
    let id = resolve_id(records.iter().map(|r| r.id.as_str()), id)?;
    let deleted =
        delete_record::<StrengthRecord, _>(app, &id, |t, id| t.delete_strength_record(id)).await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id, "found": deleted }));
    } else {
        println!("Deleted strength record {}", short_id(&id));
    }
    Ok(())
}
