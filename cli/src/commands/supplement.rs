use anyhow::{Result, bail};
use tabled::Tabled;

use fitlog_core::models::{self, Supplement, SupplementCompletion, SupplementStatus};
use fitlog_core::service::{supplement_completion, supplement_statuses};

use super::helpers::{parse_date, print_json, print_table, resolve_id, short_id};
use super::{App, delete_record, load_records, save_record, session_hint};

pub(crate) struct SupplementInput {
    pub name: String,
    pub dosage: Option<String>,
    pub timing: Option<String>,
    pub category: Option<String>,
}

pub(crate) async fn cmd_supplement_add(
    app: &App,
    input: SupplementInput,
    json: bool,
) -> Result<()> {
    let supplement = Supplement {
        id: models::new_id(),
        name: input.name.trim().to_string(),
        dosage: input.dosage,
        timing: input.timing,
        category: input.category,
        icon: None,
        color: None,
    };
    models::validate_supplement(&supplement)?;
    let saved = save_record(app, supplement, |t, s| t.add_supplement(s)).await?;

    if json {
        print_json(&saved)?;
    } else {
        println!("Added supplement '{}' [{}]", saved.name, short_id(&saved.id));
    }
    Ok(())
}

pub(crate) async fn cmd_supplement_list(app: &App, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let supplements = load_records(app, |t| t.supplements()).await;
    let completions = load_records(app, |t| t.supplement_completions()).await;
    let statuses = supplement_statuses(&supplements, &completions, date);

    if json {
        return print_json(&statuses);
    }
    if statuses.is_empty() {
        eprintln!("No supplements yet. Use `fitlog supplement add` to create one.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct SupplementRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Supplement")]
        name: String,
        #[tabled(rename = "Dosage")]
        dosage: String,
        #[tabled(rename = "Timing")]
        timing: String,
        #[tabled(rename = "Taken")]
        taken: &'static str,
    }

    let rows: Vec<SupplementRow> = statuses
        .iter()
        .map(|s| SupplementRow {
            id: short_id(&s.supplement.id),
            name: s.supplement.name.clone(),
            dosage: s.supplement.dosage.clone().unwrap_or_default(),
            timing: s.supplement.timing.clone().unwrap_or_default(),
            taken: if s.taken { "yes" } else { "" },
        })
        .collect();
    print_table(&rows, 0..0);
    let taken = statuses.iter().filter(|s| s.taken).count();
    println!("{taken}/{} taken on {date}", statuses.len());
    Ok(())
}

pub(crate) async fn cmd_supplement_take(
    app: &App,
    id: &str,
    undo: bool,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let supplements = load_records(app, |t| t.supplements()).await;
    let id = resolve_id(supplements.iter().map(|s| s.id.as_str()), id)?;
    let taken = !undo;

    let status = match app.remote() {
        Some(remote) => {
            let Some(supplement) = supplements.into_iter().find(|s| s.id == id) else {
                bail!("Supplement not found: {id}");
            };
            let existing: Vec<SupplementCompletion> =
                remote.get().await.map_err(session_hint)?;
            remote
                .save(&[supplement_completion(&existing, &id, date, taken)])
                .await
                .map_err(session_hint)?;
            SupplementStatus {
                supplement,
                date,
                taken,
            }
        }
        None => app.tracker.set_supplement_taken(&id, date, taken)?,
    };

    if json {
        print_json(&status)?;
    } else if status.taken {
        println!("Took {} on {}", status.supplement.name, status.date);
    } else {
        println!("Unmarked {} on {}", status.supplement.name, status.date);
    }
    Ok(())
}

pub(crate) async fn cmd_supplement_delete(app: &App, id: &str, json: bool) -> Result<()> {
    let supplements = load_records(app, |t| t.supplements()).await;
    let id = resolve_id(supplements.iter().map(|s| s.id.as_str()), id)?;
    let deleted = delete_record::<Supplement, _>(app, &id, |t, id| t.delete_supplement(id)).await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id, "found": deleted }));
    } else {
        println!("Deleted supplement {}", short_id(&id));
    }
    Ok(())
}
