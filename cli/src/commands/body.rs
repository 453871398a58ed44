use anyhow::Result;
use tabled::Tabled;

use fitlog_core::models::{self, BodyMeasurement, Measurement};
use fitlog_core::service::weight_points;

use super::helpers::{fmt_opt, parse_date, print_json, print_table};
use super::{App, load_records, save_record};

pub(crate) struct BodyInput {
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub body_fat: Option<f64>,
    pub muscle_mass: Option<f64>,
}

pub(crate) async fn cmd_body_log(
    app: &App,
    input: BodyInput,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let measurement = BodyMeasurement {
        id: models::new_id(),
        date: parse_date(date)?,
        weight: input.weight,
        height: input.height,
        body_fat: input.body_fat,
        muscle_mass: input.muscle_mass,
    };
    models::validate_body_measurement(&measurement)?;
    let saved = save_record(app, measurement, |t, m| t.log_body_measurement(m)).await?;

    if json {
        print_json(&saved)?;
    } else {
        println!("Logged body measurement for {}", saved.date);
        for (label, value, unit) in [
            ("Weight", saved.weight, "kg"),
            ("Height", saved.height, "cm"),
            ("Body fat", saved.body_fat, "%"),
            ("Muscle mass", saved.muscle_mass, "kg"),
        ] {
            if let Some(v) = value {
                println!("  {label}: {v:.1} {unit}");
            }
        }
    }
    Ok(())
}

pub(crate) async fn cmd_body_history(app: &App, last: Option<usize>, json: bool) -> Result<()> {
    let mut records = load_records(app, |t| t.body_history()).await;
    if let Some(n) = last {
        records.truncate(n);
    }

    if json {
        return print_json(&records);
    }
    if records.is_empty() {
        eprintln!("No body measurements yet. Use `fitlog body log` to add one.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct BodyRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Weight (kg)")]
        weight: String,
        #[tabled(rename = "Height (cm)")]
        height: String,
        #[tabled(rename = "Body fat %")]
        body_fat: String,
        #[tabled(rename = "Muscle (kg)")]
        muscle_mass: String,
    }

    let rows: Vec<BodyRow> = records
        .iter()
        .map(|m| BodyRow {
            date: m.date.to_string(),
            weight: fmt_opt(m.weight, 1),
            height: fmt_opt(m.height, 1),
            body_fat: fmt_opt(m.body_fat, 1),
            muscle_mass: fmt_opt(m.muscle_mass, 1),
        })
        .collect();
    print_table(&rows, 1..5);

    let points = weight_points(&records, records.len());
    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        if points.len() > 1 {
            println!(
                "Trend: {:.1} kg ({}) -> {:.1} kg ({}), {:+.1} kg",
                first.weight,
                first.date,
                last.weight,
                last.date,
                last.weight - first.weight
            );
        }
    }
    Ok(())
}

pub(crate) async fn cmd_measure_log(
    app: &App,
    values: Measurement,
    json: bool,
) -> Result<()> {
    models::validate_measurement(&values)?;
    let saved = save_record(app, values, |t, m| t.log_measurement(m)).await?;

    if json {
        print_json(&saved)?;
    } else {
        println!("Logged measurements for {}", saved.date);
        for (name, value) in saved.values() {
            if let Some(v) = value {
                println!("  {name}: {v:.1} cm");
            }
        }
    }
    Ok(())
}

pub(crate) async fn cmd_measure_history(app: &App, json: bool) -> Result<()> {
    let records = load_records(app, |t| t.measurements()).await;

    if json {
        return print_json(&records);
    }
    if records.is_empty() {
        eprintln!("No measurements yet. Use `fitlog measure log` to add some.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct MeasureRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Chest")]
        chest: String,
        #[tabled(rename = "Waist")]
        waist: String,
        #[tabled(rename = "Hips")]
        hips: String,
        #[tabled(rename = "Arm")]
        arm: String,
        #[tabled(rename = "Thigh")]
        thigh: String,
        #[tabled(rename = "Calf")]
        calf: String,
        #[tabled(rename = "Neck")]
        neck: String,
    }

    let rows: Vec<MeasureRow> = records
        .iter()
        .map(|m| MeasureRow {
            date: m.date.to_string(),
            chest: fmt_opt(m.chest, 1),
            waist: fmt_opt(m.waist, 1),
            hips: fmt_opt(m.hips, 1),
            arm: fmt_opt(m.arm, 1),
            thigh: fmt_opt(m.thigh, 1),
            calf: fmt_opt(m.calf, 1),
            neck: fmt_opt(m.neck, 1),
        })
        .collect();
    print_table(&rows, 1..8);
    Ok(())
}
