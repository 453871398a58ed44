use anyhow::Result;

use fitlog_core::models::{self, NutritionProgress, NutritionRecord};
use fitlog_core::service::nutrition_progress;

use super::helpers::{json_error, parse_date, print_json};
use super::plan::load_profile;
use super::{App, load_records, save_record};

pub(crate) struct NutritionInput {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub water: Option<f64>,
    pub target_calories: Option<f64>,
    pub target_protein: Option<f64>,
    pub target_water: Option<f64>,
}

/// Fields left out keep the values already logged for that day.
pub(crate) async fn cmd_nutrition_log(
    app: &App,
    input: NutritionInput,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let existing: Option<NutritionRecord> =
        load_records(app, |t| t.nutrition_for(date).into_iter().collect())
            .await
            .into_iter()
            .find(|n| n.date == date);

    let record = match existing {
        Some(prev) => NutritionRecord {
            calories: input.calories.unwrap_or(prev.calories),
            protein: input.protein.unwrap_or(prev.protein),
            water: input.water.unwrap_or(prev.water),
            target_calories: input.target_calories.or(prev.target_calories),
            target_protein: input.target_protein.or(prev.target_protein),
            target_water: input.target_water.or(prev.target_water),
            ..prev
        },
        None => NutritionRecord {
            id: models::new_id(),
            date,
            calories: input.calories.unwrap_or_default(),
            protein: input.protein.unwrap_or_default(),
            water: input.water.unwrap_or_default(),
            target_calories: input.target_calories,
            target_protein: input.target_protein,
            target_water: input.target_water,
        },
    };
    models::validate_nutrition(&record)?;
    let saved = save_record(app, record, |t, r| t.log_nutrition(r)).await?;

    if json {
        print_json(&saved)?;
    } else {
        println!(
            "Logged {:.0} kcal, {:.0} g protein, {:.1} L water for {}",
            saved.calories, saved.protein, saved.water, saved.date
        );
    }
    Ok(())
}

pub(crate) async fn cmd_nutrition_show(app: &App, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let records: Vec<NutritionRecord> =
        load_records(app, |t| t.nutrition_for(date).into_iter().collect()).await;
    let record = records.iter().find(|n| n.date == date);
    let profile = load_profile(app).await;
    let progress = nutrition_progress(date, record, profile.as_ref());

    if json {
        if record.is_none() {
            println!("{}", json_error(&format!("No nutrition logged for {date}")));
            return Ok(());
        }
        return print_json(&progress);
    }
    if record.is_none() {
        eprintln!("No nutrition logged for {date}.");
    }
    print_progress(&progress);
    Ok(())
}

fn progress_line(
    label: &str,
    value: f64,
    target: Option<f64>,
    pct: Option<f64>,
    unit: &str,
) -> String {
    match (target, pct) {
        (Some(t), Some(p)) => format!("{label:<9} {value:>7.1} / {t:.1} {unit} ({p:.0}%)"),
        _ => format!("{label:<9} {value:>7.1} {unit}"),
    }
}

fn print_progress(p: &NutritionProgress) {
    println!("Nutrition for {}", p.date);
    println!(
        "  {}",
        progress_line("Calories", p.calories, p.target_calories, p.calories_pct, "kcal")
    );
    println!(
        "  {}",
        progress_line("Protein", p.protein, p.target_protein, p.protein_pct, "g")
    );
    println!(
        "  {}",
        progress_line("Water", p.water, p.target_water, p.water_pct, "L")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_line_with_target() {
        assert_eq!(
            progress_line("Calories", 1500.0, Some(2000.0), Some(75.0), "kcal"),
            "Calories   1500.0 / 2000.0 kcal (75%)"
        );
    }

    #[test]
    fn test_progress_line_without_target() {
        assert_eq!(progress_line("Water", 1.5, None, None, "L"), "Water         1.5 L");
    }
}
