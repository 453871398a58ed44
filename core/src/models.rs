use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::local_store::Namespace;

/// One element of a namespace array in the local store.
///
/// `key` is the upsert identity inside the namespace: two records with the
/// same key never coexist, the later write replaces the earlier one.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const NAMESPACE: Namespace;

    fn key(&self) -> String;

    fn date(&self) -> Option<NaiveDate> {
        None
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// --- Body tracking ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyMeasurement {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub body_fat: Option<f64>,
    #[serde(default)]
    pub muscle_mass: Option<f64>,
}

impl Record for BodyMeasurement {
    const NAMESPACE: Namespace = Namespace::BodyMeasurements;

    fn key(&self) -> String {
        self.date.to_string()
    }

    fn date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }
}

/// Circumference measurements in centimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub chest: Option<f64>,
    #[serde(default)]
    pub waist: Option<f64>,
    #[serde(default)]
    pub hips: Option<f64>,
    #[serde(default)]
    pub arm: Option<f64>,
    #[serde(default)]
    pub thigh: Option<f64>,
    #[serde(default)]
    pub calf: Option<f64>,
    #[serde(default)]
    pub neck: Option<f64>,
}

impl Measurement {
    pub fn values(&self) -> [(&'static str, Option<f64>); 7] {
        [
            ("chest", self.chest),
            ("waist", self.waist),
            ("hips", self.hips),
            ("arm", self.arm),
            ("thigh", self.thigh),
            ("calf", self.calf),
            ("neck", self.neck),
        ]
    }
}

impl Record for Measurement {
    const NAMESPACE: Namespace = Namespace::Measurements;

    fn key(&self) -> String {
        self.date.to_string()
    }

    fn date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthRecord {
    pub id: String,
    pub date: NaiveDate,
    pub exercise: String,
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Record for StrengthRecord {
    const NAMESPACE: Namespace = Namespace::StrengthRecords;

    fn key(&self) -> String {
        self.id.clone()
    }

    fn date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressImage {
    pub id: String,
    pub date: NaiveDate,
    /// Wall-clock time the photo was taken, `HH:MM`.
    pub time: String,
    /// Base64 data URL or remote URL.
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Record for ProgressImage {
    const NAMESPACE: Namespace = Namespace::ProgressImages;

    fn key(&self) -> String {
        self.id.clone()
    }

    fn date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }
}

// --- Habits ---

fn default_target() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Completions per day required for the habit to count as done.
    #[serde(default = "default_target")]
    pub target: u32,
}

impl Habit {
    pub fn is_done(&self, count: u32) -> bool {
        count >= self.target
    }
}

impl Record for Habit {
    const NAMESPACE: Namespace = Namespace::Habits;

    fn key(&self) -> String {
        self.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitCompletion {
    pub id: String,
    pub habit_id: String,
    pub date: NaiveDate,
    pub count: u32,
}

impl HabitCompletion {
    pub fn is_done(&self, habit: &Habit) -> bool {
        habit.is_done(self.count)
    }
}

impl Record for HabitCompletion {
    const NAMESPACE: Namespace = Namespace::HabitCompletions;

    fn key(&self) -> String {
        format!("{}:{}", self.habit_id, self.date)
    }

    fn date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }
}

// --- Supplements ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplement {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Record for Supplement {
    const NAMESPACE: Namespace = Namespace::Supplements;

    fn key(&self) -> String {
        self.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementCompletion {
    pub id: String,
    pub supplement_id: String,
    pub date: NaiveDate,
    pub taken: bool,
}

impl Record for SupplementCompletion {
    const NAMESPACE: Namespace = Namespace::SupplementCompletions;

    fn key(&self) -> String {
        format!("{}:{}", self.supplement_id, self.date)
    }

    fn date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }
}

// --- Nutrition ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionRecord {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    /// Litres.
    #[serde(default)]
    pub water: f64,
    #[serde(default)]
    pub target_calories: Option<f64>,
    #[serde(default)]
    pub target_protein: Option<f64>,
    #[serde(default)]
    pub target_water: Option<f64>,
}

impl Record for NutritionRecord {
    const NAMESPACE: Namespace = Namespace::Nutrition;

    fn key(&self) -> String {
        self.date.to_string()
    }

    fn date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }
}

// --- Workout plans ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedExercise {
    pub name: String,
    #[serde(default)]
    pub sets: u32,
    /// Free-form rep scheme such as `8-12`.
    #[serde(default)]
    pub reps: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDay {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    #[serde(default)]
    pub exercises: Vec<PlannedExercise>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanNutrition {
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlan {
    pub id: String,
    pub split_name: String,
    #[serde(default)]
    pub days: Vec<WorkoutDay>,
    #[serde(default)]
    pub nutrition: PlanNutrition,
    /// Supplement ids.
    #[serde(default)]
    pub supplements: Vec<String>,
}

impl Record for WorkoutPlan {
    const NAMESPACE: Namespace = Namespace::WorkoutPlans;

    fn key(&self) -> String {
        self.id.clone()
    }
}

// --- Profile (singleton) ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub body_fat: Option<f64>,
    /// Daily calorie goal.
    #[serde(default)]
    pub calories: Option<f64>,
    /// Daily protein goal in grams.
    #[serde(default)]
    pub protein: Option<f64>,
    /// Hours per night.
    #[serde(default)]
    pub sleep: Option<f64>,
    #[serde(default)]
    pub training_days: Option<u32>,
}

// --- Aggregates ---

#[derive(Debug, Clone, Serialize)]
pub struct HabitStatus {
    pub habit: Habit,
    pub date: NaiveDate,
    pub count: u32,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplementStatus {
    pub supplement: Supplement,
    pub date: NaiveDate,
    pub taken: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NutritionProgress {
    pub date: NaiveDate,
    pub calories: f64,
    pub protein: f64,
    pub water: f64,
    pub target_calories: Option<f64>,
    pub target_protein: Option<f64>,
    pub target_water: Option<f64>,
    pub calories_pct: Option<f64>,
    pub protein_pct: Option<f64>,
    pub water_pct: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightPoint {
    pub date: NaiveDate,
    pub weight: f64,
}

// --- Validation ---

fn validate_positive(field: &str, value: Option<f64>) -> Result<()> {
    if let Some(v) = value {
        if !v.is_finite() || v <= 0.0 {
            bail!("{field} must be greater than 0");
        }
    }
    Ok(())
}

fn validate_percentage(field: &str, value: Option<f64>) -> Result<()> {
    if let Some(v) = value {
        if !v.is_finite() || !(0.0..=100.0).contains(&v) {
            bail!("{field} must be between 0 and 100");
        }
    }
    Ok(())
}

pub fn validate_body_measurement(m: &BodyMeasurement) -> Result<()> {
    if m.weight.is_none() && m.height.is_none() && m.body_fat.is_none() && m.muscle_mass.is_none()
    {
        bail!("At least one of weight, height, body fat or muscle mass is required");
    }
    validate_positive("weight", m.weight)?;
    validate_positive("height", m.height)?;
    validate_percentage("body fat", m.body_fat)?;
    validate_positive("muscle mass", m.muscle_mass)?;
    Ok(())
}

pub fn validate_measurement(m: &Measurement) -> Result<()> {
    if m.values().iter().all(|(_, v)| v.is_none()) {
        bail!("At least one circumference is required");
    }
    for (name, value) in m.values() {
        validate_positive(name, value)?;
    }
    Ok(())
}

pub fn validate_strength_record(r: &StrengthRecord) -> Result<()> {
    if r.exercise.trim().is_empty() {
        bail!("Exercise name cannot be empty");
    }
    if r.sets == 0 || r.reps == 0 {
        bail!("Sets and reps must be at least 1");
    }
    if !r.weight.is_finite() || r.weight < 0.0 {
        bail!("Weight cannot be negative");
    }
    Ok(())
}

pub fn validate_habit(h: &Habit) -> Result<()> {
    if h.name.trim().is_empty() {
        bail!("Habit name cannot be empty");
    }
    if h.target == 0 {
        bail!("Habit target must be at least 1 per day");
    }
    Ok(())
}

pub fn validate_supplement(s: &Supplement) -> Result<()> {
    if s.name.trim().is_empty() {
        bail!("Supplement name cannot be empty");
    }
    Ok(())
}

pub fn validate_nutrition(n: &NutritionRecord) -> Result<()> {
    for (field, value) in [
        ("calories", n.calories),
        ("protein", n.protein),
        ("water", n.water),
    ] {
        if !value.is_finite() || value < 0.0 {
            bail!("{field} cannot be negative");
        }
    }
    validate_positive("target calories", n.target_calories)?;
    validate_positive("target protein", n.target_protein)?;
    validate_positive("target water", n.target_water)?;
    Ok(())
}

pub fn validate_workout_plan(p: &WorkoutPlan) -> Result<()> {
    if p.split_name.trim().is_empty() {
        bail!("Workout plan needs a split name");
    }
    if let Some(day) = p.days.iter().find(|d| d.name.trim().is_empty()) {
        bail!("Workout day with focus {:?} has no name", day.focus);
    }
    Ok(())
}

pub fn validate_profile(p: &Profile) -> Result<()> {
    validate_positive("height", p.height)?;
    validate_positive("weight", p.weight)?;
    validate_percentage("body fat", p.body_fat)?;
    validate_positive("calories", p.calories)?;
    validate_positive("protein", p.protein)?;
    if let Some(sleep) = p.sleep {
        if !(0.0..=24.0).contains(&sleep) {
            bail!("sleep must be between 0 and 24 hours");
        }
    }
    if p.training_days.is_some_and(|d| d > 7) {
        bail!("training days must be between 0 and 7");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn habit(target: u32) -> Habit {
        Habit {
            id: "h1".to_string(),
            name: "Drink water".to_string(),
            description: None,
            icon: None,
            target,
        }
    }

    #[test]
    fn test_habit_done_at_target() {
        let h = habit(3);
        let mut c = HabitCompletion {
            id: "c1".to_string(),
            habit_id: "h1".to_string(),
            date: date("2024-01-01"),
            count: 2,
        };
        assert!(!c.is_done(&h));
        c.count = 3;
        assert!(c.is_done(&h));
        c.count = 4;
        assert!(c.is_done(&h));
    }

    #[test]
    fn test_local_json_uses_camel_case() {
        let m = BodyMeasurement {
            id: "m1".to_string(),
            date: date("2024-01-01"),
            weight: Some(80.0),
            height: None,
            body_fat: Some(15.5),
            muscle_mass: None,
        };
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["bodyFat"], 15.5);
        assert_eq!(json["date"], "2024-01-01");
        assert!(json.get("body_fat").is_none());
    }

    #[test]
    fn test_habit_target_defaults_to_one() {
        let h: Habit = serde_json::from_str(r#"{"id":"h","name":"Read"}"#).unwrap();
        assert_eq!(h.target, 1);
        assert!(h.is_done(1));
        assert!(!h.is_done(0));
    }

    #[test]
    fn test_completion_keys_combine_parent_and_date() {
        let c = SupplementCompletion {
            id: "x".to_string(),
            supplement_id: "s1".to_string(),
            date: date("2024-03-05"),
            taken: true,
        };
        assert_eq!(c.key(), "s1:2024-03-05");
    }

    #[test]
    fn test_validate_body_measurement() {
        let mut m = BodyMeasurement {
            id: new_id(),
            date: date("2024-01-01"),
            weight: None,
            height: None,
            body_fat: None,
            muscle_mass: None,
        };
        assert!(validate_body_measurement(&m).is_err());
        m.weight = Some(80.0);
        assert!(validate_body_measurement(&m).is_ok());
        m.body_fat = Some(120.0);
        assert!(validate_body_measurement(&m).is_err());
        m.body_fat = Some(18.0);
        m.weight = Some(-1.0);
        assert!(validate_body_measurement(&m).is_err());
    }

    #[test]
    fn test_validate_habit_requires_positive_target() {
        assert!(validate_habit(&habit(0)).is_err());
        assert!(validate_habit(&habit(1)).is_ok());
        let mut h = habit(2);
        h.name = "  ".to_string();
        assert!(validate_habit(&h).is_err());
    }

    #[test]
    fn test_validate_strength_record() {
        let mut r = StrengthRecord {
            id: new_id(),
            date: date("2024-01-01"),
            exercise: "Squat".to_string(),
            sets: 5,
            reps: 5,
            weight: 100.0,
            notes: None,
        };
        assert!(validate_strength_record(&r).is_ok());
        r.sets = 0;
        assert!(validate_strength_record(&r).is_err());
        r.sets = 3;
        r.exercise = String::new();
        assert!(validate_strength_record(&r).is_err());
    }

    #[test]
    fn test_validate_profile_ranges() {
        let mut p = Profile {
            sleep: Some(8.0),
            training_days: Some(4),
            ..Profile::default()
        };
        assert!(validate_profile(&p).is_ok());
        p.training_days = Some(8);
        assert!(validate_profile(&p).is_err());
        p.training_days = Some(3);
        p.sleep = Some(25.0);
        assert!(validate_profile(&p).is_err());
    }

    #[test]
    fn test_workout_plan_parses_nested_days() {
        let json = r#"{
            "id": "p1",
            "splitName": "Push/Pull/Legs",
            "days": [{"name": "Push", "exercises": [{"name": "Bench", "sets": 4, "reps": "6-8"}]}],
            "supplements": ["s1"]
        }"#;
        let plan: WorkoutPlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.split_name, "Push/Pull/Legs");
        assert_eq!(plan.days[0].exercises[0].reps, "6-8");
        assert_eq!(plan.nutrition, PlanNutrition::default());
        assert!(validate_workout_plan(&plan).is_ok());
    }
}
