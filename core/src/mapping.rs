//! Remote-shaped rows and the mapping between them and the local records.
//!
//! Local records serialize with camelCase field names; backend tables use
//! snake_case columns plus a `user_id`. Conversions happen here and nowhere
//! else.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::models::{
    BodyMeasurement, Habit, HabitCompletion, Measurement, NutritionRecord, PlanNutrition, Profile,
    ProgressImage, Record, StrengthRecord, Supplement, SupplementCompletion, WorkoutDay,
    WorkoutPlan,
};
use crate::remote::Order;

/// A local record type with a matching backend table.
pub trait RemoteEntity: Record {
    type Row: Serialize + DeserializeOwned;

    const TABLE: &'static str;
    /// Columns the backend upserts on.
    const CONFLICT: &'static [&'static str];
    /// Row order `get` asks the backend for.
    const ORDER: Order;

    fn to_row(&self, user_id: &str) -> Self::Row;
    fn from_row(row: Self::Row) -> Self;
}

// --- Body tracking ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurementRow {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub date: NaiveDate,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub body_fat: Option<f64>,
    pub muscle_mass: Option<f64>,
}

impl RemoteEntity for BodyMeasurement {
    type Row = BodyMeasurementRow;
    const TABLE: &'static str = "body_measurements";
    const CONFLICT: &'static [&'static str] = &["user_id", "date"];
    const ORDER: Order = Order::desc("date");

    fn to_row(&self, user_id: &str) -> BodyMeasurementRow {
        BodyMeasurementRow {
            id: self.id.clone(),
            user_id: user_id.to_string(),
            date: self.date,
            weight: self.weight,
            height: self.height,
            body_fat: self.body_fat,
            muscle_mass: self.muscle_mass,
        }
    }

    fn from_row(row: BodyMeasurementRow) -> Self {
        BodyMeasurement {
            id: row.id,
            date: row.date,
            weight: row.weight,
            height: row.height,
            body_fat: row.body_fat,
            muscle_mass: row.muscle_mass,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRow {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub date: NaiveDate,
    pub chest: Option<f64>,
    pub waist: Option<f64>,
    pub hips: Option<f64>,
    pub arm: Option<f64>,
    pub thigh: Option<f64>,
    pub calf: Option<f64>,
    pub neck: Option<f64>,
}

impl RemoteEntity for Measurement {
    type Row = MeasurementRow;
    const TABLE: &'static str = "measurements";
    const CONFLICT: &'static [&'static str] = &["user_id", "date"];
    const ORDER: Order = Order::desc("date");

    fn to_row(&self, user_id: &str) -> MeasurementRow {
        MeasurementRow {
            id: self.id.clone(),
            user_id: user_id.to_string(),
            date: self.date,
            chest: self.chest,
            waist: self.waist,
            hips: self.hips,
            arm: self.arm,
            thigh: self.thigh,
            calf: self.calf,
            neck: self.neck,
        }
    }

    fn from_row(row: MeasurementRow) -> Self {
        Measurement {
            id: row.id,
            date: row.date,
            chest: row.chest,
            waist: row.waist,
            hips: row.hips,
            arm: row.arm,
            thigh: row.thigh,
            calf: row.calf,
            neck: row.neck,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthRecordRow {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub date: NaiveDate,
    pub exercise_name: String,
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
    pub notes: Option<String>,
}

impl RemoteEntity for StrengthRecord {
    type Row = StrengthRecordRow;
    const TABLE: &'static str = "strength_records";
    const CONFLICT: &'static [&'static str] = &["id"];
    const ORDER: Order = Order::desc("date");

    fn to_row(&self, user_id: &str) -> StrengthRecordRow {
        StrengthRecordRow {
            id: self.id.clone(),
            user_id: user_id.to_string(),
            date: self.date,
            exercise_name: self.exercise.clone(),
            sets: self.sets,
            reps: self.reps,
            weight: self.weight,
            notes: self.notes.clone(),
        }
    }

    fn from_row(row: StrengthRecordRow) -> Self {
        StrengthRecord {
            id: row.id,
            date: row.date,
            exercise: row.exercise_name,
            sets: row.sets,
            reps: row.reps,
            weight: row.weight,
            notes: row.notes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressImageRow {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub date: NaiveDate,
    pub time: String,
    pub image_data: String,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RemoteEntity for ProgressImage {
    type Row = ProgressImageRow;
    const TABLE: &'static str = "progress_images";
    const CONFLICT: &'static [&'static str] = &["id"];
    const ORDER: Order = Order::desc("date");

    fn to_row(&self, user_id: &str) -> ProgressImageRow {
        ProgressImageRow {
            id: self.id.clone(),
            user_id: user_id.to_string(),
            date: self.date,
            time: self.time.clone(),
            image_data: self.image.clone(),
            notes: self.notes.clone(),
            is_favorite: self.is_favorite,
            tags: self.tags.clone(),
        }
    }

    fn from_row(row: ProgressImageRow) -> Self {
        ProgressImage {
            id: row.id,
            date: row.date,
            time: row.time,
            image: row.image_data,
            notes: row.notes,
            is_favorite: row.is_favorite,
            tags: row.tags,
        }
    }
}

// --- Habits ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitRow {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub target_count: u32,
}

impl RemoteEntity for Habit {
    type Row = HabitRow;
    const TABLE: &'static str = "habits";
    const CONFLICT: &'static [&'static str] = &["id"];
    const ORDER: Order = Order::asc("name");

    fn to_row(&self, user_id: &str) -> HabitRow {
        HabitRow {
            id: self.id.clone(),
            user_id: user_id.to_string(),
            name: self.name.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            target_count: self.target,
        }
    }

    fn from_row(row: HabitRow) -> Self {
        Habit {
            id: row.id,
            name: row.name,
            description: row.description,
            icon: row.icon,
            target: row.target_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitCompletionRow {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub habit_id: String,
    pub date: NaiveDate,
    pub count: u32,
}

impl RemoteEntity for HabitCompletion {
    type Row = HabitCompletionRow;
    const TABLE: &'static str = "habit_completions";
    const CONFLICT: &'static [&'static str] = &["user_id", "habit_id", "date"];
    const ORDER: Order = Order::desc("date");

    fn to_row(&self, user_id: &str) -> HabitCompletionRow {
        HabitCompletionRow {
            id: self.id.clone(),
            user_id: user_id.to_string(),
            habit_id: self.habit_id.clone(),
            date: self.date,
            count: self.count,
        }
    }

    fn from_row(row: HabitCompletionRow) -> Self {
        HabitCompletion {
            id: row.id,
            habit_id: row.habit_id,
            date: row.date,
            count: row.count,
        }
    }
}

// --- Supplements ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplementRow {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub name: String,
    pub dosage: Option<String>,
    pub timing: Option<String>,
    pub category: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl RemoteEntity for Supplement {
    type Row = SupplementRow;
    const TABLE: &'static str = "supplements";
    const CONFLICT: &'static [&'static str] = &["id"];
    const ORDER: Order = Order::asc("name");

    fn to_row(&self, user_id: &str) -> SupplementRow {
        SupplementRow {
            id: self.id.clone(),
            user_id: user_id.to_string(),
            name: self.name.clone(),
            dosage: self.dosage.clone(),
            timing: self.timing.clone(),
            category: self.category.clone(),
            icon: self.icon.clone(),
            color: self.color.clone(),
        }
    }

    fn from_row(row: SupplementRow) -> Self {
        Supplement {
            id: row.id,
            name: row.name,
            dosage: row.dosage,
            timing: row.timing,
            category: row.category,
            icon: row.icon,
            color: row.color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplementCompletionRow {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub supplement_id: String,
    pub date: NaiveDate,
    pub taken: bool,
}

impl RemoteEntity for SupplementCompletion {
    type Row = SupplementCompletionRow;
    const TABLE: &'static str = "supplement_completions";
    const CONFLICT: &'static [&'static str] = &["user_id", "supplement_id", "date"];
    const ORDER: Order = Order::desc("date");

    fn to_row(&self, user_id: &str) -> SupplementCompletionRow {
        SupplementCompletionRow {
            id: self.id.clone(),
            user_id: user_id.to_string(),
            supplement_id: self.supplement_id.clone(),
            date: self.date,
            taken: self.taken,
        }
    }

    fn from_row(row: SupplementCompletionRow) -> Self {
        SupplementCompletion {
            id: row.id,
            supplement_id: row.supplement_id,
            date: row.date,
            taken: row.taken,
        }
    }
}

// --- Nutrition ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionRow {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub date: NaiveDate,
    pub calories: f64,
    pub protein: f64,
    pub water: f64,
    pub target_calories: Option<f64>,
    pub target_protein: Option<f64>,
    pub target_water: Option<f64>,
}

impl RemoteEntity for NutritionRecord {
    type Row = NutritionRow;
    const TABLE: &'static str = "nutrition";
    const CONFLICT: &'static [&'static str] = &["user_id", "date"];
    const ORDER: Order = Order::desc("date");

    fn to_row(&self, user_id: &str) -> NutritionRow {
        NutritionRow {
            id: self.id.clone(),
            user_id: user_id.to_string(),
            date: self.date,
            calories: self.calories,
            protein: self.protein,
            water: self.water,
            target_calories: self.target_calories,
            target_protein: self.target_protein,
            target_water: self.target_water,
        }
    }

    fn from_row(row: NutritionRow) -> Self {
        NutritionRecord {
            id: row.id,
            date: row.date,
            calories: row.calories,
            protein: row.protein,
            water: row.water,
            target_calories: row.target_calories,
            target_protein: row.target_protein,
            target_water: row.target_water,
        }
    }
}

// --- Workout plans ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlanRow {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub split_name: String,
    /// JSON column.
    #[serde(default)]
    pub days: Vec<WorkoutDay>,
    /// JSON column.
    #[serde(default)]
    pub nutrition: PlanNutrition,
    #[serde(default)]
    pub supplement_ids: Vec<String>,
}

impl RemoteEntity for WorkoutPlan {
    type Row = WorkoutPlanRow;
    const TABLE: &'static str = "workout_plans";
    const CONFLICT: &'static [&'static str] = &["id"];
    const ORDER: Order = Order::asc("split_name");

    fn to_row(&self, user_id: &str) -> WorkoutPlanRow {
        WorkoutPlanRow {
            id: self.id.clone(),
            user_id: user_id.to_string(),
            split_name: self.split_name.clone(),
            days: self.days.clone(),
            nutrition: self.nutrition.clone(),
            supplement_ids: self.supplements.clone(),
        }
    }

    fn from_row(row: WorkoutPlanRow) -> Self {
        WorkoutPlan {
            id: row.id,
            split_name: row.split_name,
            days: row.days,
            nutrition: row.nutrition,
            supplements: row.supplement_ids,
        }
    }
}

// --- Profile ---

pub const PROFILE_TABLE: &str = "profiles";
pub const PROFILE_CONFLICT: &[&str] = &["user_id"];

/// One row per user, keyed by `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub user_id: String,
    pub name: Option<String>,
    pub age: Option<u32>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub body_fat: Option<f64>,
    pub daily_calories: Option<f64>,
    pub daily_protein: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub training_days: Option<u32>,
}

impl ProfileRow {
    pub fn from_profile(profile: &Profile, user_id: &str) -> Self {
        ProfileRow {
            user_id: user_id.to_string(),
            name: profile.name.clone(),
            age: profile.age,
            height: profile.height,
            weight: profile.weight,
            body_fat: profile.body_fat,
            daily_calories: profile.calories,
            daily_protein: profile.protein,
            sleep_hours: profile.sleep,
            training_days: profile.training_days,
        }
    }
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            name: row.name,
            age: row.age,
            height: row.height,
            weight: row.weight,
            body_fat: row.body_fat,
            calories: row.daily_calories,
            protein: row.daily_protein,
            sleep: row.sleep_hours,
            training_days: row.training_days,
        }
    }
}
