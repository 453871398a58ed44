use std::path::Path;

use anyhow::{Result, bail};
use chrono::NaiveDate;

use crate::db::Database;
use crate::events::{EventBus, MetricEvent};
use crate::local_store::{KeyValueStorage, LocalStore, Namespace};
use crate::models::{
    self, BodyMeasurement, Habit, HabitCompletion, HabitStatus, Measurement, NutritionProgress,
    NutritionRecord, Profile, ProgressImage, Record, StrengthRecord, Supplement,
    SupplementCompletion, SupplementStatus, WeightPoint, WorkoutPlan,
};
use crate::state::MetricsState;

/// Local-mode tracker: every entity operation against the [`LocalStore`].
///
/// Saves publish [`MetricEvent::RecordSaved`] on the tracker's bus.
pub struct Tracker<S> {
    local: LocalStore<S>,
    bus: EventBus,
}

impl Tracker<Database> {
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::open(path)?;
        Ok(Self::new(LocalStore::new(db)))
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::new(LocalStore::new(db)))
    }
}

impl<S: KeyValueStorage> Tracker<S> {
    pub fn new(local: LocalStore<S>) -> Self {
        Self {
            local,
            bus: EventBus::new(),
        }
    }

    pub fn store(&self) -> &LocalStore<S> {
        &self.local
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    /// A metrics container seeded from the profile and the latest body measurement.
    pub fn metrics_state(&self) -> MetricsState {
        let mut state = MetricsState::new(self.bus.clone());
        let latest = self.body_history().into_iter().next();
        state.initialize(self.profile().as_ref(), latest.as_ref());
        state
    }

    fn save<R: Record>(&self, record: R) -> Result<()> {
        let date = record.date();
        self.local.upsert(record)?;
        self.bus.publish(&MetricEvent::RecordSaved {
            namespace: R::NAMESPACE,
            date,
        });
        Ok(())
    }

    fn newest_first<R: Record>(&self) -> Vec<R> {
        let mut records: Vec<R> = self.local.read(R::NAMESPACE);
        records.sort_by(|a, b| b.date().cmp(&a.date()));
        records
    }

    // --- Body ---

    /// Upsert by date, then mirror the new values into the profile unless an
    /// entry for a later date already exists.
    pub fn log_body_measurement(&self, measurement: BodyMeasurement) -> Result<BodyMeasurement> {
        models::validate_body_measurement(&measurement)?;
        self.save(measurement.clone())?;

        let latest = self.body_history().into_iter().next();
        if latest.is_some_and(|l| l.date > measurement.date) {
            tracing::debug!(date = %measurement.date, "backdated measurement, profile unchanged");
            return Ok(measurement);
        }
        let mut state = self.metrics_state();
        if let Some(h) = measurement.height {
            state.set_height(h)?;
        }
        if let Some(w) = measurement.weight {
            state.set_weight(w)?;
        }
        if let Some(bf) = measurement.body_fat {
            state.set_body_fat(bf)?;
        }
        state.persist(&self.local)?;
        Ok(measurement)
    }

    /// Newest first.
    pub fn body_history(&self) -> Vec<BodyMeasurement> {
        self.newest_first()
    }

    pub fn log_measurement(&self, measurement: Measurement) -> Result<Measurement> {
        models::validate_measurement(&measurement)?;
        self.save(measurement.clone())?;
        Ok(measurement)
    }

    pub fn measurements(&self) -> Vec<Measurement> {
        self.newest_first()
    }

    // --- Strength ---

    pub fn add_strength_record(&self, record: StrengthRecord) -> Result<StrengthRecord> {
        models::validate_strength_record(&record)?;
        self.save(record.clone())?;
        Ok(record)
    }

    /// Newest first, optionally filtered by exercise name (case-insensitive).
    pub fn strength_records(&self, exercise: Option<&str>) -> Vec<StrengthRecord> {
        let records: Vec<StrengthRecord> = self.newest_first();
        match exercise {
            Some(name) => records
                .into_iter()
                .filter(|r| r.exercise.eq_ignore_ascii_case(name))
                .collect(),
            None => records,
        }
    }

    pub fn delete_strength_record(&self, id: &str) -> Result<bool> {
        let removed = self
            .local
            .remove::<StrengthRecord>(Namespace::StrengthRecords, |r| r.id == id)?;
        Ok(removed > 0)
    }

    // --- Progress images ---

    pub fn add_image(&self, image: ProgressImage) -> Result<ProgressImage> {
        if image.image.trim().is_empty() {
            bail!("Image data cannot be empty");
        }
        self.save(image.clone())?;
        Ok(image)
    }

    pub fn images(&self, favorites_only: bool) -> Vec<ProgressImage> {
        let images: Vec<ProgressImage> = self.newest_first();
        if favorites_only {
            images.into_iter().filter(|i| i.is_favorite).collect()
        } else {
            images
        }
    }

    pub fn toggle_favorite(&self, id: &str) -> Result<ProgressImage> {
        let images: Vec<ProgressImage> = self.local.read(Namespace::ProgressImages);
        let Some(mut image) = images.into_iter().find(|i| i.id == id) else {
            bail!("Progress image not found: {id}");
        };
        image.is_favorite = !image.is_favorite;
        self.save(image.clone())?;
        Ok(image)
    }

    pub fn delete_image(&self, id: &str) -> Result<bool> {
        let removed = self
            .local
            .remove::<ProgressImage>(Namespace::ProgressImages, |i| i.id == id)?;
        Ok(removed > 0)
    }

    // --- Habits ---

    pub fn add_habit(&self, habit: Habit) -> Result<Habit> {
        models::validate_habit(&habit)?;
        self.save(habit.clone())?;
        Ok(habit)
    }

    pub fn habits(&self) -> Vec<Habit> {
        self.local.read(Namespace::Habits)
    }

    /// Completions referring to the habit are left in place.
    pub fn delete_habit(&self, id: &str) -> Result<bool> {
        let removed = self.local.remove::<Habit>(Namespace::Habits, |h| h.id == id)?;
        Ok(removed > 0)
    }

    pub fn set_habit_count(
        &self,
        habit_id: &str,
        date: NaiveDate,
        count: u32,
    ) -> Result<HabitStatus> {
        let Some(habit) = self.habits().into_iter().find(|h| h.id == habit_id) else {
            bail!("Habit not found: {habit_id}");
        };
        let existing: Vec<HabitCompletion> = self.local.read(Namespace::HabitCompletions);
        let completion = habit_completion(&existing, habit_id, date, count);
        self.save(completion)?;
        Ok(HabitStatus {
            done: habit.is_done(count),
            habit,
            date,
            count,
        })
    }

    pub fn habit_completions(&self) -> Vec<HabitCompletion> {
        self.newest_first()
    }

    pub fn habit_status(&self, date: NaiveDate) -> Vec<HabitStatus> {
        habit_statuses(&self.habits(), &self.habit_completions(), date)
    }

    // --- Supplements ---

    pub fn add_supplement(&self, supplement: Supplement) -> Result<Supplement> {
        models::validate_supplement(&supplement)?;
        self.save(supplement.clone())?;
        Ok(supplement)
    }

    pub fn supplements(&self) -> Vec<Supplement> {
        self.local.read(Namespace::Supplements)
    }

    pub fn delete_supplement(&self, id: &str) -> Result<bool> {
        let removed = self
            .local
            .remove::<Supplement>(Namespace::Supplements, |s| s.id == id)?;
        Ok(removed > 0)
    }

    pub fn set_supplement_taken(
        &self,
        supplement_id: &str,
        date: NaiveDate,
        taken: bool,
    ) -> Result<SupplementStatus> {
        let Some(supplement) = self.supplements().into_iter().find(|s| s.id == supplement_id) else {
            bail!("Supplement not found: {supplement_id}");
        };
        let existing: Vec<SupplementCompletion> = self.local.read(Namespace::SupplementCompletions);
        self.save(supplement_completion(&existing, supplement_id, date, taken))?;
        Ok(SupplementStatus {
            supplement,
            date,
            taken,
        })
    }

    pub fn supplement_completions(&self) -> Vec<SupplementCompletion> {
        self.newest_first()
    }

    pub fn supplement_status(&self, date: NaiveDate) -> Vec<SupplementStatus> {
        supplement_statuses(&self.supplements(), &self.supplement_completions(), date)
    }

    // --- Nutrition ---

    pub fn log_nutrition(&self, record: NutritionRecord) -> Result<NutritionRecord> {
        models::validate_nutrition(&record)?;
        self.save(record.clone())?;
        Ok(record)
    }

    pub fn nutrition_for(&self, date: NaiveDate) -> Option<NutritionRecord> {
        self.local
            .read::<NutritionRecord>(Namespace::Nutrition)
            .into_iter()
            .find(|n| n.date == date)
    }

    pub fn nutrition_progress(&self, date: NaiveDate) -> NutritionProgress {
        nutrition_progress(
            date,
            self.nutrition_for(date).as_ref(),
            self.profile().as_ref(),
        )
    }

    // --- Plans & profile ---

    pub fn save_workout_plan(&self, plan: WorkoutPlan) -> Result<WorkoutPlan> {
        models::validate_workout_plan(&plan)?;
        self.save(plan.clone())?;
        Ok(plan)
    }

    pub fn workout_plans(&self) -> Vec<WorkoutPlan> {
        self.local.read(Namespace::WorkoutPlans)
    }

    pub fn profile(&self) -> Option<Profile> {
        self.local.read_object(Namespace::Profile)
    }

    pub fn save_profile(&self, profile: &Profile) -> Result<()> {
        models::validate_profile(profile)?;
        self.local.write_object(Namespace::Profile, profile)?;
        self.bus.publish(&MetricEvent::RecordSaved {
            namespace: Namespace::Profile,
            date: None,
        });
        Ok(())
    }

    // --- Housekeeping ---

    pub fn namespace_counts(&self) -> Vec<(Namespace, usize)> {
        Namespace::ALL
            .iter()
            .map(|&ns| (ns, self.local.count(ns)))
            .collect()
    }

    /// Delete every namespace.
    pub fn wipe(&self) -> Result<()> {
        self.local.clear(&Namespace::ALL)
    }
}

// --- Aggregation ---

/// Completion for `(habit_id, date)`, reusing the id of an existing one.
pub fn habit_completion(
    existing: &[HabitCompletion],
    habit_id: &str,
    date: NaiveDate,
    count: u32,
) -> HabitCompletion {
    let id = existing
        .iter()
        .find(|c| c.habit_id == habit_id && c.date == date)
        .map_or_else(models::new_id, |c| c.id.clone());
    HabitCompletion {
        id,
        habit_id: habit_id.to_string(),
        date,
        count,
    }
}

pub fn supplement_completion(
    existing: &[SupplementCompletion],
    supplement_id: &str,
    date: NaiveDate,
    taken: bool,
) -> SupplementCompletion {
    let id = existing
        .iter()
        .find(|c| c.supplement_id == supplement_id && c.date == date)
        .map_or_else(models::new_id, |c| c.id.clone());
    SupplementCompletion {
        id,
        supplement_id: supplement_id.to_string(),
        date,
        taken,
    }
}

/// One entry per habit; a habit with no completion that day has count 0.
pub fn habit_statuses(
    habits: &[Habit],
    completions: &[HabitCompletion],
    date: NaiveDate,
) -> Vec<HabitStatus> {
    habits
        .iter()
        .map(|habit| {
            let count = completions
                .iter()
                .find(|c| c.habit_id == habit.id && c.date == date)
                .map_or(0, |c| c.count);
            HabitStatus {
                habit: habit.clone(),
                date,
                count,
                done: habit.is_done(count),
            }
        })
        .collect()
}

pub fn supplement_statuses(
    supplements: &[Supplement],
    completions: &[SupplementCompletion],
    date: NaiveDate,
) -> Vec<SupplementStatus> {
    supplements
        .iter()
        .map(|supplement| SupplementStatus {
            supplement: supplement.clone(),
            date,
            taken: completions
                .iter()
                .any(|c| c.supplement_id == supplement.id && c.date == date && c.taken),
        })
        .collect()
}

fn percent(value: f64, target: Option<f64>) -> Option<f64> {
    target
        .filter(|t| *t > 0.0)
        .map(|t| (value / t * 100.0).min(100.0))
}

/// Intake against targets for one day. Targets stored on the record win;
/// calorie and protein targets fall back to the profile's daily goals.
pub fn nutrition_progress(
    date: NaiveDate,
    record: Option<&NutritionRecord>,
    profile: Option<&Profile>,
) -> NutritionProgress {
    let (calories, protein, water) =
        record.map_or((0.0, 0.0, 0.0), |r| (r.calories, r.protein, r.water));
    let target_calories = record
        .and_then(|r| r.target_calories)
        .or_else(|| profile.and_then(|p| p.calories));
    let target_protein = record
        .and_then(|r| r.target_protein)
        .or_else(|| profile.and_then(|p| p.protein));
    let target_water = record.and_then(|r| r.target_water);

    NutritionProgress {
        date,
        calories,
        protein,
        water,
        target_calories,
        target_protein,
        target_water,
        calories_pct: percent(calories, target_calories),
        protein_pct: percent(protein, target_protein),
        water_pct: percent(water, target_water),
    }
}

/// The last `last` weigh-ins in chronological order.
pub fn weight_points(measurements: &[BodyMeasurement], last: usize) -> Vec<WeightPoint> {
    let mut points: Vec<WeightPoint> = measurements
        .iter()
        .filter_map(|m| {
            m.weight.map(|weight| WeightPoint {
                date: m.date,
                weight,
            })
        })
        .collect();
    points.sort_by_key(|p| p.date);
    let skip = points.len().saturating_sub(last);
    points.split_off(skip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_store::MemoryStorage;
    use std::sync::{Arc, Mutex};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn tracker() -> Tracker<MemoryStorage> {
        Tracker::new(LocalStore::new(MemoryStorage::new()))
    }

    fn body(d: &str, weight: f64) -> BodyMeasurement {
        BodyMeasurement {
            id: models::new_id(),
            date: date(d),
            weight: Some(weight),
            height: None,
            body_fat: None,
            muscle_mass: None,
        }
    }

    fn habit(id: &str, target: u32) -> Habit {
        Habit {
            id: id.to_string(),
            name: format!("Habit {id}"),
            description: None,
            icon: None,
            target,
        }
    }

    fn supplement(id: &str) -> Supplement {
        Supplement {
            id: id.to_string(),
            name: format!("Supplement {id}"),
            dosage: Some("5g".to_string()),
            timing: None,
            category: None,
            icon: None,
            color: None,
        }
    }

    fn image(id: &str, d: &str) -> ProgressImage {
        ProgressImage {
            id: id.to_string(),
            date: date(d),
            time: "08:00".to_string(),
            image: "data:image/png;base64,AAAA".to_string(),
            notes: None,
            is_favorite: false,
            tags: vec![],
        }
    }

    #[test]
    fn test_body_measurement_upsert_by_date() {
        let t = tracker();
        t.log_body_measurement(body("2024-01-01", 80.0)).unwrap();
        t.log_body_measurement(body("2024-01-01", 81.0)).unwrap();

        let history = t.body_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].weight, Some(81.0));
    }

    #[test]
    fn test_body_measurement_updates_profile_metrics() {
        let t = tracker();
        t.save_profile(&Profile {
            name: Some("Sam".to_string()),
            height: Some(180.0),
            ..Profile::default()
        })
        .unwrap();

        t.log_body_measurement(body("2024-01-01", 79.0)).unwrap();

        let profile = t.profile().unwrap();
        assert_eq!(profile.weight, Some(79.0));
        assert_eq!(profile.height, Some(180.0));
        assert_eq!(profile.name.as_deref(), Some("Sam"));
    }

    #[test]
    fn test_backdated_measurement_keeps_profile_current() {
        let t = tracker();
        t.log_body_measurement(body("2024-03-01", 75.0)).unwrap();
        t.log_body_measurement(body("2024-01-01", 90.0)).unwrap();

        assert_eq!(t.profile().unwrap().weight, Some(75.0));
        assert_eq!(t.metrics_state().metrics().weight, Some(75.0));
        assert_eq!(t.body_history().len(), 2);
    }

    #[test]
    fn test_invalid_body_measurement_is_not_saved() {
        let t = tracker();
        let mut m = body("2024-01-01", 80.0);
        m.weight = None;
        assert!(t.log_body_measurement(m).is_err());
        assert!(t.body_history().is_empty());
    }

    #[test]
    fn test_body_history_newest_first() {
        let t = tracker();
        t.log_body_measurement(body("2024-01-01", 80.0)).unwrap();
        t.log_body_measurement(body("2024-01-03", 79.0)).unwrap();
        t.log_body_measurement(body("2024-01-02", 79.5)).unwrap();

        let dates: Vec<String> = t.body_history().iter().map(|m| m.date.to_string()).collect();
        assert_eq!(dates, ["2024-01-03", "2024-01-02", "2024-01-01"]);
    }

    #[test]
    fn test_weight_points_last_n_chronological() {
        let mut ms = vec![
            body("2024-01-03", 79.0),
            body("2024-01-01", 81.0),
            body("2024-01-02", 80.0),
        ];
        ms.push(BodyMeasurement {
            weight: None,
            body_fat: Some(15.0),
            ..body("2024-01-04", 0.0)
        });

        let points = weight_points(&ms, 2);
        assert_eq!(
            points,
            [
                WeightPoint {
                    date: date("2024-01-02"),
                    weight: 80.0
                },
                WeightPoint {
                    date: date("2024-01-03"),
                    weight: 79.0
                },
            ]
        );
        assert_eq!(weight_points(&ms, 10).len(), 3);
        assert!(weight_points(&ms, 0).is_empty());
    }

    #[test]
    fn test_strength_records_filter_and_delete() {
        let t = tracker();
        let squat = StrengthRecord {
            id: "s1".to_string(),
            date: date("2024-01-01"),
            exercise: "Squat".to_string(),
            sets: 5,
            reps: 5,
            weight: 100.0,
            notes: None,
        };
        let bench = StrengthRecord {
            id: "s2".to_string(),
            exercise: "Bench".to_string(),
            ..squat.clone()
        };
        t.add_strength_record(squat).unwrap();
        t.add_strength_record(bench).unwrap();

        assert_eq!(t.strength_records(None).len(), 2);
        assert_eq!(t.strength_records(Some("squat")).len(), 1);
        assert!(t.delete_strength_record("s1").unwrap());
        assert!(!t.delete_strength_record("s1").unwrap());
        assert_eq!(t.strength_records(None)[0].exercise, "Bench");
    }

    #[test]
    fn test_toggle_favorite_and_delete_image() {
        let t = tracker();
        t.add_image(image("i1", "2024-01-01")).unwrap();
        t.add_image(image("i2", "2024-01-02")).unwrap();

        let toggled = t.toggle_favorite("i1").unwrap();
        assert!(toggled.is_favorite);
        let favs = t.images(true);
        assert_eq!(favs.len(), 1);
        assert_eq!(favs[0].id, "i1");

        assert!(!t.toggle_favorite("i1").unwrap().is_favorite);
        assert!(t.toggle_favorite("missing").is_err());

        assert!(t.delete_image("i2").unwrap());
        assert_eq!(t.images(false).len(), 1);
    }

    #[test]
    fn test_habit_threshold() {
        let t = tracker();
        t.add_habit(habit("h1", 3)).unwrap();

        let status = t.set_habit_count("h1", date("2024-01-01"), 2).unwrap();
        assert!(!status.done);
        let status = t.set_habit_count("h1", date("2024-01-01"), 3).unwrap();
        assert!(status.done);

        let completions: Vec<HabitCompletion> = t.store().read(Namespace::HabitCompletions);
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].count, 3);
    }

    #[test]
    fn test_habit_completion_reuses_id() {
        let existing = vec![HabitCompletion {
            id: "c1".to_string(),
            habit_id: "h1".to_string(),
            date: date("2024-01-01"),
            count: 1,
        }];
        let same = habit_completion(&existing, "h1", date("2024-01-01"), 2);
        assert_eq!(same.id, "c1");
        let other = habit_completion(&existing, "h1", date("2024-01-02"), 1);
        assert_ne!(other.id, "c1");
    }

    #[test]
    fn test_habit_status_defaults_to_zero() {
        let t = tracker();
        t.add_habit(habit("h1", 1)).unwrap();
        t.add_habit(habit("h2", 2)).unwrap();
        t.set_habit_count("h1", date("2024-01-01"), 1).unwrap();

        let statuses = t.habit_status(date("2024-01-01"));
        assert_eq!(statuses.len(), 2);
        assert!(statuses[0].done);
        assert_eq!(statuses[1].count, 0);
        assert!(!statuses[1].done);

        assert!(t.habit_status(date("2024-01-02")).iter().all(|s| !s.done));
    }

    #[test]
    fn test_completion_requires_known_habit() {
        let t = tracker();
        assert!(t.set_habit_count("nope", date("2024-01-01"), 1).is_err());
    }

    #[test]
    fn test_delete_habit_leaves_orphan_completions() {
        let t = tracker();
        t.add_habit(habit("h1", 1)).unwrap();
        t.set_habit_count("h1", date("2024-01-01"), 1).unwrap();
        assert!(t.delete_habit("h1").unwrap());

        assert!(t.habit_status(date("2024-01-01")).is_empty());
        assert_eq!(t.store().count(Namespace::HabitCompletions), 1);
    }

    #[test]
    fn test_supplement_checklist() {
        let t = tracker();
        t.add_supplement(supplement("s1")).unwrap();
        t.add_supplement(supplement("s2")).unwrap();
        t.set_supplement_taken("s1", date("2024-01-01"), true).unwrap();

        let statuses = t.supplement_status(date("2024-01-01"));
        assert!(statuses[0].taken);
        assert!(!statuses[1].taken);

        t.set_supplement_taken("s1", date("2024-01-01"), false).unwrap();
        assert!(t.supplement_status(date("2024-01-01")).iter().all(|s| !s.taken));
        assert_eq!(t.store().count(Namespace::SupplementCompletions), 1);

        assert!(t.delete_supplement("s2").unwrap());
        assert_eq!(t.supplements().len(), 1);
    }

    #[test]
    fn test_nutrition_progress_targets() {
        let t = tracker();
        t.save_profile(&Profile {
            calories: Some(2000.0),
            protein: Some(150.0),
            ..Profile::default()
        })
        .unwrap();
        t.log_nutrition(NutritionRecord {
            id: models::new_id(),
            date: date("2024-01-01"),
            calories: 1500.0,
            protein: 200.0,
            water: 1.0,
            target_calories: None,
            target_protein: None,
            target_water: Some(2.0),
        })
        .unwrap();

        let p = t.nutrition_progress(date("2024-01-01"));
        assert_eq!(p.target_calories, Some(2000.0));
        assert!((p.calories_pct.unwrap() - 75.0).abs() < 1e-9);
        assert!((p.protein_pct.unwrap() - 100.0).abs() < 1e-9);
        assert!((p.water_pct.unwrap() - 50.0).abs() < 1e-9);

        let empty = t.nutrition_progress(date("2024-01-02"));
        assert!(empty.calories.abs() < f64::EPSILON);
        assert_eq!(empty.calories_pct, Some(0.0));
        assert!(empty.water_pct.is_none());
    }

    #[test]
    fn test_saves_publish_events() {
        let t = tracker();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = t
            .events()
            .subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        t.add_habit(habit("h1", 1)).unwrap();
        t.log_body_measurement(body("2024-01-01", 80.0)).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            seen[0],
            MetricEvent::RecordSaved {
                namespace: Namespace::Habits,
                date: None
            }
        );
        assert!(seen.contains(&MetricEvent::WeightChanged(80.0)));
    }

    #[test]
    fn test_wipe_and_counts() {
        let t = tracker();
        t.add_habit(habit("h1", 1)).unwrap();
        t.add_habit(habit("h2", 1)).unwrap();
        t.save_profile(&Profile::default()).unwrap();

        let counts = t.namespace_counts();
        assert_eq!(counts.len(), 11);
        assert!(counts.contains(&(Namespace::Habits, 2)));
        assert!(counts.contains(&(Namespace::Profile, 1)));

        t.wipe().unwrap();
        assert!(t.namespace_counts().iter().all(|(_, n)| *n == 0));
        assert!(t.store().storage().keys().is_empty());
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.db");
        {
            let t = Tracker::open(&path).unwrap();
            t.add_habit(habit("h1", 2)).unwrap();
        }
        let t = Tracker::open(&path).unwrap();
        assert_eq!(t.habits()[0].target, 2);
    }

    #[test]
    fn test_workout_plan_roundtrip() {
        let t = Tracker::open_in_memory().unwrap();
        let plan: WorkoutPlan = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "splitName": "Upper/Lower",
            "days": [{"name": "Upper"}, {"name": "Lower"}],
        }))
        .unwrap();
        t.save_workout_plan(plan).unwrap();
        assert_eq!(t.workout_plans()[0].days.len(), 2);
    }
}
