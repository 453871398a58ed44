use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::models::Record;

/// The eleven fixed storage keys owned by the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    Profile,
    BodyMeasurements,
    Measurements,
    StrengthRecords,
    ProgressImages,
    Habits,
    HabitCompletions,
    Nutrition,
    Supplements,
    SupplementCompletions,
    WorkoutPlans,
}

impl Namespace {
    /// Migration order.
    pub const ALL: [Namespace; 11] = [
        Namespace::Profile,
        Namespace::BodyMeasurements,
        Namespace::Measurements,
        Namespace::StrengthRecords,
        Namespace::ProgressImages,
        Namespace::Habits,
        Namespace::HabitCompletions,
        Namespace::Nutrition,
        Namespace::Supplements,
        Namespace::SupplementCompletions,
        Namespace::WorkoutPlans,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Namespace::Profile => "fitlog:personalData",
            Namespace::BodyMeasurements => "fitlog:bodyMeasurements",
            Namespace::Measurements => "fitlog:measurements",
            Namespace::StrengthRecords => "fitlog:strengthRecords",
            Namespace::ProgressImages => "fitlog:progressImages",
            Namespace::Habits => "fitlog:habits",
            Namespace::HabitCompletions => "fitlog:habitCompletions",
            Namespace::Nutrition => "fitlog:nutrition",
            Namespace::Supplements => "fitlog:supplements",
            Namespace::SupplementCompletions => "fitlog:supplementCompletions",
            Namespace::WorkoutPlans => "fitlog:workoutPlans",
        }
    }

    /// The profile namespace holds a single JSON object instead of an array.
    pub fn is_singleton(self) -> bool {
        self == Namespace::Profile
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.key())
    }
}

/// Durable string key-value storage. Writes are atomic per key.
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Process-local storage, optionally bounded by a byte quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes that would push the total stored value size past `bytes` fail.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            quota: Some(bytes),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = items.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(quota) = self.quota {
            let others: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            if others + value.len() > quota {
                bail!("Storage quota exceeded writing '{key}' ({quota} bytes available)");
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.remove(key);
        Ok(())
    }
}

/// Synchronous, namespaced JSON persistence on top of a [`KeyValueStorage`].
///
/// Reads never fail: a missing, unreadable, or corrupt namespace reads as
/// empty. Writes replace the whole namespace and surface storage errors.
pub struct LocalStore<S> {
    storage: S,
}

impl<S: KeyValueStorage> LocalStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn raw(&self, namespace: Namespace) -> Option<String> {
        match self.storage.get_item(namespace.key()) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    %namespace,
                    error = %format!("{e:#}"),
                    "failed to read namespace, treating as empty"
                );
                None
            }
        }
    }

    pub fn read<T: DeserializeOwned>(&self, namespace: Namespace) -> Vec<T> {
        let Some(text) = self.raw(namespace) else {
            return Vec::new();
        };
        match serde_json::from_str(&text) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(%namespace, error = %e, "discarding corrupt namespace");
                Vec::new()
            }
        }
    }

    pub fn write<T: Serialize>(&self, namespace: Namespace, records: &[T]) -> Result<()> {
        let text = serde_json::to_string(records)
            .with_context(|| format!("Failed to serialize {namespace}"))?;
        self.storage
            .set_item(namespace.key(), &text)
            .with_context(|| format!("Failed to write {namespace}"))
    }

    /// Replace the record whose key matches `record`'s, or append it, then
    /// write the namespace back ordered by `sort_key`.
    pub fn upsert_by_key<T, K, O>(
        &self,
        namespace: Namespace,
        record: T,
        key_fn: impl Fn(&T) -> K,
        sort_key: impl Fn(&T) -> O,
    ) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
        K: PartialEq,
        O: Ord,
    {
        let mut records: Vec<T> = self.read(namespace);
        let key = key_fn(&record);
        if let Some(idx) = records.iter().position(|r| key_fn(r) == key) {
            records[idx] = record;
        } else {
            records.push(record);
        }
        records.sort_by_key(&sort_key);
        self.write(namespace, &records)
    }

    /// Upsert by [`Record::key`], ordered by date ascending.
    pub fn upsert<R: Record>(&self, record: R) -> Result<()> {
        self.upsert_by_key(R::NAMESPACE, record, R::key, R::date)
    }

    /// Drop every record matching `predicate`. Returns how many were removed.
    pub fn remove<T>(&self, namespace: Namespace, predicate: impl Fn(&T) -> bool) -> Result<usize>
    where
        T: Serialize + DeserializeOwned,
    {
        let records: Vec<T> = self.read(namespace);
        let before = records.len();
        let kept: Vec<T> = records.into_iter().filter(|r| !predicate(r)).collect();
        let removed = before - kept.len();
        if removed > 0 {
            self.write(namespace, &kept)?;
        }
        Ok(removed)
    }

    /// Delete the given namespace keys outright. Every key is attempted; the
    /// first failure is returned.
    pub fn clear(&self, namespaces: &[Namespace]) -> Result<()> {
        let mut first_err = None;
        for &namespace in namespaces {
            if let Err(e) = self.storage.remove_item(namespace.key()) {
                tracing::error!(%namespace, error = %format!("{e:#}"), "failed to clear namespace");
                first_err.get_or_insert(e.context(format!("Failed to clear {namespace}")));
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    pub fn read_object<T: DeserializeOwned>(&self, namespace: Namespace) -> Option<T> {
        let text = self.raw(namespace)?;
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%namespace, error = %e, "discarding corrupt namespace");
                None
            }
        }
    }

    pub fn write_object<T: Serialize>(&self, namespace: Namespace, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)
            .with_context(|| format!("Failed to serialize {namespace}"))?;
        self.storage
            .set_item(namespace.key(), &text)
            .with_context(|| format!("Failed to write {namespace}"))
    }

    pub fn contains(&self, namespace: Namespace) -> bool {
        self.raw(namespace).is_some()
    }

    /// Number of readable records in a namespace; a present profile counts as one.
    pub fn count(&self, namespace: Namespace) -> usize {
        if namespace.is_singleton() {
            usize::from(
                self.read_object::<serde_json::Map<String, serde_json::Value>>(namespace)
                    .is_some(),
            )
        } else {
            self.read::<serde_json::Value>(namespace).len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BodyMeasurement, Habit, Profile};
    use chrono::NaiveDate;

    fn store() -> LocalStore<MemoryStorage> {
        LocalStore::new(MemoryStorage::new())
    }

    fn body(date: &str, weight: f64) -> BodyMeasurement {
        BodyMeasurement {
            id: format!("id-{date}-{weight}"),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            weight: Some(weight),
            height: None,
            body_fat: None,
            muscle_mass: None,
        }
    }

    #[test]
    fn test_namespace_keys_are_unique() {
        let keys: std::collections::HashSet<&str> =
            Namespace::ALL.iter().map(|n| n.key()).collect();
        assert_eq!(keys.len(), 11);
    }

    #[test]
    fn test_read_missing_namespace_is_empty() {
        let store = store();
        let records: Vec<Habit> = store.read(Namespace::Habits);
        assert!(records.is_empty());
        assert!(!store.contains(Namespace::Habits));
    }

    #[test]
    fn test_read_corrupt_namespace_is_empty() {
        let store = store();
        store
            .storage()
            .set_item(Namespace::Habits.key(), "{not json")
            .unwrap();
        let records: Vec<Habit> = store.read(Namespace::Habits);
        assert!(records.is_empty());

        store
            .storage()
            .set_item(Namespace::Profile.key(), "[1, 2")
            .unwrap();
        assert!(store.read_object::<Profile>(Namespace::Profile).is_none());
    }

    #[test]
    fn test_write_replaces_namespace() {
        let store = store();
        store
            .write(Namespace::BodyMeasurements, &[body("2024-01-01", 80.0)])
            .unwrap();
        store
            .write(Namespace::BodyMeasurements, &[body("2024-01-02", 79.0)])
            .unwrap();
        let records: Vec<BodyMeasurement> = store.read(Namespace::BodyMeasurements);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].weight, Some(79.0));
    }

    #[test]
    fn test_upsert_same_key_keeps_one_record() {
        let store = store();
        store.upsert(body("2024-01-01", 80.0)).unwrap();
        store.upsert(body("2024-01-01", 81.0)).unwrap();

        let records: Vec<BodyMeasurement> = store.read(Namespace::BodyMeasurements);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].weight, Some(81.0));
    }

    #[test]
    fn test_upsert_sorts_by_date() {
        let store = store();
        store.upsert(body("2024-01-03", 79.0)).unwrap();
        store.upsert(body("2024-01-01", 81.0)).unwrap();
        store.upsert(body("2024-01-02", 80.0)).unwrap();

        let records: Vec<BodyMeasurement> = store.read(Namespace::BodyMeasurements);
        let dates: Vec<String> = records.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, ["2024-01-01", "2024-01-02", "2024-01-03"]);
    }

    #[test]
    fn test_upsert_by_custom_key() {
        let store = store();
        let a = serde_json::json!({"name": "a", "n": 1});
        let b = serde_json::json!({"name": "a", "n": 2});
        let c = serde_json::json!({"name": "b", "n": 0});
        for v in [a, b, c] {
            store
                .upsert_by_key(
                    Namespace::Supplements,
                    v,
                    |r| r["name"].as_str().map(str::to_string),
                    |r| r["n"].as_i64(),
                )
                .unwrap();
        }
        let records: Vec<serde_json::Value> = store.read(Namespace::Supplements);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["name"], "b");
        assert_eq!(records[1]["n"], 2);
    }

    #[test]
    fn test_namespace_isolation() {
        let store = store();
        store.upsert(body("2024-01-01", 80.0)).unwrap();
        let before = store
            .storage()
            .get_item(Namespace::BodyMeasurements.key())
            .unwrap();

        store
            .write(Namespace::Measurements, &[serde_json::json!({"id": "x"})])
            .unwrap();
        store.clear(&[Namespace::Habits]).unwrap();

        let after = store
            .storage()
            .get_item(Namespace::BodyMeasurements.key())
            .unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_remove_by_predicate() {
        let store = store();
        store.upsert(body("2024-01-01", 80.0)).unwrap();
        store.upsert(body("2024-01-02", 81.0)).unwrap();

        let removed = store
            .remove::<BodyMeasurement>(Namespace::BodyMeasurements, |r| r.weight == Some(80.0))
            .unwrap();
        assert_eq!(removed, 1);
        let records: Vec<BodyMeasurement> = store.read(Namespace::BodyMeasurements);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].weight, Some(81.0));

        let removed = store
            .remove::<BodyMeasurement>(Namespace::BodyMeasurements, |_| false)
            .unwrap();
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_clear_deletes_keys() {
        let store = store();
        store.upsert(body("2024-01-01", 80.0)).unwrap();
        store
            .write_object(Namespace::Profile, &Profile::default())
            .unwrap();

        store.clear(&Namespace::ALL).unwrap();
        assert!(store.storage().keys().is_empty());
    }

    #[test]
    fn test_quota_exceeded_surfaces_error() {
        let store = LocalStore::new(MemoryStorage::with_quota(64));
        store.upsert(body("2024-01-01", 80.0)).unwrap_err();
        assert!(!store.contains(Namespace::BodyMeasurements));
    }

    #[test]
    fn test_count_records() {
        let store = store();
        assert_eq!(store.count(Namespace::Profile), 0);
        store
            .write_object(Namespace::Profile, &Profile::default())
            .unwrap();
        assert_eq!(store.count(Namespace::Profile), 1);

        store.upsert(body("2024-01-01", 80.0)).unwrap();
        store.upsert(body("2024-01-02", 80.0)).unwrap();
        assert_eq!(store.count(Namespace::BodyMeasurements), 2);
    }
}
