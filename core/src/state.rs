use anyhow::{Result, bail};
use serde::Serialize;

use crate::events::{EventBus, MetricEvent};
use crate::local_store::{KeyValueStorage, LocalStore, Namespace};
use crate::models::{BodyMeasurement, Profile};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BodyMetrics {
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub body_fat: Option<f64>,
}

/// Current height, weight and body fat, mirrored from the tracking data.
///
/// Owned by whoever needs it and passed by reference. Setters publish a
/// [`MetricEvent`] on the injected bus; nothing is written to storage until
/// [`persist`](Self::persist) is called.
#[derive(Debug)]
pub struct MetricsState {
    metrics: BodyMetrics,
    bus: EventBus,
}

impl MetricsState {
    pub fn new(bus: EventBus) -> Self {
        Self {
            metrics: BodyMetrics::default(),
            bus,
        }
    }

    pub fn metrics(&self) -> BodyMetrics {
        self.metrics
    }

    /// Seed from the profile, letting the latest body measurement override
    /// whatever values it carries. Publishes nothing.
    pub fn initialize(&mut self, profile: Option<&Profile>, latest: Option<&BodyMeasurement>) {
        let mut metrics = BodyMetrics::default();
        if let Some(p) = profile {
            metrics.height = p.height;
            metrics.weight = p.weight;
            metrics.body_fat = p.body_fat;
        }
        if let Some(m) = latest {
            metrics.height = m.height.or(metrics.height);
            metrics.weight = m.weight.or(metrics.weight);
            metrics.body_fat = m.body_fat.or(metrics.body_fat);
        }
        self.metrics = metrics;
    }

    pub fn set_height(&mut self, cm: f64) -> Result<()> {
        if !cm.is_finite() || cm <= 0.0 {
            bail!("Height must be greater than 0");
        }
        self.metrics.height = Some(cm);
        self.bus.publish(&MetricEvent::HeightChanged(cm));
        Ok(())
    }

    pub fn set_weight(&mut self, kg: f64) -> Result<()> {
        if !kg.is_finite() || kg <= 0.0 {
            bail!("Weight must be greater than 0");
        }
        self.metrics.weight = Some(kg);
        self.bus.publish(&MetricEvent::WeightChanged(kg));
        Ok(())
    }

    pub fn set_body_fat(&mut self, pct: f64) -> Result<()> {
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            bail!("Body fat must be between 0 and 100");
        }
        self.metrics.body_fat = Some(pct);
        self.bus.publish(&MetricEvent::BodyFatChanged(pct));
        Ok(())
    }

    /// Body mass index, when both height (cm) and weight (kg) are known.
    pub fn bmi(&self) -> Option<f64> {
        let height_m = self.metrics.height? / 100.0;
        let weight = self.metrics.weight?;
        Some(weight / (height_m * height_m))
    }

    /// Write the known metrics into the stored profile, keeping its other fields.
    pub fn persist<S: KeyValueStorage>(&self, local: &LocalStore<S>) -> Result<()> {
        let mut profile: Profile = local.read_object(Namespace::Profile).unwrap_or_default();
        if let Some(h) = self.metrics.height {
            profile.height = Some(h);
        }
        if let Some(w) = self.metrics.weight {
            profile.weight = Some(w);
        }
        if let Some(bf) = self.metrics.body_fat {
            profile.body_fat = Some(bf);
        }
        local.write_object(Namespace::Profile, &profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_store::MemoryStorage;
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};

    fn profile() -> Profile {
        Profile {
            name: Some("Sam".to_string()),
            height: Some(180.0),
            weight: Some(82.0),
            body_fat: Some(18.0),
            ..Profile::default()
        }
    }

    #[test]
    fn test_initialize_prefers_latest_measurement() {
        let mut state = MetricsState::new(EventBus::new());
        let latest = BodyMeasurement {
            id: "m".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            weight: Some(80.0),
            height: None,
            body_fat: None,
            muscle_mass: None,
        };
        state.initialize(Some(&profile()), Some(&latest));
        assert_eq!(
            state.metrics(),
            BodyMetrics {
                height: Some(180.0),
                weight: Some(80.0),
                body_fat: Some(18.0),
            }
        );
    }

    #[test]
    fn test_setters_publish_events() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = bus.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        let mut state = MetricsState::new(bus);
        state.set_weight(79.5).unwrap();
        state.set_height(181.0).unwrap();
        state.set_body_fat(17.0).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            [
                MetricEvent::WeightChanged(79.5),
                MetricEvent::HeightChanged(181.0),
                MetricEvent::BodyFatChanged(17.0),
            ]
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut state = MetricsState::new(EventBus::new());
        assert!(state.set_weight(0.0).is_err());
        assert!(state.set_height(f64::NAN).is_err());
        assert!(state.set_body_fat(101.0).is_err());
        assert_eq!(state.metrics(), BodyMetrics::default());
    }

    #[test]
    fn test_persist_is_explicit() {
        let local = LocalStore::new(MemoryStorage::new());
        local.write_object(Namespace::Profile, &profile()).unwrap();

        let mut state = MetricsState::new(EventBus::new());
        state.initialize(local.read_object(Namespace::Profile).as_ref(), None);
        state.set_weight(78.0).unwrap();

        let stored: Profile = local.read_object(Namespace::Profile).unwrap();
        assert_eq!(stored.weight, Some(82.0));

        state.persist(&local).unwrap();
        let stored: Profile = local.read_object(Namespace::Profile).unwrap();
        assert_eq!(stored.weight, Some(78.0));
        assert_eq!(stored.name.as_deref(), Some("Sam"));
    }

    #[test]
    fn test_bmi() {
        let mut state = MetricsState::new(EventBus::new());
        assert!(state.bmi().is_none());
        state.set_height(200.0).unwrap();
        state.set_weight(100.0).unwrap();
        assert!((state.bmi().unwrap() - 25.0).abs() < 1e-9);
    }
}
