//! One-shot transfer of local data into the remote store after sign-in.

use serde::Serialize;

use crate::local_store::{KeyValueStorage, LocalStore, Namespace};
use crate::mapping::RemoteEntity;
use crate::models::{
    BodyMeasurement, Habit, HabitCompletion, Measurement, NutritionRecord, Profile, ProgressImage,
    StrengthRecord, Supplement, SupplementCompletion, WorkoutPlan,
};
use crate::remote::{RemoteStore, SessionProvider, TableBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    NotStarted,
    Running,
    Completed,
}

/// Which local namespaces are deleted once every transfer has been attempted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClearPolicy {
    /// Clear all eleven namespaces whatever the outcome. A failed transfer
    /// loses that namespace's local data.
    #[default]
    Unconditional,
    /// Clear only namespaces that were skipped or transferred; failed ones
    /// stay local.
    MigratedOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NamespaceOutcome {
    Skipped,
    Migrated { records: usize },
    Failed { error: String },
}

impl NamespaceOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, NamespaceOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    pub outcomes: Vec<(Namespace, NamespaceOutcome)>,
    pub cleared: Vec<Namespace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clear_error: Option<String>,
}

impl MigrationReport {
    pub fn outcome(&self, namespace: Namespace) -> Option<&NamespaceOutcome> {
        self.outcomes
            .iter()
            .find(|(ns, _)| *ns == namespace)
            .map(|(_, outcome)| outcome)
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|(_, o)| o.is_failed())
    }

    pub fn failed_namespaces(&self) -> Vec<Namespace> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_failed())
            .map(|(ns, _)| *ns)
            .collect()
    }

    pub fn migrated_records(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, o)| match o {
                NamespaceOutcome::Migrated { records } => *records,
                _ => 0,
            })
            .sum()
    }
}

/// Drains every populated local namespace into its remote table.
///
/// Namespaces run strictly one after another. A failure is logged and the
/// routine moves on; [`run`](Self::run) never returns an error. Not
/// resumable: a second `run` on the same routine does nothing.
pub struct MigrationRoutine<'a, S, B, P> {
    local: &'a LocalStore<S>,
    remote: &'a RemoteStore<B, P>,
    policy: ClearPolicy,
    state: MigrationState,
}

impl<'a, S, B, P> MigrationRoutine<'a, S, B, P>
where
    S: KeyValueStorage,
    B: TableBackend,
    P: SessionProvider,
{
    pub fn new(local: &'a LocalStore<S>, remote: &'a RemoteStore<B, P>) -> Self {
        Self {
            local,
            remote,
            policy: ClearPolicy::default(),
            state: MigrationState::NotStarted,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ClearPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> MigrationState {
        self.state
    }

    pub async fn run(&mut self) -> MigrationReport {
        if self.state != MigrationState::NotStarted {
            tracing::warn!(state = ?self.state, "migration already ran, ignoring");
            return MigrationReport::default();
        }
        self.state = MigrationState::Running;
        tracing::info!(policy = ?self.policy, "migrating local data to remote store");

        let mut report = MigrationReport::default();
        for namespace in Namespace::ALL {
            let outcome = match namespace {
                Namespace::Profile => self.migrate_profile().await,
                Namespace::BodyMeasurements => self.migrate::<BodyMeasurement>().await,
                Namespace::Measurements => self.migrate::<Measurement>().await,
                Namespace::StrengthRecords => self.migrate::<StrengthRecord>().await,
                Namespace::ProgressImages => self.migrate::<ProgressImage>().await,
                Namespace::Habits => self.migrate::<Habit>().await,
                Namespace::HabitCompletions => self.migrate::<HabitCompletion>().await,
                Namespace::Nutrition => self.migrate::<NutritionRecord>().await,
                Namespace::Supplements => self.migrate::<Supplement>().await,
                Namespace::SupplementCompletions => self.migrate::<SupplementCompletion>().await,
                Namespace::WorkoutPlans => self.migrate::<WorkoutPlan>().await,
            };
            report.outcomes.push((namespace, outcome));
        }

        let to_clear: Vec<Namespace> = match self.policy {
            ClearPolicy::Unconditional => Namespace::ALL.to_vec(),
            ClearPolicy::MigratedOnly => report
                .outcomes
                .iter()
                .filter(|(_, o)| !o.is_failed())
                .map(|(ns, _)| *ns)
                .collect(),
        };
        match self.local.clear(&to_clear) {
            Ok(()) => report.cleared = to_clear,
            Err(e) => {
                tracing::error!(
                    error = %format!("{e:#}"),
                    "failed to clear local data after migration"
                );
                report.clear_error = Some(format!("{e:#}"));
            }
        }

        if report.has_failures() {
            let failed = report.failed_namespaces();
            let lost: Vec<Namespace> = failed
                .iter()
                .copied()
                .filter(|ns| report.cleared.contains(ns))
                .collect();
            tracing::error!(
                ?failed,
                ?lost,
                "migration finished with failures; cleared namespaces cannot be recovered locally"
            );
        } else {
            tracing::info!(records = report.migrated_records(), "migration finished");
        }

        self.state = MigrationState::Completed;
        report
    }

    async fn migrate<E: RemoteEntity>(&self) -> NamespaceOutcome {
        let records: Vec<E> = self.local.read(E::NAMESPACE);
        if records.is_empty() {
            tracing::debug!(namespace = %E::NAMESPACE, "nothing to migrate");
            return NamespaceOutcome::Skipped;
        }
        match self.remote.save(&records).await {
            Ok(()) => {
                tracing::info!(
                    namespace = %E::NAMESPACE,
                    records = records.len(),
                    "migrated namespace"
                );
                NamespaceOutcome::Migrated {
                    records: records.len(),
                }
            }
            Err(e) => {
                tracing::error!(
                    namespace = %E::NAMESPACE,
                    error = %e,
                    "failed to migrate namespace"
                );
                NamespaceOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn migrate_profile(&self) -> NamespaceOutcome {
        let Some(profile) = self.local.read_object::<Profile>(Namespace::Profile) else {
            tracing::debug!(namespace = %Namespace::Profile, "nothing to migrate");
            return NamespaceOutcome::Skipped;
        };
        match self.remote.save_profile(&profile).await {
            Ok(()) => {
                tracing::info!(namespace = %Namespace::Profile, "migrated profile");
                NamespaceOutcome::Migrated { records: 1 }
            }
            Err(e) => {
                tracing::error!(
                    namespace = %Namespace::Profile,
                    error = %e,
                    "failed to migrate namespace"
                );
                NamespaceOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}
