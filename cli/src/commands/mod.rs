mod account;
mod body;
mod habit;
mod helpers;
mod nutrition;
mod photo;
mod plan;
mod strength;
mod supplement;

use anyhow::Result;

use crate::backend::RestBackend;
use crate::config::Config;
use fitlog_core::db::Database;
use fitlog_core::mapping::RemoteEntity;
use fitlog_core::remote::{RemoteError, RemoteStore, SessionProvider, SessionSlot, TableBackend};
use fitlog_core::service::Tracker;

pub(crate) use account::{Credentials, cmd_login, cmd_logout, cmd_signup, cmd_status, cmd_wipe};
pub(crate) use body::{
    BodyInput, cmd_body_history, cmd_body_log, cmd_measure_history, cmd_measure_log,
};
pub(crate) use habit::{cmd_habit_add, cmd_habit_delete, cmd_habit_done, cmd_habit_list};
pub(crate) use helpers::parse_date;
pub(crate) use nutrition::{NutritionInput, cmd_nutrition_log, cmd_nutrition_show};
pub(crate) use photo::{cmd_photo_add, cmd_photo_delete, cmd_photo_favorite, cmd_photo_list};
pub(crate) use plan::{
    ProfileInput, cmd_plan_set, cmd_plan_show, cmd_profile_set, cmd_profile_show,
};
pub(crate) use strength::{
    StrengthInput, cmd_strength_delete, cmd_strength_history, cmd_strength_log,
};
pub(crate) use supplement::{
    SupplementInput, cmd_supplement_add, cmd_supplement_delete, cmd_supplement_list,
    cmd_supplement_take,
};

pub(crate) type Remote<B = RestBackend> = RemoteStore<B, SessionSlot>;

/// Everything a command needs: local tracker, plus the remote store when a
/// backend is configured.
pub(crate) struct App<B = RestBackend> {
    pub config: Config,
    pub tracker: Tracker<Database>,
    remote: Option<Remote<B>>,
}

impl App<RestBackend> {
    pub fn open(config: Config) -> Result<Self> {
        let tracker = Tracker::open(&config.db_path)?;
        let remote = match config.load_backend()? {
            Some(settings) => Some(RemoteStore::new(
                RestBackend::new(&settings)?,
                SessionSlot::new(config.load_session()?),
            )),
            None => None,
        };
        Ok(Self {
            config,
            tracker,
            remote,
        })
    }
}

impl<B: TableBackend> App<B> {
    /// The remote store, only while signed in.
    pub(super) fn remote(&self) -> Option<&Remote<B>> {
        self.remote
            .as_ref()
            .filter(|r| r.sessions().current_user().is_some())
    }
}

// --- Remote with local fallback ---

/// Adds a re-login hint when the backend rejected the stored session.
pub(super) fn session_hint(e: RemoteError) -> anyhow::Error {
    match e {
        RemoteError::NotAuthenticated => {
            anyhow::Error::new(e).context("Your session has expired. Run `fitlog login` again")
        }
        other => other.into(),
    }
}

fn fallback_notice(e: &RemoteError) -> String {
    match e {
        RemoteError::NotAuthenticated => {
            "Warning: your session has expired; run `fitlog login` again. Showing local data"
                .to_string()
        }
        _ => format!("Warning: could not reach the backend ({e}); showing local data"),
    }
}

/// Log and report a failed remote read before local data is shown instead.
pub(super) fn warn_fallback(table: &str, e: &RemoteError) {
    tracing::warn!(table, error = %e, "remote read failed, using local data");
    eprintln!("{}", fallback_notice(e));
}

/// Save through the remote store when signed in, otherwise locally.
pub(super) async fn save_record<E: RemoteEntity, B: TableBackend>(
    app: &App<B>,
    record: E,
    local: impl FnOnce(&Tracker<Database>, E) -> Result<E>,
) -> Result<E> {
    match app.remote() {
        Some(remote) => {
            remote
                .save(std::slice::from_ref(&record))
                .await
                .map_err(session_hint)?;
            Ok(record)
        }
        None => local(&app.tracker, record),
    }
}

/// Read from the remote store when signed in, falling back to local data if
/// the backend call fails.
pub(super) async fn load_records<E: RemoteEntity, B: TableBackend>(
    app: &App<B>,
    local: impl FnOnce(&Tracker<Database>) -> Vec<E>,
) -> Vec<E> {
    if let Some(remote) = app.remote() {
        match remote.get::<E>().await {
            Ok(records) => return records,
            Err(e) => warn_fallback(E::TABLE, &e),
        }
    }
    local(&app.tracker)
}

pub(super) async fn delete_record<E: RemoteEntity, B: TableBackend>(
    app: &App<B>,
    id: &str,
    local: impl FnOnce(&Tracker<Database>, &str) -> Result<bool>,
) -> Result<bool> {
    match app.remote() {
        Some(remote) => {
            remote.delete::<E>(id).await.map_err(session_hint)?;
            Ok(true)
        }
        None => local(&app.tracker, id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitlog_core::models::Habit;
    use fitlog_core::remote::{MemoryBackend, Session};

    impl<B: TableBackend> App<B> {
        fn with_backend(config: Config, backend: B, session: Option<Session>) -> Self {
            Self {
                config,
                tracker: Tracker::open_in_memory().unwrap(),
                remote: Some(RemoteStore::new(backend, SessionSlot::new(session))),
            }
        }
    }

    fn session() -> Session {
        Session {
            user_id: "u1".to_string(),
            email: "sam@example.com".to_string(),
            access_token: "token".to_string(),
        }
    }

    /// An app with an in-memory backend; the temp dir must outlive it.
    pub(super) fn test_app(signed_in: bool) -> (tempfile::TempDir, App<MemoryBackend>) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::at(dir.path()).unwrap();
        let app = App::with_backend(config, MemoryBackend::new(), signed_in.then(session));
        (dir, app)
    }

    fn habit(id: &str, name: &str) -> Habit {
        Habit {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            icon: None,
            target: 1,
        }
    }

    fn backend(app: &App<MemoryBackend>) -> &MemoryBackend {
        app.remote.as_ref().unwrap().backend()
    }

    #[tokio::test]
    async fn test_signed_in_save_goes_to_backend() {
        let (_dir, app) = test_app(true);
        let saved = save_record(&app, habit("h1", "Walk"), |t, h| t.add_habit(h))
            .await
            .unwrap();

        assert_eq!(saved.id, "h1");
        assert_eq!(backend(&app).rows("habits").len(), 1);
        assert!(app.tracker.habits().is_empty());

        let loaded = load_records(&app, |t| t.habits()).await;
        assert_eq!(loaded, [habit("h1", "Walk")]);
    }

    #[tokio::test]
    async fn test_failing_table_falls_back_to_local() {
        let (_dir, app) = test_app(true);
        app.tracker.add_habit(habit("h1", "Stretch")).unwrap();
        backend(&app).fail_table("habits");

        let loaded = load_records(&app, |t| t.habits()).await;
        assert_eq!(loaded, [habit("h1", "Stretch")]);
        assert_eq!(backend(&app).calls_for("habits"), 1);
    }

    #[tokio::test]
    async fn test_failing_table_save_is_an_error() {
        let (_dir, app) = test_app(true);
        backend(&app).fail_table("habits");

        let result = save_record(&app, habit("h1", "Walk"), |t, h| t.add_habit(h)).await;
        assert!(result.is_err());
        assert!(app.tracker.habits().is_empty());
    }

    #[tokio::test]
    async fn test_signed_out_uses_local() {
        let (_dir, app) = test_app(false);
        assert!(app.remote().is_none());

        save_record(&app, habit("h1", "Walk"), |t, h| t.add_habit(h))
            .await
            .unwrap();
        let loaded = load_records(&app, |t| t.habits()).await;
        assert_eq!(loaded, [habit("h1", "Walk")]);

        let deleted = delete_record::<Habit, _>(&app, "h1", |t, id| t.delete_habit(id))
            .await
            .unwrap();
        assert!(deleted);
        assert!(app.tracker.habits().is_empty());
        assert!(backend(&app).calls().is_empty());
    }

    #[tokio::test]
    async fn test_signed_in_delete_goes_to_backend() {
        let (_dir, app) = test_app(true);
        app.tracker.add_habit(habit("h1", "Walk")).unwrap();
        save_record(&app, habit("h1", "Walk"), |t, h| t.add_habit(h))
            .await
            .unwrap();

        delete_record::<Habit, _>(&app, "h1", |t, id| t.delete_habit(id))
            .await
            .unwrap();
        assert!(backend(&app).rows("habits").is_empty());
        assert_eq!(app.tracker.habits().len(), 1);
    }

    #[test]
    fn test_expired_session_messages() {
        let notice = fallback_notice(&RemoteError::NotAuthenticated);
        assert!(notice.contains("fitlog login"));
        let notice = fallback_notice(&RemoteError::backend("habits", "503"));
        assert!(notice.contains("could not reach the backend"));

        let err = session_hint(RemoteError::NotAuthenticated);
        assert!(format!("{err:#}").starts_with("Your session has expired"));
        let err = session_hint(RemoteError::backend("habits", "503"));
        assert!(!format!("{err:#}").contains("fitlog login"));
    }
}
