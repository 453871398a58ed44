use std::future::Future;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use crate::mapping::{PROFILE_CONFLICT, PROFILE_TABLE, ProfileRow, RemoteEntity};
use crate::models::Profile;

/// One backend row as a JSON object.
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("backend error on {table}: {message}")]
    Backend { table: String, message: String },

    #[error("failed to encode or decode {table} rows: {source}")]
    Encoding {
        table: String,
        #[source]
        source: serde_json::Error,
    },
}

impl RemoteError {
    pub fn backend(table: &str, message: impl Into<String>) -> Self {
        RemoteError::Backend {
            table: table.to_string(),
            message: message.into(),
        }
    }
}

// --- Authentication boundary ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
}

pub trait SessionProvider {
    /// The authenticated identity, or `None` when signed out.
    fn current_user(&self) -> Option<Session>;
}

/// Holds the current session; sign-in and sign-out swap it in place.
#[derive(Debug, Default)]
pub struct SessionSlot {
    session: Mutex<Option<Session>>,
}

impl SessionSlot {
    pub fn new(session: Option<Session>) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    pub fn sign_in(&self, session: Session) {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    pub fn sign_out(&self) -> Option<Session> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl SessionProvider for SessionSlot {
    fn current_user(&self) -> Option<Session> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

// --- Table backend ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub descending: bool,
}

impl Order {
    pub const fn asc(column: &'static str) -> Self {
        Order {
            column,
            descending: false,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Order {
            column,
            descending: true,
        }
    }
}

/// The hosted multi-table backend. Every call is scoped to `session.user_id`.
pub trait TableBackend {
    /// Insert rows, replacing existing rows that match on `on_conflict`.
    fn upsert(
        &self,
        session: &Session,
        table: &str,
        on_conflict: &[&str],
        rows: Vec<Row>,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn select(
        &self,
        session: &Session,
        table: &str,
        order: Option<Order>,
    ) -> impl Future<Output = Result<Vec<Row>, RemoteError>> + Send;

    fn delete(
        &self,
        session: &Session,
        table: &str,
        id: &str,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

fn encode_row<T: Serialize>(table: &str, row: &T) -> Result<Row, RemoteError> {
    match serde_json::to_value(row) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(RemoteError::backend(
            table,
            format!("row did not encode as an object: {other}"),
        )),
        Err(source) => Err(RemoteError::Encoding {
            table: table.to_string(),
            source,
        }),
    }
}

fn decode_row<T: DeserializeOwned>(table: &str, row: Row) -> Result<T, RemoteError> {
    serde_json::from_value(Value::Object(row)).map_err(|source| RemoteError::Encoding {
        table: table.to_string(),
        source,
    })
}

/// Authenticated CRUD over the backend tables.
///
/// Nothing here falls back to local storage: every failure is returned to the
/// caller as-is, and each table call stands alone with no cross-table
/// transaction.
pub struct RemoteStore<B, P> {
    backend: B,
    sessions: P,
}

impl<B: TableBackend, P: SessionProvider> RemoteStore<B, P> {
    pub fn new(backend: B, sessions: P) -> Self {
        Self { backend, sessions }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn sessions(&self) -> &P {
        &self.sessions
    }

    fn session(&self) -> Result<Session, RemoteError> {
        self.sessions
            .current_user()
            .ok_or(RemoteError::NotAuthenticated)
    }

    /// Attach the user id to every record and bulk-upsert them.
    pub async fn save<E: RemoteEntity>(&self, records: &[E]) -> Result<(), RemoteError> {
        let session = self.session()?;
        if records.is_empty() {
            return Ok(());
        }
        let rows = records
            .iter()
            .map(|r| encode_row(E::TABLE, &r.to_row(&session.user_id)))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(table = E::TABLE, rows = rows.len(), "upserting rows");
        self.backend
            .upsert(&session, E::TABLE, E::CONFLICT, rows)
            .await
    }

    /// All of the user's rows in `E::ORDER`; date-keyed tables come back
    /// newest first, the rest by name.
    pub async fn get<E: RemoteEntity>(&self) -> Result<Vec<E>, RemoteError> {
        let session = self.session()?;
        let rows = self
            .backend
            .select(&session, E::TABLE, Some(E::ORDER))
            .await?;
        rows.into_iter()
            .map(|row| decode_row::<E::Row>(E::TABLE, row).map(E::from_row))
            .collect()
    }

    pub async fn delete<E: RemoteEntity>(&self, id: &str) -> Result<(), RemoteError> {
        let session = self.session()?;
        tracing::debug!(table = E::TABLE, id, "deleting row");
        self.backend.delete(&session, E::TABLE, id).await
    }

    pub async fn save_profile(&self, profile: &Profile) -> Result<(), RemoteError> {
        let session = self.session()?;
        let row = encode_row(
            PROFILE_TABLE,
            &ProfileRow::from_profile(profile, &session.user_id),
        )?;
        self.backend
            .upsert(&session, PROFILE_TABLE, PROFILE_CONFLICT, vec![row])
            .await
    }

    pub async fn get_profile(&self) -> Result<Option<Profile>, RemoteError> {
        let session = self.session()?;
        let rows = self.backend.select(&session, PROFILE_TABLE, None).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(decode_row::<ProfileRow>(PROFILE_TABLE, row)?.into())),
            None => Ok(None),
        }
    }
}

// --- In-process backend ---

#[cfg(any(test, feature = "test-util"))]
mod memory;
#[cfg(any(test, feature = "test-util"))]
pub use memory::{BackendCall, CallKind, MemoryBackend};
