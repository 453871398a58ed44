//! An in-process [`TableBackend`] that keeps tables in memory, for tests.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use super::{Order, RemoteError, Row, Session, TableBackend};
use crate::models::new_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Upsert,
    Select,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub kind: CallKind,
    pub table: String,
}

/// A backend held in memory. Honors the table contract (generated ids,
/// conflict-column upserts, per-user scoping, ordering) and records every
/// call. Tables can be marked failing to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    calls: Mutex<Vec<BackendCall>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every later call against `table` fails with a backend error.
    pub fn fail_table(&self, table: &str) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(table.to_string());
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn calls_for(&self, table: &str) -> usize {
        self.calls().iter().filter(|c| c.table == table).count()
    }

    /// Raw stored rows for every user.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn begin(&self, kind: CallKind, table: &str) -> Result<(), RemoteError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(BackendCall {
                kind,
                table: table.to_string(),
            });
        let failing = self.failing.lock().unwrap_or_else(PoisonError::into_inner);
        if failing.contains(table) {
            return Err(RemoteError::backend(table, "service unavailable"));
        }
        Ok(())
    }

    fn upsert_rows(
        &self,
        session: &Session,
        table: &str,
        on_conflict: &[&str],
        rows: Vec<Row>,
    ) -> Result<(), RemoteError> {
        self.begin(CallKind::Upsert, table)?;
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let stored = tables.entry(table.to_string()).or_default();
        for mut row in rows {
            if row.get("user_id").and_then(Value::as_str) != Some(session.user_id.as_str()) {
                return Err(RemoteError::backend(
                    table,
                    "row user_id does not match the authenticated user",
                ));
            }
            if !row.contains_key("id") {
                row.insert("id".to_string(), Value::String(new_id()));
            }
            let existing = stored
                .iter()
                .position(|r| on_conflict.iter().all(|col| r.get(*col) == row.get(*col)));
            match existing {
                Some(idx) => stored[idx] = row,
                None => stored.push(row),
            }
        }
        Ok(())
    }

    fn select_rows(
        &self,
        session: &Session,
        table: &str,
        order: Option<Order>,
    ) -> Result<Vec<Row>, RemoteError> {
        self.begin(CallKind::Select, table)?;
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let mut rows: Vec<Row> = tables
            .get(table)
            .into_iter()
            .flatten()
            .filter(|r| r.get("user_id").and_then(Value::as_str) == Some(session.user_id.as_str()))
            .cloned()
            .collect();
        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let ord = compare_values(a.get(order.column), b.get(order.column));
                if order.descending { ord.reverse() } else { ord }
            });
        }
        Ok(rows)
    }

    fn delete_row(&self, session: &Session, table: &str, id: &str) -> Result<(), RemoteError> {
        self.begin(CallKind::Delete, table)?;
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(stored) = tables.get_mut(table) {
            stored.retain(|r| {
                r.get("id").and_then(Value::as_str) != Some(id)
                    || r.get("user_id").and_then(Value::as_str) != Some(session.user_id.as_str())
            });
        }
        Ok(())
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

impl TableBackend for MemoryBackend {
    async fn upsert(
        &self,
        session: &Session,
        table: &str,
        on_conflict: &[&str],
        rows: Vec<Row>,
    ) -> Result<(), RemoteError> {
        self.upsert_rows(session, table, on_conflict, rows)
    }

    async fn select(
        &self,
        session: &Session,
        table: &str,
        order: Option<Order>,
    ) -> Result<Vec<Row>, RemoteError> {
        self.select_rows(session, table, order)
    }

    async fn delete(&self, session: &Session, table: &str, id: &str) -> Result<(), RemoteError> {
        self.delete_row(session, table, id)
    }
}
