use anyhow::{Context, Result, bail};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use fitlog_core::remote::{Order, RemoteError, Row, Session, TableBackend};

use crate::config::BackendSettings;

/// Client for the hosted backend: PostgREST-style tables under `/rest/v1`
/// and password auth under `/auth/v1`.
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
}

impl AuthResponse {
    fn into_session(self, email: &str) -> Option<Session> {
        let access_token = self.access_token?;
        let user = self.user?;
        Some(Session {
            user_id: user.id,
            email: user.email.unwrap_or_else(|| email.to_string()),
            access_token,
        })
    }
}

impl RestBackend {
    pub fn new(settings: &BackendSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("fitlog-cli/{}", env!("CARGO_PKG_VERSION")))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn authed(&self, req: RequestBuilder, token: &str) -> RequestBuilder {
        req.header("apikey", &self.api_key).bearer_auth(token)
    }

    // --- Auth ---

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let resp = self
            .authed(self.client.post(self.auth_url("token")), &self.api_key)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .context("Failed to reach the backend")?;
        let auth: AuthResponse = auth_json(resp).await?;
        auth.into_session(email).context("Sign-in response did not include a session")
    }

    /// Returns `None` when the backend wants the address confirmed before
    /// the first sign-in.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>> {
        let resp = self
            .authed(self.client.post(self.auth_url("signup")), &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .context("Failed to reach the backend")?;
        let auth: AuthResponse = auth_json(resp).await?;
        Ok(auth.into_session(email))
    }

    pub async fn sign_out(&self, session: &Session) -> Result<()> {
        let resp = self
            .authed(self.client.post(self.auth_url("logout")), &session.access_token)
            .send()
            .await
            .context("Failed to reach the backend")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Sign-out failed ({status}): {}", auth_error_message(&body));
        }
        Ok(())
    }
}

async fn auth_json<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("Authentication failed ({status}): {}", auth_error_message(&body));
    }
    resp.json()
        .await
        .context("Failed to parse authentication response")
}

/// The most specific message in an auth error body.
fn auth_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

// --- Table requests ---

fn upsert_params(on_conflict: &[&str]) -> Vec<(&'static str, String)> {
    vec![("on_conflict", on_conflict.join(","))]
}

fn select_params(user_id: &str, order: Option<Order>) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("select", "*".to_string()),
        ("user_id", format!("eq.{user_id}")),
    ];
    if let Some(order) = order {
        let dir = if order.descending { "desc" } else { "asc" };
        params.push(("order", format!("{}.{dir}", order.column)));
    }
    params
}

fn delete_params(id: &str, user_id: &str) -> Vec<(&'static str, String)> {
    vec![("id", format!("eq.{id}")), ("user_id", format!("eq.{user_id}"))]
}

fn transport_error(table: &str, e: &reqwest::Error) -> RemoteError {
    RemoteError::backend(table, format!("request failed: {e}"))
}

/// A rejected or expired token is an authentication failure, not a backend one.
fn status_error(table: &str, status: StatusCode, body: &str) -> RemoteError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::NotAuthenticated,
        _ => RemoteError::backend(table, format!("{status}: {}", body.trim())),
    }
}

async fn check(table: &str, resp: Response) -> Result<Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    tracing::debug!(table, %status, "table request rejected");
    Err(status_error(table, status, &body))
}

impl TableBackend for RestBackend {
    async fn upsert(
        &self,
        session: &Session,
        table: &str,
        on_conflict: &[&str],
        rows: Vec<Row>,
    ) -> Result<(), RemoteError> {
        let resp = self
            .authed(self.client.post(self.table_url(table)), &session.access_token)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .query(&upsert_params(on_conflict))
            .json(&rows)
            .send()
            .await
            .map_err(|e| transport_error(table, &e))?;
        check(table, resp).await?;
        Ok(())
    }

    async fn select(
        &self,
        session: &Session,
        table: &str,
        order: Option<Order>,
    ) -> Result<Vec<Row>, RemoteError> {
        let resp = self
            .authed(self.client.get(self.table_url(table)), &session.access_token)
            .query(&select_params(&session.user_id, order))
            .send()
            .await
            .map_err(|e| transport_error(table, &e))?;
        let resp = check(table, resp).await?;
        let text = resp.text().await.map_err(|e| transport_error(table, &e))?;
        serde_json::from_str(&text).map_err(|source| RemoteError::Encoding {
            table: table.to_string(),
            source,
        })
    }

    async fn delete(&self, session: &Session, table: &str, id: &str) -> Result<(), RemoteError> {
        let resp = self
            .authed(self.client.delete(self.table_url(table)), &session.access_token)
            .query(&delete_params(id, &session.user_id))
            .send()
            .await
            .map_err(|e| transport_error(table, &e))?;
        check(table, resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> RestBackend {
        RestBackend::new(&BackendSettings {
            url: "https://abc.example.co/".to_string(),
            api_key: "anon".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_urls() {
        let b = backend();
        assert_eq!(b.table_url("habits"), "https://abc.example.co/rest/v1/habits");
        assert_eq!(b.auth_url("token"), "https://abc.example.co/auth/v1/token");
    }

    #[test]
    fn test_select_params_scope_and_order() {
        let params = select_params("u1", Some(Order::desc("date")));
        assert_eq!(
            params,
            [
                ("select", "*".to_string()),
                ("user_id", "eq.u1".to_string()),
                ("order", "date.desc".to_string()),
            ]
        );
        assert_eq!(
            select_params("u1", Some(Order::asc("name")))[2],
            ("order", "name.asc".to_string())
        );
        assert_eq!(select_params("u1", None).len(), 2);
    }

    #[test]
    fn test_upsert_and_delete_params() {
        assert_eq!(
            upsert_params(&["user_id", "habit_id", "date"]),
            [("on_conflict", "user_id,habit_id,date".to_string())]
        );
        assert_eq!(
            delete_params("i1", "u1"),
            [("id", "eq.i1".to_string()), ("user_id", "eq.u1".to_string())]
        );
    }

    #[test]
    fn test_status_error_maps_auth_failures() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            assert!(matches!(
                status_error("habits", status, r#"{"message":"JWT expired"}"#),
                RemoteError::NotAuthenticated
            ));
        }
        match status_error("habits", StatusCode::SERVICE_UNAVAILABLE, " down ") {
            RemoteError::Backend { table, message } => {
                assert_eq!(table, "habits");
                assert_eq!(message, "503 Service Unavailable: down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_auth_response_into_session() {
        let auth: AuthResponse = serde_json::from_str(
            r#"{"access_token":"t","token_type":"bearer","user":{"id":"u1","email":"a@b.c"}}"#,
        )
        .unwrap();
        let session = auth.into_session("ignored@b.c").unwrap();
        assert_eq!(session.user_id, "u1");
        assert_eq!(session.email, "a@b.c");
        assert_eq!(session.access_token, "t");
    }

    #[test]
    fn test_signup_pending_confirmation_has_no_session() {
        let auth: AuthResponse =
            serde_json::from_str(r#"{"id":"u1","email":"a@b.c","confirmation_sent_at":"x"}"#)
                .unwrap();
        assert!(auth.into_session("a@b.c").is_none());
    }

    #[test]
    fn test_auth_error_message() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(auth_error_message(body), "Invalid login credentials");
        assert_eq!(
            auth_error_message(r#"{"msg":"User already registered"}"#),
            "User already registered"
        );
        assert_eq!(auth_error_message(" bad gateway "), "bad gateway");
    }

    // --- Integration tests (hit a real hosted backend) ---

    fn live_backend() -> (RestBackend, String, String) {
        let var = |k: &str| std::env::var(k).unwrap_or_else(|_| panic!("{k} not set"));
        let backend = RestBackend::new(&BackendSettings {
            url: var("FITLOG_TEST_URL"),
            api_key: var("FITLOG_TEST_API_KEY"),
        })
        .unwrap();
        (backend, var("FITLOG_TEST_EMAIL"), var("FITLOG_TEST_PASSWORD"))
    }

    #[tokio::test]
    #[ignore = "hits the hosted backend"]
    async fn test_sign_in_and_select() {
        let (backend, email, password) = live_backend();
        let session = backend.sign_in(&email, &password).await.unwrap();
        let rows = backend
            .select(&session, "habits", None)
            .await
            .unwrap();
        assert!(
            rows.iter()
                .all(|r| r.get("user_id").and_then(Value::as_str) == Some(session.user_id.as_str()))
        );
    }

    #[tokio::test]
    #[ignore = "hits the hosted backend"]
    async fn test_wrong_password_is_rejected() {
        let (backend, email, _) = live_backend();
        assert!(backend.sign_in(&email, "definitely-wrong").await.is_err());
    }
}
