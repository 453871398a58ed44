use anyhow::{Result, bail};
use tabled::Tabled;

use fitlog_core::migration::{ClearPolicy, MigrationReport, MigrationRoutine, NamespaceOutcome};
use fitlog_core::remote::{RemoteStore, Session, SessionSlot};

use super::App;
use super::helpers::{print_json, print_table, read_password};
use crate::backend::RestBackend;

pub(crate) struct Credentials {
    pub email: String,
    pub url: Option<String>,
    pub api_key: Option<String>,
}

fn policy(keep_failed: bool) -> ClearPolicy {
    if keep_failed {
        ClearPolicy::MigratedOnly
    } else {
        ClearPolicy::Unconditional
    }
}

/// Persist the session, then move any local data into the account.
async fn start_session(
    app: &App,
    backend: RestBackend,
    session: Session,
    keep_failed: bool,
) -> Result<MigrationReport> {
    app.config.save_session(&session)?;
    tracing::info!(user = %session.user_id, "signed in");
    let remote = RemoteStore::new(backend, SessionSlot::new(Some(session)));
    let mut routine =
        MigrationRoutine::new(app.tracker.store(), &remote).with_policy(policy(keep_failed));
    Ok(routine.run().await)
}

fn print_report(report: &MigrationReport) {
    let migrated: Vec<_> = report
        .outcomes
        .iter()
        .filter(|(_, o)| !matches!(o, NamespaceOutcome::Skipped))
        .collect();
    if migrated.is_empty() {
        println!("No local data to upload.");
    } else {
        println!(
            "Uploaded {} local record(s) to your account:",
            report.migrated_records()
        );
        for (ns, outcome) in migrated {
            match outcome {
                NamespaceOutcome::Migrated { records } => println!("  {ns:<24} {records}"),
                NamespaceOutcome::Failed { error } => println!("  {ns:<24} FAILED: {error}"),
                NamespaceOutcome::Skipped => {}
            }
        }
    }
    if let Some(err) = &report.clear_error {
        eprintln!("Warning: could not clear local data: {err}");
    }
    if report.has_failures() {
        let kept = report
            .failed_namespaces()
            .into_iter()
            .filter(|ns| !report.cleared.contains(ns))
            .count();
        if kept > 0 {
            eprintln!("Failed namespaces were kept locally; log in again to retry them.");
        } else {
            eprintln!("Some data could not be uploaded and was removed locally.");
        }
    }
}

pub(crate) async fn cmd_login(
    app: &App,
    creds: Credentials,
    keep_failed: bool,
    json: bool,
) -> Result<()> {
    let settings = app.config.resolve_backend(creds.url, creds.api_key)?;
    let password = read_password()?;
    let backend = RestBackend::new(&settings)?;
    let session = backend.sign_in(&creds.email, &password).await?;
    let email = session.email.clone();
    let report = start_session(app, backend, session, keep_failed).await?;

    if json {
        print_json(&serde_json::json!({ "email": email, "migration": report }))?;
    } else {
        println!("Signed in as {email}");
        print_report(&report);
    }
    Ok(())
}

pub(crate) async fn cmd_signup(
    app: &App,
    creds: Credentials,
    keep_failed: bool,
    json: bool,
) -> Result<()> {
    let settings = app.config.resolve_backend(creds.url, creds.api_key)?;
    let password = read_password()?;
    let backend = RestBackend::new(&settings)?;

    let Some(session) = backend.sign_up(&creds.email, &password).await? else {
        if json {
            print_json(&serde_json::json!({
                "email": creds.email,
                "confirmation_required": true,
            }))?;
        } else {
            println!(
                "Account created. Confirm {} from your inbox, then run `fitlog login`.",
                creds.email
            );
        }
        return Ok(());
    };

    let email = session.email.clone();
    let report = start_session(app, backend, session, keep_failed).await?;
    if json {
        print_json(&serde_json::json!({ "email": email, "migration": report }))?;
    } else {
        println!("Account created and signed in as {email}");
        print_report(&report);
    }
    Ok(())
}

pub(crate) async fn cmd_logout(app: &App, json: bool) -> Result<()> {
    let session = app.config.load_session()?;
    if let (Some(session), Some(settings)) = (&session, app.config.load_backend()?) {
        let backend = RestBackend::new(&settings)?;
        if let Err(e) = backend.sign_out(session).await {
            tracing::warn!(error = %format!("{e:#}"), "remote sign-out failed");
        }
    }
    let removed = app.config.clear_session()?;

    if json {
        println!("{}", serde_json::json!({ "signed_out": removed }));
    } else if removed {
        println!("Signed out");
    } else {
        println!("Not signed in");
    }
    Ok(())
}

pub(crate) fn cmd_status(app: &App, json: bool) -> Result<()> {
    let session = app.config.load_session()?;
    let backend = app.config.load_backend()?;
    let counts = app.tracker.namespace_counts();

    if json {
        let local: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|(ns, n)| (ns.key().to_string(), (*n).into()))
            .collect();
        return print_json(&serde_json::json!({
            "signed_in": session.is_some(),
            "email": session.as_ref().map(|s| s.email.as_str()),
            "backend": backend.as_ref().map(|b| b.url.as_str()),
            "data_dir": app.config.data_dir,
            "local": local,
        }));
    }

    match &session {
        Some(s) => println!("Signed in as {}", s.email),
        None => println!("Not signed in; data is stored on this machine"),
    }
    if let Some(b) = &backend {
        println!("Backend: {}", b.url);
    }
    println!("Data:    {}", app.config.data_dir.display());

    #[derive(Tabled)]
    struct CountRow {
        #[tabled(rename = "Namespace")]
        namespace: String,
        #[tabled(rename = "Records")]
        records: usize,
    }

    let rows: Vec<CountRow> = counts
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(ns, n)| CountRow {
            namespace: ns.to_string(),
            records: *n,
        })
        .collect();
    if rows.is_empty() {
        println!("No local records");
    } else {
        print_table(&rows, 1..2);
    }
    Ok(())
}

pub(crate) fn cmd_wipe(app: &App, yes: bool, json: bool) -> Result<()> {
    if !yes {
        bail!("This deletes all local data. Re-run with --yes to confirm");
    }
    app.tracker.wipe()?;
    tracing::info!("local data wiped");

    if json {
        println!("{}", serde_json::json!({ "wiped": true }));
    } else {
        println!("Local data deleted");
    }
    Ok(())
}
