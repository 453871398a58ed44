use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use fitlog_core::remote::Session;

/// Where the hosted backend lives and the public key it expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    pub url: String,
    pub api_key: String,
}

pub struct Config {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    backend_path: PathBuf,
    session_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "fitlog").context("Could not determine home directory")?;
        Self::at(proj_dirs.data_dir())
    }

    pub fn at(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        Ok(Config {
            data_dir: data_dir.to_path_buf(),
            db_path: data_dir.join("local.db"),
            backend_path: data_dir.join("backend.json"),
            session_path: data_dir.join("session.json"),
        })
    }

    // --- Backend settings ---

    pub fn load_backend(&self) -> Result<Option<BackendSettings>> {
        read_json(&self.backend_path)
    }

    pub fn save_backend(&self, settings: &BackendSettings) -> Result<()> {
        if !settings.url.starts_with("http://") && !settings.url.starts_with("https://") {
            bail!("Backend URL must start with http:// or https://");
        }
        write_private(&self.backend_path, &serde_json::to_string_pretty(settings)?)
    }

    /// Stored settings overridden by whichever of `url` / `api_key` is given.
    pub fn resolve_backend(
        &self,
        url: Option<String>,
        api_key: Option<String>,
    ) -> Result<BackendSettings> {
        let stored = self.load_backend()?;
        let url = url.or_else(|| stored.as_ref().map(|s| s.url.clone()));
        let api_key = api_key.or_else(|| stored.as_ref().map(|s| s.api_key.clone()));
        match (url, api_key) {
            (Some(url), Some(api_key)) => {
                let settings = BackendSettings {
                    url: url.trim_end_matches('/').to_string(),
                    api_key,
                };
                if stored.as_ref() != Some(&settings) {
                    self.save_backend(&settings)?;
                }
                Ok(settings)
            }
            _ => bail!("No backend configured. Pass --url and --api-key once to set it up"),
        }
    }

    // --- Session ---

    /// A session file that no longer parses is treated as signed out.
    pub fn load_session(&self) -> Result<Option<Session>> {
        match read_json(&self.session_path) {
            Ok(session) => Ok(session),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    pub fn save_session(&self, session: &Session) -> Result<()> {
        write_private(&self.session_path, &serde_json::to_string(session)?)
    }

    pub fn clear_session(&self) -> Result<bool> {
        match std::fs::remove_file(&self.session_path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).context("Failed to remove session file"),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(value))
}

/// Write a file readable only by the current user.
fn write_private(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }
    Ok(())
}
