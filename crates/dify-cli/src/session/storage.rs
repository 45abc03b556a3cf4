//! Session storage for persisting login state.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use dify::{ApiKey, BaseUrl, ClientConfig, Session, TokenPair};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Stored session data.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    base_url: String,
    language: String,
    access_token: String,
    refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
}

/// Get the session file path.
fn session_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "dify").context("Could not determine data directory")?;

    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    Ok(data_dir.join("session.json"))
}

/// Save a session to disk.
///
/// Called after every command that may have rotated tokens.
pub async fn save_session(session: &Session) -> Result<()> {
    let tokens = session.export_tokens().await;

    let stored = StoredSession {
        base_url: session.base_url().to_string(),
        language: session.config().language.clone(),
        access_token: tokens.access_token.as_str().to_string(),
        refresh_token: tokens.refresh_token.as_str().to_string(),
        api_key: tokens.api_key.map(|k| k.as_str().to_string()),
    };

    let path = session_path()?;
    let json = serde_json::to_string_pretty(&stored)?;

    fs::write(&path, &json).context("Failed to write session file")?;

    // Set restrictive permissions (Unix only)
    #[cfg(unix)]
    {
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&path, perms)?;
    }

    tracing::debug!(path = %path.display(), "Session saved");
    Ok(())
}

/// Load a session from disk.
///
/// Tokens are restored as-is; an expired access token is refreshed by the
/// first console call.
pub async fn load_session() -> Result<Option<Session>> {
    let path = session_path()?;

    if !path.exists() {
        return Ok(None);
    }

    let json = fs::read_to_string(&path).context("Failed to read session file")?;
    let stored: StoredSession = serde_json::from_str(&json).context("Invalid session file")?;

    let base_url = BaseUrl::new(&stored.base_url).context("Invalid base URL in session")?;
    let config = ClientConfig::new(base_url).with_language(stored.language);

    let session = Session::from_persisted(
        config,
        TokenPair::new(stored.access_token, stored.refresh_token),
        stored.api_key.map(ApiKey::new),
    )
    .context("Failed to restore session")?;

    Ok(Some(session))
}

/// Remove the stored session.
pub async fn clear_session() -> Result<bool> {
    let path = session_path()?;

    if path.exists() {
        fs::remove_file(&path).context("Failed to remove session file")?;
        return Ok(true);
    }

    Ok(false)
}
