//! Authenticated-session storage and OAuth callback ingestion.
//!
//! The session snapshot lives in `<home>/session.json` with restricted
//! permissions (0600). The bearer token is never logged or displayed in full.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::paths;

/// The authenticated identity and bearer credential held by the client.
///
/// A `Session` only exists with a non-empty token: deserialization of a
/// snapshot with an empty token is treated as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub email: String,
    pub name: String,
    pub picture: String,
}

/// Returns a masked version of a token for display (first 8 chars + ...).
///
/// The token is an opaque string; counting and cutting happen on chars so
/// multibyte content never lands mid-character.
pub fn mask_token(token: &str) -> String {
    if token.chars().count() <= 12 {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(8).collect();
    format!("{prefix}...")
}

/// Persistent store for the single active [`Session`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Creates a store rooted at the default session path.
    pub fn new() -> Self {
        Self {
            path: paths::session_path(),
        }
    }

    /// Creates a store at an explicit path (tests, alternate homes).
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Reads the persisted session, if any.
    ///
    /// Fails soft: a missing, unreadable, or malformed snapshot yields `None`.
    /// Malformed payloads are logged and left in place for inspection.
    pub fn restore(&self) -> Option<Session> {
        if !self.path.exists() {
            return None;
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read session snapshot");
                return None;
            }
        };

        match serde_json::from_str::<Session>(&contents) {
            Ok(session) if !session.token.is_empty() => Some(session),
            Ok(_) => {
                tracing::warn!(path = %self.path.display(), "session snapshot has empty token; ignoring");
                None
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "malformed session snapshot; ignoring");
                None
            }
        }
    }

    /// Writes the full session snapshot, replacing any prior value.
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be serialized or written.
    pub fn persist(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(session).context("Failed to serialize session")?;

        // Write with restricted permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }

    /// Clears the persisted session. Returns whether a snapshot existed.
    ///
    /// # Errors
    /// Returns an error if an existing snapshot cannot be removed.
    pub fn invalidate(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        Ok(true)
    }

    /// Ingests an OAuth callback: constructs and persists a [`Session`].
    ///
    /// Consumes the callback's parameters; a replay of the same callback
    /// returns `Ok(None)` and the session remains available only via
    /// [`SessionStore::restore`].
    ///
    /// # Errors
    /// Returns an error if the session cannot be persisted.
    pub fn ingest(&self, callback: &mut OauthCallback) -> Result<Option<Session>> {
        let Some(params) = callback.consume() else {
            return Ok(None);
        };

        let session = Session {
            token: params.token,
            email: params.email,
            name: params.name,
            picture: params.picture,
        };
        self.persist(&session)?;
        Ok(Some(session))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Transport-carried parameters of the post-authorization redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    pub token: String,
    pub name: String,
    pub email: String,
    pub picture: String,
}

impl CallbackParams {
    /// Parses the redirect URL the identity provider sends the browser to.
    ///
    /// Expects `token`, `name`, `email`, and `picture` query parameters on
    /// the application root; `token` must be non-empty, the rest default to
    /// empty strings. Returns `None` for anything else.
    pub fn from_redirect_url(input: &str) -> Option<Self> {
        let url = url::Url::parse(input.trim()).ok()?;
        let get = |key: &str| {
            url.query_pairs()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.into_owned())
        };

        let token = get("token")?;
        if token.is_empty() {
            return None;
        }

        Some(Self {
            token,
            name: get("name").unwrap_or_default(),
            email: get("email").unwrap_or_default(),
            picture: get("picture").unwrap_or_default(),
        })
    }
}

/// One-shot wrapper around [`CallbackParams`].
///
/// Models the "read query parameters, then scrub the address" idiom as a
/// scoped ingestion: the parameters can be taken exactly once, so a later
/// re-read (the replay case) yields nothing.
#[derive(Debug)]
pub struct OauthCallback {
    params: Option<CallbackParams>,
}

impl OauthCallback {
    pub fn new(params: CallbackParams) -> Self {
        Self {
            params: Some(params),
        }
    }

    /// Takes the parameters, leaving the callback consumed.
    pub fn consume(&mut self) -> Option<CallbackParams> {
        self.params.take()
    }

    /// Whether the callback has already been ingested.
    pub fn is_consumed(&self) -> bool {
        self.params.is_none()
    }
}
