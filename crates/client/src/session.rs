//! Cached session record.
//!
//! The identity returned at login is cached in a small JSON file so later
//! runs know who is shopping. The store is read once per page lifetime and
//! handed to the controller as a [`Session`] value; the only writers are
//! login ([`SessionStore::store`]) and logout ([`SessionStore::clear`]).
//!
//! A second record remembers where the user was when a login was required,
//! so the flow can resume after logging in.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clicleitura_core::UserIdentity;
use thiserror::Error;
use tracing::{debug, warn};

const REDIRECT_FILE: &str = "redirect-after-login";

/// Errors that can occur when writing the session record.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session storage error: {0}")]
    Io(#[from] io::Error),
    #[error("Session encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Who is using the storefront in this page lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    /// Nobody is logged in; guests see no cart.
    #[default]
    Anonymous,
    /// A cached identity was found.
    LoggedIn(UserIdentity),
}

impl Session {
    /// The cached identity, if logged in.
    #[must_use]
    pub const fn identity(&self) -> Option<&UserIdentity> {
        match self {
            Self::Anonymous => None,
            Self::LoggedIn(identity) => Some(identity),
        }
    }

    /// Whether a user is logged in.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn(_))
    }
}

/// File-backed storage for the cached identity.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Use `path` as the identity record.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the identity record.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached identity.
    ///
    /// Missing or unreadable records and invalid JSON all fall back to
    /// [`Session::Anonymous`].
    #[must_use]
    pub fn load(&self) -> Session {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Session::Anonymous,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read session record");
                return Session::Anonymous;
            }
        };

        match serde_json::from_str::<Option<UserIdentity>>(&raw) {
            Ok(Some(identity)) => {
                debug!(user_id = %identity.id, "Loaded cached identity");
                Session::LoggedIn(identity)
            }
            Ok(None) => Session::Anonymous,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring malformed session record");
                Session::Anonymous
            }
        }
    }

    /// Cache `identity` as the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns error if the record cannot be written.
    pub fn store(&self, identity: &UserIdentity) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(identity)?)?;
        Ok(())
    }

    /// Forget the cached identity. Succeeds if there was none.
    ///
    /// # Errors
    ///
    /// Returns error if an existing record cannot be removed.
    pub fn clear(&self) -> Result<(), SessionError> {
        remove_if_exists(&self.path)
    }

    /// Remember where the user was when a login was required.
    ///
    /// # Errors
    ///
    /// Returns error if the record cannot be written.
    pub fn remember_redirect(&self, path: &str) -> Result<(), SessionError> {
        let file = self.redirect_path();
        if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(file, path)?;
        Ok(())
    }

    /// Read and forget the remembered location.
    #[must_use]
    pub fn take_redirect(&self) -> Option<String> {
        let file = self.redirect_path();
        let path = fs::read_to_string(&file).ok()?;
        if let Err(e) = remove_if_exists(&file) {
            warn!(error = %e, "Could not remove redirect record");
        }
        let path = path.trim();
        (!path.is_empty()).then(|| path.to_string())
    }

    fn redirect_path(&self) -> PathBuf {
        self.path.with_file_name(REDIRECT_FILE)
    }
}

fn remove_if_exists(path: &Path) -> Result<(), SessionError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
