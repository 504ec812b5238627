//! Sign-in gate.
//!
//! Downloads are only allowed for a signed-in user. The identity provider's
//! protocol is handled elsewhere; this module only keeps the resulting
//! identity token and answers whether a user is signed in.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors persisting the identity token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token file error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Identity token is empty")]
    EmptyToken,
}

/// Whether a user is signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    SignedOut,
    SignedIn { identity_token: String },
}

impl AuthStatus {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }

    pub fn identity_token(&self) -> Option<&str> {
        match self {
            Self::SignedIn { identity_token } => Some(identity_token),
            Self::SignedOut => None,
        }
    }
}

/// Source of the current sign-in state.
pub trait AuthGate: Send + Sync {
    fn status(&self) -> AuthStatus;
}

impl<G: AuthGate + ?Sized> AuthGate for Box<G> {
    fn status(&self) -> AuthStatus {
        (**self).status()
    }
}

/// Gate with a fixed answer.
#[derive(Debug, Clone)]
pub struct StaticGate(AuthStatus);

impl StaticGate {
    pub fn signed_in(identity_token: impl Into<String>) -> Self {
        Self(AuthStatus::SignedIn {
            identity_token: identity_token.into(),
        })
    }

    pub fn signed_out() -> Self {
        Self(AuthStatus::SignedOut)
    }
}

impl AuthGate for StaticGate {
    fn status(&self) -> AuthStatus {
        self.0.clone()
    }
}

/// Gate backed by a token file.
///
/// The file holds the identity token obtained at sign-in. A JWT whose `exp`
/// claim has passed counts as signed out; other tokens are treated as opaque
/// and valid while present.
#[derive(Debug, Clone)]
pub struct TokenFileGate {
    path: PathBuf,
}

impl TokenFileGate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stores `token`, replacing any previous one.
    pub fn save_token(&self, token: &str) -> Result<(), AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }
        let io_err = |source| AuthError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(&self.path, token).map_err(io_err)?;
        info!(path = %self.path.display(), "Signed in");
        Ok(())
    }

    /// Removes the stored token. Signing out twice is fine.
    pub fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Signed out");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(AuthError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Sign-in state as of `now`.
    pub fn status_at(&self, now: DateTime<Utc>) -> AuthStatus {
        let token = match fs::read_to_string(&self.path) {
            Ok(content) => content.trim().to_string(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return AuthStatus::SignedOut,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read token file");
                return AuthStatus::SignedOut;
            }
        };

        if token.is_empty() {
            return AuthStatus::SignedOut;
        }
        if let Some(exp) = jwt_expiry(&token) {
            if exp <= now.timestamp() {
                debug!(exp, "Identity token expired");
                return AuthStatus::SignedOut;
            }
        }

        AuthStatus::SignedIn {
            identity_token: token,
        }
    }
}

impl AuthGate for TokenFileGate {
    fn status(&self) -> AuthStatus {
        self.status_at(Utc::now())
    }
}

/// `exp` claim of a JWT, if `token` is one and carries it.
fn jwt_expiry(token: &str) -> Option<i64> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_i64()
}
