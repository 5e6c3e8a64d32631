//! Session error taxonomy.
//!
//! DESIGN
//! ======
//! Transport failures (`Backend`) and domain-rule violations (`User`) are
//! separate top-level variants so callers can tell "the server is
//! unreachable" apart from "this operation is not valid right now" with a
//! single match. Payloads are plain strings so errors stay `Clone`; a shared
//! hydration read hands the same result to every waiter.

// =============================================================================
// SESSION ERRORS
// =============================================================================

/// Errors produced by session manager operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The remote call failed at the transport level, returned a non-200
    /// status, or sent a body that could not be decoded.
    #[error("unable to fetch resource: {endpoint} ({reason})")]
    Backend { endpoint: String, reason: String },

    /// The operation was invoked in a state that does not satisfy its
    /// precondition, or the remote service rejected it.
    #[error(transparent)]
    User(#[from] UserError),
}

/// User-facing domain violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserError {
    #[error("already logged in")]
    AlreadyLoggedIn,

    #[error("currently no user is logged in")]
    NotLoggedIn,

    #[error("invalid login for user {username}")]
    InvalidLogin { username: String },

    #[error("no login session")]
    NoSession,

    #[error("unable to create user")]
    CreateFailed,
}

/// Flat classification of a [`SessionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Backend,
    AlreadyLoggedIn,
    NotLoggedIn,
    InvalidLogin,
    NoSession,
    CreateFailed,
}

impl SessionError {
    #[must_use]
    pub fn backend(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Backend { endpoint: endpoint.into(), reason: reason.into() }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Backend { .. } => ErrorKind::Backend,
            Self::User(UserError::AlreadyLoggedIn) => ErrorKind::AlreadyLoggedIn,
            Self::User(UserError::NotLoggedIn) => ErrorKind::NotLoggedIn,
            Self::User(UserError::InvalidLogin { .. }) => ErrorKind::InvalidLogin,
            Self::User(UserError::NoSession) => ErrorKind::NoSession,
            Self::User(UserError::CreateFailed) => ErrorKind::CreateFailed,
        }
    }

    /// True for every kind except a transport failure.
    #[must_use]
    pub fn is_domain_violation(&self) -> bool {
        matches!(self, Self::User(_))
    }

    /// Grepable error code for logs and UI mapping.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Backend => "E_BACKEND",
            ErrorKind::AlreadyLoggedIn => "E_ALREADY_LOGGED_IN",
            ErrorKind::NotLoggedIn => "E_NOT_LOGGED_IN",
            ErrorKind::InvalidLogin => "E_INVALID_LOGIN",
            ErrorKind::NoSession => "E_NO_SESSION",
            ErrorKind::CreateFailed => "E_CREATE_FAILED",
        }
    }
}

// =============================================================================
// CONFIG ERRORS
// =============================================================================

/// Errors produced while building the session context.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// NAVIGATION ERRORS
// =============================================================================

/// Errors that abort an in-flight navigation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    /// A guard's session call failed and the failure was not absorbed by policy.
    #[error("navigation to {path} aborted: {source}")]
    Session {
        path: String,
        #[source]
        source: SessionError,
    },

    /// Guards kept redirecting without settling on a route.
    #[error("redirect loop navigating to {path} after {hops} hops")]
    RedirectLoop { path: String, hops: usize },
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
