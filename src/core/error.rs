// Author: Dustin Pilgrim
// License: MIT

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An event was rejected because it is invalid in the current state.
    ///
    /// Examples:
    /// - start while already started
    /// - any event after the logout redirect
    InvalidState(StateError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Idle timeout was zero/negative and not the development sentinel.
    InvalidIdleTimeout(i64),

    /// Logout url was empty or contained whitespace.
    InvalidLogoutUrl,

    /// Cookie domain was empty or contained characters that break the cookie string.
    InvalidCookieDomain,

    /// A polling period of zero was requested.
    ZeroPollPeriod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    AlreadyStarted,
    NotStarted,
    Terminated,
}

// ---------------- Display ----------------

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidState(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidIdleTimeout(v) => write!(
                f,
                "invalid idle timeout: {v} (expected minutes > 0, or -1 for development)"
            ),
            ConfigError::InvalidLogoutUrl =>
                write!(f, "invalid logout url"),
            ConfigError::InvalidCookieDomain =>
                write!(f, "invalid cookie domain"),
            ConfigError::ZeroPollPeriod =>
                write!(f, "polling periods must be non-zero"),
        }
    }
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::AlreadyStarted =>
                write!(f, "monitor already started"),
            StateError::NotStarted =>
                write!(f, "monitor not started"),
            StateError::Terminated =>
                write!(f, "session already terminated"),
        }
    }
}

impl From<StateError> for Error {
    fn from(e: StateError) -> Self {
        Error::InvalidState(e)
    }
}

impl std::error::Error for Error {}
impl std::error::Error for ConfigError {}
impl std::error::Error for StateError {}
