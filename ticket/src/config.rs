//! Configuration for the ticket service.
//!
//! Loads configuration from environment variables with defaults. The policy
//! decides how strictly the aggregate guards its own lifecycle.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::{Debug, Display};
use std::str::FromStr;
use thiserror::Error;

/// What to do with a command addressed to another ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MismatchHandling {
    /// Reject with `TicketError::IdentityMismatch`
    #[default]
    Reject,
    /// Drop process commands silently and skip the check on finish
    Ignore,
}

/// Unrecognized policy value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid mismatch handling {0:?}, expected \"reject\" or \"ignore\"")]
pub struct ParseMismatchHandlingError(String);

impl FromStr for MismatchHandling {
    type Err = ParseMismatchHandlingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "ignore" => Ok(Self::Ignore),
            _ => Err(ParseMismatchHandlingError(s.to_string())),
        }
    }
}

/// Lifecycle guards applied by the ticket aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPolicy {
    /// Handling of commands carrying a foreign ticket id
    pub identity_mismatch: MismatchHandling,
    /// Reject process and finish once the ticket is closed
    pub closed_is_terminal: bool,
}

impl TicketPolicy {
    /// Rejects foreign ids and treats `CLOSED` as terminal
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            identity_mismatch: MismatchHandling::Reject,
            closed_is_terminal: true,
        }
    }

    /// Ignores foreign ids on process, never checks them on finish, and
    /// lets a closed ticket be processed and finished again
    #[must_use]
    pub const fn permissive() -> Self {
        Self {
            identity_mismatch: MismatchHandling::Ignore,
            closed_is_terminal: false,
        }
    }
}

impl Default for TicketPolicy {
    fn default() -> Self {
        Self::strict()
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Aggregate policy
    pub policy: TicketPolicy,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `TICKET_IDENTITY_MISMATCH` | `reject` |
    /// | `TICKET_CLOSED_IS_TERMINAL` | `true` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// Unparseable values fall back to the default with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = TicketPolicy::default();
        Self {
            policy: TicketPolicy {
                identity_mismatch: parse_or(
                    "TICKET_IDENTITY_MISMATCH",
                    lookup("TICKET_IDENTITY_MISMATCH"),
                    defaults.identity_mismatch,
                ),
                closed_is_terminal: parse_or(
                    "TICKET_CLOSED_IS_TERMINAL",
                    lookup("TICKET_CLOSED_IS_TERMINAL"),
                    defaults.closed_is_terminal,
                ),
            },
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + Debug,
    T::Err: Display,
{
    let Some(raw) = value else {
        return default;
    };
    match raw.trim().parse() {
        Ok(parsed) => parsed,
        Err(error) => {
            tracing::warn!(
                key,
                value = %raw,
                %error,
                ?default,
                "Invalid configuration value, using default"
            );
            default
        },
    }
}
