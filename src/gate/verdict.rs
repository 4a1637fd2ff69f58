use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Machine-readable reason attached to a denial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    TooLong,
    InvalidChars,
    Blocked,
    Taken,
    RateLimited,
    Flagged,
    ServiceUnavailable,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::TooLong => "too_long",
            DenialReason::InvalidChars => "invalid_chars",
            DenialReason::Blocked => "blocked",
            DenialReason::Taken => "taken",
            DenialReason::RateLimited => "rate_limited",
            DenialReason::Flagged => "flagged",
            DenialReason::ServiceUnavailable => "service_unavailable",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownReason(pub String);

impl FromStr for DenialReason {
    type Err = UnknownReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "too_long" => Ok(DenialReason::TooLong),
            "invalid_chars" => Ok(DenialReason::InvalidChars),
            "blocked" => Ok(DenialReason::Blocked),
            "taken" => Ok(DenialReason::Taken),
            "rate_limited" => Ok(DenialReason::RateLimited),
            "flagged" => Ok(DenialReason::Flagged),
            "service_unavailable" => Ok(DenialReason::ServiceUnavailable),
            other => Err(UnknownReason(other.to_string())),
        }
    }
}

/// Outcome of one name check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenialReason>,
}

impl Verdict {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn denied(reason: DenialReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }

    /// Label used for logs and metrics: the reason, or `allowed`
    pub fn outcome(&self) -> &'static str {
        match self.reason {
            Some(reason) => reason.as_str(),
            None if self.allowed => "allowed",
            None => "denied",
        }
    }
}

pub const ANONYMOUS: &str = "anonymous";

/// Who is asking. Supplied by the caller, never created here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    Anonymous,
    User(String),
}

impl Identity {
    /// Blank identifiers count as unauthenticated
    pub fn from_caller(caller: Option<&str>) -> Self {
        match caller {
            Some(uid) if !uid.trim().is_empty() => Identity::User(uid.to_string()),
            _ => Identity::Anonymous,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Identity::User(uid) => Some(uid),
            Identity::Anonymous => None,
        }
    }

    /// Identity component of store keys
    pub fn key_component(&self) -> &str {
        self.user_id().unwrap_or(ANONYMOUS)
    }
}
