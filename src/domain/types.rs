//! Type-safe wrappers using the new-type pattern.

use std::fmt;
use std::str::FromStr;

use crate::infra::error::{SigningError, SigningResult};

/// Validated RFC 3161 timestamp server URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampUrl(String);

impl TimestampUrl {
    /// Create a new `TimestampUrl` after validation
    pub fn new(url: impl AsRef<str>) -> SigningResult<Self> {
        let url = url.as_ref().trim();
        Self::validate_url(url)?;
        Ok(TimestampUrl(url.to_string()))
    }

    /// Get the URL as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate_url(url: &str) -> SigningResult<()> {
        let Some(rest) = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
        else {
            return Err(SigningError::ValidationError(format!(
                "Timestamp URL must start with http:// or https://, got: {url}"
            )));
        };

        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(SigningError::ValidationError(format!(
                "Timestamp URL must contain a host: {url}"
            )));
        }

        Ok(())
    }
}

impl FromStr for TimestampUrl {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for TimestampUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
