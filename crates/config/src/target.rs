//! Target host identity for config retargeting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Hostname of the machine a config document is retargeted for.
///
/// Validated once at the boundary: the name must be non-empty and free of
/// whitespace. It stays fixed for the lifetime of a driver run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetHost(String);

impl TargetHost {
    /// Create a target host from a hostname.
    pub fn new(hostname: impl Into<String>) -> Result<Self> {
        let hostname = hostname.into();
        if hostname.is_empty() {
            return Err(Error::invalid_target("hostname is empty"));
        }
        if hostname.chars().any(char::is_whitespace) {
            return Err(Error::invalid_target(format!(
                "hostname '{hostname}' contains whitespace"
            )));
        }
        Ok(Self(hostname))
    }

    /// Get the hostname as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TargetHost {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for TargetHost {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;

    #[test]
    fn test_valid_hostname() {
        let target = TargetHost::new("node-7.internal").unwrap();
        assert_eq!(target.as_str(), "node-7.internal");
    }

    #[test]
    fn test_empty_hostname_rejected() {
        assert!(TargetHost::new("").is_err());
    }

    #[test]
    fn test_whitespace_hostname_rejected() {
        assert!(TargetHost::new("node 7").is_err());
        assert!(TargetHost::new("node\t7").is_err());
        assert!(TargetHost::new(" node-7").is_err());
    }

    #[test]
    fn test_parse_and_display_round_trip() {
        let target: TargetHost = "mongo-1.example.net".parse().unwrap();
        assert_eq!(target.to_string(), "mongo-1.example.net");
        assert_eq!(target.as_ref(), "mongo-1.example.net");
    }
}
