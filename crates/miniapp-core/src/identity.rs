//! Host-assigned user identity.
//!
//! Identity format on the wire is a bare non-negative integer (the user's
//! `fid`). The textual form `fid:42` is accepted wherever an identity is
//! parsed from a string, e.g. storage keys and log lines.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A user identity inside the host's identity system.
///
/// The core never generates one; it is always supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fid(u64);

impl Fid {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw numeric identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Fid {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Fid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fid:{}", self.0)
    }
}

impl FromStr for Fid {
    type Err = FidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("fid:").unwrap_or(s);
        if digits.is_empty() {
            return Err(FidParseError::Empty);
        }
        digits
            .parse()
            .map(Self)
            .map_err(|_| FidParseError::NotANumber(s.to_string()))
    }
}

/// Error parsing an identity string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FidParseError {
    #[error("identity cannot be empty")]
    Empty,
    #[error("identity must be a non-negative integer, got: {0}")]
    NotANumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_and_prefixed() {
        assert_eq!("42".parse::<Fid>().unwrap(), Fid::new(42));
        assert_eq!("fid:42".parse::<Fid>().unwrap(), Fid::new(42));
    }

    #[test]
    fn reject_garbage() {
        assert_eq!("fid:".parse::<Fid>(), Err(FidParseError::Empty));
        assert!(matches!(
            "-3".parse::<Fid>(),
            Err(FidParseError::NotANumber(_))
        ));
    }

    #[test]
    fn display_roundtrip() {
        let fid = Fid::new(7);
        let fid2: Fid = fid.to_string().parse().unwrap();
        assert_eq!(fid, fid2);
    }

    #[test]
    fn serializes_as_number() {
        assert_eq!(serde_json::to_string(&Fid::new(42)).unwrap(), "42");
    }
}
