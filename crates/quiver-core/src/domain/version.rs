//! Version - LATEST と番号付きバージョン
//!
//! 番号付きバージョンは固定幅のゼロ埋め文字列（token）にエンコードされる。
//! prefix list を行う Blob ストアでも、辞書順 = 数値順 になる。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

/// Token of the mutable floating version.
pub const LATEST_TOKEN: &str = "LATEST";

/// Widest token a `u64` version number can need.
pub const MAX_PAD_WIDTH: usize = 20;

/// A version reference: the mutable `LATEST` pointer or a published number.
///
/// Ordering puts every published number before `LATEST`, which is the
/// listing order of `list_artifact_versions`.
///
/// Published numbers start at 1; parsing never yields `Number(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Version {
    Number(u64),
    #[default]
    Latest,
}

impl Version {
    pub fn is_latest(self) -> bool {
        matches!(self, Version::Latest)
    }

    pub fn number(self) -> Option<u64> {
        match self {
            Version::Number(n) => Some(n),
            Version::Latest => None,
        }
    }

    /// Encode into the fixed-width token used in blob keys and record ids.
    ///
    /// Returns `None` when the number needs more than `width` digits, since a
    /// wider token would break lexicographic ordering.
    pub fn token(self, width: usize) -> Option<String> {
        match self {
            Version::Latest => Some(LATEST_TOKEN.to_string()),
            Version::Number(n) => {
                let token = format!("{n:0width$}");
                (token.len() <= width).then_some(token)
            }
        }
    }
}

impl From<u64> for Version {
    fn from(n: u64) -> Self {
        Version::Number(n)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Latest => f.write_str(LATEST_TOKEN),
            Version::Number(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for Version {
    type Err = ValidationError;

    /// Accepts `LATEST` or a positive decimal number, zero-padded or not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == LATEST_TOKEN {
            return Ok(Version::Latest);
        }
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::value_error(format!(
                "version must be LATEST or a positive integer, got {s:?}"
            )));
        }
        match s.parse::<u64>() {
            Ok(0) => Err(ValidationError::value_error(
                "version numbers start at 1, got 0",
            )),
            Ok(n) => Ok(Version::Number(n)),
            Err(_) => Err(ValidationError::value_error(format!(
                "version number {s:?} is too large"
            ))),
        }
    }
}

impl TryFrom<String> for Version {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::latest("LATEST", Version::Latest)]
    #[case::plain("7", Version::Number(7))]
    #[case::padded("00000042", Version::Number(42))]
    fn parses_valid_versions(#[case] input: &str, #[case] expected: Version) {
        assert_eq!(input.parse::<Version>().unwrap(), expected);
    }

    #[rstest]
    #[case::empty("")]
    #[case::zero("0")]
    #[case::padded_zero("0000")]
    #[case::negative("-1")]
    #[case::lowercase_latest("latest")]
    #[case::overflow("99999999999999999999999")]
    fn rejects_invalid_versions(#[case] input: &str) {
        let err = input.parse::<Version>().unwrap_err();
        assert_eq!(err.kind, crate::domain::ValidationKind::Value);
    }

    #[test]
    fn tokens_are_fixed_width() {
        assert_eq!(Version::Number(1).token(8).as_deref(), Some("00000001"));
        assert_eq!(Version::Number(12345678).token(8).as_deref(), Some("12345678"));
        assert_eq!(Version::Latest.token(8).as_deref(), Some("LATEST"));
        assert_eq!(Version::Number(100).token(2), None);
    }

    #[test]
    fn token_order_matches_numeric_order() {
        let mut tokens: Vec<String> = [10u64, 2, 1, 100]
            .iter()
            .map(|n| Version::Number(*n).token(8).unwrap())
            .collect();
        tokens.sort();
        let decoded: Vec<Version> = tokens.iter().map(|t| t.parse().unwrap()).collect();
        assert_eq!(
            decoded,
            vec![
                Version::Number(1),
                Version::Number(2),
                Version::Number(10),
                Version::Number(100)
            ]
        );
    }

    #[test]
    fn latest_orders_after_numbers() {
        let mut versions = vec![Version::Latest, Version::Number(3), Version::Number(1)];
        versions.sort();
        assert_eq!(
            versions,
            vec![Version::Number(1), Version::Number(3), Version::Latest]
        );
    }

    #[test]
    fn serializes_as_string() {
        assert_eq!(serde_json::to_string(&Version::Number(2)).unwrap(), "\"2\"");
        assert_eq!(serde_json::to_string(&Version::Latest).unwrap(), "\"LATEST\"");
        let back: Version = serde_json::from_str("\"00000002\"").unwrap();
        assert_eq!(back, Version::Number(2));
    }
}
