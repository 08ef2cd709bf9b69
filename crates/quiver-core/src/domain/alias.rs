//! Alias model: a named pointer to one version, or to two versions with a
//! weighted (canary) split.
//!
//! Choosing between primary and secondary at request time is left to the
//! caller; this module only stores and validates the split.

use serde::{Deserialize, Serialize};

use super::artifact::Artifact;
use super::errors::ValidationError;
use super::version::Version;

/// Raw `secondary_weight` as received from a caller.
///
/// Keeps the "wrong type" vs "wrong value" distinction explicit: validation
/// first asks for a number (type stage), then checks its range (value stage).
#[derive(Debug, Clone, PartialEq)]
pub enum WeightInput {
    Numeric(f64),
    /// Anything that is not a number (a string, a bool, null, ...), described
    /// for the error message.
    NonNumeric(String),
}

impl WeightInput {
    /// Type stage.
    pub fn numeric(&self) -> Result<f64, ValidationError> {
        match self {
            WeightInput::Numeric(value) => Ok(*value),
            WeightInput::NonNumeric(found) => Err(ValidationError::type_error(format!(
                "secondary_weight must be numeric, got {found}"
            ))),
        }
    }
}

impl From<f64> for WeightInput {
    fn from(value: f64) -> Self {
        WeightInput::Numeric(value)
    }
}

impl From<u8> for WeightInput {
    fn from(value: u8) -> Self {
        WeightInput::Numeric(f64::from(value))
    }
}

impl From<u32> for WeightInput {
    fn from(value: u32) -> Self {
        WeightInput::Numeric(f64::from(value))
    }
}

impl From<i32> for WeightInput {
    fn from(value: i32) -> Self {
        WeightInput::Numeric(f64::from(value))
    }
}

impl From<&str> for WeightInput {
    fn from(value: &str) -> Self {
        WeightInput::NonNumeric(format!("string {value:?}"))
    }
}

impl From<&serde_json::Value> for WeightInput {
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Number(n) => match n.as_f64() {
                Some(f) => WeightInput::Numeric(f),
                None => WeightInput::NonNumeric(format!("number {n}")),
            },
            Value::String(s) => WeightInput::NonNumeric(format!("string {s:?}")),
            Value::Bool(b) => WeightInput::NonNumeric(format!("bool {b}")),
            Value::Null => WeightInput::NonNumeric("null".to_string()),
            Value::Array(_) => WeightInput::NonNumeric("array".to_string()),
            Value::Object(_) => WeightInput::NonNumeric("object".to_string()),
        }
    }
}

/// Percentage of resolutions that should prefer the secondary version.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct CanaryWeight(f64);

impl CanaryWeight {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    /// Value stage. NaN is rejected along with anything outside `[0, 100]`.
    pub fn new(percent: f64) -> Result<Self, ValidationError> {
        if (Self::MIN..=Self::MAX).contains(&percent) {
            Ok(Self(percent))
        } else {
            Err(ValidationError::value_error(format!(
                "secondary_weight must be within [0, 100], got {percent}"
            )))
        }
    }

    pub fn percent(self) -> f64 {
        self.0
    }

    /// Probability in `[0, 1]` of resolving to the secondary version.
    pub fn fraction(self) -> f64 {
        self.0 / 100.0
    }
}

impl TryFrom<f64> for CanaryWeight {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CanaryWeight> for f64 {
    fn from(weight: CanaryWeight) -> Self {
        weight.0
    }
}

/// Input of `put_alias`. Fields left unset are cleared on the stored record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasInput {
    pub version: Version,
    pub secondary_version: Option<Version>,
    pub secondary_weight: Option<WeightInput>,
}

impl AliasInput {
    /// Alias pointing at `version` only.
    pub fn new(version: impl Into<Version>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    /// Alias pointing at `LATEST`.
    pub fn latest() -> Self {
        Self::default()
    }

    pub fn with_secondary(
        mut self,
        secondary_version: impl Into<Version>,
        secondary_weight: impl Into<WeightInput>,
    ) -> Self {
        self.secondary_version = Some(secondary_version.into());
        self.secondary_weight = Some(secondary_weight.into());
        self
    }

    pub fn with_secondary_version(mut self, secondary_version: impl Into<Version>) -> Self {
        self.secondary_version = Some(secondary_version.into());
        self
    }

    pub fn with_secondary_weight(mut self, secondary_weight: impl Into<WeightInput>) -> Self {
        self.secondary_weight = Some(secondary_weight.into());
        self
    }

    /// Checks that need no store access, in order:
    /// 1. with a secondary version, the weight must be numeric (type)
    /// 2. a weight must lie in `[0, 100]` (value)
    /// 3. a weight requires a secondary version (value)
    /// 4. the secondary version must differ from the primary (value)
    ///
    /// Returns the validated secondary route, if any.
    pub fn validate(&self) -> Result<Option<(Version, CanaryWeight)>, ValidationError> {
        let numeric_weight = match (&self.secondary_version, &self.secondary_weight) {
            (Some(_), None) => {
                return Err(ValidationError::type_error(
                    "secondary_weight must be numeric when secondary_version is set, got nothing",
                ));
            }
            (Some(_), Some(weight)) => Some(weight.numeric()?),
            (None, Some(WeightInput::Numeric(value))) => Some(*value),
            (None, Some(WeightInput::NonNumeric(_))) | (None, None) => None,
        };

        let weight = numeric_weight.map(CanaryWeight::new).transpose()?;

        let Some(secondary) = self.secondary_version else {
            if self.secondary_weight.is_some() {
                return Err(ValidationError::value_error(
                    "secondary_weight requires secondary_version",
                ));
            }
            return Ok(None);
        };

        if secondary == self.version {
            return Err(ValidationError::value_error(format!(
                "secondary_version must differ from version, both are {secondary}"
            )));
        }

        // weight is Some whenever a secondary version passed the type stage
        Ok(weight.map(|w| (secondary, w)))
    }
}

/// Stored alias. Overwritten as a whole on every `put_alias`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasRecord {
    pub name: String,
    pub alias: String,
    pub version: Version,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_version: Option<Version>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_weight: Option<CanaryWeight>,
}

impl AliasRecord {
    pub fn has_secondary(&self) -> bool {
        self.secondary_version.is_some()
    }
}

/// The secondary side of a resolved alias.
#[derive(Debug, Clone, PartialEq)]
pub struct CanaryTarget {
    pub artifact: Artifact,
    pub weight: CanaryWeight,
}

/// An alias together with the artifacts it points at.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAlias {
    pub alias: AliasRecord,
    pub primary: Artifact,
    pub secondary: Option<CanaryTarget>,
}

/// Alias names become record ids after a `#` separator, so they must be
/// non-empty and free of `#`.
pub fn validate_alias_name(alias: &str) -> Result<(), ValidationError> {
    if alias.is_empty() {
        return Err(ValidationError::value_error("alias name must not be empty"));
    }
    if alias.contains('#') {
        return Err(ValidationError::value_error(format!(
            "alias name must not contain '#', got {alias:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationKind;
    use rstest::rstest;

    #[test]
    fn primary_only_has_no_route() {
        assert_eq!(AliasInput::latest().validate().unwrap(), None);
        assert_eq!(AliasInput::new(3u64).validate().unwrap(), None);
    }

    #[test]
    fn secondary_route_is_returned() {
        let route = AliasInput::new(1u64)
            .with_secondary(2u64, 20u8)
            .validate()
            .unwrap()
            .unwrap();
        assert_eq!(route.0, Version::Number(2));
        assert_eq!(route.1.percent(), 20.0);
        assert!((route.1.fraction() - 0.2).abs() < f64::EPSILON);
    }

    #[rstest]
    #[case::non_numeric(AliasInput::new(1u64).with_secondary(2u64, "20"), ValidationKind::Type)]
    #[case::missing_weight(AliasInput::new(1u64).with_secondary_version(2u64), ValidationKind::Type)]
    #[case::above_range(AliasInput::new(1u64).with_secondary(2u64, 101u32), ValidationKind::Value)]
    #[case::below_range(AliasInput::new(1u64).with_secondary(2u64, -1i32), ValidationKind::Value)]
    #[case::nan(AliasInput::new(1u64).with_secondary(2u64, f64::NAN), ValidationKind::Value)]
    #[case::same_version(AliasInput::new(1u64).with_secondary(1u64, 20u8), ValidationKind::Value)]
    #[case::weight_without_secondary(AliasInput::new(1u64).with_secondary_weight(20u8), ValidationKind::Value)]
    fn rejects_invalid_input(#[case] input: AliasInput, #[case] expected: ValidationKind) {
        let err = input.validate().unwrap_err();
        assert_eq!(err.kind, expected, "{err}");
    }

    #[test]
    fn type_check_wins_over_equality() {
        // same version AND non-numeric weight: the type stage reports first
        let err = AliasInput::new(1u64)
            .with_secondary(1u64, "x")
            .validate()
            .unwrap_err();
        assert_eq!(err.kind, ValidationKind::Type);
    }

    #[test]
    fn range_check_wins_over_equality() {
        let err = AliasInput::new(1u64)
            .with_secondary(1u64, 500u32)
            .validate()
            .unwrap_err();
        assert_eq!(err.kind, ValidationKind::Value);
        assert!(err.message.contains("[0, 100]"));
    }

    #[test]
    fn boundary_weights_are_accepted() {
        for w in [0u8, 100u8] {
            assert!(AliasInput::new(1u64).with_secondary(2u64, w).validate().is_ok());
        }
    }

    #[rstest]
    #[case::number(serde_json::json!(20), true)]
    #[case::float(serde_json::json!(12.5), true)]
    #[case::string(serde_json::json!("20"), false)]
    #[case::null(serde_json::Value::Null, false)]
    #[case::bool(serde_json::json!(true), false)]
    fn weight_from_json(#[case] value: serde_json::Value, #[case] numeric: bool) {
        let input = WeightInput::from(&value);
        assert_eq!(input.numeric().is_ok(), numeric);
    }

    #[test]
    fn canary_weight_rejects_out_of_range_on_deserialize() {
        assert!(serde_json::from_str::<CanaryWeight>("150.0").is_err());
        let w: CanaryWeight = serde_json::from_str("20.0").unwrap();
        assert_eq!(w.percent(), 20.0);
    }

    #[test]
    fn alias_names_are_validated() {
        assert!(validate_alias_name("LIVE").is_ok());
        assert!(validate_alias_name("").is_err());
        assert!(validate_alias_name("a#b").is_err());
    }
}
