//! Typed flag values for synthesized invocations.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// Value of a flag passed to a synthesized invocation.
///
/// The variant decides how the flag is registered with the parser. In YAML
/// fixtures the variant follows the scalar type (`true`, `3`, `alice`).
/// Scalars with no matching variant (floats, integers outside `i64`) load as
/// [`String`](FlagValue::String) holding the number's decimal form.
///
/// # Examples
///
/// ```
/// use command_harness_core::FlagValue;
///
/// assert_eq!(FlagValue::infer("true"), FlagValue::Bool(true));
/// assert_eq!(FlagValue::infer("-7"), FlagValue::Int(-7));
/// assert_eq!(FlagValue::infer("alice"), FlagValue::String("alice".into()));
///
/// // Explicit construction avoids the inference ambiguity.
/// let zip = FlagValue::from("02134");
/// assert_eq!(zip.to_string(), "02134");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    String(String),
}

impl FlagValue {
    /// Infers a typed value from its string encoding.
    ///
    /// `"true"`/`"false"` become [`Bool`](FlagValue::Bool), anything that
    /// parses as an `i64` becomes [`Int`](FlagValue::Int), everything else is
    /// a [`String`](FlagValue::String). A string flag whose value looks like
    /// a number is misclassified; construct the variant directly instead.
    pub fn infer(raw: &str) -> Self {
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => match raw.parse::<i64>() {
                Ok(n) => Self::Int(n),
                Err(_) => Self::String(raw.to_string()),
            },
        }
    }

    pub fn kind(&self) -> FlagKind {
        match self {
            Self::Bool(_) => FlagKind::Bool,
            Self::Int(_) => FlagKind::Int,
            Self::String(_) => FlagKind::String,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FlagValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<'de> Deserialize<'de> for FlagValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FlagValueVisitor)
    }
}

struct FlagValueVisitor;

impl Visitor<'_> for FlagValueVisitor {
    type Value = FlagValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a boolean, integer, number or string flag value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<FlagValue, E> {
        Ok(FlagValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FlagValue, E> {
        Ok(FlagValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FlagValue, E> {
        Ok(i64::try_from(v).map_or_else(|_| FlagValue::String(v.to_string()), FlagValue::Int))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<FlagValue, E> {
        Ok(i64::try_from(v).map_or_else(|_| FlagValue::String(v.to_string()), FlagValue::Int))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<FlagValue, E> {
        Ok(i64::try_from(v).map_or_else(|_| FlagValue::String(v.to_string()), FlagValue::Int))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<FlagValue, E> {
        Ok(FlagValue::String(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FlagValue, E> {
        Ok(FlagValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<FlagValue, E> {
        Ok(FlagValue::String(v))
    }
}

/// Registered type of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Bool,
    Int,
    String,
}

/// Converts a string-encoded flag map into typed values using
/// [`FlagValue::infer`].
pub fn infer_flags<K, V>(flags: impl IntoIterator<Item = (K, V)>) -> BTreeMap<String, FlagValue>
where
    K: Into<String>,
    V: AsRef<str>,
{
    flags
        .into_iter()
        .map(|(name, raw)| (name.into(), FlagValue::infer(raw.as_ref())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_bool() {
        assert_eq!(FlagValue::infer("true"), FlagValue::Bool(true));
        assert_eq!(FlagValue::infer("false"), FlagValue::Bool(false));
        // Only the exact lowercase literals are booleans.
        assert_eq!(FlagValue::infer("True"), FlagValue::String("True".into()));
    }

    #[test]
    fn test_infer_int() {
        assert_eq!(FlagValue::infer("3"), FlagValue::Int(3));
        assert_eq!(FlagValue::infer("-42"), FlagValue::Int(-42));
        assert_eq!(
            FlagValue::infer("99999999999999999999"),
            FlagValue::String("99999999999999999999".into())
        );
    }

    #[test]
    fn test_infer_string() {
        assert_eq!(FlagValue::infer(""), FlagValue::String(String::new()));
        assert_eq!(FlagValue::infer("3.5"), FlagValue::String("3.5".into()));
        assert_eq!(FlagValue::infer("alice").kind(), FlagKind::String);
    }

    #[test]
    fn test_display_matches_encoding() {
        assert_eq!(FlagValue::Bool(false).to_string(), "false");
        assert_eq!(FlagValue::Int(-1).to_string(), "-1");
        assert_eq!(FlagValue::from("x y").to_string(), "x y");
    }

    #[test]
    fn test_infer_flags_map() {
        let flags = infer_flags([("debug", "true"), ("count", "3"), ("name", "alice")]);
        assert_eq!(flags["debug"], FlagValue::Bool(true));
        assert_eq!(flags["count"], FlagValue::Int(3));
        assert_eq!(flags["name"], FlagValue::String("alice".into()));
    }

    #[test]
    fn test_yaml_scalars_keep_their_type() {
        let yaml = "a: true\nb: 12\nc: hello\nd: \"12\"\n";
        let flags: BTreeMap<String, FlagValue> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(flags["a"], FlagValue::Bool(true));
        assert_eq!(flags["b"], FlagValue::Int(12));
        assert_eq!(flags["c"], FlagValue::String("hello".into()));
        assert_eq!(flags["d"], FlagValue::String("12".into()));
    }

    #[test]
    fn test_yaml_numbers_without_variant_become_strings() {
        let yaml = "ratio: 3.5\nbig: 18446744073709551615\nneg: -3\n";
        let flags: BTreeMap<String, FlagValue> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(flags["ratio"], FlagValue::String("3.5".into()));
        assert_eq!(
            flags["big"],
            FlagValue::String("18446744073709551615".into())
        );
        assert_eq!(flags["neg"], FlagValue::Int(-3));
    }

    #[test]
    fn test_yaml_non_scalar_flag_is_error() {
        let parsed = serde_yaml::from_str::<BTreeMap<String, FlagValue>>("list: [1, 2]\n");
        assert!(parsed.is_err());
    }
}
