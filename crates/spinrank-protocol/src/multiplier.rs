//! Lenient decoding of the wheel multiplier.
//!
//! The multiplier is picked by the spinning client and echoed back by
//! every voter, so it arrives in whatever shape the client had lying
//! around: a number, a numeric string, `null`, or junk. None of those
//! may reject the vote itself.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

/// A multiplier exactly as it appeared on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MultiplierInput {
    /// `2`, `8.0`, `-1`.
    Number(f64),
    /// `"3"`.
    Text(String),
    /// Anything else (`true`, `{}`, `[]`). Never produced by the server.
    #[serde(skip_serializing)]
    Other(IgnoredAny),
}

impl MultiplierInput {
    /// Reduces a raw multiplier to the factor used for scoring.
    ///
    /// Finite values are truncated toward zero and kept when at least 1;
    /// absent, unparsable, zero, negative and non-finite inputs all become 1,
    /// so a round can never take points away.
    pub fn coerce(input: Option<&Self>) -> u32 {
        input
            .and_then(Self::as_f64)
            .filter(|v| v.is_finite())
            .map(f64::trunc)
            .filter(|v| *v >= 1.0)
            .map(|v| v as u32)
            .unwrap_or(1)
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Other(_) => None,
        }
    }
}

impl From<u32> for MultiplierInput {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Option<MultiplierInput> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_coerce_absent_defaults_to_one() {
        assert_eq!(MultiplierInput::coerce(None), 1);
        assert_eq!(MultiplierInput::coerce(parse("null").as_ref()), 1);
    }

    #[test]
    fn test_coerce_numbers_and_numeric_strings() {
        assert_eq!(MultiplierInput::coerce(parse("8").as_ref()), 8);
        assert_eq!(MultiplierInput::coerce(parse("2.9").as_ref()), 2);
        assert_eq!(MultiplierInput::coerce(parse(r#"" 5 ""#).as_ref()), 5);
    }

    #[test]
    fn test_coerce_rejects_non_positive_and_junk() {
        assert_eq!(MultiplierInput::coerce(parse("0").as_ref()), 1);
        assert_eq!(MultiplierInput::coerce(parse("-4").as_ref()), 1);
        assert_eq!(MultiplierInput::coerce(parse(r#""lots""#).as_ref()), 1);
        assert_eq!(MultiplierInput::coerce(parse("true").as_ref()), 1);
        assert_eq!(MultiplierInput::coerce(parse(r#"{"x":1}"#).as_ref()), 1);
    }
}
