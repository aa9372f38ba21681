//! Literal values used as column defaults.

use std::fmt;

/// A literal value as it appears in a `DEFAULT` clause.
///
/// Numeric literals keep their spelling: `1.50` stays `1.50` and no
/// validation is performed on the text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LiteralValue {
    /// `NULL`; also the implicit default of a column without `DEFAULT`.
    #[default]
    Null,
    /// `TRUE` (an alias for 1 since SQLite 3.23.0).
    True,
    /// `FALSE` (an alias for 0 since SQLite 3.23.0).
    False,
    /// `CURRENT_TIME`
    CurrentTime,
    /// `CURRENT_DATE`
    CurrentDate,
    /// `CURRENT_TIMESTAMP`
    CurrentTimestamp,
    /// A string literal, stored unescaped.
    String(String),
    /// A numeric literal, stored verbatim.
    Numeric(String),
    /// A blob literal, stored as its hex digits.
    Blob(String),
}

impl LiteralValue {
    /// Parses the text of a default value as reported by the engine.
    ///
    /// The six keyword literals are matched case-sensitively. Otherwise
    /// single-quoted, double-quoted and `x'..'` blob forms are tried in that
    /// order; anything else is kept as a numeric literal.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text {
            "NULL" => Self::Null,
            "TRUE" => Self::True,
            "FALSE" => Self::False,
            "CURRENT_TIME" => Self::CurrentTime,
            "CURRENT_DATE" => Self::CurrentDate,
            "CURRENT_TIMESTAMP" => Self::CurrentTimestamp,
            _ => {
                if let Some(inner) = unquote(text, '\'') {
                    Self::String(inner.replace("''", "'"))
                } else if let Some(inner) = unquote(text, '"') {
                    Self::String(inner.replace("\"\"", "\""))
                } else if let Some(inner) = text
                    .strip_prefix(|c: char| c == 'x' || c == 'X')
                    .and_then(|rest| unquote(rest, '\''))
                {
                    Self::Blob(inner.to_string())
                } else {
                    Self::Numeric(text.to_string())
                }
            }
        }
    }

    /// Maps an optional default (`dflt_value` may be NULL) to a literal.
    #[must_use]
    pub fn from_default(text: Option<&str>) -> Self {
        text.map_or(Self::Null, Self::parse)
    }

    /// Returns true for `NULL`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true for the time-dependent keywords.
    #[must_use]
    pub const fn is_current_time(&self) -> bool {
        matches!(
            self,
            Self::CurrentTime | Self::CurrentDate | Self::CurrentTimestamp
        )
    }
}

fn unquote(text: &str, quote: char) -> Option<&str> {
    if text.len() < 2 {
        return None;
    }
    text.strip_prefix(quote)?.strip_suffix(quote)
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::True => f.write_str("TRUE"),
            Self::False => f.write_str("FALSE"),
            Self::CurrentTime => f.write_str("CURRENT_TIME"),
            Self::CurrentDate => f.write_str("CURRENT_DATE"),
            Self::CurrentTimestamp => f.write_str("CURRENT_TIMESTAMP"),
            Self::String(value) => write!(f, "'{}'", value.replace('\'', "''")),
            Self::Numeric(value) => f.write_str(value),
            Self::Blob(hex) => write!(f, "X'{hex}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords() {
        assert_eq!(LiteralValue::parse("NULL"), LiteralValue::Null);
        assert_eq!(LiteralValue::parse("TRUE"), LiteralValue::True);
        assert_eq!(LiteralValue::parse("FALSE"), LiteralValue::False);
        assert_eq!(LiteralValue::parse("CURRENT_TIME"), LiteralValue::CurrentTime);
        assert_eq!(LiteralValue::parse("CURRENT_DATE"), LiteralValue::CurrentDate);
        assert_eq!(
            LiteralValue::parse("CURRENT_TIMESTAMP"),
            LiteralValue::CurrentTimestamp
        );
    }

    #[test]
    fn test_parse_keywords_is_case_sensitive() {
        assert_eq!(
            LiteralValue::parse("true"),
            LiteralValue::Numeric("true".to_string())
        );
    }

    #[test]
    fn test_parse_missing_default() {
        assert_eq!(LiteralValue::from_default(None), LiteralValue::Null);
        assert_eq!(
            LiteralValue::from_default(Some("7")),
            LiteralValue::Numeric("7".to_string())
        );
    }

    #[test]
    fn test_parse_string_literals() {
        assert_eq!(
            LiteralValue::parse("'fo''o'"),
            LiteralValue::String("fo'o".to_string())
        );
        assert_eq!(
            LiteralValue::parse("\"fo\"\"o\""),
            LiteralValue::String("fo\"o".to_string())
        );
        assert_eq!(LiteralValue::parse("''"), LiteralValue::String(String::new()));
    }

    #[test]
    fn test_parse_blob_literals() {
        assert_eq!(
            LiteralValue::parse("X'53514C697465'"),
            LiteralValue::Blob("53514C697465".to_string())
        );
        assert_eq!(
            LiteralValue::parse("x'ab'"),
            LiteralValue::Blob("ab".to_string())
        );
    }

    #[test]
    fn test_parse_numeric_is_verbatim() {
        assert_eq!(
            LiteralValue::parse("1.50"),
            LiteralValue::Numeric("1.50".to_string())
        );
        assert_eq!(
            LiteralValue::parse("'"),
            LiteralValue::Numeric("'".to_string())
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(LiteralValue::CurrentTimestamp.to_string(), "CURRENT_TIMESTAMP");
        assert_eq!(LiteralValue::String("it's".into()).to_string(), "'it''s'");
        assert_eq!(LiteralValue::Numeric("123.123".into()).to_string(), "123.123");
        assert_eq!(LiteralValue::Blob("CAFE".into()).to_string(), "X'CAFE'");
    }

    #[test]
    fn test_display_parses_back() {
        for value in [
            LiteralValue::True,
            LiteralValue::String("a \"quoted\" 'value'".into()),
            LiteralValue::Numeric("-1".into()),
            LiteralValue::Blob("00FF".into()),
        ] {
            assert_eq!(LiteralValue::parse(&value.to_string()), value);
        }
    }
}
