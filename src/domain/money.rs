use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Money is represented as integer cents to avoid floating-point precision issues.
/// The backend speaks decimals ("1500.00"), so 1 unit = 100 cents.
pub type Cents = i64;

/// Format cents as a human-readable amount string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
///
/// Amounts that do not fit in [`Cents`] are rejected as invalid.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let negative = input.starts_with('-');
    let input = input.trim_start_matches('-');

    let parts: Vec<&str> = input.split('.').collect();
    match parts.len() {
        1 => {
            let units: i64 = parts[0]
                .parse()
                .map_err(|_| ParseCentsError::InvalidFormat)?;
            let cents = to_cents(units, 0)?;
            Ok(if negative { -cents } else { cents })
        }
        2 => {
            let units: i64 = if parts[0].is_empty() {
                0
            } else {
                parts[0]
                    .parse()
                    .map_err(|_| ParseCentsError::InvalidFormat)?
            };

            // Pad or truncate the fraction to 2 digits
            let decimal_str = parts[1];
            if !decimal_str.chars().all(|c| c.is_ascii_digit()) {
                return Err(ParseCentsError::InvalidFormat);
            }
            let decimal_cents: i64 = match decimal_str.len() {
                0 => 0,
                1 => {
                    decimal_str
                        .parse::<i64>()
                        .map_err(|_| ParseCentsError::InvalidFormat)?
                        * 10
                }
                _ => decimal_str[..2]
                    .parse()
                    .map_err(|_| ParseCentsError::InvalidFormat)?,
            };

            let cents = to_cents(units, decimal_cents)?;
            Ok(if negative { -cents } else { cents })
        }
        _ => Err(ParseCentsError::InvalidFormat),
    }
}

fn to_cents(units: i64, decimal_cents: i64) -> Result<Cents, ParseCentsError> {
    units
        .checked_mul(100)
        .and_then(|cents| cents.checked_add(decimal_cents))
        .ok_or(ParseCentsError::InvalidFormat)
}

/// Coerce an arbitrary JSON value into cents.
///
/// The backend serializes decimals as strings, sometimes as numbers, and omits
/// fields that are zero. Anything that is not a recognizable amount becomes 0.
pub fn coerce_cents(value: &Value) -> Cents {
    match value {
        Value::Number(n) => {
            if let Some(units) = n.as_i64() {
                units.saturating_mul(100)
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| (f * 100.0).round() as Cents)
                    .unwrap_or(0)
            }
        }
        Value::String(s) => parse_cents(s).unwrap_or(0),
        _ => 0,
    }
}

/// Coerce an arbitrary JSON value into a count. Same leniency as [`coerce_cents`].
pub fn coerce_count(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// `deserialize_with` helper for monetary fields that must never fail decoding.
pub fn lenient_cents<'de, D>(deserializer: D) -> Result<Cents, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_cents(&value))
}

/// `deserialize_with` helper for counters that must never fail decoding.
pub fn lenient_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_count(&value))
}

/// Optional variant of [`lenient_cents`]: null stays `None`, garbage becomes `Some(0)`.
pub fn lenient_cents_opt<'de, D>(deserializer: D) -> Result<Option<Cents>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(coerce_cents(&other)),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParseCentsError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(5000), "50.00");
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(1), "0.01");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-5000), "-50.00");
        assert_eq!(format_cents(-1), "-0.01");
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("50.00"), Ok(5000));
        assert_eq!(parse_cents("50"), Ok(5000));
        assert_eq!(parse_cents("12.5"), Ok(1250));
        assert_eq!(parse_cents(".50"), Ok(50));
        assert_eq!(parse_cents("-50.00"), Ok(-5000));
        assert_eq!(parse_cents("100.999"), Ok(10099)); // Truncates
    }

    #[test]
    fn test_parse_cents_invalid() {
        assert!(parse_cents("abc").is_err());
        assert!(parse_cents("12.34.56").is_err());
        assert!(parse_cents("12.x5").is_err());
    }

    #[test]
    fn test_parse_cents_out_of_range() {
        assert!(parse_cents("92233720368547759").is_err());
        assert!(parse_cents("92233720368547758.08").is_err());
        assert!(parse_cents("-92233720368547759.00").is_err());
        assert_eq!(parse_cents("92233720368547758.07"), Ok(i64::MAX));
    }

    #[test]
    fn test_format_cents_extremes() {
        assert_eq!(format_cents(i64::MIN), "-92233720368547758.08");
        assert_eq!(format_cents(i64::MAX), "92233720368547758.07");
    }

    #[test]
    fn test_coerce_cents_shapes() {
        assert_eq!(coerce_cents(&json!("1500.00")), 150000);
        assert_eq!(coerce_cents(&json!(1500)), 150000);
        assert_eq!(coerce_cents(&json!(12.34)), 1234);
        assert_eq!(coerce_cents(&json!(null)), 0);
        assert_eq!(coerce_cents(&json!("n/a")), 0);
        assert_eq!(coerce_cents(&json!([1, 2])), 0);
    }

    #[test]
    fn test_coerce_cents_huge_values() {
        assert_eq!(coerce_cents(&json!("92233720368547759")), 0);
        assert_eq!(coerce_cents(&json!(100000000000000000_i64)), i64::MAX);
        assert_eq!(coerce_cents(&json!(-1e30)), i64::MIN);
    }

    #[test]
    fn test_coerce_count() {
        assert_eq!(coerce_count(&json!(3)), 3);
        assert_eq!(coerce_count(&json!("7")), 7);
        assert_eq!(coerce_count(&json!(null)), 0);
    }
}
