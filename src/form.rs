//! Line-oriented listing form for interactive sessions.
//!
//! Each request is one line of `key=value` tokens applied on top of the
//! default listing. Values containing spaces are double-quoted:
//!
//! ```text
//! neighbourhood="South End" room_type="Private room" accommodates=2 superhost=no
//! ```

use crate::error::FormError;
use crate::types::listing::ListingDetails;

/// What one input line asks for
#[derive(Debug, Clone, PartialEq)]
pub enum FormRequest {
    Quote(ListingDetails),
    Help,
    Quit,
}

pub const FIELD_NAMES: [&str; 10] = [
    "neighbourhood",
    "property_type",
    "room_type",
    "accommodates",
    "bedrooms",
    "bathrooms",
    "amenities",
    "superhost",
    "minimum_nights",
    "availability",
];

/// Parse one raw input line, rejecting bytes that are not UTF-8
pub fn parse_bytes(line: &[u8]) -> Result<FormRequest, FormError> {
    let line = std::str::from_utf8(line).map_err(|_| FormError::InvalidEncoding)?;
    parse_line(line)
}

/// Parse one input line into a request
pub fn parse_line(line: &str) -> Result<FormRequest, FormError> {
    let trimmed = line.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "quit" | "exit" => return Ok(FormRequest::Quit),
        "help" | "?" => return Ok(FormRequest::Help),
        _ => {}
    }

    let mut details = ListingDetails::default();
    for (key, value) in tokenize(trimmed)? {
        apply_field(&mut details, &key, &value)?;
    }
    details.validate()?;

    Ok(FormRequest::Quote(details))
}

/// Split a line into key/value pairs, honouring double quotes in values
fn tokenize(line: &str) -> Result<Vec<(String, String)>, FormError> {
    let mut pairs = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut token = String::new();
        let mut in_quotes = false;
        while let Some(c) = chars.next() {
            match c {
                '"' => in_quotes = !in_quotes,
                c if c.is_whitespace() && !in_quotes => break,
                c => token.push(c),
            }
        }
        if in_quotes {
            return Err(FormError::UnterminatedQuote);
        }

        match token.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                pairs.push((key.trim().to_ascii_lowercase(), value.to_string()))
            }
            _ => return Err(FormError::MalformedToken(token)),
        }
    }

    Ok(pairs)
}

fn apply_field(details: &mut ListingDetails, key: &str, value: &str) -> Result<(), FormError> {
    match key {
        "neighbourhood" | "neighborhood" => {
            if value.trim().is_empty() {
                return Err(FormError::InvalidValue {
                    field: "neighbourhood",
                    value: value.to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
            details.neighbourhood = value.trim().to_string();
        }
        "property_type" => details.property_type = value.parse()?,
        "room_type" => details.room_type = value.parse()?,
        "accommodates" => details.accommodates = parse_number("accommodates", value)?,
        "bedrooms" => details.bedrooms = parse_number("bedrooms", value)?,
        "bathrooms" => details.bathrooms = parse_number("bathrooms", value)?,
        "amenities" => details.amenities = parse_number("amenities", value)?,
        "superhost" => details.superhost = parse_flag(value)?,
        "minimum_nights" => details.minimum_nights = parse_number("minimum_nights", value)?,
        "availability" | "availability_365" => {
            details.availability_365 = parse_number("availability", value)?
        }
        other => return Err(FormError::UnknownField(other.to_string())),
    }
    Ok(())
}

fn parse_number<T>(field: &'static str, value: &str) -> Result<T, FormError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| FormError::InvalidValue {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_flag(value: &str) -> Result<bool, FormError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "t" | "1" => Ok(true),
        "false" | "no" | "n" | "f" | "0" => Ok(false),
        _ => Err(FormError::InvalidValue {
            field: "superhost",
            value: value.to_string(),
            reason: "expected yes or no".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::listing::{PropertyType, RoomType};

    fn quote(line: &str) -> ListingDetails {
        match parse_line(line).unwrap() {
            FormRequest::Quote(details) => details,
            other => panic!("expected a quote request, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_line_quotes_defaults() {
        assert_eq!(quote(""), ListingDetails::default());
        assert_eq!(quote("   "), ListingDetails::default());
    }

    #[test]
    fn test_fields_override_defaults() {
        let details = quote(
            r#"neighbourhood="South End" property_type=loft room_type="Private room" accommodates=2 bathrooms=1.5 superhost=no"#,
        );

        assert_eq!(details.neighbourhood, "South End");
        assert_eq!(details.property_type, PropertyType::Loft);
        assert_eq!(details.room_type, RoomType::PrivateRoom);
        assert_eq!(details.accommodates, 2);
        assert_eq!(details.bathrooms, 1.5);
        assert!(!details.superhost);
        assert_eq!(details.bedrooms, 1);
        assert_eq!(details.availability_365, 200);
    }

    #[test]
    fn test_raw_bytes() {
        assert_eq!(parse_bytes(b"quit\n").unwrap(), FormRequest::Quit);
        assert_eq!(parse_bytes(b"neighbourhood=\xff\xfe\n"), Err(FormError::InvalidEncoding));
        assert_eq!(
            parse_bytes("neighbourhood=Roslindale\n".as_bytes()).unwrap(),
            FormRequest::Quote(ListingDetails {
                neighbourhood: "Roslindale".to_string(),
                ..ListingDetails::default()
            })
        );
    }

    #[test]
    fn test_commands() {
        assert_eq!(parse_line("quit").unwrap(), FormRequest::Quit);
        assert_eq!(parse_line(" EXIT ").unwrap(), FormRequest::Quit);
        assert_eq!(parse_line("help").unwrap(), FormRequest::Help);
    }

    #[test]
    fn test_rejected_input() {
        assert_eq!(
            parse_line("pool=yes"),
            Err(FormError::UnknownField("pool".to_string()))
        );
        assert_eq!(
            parse_line("accommodates"),
            Err(FormError::MalformedToken("accommodates".to_string()))
        );
        assert_eq!(
            parse_line(r#"neighbourhood="Back Bay"#),
            Err(FormError::UnterminatedQuote)
        );
        assert!(matches!(
            parse_line("bedrooms=two"),
            Err(FormError::InvalidValue { field: "bedrooms", .. })
        ));
        assert!(matches!(
            parse_line("minimum_nights=45"),
            Err(FormError::OutOfRange { field: "minimum_nights", .. })
        ));
    }
}
