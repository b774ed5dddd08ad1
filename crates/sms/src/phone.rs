use std::sync::LazyLock;

use regex::Regex;

use crate::error::SmsError;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s().\-]").expect("valid separator pattern"));
static E164: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9]\d{7,14}$").expect("valid E.164 pattern"));

/// Normalize a phone number to E.164.
///
/// Formatting characters are stripped. Bare 10-digit numbers are treated
/// as North American; anything else is assumed to carry its country code.
///
/// # Errors
/// Returns `SmsError::InvalidNumber` if the result is not a valid E.164 number.
pub fn normalize_e164(raw: &str) -> Result<String, SmsError> {
    let compact = SEPARATORS.replace_all(raw.trim(), "");
    let candidate = if compact.starts_with('+') {
        compact.into_owned()
    } else if let Some(rest) = compact.strip_prefix("00") {
        format!("+{rest}")
    } else if compact.len() == 10 && compact.bytes().all(|b| b.is_ascii_digit()) {
        format!("+1{compact}")
    } else {
        format!("+{compact}")
    };

    if E164.is_match(&candidate) {
        Ok(candidate)
    } else {
        Err(SmsError::InvalidNumber(raw.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_common_formats() {
        assert_eq!(normalize_e164("(555) 123-4567").unwrap(), "+15551234567");
        assert_eq!(normalize_e164("1 555 123 4567").unwrap(), "+15551234567");
        assert_eq!(normalize_e164("+44 20 7946 0958").unwrap(), "+442079460958");
        assert_eq!(normalize_e164("0044 20 7946 0958").unwrap(), "+442079460958");
        assert_eq!(normalize_e164("+15551234567").unwrap(), "+15551234567");
    }

    #[test]
    fn rejects_garbage() {
        for raw in ["", "abc", "12345", "+0123456789", "555-CALL-NOW"] {
            assert!(
                matches!(normalize_e164(raw), Err(SmsError::InvalidNumber(_))),
                "{raw:?} should be rejected"
            );
        }
    }
}
