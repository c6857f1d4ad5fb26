use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::ApiError;
use crate::services::lateness;

/// Decodes a base64 request image into raw bytes.
pub fn decode_image(encoded: &str) -> Result<Vec<u8>, ApiError> {
    if encoded.trim().is_empty() {
        return Err(ApiError::validation("Face image is required"));
    }

    BASE64
        .decode(encoded.trim())
        .map_err(|_| ApiError::validation("Face image is not valid base64"))
}

/// Validates an in-time threshold in HH:MM form.
pub fn validate_threshold(value: &str) -> Result<&str, ApiError> {
    let trimmed = value.trim();

    let is_shaped = trimmed.len() == 5
        && trimmed.as_bytes()[2] == b':'
        && trimmed
            .chars()
            .enumerate()
            .all(|(i, c)| i == 2 || c.is_ascii_digit());

    if !is_shaped || lateness::parse_threshold(trimmed).is_err() {
        return Err(ApiError::validation(
            "Invalid time format. Expected HH:MM (e.g. 09:30)",
        ));
    }

    Ok(trimmed)
}

pub fn require_field<'a>(value: &'a str, name: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{name} is required")));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_image() {
        assert_eq!(decode_image("aGVsbG8=").unwrap(), b"hello");
        assert!(decode_image("").is_err());
        assert!(decode_image("not base64!!!").is_err());
    }

    #[test]
    fn test_validate_threshold() {
        assert!(validate_threshold("09:30").is_ok());
        assert!(validate_threshold("00:00").is_ok());
        assert!(validate_threshold("23:59").is_ok());
        assert!(validate_threshold("24:00").is_err());
        assert!(validate_threshold("9:30").is_err());
        assert!(validate_threshold("09:30:00").is_err());
        assert!(validate_threshold("ab:cd").is_err());
    }

    #[test]
    fn test_require_field() {
        assert_eq!(require_field("  E123 ", "Employee ID").unwrap(), "E123");
        assert!(require_field("   ", "Employee ID").is_err());
    }
}
