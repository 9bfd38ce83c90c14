//! Custom field validators used by request payloads and entities.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use validator::ValidationError;

pub const MIN_PASSWORD_LEN: usize = 8;

static TOUR_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z '\-]*$").unwrap());

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Tour names contain letters, spaces, apostrophes and hyphens only.
pub fn validate_tour_name(name: &str) -> Result<(), ValidationError> {
    if TOUR_NAME_REGEX.is_match(name.trim()) {
        Ok(())
    } else {
        Err(error(
            "tour_name",
            "A tour name must only contain letters and spaces",
        ))
    }
}

/// Requires at least [`MIN_PASSWORD_LEN`] characters with a lowercase letter,
/// an uppercase letter, a digit and a symbol.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(error(
            "password_length",
            "Password must be at least 8 characters long",
        ));
    }

    let has_lower = password.chars().any(char::is_lowercase);
    let has_upper = password.chars().any(char::is_uppercase);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    if has_lower && has_upper && has_digit && has_symbol {
        Ok(())
    } else {
        Err(error(
            "password_strength",
            "Password must contain a lowercase letter, an uppercase letter, a digit and a symbol",
        ))
    }
}

/// GeoJSON coordinates are `[longitude, latitude]`.
pub fn validate_coordinates(coordinates: &[f64; 2]) -> Result<(), ValidationError> {
    let [lng, lat] = *coordinates;
    if (-180.0..=180.0).contains(&lng) && (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        Err(error(
            "coordinates",
            "Coordinates must be [longitude, latitude] within valid ranges",
        ))
    }
}
