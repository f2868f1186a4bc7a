//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Trim and lowercase a handle or email before it is stored or looked up
pub fn normalize_identifier(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Validate handle (expects a normalized value)
pub fn validate_handle(handle: &str) -> Result<(), String> {
    if handle.is_empty() {
        return Err("Handle is required".to_string());
    }

    if handle.len() < 3 {
        return Err("Handle must be at least 3 characters long".to_string());
    }

    if handle.len() > 32 {
        return Err("Handle must be at most 32 characters long".to_string());
    }

    static HANDLE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = HANDLE_REGEX
        .get_or_init(|| Regex::new(r"^[a-z0-9_]+$").expect("Failed to compile handle regex"));

    if !regex.is_match(handle) {
        return Err("Handle can only contain letters, numbers, and underscores".to_string());
    }

    Ok(())
}

/// Validate email (expects a normalized value)
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate a display name
pub fn validate_display_name(display_name: &str) -> Result<(), String> {
    let trimmed = display_name.trim();
    if trimmed.is_empty() {
        return Err("Display name is required".to_string());
    }

    if trimmed.chars().count() > 64 {
        return Err("Display name must be at most 64 characters long".to_string());
    }

    Ok(())
}

/// Validate that a required free-form field is present
pub fn validate_required(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_special = false;

    for c in password.chars() {
        if c.is_ascii_uppercase() {
            has_upper = true;
        } else if c.is_ascii_lowercase() {
            has_lower = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else if !c.is_alphanumeric() {
            has_special = true;
        }
    }

    if !has_upper {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !has_lower {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !has_digit {
        return Err("Password must contain at least one digit".to_string());
    }

    if !has_special {
        return Err("Password must contain at least one special character".to_string());
    }

    Ok(())
}
