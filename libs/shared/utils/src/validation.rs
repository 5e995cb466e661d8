use std::sync::OnceLock;

use regex::Regex;

pub const MIN_PASSWORD_LENGTH: usize = 8;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .expect("email pattern is valid")
    })
}

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^\+?[0-9]{8,15}$").expect("phone pattern is valid"))
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email_regex().is_match(email.trim()) {
        Ok(())
    } else {
        Err(format!("Invalid email address: {}", email))
    }
}

pub fn validate_phone(phone: &str) -> Result<(), String> {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    if phone_regex().is_match(&compact) {
        Ok(())
    } else {
        Err(format!("Invalid phone number: {}", phone))
    }
}

/// At least eight characters with both letters and digits.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !password.chars().any(|c| c.is_alphabetic()) || !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain both letters and digits".to_string());
    }
    Ok(())
}

pub fn require_non_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} is required", field))
    } else {
        Ok(())
    }
}
