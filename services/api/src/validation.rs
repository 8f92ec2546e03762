//! Input validation utilities

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

use crate::models::{CreateBetRequest, RegisterRequest};

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() < 3 {
        return Err("Username must be at least 3 characters long".to_string());
    }

    if username.len() > 20 {
        return Err("Username must be at most 20 characters long".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err("Username can only contain letters and numbers".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
///
/// Any printable ASCII is accepted except `:`.
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

    if !password.is_ascii() {
        return Err("Password must only contain ASCII characters".to_string());
    }

    if password.contains(':') {
        return Err("Password must not contain ':'".to_string());
    }

    Ok(())
}

/// Validate a 3 to 50 character ASCII text field
pub fn validate_text(field: &str, value: &str) -> Result<(), String> {
    let length = value.chars().count();

    if length < 3 {
        return Err(format!("{field} must be at least 3 characters long"));
    }

    if length > 50 {
        return Err(format!("{field} must be at most 50 characters long"));
    }

    if !value.is_ascii() {
        return Err(format!("{field} must only contain ASCII characters"));
    }

    Ok(())
}

/// Validate the option labels of a bet
pub fn validate_bet_options(options: &[String]) -> Result<(), String> {
    if options.len() < 2 {
        return Err("A bet needs at least two options".to_string());
    }

    for (index, option) in options.iter().enumerate() {
        let length = option.chars().count();
        if !(3..=50).contains(&length) {
            return Err(format!("Option '{option}' must be 3 to 50 characters long"));
        }
        if option.chars().any(char::is_control) {
            return Err(format!("Option '{option}' must only contain printable characters"));
        }
        if options[..index].contains(option) {
            return Err(format!("Option '{option}' is listed twice"));
        }
    }

    Ok(())
}

/// Validate a staked amount against its minimum
pub fn validate_amount(amount: f64, minimum: f64) -> Result<(), String> {
    if !amount.is_finite() || amount <= 0.0 || amount < minimum {
        return Err(format!("Amount must be at least {minimum}"));
    }

    Ok(())
}

/// Validate that a bet ends in the future
pub fn validate_ends_at(ends_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), String> {
    if ends_at <= now {
        return Err("End time must be in the future".to_string());
    }

    Ok(())
}

/// Validate a registration payload
pub fn validate_registration(req: &RegisterRequest) -> Result<(), String> {
    validate_username(&req.username)?;
    validate_password(&req.password)?;
    validate_email(&req.email)?;
    validate_text("Name", &req.name)
}

/// Validate a bet creation payload
pub fn validate_create_bet(req: &CreateBetRequest, now: DateTime<Utc>) -> Result<(), String> {
    validate_text("Name", &req.name)?;
    validate_text("Description", &req.description)?;
    validate_bet_options(&req.bet_options)?;
    validate_ends_at(req.ends_at, now)?;

    match (&req.input_option, req.input_bet) {
        (Some(option), Some(amount)) => {
            if !req.bet_options.contains(option) {
                return Err("Initial option must be one of the bet options".to_string());
            }
            validate_amount(amount, 1.0)
        }
        (None, None) => Ok(()),
        _ => Err("inputOption and inputBet must be given together".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn create_request() -> CreateBetRequest {
        CreateBetRequest {
            name: "Will it rain".to_string(),
            description: "Rain in Douala tomorrow".to_string(),
            bet_options: strings(&["yes", "nope"]),
            input_option: Some("yes".to_string()),
            input_bet: Some(10.0),
            ends_at: Utc::now() + Duration::days(1),
        }
    }

    #[test]
    fn usernames_are_alphanumeric() {
        assert!(validate_username("alice42").is_ok());
        assert!(validate_username("al").is_err());
        assert!(validate_username("alice_smith").is_err());
        assert!(validate_username("a".repeat(21).as_str()).is_err());
    }

    #[test]
    fn passwords_reject_colons_and_short_values() {
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("with:colon").is_err());
        assert!(validate_password("pässwörd123").is_err());
    }

    #[test]
    fn bet_options_need_two_distinct_printable_labels() {
        assert!(validate_bet_options(&strings(&["yes", "nope"])).is_ok());
        assert!(validate_bet_options(&strings(&["yes"])).is_err());
        assert!(validate_bet_options(&strings(&["yes", "no"])).is_err());
        assert!(validate_bet_options(&strings(&["yes", "yes"])).is_err());
        assert!(validate_bet_options(&strings(&["yes", "no\tway"])).is_err());
    }

    #[test]
    fn create_request_requires_future_end() {
        let mut req = create_request();
        assert!(validate_create_bet(&req, Utc::now()).is_ok());

        req.ends_at = Utc::now() - Duration::minutes(1);
        assert!(validate_create_bet(&req, Utc::now()).is_err());
    }

    #[test]
    fn seed_wager_must_be_complete_and_valid() {
        let mut req = create_request();
        req.input_option = Some("maybe".to_string());
        assert!(validate_create_bet(&req, Utc::now()).is_err());

        let mut req = create_request();
        req.input_bet = None;
        assert!(validate_create_bet(&req, Utc::now()).is_err());

        let mut req = create_request();
        req.input_bet = Some(0.5);
        assert!(validate_create_bet(&req, Utc::now()).is_err());

        let mut req = create_request();
        req.input_option = None;
        req.input_bet = None;
        assert!(validate_create_bet(&req, Utc::now()).is_ok());
    }
}
