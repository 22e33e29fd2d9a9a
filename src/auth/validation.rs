//! Field rules for identity data.
//!
//! Every check is a pure function returning the specific rule that failed.
//! The `Display` text of [`ValidationError`] is what the caller sees.
//! Lengths are in bytes; this keeps every accepted password under bcrypt's
//! 72-byte input limit.

use std::ops::RangeInclusive;

use thiserror::Error;

pub const PHONE_PREFIX: &str = "+62";

const FULL_NAME_LEN: RangeInclusive<usize> = 3..=60;
const PHONE_NUMBER_LEN: RangeInclusive<usize> = 10..=13;
const PASSWORD_LEN: RangeInclusive<usize> = 6..=64;
const PASSWORD_SYMBOLS: [char; 7] = ['!', '@', '#', '$', '%', '^', '&'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("full name is required")]
    FullNameRequired,
    #[error("password is required")]
    PasswordRequired,
    #[error("phone number is required")]
    PhoneNumberRequired,
    #[error("full name length must be between 3 and 60 characters")]
    FullNameTooShort,
    #[error("full name length must be between 3 and 60 characters")]
    FullNameTooLong,
    #[error("phone number length must be between 10 and 13 characters")]
    PhoneNumberInvalidLength,
    #[error("phone number must start with +62")]
    PhoneNumberInvalidPrefix,
    #[error("password length must be between 6 and 64 characters")]
    PasswordInvalidLength,
    #[error("password must contain at least 1 uppercase, 1 lowercase, 1 number, and 1 symbol")]
    PasswordMissingComplexity,
}

/// Profile fields that passed validation. `None` means "leave unchanged".
#[derive(Default, PartialEq, Eq)]
pub struct ProfileChanges<'a> {
    pub full_name: Option<&'a str>,
    pub password: Option<&'a str>,
    pub phone_number: Option<&'a str>,
}

impl std::fmt::Debug for ProfileChanges<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileChanges")
            .field("full_name", &self.full_name)
            .field("password", &self.password.map(|_| "<redacted>"))
            .field("phone_number", &self.phone_number)
            .finish()
    }
}

pub fn validate_full_name(full_name: &str) -> Result<(), ValidationError> {
    let len = full_name.len();
    if len < *FULL_NAME_LEN.start() {
        return Err(ValidationError::FullNameTooShort);
    }
    if len > *FULL_NAME_LEN.end() {
        return Err(ValidationError::FullNameTooLong);
    }
    Ok(())
}

pub fn validate_phone_number(phone_number: &str) -> Result<(), ValidationError> {
    if !PHONE_NUMBER_LEN.contains(&phone_number.len()) {
        return Err(ValidationError::PhoneNumberInvalidLength);
    }
    if !phone_number.starts_with(PHONE_PREFIX) {
        return Err(ValidationError::PhoneNumberInvalidPrefix);
    }
    Ok(())
}

/// Length is checked before complexity.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if !PASSWORD_LEN.contains(&password.len()) {
        return Err(ValidationError::PasswordInvalidLength);
    }

    let (mut upper, mut lower, mut digit, mut symbol) = (false, false, false, false);
    for c in password.chars() {
        match c {
            'A'..='Z' => upper = true,
            'a'..='z' => lower = true,
            '0'..='9' => digit = true,
            c if PASSWORD_SYMBOLS.contains(&c) => symbol = true,
            _ => {}
        }
        if upper && lower && digit && symbol {
            return Ok(());
        }
    }
    Err(ValidationError::PasswordMissingComplexity)
}

/// Registration order: presence (name, password, phone), phone format,
/// name length, password rules. The first failure wins.
pub fn validate_registration(
    full_name: &str,
    password: &str,
    phone_number: &str,
) -> Result<(), ValidationError> {
    if full_name.is_empty() {
        return Err(ValidationError::FullNameRequired);
    }
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    if phone_number.is_empty() {
        return Err(ValidationError::PhoneNumberRequired);
    }
    validate_phone_number(phone_number)?;
    validate_full_name(full_name)?;
    validate_password(password)
}

/// Update order: name, password, phone. Only supplied fields are checked.
pub fn validate_update<'a>(
    full_name: Option<&'a str>,
    password: Option<&'a str>,
    phone_number: Option<&'a str>,
) -> Result<ProfileChanges<'a>, ValidationError> {
    if let Some(name) = full_name {
        validate_full_name(name)?;
    }
    if let Some(pw) = password {
        validate_password(pw)?;
    }
    if let Some(phone) = phone_number {
        validate_phone_number(phone)?;
    }
    Ok(ProfileChanges {
        full_name,
        password,
        phone_number,
    })
}
