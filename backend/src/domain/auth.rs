//! Authentication primitives such as login credentials and signup details.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use zeroize::Zeroizing;

use super::user::{DisplayName, Email, UserValidationError};

/// Minimum password length accepted at signup.
pub const PASSWORD_MIN_LEN: usize = 6;

/// Domain error returned when login or signup payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Email was missing or malformed.
    Email(UserValidationError),
    /// Display name was missing or too long.
    DisplayName(UserValidationError),
    /// Password was blank.
    EmptyPassword,
    /// Password is shorter than [`PASSWORD_MIN_LEN`].
    PasswordTooShort { min: usize },
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(err) | Self::DisplayName(err) => err.fmt(f),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

impl CredentialsValidationError {
    /// Name of the payload field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Email(_) => "email",
            Self::DisplayName(_) => "displayName",
            Self::EmptyPassword | Self::PasswordTooShort { .. } => "password",
        }
    }
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is normalised to lower case.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use backend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ada@Example.com", "password").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let email = Email::new(email).map_err(CredentialsValidationError::Email)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }

        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used to look the account up.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated signup request.
///
/// Unlike [`LoginCredentials`], the password must meet the minimum length
/// so weak passwords are refused before they are hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupDetails {
    display_name: DisplayName,
    email: Email,
    password: Zeroizing<String>,
}

impl SignupDetails {
    /// Construct signup details from raw inputs.
    pub fn try_from_parts(
        display_name: &str,
        email: &str,
        password: &str,
    ) -> Result<Self, CredentialsValidationError> {
        let display_name =
            DisplayName::new(display_name).map_err(CredentialsValidationError::DisplayName)?;
        let email = Email::new(email).map_err(CredentialsValidationError::Email)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(CredentialsValidationError::PasswordTooShort {
                min: PASSWORD_MIN_LEN,
            });
        }

        Ok(Self {
            display_name,
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Requested display name.
    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Requested login email.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Plain-text password awaiting hashing.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}
