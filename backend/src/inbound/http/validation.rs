//! Shared validation helpers for inbound HTTP adapters.

use serde_json::{Value, json};
use uuid::Uuid;

use crate::domain::{
    BookCondition, BookId, BookValidationError, CredentialsValidationError, Error,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField)
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be a valid UUID"))
        .with_value(ErrorCode::InvalidUuid, value)
}

pub(crate) fn invalid_value_error(field: FieldName, message: String, value: &str) -> Error {
    ValidationError::new(field.as_str(), message).with_value(ErrorCode::InvalidValue, value)
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| invalid_uuid_error(field, value))
}

/// Parse a book id taken from the request path.
pub(crate) fn parse_book_id(value: &str) -> Result<BookId, Error> {
    parse_uuid(value, FieldName::new("id")).map(BookId::from_uuid)
}

/// Parse an optional `condition` value.
pub(crate) fn parse_condition(value: Option<&str>) -> Result<Option<BookCondition>, Error> {
    value
        .map(|raw| {
            raw.parse::<BookCondition>()
                .map_err(|err| invalid_value_error(FieldName::new("condition"), err.to_string(), raw))
        })
        .transpose()
}

/// Parse the optional borrow body into the requested day count.
///
/// An empty body means the borrower has no preference. Any other body must be
/// a JSON object whose `days`, when present, is a whole number.
pub(crate) fn parse_loan_days(body: &[u8]) -> Result<Option<i64>, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| Error::invalid_request(format!("request body is not valid JSON: {err}")))?;
    let Some(object) = value.as_object() else {
        return Err(Error::invalid_request("request body must be a JSON object"));
    };
    match object.get("days") {
        None | Some(Value::Null) => Ok(None),
        Some(days) => days.as_i64().map(Some).ok_or_else(|| {
            let raw = days.as_str().map_or_else(|| days.to_string(), str::to_owned);
            invalid_value_error(
                FieldName::new("days"),
                "days must be a whole number".to_owned(),
                &raw,
            )
        }),
    }
}

pub(crate) fn map_book_validation_error(err: BookValidationError) -> Error {
    let code = match &err {
        BookValidationError::EmptyTitle => "empty_title",
        BookValidationError::EmptyAuthor => "empty_author",
        BookValidationError::TitleTooLong { .. }
        | BookValidationError::AuthorTooLong { .. }
        | BookValidationError::IsbnTooLong { .. } => "too_long",
        BookValidationError::UnknownCondition(_) => ErrorCode::InvalidValue.as_str(),
    };
    Error::invalid_request(err.to_string()).with_details(json!({
        "field": err.field(),
        "code": code,
    }))
}

pub(crate) fn map_credentials_validation_error(err: CredentialsValidationError) -> Error {
    let code = match &err {
        CredentialsValidationError::Email(_) => "invalid_email",
        CredentialsValidationError::DisplayName(_) => "invalid_display_name",
        CredentialsValidationError::EmptyPassword => "empty_password",
        CredentialsValidationError::PasswordTooShort { .. } => "password_too_short",
    };
    Error::invalid_request(err.to_string()).with_details(json!({
        "field": err.field(),
        "code": code,
    }))
}
