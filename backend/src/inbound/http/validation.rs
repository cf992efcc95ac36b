//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every failure becomes `400 invalid_request` with `details.field` naming the
//! offending JSON field or query parameter and `details.code` naming the rule.

use std::fmt::Display;
use std::str::FromStr;

use serde_json::json;
use uuid::Uuid;

use crate::domain::Error;

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
            ErrorCode::InvalidValue => "validation_error",
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

    fn as_str(&self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, message: impl Into<String>, code: ErrorCode) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        field,
        format!("missing required field: {name}"),
        ErrorCode::MissingField,
    )
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let name = field.as_str();
    Error::invalid_request(format!("{name} must be a valid UUID")).with_details(json!({
        "field": name,
        "value": value,
        "code": ErrorCode::InvalidUuid.as_str(),
    }))
}

/// Wrap a value-object validation failure for `field`.
pub(crate) fn invalid_value_error(field: FieldName, error: impl Display) -> Error {
    field_error(field, error.to_string(), ErrorCode::InvalidValue)
}

/// Unwrap a required field.
pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| invalid_uuid_error(field, value))
}

/// Parse a path or body identifier into a typed id.
pub(crate) fn parse_id<T>(value: &str, field: FieldName, wrap: fn(Uuid) -> T) -> Result<T, Error> {
    parse_uuid(value, field).map(wrap)
}

/// Parse a closed string value such as a category or role.
pub(crate) fn parse_value<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|error| invalid_value_error(field, error))
}

/// Parse an optional query value, treating blank strings as absent.
pub(crate) fn parse_optional_value<T>(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<T>, Error>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| parse_value(raw, field))
        .transpose()
}
