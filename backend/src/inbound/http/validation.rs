//! Shared validation helpers for inbound HTTP adapters.

use serde_json::json;

use crate::domain::Error;

/// Validation error codes reported in `details.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValidationCode {
    MissingField,
    InvalidPublicKey,
    InvalidOptions,
}

impl ValidationCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidPublicKey => "invalid_public_key",
            Self::InvalidOptions => "invalid_options",
        }
    }
}

/// Request body field name as seen by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("missing required field: {field}")).with_details(json!({
        "field": field,
        "code": ValidationCode::MissingField.as_str(),
    }))
}

pub(crate) fn invalid_field_error(
    field: FieldName,
    code: ValidationCode,
    reason: impl std::fmt::Display,
) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("{field} is invalid: {reason}")).with_details(json!({
        "field": field,
        "code": code.as_str(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    const KEY: FieldName = FieldName::new("key");

    #[rstest]
    fn missing_field_names_the_field() {
        let error = missing_field_error(KEY);

        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        assert_eq!(error.message(), "missing required field: key");
        assert_eq!(
            error.details(),
            Some(&json!({"field": "key", "code": "missing_field"}))
        );
    }

    #[rstest]
    fn invalid_field_carries_reason_and_code() {
        let error = invalid_field_error(
            KEY,
            ValidationCode::InvalidPublicKey,
            "public key must be a single line",
        );

        assert_eq!(
            error.message(),
            "key is invalid: public key must be a single line"
        );
        assert_eq!(
            error.details(),
            Some(&json!({"field": "key", "code": "invalid_public_key"}))
        );
    }
}
