//! Validation of request payloads
//!
//! Structural rules are declared with the `validator` derive and converted
//! into [`ValidationError`]s by [`field_errors`]; resources add their own rules
//! and message overrides through [`ValidationAware`].
//!
//! ```rust,ignore
//! #[derive(Clone, Serialize, Deserialize, Validate)]
//! struct Book {
//!     #[validate(length(min = 1))]
//!     title: String,
//! }
//!
//! impl ValidationAware for Book {
//!     fn validate(&self) -> Vec<ValidationError> {
//!         field_errors(self)
//!     }
//!
//!     fn custom_validation_messages(&self) -> HashMap<String, String> {
//!         HashMap::from([("title:length".into(), "A book needs a title".into())])
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Rule that failed (e.g. `required`, `length`); empty for decode errors
    pub tag: String,
    /// Field the rule applies to
    pub field: String,
    /// Human-readable message
    pub message: String,
}

/// Resources with custom rules and message overrides
pub trait ValidationAware: Send + Sync {
    /// Run the resource's rules
    fn validate(&self) -> Vec<ValidationError>;

    /// Message overrides keyed by `"field:tag"`
    fn custom_validation_messages(&self) -> HashMap<String, String> {
        HashMap::new()
    }
}

/// Build a validation error, applying a custom message when one is declared
pub fn new_validation_error(
    tag: &str,
    field: &str,
    resource: Option<&dyn ValidationAware>,
) -> ValidationError {
    let custom = resource.and_then(|r| {
        r.custom_validation_messages()
            .remove(&format!("{}:{}", field, tag))
    });

    ValidationError {
        tag: tag.to_string(),
        field: field.to_string(),
        message: custom
            .unwrap_or_else(|| format!("Field {} failed with condition `{}`", field, tag)),
    }
}

/// Run the `validator` rules of a resource and convert their failures
///
/// Errors are ordered by field name, then in rule declaration order.
pub fn field_errors<T>(item: &T) -> Vec<ValidationError>
where
    T: validator::Validate + ValidationAware,
{
    let Err(errors) = validator::Validate::validate(item) else {
        return Vec::new();
    };

    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    fields
        .into_iter()
        .flat_map(|(field, failures)| {
            failures
                .iter()
                .map(move |failure| {
                    new_validation_error(&failure.code, &field, Some(item as &dyn ValidationAware))
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Validation error for a body that could not be decoded
pub fn decode_error(message: &str) -> ValidationError {
    new_validation_error("", message, None)
}
