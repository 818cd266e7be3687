//! JSON body extractor that runs `validator` rules before the handler.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use common::AppError;

/// Deserialized and validated request body.
///
/// Malformed JSON and rule violations both become `AppError::Validation`.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::validation(describe(&e)))?;

        Ok(ValidatedJson(value))
    }
}

/// Message of the first failing rule, fields taken in name order.
fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .find_map(|(field, errors)| {
            errors.first().map(|error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("Invalid value for {}", field),
            })
        })
        .unwrap_or_else(|| "Validation failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Sample {
        #[validate(email(message = "Invalid email format"))]
        email: String,
        #[validate(length(min = 1))]
        password: String,
    }

    #[test]
    fn test_custom_message_used() {
        let sample = Sample {
            email: "nope".into(),
            password: "x".into(),
        };
        let errors = sample.validate().unwrap_err();

        assert_eq!(describe(&errors), "Invalid email format");
    }

    #[test]
    fn test_field_named_without_message() {
        let sample = Sample {
            email: "a@x.com".into(),
            password: String::new(),
        };
        let errors = sample.validate().unwrap_err();

        assert_eq!(describe(&errors), "Invalid value for password");
    }

    #[test]
    fn test_fields_reported_in_name_order() {
        let sample = Sample {
            email: "nope".into(),
            password: String::new(),
        };
        let errors = sample.validate().unwrap_err();

        assert_eq!(describe(&errors), "Invalid email format");
    }
}
