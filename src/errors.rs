use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

/// Validation messages keyed by the offending field name.
///
/// Serialized as `{"field": ["message", ...]}`. Errors that are not tied to a
/// single field go under [`FieldErrors::NON_FIELD`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub const NON_FIELD: &'static str = "non_field_errors";

    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation error.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, messages.join(" "))?;
            first = false;
        }
        Ok(())
    }
}

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Database-related errors.
    DatabaseError(sqlx::Error),
    /// Requested record does not exist.
    NotFound(String),
    /// Requested page is outside the result set.
    InvalidPage,
    /// One or more submitted fields failed validation.
    Validation(FieldErrors),
    /// Bad request error (unparseable body and similar).
    BadRequest(String),
    /// Body sent without a JSON content type.
    UnsupportedMediaType(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InvalidPage => write!(f, "Invalid page"),
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::UnsupportedMediaType(msg) => write!(f, "Unsupported media type: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound(_) | AppError::InvalidPage => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::WithContext { source, .. } => source.status(),
        }
    }
}

impl IntoResponse for AppError {
    /// Maps each variant to a status code and JSON body, logging server-side
    /// failures.
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::DatabaseError(e) => {
                tracing::error!("Database error: {:?}", e);
                json!({ "detail": "A server error occurred." })
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                json!({ "detail": "A server error occurred." })
            }
            AppError::NotFound(msg) => {
                tracing::debug!("Not found: {}", msg);
                json!({ "detail": "Not found." })
            }
            AppError::InvalidPage => json!({ "detail": "Invalid page." }),
            AppError::Validation(errors) => {
                tracing::debug!("Validation failed: {}", errors);
                json!(errors)
            }
            AppError::BadRequest(msg) | AppError::UnsupportedMediaType(msg) => {
                json!({ "detail": msg })
            }
            AppError::WithContext { source, context } => {
                match source.as_ref() {
                    AppError::DatabaseError(_) | AppError::InternalError(_) => {
                        tracing::error!("Error with context: {} -> {}", context, source);
                    }
                    _ => tracing::debug!("Error with context: {} -> {}", context, source),
                }
                return source.into_response();
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors)
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for sqlx::Error to add context
impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_collect_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("name", "This field is required.");
        errors.add("price", "A valid number is required.");
        errors.add("name", "Second message.");

        assert_eq!(errors.get("name").map(|m| m.len()), Some(2));
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["name", "price"]);
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({
                "name": ["This field is required.", "Second message."],
                "price": ["A valid number is required."]
            })
        );
    }

    #[test]
    fn empty_field_errors_are_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
        assert!(matches!(
            FieldErrors::single("x", "bad").into_result(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn status_codes_follow_variant() {
        assert_eq!(
            AppError::NotFound("provider 1".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::InvalidPage.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Validation(FieldErrors::single("a", "b")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::UnsupportedMediaType("text/plain".into()).status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        let wrapped: Result<(), AppError> = Err(AppError::NotFound("x".into()));
        let wrapped = wrapped.context("loading provider").unwrap_err();
        assert_eq!(wrapped.status(), StatusCode::NOT_FOUND);
        assert_eq!(wrapped.to_string(), "loading provider: Not found: x");
    }
}
