//! Request validation glue between `validator` and [`AppError`].

use validator::Validate;

use archivehub_core::error::AppError;

/// Run the derived validation rules of `req`, mapping failures into a
/// single `Validation` error.
pub fn validate_request<T: Validate>(req: &T) -> Result<(), AppError> {
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
}
