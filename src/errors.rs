use diesel::result::{DatabaseErrorKind, Error as DieselError};
use failure::{Context, Error as FailureError, Fail};
use validator::ValidationErrors;

/// Kinds of failures the host route layer translates into responses.
/// Rejected coupons and redemptions are not errors, see `models::CouponRejection`.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Not found")]
    NotFound,
    #[fail(display = "Parse error")]
    Parse,
    #[fail(display = "Validation error")]
    Validate(ValidationErrors),
    #[fail(display = "Server is refusing to fullfil the request")]
    Forbidden,
    #[fail(display = "Too many requests")]
    TooManyRequests,
    #[fail(display = "Unique constraint violation")]
    UniqueViolation,
    #[fail(display = "R2D2 connection error")]
    Connection,
    #[fail(display = "Database error")]
    Database,
}

impl<'a> From<&'a DieselError> for Error {
    fn from(e: &DieselError) -> Self {
        match *e {
            DieselError::NotFound => Error::NotFound,
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => Error::UniqueViolation,
            DieselError::DeserializationError(_) | DieselError::SerializationError(_) => Error::Parse,
            _ => Error::Database,
        }
    }
}

/// Wraps diesel error into `failure::Error` keeping both the kind and the original error
pub fn from_diesel(e: DieselError) -> FailureError {
    let kind = Error::from(&e);
    e.context(kind).into()
}

/// Finds the first `Error` kind in the cause chain
pub fn error_kind(e: &FailureError) -> Option<&Error> {
    for cause in e.iter_chain() {
        if let Some(kind) = cause.downcast_ref::<Error>() {
            return Some(kind);
        }
        if let Some(context) = cause.downcast_ref::<Context<Error>>() {
            return Some(context.get_context());
        }
    }
    None
}

pub fn is_unique_violation(e: &FailureError) -> bool {
    match error_kind(e) {
        Some(Error::UniqueViolation) => true,
        _ => false,
    }
}
