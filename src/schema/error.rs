use failure::Fail;
use serde_json::Value;

/// An error the caller is expected to understand and act on. Anything else that goes wrong while
/// handling a request is an internal error.
#[derive(Clone, Debug, Fail, PartialEq)]
pub enum ApiError {
    /// A field was missing or malformed. Nothing was changed.
    #[fail(display = "{}", _0)]
    BadRequest(String),

    /// Sign-in credentials didn't match any account.
    #[fail(display = "{}", _0)]
    Unauthorized(String),

    /// The caller is in the wrong authentication state, or doesn't own the resource.
    #[fail(display = "{}", _0)]
    Forbidden(String),

    /// A referenced resource doesn't exist.
    #[fail(display = "{}", _0)]
    NotFound(String),

    /// The request would duplicate something that must be unique.
    #[fail(display = "{}", _0)]
    Conflict(String),

    /// A listing would offer more of a food than its owner has.
    #[fail(display = "{}", _0)]
    CapacityExceeded(String),

    /// The recipe provider failed; its status and error payload are passed along as-is.
    #[fail(display = "The recipe provider responded with status {}", status)]
    Upstream {
        /// The HTTP status the provider responded with.
        status: u16,

        /// The provider's error payload.
        error: Value,
    },
}
