//! Business logic.
//!
//! > **Logic** is the "business (or domain) logic" of the application. The router will pull the
//! > necessary information out of the HTTP request, and call into this module as quickly as
//! > possible to do all the actual work.
//!
//! Every operation takes the caller's user ID (if they're signed in) and, where time matters, the
//! current time, rather than reading either from the request. Operations run their validators
//! from `validate` in order, then call into the stores.

pub mod follow;
pub mod food;
pub mod listing;
pub mod recipe;
pub mod stockpile;
pub mod user;
pub mod validate;
