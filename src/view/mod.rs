//! Rendering to JSON.
//!
//! > View is the only module that knows anything about HTML, or JSON, or other "renderings" of the
//! > response. I'm happy to call this "view" in common with traditional stateless MVC, because
//! > it's role is largely the same.
//!
//! Each record gets explicit projection types here, one per audience, so nothing private (like a
//! password hash) can leak into a response by accident.

mod food;
mod listing;
mod options;
mod recipe;
mod user;

pub use crate::view::{
    food::{AlertsView, FoodView},
    listing::{ListingView, MyListingView},
    options::{CommunityView, OptionsView},
    recipe::{IngredientView, MatchView, RecipeView},
    user::{FollowView, UserView},
};
use chrono::{DateTime, Datelike, Utc};
use failure::Error;
use serde::Serialize;
use serde_json::json;
use warp::{
    http::{
        header::{CONTENT_TYPE, SET_COOKIE},
        response::Builder,
        Response, StatusCode,
    },
    reject::custom,
    Rejection,
};

/// Formats a date like "March 3rd 2023".
pub fn format_date(date: DateTime<Utc>) -> String {
    let day = date.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{} {}{} {}", date.format("%B"), day, suffix, date.year())
}

fn build<T: Serialize>(mut builder: Builder, data: &T) -> Result<Response<String>, Rejection> {
    serde_json::to_string(data)
        .map_err(Error::from)
        .and_then(|body| {
            builder
                .header(CONTENT_TYPE, "application/json; charset=utf-8")
                .body(body)
                .map_err(Error::from)
        })
        .map_err(|err| custom(err.compat()))
}

/// Renders data as a JSON response.
pub fn render_json<T: Serialize>(
    status: StatusCode,
    data: &T,
) -> Result<Response<String>, Rejection> {
    let mut builder = Response::builder();
    let _ = builder.status(status);
    build(builder, data)
}

/// Renders data as a JSON response that also sets a cookie.
pub fn render_json_with_cookie<T: Serialize>(
    status: StatusCode,
    data: &T,
    cookie: &str,
) -> Result<Response<String>, Rejection> {
    let mut builder = Response::builder();
    let _ = builder.status(status).header(SET_COOKIE, cookie);
    build(builder, data)
}

/// Renders a bare success message.
pub fn render_message(status: StatusCode, message: &str) -> Result<Response<String>, Rejection> {
    render_json(status, &json!({ "message": message }))
}

/// Renders an error message.
pub fn render_error<T: Serialize>(
    status: StatusCode,
    error: &T,
) -> Result<Response<String>, Rejection> {
    render_json(status, &json!({ "error": error }))
}
