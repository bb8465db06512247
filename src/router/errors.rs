use crate::{
    schema::ApiError,
    util::log_err,
    view::{render_error, render_message},
};
use failure::{Compat, Error};
use futures::future::{err, result, Future};
use warp::{
    filters::body::BodyDeserializeError,
    http::{Response, StatusCode},
    Rejection,
};

/// The status an `ApiError` is reported with.
pub fn status_of(error: &ApiError) -> StatusCode {
    match *error {
        ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ApiError::Forbidden(_) | ApiError::CapacityExceeded(_) => StatusCode::FORBIDDEN,
        ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        ApiError::Conflict(_) => StatusCode::CONFLICT,
        ApiError::Upstream { status, .. } => {
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
    }
}

fn render_api_error(error: &ApiError) -> Result<Response<String>, Rejection> {
    let status = status_of(error);
    match *error {
        ApiError::Upstream { error: ref payload, .. } => render_error(status, payload),
        _ => render_error(status, &error.to_string()),
    }
}

/// Turns rejections into JSON error responses. Rejections that no route matched are passed
/// along, so warp still answers 404 or 405 for them.
pub fn recover(rej: Rejection) -> impl Future<Item = Response<String>, Error = Rejection> {
    if let Some(compat) = rej.find_cause::<Compat<Error>>() {
        let error = compat.get_ref();
        let r = match error.downcast_ref::<ApiError>() {
            Some(api_error) => render_api_error(api_error),
            None => {
                log_err(error);
                render_message(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong on our end.",
                )
            }
        };
        return result(r);
    }

    if let Some(body_err) = rej.find_cause::<BodyDeserializeError>() {
        let r = render_error(StatusCode::BAD_REQUEST, &body_err.to_string());
        return result(r);
    }

    err(rej)
}
