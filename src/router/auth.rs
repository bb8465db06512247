use crate::{
    dal::DB,
    logic::{self, user::UserFields},
    router::{
        util::{json_body, FutureExt},
        Settings,
    },
    view::{render_json, render_json_with_cookie, UserView},
};
use chrono::Utc;
use futures::{
    future::{ok, Either},
    Future,
};
use serde_derive::Deserialize;
use serde_json::json;
use uuid::Uuid;
use warp::{http::StatusCode, Filter, Rejection};

/// Clears the `auth` cookie.
const CLEAR_COOKIE: &str = "auth=; Max-Age=0; Path=/; HttpOnly";

/// Who is making a request, as far as their `auth` cookie says.
#[derive(Clone, Copy, Debug, Default)]
pub struct Caller {
    /// The signed-in user, if any.
    pub user: Option<Uuid>,

    /// The session token, if it belongs to a user.
    pub token: Option<Uuid>,
}

/// A filter that parses a user's authentication cookie. Missing, malformed, and stale cookies all
/// make for an anonymous caller.
pub fn caller() -> impl Clone + Filter<Extract = (Caller,), Error = Rejection> {
    warp::cookie::optional("auth")
        .and(warp::ext::get::<DB>())
        .and_then(|token: Option<String>, db: DB| match token {
            Some(token) => Either::A(
                db.run(move |store| {
                    let user = logic::user::session_user(store, &token, Utc::now())?;
                    Ok(Caller {
                        user,
                        token: user.and_then(|_| token.parse().ok()),
                    })
                })
                .err_to_rejection(),
            ),
            None => Either::B(ok(Caller::default())),
        })
}

fn auth_cookie(token: Uuid, settings: &Settings) -> String {
    format!(
        "auth={}; Max-Age={}; Path=/; HttpOnly",
        token,
        settings.session_lifetime().num_seconds()
    )
}

/// `GET /api/users/session`
pub fn session_get() -> Resp!() {
    warp::path::end()
        .and(warp::ext::get::<DB>())
        .and(caller())
        .and_then(|db: DB, caller: Caller| {
            db.run(move |store| logic::user::current(store, caller.user))
                .err_to_rejection()
                .and_then(|user| {
                    render_json(
                        StatusCode::OK,
                        &json!({ "user": user.as_ref().map(UserView::from) }),
                    )
                })
        })
        .boxed()
}

/// `POST /api/users/session`
pub fn session_post() -> Resp!() {
    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Credentials {
        username: Option<String>,
        password: Option<String>,
    }

    warp::path::end()
        .and(warp::ext::get::<DB>())
        .and(warp::ext::get::<Settings>())
        .and(caller())
        .and(json_body())
        .and_then(
            |db: DB, settings: Settings, caller: Caller, creds: Credentials| {
                db.run(move |store| {
                    logic::user::sign_in(
                        store,
                        caller.user,
                        Utc::now(),
                        settings.session_lifetime(),
                        creds.username.as_ref().map(String::as_str),
                        creds.password.as_ref().map(String::as_str),
                    )
                })
                .err_to_rejection()
                .and_then(move |(user, token)| {
                    render_json_with_cookie(
                        StatusCode::OK,
                        &json!({
                            "message": format!("You are logged in as {}", user.name),
                            "user": UserView::from(&user),
                        }),
                        &auth_cookie(token, &settings),
                    )
                })
            },
        )
        .boxed()
}

/// `DELETE /api/users/session`
pub fn session_delete() -> Resp!() {
    warp::path::end()
        .and(warp::ext::get::<DB>())
        .and(caller())
        .and_then(|db: DB, caller: Caller| {
            db.run(move |store| logic::user::sign_out(store, caller.user, caller.token))
                .err_to_rejection()
                .and_then(|()| {
                    render_json_with_cookie(
                        StatusCode::OK,
                        &json!({ "message": "You have been logged out successfully." }),
                        CLEAR_COOKIE,
                    )
                })
        })
        .boxed()
}

/// `POST /api/users`
pub fn register() -> Resp!() {
    warp::path::end()
        .and(warp::ext::get::<DB>())
        .and(warp::ext::get::<Settings>())
        .and(caller())
        .and(json_body())
        .and_then(
            |db: DB, settings: Settings, caller: Caller, fields: UserFields| {
                db.run(move |store| {
                    logic::user::register(
                        store,
                        caller.user,
                        Utc::now(),
                        settings.session_lifetime(),
                        &fields,
                    )
                })
                .err_to_rejection()
                .and_then(move |(user, token)| {
                    render_json_with_cookie(
                        StatusCode::CREATED,
                        &json!({
                            "message": format!(
                                "Your account was created successfully. You have been logged \
                                 in as {}",
                                user.name
                            ),
                            "user": UserView::from(&user),
                        }),
                        &auth_cookie(token, &settings),
                    )
                })
            },
        )
        .boxed()
}

/// `PATCH /api/users`
pub fn update() -> Resp!() {
    warp::path::end()
        .and(warp::ext::get::<DB>())
        .and(caller())
        .and(json_body())
        .and_then(|db: DB, caller: Caller, fields: UserFields| {
            db.run(move |store| logic::user::update(store, caller.user, &fields))
                .err_to_rejection()
                .and_then(|user| {
                    render_json(
                        StatusCode::OK,
                        &json!({
                            "message": "Your profile was updated successfully.",
                            "user": UserView::from(&user),
                        }),
                    )
                })
        })
        .boxed()
}

/// `DELETE /api/users`
pub fn delete() -> Resp!() {
    warp::path::end()
        .and(warp::ext::get::<DB>())
        .and(caller())
        .and_then(|db: DB, caller: Caller| {
            db.run(move |store| logic::user::delete_account(store, caller.user))
                .err_to_rejection()
                .and_then(|()| {
                    render_json_with_cookie(
                        StatusCode::OK,
                        &json!({ "message": "Your account has been deleted successfully." }),
                        CLEAR_COOKIE,
                    )
                })
        })
        .boxed()
}
