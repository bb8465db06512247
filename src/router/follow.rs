use crate::{
    dal::DB,
    logic,
    router::{
        auth::{caller, Caller},
        util::FutureExt,
        NameQuery,
    },
    view::{render_json, render_message, FollowView, ListingView},
};
use chrono::Utc;
use futures::Future;
use url::percent_encoding::percent_decode;
use warp::{http::StatusCode, Filter, Rejection};

/// A community name from the path. Names like "New House" arrive percent-encoded.
fn community() -> impl Clone + Filter<Extract = (String,), Error = Rejection> {
    warp::path::param::<String>()
        .map(|name: String| percent_decode(name.as_bytes()).decode_utf8_lossy().into_owned())
}

/// `GET /api/follows/session`
pub fn mine() -> Resp!() {
    warp::path::end()
        .and(warp::ext::get::<DB>())
        .and(caller())
        .and_then(|db: DB, caller: Caller| {
            db.run(move |store| {
                let follows = logic::follow::mine(store, caller.user)?;
                let me = logic::user::require(store, caller.user)?;
                Ok((follows, me))
            })
            .err_to_rejection()
            .and_then(|(follows, me)| {
                let views = follows
                    .iter()
                    .map(|follow| FollowView::new(follow, &me.name))
                    .collect::<Vec<_>>();
                render_json(StatusCode::OK, &views)
            })
        })
        .boxed()
}

/// `GET /api/follows/listings[?foodName=]`
pub fn feed() -> Resp!() {
    warp::path::end()
        .and(warp::ext::get::<DB>())
        .and(caller())
        .and(warp::query())
        .and_then(|db: DB, caller: Caller, query: NameQuery| {
            let now = Utc::now();
            db.run(move |store| {
                logic::listing::feed(
                    store,
                    caller.user,
                    now,
                    query.food_name.as_ref().map(String::as_str),
                )
            })
            .err_to_rejection()
            .and_then(|listings| {
                let views = listings
                    .iter()
                    .map(|(listing, poster)| ListingView::new(listing, poster))
                    .collect::<Vec<_>>();
                render_json(StatusCode::OK, &views)
            })
        })
        .boxed()
}

/// `PUT /api/follows/:communityName`
pub fn follow() -> Resp!() {
    community()
        .and(warp::path::end())
        .and(warp::ext::get::<DB>())
        .and(caller())
        .and_then(|community: String, db: DB, caller: Caller| {
            db.run(move |store| logic::follow::follow(store, caller.user, &community))
                .err_to_rejection()
                .and_then(|_| render_message(StatusCode::OK, "Your follow was added successfully."))
        })
        .boxed()
}

/// `DELETE /api/follows/:communityName`
pub fn unfollow() -> Resp!() {
    community()
        .and(warp::path::end())
        .and(warp::ext::get::<DB>())
        .and(caller())
        .and_then(|community: String, db: DB, caller: Caller| {
            db.run(move |store| logic::follow::unfollow(store, caller.user, &community))
                .err_to_rejection()
                .and_then(|()| {
                    render_message(StatusCode::OK, "Your follow was deleted successfully.")
                })
        })
        .boxed()
}
