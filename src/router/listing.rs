use crate::{
    dal::DB,
    logic::{
        self,
        listing::{ListingFields, ListingUpdate},
    },
    router::{
        auth::{caller, Caller},
        util::{json_body, FutureExt},
    },
    view::{render_json, render_message, MyListingView},
};
use chrono::Utc;
use futures::Future;
use serde_json::json;
use warp::{http::StatusCode, Filter};

/// `GET /api/listings`
pub fn list() -> Resp!() {
    warp::path::end()
        .and(warp::ext::get::<DB>())
        .and(caller())
        .and_then(|db: DB, caller: Caller| {
            db.run(move |store| {
                let listings = logic::listing::mine(store, caller.user)?;
                let owner = logic::user::require(store, caller.user)?;
                Ok((listings, owner))
            })
            .err_to_rejection()
            .and_then(|(listings, owner)| {
                let views = listings
                    .iter()
                    .map(|listing| MyListingView::new(listing, &owner.name))
                    .collect::<Vec<_>>();
                render_json(StatusCode::OK, &views)
            })
        })
        .boxed()
}

/// `POST /api/listings`
pub fn create() -> Resp!() {
    warp::path::end()
        .and(warp::ext::get::<DB>())
        .and(caller())
        .and(json_body())
        .and_then(|db: DB, caller: Caller, fields: ListingFields| {
            let now = Utc::now();
            db.run(move |store| {
                let listing = logic::listing::create(store, caller.user, now, &fields)?;
                let owner = logic::user::require(store, caller.user)?;
                Ok((listing, owner))
            })
            .err_to_rejection()
            .and_then(|(listing, owner)| {
                render_json(
                    StatusCode::CREATED,
                    &json!({
                        "message": "Your listing was created successfully.",
                        "listing": MyListingView::new(&listing, &owner.name),
                    }),
                )
            })
        })
        .boxed()
}

/// `PATCH /api/listings/:listingId`
pub fn update() -> Resp!() {
    warp::path::param::<String>()
        .and(warp::path::end())
        .and(warp::ext::get::<DB>())
        .and(caller())
        .and(json_body())
        .and_then(|id: String, db: DB, caller: Caller, update: ListingUpdate| {
            db.run(move |store| {
                let listing = logic::listing::update(store, caller.user, &id, &update)?;
                let owner = logic::user::require(store, caller.user)?;
                Ok((listing, owner))
            })
            .err_to_rejection()
            .and_then(|(listing, owner)| {
                render_json(
                    StatusCode::OK,
                    &json!({
                        "message": "Your listing was updated successfully.",
                        "listing": MyListingView::new(&listing, &owner.name),
                    }),
                )
            })
        })
        .boxed()
}

/// `DELETE /api/listings/:listingId`
pub fn delete() -> Resp!() {
    warp::path::param::<String>()
        .and(warp::path::end())
        .and(warp::ext::get::<DB>())
        .and(caller())
        .and_then(|id: String, db: DB, caller: Caller| {
            db.run(move |store| logic::listing::delete(store, caller.user, &id))
                .err_to_rejection()
                .and_then(|()| {
                    render_message(StatusCode::OK, "Your listing was deleted successfully.")
                })
        })
        .boxed()
}
