use crate::{
    dal::DB,
    logic::{self, food::FoodFields, validate::QuantityInput},
    router::{
        auth::{caller, Caller},
        util::{json_body, FutureExt},
        NameQuery,
    },
    view::{render_json, render_message, AlertsView, FoodView, MyListingView},
};
use chrono::Utc;
use futures::Future;
use serde_derive::Deserialize;
use serde_json::json;
use warp::{http::StatusCode, Filter};

/// `GET /api/foods[?foodName=]`
pub fn list() -> Resp!() {
    warp::path::end()
        .and(warp::ext::get::<DB>())
        .and(caller())
        .and(warp::query())
        .and_then(|db: DB, caller: Caller, query: NameQuery| {
            let now = Utc::now();
            db.run(move |store| {
                let foods = logic::food::stockpile(
                    store,
                    caller.user,
                    query.food_name.as_ref().map(String::as_str),
                )?;
                let owner = logic::user::require(store, caller.user)?;
                Ok((foods, owner))
            })
            .err_to_rejection()
            .and_then(move |(foods, owner)| {
                render_json(StatusCode::OK, &FoodView::all(&foods, &owner.name, now))
            })
        })
        .boxed()
}

/// `GET /api/foods/alerts`
pub fn alerts() -> Resp!() {
    warp::path::end()
        .and(warp::ext::get::<DB>())
        .and(caller())
        .and_then(|db: DB, caller: Caller| {
            let now = Utc::now();
            db.run(move |store| {
                let alerts = logic::stockpile::alerts(store, caller.user, now)?;
                let owner = logic::user::require(store, caller.user)?;
                Ok((alerts, owner))
            })
            .err_to_rejection()
            .and_then(move |(alerts, owner)| {
                render_json(StatusCode::OK, &AlertsView::new(&alerts, &owner.name, now))
            })
        })
        .boxed()
}

/// `POST /api/foods`
pub fn create() -> Resp!() {
    warp::path::end()
        .and(warp::ext::get::<DB>())
        .and(caller())
        .and(json_body())
        .and_then(|db: DB, caller: Caller, fields: FoodFields| {
            let now = Utc::now();
            db.run(move |store| {
                let food = logic::food::create(store, caller.user, now, &fields)?;
                let owner = logic::user::require(store, caller.user)?;
                Ok((food, owner))
            })
            .err_to_rejection()
            .and_then(move |(food, owner)| {
                render_json(
                    StatusCode::CREATED,
                    &json!({
                        "message": "Your food was created successfully.",
                        "food": FoodView::new(&food, &owner.name, now),
                    }),
                )
            })
        })
        .boxed()
}

/// `PATCH /api/foods/:foodId`
pub fn update() -> Resp!() {
    #[derive(Debug, Deserialize)]
    struct Body {
        quantity: QuantityInput,
    }

    warp::path::param::<String>()
        .and(warp::path::end())
        .and(warp::ext::get::<DB>())
        .and(caller())
        .and(json_body())
        .and_then(|id: String, db: DB, caller: Caller, body: Body| {
            let now = Utc::now();
            db.run(move |store| {
                let food = logic::food::update_quantity(store, caller.user, &id, &body.quantity)?;
                let owner = logic::user::require(store, caller.user)?;
                Ok((food, owner))
            })
            .err_to_rejection()
            .and_then(move |(food, owner)| {
                render_json(
                    StatusCode::OK,
                    &json!({
                        "message": "Your food was updated successfully.",
                        "food": FoodView::new(&food, &owner.name, now),
                    }),
                )
            })
        })
        .boxed()
}

/// `DELETE /api/foods/:foodId[?thrownAway=true]`
pub fn delete() -> Resp!() {
    #[derive(Debug, Default, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct Query {
        thrown_away: bool,
    }

    warp::path::param::<String>()
        .and(warp::path::end())
        .and(warp::ext::get::<DB>())
        .and(caller())
        .and(warp::query())
        .and_then(|id: String, db: DB, caller: Caller, query: Query| {
            db.run(move |store| logic::food::delete(store, caller.user, &id, query.thrown_away))
                .err_to_rejection()
                .and_then(|()| render_message(StatusCode::OK, "Your food was deleted successfully."))
        })
        .boxed()
}

/// `GET /api/foods/:foodId/listing`
pub fn listing() -> Resp!() {
    warp::path::param::<String>()
        .and(warp::path("listing"))
        .and(warp::path::end())
        .and(warp::ext::get::<DB>())
        .and(caller())
        .and_then(|id: String, db: DB, caller: Caller| {
            db.run(move |store| {
                let listing = logic::food::listing_for(store, caller.user, &id)?;
                let owner = logic::user::require(store, caller.user)?;
                Ok((listing, owner))
            })
            .err_to_rejection()
            .and_then(|(listing, owner)| {
                let listing = listing
                    .as_ref()
                    .map(|listing| MyListingView::new(listing, &owner.name));
                render_json(StatusCode::OK, &json!({ "listing": listing }))
            })
        })
        .boxed()
}
