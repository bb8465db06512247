//! The HTTP server.
//!
//! > **Router** is the the only module that knows anything about HTTP. Every other part of the
//! > system has no knowledge of how the request is really being made. The router's responsibility
//! > is to call into the domain logic, and then render that response data with an appropriate view.
//!
//! Everything is served as JSON under `/api`. Who the caller is gets worked out from their `auth`
//! cookie and handed to the logic explicitly; the logic decides whether that's good enough.

mod auth;
mod errors;
mod follow;
mod food;
mod listing;
mod recipe;
mod util;

use crate::{
    dal::{RecipeProvider, DB},
    logic,
    router::util::{set, FutureExt},
    view::{render_json, OptionsView},
};
use chrono::Duration;
use futures::{
    future::{loop_fn, ok, Loop},
    Future,
};
use log::{info, warn};
use serde_derive::Deserialize;
use std::net::SocketAddr;
use warp::{http::StatusCode, Filter};

/// Server-wide settings that handlers need.
#[derive(Clone, Copy, Debug)]
pub struct Settings {
    /// How long a session cookie lasts, in days.
    pub session_days: u64,
}

impl Settings {
    /// How long a new session lasts.
    pub fn session_lifetime(&self) -> Duration {
        Duration::days(self.session_days as i64)
    }
}

/// The `?foodName=` filter shared by the stockpile and the community feed.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NameQuery {
    food_name: Option<String>,
}

/// Starts an HTTP server at the given address. The polymorphism in the return type indicates that
/// the future will never resolve, since it can be trivially used as
/// `impl Future<Item = Void, Error = Void>`.
pub fn serve_on<T, E>(
    addr: SocketAddr,
    db: DB,
    provider: RecipeProvider,
    settings: Settings,
) -> impl Future<Item = T, Error = E> {
    loop_fn((), move |()| {
        info!("Starting to serve on {}...", addr);
        let server = set(db.clone())
            .and(set(provider.clone()))
            .and(set(settings))
            .and(routes())
            .recover(errors::recover)
            .with(warp::log("stockpile::router"));
        warp::serve(server).bind(addr).then(|r| {
            let status = match r {
                Ok(()) => "success",
                Err(()) => "failure",
            };
            warn!("HTTP server exited with {}; restarting...", status);
            ok(Loop::Continue(()))
        })
    })
}

fn routes() -> Resp!() {
    warp::path("api")
        .and(route_any! {
            GET ("users" / "session") => auth::session_get(),
            POST ("users" / "session") => auth::session_post(),
            DELETE ("users" / "session") => auth::session_delete(),
            POST ("users") => auth::register(),
            PATCH ("users") => auth::update(),
            DELETE ("users") => auth::delete(),
            GET ("foods" / "alerts") => food::alerts(),
            GET ("foods") => food::list(),
            GET ("foods") => food::listing(),
            POST ("foods") => food::create(),
            PATCH ("foods") => food::update(),
            DELETE ("foods") => food::delete(),
            GET ("listings") => listing::list(),
            POST ("listings") => listing::create(),
            PATCH ("listings") => listing::update(),
            DELETE ("listings") => listing::delete(),
            GET ("follows" / "session") => follow::mine(),
            GET ("follows" / "listings") => follow::feed(),
            PUT ("follows") => follow::follow(),
            DELETE ("follows") => follow::unfollow(),
            GET ("recipes" / "suggested") => recipe::suggested(),
            GET ("recipes") => recipe::by_name(),
            GET ("options") => options(),
        })
        .boxed()
}

/// `GET /api/options`
fn options() -> Resp!() {
    warp::path::end()
        .and(warp::ext::get::<DB>())
        .and_then(|db: DB| {
            db.run(|store| logic::follow::community_sizes(store))
                .err_to_rejection()
                .and_then(|sizes| render_json(StatusCode::OK, &OptionsView::new(&sizes)))
        })
        .boxed()
}
