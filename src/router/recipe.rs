use crate::{
    dal::{RecipeProvider, DB},
    logic::recipe::{self, Flow},
    router::{
        auth::{caller, Caller},
        util::FutureExt,
    },
    view::{render_json, RecipeView},
};
use chrono::Utc;
use futures::Future;
use serde_derive::Deserialize;
use warp::{
    http::{Response, StatusCode},
    Filter, Rejection,
};

fn search(
    db: DB,
    provider: RecipeProvider,
    caller: Caller,
    flow: Flow,
    name: Option<String>,
) -> impl Future<Item = Response<String>, Error = Rejection> {
    recipe::search(db, provider, caller.user, Utc::now(), flow, name)
        .err_to_rejection()
        .and_then(|recipes| {
            let views = recipes.iter().map(RecipeView::from).collect::<Vec<_>>();
            render_json(StatusCode::OK, &views)
        })
}

/// `GET /api/recipes/suggested`
pub fn suggested() -> Resp!() {
    warp::path::end()
        .and(warp::ext::get::<DB>())
        .and(warp::ext::get::<RecipeProvider>())
        .and(caller())
        .and_then(|db: DB, provider: RecipeProvider, caller: Caller| {
            search(db, provider, caller, Flow::Suggested, None)
        })
        .boxed()
}

/// `GET /api/recipes?recipeName=`
pub fn by_name() -> Resp!() {
    #[derive(Debug, Default, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct Query {
        recipe_name: Option<String>,
    }

    warp::path::end()
        .and(warp::ext::get::<DB>())
        .and(warp::ext::get::<RecipeProvider>())
        .and(caller())
        .and(warp::query())
        .and_then(
            |db: DB, provider: RecipeProvider, caller: Caller, query: Query| {
                search(db, provider, caller, Flow::Query, query.recipe_name)
            },
        )
        .boxed()
}
