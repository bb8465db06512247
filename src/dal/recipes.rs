use crate::{
    schema::{
        recipe::{ProviderRecipe, SearchResults},
        ApiError,
    },
    util::blocking,
};
use failure::{Error, Fallible};
use futures::Future;
use log::debug;
use reqwest::{Client, Url};
use serde_json::Value;
use std::sync::Arc;

/// A client for the recipe search API.
#[allow(missing_debug_implementations)]
#[derive(Clone)]
pub struct RecipeProvider {
    inner: Arc<RecipeProviderInner>,
}

impl RecipeProvider {
    /// Creates a client for the search endpoint at `url`, asking for `results` recipes per search.
    pub fn new(url: &str, api_key: String, results: u32) -> Fallible<RecipeProvider> {
        let url = Url::parse(url)?;
        let client = Client::builder().build()?;
        Ok(RecipeProvider {
            inner: Arc::new(RecipeProviderInner {
                api_key,
                client,
                results,
                url,
            }),
        })
    }

    /// Searches for recipes. `params` is an already-encoded query string, without the API key or
    /// result count.
    pub fn search(&self, params: String) -> impl Future<Item = Vec<ProviderRecipe>, Error = Error> {
        let inner = self.inner.clone();
        blocking(move || {
            let mut url = inner.url.clone();
            url.set_query(Some(&format!(
                "{}&number={}&apiKey={}",
                params, inner.results, inner.api_key
            )));
            debug!("Searching for recipes with {}", params);

            let mut resp = inner.client.get(url).send()?;
            let status = resp.status();
            let body = resp.text()?;
            if !status.is_success() {
                return Err(upstream_error(status.as_u16(), &body).into());
            }

            let results: SearchResults = serde_json::from_str(&body)?;
            Ok(results.results)
        })
    }
}

/// Builds the error for a failed search, keeping the provider's own error payload if it sent one.
fn upstream_error(status: u16, body: &str) -> ApiError {
    let error = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(mut map)) => map
            .remove("message")
            .or_else(|| map.remove("error"))
            .unwrap_or_else(|| Value::String(body.to_string())),
        _ => Value::String(body.to_string()),
    };
    ApiError::Upstream { status, error }
}

#[allow(missing_debug_implementations)]
struct RecipeProviderInner {
    api_key: String,
    client: Client,
    results: u32,
    url: Url,
}
