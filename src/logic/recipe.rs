//! Recipe suggestions, matched against the caller's stockpile.

use crate::{
    dal::{RecipeProvider, Store, DB},
    logic::{stockpile, user},
    schema::{
        expiring_window,
        recipe::{ProviderIngredient, ProviderRecipe},
        Allergy, ApiError, DietaryRestriction, Food, User,
    },
};
use chrono::{DateTime, Utc};
use failure::{Error, Fallible};
use futures::Future;
use std::collections::HashSet;
use url::form_urlencoded::byte_serialize;
use uuid::Uuid;

/// How a search was made, which decides what counts as a used ingredient.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flow {
    /// Searching by the caller's ingredients. The provider says which ones it used.
    Suggested,

    /// Searching by recipe name. An ingredient is used if the stockpile has it.
    Query,
}

/// The parameters of a recipe search, minus the API key and result count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecipeQuery {
    /// A recipe name to search for.
    pub query: Option<String>,

    /// Ingredients the recipes should use as many of as possible.
    pub include_ingredients: Vec<String>,

    /// Allergies the recipes must avoid.
    pub intolerances: Vec<Allergy>,

    /// Diets the recipes must fit.
    pub diet: Vec<DietaryRestriction>,
}

fn encode(s: &str) -> String {
    byte_serialize(s.as_bytes()).collect()
}

fn join<T: ToString>(values: &[T], sep: &str) -> String {
    values
        .iter()
        .map(|v| encode(&v.to_string()))
        .collect::<Vec<_>>()
        .join(sep)
}

impl RecipeQuery {
    /// A search for recipes using the given foods, fitting the user's diet.
    pub fn suggested(user: &User, usable: &[Food]) -> RecipeQuery {
        RecipeQuery {
            query: None,
            include_ingredients: usable.iter().map(|food| food.name.clone()).collect(),
            intolerances: user.allergies.clone(),
            diet: user.restrictions.clone(),
        }
    }

    /// A search for recipes by name, fitting the user's diet.
    pub fn by_name(name: &str, user: &User) -> RecipeQuery {
        RecipeQuery {
            query: Some(name.to_string()),
            include_ingredients: Vec::new(),
            intolerances: user.allergies.clone(),
            diet: user.restrictions.clone(),
        }
    }

    /// Encodes the search as a query string.
    pub fn to_query_string(&self) -> String {
        let mut params = Vec::new();
        if let Some(ref query) = self.query {
            params.push(format!("query={}", encode(query)));
        }
        if !self.include_ingredients.is_empty() {
            params.push(format!(
                "includeIngredients={}",
                join(&self.include_ingredients, ",+")
            ));
            params.push("sort=max-used-ingredients".to_string());
        }
        params.push("addRecipeInformation=true".to_string());
        params.push("fillIngredients=true".to_string());
        if !self.intolerances.is_empty() {
            params.push(format!("intolerances={}", join(&self.intolerances, ",")));
        }
        if !self.diet.is_empty() {
            params.push(format!("diet={}", join(&self.diet, ",")));
        }
        params.join("&")
    }
}

/// An ingredient, with the stockpile foods that could stand in for it.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotatedIngredient {
    /// The ingredient.
    pub ingredient: ProviderIngredient,

    /// The names the ingredient goes by.
    pub names: Vec<String>,

    /// Whether the caller has the ingredient.
    pub used: bool,

    /// The foods matching the ingredient.
    pub matches: Vec<Food>,
}

/// A recipe, annotated with how much of the stockpile it would use up.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotatedRecipe {
    /// The recipe.
    pub recipe: ProviderRecipe,

    /// Its ingredients.
    pub ingredients: Vec<AnnotatedIngredient>,

    /// How many distinct stockpile foods the recipe matches.
    pub used_count: usize,

    /// How many of those foods expire within the expiring window.
    pub expiring_count: usize,
}

/// The names an ingredient goes by: its own, and its cleaned-up one if that's different.
fn names(ingredient: &ProviderIngredient) -> Vec<String> {
    let mut names = vec![ingredient.name.clone()];
    if let Some(ref clean) = ingredient.name_clean {
        if !clean.is_empty() && *clean != ingredient.name {
            names.push(clean.clone());
        }
    }
    names
}

/// Whether a food could stand in for an ingredient going by one of `names`. Either name containing
/// the other, ignoring case, counts.
fn matches(food: &Food, names: &[String]) -> bool {
    let food_name = food.name.trim().to_lowercase();
    if food_name.is_empty() {
        return false;
    }
    names.iter().any(|name| {
        let name = name.trim().to_lowercase();
        !name.is_empty() && (name.contains(&food_name) || food_name.contains(&name))
    })
}

/// Matches a recipe's ingredients against the stockpile.
pub fn annotate(
    recipe: ProviderRecipe,
    stockpile: &[Food],
    flow: Flow,
    now: DateTime<Utc>,
) -> AnnotatedRecipe {
    let used_ids = recipe
        .used_ingredients
        .iter()
        .map(|ingredient| ingredient.id)
        .collect::<HashSet<_>>();
    let soon = now + expiring_window();

    let mut matched = HashSet::new();
    let ingredients = recipe
        .extended_ingredients
        .iter()
        .map(|ingredient| {
            let names = names(ingredient);
            let matches = stockpile
                .iter()
                .filter(|food| matches(food, &names))
                .cloned()
                .collect::<Vec<_>>();
            matched.extend(matches.iter().map(|food| food.id));
            let used = match flow {
                Flow::Suggested => used_ids.contains(&ingredient.id),
                Flow::Query => !matches.is_empty(),
            };
            AnnotatedIngredient {
                ingredient: ingredient.clone(),
                names,
                used,
                matches,
            }
        })
        .collect();

    let matched = stockpile
        .iter()
        .filter(|food| matched.contains(&food.id))
        .collect::<Vec<_>>();
    let used_count = matched.len();
    let expiring_count = matched.iter().filter(|f| f.expiration <= soon).count();
    AnnotatedRecipe {
        recipe,
        ingredients,
        used_count,
        expiring_count,
    }
}

/// Sorts recipes so the ones using the most of the stockpile come first, breaking ties by how much
/// of what they use is about to expire.
pub fn rank(recipes: &mut [AnnotatedRecipe]) {
    recipes.sort_by(|a, b| {
        b.used_count
            .cmp(&a.used_count)
            .then(b.expiring_count.cmp(&a.expiring_count))
    });
}

/// Annotates search results, ranking them if they came from a search by name.
pub fn finish(
    results: Vec<ProviderRecipe>,
    stockpile: &[Food],
    flow: Flow,
    now: DateTime<Utc>,
) -> Vec<AnnotatedRecipe> {
    let mut recipes = results
        .into_iter()
        .map(|recipe| annotate(recipe, stockpile, flow, now))
        .collect::<Vec<_>>();
    if flow == Flow::Query {
        rank(&mut recipes);
    }
    recipes
}

/// Works out what to search for, returning the search along with the foods to match results
/// against.
pub fn prepare<S: Store>(
    store: &S,
    me: Option<Uuid>,
    now: DateTime<Utc>,
    flow: Flow,
    name: Option<&str>,
) -> Fallible<(RecipeQuery, Vec<Food>)> {
    let user = user::require(store, me)?;
    let name = match flow {
        Flow::Suggested => None,
        Flow::Query => match name.map(str::trim) {
            Some(name) if !name.is_empty() => Some(name),
            _ => {
                return Err(
                    ApiError::BadRequest("Recipe name must be nonempty.".to_string()).into(),
                )
            }
        },
    };

    let usable = stockpile::usable(store.find_foods_for_user(user.id)?, now);
    let query = match name {
        Some(name) => RecipeQuery::by_name(name, &user),
        None => RecipeQuery::suggested(&user, &usable),
    };
    Ok((query, usable))
}

/// Searches for recipes and matches them against the caller's stockpile.
pub fn search(
    db: DB,
    provider: RecipeProvider,
    me: Option<Uuid>,
    now: DateTime<Utc>,
    flow: Flow,
    name: Option<String>,
) -> impl Future<Item = Vec<AnnotatedRecipe>, Error = Error> {
    db.run(move |store| prepare(store, me, now, flow, name.as_ref().map(String::as_str)))
        .and_then(move |(query, usable)| {
            provider
                .search(query.to_query_string())
                .map(move |results| finish(results, &usable, flow, now))
        })
}
