//! The stockpile itself.

use crate::{
    dal::Store,
    logic::validate::{self, QuantityInput},
    schema::{Food, Listing, ListingPatch, NewFood},
};
use chrono::{DateTime, Utc};
use failure::Fallible;
use log::{debug, info};
use serde_derive::Deserialize;
use uuid::Uuid;

/// The fields of a new food, as a client sends them.
#[derive(Clone, Debug, Deserialize)]
pub struct FoodFields {
    /// What the food is.
    #[serde(default)]
    pub name: String,

    /// How much there is.
    pub quantity: QuantityInput,

    /// The expiration date, as `MM/DD/YYYY`.
    #[serde(default)]
    pub expiration: String,

    /// The unit, if any.
    #[serde(default)]
    pub unit: Option<String>,

    /// Whether it's a cooked dish.
    #[serde(default)]
    pub prepared: bool,
}

/// Gets the caller's stockpile, soonest expiration first, optionally only the foods whose names
/// contain `query`.
pub fn stockpile<S: Store>(
    store: &S,
    me: Option<Uuid>,
    query: Option<&str>,
) -> Fallible<Vec<Food>> {
    let me = validate::logged_in(me)?;
    match query {
        Some(query) => {
            let query = validate::food_query(query)?;
            store.find_foods_for_user_matching(me, &query)
        }
        None => store.find_foods_for_user(me),
    }
}

/// Adds a food to the caller's stockpile.
pub fn create<S: Store>(
    store: &S,
    me: Option<Uuid>,
    now: DateTime<Utc>,
    fields: &FoodFields,
) -> Fallible<Food> {
    let me = validate::logged_in(me)?;
    let name = validate::food_name(&fields.name)?;
    let expiration = validate::expiration(&fields.expiration, now)?;
    let quantity = validate::quantity(&fields.quantity)?;
    let unit = validate::unit(fields.unit.as_ref().map(String::as_str))?;

    let food = store.create_food(&NewFood {
        owner: me,
        created: now,
        name,
        quantity,
        unit,
        expiration,
        prepared: fields.prepared,
    })?;
    info!("{} added {} ({})", me, food.name, food.id);
    Ok(food)
}

/// Changes how much of a food there is. A listing of the food is cut down to match if it offered
/// more than is left.
pub fn update_quantity<S: Store>(
    store: &S,
    me: Option<Uuid>,
    id: &str,
    quantity: &QuantityInput,
) -> Fallible<Food> {
    let me = validate::logged_in(me)?;
    let food = validate::food_exists(store, id)?;
    validate::food_modifier(me, &food)?;
    let quantity = validate::quantity(quantity)?;

    let food = store.update_food_quantity(food.id, quantity)?;
    if let Some(listing) = store.find_listing_by_food(food.id)? {
        if listing.quantity > quantity {
            let patch = ListingPatch {
                quantity: Some(quantity),
                price: None,
            };
            let _ = store.update_listing(listing.id, &patch)?;
            debug!("Cut listing {} down to {}", listing.id, quantity);
        }
    }
    info!("{} set {} ({}) to {}", me, food.name, food.id, quantity);
    Ok(food)
}

/// Removes a food, along with its listing. If it was thrown away rather than eaten, that's counted
/// against the owner.
pub fn delete<S: Store>(store: &S, me: Option<Uuid>, id: &str, thrown_away: bool) -> Fallible<()> {
    let me = validate::logged_in(me)?;
    let food = validate::food_exists(store, id)?;
    validate::food_modifier(me, &food)?;

    let listings = store.delete_listing_by_food(food.id)?;
    let _ = store.delete_food(food.id, me, thrown_away)?;
    info!(
        "{} removed {} ({}){}, along with {} listing(s)",
        me,
        food.name,
        food.id,
        if thrown_away { " as waste" } else { "" },
        listings
    );
    Ok(())
}

/// Gets the listing of one of the caller's foods, if it's listed.
pub fn listing_for<S: Store>(store: &S, me: Option<Uuid>, id: &str) -> Fallible<Option<Listing>> {
    let me = validate::logged_in(me)?;
    let food = validate::food_exists(store, id)?;
    validate::food_modifier(me, &food)?;
    store.find_listing_by_food(food.id)
}
