//! The community marketplace.

use crate::{
    dal::Store,
    logic::validate::{self, QuantityInput},
    schema::{Listing, ListingPatch, NewListing, User},
};
use chrono::{DateTime, Utc};
use failure::Fallible;
use log::{debug, info};
use serde_derive::Deserialize;
use uuid::Uuid;

/// The fields of a new listing, as a client sends them.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingFields {
    /// The ID of the food to list.
    #[serde(default)]
    pub food_id: String,

    /// How much of the food to offer.
    pub quantity: QuantityInput,

    /// What to ask in return. Blank means it's free.
    #[serde(default)]
    pub price: Option<String>,
}

/// The listing fields a client may change.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListingUpdate {
    /// A new quantity.
    pub quantity: Option<QuantityInput>,

    /// A new price.
    pub price: Option<String>,
}

fn price(price: Option<&String>) -> String {
    match price.map(|p| p.trim()) {
        None | Some("") => "Free".to_string(),
        Some(price) => price.to_string(),
    }
}

/// Gets the caller's listings.
pub fn mine<S: Store>(store: &S, me: Option<Uuid>) -> Fallible<Vec<Listing>> {
    let me = validate::logged_in(me)?;
    store.find_listings_for_user(me)
}

/// Lists one of the caller's foods.
pub fn create<S: Store>(
    store: &S,
    me: Option<Uuid>,
    now: DateTime<Utc>,
    fields: &ListingFields,
) -> Fallible<Listing> {
    let me = validate::logged_in(me)?;
    let food = validate::food_exists(store, &fields.food_id)?;
    validate::food_modifier(me, &food)?;
    let quantity = validate::quantity(&fields.quantity)?;
    validate::listing_quantity(quantity, &food)?;
    validate::not_listed(store, &food)?;

    let listing = store.create_listing(&NewListing {
        owner: me,
        food: food.id,
        created: now,
        quantity,
        price: price(fields.price.as_ref()),
    })?;
    info!("{} listed {} of {} ({})", me, quantity, food.name, listing.id);
    Ok(listing)
}

/// Changes a listing's quantity or price.
pub fn update<S: Store>(
    store: &S,
    me: Option<Uuid>,
    id: &str,
    fields: &ListingUpdate,
) -> Fallible<Listing> {
    let me = validate::logged_in(me)?;
    let listing = validate::listing_exists(store, id)?;
    validate::listing_modifier(me, &listing)?;
    let quantity = match fields.quantity {
        Some(ref quantity) => {
            let quantity = validate::quantity(quantity)?;
            let food = validate::food_exists(store, &listing.food.to_string())?;
            validate::listing_quantity(quantity, &food)?;
            Some(quantity)
        }
        None => None,
    };

    let patch = ListingPatch {
        quantity,
        price: fields.price.as_ref().map(|p| price(Some(p))),
    };
    let listing = store.update_listing(listing.id, &patch)?;
    info!("{} updated listing {}", me, listing.id);
    Ok(listing)
}

/// Takes down a listing.
pub fn delete<S: Store>(store: &S, me: Option<Uuid>, id: &str) -> Fallible<()> {
    let me = validate::logged_in(me)?;
    let listing = validate::listing_exists(store, id)?;
    validate::listing_modifier(me, &listing)?;

    let _ = store.delete_listing(listing.id)?;
    info!("{} took down listing {}", me, listing.id);
    Ok(())
}

/// Gets the listings posted in the communities the caller follows, along with their posters,
/// optionally only those whose names contain `query`. Listings of expired food are purged first.
pub fn feed<S: Store>(
    store: &S,
    me: Option<Uuid>,
    now: DateTime<Utc>,
    query: Option<&str>,
) -> Fallible<Vec<(Listing, User)>> {
    let me = validate::logged_in(me)?;
    let query = match query {
        Some(query) => Some(validate::food_query(query)?.to_lowercase()),
        None => None,
    };

    let purged = store.delete_expired_listings(now)?;
    if purged > 0 {
        debug!("Purged {} expired listings", purged);
    }

    let communities = store
        .find_follows_for_user(me)?
        .into_iter()
        .map(|follow| follow.community)
        .collect::<Vec<_>>();
    let listings = store.find_listings_in_communities(&communities)?;
    Ok(match query {
        Some(query) => listings
            .into_iter()
            .filter(|(listing, _)| listing.name.to_lowercase().contains(&query))
            .collect(),
        None => listings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dal::{memory::MemoryStore, ListingStore},
        logic::{
            follow,
            food::{self, tests::now},
            user::tests::register_user,
        },
        schema::{ApiError, Community, Food},
    };
    use chrono::Duration;

    fn add_food(store: &MemoryStore, me: Uuid, name: &str, quantity: f64) -> Food {
        food::create(
            store,
            Some(me),
            now(),
            &food::FoodFields {
                name: name.to_string(),
                quantity: QuantityInput::Number(quantity),
                expiration: "11/25/2022".to_string(),
                unit: Some("gallons".to_string()),
                prepared: false,
            },
        )
        .unwrap()
    }

    fn list(food: &Food, quantity: f64) -> ListingFields {
        ListingFields {
            food_id: food.id.to_string(),
            quantity: QuantityInput::Number(quantity),
            price: None,
        }
    }

    fn api_error<T: std::fmt::Debug>(r: Fallible<T>) -> ApiError {
        r.unwrap_err().downcast::<ApiError>().unwrap()
    }

    #[test]
    fn listings_copy_their_food() {
        let store = MemoryStore::new();
        let alice = register_user(&store, "alice", Community::Baker);
        let milk = add_food(&store, alice, "Milk", 2.0);

        let listing = create(&store, Some(alice), now(), &list(&milk, 1.0)).unwrap();
        assert_eq!(listing.name, "Milk");
        assert_eq!(listing.unit, milk.unit);
        assert_eq!(listing.expiration, milk.expiration);
        assert_eq!(listing.price, "Free");
        assert_eq!(mine(&store, Some(alice)).unwrap(), vec![listing]);
    }

    #[test]
    fn listings_cannot_exceed_their_food() {
        let store = MemoryStore::new();
        let alice = register_user(&store, "alice", Community::Baker);
        let milk = add_food(&store, alice, "Milk", 2.0);

        assert_eq!(
            api_error(create(&store, Some(alice), now(), &list(&milk, 3.0))),
            ApiError::CapacityExceeded(
                "You cannot list a higher quantity of a food than you have in your stockpile."
                    .to_string()
            )
        );

        let listing = create(&store, Some(alice), now(), &list(&milk, 2.0)).unwrap();
        let more = ListingUpdate {
            quantity: Some(QuantityInput::Text("5/2".to_string())),
            price: None,
        };
        match api_error(update(&store, Some(alice), &listing.id.to_string(), &more)) {
            ApiError::CapacityExceeded(_) => {}
            err => panic!("unexpected error {:?}", err),
        }
        assert_eq!(store.find_listing(listing.id).unwrap().unwrap().quantity, 2.0);
    }

    #[test]
    fn a_food_is_listed_at_most_once() {
        let store = MemoryStore::new();
        let alice = register_user(&store, "alice", Community::Baker);
        let milk = add_food(&store, alice, "Milk", 2.0);

        let _ = create(&store, Some(alice), now(), &list(&milk, 1.0)).unwrap();
        match api_error(create(&store, Some(alice), now(), &list(&milk, 1.0))) {
            ApiError::Conflict(_) => {}
            err => panic!("unexpected error {:?}", err),
        }
    }

    #[test]
    fn only_the_poster_may_change_a_listing() {
        let store = MemoryStore::new();
        let alice = register_user(&store, "alice", Community::Baker);
        let bob = register_user(&store, "bob", Community::Baker);
        let milk = add_food(&store, alice, "Milk", 2.0);
        let listing = create(&store, Some(alice), now(), &list(&milk, 1.0)).unwrap();
        let id = listing.id.to_string();

        let patch = ListingUpdate {
            quantity: Some(QuantityInput::Number(2.0)),
            price: Some("A muffin".to_string()),
        };
        assert_eq!(
            api_error(update(&store, Some(bob), &id, &patch)),
            ApiError::Forbidden("Cannot modify other users' listings.".to_string())
        );
        assert_eq!(store.find_listing(listing.id).unwrap().unwrap().quantity, 1.0);
        assert!(delete(&store, Some(bob), &id).is_err());

        // Nor may anyone list someone else's food.
        assert!(create(&store, Some(bob), now(), &list(&milk, 1.0)).is_err());

        let updated = update(&store, Some(alice), &id, &patch).unwrap();
        assert_eq!(updated.quantity, 2.0);
        assert_eq!(updated.price, "A muffin");
        delete(&store, Some(alice), &id).unwrap();
        assert!(mine(&store, Some(alice)).unwrap().is_empty());
    }

    #[test]
    fn the_feed_shows_followed_communities() {
        let store = MemoryStore::new();
        let alice = register_user(&store, "alice", Community::Baker);
        let bob = register_user(&store, "bob", Community::Simmons);
        let carol = register_user(&store, "carol", Community::Baker);

        let milk = add_food(&store, alice, "Milk", 2.0);
        let eggs = add_food(&store, bob, "Eggs", 12.0);
        let _ = create(&store, Some(alice), now(), &list(&milk, 1.0)).unwrap();
        let _ = create(&store, Some(bob), now(), &list(&eggs, 6.0)).unwrap();

        let feed_names = |me, query| {
            feed(&store, Some(me), now(), query)
                .unwrap()
                .into_iter()
                .map(|(listing, user)| (listing.name, user.name))
                .collect::<Vec<_>>()
        };
        assert_eq!(
            feed_names(carol, None),
            vec![("Milk".to_string(), "alice".to_string())]
        );

        let _ = follow::follow(&store, Some(carol), "Simmons").unwrap();
        assert_eq!(feed_names(carol, None).len(), 2);
        assert_eq!(
            feed_names(carol, Some("EGG")),
            vec![("Eggs".to_string(), "bob".to_string())]
        );
    }

    #[test]
    fn the_feed_purges_expired_listings() {
        let store = MemoryStore::new();
        let alice = register_user(&store, "alice", Community::Baker);
        let milk = add_food(&store, alice, "Milk", 2.0);
        let listing = create(&store, Some(alice), now(), &list(&milk, 1.0)).unwrap();

        let later = milk.expiration + Duration::days(1);
        assert!(feed(&store, Some(alice), later, None).unwrap().is_empty());
        assert!(store.find_listing(listing.id).unwrap().is_none());
    }
}
