//! An in-memory implementation of the stores, for tests.

use crate::{
    dal::{FollowStore, FoodStore, ListingStore, SessionStore, UserStore},
    schema::{
        ApiError, Community, Follow, Food, Listing, ListingPatch, NewFood, NewListing, NewUser,
        User, UserPatch,
    },
};
use antidote::Mutex;
use chrono::{DateTime, Utc};
use failure::Fallible;
use std::collections::HashMap;
use uuid::Uuid;

/// The stores, kept in a few hash maps.
#[allow(missing_debug_implementations)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    sessions: HashMap<Uuid, (Uuid, DateTime<Utc>)>,
    foods: HashMap<Uuid, Food>,
    listings: HashMap<Uuid, Listing>,
    follows: HashMap<Uuid, Follow>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> MemoryStore {
        MemoryStore {
            tables: Mutex::new(Tables::default()),
        }
    }

    /// How many sessions exist, across all users.
    pub fn session_count(&self) -> usize {
        self.tables.lock().sessions.len()
    }
}

fn sorted_by_expiration<T, F>(mut items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    items.sort_by_key(|item| key(item));
    items
}

fn too_much() -> ApiError {
    ApiError::CapacityExceeded(
        "You cannot list a higher quantity of a food than you have in your stockpile.".to_string(),
    )
}

impl UserStore for MemoryStore {
    fn create_user(&self, user: &NewUser) -> Fallible<User> {
        let mut tables = self.tables.lock();
        let lower = user.name.to_lowercase();
        if tables.users.values().any(|u| u.name.to_lowercase() == lower) {
            return Err(
                ApiError::Conflict("An account with this username already exists.".to_string())
                    .into(),
            );
        }

        let user = User {
            id: Uuid::new_v4(),
            name: user.name.clone(),
            password_hash: user.password_hash.clone(),
            email: user.email.clone(),
            allergies: user.allergies.clone(),
            restrictions: user.restrictions.clone(),
            home_community: user.home_community,
            num_food: 0,
            thrown_away: 0,
        };
        let _ = tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn find_user(&self, id: Uuid) -> Fallible<Option<User>> {
        Ok(self.tables.lock().users.get(&id).cloned())
    }

    fn find_user_by_username(&self, username: &str) -> Fallible<Option<User>> {
        let lower = username.to_lowercase();
        Ok(self
            .tables
            .lock()
            .users
            .values()
            .find(|u| u.name.to_lowercase() == lower)
            .cloned())
    }

    fn find_users_in_communities(&self, communities: &[Community]) -> Fallible<Vec<User>> {
        Ok(self
            .tables
            .lock()
            .users
            .values()
            .filter(|u| communities.contains(&u.home_community))
            .cloned()
            .collect())
    }

    fn update_user(&self, id: Uuid, patch: &UserPatch) -> Fallible<User> {
        let mut tables = self.tables.lock();
        if let Some(ref name) = patch.name {
            let lower = name.to_lowercase();
            if tables
                .users
                .values()
                .any(|u| u.id != id && u.name.to_lowercase() == lower)
            {
                return Err(ApiError::Conflict(
                    "An account with this username already exists.".to_string(),
                )
                .into());
            }
        }

        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("User {} does not exist.", id)))?;
        if let Some(ref name) = patch.name {
            user.name = name.clone();
        }
        if let Some(ref hash) = patch.password_hash {
            user.password_hash = hash.clone();
        }
        if let Some(ref email) = patch.email {
            user.email = email.clone();
        }
        if let Some(ref allergies) = patch.allergies {
            user.allergies = allergies.clone();
        }
        if let Some(ref restrictions) = patch.restrictions {
            user.restrictions = restrictions.clone();
        }
        if let Some(community) = patch.home_community {
            user.home_community = community;
        }
        Ok(user.clone())
    }

    fn delete_user(&self, id: Uuid) -> Fallible<bool> {
        Ok(self.tables.lock().users.remove(&id).is_some())
    }
}

impl SessionStore for MemoryStore {
    fn create_session(&self, user: Uuid, expires: DateTime<Utc>) -> Fallible<Uuid> {
        let token = Uuid::new_v4();
        let _ = self.tables.lock().sessions.insert(token, (user, expires));
        Ok(token)
    }

    fn find_session_user(&self, token: Uuid, now: DateTime<Utc>) -> Fallible<Option<Uuid>> {
        Ok(self
            .tables
            .lock()
            .sessions
            .get(&token)
            .filter(|&&(_, expires)| expires > now)
            .map(|&(user, _)| user))
    }

    fn delete_session(&self, token: Uuid) -> Fallible<bool> {
        Ok(self.tables.lock().sessions.remove(&token).is_some())
    }

    fn delete_sessions_for_user(&self, user: Uuid) -> Fallible<usize> {
        let mut tables = self.tables.lock();
        let before = tables.sessions.len();
        tables.sessions.retain(|_, &mut (u, _)| u != user);
        Ok(before - tables.sessions.len())
    }

    fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Fallible<usize> {
        let mut tables = self.tables.lock();
        let before = tables.sessions.len();
        tables.sessions.retain(|_, &mut (_, expires)| expires > now);
        Ok(before - tables.sessions.len())
    }
}

impl FoodStore for MemoryStore {
    fn create_food(&self, food: &NewFood) -> Fallible<Food> {
        let mut tables = self.tables.lock();
        let food = Food {
            id: Uuid::new_v4(),
            owner: food.owner,
            created: food.created,
            name: food.name.clone(),
            quantity: food.quantity,
            unit: food.unit,
            expiration: food.expiration,
            prepared: food.prepared,
        };
        if let Some(owner) = tables.users.get_mut(&food.owner) {
            owner.num_food += 1;
        }
        let _ = tables.foods.insert(food.id, food.clone());
        Ok(food)
    }

    fn find_food(&self, id: Uuid) -> Fallible<Option<Food>> {
        Ok(self.tables.lock().foods.get(&id).cloned())
    }

    fn find_foods_for_user(&self, owner: Uuid) -> Fallible<Vec<Food>> {
        let foods = self
            .tables
            .lock()
            .foods
            .values()
            .filter(|f| f.owner == owner)
            .cloned()
            .collect();
        Ok(sorted_by_expiration(foods, |f: &Food| f.expiration))
    }

    fn find_foods_for_user_matching(&self, owner: Uuid, query: &str) -> Fallible<Vec<Food>> {
        let query = query.to_lowercase();
        let foods = self
            .tables
            .lock()
            .foods
            .values()
            .filter(|f| f.owner == owner && f.name.to_lowercase().contains(&query))
            .cloned()
            .collect();
        Ok(sorted_by_expiration(foods, |f: &Food| f.expiration))
    }

    fn update_food_quantity(&self, id: Uuid, quantity: f64) -> Fallible<Food> {
        let mut tables = self.tables.lock();
        let food = tables
            .foods
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("Food with food ID {} does not exist.", id)))?;
        food.quantity = quantity;
        Ok(food.clone())
    }

    fn delete_food(&self, id: Uuid, owner: Uuid, thrown_away: bool) -> Fallible<bool> {
        let mut tables = self.tables.lock();
        let owned = tables.foods.get(&id).map(|f| f.owner == owner) == Some(true);
        if !owned {
            return Ok(false);
        }
        let _ = tables.foods.remove(&id);
        if thrown_away {
            if let Some(user) = tables.users.get_mut(&owner) {
                user.thrown_away += 1;
            }
        }
        Ok(true)
    }

    fn delete_foods_for_user(&self, owner: Uuid) -> Fallible<usize> {
        let mut tables = self.tables.lock();
        let before = tables.foods.len();
        tables.foods.retain(|_, f| f.owner != owner);
        Ok(before - tables.foods.len())
    }
}

impl ListingStore for MemoryStore {
    fn create_listing(&self, listing: &NewListing) -> Fallible<Listing> {
        let mut tables = self.tables.lock();
        let food = tables.foods.get(&listing.food).cloned().ok_or_else(|| {
            ApiError::NotFound(format!("Food with food ID {} does not exist.", listing.food))
        })?;
        if listing.quantity > food.quantity {
            return Err(too_much().into());
        }
        if tables.listings.values().any(|l| l.food == food.id) {
            return Err(ApiError::Conflict("This food is already listed.".to_string()).into());
        }

        let listing = Listing {
            id: Uuid::new_v4(),
            owner: listing.owner,
            food: food.id,
            created: listing.created,
            quantity: listing.quantity,
            price: listing.price.clone(),
            name: food.name,
            unit: food.unit,
            expiration: food.expiration,
        };
        let _ = tables.listings.insert(listing.id, listing.clone());
        Ok(listing)
    }

    fn find_listing(&self, id: Uuid) -> Fallible<Option<Listing>> {
        Ok(self.tables.lock().listings.get(&id).cloned())
    }

    fn find_listing_by_food(&self, food: Uuid) -> Fallible<Option<Listing>> {
        Ok(self
            .tables
            .lock()
            .listings
            .values()
            .find(|l| l.food == food)
            .cloned())
    }

    fn find_listings_for_user(&self, owner: Uuid) -> Fallible<Vec<Listing>> {
        self.find_listings_for_users(&[owner])
    }

    fn find_listings_for_users(&self, owners: &[Uuid]) -> Fallible<Vec<Listing>> {
        let listings = self
            .tables
            .lock()
            .listings
            .values()
            .filter(|l| owners.contains(&l.owner))
            .cloned()
            .collect();
        Ok(sorted_by_expiration(listings, |l: &Listing| l.expiration))
    }

    fn update_listing(&self, id: Uuid, patch: &ListingPatch) -> Fallible<Listing> {
        let mut tables = self.tables.lock();
        let food_id = tables
            .listings
            .get(&id)
            .map(|l| l.food)
            .ok_or_else(|| {
                ApiError::NotFound(format!("Listing with listing ID {} does not exist.", id))
            })?;
        if let Some(quantity) = patch.quantity {
            let available = tables.foods.get(&food_id).map(|f| f.quantity).ok_or_else(|| {
                ApiError::NotFound(format!("Food with food ID {} does not exist.", food_id))
            })?;
            if quantity > available {
                return Err(too_much().into());
            }
        }

        let listing = tables.listings.get_mut(&id).ok_or_else(|| {
            ApiError::NotFound(format!("Listing with listing ID {} does not exist.", id))
        })?;
        if let Some(quantity) = patch.quantity {
            listing.quantity = quantity;
        }
        if let Some(ref price) = patch.price {
            listing.price = price.clone();
        }
        Ok(listing.clone())
    }

    fn delete_listing(&self, id: Uuid) -> Fallible<bool> {
        Ok(self.tables.lock().listings.remove(&id).is_some())
    }

    fn delete_listing_by_food(&self, food: Uuid) -> Fallible<usize> {
        let mut tables = self.tables.lock();
        let before = tables.listings.len();
        tables.listings.retain(|_, l| l.food != food);
        Ok(before - tables.listings.len())
    }

    fn delete_listings_for_user(&self, owner: Uuid) -> Fallible<usize> {
        let mut tables = self.tables.lock();
        let before = tables.listings.len();
        tables.listings.retain(|_, l| l.owner != owner);
        Ok(before - tables.listings.len())
    }

    fn delete_expired_listings(&self, now: DateTime<Utc>) -> Fallible<usize> {
        let mut guard = self.tables.lock();
        let tables = &mut *guard;
        let foods = &tables.foods;
        let listings = &mut tables.listings;
        let before = listings.len();
        listings.retain(|_, l| match foods.get(&l.food) {
            Some(food) => !food.is_expired(now),
            None => true,
        });
        Ok(before - listings.len())
    }
}

impl FollowStore for MemoryStore {
    fn create_follow(&self, follower: Uuid, community: Community) -> Fallible<Follow> {
        let mut tables = self.tables.lock();
        if tables
            .follows
            .values()
            .any(|f| f.follower == follower && f.community == community)
        {
            return Err(ApiError::Conflict(
                "Follow between current user and this community already exists.".to_string(),
            )
            .into());
        }

        let follow = Follow {
            id: Uuid::new_v4(),
            follower,
            community,
        };
        let _ = tables.follows.insert(follow.id, follow.clone());
        Ok(follow)
    }

    fn find_follow(&self, id: Uuid) -> Fallible<Option<Follow>> {
        Ok(self.tables.lock().follows.get(&id).cloned())
    }

    fn find_follow_for(&self, follower: Uuid, community: Community) -> Fallible<Option<Follow>> {
        Ok(self
            .tables
            .lock()
            .follows
            .values()
            .find(|f| f.follower == follower && f.community == community)
            .cloned())
    }

    fn find_follows_for_user(&self, follower: Uuid) -> Fallible<Vec<Follow>> {
        let mut follows = self
            .tables
            .lock()
            .follows
            .values()
            .filter(|f| f.follower == follower)
            .cloned()
            .collect::<Vec<_>>();
        follows.sort_by(|a, b| a.community.as_str().cmp(b.community.as_str()));
        Ok(follows)
    }

    fn find_follows_for_community(&self, community: Community) -> Fallible<Vec<Follow>> {
        Ok(self
            .tables
            .lock()
            .follows
            .values()
            .filter(|f| f.community == community)
            .cloned()
            .collect())
    }

    fn delete_follow(&self, follower: Uuid, community: Community) -> Fallible<bool> {
        let mut tables = self.tables.lock();
        let before = tables.follows.len();
        tables
            .follows
            .retain(|_, f| !(f.follower == follower && f.community == community));
        Ok(before != tables.follows.len())
    }

    fn delete_follows_for_user(&self, follower: Uuid) -> Fallible<usize> {
        let mut tables = self.tables.lock();
        let before = tables.follows.len();
        tables.follows.retain(|_, f| f.follower != follower);
        Ok(before - tables.follows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStore;
    use crate::{
        dal::{FollowStore, FoodStore, ListingStore, UserStore},
        schema::{ApiError, Community, ListingPatch, NewFood, NewListing, NewUser},
    };
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn new_user(name: &str, community: Community) -> NewUser {
        NewUser {
            name: name.to_string(),
            password_hash: String::new(),
            email: format!("{}@example.com", name),
            allergies: vec![],
            restrictions: vec![],
            home_community: community,
        }
    }

    #[test]
    fn usernames_are_unique_ignoring_case() {
        let store = MemoryStore::new();
        let _ = store.create_user(&new_user("alice", Community::ALL[0])).unwrap();
        let err = store
            .create_user(&new_user("ALICE", Community::ALL[1]))
            .unwrap_err();
        assert!(match err.downcast_ref::<ApiError>() {
            Some(ApiError::Conflict(_)) => true,
            _ => false,
        });
        assert!(store.find_user_by_username("Alice").unwrap().is_some());
    }

    #[test]
    fn listings_are_bounded_by_their_food() {
        let store = MemoryStore::new();
        let now = Utc.ymd(2019, 2, 10).and_hms(12, 0, 0);
        let user = store.create_user(&new_user("bob", Community::ALL[0])).unwrap();
        let food = store
            .create_food(&NewFood {
                owner: user.id,
                created: now,
                name: "Milk".to_string(),
                quantity: 2.0,
                unit: None,
                expiration: now + Duration::days(3),
                prepared: false,
            })
            .unwrap();
        assert_eq!(store.find_user(user.id).unwrap().unwrap().num_food, 1);

        let new_listing = |quantity| NewListing {
            owner: user.id,
            food: food.id,
            created: now,
            quantity,
            price: "Free".to_string(),
        };
        assert!(store.create_listing(&new_listing(3.0)).is_err());
        let listing = store.create_listing(&new_listing(2.0)).unwrap();
        assert_eq!(listing.name, "Milk");
        assert_eq!(listing.expiration, food.expiration);

        let patch = ListingPatch {
            quantity: Some(5.0),
            price: None,
        };
        assert!(store.update_listing(listing.id, &patch).is_err());

        assert_eq!(
            store
                .delete_expired_listings(now + Duration::days(4))
                .unwrap(),
            1
        );
        assert!(store.find_listing(listing.id).unwrap().is_none());
    }

    #[test]
    fn follows_are_found_by_id() {
        let store = MemoryStore::new();
        let user = store.create_user(&new_user("carol", Community::Simmons)).unwrap();
        let follow = store.create_follow(user.id, Community::Maseeh).unwrap();

        assert_eq!(store.find_follow(follow.id).unwrap(), Some(follow.clone()));
        assert_eq!(store.find_follow(Uuid::new_v4()).unwrap(), None);

        assert!(store.delete_follow(user.id, Community::Maseeh).unwrap());
        assert_eq!(store.find_follow(follow.id).unwrap(), None);
    }
}
