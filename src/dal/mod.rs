//! Bindings to the database.
//!
//! > **DAL**, for lack of a better term (borrowing this one from "data access layer" since I don't
//! > want to use "model"), is the only module that does any talking to the database, or any other
//! > IO or interaction with other kinds of externalized state for that matter.
//!
//! Each kind of record gets a store trait. None of the traits promise transactions; invariants
//! spanning several records are kept by `crate::logic`, which calls the stores in an order that
//! leaves no dangling references if it stops partway. `PgStore` runs every request in one
//! transaction anyway.

#[cfg(test)]
pub mod memory;
mod pg;
mod recipes;
#[allow(proc_macro_derive_resolution_fallback, unused_import_braces)]
mod schema;

embed_migrations!("migrations");

pub use crate::dal::{pg::PgStore, recipes::RecipeProvider};
use crate::{
    schema::{
        Community, Follow, Food, Listing, ListingPatch, NewFood, NewListing, NewUser, User,
        UserPatch,
    },
    util::blocking,
};
use chrono::{DateTime, Utc};
use diesel::{
    prelude::*,
    r2d2::{ConnectionManager, Pool},
};
use failure::{Error, Fallible};
use futures::{
    future::{err, Either},
    Future,
};
use std::sync::Arc;
use uuid::Uuid;

/// Users, their credentials, and their counters.
pub trait UserStore {
    /// Creates a user. Both counters start at zero. Fails with `ApiError::Conflict` if the name is
    /// taken, ignoring case.
    fn create_user(&self, user: &NewUser) -> Fallible<User>;

    /// Gets a user by ID.
    fn find_user(&self, id: Uuid) -> Fallible<Option<User>>;

    /// Gets a user by username, ignoring case.
    fn find_user_by_username(&self, username: &str) -> Fallible<Option<User>>;

    /// Gets a user by username (ignoring case) and password. A wrong password looks the same as
    /// a missing user.
    fn find_user_by_credentials(&self, username: &str, password: &str) -> Fallible<Option<User>> {
        match self.find_user_by_username(username.trim())? {
            Some(user) => {
                if bcrypt::verify(password, &user.password_hash)? {
                    Ok(Some(user))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    /// Gets every user whose home community is one of the given ones.
    fn find_users_in_communities(&self, communities: &[Community]) -> Fallible<Vec<User>>;

    /// Overwrites the fields present in the patch. Fails if the user doesn't exist.
    fn update_user(&self, id: Uuid, patch: &UserPatch) -> Fallible<User>;

    /// Deletes a user, returning whether they existed. Doesn't touch anything the user owns.
    fn delete_user(&self, id: Uuid) -> Fallible<bool>;
}

/// Server-side sessions.
pub trait SessionStore {
    /// Starts a session for the user that lasts until `expires`, returning its token.
    fn create_session(&self, user: Uuid, expires: DateTime<Utc>) -> Fallible<Uuid>;

    /// Looks up the user a session token belongs to, if the session hasn't expired as of `now`.
    fn find_session_user(&self, token: Uuid, now: DateTime<Utc>) -> Fallible<Option<Uuid>>;

    /// Ends a session, returning whether it existed.
    fn delete_session(&self, token: Uuid) -> Fallible<bool>;

    /// Ends every session of a user.
    fn delete_sessions_for_user(&self, user: Uuid) -> Fallible<usize>;

    /// Deletes every session that has expired as of `now`.
    fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Fallible<usize>;
}

/// Users' stockpiles.
pub trait FoodStore {
    /// Adds a food, incrementing the owner's `num_food`.
    fn create_food(&self, food: &NewFood) -> Fallible<Food>;

    /// Gets a food by ID.
    fn find_food(&self, id: Uuid) -> Fallible<Option<Food>>;

    /// Gets a user's foods, soonest expiration first.
    fn find_foods_for_user(&self, owner: Uuid) -> Fallible<Vec<Food>>;

    /// Gets the user's foods whose names contain `query`, ignoring case, soonest expiration first.
    fn find_foods_for_user_matching(&self, owner: Uuid, query: &str) -> Fallible<Vec<Food>>;

    /// Sets a food's quantity. Fails if the food doesn't exist.
    fn update_food_quantity(&self, id: Uuid, quantity: f64) -> Fallible<Food>;

    /// Deletes a food, returning whether it existed. If it did and `thrown_away` is set, the
    /// owner's `thrown_away` counter is incremented. Listings of the food are left alone.
    fn delete_food(&self, id: Uuid, owner: Uuid, thrown_away: bool) -> Fallible<bool>;

    /// Deletes every food a user owns.
    fn delete_foods_for_user(&self, owner: Uuid) -> Fallible<usize>;
}

/// The community marketplace.
pub trait ListingStore {
    /// Posts a listing, copying the food's name, unit, and expiration into it. Fails with
    /// `ApiError::CapacityExceeded` if the quantity is more than the food has.
    fn create_listing(&self, listing: &NewListing) -> Fallible<Listing>;

    /// Gets a listing by ID.
    fn find_listing(&self, id: Uuid) -> Fallible<Option<Listing>>;

    /// Gets the listing of a food, if it has one.
    fn find_listing_by_food(&self, food: Uuid) -> Fallible<Option<Listing>>;

    /// Gets a user's listings, soonest expiration first.
    fn find_listings_for_user(&self, owner: Uuid) -> Fallible<Vec<Listing>>;

    /// Gets the listings posted by any of the given users, soonest expiration first.
    fn find_listings_for_users(&self, owners: &[Uuid]) -> Fallible<Vec<Listing>>;

    /// Gets the listings posted by users living in any of the given communities, along with
    /// their posters.
    fn find_listings_in_communities(
        &self,
        communities: &[Community],
    ) -> Fallible<Vec<(Listing, User)>>
    where
        Self: UserStore,
    {
        let users = self.find_users_in_communities(communities)?;
        let ids = users.iter().map(|user| user.id).collect::<Vec<_>>();
        let listings = self.find_listings_for_users(&ids)?;
        Ok(listings
            .into_iter()
            .filter_map(|listing| {
                let owner = users.iter().find(|user| user.id == listing.owner)?.clone();
                Some((listing, owner))
            })
            .collect())
    }

    /// Overwrites the fields present in the patch. A new quantity is checked against the food
    /// again. Fails if the listing doesn't exist.
    fn update_listing(&self, id: Uuid, patch: &ListingPatch) -> Fallible<Listing>;

    /// Deletes a listing, returning whether it existed.
    fn delete_listing(&self, id: Uuid) -> Fallible<bool>;

    /// Deletes the listing of a food, if there is one.
    fn delete_listing_by_food(&self, food: Uuid) -> Fallible<usize>;

    /// Deletes every listing a user posted.
    fn delete_listings_for_user(&self, owner: Uuid) -> Fallible<usize>;

    /// Deletes every listing whose food has expired as of `now`, i.e. whose expiration is not after
    /// it.
    fn delete_expired_listings(&self, now: DateTime<Utc>) -> Fallible<usize>;
}

/// Which users follow which communities.
pub trait FollowStore {
    /// Makes a user follow a community. Fails with `ApiError::Conflict` if they already do.
    fn create_follow(&self, follower: Uuid, community: Community) -> Fallible<Follow>;

    /// Gets a follow by ID.
    fn find_follow(&self, id: Uuid) -> Fallible<Option<Follow>>;

    /// Gets the follow between a user and a community, if any.
    fn find_follow_for(&self, follower: Uuid, community: Community) -> Fallible<Option<Follow>>;

    /// Gets the communities a user follows.
    fn find_follows_for_user(&self, follower: Uuid) -> Fallible<Vec<Follow>>;

    /// Gets the users following a community.
    fn find_follows_for_community(&self, community: Community) -> Fallible<Vec<Follow>>;

    /// Makes a user stop following a community, returning whether they did.
    fn delete_follow(&self, follower: Uuid, community: Community) -> Fallible<bool>;

    /// Deletes every follow of a user.
    fn delete_follows_for_user(&self, follower: Uuid) -> Fallible<usize>;
}

/// Every store.
pub trait Store: UserStore + SessionStore + FoodStore + ListingStore + FollowStore {}

impl<S: UserStore + SessionStore + FoodStore + ListingStore + FollowStore> Store for S {}

/// A pool of connections to the database.
#[allow(missing_debug_implementations)]
#[derive(Clone)]
pub struct DB {
    pool: Arc<Pool<ConnectionManager<PgConnection>>>,
}

impl DB {
    /// Connects to the database with at the given URL.
    pub fn connect(database_url: &str) -> Result<DB, Error> {
        let pool = Arc::new(Pool::new(ConnectionManager::new(database_url))?);
        embedded_migrations::run(&pool.get()?)?;
        Ok(DB { pool })
    }

    /// Runs a function against the stores "asynchronously" (but not really), inside a single
    /// transaction. Diesel currently does not support async/futures, so we use
    /// `crate::util::blocking` so the database operations don't block the thread. This does,
    /// however, require the future to be run inside a threadpool.
    ///
    /// If the function fails, the transaction is rolled back.
    pub fn run<F, T>(&self, func: F) -> impl Future<Item = T, Error = Error>
    where
        F: FnOnce(&PgStore) -> Fallible<T>,
    {
        match self.pool.get() {
            Ok(conn) => Either::A(blocking(move || {
                let store = PgStore::new(conn);
                store.transaction(|| func(&store))
            })),
            Err(e) => Either::B(err(e.into())),
        }
    }
}
