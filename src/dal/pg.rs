use crate::{
    dal::{
        schema::{follows, foods, listings, sessions, users},
        FollowStore, FoodStore, ListingStore, SessionStore, UserStore,
    },
    schema::{
        ApiError, Community, Follow, Food, Listing, ListingPatch, NewFood, NewListing, NewUser,
        User, UserPatch,
    },
};
use chrono::{DateTime, Utc};
use diesel::{
    dsl::{delete, insert_into, update},
    prelude::*,
    r2d2::{ConnectionManager, PooledConnection},
    result::{DatabaseErrorKind, Error as DieselError},
    sql_types::Text,
};
use failure::{Error, Fallible};
use std::fmt::Display;
use uuid::Uuid;

sql_function!(fn lower(x: Text) -> Text);

/// The stores, backed by a single pooled Postgres connection.
#[allow(missing_debug_implementations)]
pub struct PgStore {
    conn: PooledConnection<ConnectionManager<PgConnection>>,
}

impl PgStore {
    pub(crate) fn new(conn: PooledConnection<ConnectionManager<PgConnection>>) -> PgStore {
        PgStore { conn }
    }

    /// Runs `func` in a transaction, committing only if it succeeds.
    pub(crate) fn transaction<F, T>(&self, func: F) -> Fallible<T>
    where
        F: FnOnce() -> Fallible<T>,
    {
        self.conn.transaction(func)
    }

    /// Locks a food's row until the end of the transaction, so its quantity can't change under a
    /// listing being checked against it.
    fn lock_food(&self, id: Uuid) -> Fallible<Food> {
        foods::table
            .find(id)
            .for_update()
            .get_result::<FoodRow>(&*self.conn)
            .optional()?
            .ok_or_else(|| ApiError::NotFound(format!("Food with food ID {} does not exist.", id)))?
            .into_food()
    }
}

/// Turns a unique constraint violation into a conflict, passing other errors through.
fn conflict_on_unique(message: &'static str) -> impl FnOnce(DieselError) -> Error {
    move |err| match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            ApiError::Conflict(message.to_string()).into()
        }
        err => err.into(),
    }
}

fn to_strings<T: Display>(values: &[T]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn parse_all<T>(values: Vec<String>) -> Fallible<Vec<T>>
where
    T: std::str::FromStr<Err = Error>,
{
    values.iter().map(|v| v.parse()).collect()
}

/// Escapes the wildcards in a `LIKE` pattern.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch == '%' || ch == '_' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[derive(Queryable)]
struct UserRow {
    id: Uuid,
    name: String,
    password_hash: String,
    email: String,
    allergies: Vec<String>,
    restrictions: Vec<String>,
    home_community: String,
    num_food: i32,
    thrown_away: i32,
}

impl UserRow {
    fn into_user(self) -> Fallible<User> {
        Ok(User {
            id: self.id,
            name: self.name,
            password_hash: self.password_hash,
            email: self.email,
            allergies: parse_all(self.allergies)?,
            restrictions: parse_all(self.restrictions)?,
            home_community: self.home_community.parse()?,
            num_food: self.num_food,
            thrown_away: self.thrown_away,
        })
    }
}

#[derive(AsChangeset)]
#[table_name = "users"]
struct UserChangeset {
    name: Option<String>,
    password_hash: Option<String>,
    email: Option<String>,
    allergies: Option<Vec<String>>,
    restrictions: Option<Vec<String>>,
    home_community: Option<String>,
}

impl<'a> From<&'a UserPatch> for UserChangeset {
    fn from(patch: &'a UserPatch) -> UserChangeset {
        UserChangeset {
            name: patch.name.clone(),
            password_hash: patch.password_hash.clone(),
            email: patch.email.clone(),
            allergies: patch.allergies.as_ref().map(|a| to_strings(a)),
            restrictions: patch.restrictions.as_ref().map(|r| to_strings(r)),
            home_community: patch.home_community.map(|c| c.to_string()),
        }
    }
}

#[derive(Queryable)]
struct FoodRow {
    id: Uuid,
    userid: Uuid,
    created: DateTime<Utc>,
    name: String,
    quantity: f64,
    unit: Option<String>,
    expiration: DateTime<Utc>,
    prepared: bool,
}

impl FoodRow {
    fn into_food(self) -> Fallible<Food> {
        Ok(Food {
            id: self.id,
            owner: self.userid,
            created: self.created,
            name: self.name,
            quantity: self.quantity,
            unit: self.unit.map(|u| u.parse()).transpose()?,
            expiration: self.expiration,
            prepared: self.prepared,
        })
    }
}

#[derive(Queryable)]
struct ListingRow {
    id: Uuid,
    userid: Uuid,
    foodid: Uuid,
    created: DateTime<Utc>,
    quantity: f64,
    price: String,
    name: String,
    unit: Option<String>,
    expiration: DateTime<Utc>,
}

impl ListingRow {
    fn into_listing(self) -> Fallible<Listing> {
        Ok(Listing {
            id: self.id,
            owner: self.userid,
            food: self.foodid,
            created: self.created,
            quantity: self.quantity,
            price: self.price,
            name: self.name,
            unit: self.unit.map(|u| u.parse()).transpose()?,
            expiration: self.expiration,
        })
    }
}

#[derive(Queryable)]
struct FollowRow {
    id: Uuid,
    userid: Uuid,
    community: String,
}

impl FollowRow {
    fn into_follow(self) -> Fallible<Follow> {
        Ok(Follow {
            id: self.id,
            follower: self.userid,
            community: self.community.parse()?,
        })
    }
}

impl UserStore for PgStore {
    fn create_user(&self, user: &NewUser) -> Fallible<User> {
        insert_into(users::table)
            .values((
                users::id.eq(Uuid::new_v4()),
                users::name.eq(&user.name),
                users::password_hash.eq(&user.password_hash),
                users::email.eq(&user.email),
                users::allergies.eq(to_strings(&user.allergies)),
                users::restrictions.eq(to_strings(&user.restrictions)),
                users::home_community.eq(user.home_community.as_str()),
            ))
            .get_result::<UserRow>(&*self.conn)
            .map_err(conflict_on_unique(
                "An account with this username already exists.",
            ))?
            .into_user()
    }

    fn find_user(&self, id: Uuid) -> Fallible<Option<User>> {
        users::table
            .find(id)
            .get_result::<UserRow>(&*self.conn)
            .optional()?
            .map(UserRow::into_user)
            .transpose()
    }

    fn find_user_by_username(&self, username: &str) -> Fallible<Option<User>> {
        users::table
            .filter(lower(users::name).eq(username.to_lowercase()))
            .get_result::<UserRow>(&*self.conn)
            .optional()?
            .map(UserRow::into_user)
            .transpose()
    }

    fn find_users_in_communities(&self, communities: &[Community]) -> Fallible<Vec<User>> {
        users::table
            .filter(users::home_community.eq_any(to_strings(communities)))
            .load::<UserRow>(&*self.conn)?
            .into_iter()
            .map(UserRow::into_user)
            .collect()
    }

    fn update_user(&self, id: Uuid, patch: &UserPatch) -> Fallible<User> {
        let row = if patch.is_empty() {
            users::table
                .find(id)
                .get_result::<UserRow>(&*self.conn)
                .optional()?
        } else {
            update(users::table.find(id))
                .set(&UserChangeset::from(patch))
                .get_result::<UserRow>(&*self.conn)
                .optional()
                .map_err(conflict_on_unique(
                    "An account with this username already exists.",
                ))?
        };
        row.ok_or_else(|| ApiError::NotFound(format!("User {} does not exist.", id)))?
            .into_user()
    }

    fn delete_user(&self, id: Uuid) -> Fallible<bool> {
        let n = delete(users::table.find(id)).execute(&*self.conn)?;
        Ok(n > 0)
    }
}

impl SessionStore for PgStore {
    fn create_session(&self, user: Uuid, expires: DateTime<Utc>) -> Fallible<Uuid> {
        let token = Uuid::new_v4();
        let _ = insert_into(sessions::table)
            .values((
                sessions::id.eq(token),
                sessions::userid.eq(user),
                sessions::expires.eq(expires),
            ))
            .execute(&*self.conn)?;
        Ok(token)
    }

    fn find_session_user(&self, token: Uuid, now: DateTime<Utc>) -> Fallible<Option<Uuid>> {
        let user = sessions::table
            .find(token)
            .filter(sessions::expires.gt(now))
            .select(sessions::userid)
            .get_result(&*self.conn)
            .optional()?;
        Ok(user)
    }

    fn delete_session(&self, token: Uuid) -> Fallible<bool> {
        let n = delete(sessions::table.find(token)).execute(&*self.conn)?;
        Ok(n > 0)
    }

    fn delete_sessions_for_user(&self, user: Uuid) -> Fallible<usize> {
        Ok(delete(sessions::table.filter(sessions::userid.eq(user))).execute(&*self.conn)?)
    }

    fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Fallible<usize> {
        Ok(delete(sessions::table.filter(sessions::expires.le(now))).execute(&*self.conn)?)
    }
}

impl FoodStore for PgStore {
    fn create_food(&self, food: &NewFood) -> Fallible<Food> {
        let row = insert_into(foods::table)
            .values((
                foods::id.eq(Uuid::new_v4()),
                foods::userid.eq(food.owner),
                foods::created.eq(food.created),
                foods::name.eq(&food.name),
                foods::quantity.eq(food.quantity),
                foods::unit.eq(food.unit.map(|u| u.as_str())),
                foods::expiration.eq(food.expiration),
                foods::prepared.eq(food.prepared),
            ))
            .get_result::<FoodRow>(&*self.conn)?;
        let _ = update(users::table.find(food.owner))
            .set(users::num_food.eq(users::num_food + 1))
            .execute(&*self.conn)?;
        row.into_food()
    }

    fn find_food(&self, id: Uuid) -> Fallible<Option<Food>> {
        foods::table
            .find(id)
            .get_result::<FoodRow>(&*self.conn)
            .optional()?
            .map(FoodRow::into_food)
            .transpose()
    }

    fn find_foods_for_user(&self, owner: Uuid) -> Fallible<Vec<Food>> {
        foods::table
            .filter(foods::userid.eq(owner))
            .order(foods::expiration.asc())
            .load::<FoodRow>(&*self.conn)?
            .into_iter()
            .map(FoodRow::into_food)
            .collect()
    }

    fn find_foods_for_user_matching(&self, owner: Uuid, query: &str) -> Fallible<Vec<Food>> {
        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
        foods::table
            .filter(foods::userid.eq(owner))
            .filter(lower(foods::name).like(pattern))
            .order(foods::expiration.asc())
            .load::<FoodRow>(&*self.conn)?
            .into_iter()
            .map(FoodRow::into_food)
            .collect()
    }

    fn update_food_quantity(&self, id: Uuid, quantity: f64) -> Fallible<Food> {
        update(foods::table.find(id))
            .set(foods::quantity.eq(quantity))
            .get_result::<FoodRow>(&*self.conn)
            .optional()?
            .ok_or_else(|| ApiError::NotFound(format!("Food with food ID {} does not exist.", id)))?
            .into_food()
    }

    fn delete_food(&self, id: Uuid, owner: Uuid, thrown_away: bool) -> Fallible<bool> {
        let n = delete(foods::table.find(id).filter(foods::userid.eq(owner)))
            .execute(&*self.conn)?;
        if n > 0 && thrown_away {
            let _ = update(users::table.find(owner))
                .set(users::thrown_away.eq(users::thrown_away + 1))
                .execute(&*self.conn)?;
        }
        Ok(n > 0)
    }

    fn delete_foods_for_user(&self, owner: Uuid) -> Fallible<usize> {
        Ok(delete(foods::table.filter(foods::userid.eq(owner))).execute(&*self.conn)?)
    }
}

impl ListingStore for PgStore {
    fn create_listing(&self, listing: &NewListing) -> Fallible<Listing> {
        let food = self.lock_food(listing.food)?;
        if listing.quantity > food.quantity {
            return Err(ApiError::CapacityExceeded(
                "You cannot list a higher quantity of a food than you have in your stockpile."
                    .to_string(),
            )
            .into());
        }

        insert_into(listings::table)
            .values((
                listings::id.eq(Uuid::new_v4()),
                listings::userid.eq(listing.owner),
                listings::foodid.eq(listing.food),
                listings::created.eq(listing.created),
                listings::quantity.eq(listing.quantity),
                listings::price.eq(&listing.price),
                listings::name.eq(&food.name),
                listings::unit.eq(food.unit.map(|u| u.as_str())),
                listings::expiration.eq(food.expiration),
            ))
            .get_result::<ListingRow>(&*self.conn)
            .map_err(conflict_on_unique("This food is already listed."))?
            .into_listing()
    }

    fn find_listing(&self, id: Uuid) -> Fallible<Option<Listing>> {
        listings::table
            .find(id)
            .get_result::<ListingRow>(&*self.conn)
            .optional()?
            .map(ListingRow::into_listing)
            .transpose()
    }

    fn find_listing_by_food(&self, food: Uuid) -> Fallible<Option<Listing>> {
        listings::table
            .filter(listings::foodid.eq(food))
            .get_result::<ListingRow>(&*self.conn)
            .optional()?
            .map(ListingRow::into_listing)
            .transpose()
    }

    fn find_listings_for_user(&self, owner: Uuid) -> Fallible<Vec<Listing>> {
        self.find_listings_for_users(&[owner])
    }

    fn find_listings_for_users(&self, owners: &[Uuid]) -> Fallible<Vec<Listing>> {
        listings::table
            .filter(listings::userid.eq_any(owners.to_vec()))
            .order(listings::expiration.asc())
            .load::<ListingRow>(&*self.conn)?
            .into_iter()
            .map(ListingRow::into_listing)
            .collect()
    }

    fn update_listing(&self, id: Uuid, patch: &ListingPatch) -> Fallible<Listing> {
        let listing = self.find_listing(id)?.ok_or_else(|| {
            ApiError::NotFound(format!("Listing with listing ID {} does not exist.", id))
        })?;

        if let Some(quantity) = patch.quantity {
            let food = self.lock_food(listing.food)?;
            if quantity > food.quantity {
                return Err(ApiError::CapacityExceeded(
                    "You cannot list a higher quantity of a food than you have in your stockpile."
                        .to_string(),
                )
                .into());
            }
            let _ = update(listings::table.find(id))
                .set(listings::quantity.eq(quantity))
                .execute(&*self.conn)?;
        }
        if let Some(ref price) = patch.price {
            let _ = update(listings::table.find(id))
                .set(listings::price.eq(price))
                .execute(&*self.conn)?;
        }

        self.find_listing(id)?.ok_or_else(|| {
            ApiError::NotFound(format!("Listing with listing ID {} does not exist.", id)).into()
        })
    }

    fn delete_listing(&self, id: Uuid) -> Fallible<bool> {
        let n = delete(listings::table.find(id)).execute(&*self.conn)?;
        Ok(n > 0)
    }

    fn delete_listing_by_food(&self, food: Uuid) -> Fallible<usize> {
        Ok(delete(listings::table.filter(listings::foodid.eq(food))).execute(&*self.conn)?)
    }

    fn delete_listings_for_user(&self, owner: Uuid) -> Fallible<usize> {
        Ok(delete(listings::table.filter(listings::userid.eq(owner))).execute(&*self.conn)?)
    }

    fn delete_expired_listings(&self, now: DateTime<Utc>) -> Fallible<usize> {
        let expired = foods::table
            .filter(foods::expiration.le(now))
            .select(foods::id);
        Ok(delete(listings::table.filter(listings::foodid.eq_any(expired))).execute(&*self.conn)?)
    }
}

impl FollowStore for PgStore {
    fn create_follow(&self, follower: Uuid, community: Community) -> Fallible<Follow> {
        insert_into(follows::table)
            .values((
                follows::id.eq(Uuid::new_v4()),
                follows::userid.eq(follower),
                follows::community.eq(community.as_str()),
            ))
            .get_result::<FollowRow>(&*self.conn)
            .map_err(conflict_on_unique(
                "Follow between current user and this community already exists.",
            ))?
            .into_follow()
    }

    fn find_follow(&self, id: Uuid) -> Fallible<Option<Follow>> {
        follows::table
            .find(id)
            .get_result::<FollowRow>(&*self.conn)
            .optional()?
            .map(FollowRow::into_follow)
            .transpose()
    }

    fn find_follow_for(&self, follower: Uuid, community: Community) -> Fallible<Option<Follow>> {
        follows::table
            .filter(follows::userid.eq(follower))
            .filter(follows::community.eq(community.as_str()))
            .get_result::<FollowRow>(&*self.conn)
            .optional()?
            .map(FollowRow::into_follow)
            .transpose()
    }

    fn find_follows_for_user(&self, follower: Uuid) -> Fallible<Vec<Follow>> {
        follows::table
            .filter(follows::userid.eq(follower))
            .order(follows::community.asc())
            .load::<FollowRow>(&*self.conn)?
            .into_iter()
            .map(FollowRow::into_follow)
            .collect()
    }

    fn find_follows_for_community(&self, community: Community) -> Fallible<Vec<Follow>> {
        follows::table
            .filter(follows::community.eq(community.as_str()))
            .load::<FollowRow>(&*self.conn)?
            .into_iter()
            .map(FollowRow::into_follow)
            .collect()
    }

    fn delete_follow(&self, follower: Uuid, community: Community) -> Fallible<bool> {
        let n = delete(
            follows::table
                .filter(follows::userid.eq(follower))
                .filter(follows::community.eq(community.as_str())),
        )
        .execute(&*self.conn)?;
        Ok(n > 0)
    }

    fn delete_follows_for_user(&self, follower: Uuid) -> Fallible<usize> {
        Ok(delete(follows::table.filter(follows::userid.eq(follower))).execute(&*self.conn)?)
    }
}
