//! Types used throughout.
//!
//! > Schema defines the plain old data types that views operate on. Notably, the schema module has
//! > no knowledge of the database, nor any dependencies on any of the rest of the system.

mod error;
mod options;
pub mod recipe;

pub use crate::schema::{
    error::ApiError,
    options::{Allergy, Community, DietaryRestriction, Unit},
};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// How far ahead of its expiration a food counts as expiring.
pub fn expiring_window() -> Duration {
    Duration::days(7)
}

/// A user.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    /// The user's database ID.
    pub id: Uuid,

    /// The user's name. Unique, ignoring case.
    pub name: String,

    /// A bcrypt hash of the user's password.
    pub password_hash: String,

    /// The user's email address, shown on their listings.
    pub email: String,

    /// The user's allergies.
    pub allergies: Vec<Allergy>,

    /// The user's other dietary restrictions.
    pub restrictions: Vec<DietaryRestriction>,

    /// The community the user lives in.
    pub home_community: Community,

    /// How many foods the user has ever added.
    pub num_food: i32,

    /// How many foods the user has thrown away rather than eaten.
    pub thrown_away: i32,
}

/// The fields needed to create a user.
#[derive(Clone, Debug, PartialEq)]
pub struct NewUser {
    /// The user's name.
    pub name: String,

    /// A bcrypt hash of the user's password.
    pub password_hash: String,

    /// The user's email address.
    pub email: String,

    /// The user's allergies.
    pub allergies: Vec<Allergy>,

    /// The user's other dietary restrictions.
    pub restrictions: Vec<DietaryRestriction>,

    /// The community the user lives in.
    pub home_community: Community,
}

/// A partial update to a user. Only the fields that are `Some` get overwritten.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserPatch {
    /// A new name.
    pub name: Option<String>,

    /// A new password hash.
    pub password_hash: Option<String>,

    /// A new email address.
    pub email: Option<String>,

    /// A new set of allergies.
    pub allergies: Option<Vec<Allergy>>,

    /// A new set of dietary restrictions.
    pub restrictions: Option<Vec<DietaryRestriction>>,

    /// A new home community.
    pub home_community: Option<Community>,
}

impl UserPatch {
    /// Whether applying this patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self == &UserPatch::default()
    }
}

/// A perishable item in a user's stockpile.
#[derive(Clone, Debug, PartialEq)]
pub struct Food {
    /// The food's database ID.
    pub id: Uuid,

    /// The ID of the user who owns the food.
    pub owner: Uuid,

    /// When the food was added.
    pub created: DateTime<Utc>,

    /// What the food is.
    pub name: String,

    /// How much of the food there is. Always positive.
    pub quantity: f64,

    /// The unit `quantity` is measured in, if any.
    pub unit: Option<Unit>,

    /// The end of the day the food expires on.
    pub expiration: DateTime<Utc>,

    /// Whether this is a cooked dish rather than a raw ingredient.
    pub prepared: bool,
}

impl Food {
    /// Whether the food has expired as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration <= now
    }

    /// Whether the food hasn't expired yet, but will within the expiring window.
    pub fn is_expiring(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && self.expiration <= now + expiring_window()
    }
}

/// The fields needed to create a food.
#[derive(Clone, Debug, PartialEq)]
pub struct NewFood {
    /// The ID of the user who owns the food.
    pub owner: Uuid,

    /// When the food is being added.
    pub created: DateTime<Utc>,

    /// What the food is.
    pub name: String,

    /// How much of the food there is.
    pub quantity: f64,

    /// The unit `quantity` is measured in, if any.
    pub unit: Option<Unit>,

    /// The end of the day the food expires on.
    pub expiration: DateTime<Utc>,

    /// Whether this is a cooked dish.
    pub prepared: bool,
}

/// An offer of some of a food to the communities following its owner's home community.
#[derive(Clone, Debug, PartialEq)]
pub struct Listing {
    /// The listing's database ID.
    pub id: Uuid,

    /// The ID of the user who posted the listing.
    pub owner: Uuid,

    /// The ID of the food being offered.
    pub food: Uuid,

    /// When the listing was posted.
    pub created: DateTime<Utc>,

    /// How much of the food is offered. Never more than the food's quantity.
    pub quantity: f64,

    /// What the poster wants in return, e.g. "Free".
    pub price: String,

    /// The food's name, copied when the listing was posted.
    pub name: String,

    /// The food's unit, copied when the listing was posted.
    pub unit: Option<Unit>,

    /// The food's expiration, copied when the listing was posted.
    pub expiration: DateTime<Utc>,
}

/// The fields needed to create a listing. The rest are copied from the food.
#[derive(Clone, Debug, PartialEq)]
pub struct NewListing {
    /// The ID of the user posting the listing.
    pub owner: Uuid,

    /// The ID of the food being offered.
    pub food: Uuid,

    /// When the listing is being posted.
    pub created: DateTime<Utc>,

    /// How much of the food is offered.
    pub quantity: f64,

    /// What the poster wants in return.
    pub price: String,
}

/// A partial update to a listing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListingPatch {
    /// A new quantity.
    pub quantity: Option<f64>,

    /// A new price.
    pub price: Option<String>,
}

/// A user following a community.
#[derive(Clone, Debug, PartialEq)]
pub struct Follow {
    /// The follow's database ID.
    pub id: Uuid,

    /// The ID of the following user.
    pub follower: Uuid,

    /// The community being followed.
    pub community: Community,
}
