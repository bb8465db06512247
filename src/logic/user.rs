//! Accounts and sessions.

use crate::{
    dal::Store,
    logic::{follow, validate},
    schema::{ApiError, NewUser, User, UserPatch},
};
use chrono::{DateTime, Duration, Utc};
use failure::Fallible;
use log::{debug, info};
use serde_derive::Deserialize;
use uuid::Uuid;

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const HASH_COST: u32 = 4;

/// The user fields a client may send. Registration requires all but the dietary ones; an update
/// may send any subset.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserFields {
    /// The username.
    pub username: Option<String>,

    /// The password, in plaintext.
    pub password: Option<String>,

    /// The email address.
    pub email: Option<String>,

    /// Allergy names.
    pub allergies: Option<Vec<String>>,

    /// Dietary restriction names.
    pub other_dietary_restrictions: Option<Vec<String>>,

    /// The home community's name.
    pub home_community: Option<String>,
}

/// Hashes a password for storage.
pub fn hash_password(password: &str) -> Fallible<String> {
    Ok(bcrypt::hash(password, HASH_COST)?)
}

/// Resolves a session token from a cookie to the user it belongs to. Tokens that don't parse,
/// aren't known, have expired, or belong to deleted users all resolve to nobody.
pub fn session_user<S: Store>(
    store: &S,
    token: &str,
    now: DateTime<Utc>,
) -> Fallible<Option<Uuid>> {
    let token = match token.parse() {
        Ok(token) => token,
        Err(_) => return Ok(None),
    };
    match store.find_session_user(token, now)? {
        Some(id) => Ok(store.find_user(id)?.map(|user| user.id)),
        None => Ok(None),
    }
}

/// Gets the signed-in user, if any.
pub fn current<S: Store>(store: &S, me: Option<Uuid>) -> Fallible<Option<User>> {
    match me {
        Some(me) => store.find_user(me),
        None => Ok(None),
    }
}

/// Gets the signed-in user, failing if there isn't one.
pub fn require<S: Store>(store: &S, me: Option<Uuid>) -> Fallible<User> {
    let me = validate::logged_in(me)?;
    store.find_user(me)?.ok_or_else(|| {
        ApiError::Forbidden("User session was not recognized.".to_string()).into()
    })
}

/// Signs in, returning the user and a new session token that lasts for `lifetime`. Sessions that
/// have already expired are cleared out along the way.
pub fn sign_in<S: Store>(
    store: &S,
    me: Option<Uuid>,
    now: DateTime<Utc>,
    lifetime: Duration,
    username: Option<&str>,
    password: Option<&str>,
) -> Fallible<(User, Uuid)> {
    validate::logged_out(me)?;
    let (username, password) = match (username, password) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            (username, password)
        }
        (Some(username), _) if !username.is_empty() => {
            return Err(ApiError::BadRequest(
                "Missing password credentials for sign in.".to_string(),
            )
            .into())
        }
        _ => {
            return Err(ApiError::BadRequest(
                "Missing username credentials for sign in.".to_string(),
            )
            .into())
        }
    };

    let user = store
        .find_user_by_credentials(username, password)?
        .ok_or_else(|| {
            ApiError::Unauthorized("Invalid user login credentials provided.".to_string())
        })?;
    let expired = store.delete_expired_sessions(now)?;
    debug!("Cleared {} expired session(s)", expired);
    let token = store.create_session(user.id, now + lifetime)?;
    info!("{} signed in", user.name);
    Ok((user, token))
}

/// Ends a session.
pub fn sign_out<S: Store>(store: &S, me: Option<Uuid>, token: Option<Uuid>) -> Fallible<()> {
    let me = validate::logged_in(me)?;
    if let Some(token) = token {
        let _ = store.delete_session(token)?;
    }
    debug!("{} signed out", me);
    Ok(())
}

/// Creates an account, follows its home community, and signs it in.
pub fn register<S: Store>(
    store: &S,
    me: Option<Uuid>,
    now: DateTime<Utc>,
    lifetime: Duration,
    fields: &UserFields,
) -> Fallible<(User, Uuid)> {
    validate::logged_out(me)?;
    let name = validate::username(fields.username.as_ref().map_or("", String::as_str))?;
    let password = fields.password.as_ref().map_or("", String::as_str);
    validate::password(password)?;
    let email = validate::email(fields.email.as_ref().map_or("", String::as_str))?;
    let home_community =
        validate::home_community(fields.home_community.as_ref().map_or("", String::as_str))?;
    let allergies = validate::allergies(fields.allergies.as_ref().map_or(&[][..], Vec::as_slice))?;
    let restrictions = validate::restrictions(
        fields
            .other_dietary_restrictions
            .as_ref()
            .map_or(&[][..], Vec::as_slice),
    )?;
    validate::username_not_in_use(store, &name, None)?;

    let user = store.create_user(&NewUser {
        name,
        password_hash: hash_password(password)?,
        email,
        allergies,
        restrictions,
        home_community,
    })?;
    let _ = follow::ensure(store, user.id, user.home_community)?;
    let token = store.create_session(user.id, now + lifetime)?;
    info!("{} registered in {}", user.name, user.home_community);
    Ok((user, token))
}

/// Overwrites the fields that were sent. Moving to a new home community follows it, but doesn't
/// unfollow the old one.
pub fn update<S: Store>(store: &S, me: Option<Uuid>, fields: &UserFields) -> Fallible<User> {
    let me = validate::logged_in(me)?;
    let mut patch = UserPatch::default();
    if let Some(ref name) = fields.username {
        patch.name = Some(validate::username(name)?);
    }
    if let Some(ref password) = fields.password {
        validate::password(password)?;
        patch.password_hash = Some(hash_password(password)?);
    }
    if let Some(ref email) = fields.email {
        patch.email = Some(validate::email(email)?);
    }
    if let Some(ref community) = fields.home_community {
        patch.home_community = Some(validate::home_community(community)?);
    }
    if let Some(ref allergies) = fields.allergies {
        patch.allergies = Some(validate::allergies(allergies)?);
    }
    if let Some(ref restrictions) = fields.other_dietary_restrictions {
        patch.restrictions = Some(validate::restrictions(restrictions)?);
    }
    if let Some(ref name) = patch.name {
        validate::username_not_in_use(store, name, Some(me))?;
    }

    let user = store.update_user(me, &patch)?;
    if patch.home_community.is_some() {
        let _ = follow::ensure(store, user.id, user.home_community)?;
    }
    info!("{} updated their account", user.name);
    Ok(user)
}

/// Deletes the caller's account and everything it owns. Dependents go first, so stopping partway
/// never leaves a record pointing at a missing one, and running it again finishes the job.
pub fn delete_account<S: Store>(store: &S, me: Option<Uuid>) -> Fallible<()> {
    let me = validate::logged_in(me)?;
    let listings = store.delete_listings_for_user(me)?;
    let foods = store.delete_foods_for_user(me)?;
    let follows = store.delete_follows_for_user(me)?;
    let sessions = store.delete_sessions_for_user(me)?;
    debug!(
        "Deleting {} removed {} listings, {} foods, {} follows, and {} sessions",
        me, listings, foods, follows, sessions
    );
    let _ = store.delete_user(me)?;
    info!("{} deleted their account", me);
    Ok(())
}
