//! Following communities.

use crate::{
    dal::Store,
    logic::validate,
    schema::{Community, Follow},
};
use failure::Fallible;
use log::info;
use uuid::Uuid;

/// Gets the communities the caller follows.
pub fn mine<S: Store>(store: &S, me: Option<Uuid>) -> Fallible<Vec<Follow>> {
    let me = validate::logged_in(me)?;
    store.find_follows_for_user(me)
}

/// Follows a community.
pub fn follow<S: Store>(store: &S, me: Option<Uuid>, community: &str) -> Fallible<Follow> {
    let me = validate::logged_in(me)?;
    let community = validate::community_name(community)?;
    validate::not_repeat_follow(store, me, community)?;

    let follow = store.create_follow(me, community)?;
    info!("{} followed {}", me, community);
    Ok(follow)
}

/// Unfollows a community.
pub fn unfollow<S: Store>(store: &S, me: Option<Uuid>, community: &str) -> Fallible<()> {
    let me = validate::logged_in(me)?;
    let community = validate::community_name(community)?;
    let _ = validate::follow_exists(store, me, community)?;

    let _ = store.delete_follow(me, community)?;
    info!("{} unfollowed {}", me, community);
    Ok(())
}

/// Makes a user follow a community if they don't already, returning whether a follow was
/// created.
pub fn ensure<S: Store>(store: &S, user: Uuid, community: Community) -> Fallible<bool> {
    if store.find_follow_for(user, community)?.is_some() {
        Ok(false)
    } else {
        let _ = store.create_follow(user, community)?;
        Ok(true)
    }
}

/// Counts the followers of every community.
pub fn community_sizes<S: Store>(store: &S) -> Fallible<Vec<(Community, usize)>> {
    Community::ALL
        .iter()
        .map(|&community| {
            let followers = store.find_follows_for_community(community)?.len();
            Ok((community, followers))
        })
        .collect()
}
