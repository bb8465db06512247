use crate::schema::{Allergy, Community, DietaryRestriction, Follow, User};
use serde_derive::Serialize;
use uuid::Uuid;

/// A user, as they see themselves.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView<'a> {
    id: Uuid,
    username: &'a str,
    email: &'a str,
    allergies: &'a [Allergy],
    other_dietary_restrictions: &'a [DietaryRestriction],
    home_community: Community,
    num_food: i32,
    thrown_away: i32,
}

impl<'a> From<&'a User> for UserView<'a> {
    fn from(user: &'a User) -> UserView<'a> {
        UserView {
            id: user.id,
            username: &user.name,
            email: &user.email,
            allergies: &user.allergies,
            other_dietary_restrictions: &user.restrictions,
            home_community: user.home_community,
            num_food: user.num_food,
            thrown_away: user.thrown_away,
        }
    }
}

/// A follow of one of the caller's communities.
#[derive(Debug, Serialize)]
pub struct FollowView<'a> {
    id: Uuid,
    follower: &'a str,
    community: Community,
}

impl<'a> FollowView<'a> {
    /// Projects a follow, given the follower's name.
    pub fn new(follow: &Follow, follower: &'a str) -> FollowView<'a> {
        FollowView {
            id: follow.id,
            follower,
            community: follow.community,
        }
    }
}
