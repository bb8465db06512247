use crate::{
    schema::{Community, Listing, Unit, User},
    view::format_date,
};
use chrono::{DateTime, Utc};
use serde_derive::Serialize;
use uuid::Uuid;

/// One of the caller's own listings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyListingView<'a> {
    id: Uuid,
    username: &'a str,
    food_id: Uuid,
    date_created: String,
    quantity: f64,
    price: &'a str,
    name: &'a str,
    unit: Option<Unit>,
    expiration: String,
    raw_expiration: DateTime<Utc>,
}

impl<'a> MyListingView<'a> {
    /// Projects a listing, given its poster's name.
    pub fn new(listing: &'a Listing, username: &'a str) -> MyListingView<'a> {
        MyListingView {
            id: listing.id,
            username,
            food_id: listing.food,
            date_created: format_date(listing.created),
            quantity: listing.quantity,
            price: &listing.price,
            name: &listing.name,
            unit: listing.unit,
            expiration: format_date(listing.expiration),
            raw_expiration: listing.expiration,
        }
    }
}

/// A listing, as the poster's neighbors see it: with a way to get in touch, and without the food
/// it was made from.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView<'a> {
    id: Uuid,
    username: &'a str,
    email: &'a str,
    community: Community,
    date_created: String,
    quantity: f64,
    price: &'a str,
    name: &'a str,
    unit: Option<Unit>,
    expiration: String,
    raw_expiration: DateTime<Utc>,
}

impl<'a> ListingView<'a> {
    /// Projects a listing, given its poster.
    pub fn new(listing: &'a Listing, poster: &'a User) -> ListingView<'a> {
        ListingView {
            id: listing.id,
            username: &poster.name,
            email: &poster.email,
            community: poster.home_community,
            date_created: format_date(listing.created),
            quantity: listing.quantity,
            price: &listing.price,
            name: &listing.name,
            unit: listing.unit,
            expiration: format_date(listing.expiration),
            raw_expiration: listing.expiration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn listing() -> Listing {
        Listing {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            food: Uuid::new_v4(),
            created: Utc.ymd(2022, 11, 20).and_hms(9, 0, 0),
            quantity: 1.0,
            price: "Free".to_string(),
            name: "Eggs".to_string(),
            unit: None,
            expiration: Utc.ymd(2022, 11, 22).and_hms(23, 59, 59),
        }
    }

    #[test]
    fn public_listings_show_contact_details_but_not_the_food() {
        let listing = listing();
        let poster = User {
            id: listing.owner,
            name: "bob".to_string(),
            password_hash: "hash".to_string(),
            email: "bob@mit.edu".to_string(),
            allergies: vec![],
            restrictions: vec![],
            home_community: Community::NewHouse,
            num_food: 1,
            thrown_away: 0,
        };

        let view = serde_json::to_value(ListingView::new(&listing, &poster)).unwrap();
        assert_eq!(view["username"], "bob");
        assert_eq!(view["email"], "bob@mit.edu");
        assert_eq!(view["community"], "New House");
        assert_eq!(view["expiration"], "November 22nd 2022");
        assert!(view.get("foodId").is_none());
        assert!(view.get("passwordHash").is_none());

        let mine = serde_json::to_value(MyListingView::new(&listing, "bob")).unwrap();
        assert_eq!(mine["foodId"], listing.food.to_string());
        assert_eq!(mine["dateCreated"], "November 20th 2022");
        assert!(mine["unit"].is_null());
        assert!(mine.get("email").is_none());
    }
}
