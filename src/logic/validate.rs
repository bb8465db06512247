//! Validators. Each either returns the validated (and usually parsed) value, or fails with an
//! `ApiError` describing what the caller got wrong. Handlers run them in order and stop at the
//! first failure, before touching any store.

use crate::{
    dal::Store,
    schema::{
        Allergy, ApiError, Community, DietaryRestriction, Follow, Food, Listing, Unit,
    },
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use failure::Fallible;
use lazy_static::lazy_static;
use regex::Regex;
use serde_derive::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

lazy_static! {
    static ref USERNAME: Regex = Regex::new(r"^\w+$").unwrap();
    static ref PASSWORD: Regex = Regex::new(r"^\S+$").unwrap();
    static ref EMAIL: Regex =
        Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").unwrap();
    static ref EXPIRATION: Regex = Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap();
}

fn bad_request<T>(msg: &str) -> Fallible<T> {
    Err(ApiError::BadRequest(msg.to_string()).into())
}

/// A quantity as it appears in a request body. Clients send either a JSON number or a string,
/// which may be a fraction like `"1/2"`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum QuantityInput {
    /// A plain number.
    Number(f64),

    /// A number, decimal, or fraction, as text.
    Text(String),
}

impl QuantityInput {
    /// Evaluates the quantity, if it's well-formed.
    fn evaluate(&self) -> Option<f64> {
        match *self {
            QuantityInput::Number(n) => Some(n),
            QuantityInput::Text(ref s) => {
                let s = s.trim();
                match s.find('/') {
                    Some(i) => {
                        let num = s[..i].trim().parse::<f64>().ok()?;
                        let den = s[i + 1..].trim().parse::<f64>().ok()?;
                        if den == 0.0 {
                            None
                        } else {
                            Some(num / den)
                        }
                    }
                    None => s.parse().ok(),
                }
            }
        }
    }
}

/// Checks that the caller is signed in, returning their ID.
pub fn logged_in(me: Option<Uuid>) -> Fallible<Uuid> {
    me.ok_or_else(|| {
        ApiError::Forbidden("You must be logged in to complete this action.".to_string()).into()
    })
}

/// Checks that the caller isn't signed in.
pub fn logged_out(me: Option<Uuid>) -> Fallible<()> {
    match me {
        Some(_) => Err(ApiError::Forbidden("You are already signed in.".to_string()).into()),
        None => Ok(()),
    }
}

/// Checks that a username is non-empty and alphanumeric (underscores allowed).
pub fn username(name: &str) -> Fallible<String> {
    let name = name.trim();
    if USERNAME.is_match(name) {
        Ok(name.to_string())
    } else {
        bad_request("Username must be a nonempty alphanumeric string.")
    }
}

/// Checks that a password is non-empty and has no whitespace.
pub fn password(password: &str) -> Fallible<()> {
    if PASSWORD.is_match(password) {
        Ok(())
    } else {
        bad_request("Password must be a nonempty string.")
    }
}

/// Checks that an email address looks like one.
pub fn email(email: &str) -> Fallible<String> {
    let email = email.trim();
    if EMAIL.is_match(email) {
        Ok(email.to_string())
    } else {
        bad_request("You must provide a valid email address.")
    }
}

/// Checks that a home community is one of the known ones.
pub fn home_community(name: &str) -> Fallible<Community> {
    name.parse().or_else(|_| {
        bad_request("Home Community must be a valid living community at or near MIT.")
    })
}

/// Checks that a community named in a path is one of the known ones.
pub fn community_name(name: &str) -> Fallible<Community> {
    name.parse()
        .or_else(|_| bad_request(&format!("{} is not a valid communityName.", name)))
}

/// Parses each value, dropping repeats but keeping the order they were first given in.
fn all_of<T: FromStr + PartialEq>(values: &[String], msg: &str) -> Fallible<Vec<T>> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        match value.parse() {
            Ok(value) => {
                if !out.contains(&value) {
                    out.push(value);
                }
            }
            Err(_) => return bad_request(msg),
        }
    }
    Ok(out)
}

/// Checks that every allergy is a known one.
pub fn allergies(values: &[String]) -> Fallible<Vec<Allergy>> {
    all_of(values, "All allergies must be valid allergies.")
}

/// Checks that every dietary restriction is a known one.
pub fn restrictions(values: &[String]) -> Fallible<Vec<DietaryRestriction>> {
    all_of(values, "All dietary restrictions must be valid restrictions.")
}

/// Checks that no other user has the given username, ignoring case.
pub fn username_not_in_use<S: Store>(store: &S, name: &str, me: Option<Uuid>) -> Fallible<()> {
    match store.find_user_by_username(name)? {
        Some(ref user) if Some(user.id) != me => Err(ApiError::Conflict(
            "An account with this username already exists.".to_string(),
        )
        .into()),
        _ => Ok(()),
    }
}

/// Checks that a food name isn't blank.
pub fn food_name(name: &str) -> Fallible<String> {
    let name = name.trim();
    if name.is_empty() {
        bad_request("Food name must be at least one character long.")
    } else {
        Ok(name.to_string())
    }
}

/// Checks that a food search isn't blank.
pub fn food_query(query: &str) -> Fallible<String> {
    let query = query.trim();
    if query.is_empty() {
        bad_request("Food name query must be nonempty.")
    } else {
        Ok(query.to_string())
    }
}

/// Checks that a quantity evaluates to a positive number.
pub fn quantity(quantity: &QuantityInput) -> Fallible<f64> {
    match quantity.evaluate() {
        Some(q) if q.is_finite() && q > 0.0 => Ok(q),
        _ => bad_request("Quantity must be a number greater than 0."),
    }
}

/// Checks that an expiration date is formatted `MM/DD/YYYY`, and that the end of that day is
/// after `now`. Returns the end of the day.
pub fn expiration(date: &str, now: DateTime<Utc>) -> Fallible<DateTime<Utc>> {
    let date = date.trim();
    if !EXPIRATION.is_match(date) {
        return bad_request("Expiration Date must be in the format MM/DD/YYYY.");
    }
    let date = match NaiveDate::parse_from_str(date, "%m/%d/%Y") {
        Ok(date) => date,
        Err(_) => return bad_request("Provided date is not valid."),
    };
    let expiration = Utc.from_utc_datetime(&date.and_hms(23, 59, 59));
    if expiration <= now {
        bad_request("Provided date is not valid.")
    } else {
        Ok(expiration)
    }
}

/// Checks that a unit is one of the known ones. No unit and an empty unit both mean "none".
pub fn unit(unit: Option<&str>) -> Fallible<Option<Unit>> {
    match unit.map(str::trim) {
        None | Some("") => Ok(None),
        Some(unit) => unit
            .parse()
            .map(Some)
            .or_else(|_| bad_request(&format!("{} is not a valid unit.", unit))),
    }
}

fn parse_id(id: &str, not_found: impl FnOnce() -> String) -> Fallible<Uuid> {
    id.parse()
        .map_err(|_| ApiError::NotFound(not_found()).into())
}

/// Checks that the food exists.
pub fn food_exists<S: Store>(store: &S, id: &str) -> Fallible<Food> {
    let not_found = || format!("Food with food ID {} does not exist.", id);
    let food_id = parse_id(id, not_found)?;
    store
        .find_food(food_id)?
        .ok_or_else(|| ApiError::NotFound(not_found()).into())
}

/// Checks that the caller owns the food.
pub fn food_modifier(me: Uuid, food: &Food) -> Fallible<()> {
    if food.owner == me {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Cannot modify other users' foods.".to_string()).into())
    }
}

/// Checks that the listing exists.
pub fn listing_exists<S: Store>(store: &S, id: &str) -> Fallible<Listing> {
    let not_found = || format!("Listing with listing ID {} does not exist.", id);
    let listing_id = parse_id(id, not_found)?;
    store
        .find_listing(listing_id)?
        .ok_or_else(|| ApiError::NotFound(not_found()).into())
}

/// Checks that the caller posted the listing.
pub fn listing_modifier(me: Uuid, listing: &Listing) -> Fallible<()> {
    if listing.owner == me {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Cannot modify other users' listings.".to_string()).into())
    }
}

/// Checks that a listing wouldn't offer more of the food than there is.
pub fn listing_quantity(quantity: f64, food: &Food) -> Fallible<()> {
    if quantity > food.quantity {
        Err(ApiError::CapacityExceeded(
            "You cannot list a higher quantity of a food than you have in your stockpile."
                .to_string(),
        )
        .into())
    } else {
        Ok(())
    }
}

/// Checks that the food isn't listed yet.
pub fn not_listed<S: Store>(store: &S, food: &Food) -> Fallible<()> {
    match store.find_listing_by_food(food.id)? {
        Some(_) => Err(ApiError::Conflict(format!(
            "A listing for food with food ID {} already exists.",
            food.id
        ))
        .into()),
        None => Ok(()),
    }
}

/// Checks that the caller doesn't follow the community yet.
pub fn not_repeat_follow<S: Store>(store: &S, me: Uuid, community: Community) -> Fallible<()> {
    match store.find_follow_for(me, community)? {
        Some(_) => Err(ApiError::Conflict(format!(
            "Follow between current user and {} already exists.",
            community
        ))
        .into()),
        None => Ok(()),
    }
}

/// Checks that the caller follows the community.
pub fn follow_exists<S: Store>(store: &S, me: Uuid, community: Community) -> Fallible<Follow> {
    store.find_follow_for(me, community)?.ok_or_else(|| {
        ApiError::NotFound(format!(
            "Follow between current user and {} does not exist.",
            community
        ))
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn is_bad_request<T: std::fmt::Debug>(r: Fallible<T>) -> bool {
        match r {
            Err(err) => match err.downcast_ref::<ApiError>() {
                Some(ApiError::BadRequest(_)) => true,
                _ => false,
            },
            Ok(_) => false,
        }
    }

    #[test]
    fn quantities() {
        let text = |s: &str| QuantityInput::Text(s.to_string());
        assert_eq!(quantity(&text("1/2")).unwrap(), 0.5);
        assert_eq!(quantity(&text(" 3 ")).unwrap(), 3.0);
        assert_eq!(quantity(&text("2.25")).unwrap(), 2.25);
        assert_eq!(quantity(&QuantityInput::Number(4.0)).unwrap(), 4.0);

        assert!(is_bad_request(quantity(&text("0"))));
        assert!(is_bad_request(quantity(&text("-1"))));
        assert!(is_bad_request(quantity(&text("1/0"))));
        assert!(is_bad_request(quantity(&text("a/b"))));
        assert!(is_bad_request(quantity(&text(""))));
        assert!(is_bad_request(quantity(&text("inf"))));
        assert!(is_bad_request(quantity(&QuantityInput::Number(-0.5))));
    }

    #[test]
    fn quantities_deserialize_from_numbers_or_strings() {
        let q: QuantityInput = serde_json::from_str("2").unwrap();
        assert_eq!(q, QuantityInput::Number(2.0));
        let q: QuantityInput = serde_json::from_str(r#""1/3""#).unwrap();
        assert_eq!(q, QuantityInput::Text("1/3".to_string()));
    }

    #[test]
    fn expirations_are_normalized_to_the_end_of_the_day() {
        let now = Utc.ymd(2022, 11, 20).and_hms(15, 30, 0);
        assert_eq!(
            expiration("11/21/2022", now).unwrap(),
            Utc.ymd(2022, 11, 21).and_hms(23, 59, 59)
        );
        // Today hasn't ended yet.
        assert_eq!(
            expiration("11/20/2022", now).unwrap(),
            now + Duration::hours(8) + Duration::minutes(29) + Duration::seconds(59)
        );

        assert!(is_bad_request(expiration("11/19/2022", now)));
        assert!(is_bad_request(expiration("2022-11-21", now)));
        assert!(is_bad_request(expiration("1/21/2022", now)));
        assert!(is_bad_request(expiration("13/01/2023", now)));
        assert!(is_bad_request(expiration("02/30/2023", now)));
    }

    #[test]
    fn user_fields() {
        assert_eq!(username(" alice_1 ").unwrap(), "alice_1");
        assert!(is_bad_request(username("")));
        assert!(is_bad_request(username("alice smith")));
        assert!(is_bad_request(username("alice!")));

        assert!(password("hunter2").is_ok());
        assert!(is_bad_request(password("")));
        assert!(is_bad_request(password("hunter 2")));

        assert!(email("alice@mit.edu").is_ok());
        assert!(email("alice.smith@csail.mit.edu").is_ok());
        assert!(is_bad_request(email("alice")));
        assert!(is_bad_request(email("alice@mit")));

        assert_eq!(home_community("Baker").unwrap(), Community::Baker);
        assert!(is_bad_request(home_community("baker")));

        let allergy_names = vec!["Dairy".to_string(), "Tree Nut".to_string()];
        assert_eq!(
            allergies(&allergy_names).unwrap(),
            vec![Allergy::Dairy, Allergy::TreeNut]
        );
        assert!(is_bad_request(allergies(&["Cats".to_string()])));
        assert!(is_bad_request(restrictions(&["Carnivore".to_string()])));
    }

    #[test]
    fn repeated_options_are_kept_once() {
        let names = ["Dairy", "Egg", "Dairy", "Dairy"]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();
        assert_eq!(allergies(&names).unwrap(), vec![Allergy::Dairy, Allergy::Egg]);

        let names = vec!["Vegan".to_string(), "Vegan".to_string()];
        assert_eq!(
            restrictions(&names).unwrap(),
            vec![DietaryRestriction::Vegan]
        );
    }

    #[test]
    fn units() {
        assert_eq!(unit(None).unwrap(), None);
        assert_eq!(unit(Some("")).unwrap(), None);
        assert_eq!(unit(Some("gallons")).unwrap(), Some(Unit::Gallons));
        assert!(is_bad_request(unit(Some("furlongs"))));
    }

    #[test]
    fn auth_state() {
        let me = Uuid::new_v4();
        assert_eq!(logged_in(Some(me)).unwrap(), me);
        assert!(logged_in(None).is_err());
        assert!(logged_out(None).is_ok());
        assert!(logged_out(Some(me)).is_err());
    }
}
