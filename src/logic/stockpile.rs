//! Sorting a stockpile by how soon it needs eating.

use crate::{dal::Store, logic::validate, schema::Food};
use chrono::{DateTime, Utc};
use failure::Fallible;
use uuid::Uuid;

/// A stockpile, split up by expiration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Alerts {
    /// Foods that have already expired.
    pub expired: Vec<Food>,

    /// Foods that expire within the expiring window.
    pub expiring: Vec<Food>,

    /// Everything else.
    pub remaining: Vec<Food>,
}

/// Splits foods up by expiration, keeping their order within each group.
pub fn classify(foods: Vec<Food>, now: DateTime<Utc>) -> Alerts {
    let mut alerts = Alerts::default();
    for food in foods {
        if food.is_expired(now) {
            alerts.expired.push(food);
        } else if food.is_expiring(now) {
            alerts.expiring.push(food);
        } else {
            alerts.remaining.push(food);
        }
    }
    alerts
}

/// The foods that can go into a recipe: raw ingredients that haven't expired.
pub fn usable(foods: Vec<Food>, now: DateTime<Utc>) -> Vec<Food> {
    foods
        .into_iter()
        .filter(|food| !food.prepared && !food.is_expired(now))
        .collect()
}

/// Gets the caller's stockpile, split up by expiration.
pub fn alerts<S: Store>(store: &S, me: Option<Uuid>, now: DateTime<Utc>) -> Fallible<Alerts> {
    let me = validate::logged_in(me)?;
    Ok(classify(store.find_foods_for_user(me)?, now))
}
