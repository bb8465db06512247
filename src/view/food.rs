use crate::{
    logic::stockpile::Alerts,
    schema::{Food, Unit},
    view::format_date,
};
use chrono::{DateTime, Utc};
use chrono_humanize::HumanTime;
use serde_derive::Serialize;
use uuid::Uuid;

/// A food in the caller's stockpile.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodView<'a> {
    id: Uuid,
    owner: &'a str,
    date_created: String,
    name: &'a str,
    quantity: f64,
    unit: Option<Unit>,
    expiration: String,
    raw_expiration: DateTime<Utc>,
    expires: String,
    prepared: bool,
}

impl<'a> FoodView<'a> {
    /// Projects a food, given its owner's name.
    pub fn new(food: &'a Food, owner: &'a str, now: DateTime<Utc>) -> FoodView<'a> {
        FoodView {
            id: food.id,
            owner,
            date_created: format_date(food.created),
            name: &food.name,
            quantity: food.quantity,
            unit: food.unit,
            expiration: format_date(food.expiration),
            raw_expiration: food.expiration,
            expires: HumanTime::from(food.expiration - now).to_string(),
            prepared: food.prepared,
        }
    }

    /// Projects several foods with the same owner.
    pub fn all(foods: &'a [Food], owner: &'a str, now: DateTime<Utc>) -> Vec<FoodView<'a>> {
        foods
            .iter()
            .map(|food| FoodView::new(food, owner, now))
            .collect()
    }
}

/// The caller's stockpile, split up by expiration.
#[derive(Debug, Serialize)]
pub struct AlertsView<'a> {
    expired: Vec<FoodView<'a>>,
    expiring: Vec<FoodView<'a>>,
    remaining: Vec<FoodView<'a>>,
}

impl<'a> AlertsView<'a> {
    /// Projects the groups of a stockpile.
    pub fn new(alerts: &'a Alerts, owner: &'a str, now: DateTime<Utc>) -> AlertsView<'a> {
        AlertsView {
            expired: FoodView::all(&alerts.expired, owner, now),
            expiring: FoodView::all(&alerts.expiring, owner, now),
            remaining: FoodView::all(&alerts.remaining, owner, now),
        }
    }
}
