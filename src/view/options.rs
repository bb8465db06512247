use crate::schema::{Allergy, Community, DietaryRestriction, Unit};
use serde_derive::Serialize;

/// A community, and how many users follow it.
#[derive(Debug, Serialize)]
pub struct CommunityView {
    name: Community,
    followers: usize,
}

/// The fixed sets of values clients can pick from.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsView {
    communities: Vec<CommunityView>,
    allergies: &'static [Allergy],
    dietary_restrictions: &'static [DietaryRestriction],
    units: &'static [Unit],
}

impl OptionsView {
    /// Builds the options, given each community's follower count.
    pub fn new(sizes: &[(Community, usize)]) -> OptionsView {
        OptionsView {
            communities: sizes
                .iter()
                .map(|&(name, followers)| CommunityView { name, followers })
                .collect(),
            allergies: Allergy::ALL,
            dietary_restrictions: DietaryRestriction::ALL,
            units: Unit::ALL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashset;
    use std::collections::HashSet;

    #[test]
    fn lists_every_option() {
        let view = serde_json::to_value(OptionsView::new(&[
            (Community::Baker, 2),
            (Community::Simmons, 0),
        ]))
        .unwrap();

        assert_eq!(view["communities"][0]["name"], "Baker");
        assert_eq!(view["communities"][0]["followers"], 2);
        assert_eq!(view["communities"][1]["followers"], 0);

        let units = view["units"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|unit| unit.as_str())
            .collect::<HashSet<_>>();
        assert_eq!(
            units,
            hashset! {
                "gallons", "cups", "quarts", "pints", "oz", "g", "lbs", "tsps", "tbsps", "sticks",
            }
        );
        assert_eq!(
            view["dietaryRestrictions"].as_array().map(Vec::len),
            Some(DietaryRestriction::ALL.len())
        );
        assert_eq!(view["allergies"][10], "Tree Nut");
    }
}
