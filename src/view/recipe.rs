use crate::{
    logic::recipe::{AnnotatedIngredient, AnnotatedRecipe},
    schema::Food,
    view::format_date,
};
use chrono::{DateTime, Utc};
use serde_derive::Serialize;
use uuid::Uuid;

/// A stockpile food that matches an ingredient.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView<'a> {
    id: Uuid,
    name: &'a str,
    quantity: f64,
    expiration: String,
    raw_expiration: DateTime<Utc>,
}

impl<'a> From<&'a Food> for MatchView<'a> {
    fn from(food: &'a Food) -> MatchView<'a> {
        MatchView {
            id: food.id,
            name: &food.name,
            quantity: food.quantity,
            expiration: format_date(food.expiration),
            raw_expiration: food.expiration,
        }
    }
}

/// One ingredient of a recipe.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientView<'a> {
    id: i64,
    names: &'a [String],
    amount: f64,
    unit: &'a str,
    status: &'static str,
    stockpile_matches: Vec<MatchView<'a>>,
}

impl<'a> From<&'a AnnotatedIngredient> for IngredientView<'a> {
    fn from(ingredient: &'a AnnotatedIngredient) -> IngredientView<'a> {
        IngredientView {
            id: ingredient.ingredient.id,
            names: &ingredient.names,
            amount: ingredient.ingredient.amount,
            unit: &ingredient.ingredient.unit,
            status: if ingredient.used { "used" } else { "missing" },
            stockpile_matches: ingredient.matches.iter().map(MatchView::from).collect(),
        }
    }
}

/// A recipe suggestion.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeView<'a> {
    id: i64,
    name: &'a str,
    image_url: Option<&'a str>,
    ingredients: Vec<IngredientView<'a>>,
    instructions: Vec<&'a str>,
    source: Option<&'a str>,
    ready_in_minutes: Option<i64>,
    preparation_minutes: Option<i64>,
    cooking_minutes: Option<i64>,
    used_count: usize,
    expiring_count: usize,
    used_names: Vec<&'a str>,
}

impl<'a> From<&'a AnnotatedRecipe> for RecipeView<'a> {
    fn from(annotated: &'a AnnotatedRecipe) -> RecipeView<'a> {
        let recipe = &annotated.recipe;
        let instructions = recipe
            .analyzed_instructions
            .first()
            .map(|block| block.steps.iter().map(|s| s.step.as_str()).collect::<Vec<_>>())
            .unwrap_or_default();
        RecipeView {
            id: recipe.id,
            name: &recipe.title,
            image_url: recipe.image.as_ref().map(String::as_str),
            ingredients: annotated
                .ingredients
                .iter()
                .map(IngredientView::from)
                .collect(),
            instructions,
            source: recipe.source_url.as_ref().map(String::as_str),
            ready_in_minutes: recipe.ready_in_minutes,
            preparation_minutes: recipe.preparation_minutes,
            cooking_minutes: recipe.cooking_minutes,
            used_count: annotated.used_count,
            expiring_count: annotated.expiring_count,
            used_names: recipe
                .used_ingredients
                .iter()
                .map(|i| i.name.as_str())
                .collect(),
        }
    }
}
