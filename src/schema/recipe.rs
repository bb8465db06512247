//! Recipe records as the recipe provider sends them.

use serde_derive::Deserialize;

/// A page of search results.
#[derive(Clone, Debug, Deserialize)]
pub struct SearchResults {
    /// The recipes found.
    #[serde(default)]
    pub results: Vec<ProviderRecipe>,
}

/// A recipe, with its ingredients and instructions filled in.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderRecipe {
    /// The provider's ID for the recipe.
    pub id: i64,

    /// The recipe's title.
    pub title: String,

    /// A URL of a picture of the dish.
    pub image: Option<String>,

    /// Every ingredient the recipe calls for.
    pub extended_ingredients: Vec<ProviderIngredient>,

    /// The ingredients the provider matched against `includeIngredients`.
    pub used_ingredients: Vec<ProviderIngredient>,

    /// Step-by-step instructions, in blocks.
    pub analyzed_instructions: Vec<InstructionBlock>,

    /// Where the recipe was originally published.
    pub source_url: Option<String>,

    /// Total time to make the dish.
    pub ready_in_minutes: Option<i64>,

    /// Time spent preparing, if known.
    pub preparation_minutes: Option<i64>,

    /// Time spent cooking, if known.
    pub cooking_minutes: Option<i64>,
}

/// One ingredient of a recipe.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderIngredient {
    /// The provider's ID for the ingredient.
    pub id: i64,

    /// The name as written in the recipe.
    pub name: String,

    /// A normalized name, which may differ from `name`.
    pub name_clean: Option<String>,

    /// How much of the ingredient is needed.
    pub amount: f64,

    /// The unit `amount` is measured in.
    pub unit: String,
}

/// A block of instruction steps.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct InstructionBlock {
    /// The steps, in order.
    pub steps: Vec<InstructionStep>,
}

/// A single instruction step.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct InstructionStep {
    /// What to do.
    pub step: String,
}
