//! The fixed sets of values users and foods draw from.

string_enum! {
    /// A residential community a user can live in and follow.
    pub enum Community {
        Baker => "Baker",
        BurtonConner => "Burton Conner",
        EastCampus => "East Campus",
        MacGregor => "MacGregor",
        Maseeh => "Maseeh",
        McCormick => "McCormick",
        NewHouse => "New House",
        NewVassar => "New Vassar",
        NextHouse => "Next House",
        Random => "Random",
        Simmons => "Simmons",
        OffCampusCambridge => "Off-campus Cambridge",
        OffCampusBoston => "Off-campus Boston",
    }
}

string_enum! {
    /// An allergy. The spellings are the recipe provider's `intolerances` values.
    pub enum Allergy {
        Dairy => "Dairy",
        Egg => "Egg",
        Gluten => "Gluten",
        Grain => "Grain",
        Peanut => "Peanut",
        Seafood => "Seafood",
        Sesame => "Sesame",
        Shellfish => "Shellfish",
        Soy => "Soy",
        Sulfite => "Sulfite",
        TreeNut => "Tree Nut",
        Wheat => "Wheat",
    }
}

string_enum! {
    /// A dietary restriction other than an allergy. The spellings are the recipe provider's
    /// `diet` values.
    pub enum DietaryRestriction {
        GlutenFree => "Gluten Free",
        Ketogenic => "Ketogenic",
        Vegetarian => "Vegetarian",
        LactoVegetarian => "Lacto-Vegetarian",
        OvoVegetarian => "Ovo-Vegetarian",
        Vegan => "Vegan",
        Pescetarian => "Pescetarian",
        Paleo => "Paleo",
        Primal => "Primal",
        LowFodmap => "Low FODMAP",
        Whole30 => "Whole30",
    }
}

string_enum! {
    /// A kitchen measurement unit.
    pub enum Unit {
        Gallons => "gallons",
        Cups => "cups",
        Quarts => "quarts",
        Pints => "pints",
        Ounces => "oz",
        Grams => "g",
        Pounds => "lbs",
        Teaspoons => "tsps",
        Tablespoons => "tbsps",
        Sticks => "sticks",
    }
}
