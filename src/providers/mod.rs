use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub mod openfoodfacts;
pub mod usda;

pub use openfoodfacts::OpenFoodFactsProvider;
pub use usda::UsdaProvider;

pub const SOURCE_USDA: &str = "usda";
pub const SOURCE_OPENFOODFACTS: &str = "openfoodfacts";

/// Nutrition facts per 100g of an ingredient, as reported by one provider.
///
/// Every numeric field is independently optional: a provider may return
/// partial data, and a missing value is kept as `None` rather than zero.
/// Sodium is in mg as reported upstream; no unit conversion is applied.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct NutritionFacts {
    pub calories: Option<f32>,
    pub protein: Option<f32>,
    pub carbs: Option<f32>,
    pub fat: Option<f32>,
    pub fiber: Option<f32>,
    pub sugar: Option<f32>,
    pub sodium: Option<f32>,
    pub source: String,
}

/// Whether an ingredient name refers to a generic commodity ("chicken
/// breast") or a specific branded product ("Nutella"). Drives which
/// provider the resolver queries.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IngredientSpecificity {
    Generic,
    Specific,
}

impl IngredientSpecificity {
    /// Lenient parse: anything that is not recognizably "specific" is
    /// treated as `Generic`, including `None` and unknown strings.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("specific") => IngredientSpecificity::Specific,
            _ => IngredientSpecificity::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientSpecificity::Generic => "generic",
            IngredientSpecificity::Specific => "specific",
        }
    }
}

/// One candidate returned by a provider search, in upstream ranking order.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FoodMatch {
    pub id: String,
    pub name: String,
    pub nutrition_per_100g: Option<NutritionFacts>,
}

/// Capability implemented by each food-composition data source.
#[async_trait]
pub trait FoodDataProvider {
    /// Free-text search returning at most `limit` matches in the provider's
    /// relevance order; an upstream failure yields an empty list, never an
    /// error.
    async fn search(&self, name: &str, limit: usize) -> Vec<FoodMatch>;

    /// Fetch nutrition facts for a provider-specific id. `None` on any
    /// failure or when the id is unknown.
    async fn get_nutrition_data(&self, id: &str) -> Option<NutritionFacts>;

    /// Normalize an ingredient phrase before searching.
    fn clean_ingredient_name(&self, name: &str) -> String;
}

/// Filler/marketing adjectives stripped from ingredient phrases before
/// searching commodity databases. The core noun is never on this list.
const FILLER_WORDS: &[&str] = &[
    "fresh",
    "organic",
    "grilled",
    "roasted",
    "baked",
    "boiled",
    "steamed",
    "fried",
    "raw",
    "cooked",
    "chopped",
    "diced",
    "sliced",
    "minced",
    "shredded",
    "crushed",
    "large",
    "medium",
    "small",
    "ripe",
    "lean",
    "premium",
    "natural",
    "homemade",
    "skinless",
    "boneless",
];

fn parenthetical_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\([^)]*\)").expect("parenthetical pattern is valid"))
}

/// Strips parenthetical qualifiers and stoplisted adjectives from an
/// ingredient phrase, case-insensitively.
///
/// "Fresh Chicken Breast (boneless)" becomes "chicken breast". If filtering
/// would remove every word, the unfiltered (lowercased) phrase is returned
/// instead so the core noun survives.
pub fn clean_ingredient_name(name: &str) -> String {
    let without_parens = parenthetical_regex().replace_all(name, " ");
    let lowered = without_parens.to_lowercase();

    let kept: Vec<&str> = lowered
        .split_whitespace()
        .filter(|word| {
            let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
            !FILLER_WORDS.contains(&bare)
        })
        .collect();

    if kept.is_empty() {
        lowered.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        kept.join(" ")
    }
}
