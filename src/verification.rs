use serde::{Deserialize, Serialize};

use crate::providers::{IngredientSpecificity, NutritionFacts};
use crate::resolver::NutritionSource;

/// An ingredient as listed on an AI-estimated meal, before verification.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MealIngredient {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specificity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
}

/// Per-ingredient verification outcome. Unmatched ingredients are retained
/// with `matched = false`; the list is append-only and never re-ordered.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VerifiedIngredient {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    pub specificity: String,
    pub nutrition_per_100g: Option<NutritionFacts>,
    pub matched: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VerificationResult {
    pub verified_ingredients: Vec<VerifiedIngredient>,
    pub total_verified: usize,
    pub verification_success: bool,
    pub verification_rate: f32,
    pub primary_source: String,
}

/// Rate a verification pass must exceed (strictly) to count as successful.
pub const DEFAULT_SUCCESS_THRESHOLD: f32 = 0.5;

/// Reported as `primary_source` when no ingredient matched.
pub const MIXED_SOURCE: &str = "mixed";

/// Verifies a meal's ingredients against a `NutritionSource` and aggregates
/// the outcome. Lookups run sequentially in input order; a failed or empty
/// lookup marks the ingredient unmatched and never aborts the pass.
pub struct IngredientVerifier<R: NutritionSource> {
    source: R,
    success_threshold: f32,
}

impl<R: NutritionSource> IngredientVerifier<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
        }
    }

    pub fn with_success_threshold(source: R, success_threshold: f32) -> Self {
        Self {
            source,
            success_threshold,
        }
    }

    pub async fn verify(&self, ingredients: &[MealIngredient]) -> VerificationResult {
        let mut verified = Vec::with_capacity(ingredients.len());

        for ingredient in ingredients {
            let specificity =
                IngredientSpecificity::parse_lenient(ingredient.specificity.as_deref());

            let matches = self
                .source
                .search_with_specificity(
                    &ingredient.name,
                    specificity,
                    ingredient.barcode.as_deref(),
                )
                .await;

            // Providers rank by relevance; the first match is the best match.
            let best = matches.into_iter().next();
            let (matched, nutrition_per_100g) = match best {
                Some(food_match) => (true, food_match.nutrition_per_100g),
                None => (false, None),
            };

            verified.push(VerifiedIngredient {
                name: ingredient.name.clone(),
                quantity: ingredient.quantity.clone(),
                specificity: specificity.as_str().to_string(),
                nutrition_per_100g,
                matched,
            });
        }

        self.aggregate(verified, ingredients.len())
    }

    fn aggregate(
        &self,
        verified_ingredients: Vec<VerifiedIngredient>,
        total_count: usize,
    ) -> VerificationResult {
        let matched_count = verified_ingredients
            .iter()
            .filter(|ingredient| ingredient.matched)
            .count();

        let verification_rate = if total_count == 0 {
            0.0
        } else {
            matched_count as f32 / total_count as f32
        };

        VerificationResult {
            primary_source: primary_source(&verified_ingredients),
            verified_ingredients,
            total_verified: matched_count,
            verification_success: verification_rate > self.success_threshold,
            verification_rate,
        }
    }
}

/// The modal `source` among matched ingredients' nutrition records, with
/// ties resolved to the source seen first. `"mixed"` when nothing matched.
fn primary_source(ingredients: &[VerifiedIngredient]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for ingredient in ingredients {
        if !ingredient.matched {
            continue;
        }
        let Some(nutrition) = &ingredient.nutrition_per_100g else {
            continue;
        };
        match counts.iter_mut().find(|(source, _)| *source == nutrition.source) {
            Some(entry) => entry.1 += 1,
            None => counts.push((&nutrition.source, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (source, count) in counts {
        match best {
            // Strictly greater keeps the first-seen source on ties.
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((source, count)),
        }
    }

    match best {
        Some((source, _)) => source.to_string(),
        None => MIXED_SOURCE.to_string(),
    }
}
