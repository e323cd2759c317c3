use serde::{Deserialize, Serialize};

use crate::verification::{MealIngredient, VerificationResult, VerifiedIngredient};

pub const SOURCE_AI_ESTIMATE: &str = "ai_estimate";
pub const SOURCE_OPENFOODFACTS_VERIFIED: &str = "openfoodfacts_verified";

const NOTE_NUTRITION_INCOMPLETE: &str = "Ingredients matched but nutrition data incomplete";

/// An AI-estimated meal. The four macro fields are subject to correction;
/// everything else, including arbitrary metadata flattened into `extra`,
/// passes through corrections unchanged.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MealEstimate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub calories: f32,
    #[serde(default)]
    pub protein_grams: f32,
    #[serde(default)]
    pub carbs_grams: f32,
    #[serde(default)]
    pub fat_grams: f32,
    #[serde(default)]
    pub ingredients: Vec<MealIngredient>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The four macros as one value, used for the original/verified snapshots.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MacroValues {
    pub calories: f32,
    pub protein_grams: f32,
    pub carbs_grams: f32,
    pub fat_grams: f32,
}

impl MacroValues {
    fn of(meal: &MealEstimate) -> Self {
        Self {
            calories: meal.calories,
            protein_grams: meal.protein_grams,
            carbs_grams: meal.carbs_grams,
            fat_grams: meal.fat_grams,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// One blended nutrient: what the AI said, what verification said, what was
/// kept, and how far apart they were.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CorrectionEntry {
    pub original: f32,
    pub verified: f32,
    pub corrected: f32,
    pub discrepancy_percent: f32,
}

/// Only the nutrients that were actually blended carry an entry.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CorrectionsApplied {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<CorrectionEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<CorrectionEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs: Option<CorrectionEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat: Option<CorrectionEntry>,
}

/// Provenance and confidence metadata attached to a corrected meal,
/// persisted downstream as opaque JSON.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CorrectionRecord {
    pub verified: bool,
    pub verification_rate: f32,
    pub confidence: Confidence,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_ai_values: Option<MacroValues>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_values: Option<MacroValues>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrections_applied: Option<CorrectionsApplied>,
    pub verified_ingredients: Vec<VerifiedIngredient>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CorrectedMeal {
    pub meal: MealEstimate,
    pub correction: CorrectionRecord,
}

/// Correction thresholds, named and tunable rather than buried in the code.
#[derive(Debug, Clone)]
pub struct CorrectionConfig {
    /// Discrepancy (percent) above which a macro is blended.
    pub discrepancy_threshold_percent: f32,
    /// Verification rate below which the AI estimate is kept untouched.
    pub min_confidence_rate: f32,
    /// Weight of the AI estimate in the blend; the verified average gets
    /// the remainder.
    pub ai_blend_weight: f32,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            discrepancy_threshold_percent: 15.0,
            min_confidence_rate: 0.3,
            ai_blend_weight: 0.7,
        }
    }
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// Mean calories/protein/carbs/fat across matched ingredients that carry a
/// nutrition record. A missing field contributes 0.0 to the sum but the
/// ingredient stays in the denominator. `None` when no matched ingredient
/// has nutrition data at all.
fn verified_average(ingredients: &[VerifiedIngredient]) -> Option<MacroValues> {
    let with_data: Vec<_> = ingredients
        .iter()
        .filter(|ingredient| ingredient.matched)
        .filter_map(|ingredient| ingredient.nutrition_per_100g.as_ref())
        .collect();

    if with_data.is_empty() {
        return None;
    }
    let count = with_data.len() as f32;

    Some(MacroValues {
        calories: with_data.iter().map(|n| n.calories.unwrap_or(0.0)).sum::<f32>() / count,
        protein_grams: with_data.iter().map(|n| n.protein.unwrap_or(0.0)).sum::<f32>() / count,
        carbs_grams: with_data.iter().map(|n| n.carbs.unwrap_or(0.0)).sum::<f32>() / count,
        fat_grams: with_data.iter().map(|n| n.fat.unwrap_or(0.0)).sum::<f32>() / count,
    })
}

/// Discrepancy-driven blend of one macro.
///
/// AI values already fold in portion size and preparation, which a raw
/// per-100g average does not, so a large discrepancy pulls the value toward
/// the verified number rather than replacing it. A non-positive AI value has
/// nothing to anchor on and is replaced outright.
fn correct_macro(
    ai_value: f32,
    verified_value: f32,
    config: &CorrectionConfig,
) -> (f32, Option<CorrectionEntry>) {
    if ai_value <= 0.0 {
        let entry = CorrectionEntry {
            original: ai_value,
            verified: verified_value,
            corrected: verified_value,
            discrepancy_percent: 100.0,
        };
        return (verified_value, Some(entry));
    }

    let discrepancy = (ai_value - verified_value).abs() / ai_value * 100.0;
    if discrepancy > config.discrepancy_threshold_percent {
        let corrected = round2(
            ai_value * config.ai_blend_weight + verified_value * (1.0 - config.ai_blend_weight),
        );
        let entry = CorrectionEntry {
            original: ai_value,
            verified: verified_value,
            corrected,
            discrepancy_percent: round2(discrepancy),
        };
        (corrected, Some(entry))
    } else {
        (ai_value, None)
    }
}

fn uncorrected(
    meal: &MealEstimate,
    verification: &VerificationResult,
    confidence: Confidence,
    note: Option<String>,
) -> CorrectedMeal {
    CorrectedMeal {
        meal: meal.clone(),
        correction: CorrectionRecord {
            verified: false,
            verification_rate: verification.verification_rate,
            confidence,
            source: SOURCE_AI_ESTIMATE.to_string(),
            note,
            original_ai_values: None,
            verified_values: None,
            corrections_applied: None,
            verified_ingredients: verification.verified_ingredients.clone(),
        },
    }
}

/// Corrects a meal's macros against its verification result. Pure: the input
/// meal is never mutated and every non-macro field is carried over as-is.
pub fn correct_meal(
    meal: &MealEstimate,
    verification: &VerificationResult,
    config: &CorrectionConfig,
) -> CorrectedMeal {
    // Tier 1: verification too weak, keep the AI estimate untouched.
    if !verification.verification_success
        || verification.verification_rate < config.min_confidence_rate
    {
        return uncorrected(meal, verification, Confidence::Low, None);
    }

    // Tier 2: ingredients matched, but none brought usable nutrition data.
    let Some(average) = verified_average(&verification.verified_ingredients) else {
        return uncorrected(
            meal,
            verification,
            Confidence::Medium,
            Some(NOTE_NUTRITION_INCOMPLETE.to_string()),
        );
    };

    // Tier 3: blend per macro.
    let original = MacroValues::of(meal);
    let (calories, calories_entry) = correct_macro(meal.calories, average.calories, config);
    let (protein, protein_entry) = correct_macro(meal.protein_grams, average.protein_grams, config);
    let (carbs, carbs_entry) = correct_macro(meal.carbs_grams, average.carbs_grams, config);
    let (fat, fat_entry) = correct_macro(meal.fat_grams, average.fat_grams, config);

    let mut corrected = meal.clone();
    corrected.calories = calories;
    corrected.protein_grams = protein;
    corrected.carbs_grams = carbs;
    corrected.fat_grams = fat;

    CorrectedMeal {
        meal: corrected,
        correction: CorrectionRecord {
            verified: true,
            verification_rate: verification.verification_rate,
            confidence: Confidence::High,
            source: SOURCE_OPENFOODFACTS_VERIFIED.to_string(),
            note: None,
            original_ai_values: Some(original),
            verified_values: Some(average),
            corrections_applied: Some(CorrectionsApplied {
                calories: calories_entry,
                protein: protein_entry,
                carbs: carbs_entry,
                fat: fat_entry,
            }),
            verified_ingredients: verification.verified_ingredients.clone(),
        },
    }
}
