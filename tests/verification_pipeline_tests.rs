use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;

use meal_verify::correction::{correct_meal, Confidence, CorrectionConfig, MealEstimate};
use meal_verify::providers::{FoodMatch, IngredientSpecificity, NutritionFacts};
use meal_verify::resolver::NutritionSource;
use meal_verify::verification::IngredientVerifier;

/// Canned nutrition source: records nothing, answers from a fixed table
/// keyed by ingredient name (or barcode when one is given).
struct FixtureSource {
    by_name: HashMap<String, Vec<FoodMatch>>,
    by_barcode: HashMap<String, Vec<FoodMatch>>,
}

impl FixtureSource {
    fn new() -> Self {
        Self {
            by_name: HashMap::new(),
            by_barcode: HashMap::new(),
        }
    }

    fn with_name(mut self, name: &str, matches: Vec<FoodMatch>) -> Self {
        self.by_name.insert(name.to_string(), matches);
        self
    }

    fn with_barcode(mut self, barcode: &str, matches: Vec<FoodMatch>) -> Self {
        self.by_barcode.insert(barcode.to_string(), matches);
        self
    }
}

#[async_trait]
impl NutritionSource for FixtureSource {
    async fn search_with_specificity(
        &self,
        name: &str,
        _specificity: IngredientSpecificity,
        barcode: Option<&str>,
    ) -> Vec<FoodMatch> {
        if let Some(code) = barcode {
            return self.by_barcode.get(code).cloned().unwrap_or_default();
        }
        self.by_name.get(name).cloned().unwrap_or_default()
    }

    fn clean_ingredient_name(&self, name: &str) -> String {
        name.to_lowercase()
    }
}

fn usda_match(id: &str, calories: f32, protein: f32, carbs: f32, fat: f32) -> FoodMatch {
    FoodMatch {
        id: id.to_string(),
        name: id.to_string(),
        nutrition_per_100g: Some(NutritionFacts {
            calories: Some(calories),
            protein: Some(protein),
            carbs: Some(carbs),
            fat: Some(fat),
            source: "usda".to_string(),
            ..Default::default()
        }),
    }
}

fn meal_json() -> serde_json::Value {
    serde_json::json!({
        "name": "Chicken and rice",
        "description": "Simple dinner",
        "calories": 400.0,
        "protein_grams": 35.0,
        "carbs_grams": 45.0,
        "fat_grams": 10.0,
        "ingredients": [
            { "name": "chicken breast", "quantity": "150g", "specificity": "generic" },
            { "name": "white rice", "quantity": "100g", "specificity": "generic" },
            { "name": "mystery sauce", "quantity": "1 tbsp" }
        ],
        "portion_size": "1 plate",
        "prep_time_minutes": 30
    })
}

#[tokio::test]
async fn test_verify_then_correct_high_confidence() {
    let source = FixtureSource::new()
        .with_name("chicken breast", vec![usda_match("171077", 165.0, 31.0, 0.0, 3.6)])
        .with_name("white rice", vec![usda_match("169756", 130.0, 2.7, 28.0, 0.3)]);

    let meal: MealEstimate = serde_json::from_value(meal_json()).expect("meal parses");
    let verifier = IngredientVerifier::new(source);

    let verification = verifier.verify(&meal.ingredients).await;
    // 2 of 3 matched: rate 2/3 > 0.5 -> success, both matches from USDA.
    assert!(verification.verification_success);
    assert_eq!(verification.total_verified, 2);
    assert_eq!(verification.primary_source, "usda");
    assert_eq!(verification.verified_ingredients.len(), 3);
    assert!(!verification.verified_ingredients[2].matched);

    let corrected = correct_meal(&meal, &verification, &CorrectionConfig::default());

    assert!(corrected.correction.verified);
    assert_eq!(corrected.correction.confidence, Confidence::High);

    // Verified averages over the two matched ingredients:
    //   calories (165+130)/2 = 147.5, protein (31+2.7)/2 = 16.85,
    //   carbs (0+28)/2 = 14, fat (3.6+0.3)/2 = 1.95
    let verified = corrected
        .correction
        .verified_values
        .as_ref()
        .expect("verified values");
    assert!((verified.calories - 147.5).abs() < 1e-3);
    assert!((verified.protein_grams - 16.85).abs() < 1e-3);

    // calories: |400-147.5|/400*100 = 63.125% > 15
    //   -> round(400*0.7 + 147.5*0.3, 2) = round(324.25, 2) = 324.25
    assert_eq!(corrected.meal.calories, 324.25);

    // Passthrough fields survive untouched.
    assert_eq!(corrected.meal.name, "Chicken and rice");
    assert_eq!(
        corrected.meal.extra.get("portion_size"),
        Some(&serde_json::json!("1 plate"))
    );
    assert_eq!(
        corrected.meal.extra.get("prep_time_minutes"),
        Some(&serde_json::json!(30))
    );
}

#[tokio::test]
async fn test_barcode_ingredient_resolves_through_barcode_table() {
    let source = FixtureSource::new().with_barcode(
        "3017620422003",
        vec![FoodMatch {
            id: "3017620422003".to_string(),
            name: "Nutella (Ferrero)".to_string(),
            nutrition_per_100g: Some(NutritionFacts {
                calories: Some(539.0),
                protein: Some(6.3),
                carbs: Some(57.5),
                fat: Some(30.9),
                source: "openfoodfacts".to_string(),
                ..Default::default()
            }),
        }],
    );

    let ingredients = vec![meal_verify::verification::MealIngredient {
        name: "Nutella".to_string(),
        quantity: Some("20g".to_string()),
        specificity: Some("specific".to_string()),
        barcode: Some("3017620422003".to_string()),
    }];

    let verifier = IngredientVerifier::new(source);
    let verification = verifier.verify(&ingredients).await;

    assert_eq!(verification.total_verified, 1);
    assert_eq!(verification.primary_source, "openfoodfacts");
    let nutrition = verification.verified_ingredients[0]
        .nutrition_per_100g
        .as_ref()
        .expect("matched");
    assert_eq!(nutrition.calories, Some(539.0));
}

#[tokio::test]
async fn test_nothing_matches_keeps_ai_estimate() {
    let source = FixtureSource::new();
    let meal: MealEstimate = serde_json::from_value(meal_json()).expect("meal parses");

    let verifier = IngredientVerifier::new(source);
    let verification = verifier.verify(&meal.ingredients).await;

    assert_eq!(verification.verification_rate, 0.0);
    assert_eq!(verification.primary_source, "mixed");

    let corrected = correct_meal(&meal, &verification, &CorrectionConfig::default());
    assert_eq!(corrected.correction.confidence, Confidence::Low);
    assert_eq!(corrected.meal.calories, 400.0);
    assert_eq!(corrected.meal.protein_grams, 35.0);
    // All three ingredients retained in the record for transparency.
    assert_eq!(corrected.correction.verified_ingredients.len(), 3);
}

#[tokio::test]
async fn test_corrected_meal_serializes_for_persistence() {
    let source = FixtureSource::new()
        .with_name("chicken breast", vec![usda_match("171077", 165.0, 31.0, 0.0, 3.6)])
        .with_name("white rice", vec![usda_match("169756", 130.0, 2.7, 28.0, 0.3)]);

    let meal: MealEstimate = serde_json::from_value(meal_json()).expect("meal parses");
    let verifier = IngredientVerifier::new(source);
    let verification = verifier.verify(&meal.ingredients).await;
    let corrected = correct_meal(&meal, &verification, &CorrectionConfig::default());

    let json = serde_json::to_value(&corrected).expect("serializes");
    assert_eq!(json["correction"]["confidence"], "high");
    assert_eq!(json["correction"]["source"], "openfoodfacts_verified");
    // No-op macros carry no correction entry.
    assert!(json["correction"]["corrections_applied"]
        .get("calories")
        .is_some());
    assert_eq!(json["meal"]["portion_size"], "1 plate");
}

#[test]
fn test_meal_file_parses_like_the_cli_does() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "{}", meal_json()).expect("write meal json");

    let content = std::fs::read_to_string(file.path()).expect("read back");
    let meal: MealEstimate = serde_json::from_str(&content).expect("meal parses");

    assert_eq!(meal.name, "Chicken and rice");
    assert_eq!(meal.ingredients.len(), 3);
    assert_eq!(meal.ingredients[2].specificity, None);
}
