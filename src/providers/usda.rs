use async_trait::async_trait;
use reqwest::Client;

use crate::api_connection::connection::{build_client, get_json, usda_api_key, FoodApiError};
use crate::api_connection::endpoints::{
    UsdaFoodDetail, UsdaFoodNutrient, UsdaSearchFood, UsdaSearchResponse, USDA_BASE_URL,
    USDA_DATA_TYPES,
};
use crate::providers::{
    clean_ingredient_name, FoodDataProvider, FoodMatch, NutritionFacts, SOURCE_USDA,
};

// USDA nutrient numbers for the fields we extract.
const NUTRIENT_CALORIES: &str = "208";
const NUTRIENT_PROTEIN: &str = "203";
const NUTRIENT_CARBS: &str = "205";
const NUTRIENT_FAT: &str = "204";
const NUTRIENT_FIBER: &str = "291";
const NUTRIENT_SUGAR: &str = "269";
const NUTRIENT_SODIUM: &str = "307";

/// USDA FoodData Central provider, restricted to the curated Foundation and
/// SR Legacy data types. Good for generic commodity ingredients; useless for
/// branded products.
pub struct UsdaProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl UsdaProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, USDA_BASE_URL)
    }

    /// Base URL override, used by integration tests pointing at fixtures.
    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            api_key,
            base_url: base_url.into(),
        }
    }

    pub fn from_env() -> Result<Self, FoodApiError> {
        Ok(Self::new(usda_api_key()?))
    }

    async fn search_candidates(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<UsdaSearchFood>, FoodApiError> {
        let url = format!("{}/foods/search", self.base_url);
        let page_size = limit.to_string();
        let response: UsdaSearchResponse = get_json(
            &self.client,
            &url,
            &[
                ("query", query),
                ("dataType", USDA_DATA_TYPES),
                ("pageSize", &page_size),
                ("api_key", &self.api_key),
            ],
        )
        .await?;
        Ok(response.foods)
    }

    async fn fetch_detail(&self, fdc_id: &str) -> Result<UsdaFoodDetail, FoodApiError> {
        let url = format!("{}/food/{}", self.base_url, fdc_id);
        get_json(&self.client, &url, &[("api_key", &self.api_key)]).await
    }
}

/// Maps USDA's nutrient-number/amount pairs onto `NutritionFacts`. The first
/// occurrence of a nutrient number wins; unknown numbers are ignored.
fn nutrition_from_nutrients(nutrients: &[UsdaFoodNutrient]) -> NutritionFacts {
    let mut facts = NutritionFacts {
        source: SOURCE_USDA.to_string(),
        ..Default::default()
    };

    for entry in nutrients {
        let number = entry
            .nutrient
            .as_ref()
            .and_then(|nutrient| nutrient.number.as_deref());
        let Some(number) = number else { continue };

        match number {
            NUTRIENT_CALORIES => facts.calories = facts.calories.or(entry.amount),
            NUTRIENT_PROTEIN => facts.protein = facts.protein.or(entry.amount),
            NUTRIENT_CARBS => facts.carbs = facts.carbs.or(entry.amount),
            NUTRIENT_FAT => facts.fat = facts.fat.or(entry.amount),
            NUTRIENT_FIBER => facts.fiber = facts.fiber.or(entry.amount),
            // Sodium arrives in mg and is kept in mg.
            NUTRIENT_SUGAR => facts.sugar = facts.sugar.or(entry.amount),
            NUTRIENT_SODIUM => facts.sodium = facts.sodium.or(entry.amount),
            _ => {}
        }
    }

    facts
}

#[async_trait]
impl FoodDataProvider for UsdaProvider {
    async fn search(&self, name: &str, limit: usize) -> Vec<FoodMatch> {
        let query = self.clean_ingredient_name(name);
        let candidates = match self.search_candidates(&query, limit).await {
            Ok(candidates) => candidates,
            Err(_) => return Vec::new(),
        };

        let mut matches = Vec::new();
        for food in candidates {
            // Candidates without an id cannot be fetched; skip them.
            let Some(fdc_id) = food.fdc_id else { continue };
            let id = fdc_id.to_string();

            // A failed detail fetch drops the candidate, it is not an error.
            let Some(nutrition) = self.get_nutrition_data(&id).await else {
                continue;
            };

            matches.push(FoodMatch {
                id,
                name: food.description.unwrap_or_default(),
                nutrition_per_100g: Some(nutrition),
            });
        }
        matches
    }

    async fn get_nutrition_data(&self, id: &str) -> Option<NutritionFacts> {
        let detail = self.fetch_detail(id).await.ok()?;
        Some(nutrition_from_nutrients(&detail.food_nutrients))
    }

    fn clean_ingredient_name(&self, name: &str) -> String {
        clean_ingredient_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail_from_json(json: serde_json::Value) -> UsdaFoodDetail {
        serde_json::from_value(json).expect("valid detail fixture")
    }

    #[test]
    fn test_nutrient_number_mapping() {
        let detail = detail_from_json(serde_json::json!({
            "description": "Chicken, broiler, breast, raw",
            "foodNutrients": [
                { "nutrient": { "number": "208" }, "amount": 165.0 },
                { "nutrient": { "number": "203" }, "amount": 31.0 },
                { "nutrient": { "number": "205" }, "amount": 0.0 },
                { "nutrient": { "number": "204" }, "amount": 3.6 },
                { "nutrient": { "number": "291" }, "amount": 0.0 },
                { "nutrient": { "number": "269" }, "amount": 0.0 },
                { "nutrient": { "number": "307" }, "amount": 74.0 }
            ]
        }));

        let facts = nutrition_from_nutrients(&detail.food_nutrients);
        assert_eq!(facts.source, SOURCE_USDA);
        assert_eq!(facts.calories, Some(165.0));
        assert_eq!(facts.protein, Some(31.0));
        assert_eq!(facts.carbs, Some(0.0));
        assert_eq!(facts.fat, Some(3.6));
        assert_eq!(facts.fiber, Some(0.0));
        assert_eq!(facts.sugar, Some(0.0));
        // Sodium stays in mg, no conversion.
        assert_eq!(facts.sodium, Some(74.0));
    }

    #[test]
    fn test_missing_nutrients_stay_none() {
        let detail = detail_from_json(serde_json::json!({
            "description": "Olive oil",
            "foodNutrients": [
                { "nutrient": { "number": "208" }, "amount": 884.0 },
                { "nutrient": { "number": "204" }, "amount": 100.0 }
            ]
        }));

        let facts = nutrition_from_nutrients(&detail.food_nutrients);
        assert_eq!(facts.calories, Some(884.0));
        assert_eq!(facts.fat, Some(100.0));
        assert_eq!(facts.protein, None);
        assert_eq!(facts.carbs, None);
        assert_eq!(facts.sodium, None);
    }

    #[test]
    fn test_unknown_numbers_and_missing_amounts_ignored() {
        let detail = detail_from_json(serde_json::json!({
            "foodNutrients": [
                { "nutrient": { "number": "999" }, "amount": 12.0 },
                { "nutrient": { "number": "203" } },
                { "amount": 50.0 },
                { "nutrient": { "number": "203" }, "amount": 20.0 }
            ]
        }));

        let facts = nutrition_from_nutrients(&detail.food_nutrients);
        // The entry without an amount is skipped via `.or(...)`, the later
        // complete "203" entry fills protein.
        assert_eq!(facts.protein, Some(20.0));
        assert_eq!(facts.calories, None);
    }

    #[test]
    fn test_search_food_without_id_is_deserialized_as_none() {
        let response: UsdaSearchResponse = serde_json::from_value(serde_json::json!({
            "foods": [
                { "description": "No id entry" },
                { "fdcId": 171077, "description": "Chicken breast", "dataType": "SR Legacy" }
            ]
        }))
        .expect("valid search fixture");

        assert_eq!(response.foods.len(), 2);
        assert_eq!(response.foods[0].fdc_id, None);
        assert_eq!(response.foods[1].fdc_id, Some(171077));
    }
}
