use async_trait::async_trait;
use reqwest::Client;

use crate::api_connection::connection::{build_client, get_json, FoodApiError};
use crate::api_connection::endpoints::{
    OffNutriments, OffProduct, OffProductResponse, OffSearchResponse, OFF_BASE_URL,
};
use crate::providers::{
    clean_ingredient_name, FoodDataProvider, FoodMatch, NutritionFacts, SOURCE_OPENFOODFACTS,
};

const PRODUCT_FIELDS: &str = "code,product_name,brands,nutriments";
const STATUS_FOUND: i32 = 1;

/// OpenFoodFacts provider for branded/packaged products: free-text search
/// over the first result page, or exact barcode lookup.
pub struct OpenFoodFactsProvider {
    client: Client,
    base_url: String,
}

impl Default for OpenFoodFactsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenFoodFactsProvider {
    pub fn new() -> Self {
        Self::with_base_url(OFF_BASE_URL)
    }

    /// Base URL override, used by integration tests pointing at fixtures.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into(),
        }
    }

    async fn search_products(
        &self,
        terms: &str,
        limit: usize,
    ) -> Result<Vec<OffProduct>, FoodApiError> {
        let url = format!("{}/api/v2/search", self.base_url);
        let page_size = limit.to_string();
        let response: OffSearchResponse = get_json(
            &self.client,
            &url,
            &[
                ("search_terms", terms),
                ("page_size", &page_size),
                ("fields", PRODUCT_FIELDS),
            ],
        )
        .await?;
        Ok(response.products)
    }

    async fn fetch_product(&self, barcode: &str) -> Result<OffProductResponse, FoodApiError> {
        let url = format!("{}/api/v2/product/{}", self.base_url, barcode);
        get_json(&self.client, &url, &[("fields", PRODUCT_FIELDS)]).await
    }

    /// Exact barcode lookup. At most one match; empty on any failure or when
    /// the barcode is unknown.
    pub async fn search_by_barcode(&self, barcode: &str) -> Vec<FoodMatch> {
        let response = match self.fetch_product(barcode).await {
            Ok(response) => response,
            Err(_) => return Vec::new(),
        };
        if response.status != STATUS_FOUND {
            return Vec::new();
        }
        match response.product {
            Some(product) => vec![match_from_product(product)],
            None => Vec::new(),
        }
    }
}

fn nutrition_from_nutriments(nutriments: &OffNutriments) -> NutritionFacts {
    NutritionFacts {
        calories: nutriments.energy_kcal_100g,
        protein: nutriments.proteins_100g,
        carbs: nutriments.carbohydrates_100g,
        fat: nutriments.fat_100g,
        fiber: nutriments.fiber_100g,
        sugar: nutriments.sugars_100g,
        sodium: nutriments.sodium_100g,
        source: SOURCE_OPENFOODFACTS.to_string(),
    }
}

fn match_from_product(product: OffProduct) -> FoodMatch {
    let name = match (&product.product_name, &product.brands) {
        (Some(product_name), Some(brands)) if !brands.is_empty() => {
            format!("{} ({})", product_name, brands)
        }
        (Some(product_name), _) => product_name.clone(),
        (None, _) => String::new(),
    };

    FoodMatch {
        id: product.code.unwrap_or_default(),
        name,
        nutrition_per_100g: product
            .nutriments
            .as_ref()
            .map(nutrition_from_nutriments),
    }
}

#[async_trait]
impl FoodDataProvider for OpenFoodFactsProvider {
    async fn search(&self, name: &str, limit: usize) -> Vec<FoodMatch> {
        let terms = self.clean_ingredient_name(name);
        match self.search_products(&terms, limit).await {
            Ok(products) => products.into_iter().map(match_from_product).collect(),
            // HTTP failure means "no results" here, never an error.
            Err(_) => Vec::new(),
        }
    }

    async fn get_nutrition_data(&self, id: &str) -> Option<NutritionFacts> {
        let response = self.fetch_product(id).await.ok()?;
        if response.status != STATUS_FOUND {
            return None;
        }
        response
            .product?
            .nutriments
            .as_ref()
            .map(nutrition_from_nutriments)
    }

    fn clean_ingredient_name(&self, name: &str) -> String {
        clean_ingredient_name(name)
    }
}
