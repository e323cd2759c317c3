use serde::{Deserialize, Serialize};

pub const USDA_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";
pub const OFF_BASE_URL: &str = "https://world.openfoodfacts.org";

/// Data types requested from USDA search: curated, non-branded entries only.
pub const USDA_DATA_TYPES: &str = "Foundation,SR Legacy";

// ---------------------------------------------------------------------------
// USDA FoodData Central
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UsdaSearchResponse {
    #[serde(default)]
    pub foods: Vec<UsdaSearchFood>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UsdaSearchFood {
    #[serde(rename = "fdcId")]
    pub fdc_id: Option<u64>,
    pub description: Option<String>,
    #[serde(rename = "dataType")]
    pub data_type: Option<String>,
}

/// Detail response from `GET /food/{fdcId}` — carries the full nutrient list.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UsdaFoodDetail {
    pub description: Option<String>,
    #[serde(rename = "foodNutrients", default)]
    pub food_nutrients: Vec<UsdaFoodNutrient>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UsdaFoodNutrient {
    pub nutrient: Option<UsdaNutrient>,
    pub amount: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UsdaNutrient {
    /// USDA nutrient number, e.g. "208" for energy (kcal).
    pub number: Option<String>,
}

// ---------------------------------------------------------------------------
// OpenFoodFacts
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OffSearchResponse {
    #[serde(default)]
    pub products: Vec<OffProduct>,
}

/// Response from `GET /api/v2/product/{barcode}`; `status == 1` means found.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OffProductResponse {
    #[serde(default)]
    pub status: i32,
    pub product: Option<OffProduct>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OffProduct {
    pub code: Option<String>,
    pub product_name: Option<String>,
    pub brands: Option<String>,
    pub nutriments: Option<OffNutriments>,
}

/// Per-100g nutriment keys as OpenFoodFacts names them. A key absent from the
/// payload stays `None`; it is never coerced to zero.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct OffNutriments {
    #[serde(rename = "energy-kcal_100g")]
    pub energy_kcal_100g: Option<f32>,
    #[serde(rename = "proteins_100g")]
    pub proteins_100g: Option<f32>,
    #[serde(rename = "carbohydrates_100g")]
    pub carbohydrates_100g: Option<f32>,
    #[serde(rename = "fat_100g")]
    pub fat_100g: Option<f32>,
    #[serde(rename = "fiber_100g")]
    pub fiber_100g: Option<f32>,
    #[serde(rename = "sugars_100g")]
    pub sugars_100g: Option<f32>,
    #[serde(rename = "sodium_100g")]
    pub sodium_100g: Option<f32>,
}
