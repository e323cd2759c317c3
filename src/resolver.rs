use async_trait::async_trait;

use crate::api_connection::connection::FoodApiError;
use crate::providers::{
    FoodDataProvider, FoodMatch, IngredientSpecificity, NutritionFacts, OpenFoodFactsProvider,
    UsdaProvider,
};

/// Lookup capability the ingredient verifier depends on. Implemented by
/// `FoodDataResolver` for real lookups and by stubs in tests.
#[async_trait]
pub trait NutritionSource {
    async fn search_with_specificity(
        &self,
        name: &str,
        specificity: IngredientSpecificity,
        barcode: Option<&str>,
    ) -> Vec<FoodMatch>;

    fn clean_ingredient_name(&self, name: &str) -> String;
}

/// Which provider a lookup is routed to.
#[derive(Debug, PartialEq, Eq)]
enum ProviderRoute {
    OpenFoodFactsBarcode,
    OpenFoodFactsSearch,
    UsdaSearch,
}

/// A barcode unambiguously identifies a branded product, so it wins over
/// specificity. Branded products are OpenFoodFacts' strength; commodity data
/// for generic ingredients is more reliable from USDA.
fn route(specificity: IngredientSpecificity, barcode: Option<&str>) -> ProviderRoute {
    if barcode.is_some_and(|code| !code.trim().is_empty()) {
        return ProviderRoute::OpenFoodFactsBarcode;
    }
    match specificity {
        IngredientSpecificity::Specific => ProviderRoute::OpenFoodFactsSearch,
        IngredientSpecificity::Generic => ProviderRoute::UsdaSearch,
    }
}

fn is_numeric_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_digit())
}

/// Candidates requested per provider search.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Routes lookups between the two concrete providers based on ingredient
/// specificity and barcode presence.
pub struct FoodDataResolver {
    usda: UsdaProvider,
    openfoodfacts: OpenFoodFactsProvider,
}

impl FoodDataResolver {
    pub fn new(usda: UsdaProvider, openfoodfacts: OpenFoodFactsProvider) -> Self {
        Self {
            usda,
            openfoodfacts,
        }
    }

    /// Builds a resolver against the public APIs, reading the USDA key from
    /// the environment.
    pub fn from_env() -> Result<Self, FoodApiError> {
        Ok(Self::new(
            UsdaProvider::from_env()?,
            OpenFoodFactsProvider::new(),
        ))
    }

    /// Plain search without a specificity hint always goes to OpenFoodFacts.
    pub async fn search(&self, name: &str) -> Vec<FoodMatch> {
        self.openfoodfacts.search(name, DEFAULT_SEARCH_LIMIT).await
    }

    /// A purely numeric id is treated as a USDA FDC id, anything else as an
    /// OpenFoodFacts barcode/code.
    pub async fn get_nutrition_data(&self, id: &str) -> Option<NutritionFacts> {
        if is_numeric_id(id) {
            self.usda.get_nutrition_data(id).await
        } else {
            self.openfoodfacts.get_nutrition_data(id).await
        }
    }
}

#[async_trait]
impl NutritionSource for FoodDataResolver {
    async fn search_with_specificity(
        &self,
        name: &str,
        specificity: IngredientSpecificity,
        barcode: Option<&str>,
    ) -> Vec<FoodMatch> {
        match route(specificity, barcode) {
            ProviderRoute::OpenFoodFactsBarcode => {
                // route() only returns this when a non-blank barcode exists.
                let code = barcode.unwrap_or_default();
                self.openfoodfacts.search_by_barcode(code.trim()).await
            }
            ProviderRoute::OpenFoodFactsSearch => {
                self.openfoodfacts.search(name, DEFAULT_SEARCH_LIMIT).await
            }
            ProviderRoute::UsdaSearch => self.usda.search(name, DEFAULT_SEARCH_LIMIT).await,
        }
    }

    /// USDA's cleaning rules are canonical regardless of which provider
    /// serves the eventual lookup.
    fn clean_ingredient_name(&self, name: &str) -> String {
        self.usda.clean_ingredient_name(name)
    }
}
