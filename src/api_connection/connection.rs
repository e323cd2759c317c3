use dotenv::dotenv;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::env;
use std::error::Error;
use std::fmt;
use std::time::Duration;

#[derive(Debug)]
pub enum FoodApiError {
    MissingApiKey(String),
    NetworkError(reqwest::Error),
    DeserializationError(reqwest::Error),
    ApiError {
        status: reqwest::StatusCode,
        url: String,
    },
}

impl fmt::Display for FoodApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoodApiError::MissingApiKey(key_name) => {
                write!(f, "API key not found in environment: {}", key_name)
            }
            FoodApiError::NetworkError(err) => write!(f, "Network error: {}", err),
            FoodApiError::DeserializationError(err) => {
                write!(f, "Failed to decode response body: {}", err)
            }
            FoodApiError::ApiError { status, url } => {
                write!(f, "API error {} from {}", status, url)
            }
        }
    }
}

impl Error for FoodApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FoodApiError::NetworkError(err) => Some(err),
            FoodApiError::DeserializationError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FoodApiError {
    fn from(err: reqwest::Error) -> Self {
        FoodApiError::NetworkError(err)
    }
}

/// Environment variable holding the USDA FoodData Central API key.
pub const USDA_API_KEY_ENV_VAR: &str = "USDA_API_KEY";

const REQUEST_TIMEOUT_SECS: u64 = 15;
const USER_AGENT: &str = concat!("meal_verify/", env!("CARGO_PKG_VERSION"));

/// Reads the USDA API key from the environment (loading `.env` first).
pub fn usda_api_key() -> Result<String, FoodApiError> {
    dotenv().ok();
    env::var(USDA_API_KEY_ENV_VAR)
        .map_err(|_| FoodApiError::MissingApiKey(USDA_API_KEY_ENV_VAR.to_string()))
}

/// Builds the HTTP client shared by both providers.
///
/// OpenFoodFacts asks clients to identify themselves with a User-Agent,
/// so one is set here for every outgoing request.
pub fn build_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// GET `url` with `query` parameters and decode the JSON body into `T`.
///
/// Non-2xx statuses become `FoodApiError::ApiError`; callers at the provider
/// layer translate any error into "no results" rather than surfacing it.
pub async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<T, FoodApiError> {
    let response = client.get(url).query(query).send().await?;

    if response.status().is_success() {
        response
            .json::<T>()
            .await
            .map_err(FoodApiError::DeserializationError)
    } else {
        Err(FoodApiError::ApiError {
            status: response.status(),
            url: url.to_string(),
        })
    }
}
