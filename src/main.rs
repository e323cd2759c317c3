use anyhow::{Context, Result};
use meal_verify::cli::parse_args;
use meal_verify::correction::{correct_meal, CorrectionConfig, MealEstimate};
use meal_verify::resolver::FoodDataResolver;
use meal_verify::verification::IngredientVerifier;
use tokio::fs;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok(); // Load .env for the USDA API key

    let cli_args = parse_args();

    let meal_content = fs::read_to_string(&cli_args.meal_file)
        .await
        .with_context(|| format!("Failed to read meal file '{}'", cli_args.meal_file))?;
    let meal: MealEstimate = serde_json::from_str(&meal_content)
        .with_context(|| format!("Failed to parse meal JSON from '{}'", cli_args.meal_file))?;

    println!(
        "Verifying {} ingredient(s) for meal '{}'...",
        meal.ingredients.len(),
        meal.name
    );

    let resolver = FoodDataResolver::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to initialize food data resolver: {}", e))?;
    let verifier = IngredientVerifier::new(resolver);

    let verification = verifier.verify(&meal.ingredients).await;
    for ingredient in &verification.verified_ingredients {
        if ingredient.matched {
            println!("   -> Matched '{}'", ingredient.name);
        } else {
            println!("   -> No match for '{}'", ingredient.name);
        }
    }
    println!(
        "Verification rate: {:.0}% ({} of {}), primary source: {}",
        verification.verification_rate * 100.0,
        verification.total_verified,
        verification.verified_ingredients.len(),
        verification.primary_source
    );

    let corrected = correct_meal(&meal, &verification, &CorrectionConfig::default());

    let output = if cli_args.pretty {
        serde_json::to_string_pretty(&corrected)
    } else {
        serde_json::to_string(&corrected)
    }
    .context("Failed to serialize corrected meal")?;

    println!("{}", output);

    Ok(())
}
