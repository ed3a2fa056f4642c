//! Per-model cost estimation from the catalog pricing table.

use crate::providers::{ModelPrice, PROVIDER_CATALOG};
use crate::types::TokenUsage;

/// Price for a model: the longest matching family prefix, else the fallback tier.
pub fn price_for_model(model: &str) -> ModelPrice {
    let model = model.trim().to_lowercase();
    PROVIDER_CATALOG
        .pricing
        .tiers
        .iter()
        .filter(|tier| model.starts_with(&tier.prefix.to_lowercase()))
        .max_by_key(|tier| tier.prefix.len())
        .map(|tier| tier.price)
        .unwrap_or(PROVIDER_CATALOG.pricing.fallback)
}

/// Estimated USD cost of a call.
pub fn estimate_cost(model: &str, prompt_tokens: u64, completion_tokens: u64) -> f64 {
    let price = price_for_model(model);
    (prompt_tokens as f64 * price.input_per_million
        + completion_tokens as f64 * price.output_per_million)
        / 1_000_000.0
}

pub fn estimate_usage_cost(model: &str, usage: Option<&TokenUsage>) -> f64 {
    usage
        .map(|u| estimate_cost(model, u.prompt_tokens, u.completion_tokens))
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_longest_prefix_wins() {
        // "gpt-4o-mini" must not be priced as "gpt-4o".
        let mini = price_for_model("gpt-4o-mini-2024-07-18");
        assert!(approx(mini.input_per_million, 0.15));
        let full = price_for_model("GPT-4o-2024-08-06");
        assert!(approx(full.input_per_million, 2.5));
    }

    #[test]
    fn test_unknown_model_uses_fallback() {
        let price = price_for_model("some-local-model");
        assert!(approx(price.input_per_million, 5.0));
        assert!(approx(price.output_per_million, 15.0));
    }

    #[test]
    fn test_estimate_cost() {
        // 1M prompt + 1M completion on claude-sonnet = 3 + 15
        assert!(approx(
            estimate_cost("claude-sonnet-4-5", 1_000_000, 1_000_000),
            18.0
        ));
        assert!(approx(estimate_cost("grok-3", 0, 0), 0.0));
        assert!(approx(estimate_usage_cost("grok-3", None), 0.0));
    }
}
