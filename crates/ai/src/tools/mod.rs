//! Portfolio tools the model may call mid-conversation.
//!
//! Each tool implements rig-core's `Tool` trait over the `AiEnvironment`:
//! - GetPortfolioSnapshotTool: Totals, allocation and top holdings
//! - GetHoldingsTool: Filtered, weighted holdings list
//! - GetHoldingDetailTool: One holding with transactions, notes and alerts
//! - GetHistoryTool: Price and transaction history over a relative range
//! - SimulateTradeTool: Non-persisting buy/sell what-if
//! - SuggestRebalanceTool: Equal or custom target-weight rebalance
//! - AddNoteTool: Append a note
//! - CreatePriceAlertTool: Create an above/below price alert
//! - RunResearchTool: Trigger a research report
//! - SearchResearchTool: Keyword search across research reports
//!
//! Adapters reach them through [`ToolExecutor`], implemented by
//! [`ToolRegistry`]. Execution never returns an error: parse, validation and
//! tool failures (including panics) all become [`ToolExecutionResult::Failure`].

pub mod alerts;
mod common;
pub mod constants;
pub mod history;
pub mod holding_detail;
pub mod holdings;
pub mod invocation;
pub mod notes;
pub mod rebalance;
pub mod research;
pub mod simulate;
pub mod snapshot;

// Re-export constants
pub use constants::*;

pub use alerts::CreatePriceAlertTool;
pub use history::GetHistoryTool;
pub use holding_detail::GetHoldingDetailTool;
pub use holdings::GetHoldingsTool;
pub use invocation::{RawToolArgs, ToolExecutionResult, ToolInvocation, Traced, ValidateArgs};
pub use notes::AddNoteTool;
pub use rebalance::SuggestRebalanceTool;
pub use research::{RunResearchTool, SearchResearchTool};
pub use simulate::SimulateTradeTool;
pub use snapshot::GetPortfolioSnapshotTool;

use async_trait::async_trait;
use futures::FutureExt;
use log::{debug, warn};
use rig::{completion::ToolDefinition, tool::Tool};
use serde::Serialize;
use serde_json::{Map, Value};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::env::AiEnvironment;
use crate::error::AiError;

/// Vendor-agnostic tool surface used by the provider adapters.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// The tool catalog, in a fixed order.
    async fn list_tool_definitions(&self) -> Vec<ToolDefinition>;

    /// Parse, validate and run one tool. Never fails; see [`ToolExecutionResult`].
    async fn execute_by_name(&self, name: &str, raw_args: RawToolArgs) -> ToolExecutionResult;
}

/// Container for all AI tools.
pub struct ToolSet<E: AiEnvironment> {
    pub snapshot: GetPortfolioSnapshotTool<E>,
    pub holdings: GetHoldingsTool<E>,
    pub holding_detail: GetHoldingDetailTool<E>,
    pub history: GetHistoryTool<E>,
    pub simulate_trade: SimulateTradeTool<E>,
    pub rebalance: SuggestRebalanceTool<E>,
    pub add_note: AddNoteTool<E>,
    pub price_alert: CreatePriceAlertTool<E>,
    pub run_research: RunResearchTool<E>,
    pub search_research: SearchResearchTool<E>,
}

impl<E: AiEnvironment> ToolSet<E> {
    /// Create a new tool set with all portfolio tools.
    pub fn new(env: Arc<E>, base_currency: String) -> Self {
        Self {
            snapshot: GetPortfolioSnapshotTool::new(env.clone(), base_currency.clone()),
            holdings: GetHoldingsTool::new(env.clone(), base_currency.clone()),
            holding_detail: GetHoldingDetailTool::new(env.clone()),
            history: GetHistoryTool::new(env.clone()),
            simulate_trade: SimulateTradeTool::new(env.clone()),
            rebalance: SuggestRebalanceTool::new(env.clone(), base_currency),
            add_note: AddNoteTool::new(env.clone()),
            price_alert: CreatePriceAlertTool::new(env.clone()),
            run_research: RunResearchTool::new(env.clone()),
            search_research: SearchResearchTool::new(env),
        }
    }
}

/// Name-keyed dispatch over a [`ToolSet`].
pub struct ToolRegistry<E: AiEnvironment> {
    tools: ToolSet<E>,
    definitions: OnceCell<Vec<ToolDefinition>>,
}

impl<E: AiEnvironment + 'static> ToolRegistry<E> {
    pub fn new(env: Arc<E>) -> Self {
        let base_currency = env.base_currency();
        Self {
            tools: ToolSet::new(env, base_currency),
            definitions: OnceCell::new(),
        }
    }

    async fn build_definitions(&self) -> Vec<ToolDefinition> {
        let t = &self.tools;
        vec![
            t.snapshot.definition(String::new()).await,
            t.holdings.definition(String::new()).await,
            t.holding_detail.definition(String::new()).await,
            t.history.definition(String::new()).await,
            t.simulate_trade.definition(String::new()).await,
            t.rebalance.definition(String::new()).await,
            t.add_note.definition(String::new()).await,
            t.price_alert.definition(String::new()).await,
            t.run_research.definition(String::new()).await,
            t.search_research.definition(String::new()).await,
        ]
    }

    async fn dispatch(&self, name: &str, arguments: Map<String, Value>) -> ToolExecutionResult {
        let t = &self.tools;
        match name {
            GET_PORTFOLIO_SNAPSHOT => run_tool(&t.snapshot, arguments).await,
            GET_HOLDINGS => run_tool(&t.holdings, arguments).await,
            GET_HOLDING_DETAIL => run_tool(&t.holding_detail, arguments).await,
            GET_HISTORY => run_tool(&t.history, arguments).await,
            SIMULATE_TRADE => run_tool(&t.simulate_trade, arguments).await,
            SUGGEST_REBALANCE => run_tool(&t.rebalance, arguments).await,
            ADD_NOTE => run_tool(&t.add_note, arguments).await,
            CREATE_PRICE_ALERT => run_tool(&t.price_alert, arguments).await,
            RUN_RESEARCH => run_tool(&t.run_research, arguments).await,
            SEARCH_RESEARCH => run_tool(&t.search_research, arguments).await,
            _ => ToolExecutionResult::failure(format!("Unknown tool: {}", name)),
        }
    }
}

#[async_trait]
impl<E: AiEnvironment + 'static> ToolExecutor for ToolRegistry<E> {
    async fn list_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.definitions
            .get_or_init(|| self.build_definitions())
            .await
            .clone()
    }

    async fn execute_by_name(&self, name: &str, raw_args: RawToolArgs) -> ToolExecutionResult {
        let known = self
            .list_tool_definitions()
            .await
            .iter()
            .any(|d| d.name == name);
        if !known {
            warn!("Model requested unknown tool '{}'", name);
            return ToolExecutionResult::failure(format!("Unknown tool: {}", name));
        }

        let invocation = match ToolInvocation::parse(name, raw_args) {
            Ok(invocation) => invocation,
            Err(message) => {
                debug!("Rejected arguments for tool '{}': {}", name, message);
                return ToolExecutionResult::failure(message);
            }
        };

        debug!("Executing tool '{}' ({})", invocation.name, invocation.id);
        let result = self.dispatch(&invocation.name, invocation.arguments).await;
        if let ToolExecutionResult::Failure { error, .. } = &result {
            debug!("Tool '{}' failed: {}", invocation.name, error);
        }
        result
    }
}

/// Deserialize, validate and call one tool, folding every failure into a value.
async fn run_tool<T, O>(tool: &T, arguments: Map<String, Value>) -> ToolExecutionResult
where
    T: Tool<Error = AiError, Output = Traced<O>>,
    T::Args: ValidateArgs,
    O: Serialize,
{
    let args: T::Args = match serde_json::from_value(Value::Object(arguments)) {
        Ok(args) => args,
        Err(e) => return ToolExecutionResult::failure(format!("Invalid arguments: {}", e)),
    };
    if let Err(message) = args.validate() {
        return ToolExecutionResult::failure(message);
    }

    match AssertUnwindSafe(tool.call(args)).catch_unwind().await {
        Ok(Ok(traced)) => match serde_json::to_value(&traced.data) {
            Ok(data) => ToolExecutionResult::Success {
                data,
                data_provenance: traced.data_provenance,
            },
            Err(e) => ToolExecutionResult::Failure {
                error: format!("Failed to serialize tool output: {}", e),
                data_provenance: traced.data_provenance,
            },
        },
        Ok(Err(e)) => ToolExecutionResult::failure(e.to_string()),
        Err(_) => {
            warn!("Tool '{}' panicked", T::NAME);
            ToolExecutionResult::failure(format!("Tool '{}' failed unexpectedly", T::NAME))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::test_env::{holding, MockEnvironment};
    use folio_core::portfolio::HoldingType;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    fn registry(env: MockEnvironment) -> ToolRegistry<MockEnvironment> {
        ToolRegistry::new(Arc::new(env))
    }

    fn sample_env() -> MockEnvironment {
        MockEnvironment::new().with_holdings(vec![
            holding("s1", "AAA", HoldingType::Stock, dec!(1), dec!(100)),
            holding("s2", "BBB", HoldingType::Stock, dec!(2), dec!(100)),
            holding("s3", "CCC", HoldingType::Stock, dec!(3), dec!(100)),
            holding("c1", "USD", HoldingType::Cash, dec!(50), dec!(1)),
            holding("c2", "EUR", HoldingType::Cash, dec!(25), dec!(1)),
        ])
    }

    #[tokio::test]
    async fn test_catalog_has_unique_names() {
        let registry = registry(MockEnvironment::new());
        let definitions = registry.list_tool_definitions().await;
        let names: HashSet<_> = definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(definitions.len(), 10);
        assert_eq!(names.len(), 10);
        for definition in &definitions {
            assert_eq!(definition.parameters["type"], "object");
        }
    }

    #[tokio::test]
    async fn test_invalid_json_is_failure() {
        let registry = registry(sample_env());
        let result = registry
            .execute_by_name(GET_HOLDINGS, RawToolArgs::from("{not json"))
            .await;
        let value = result.to_value();
        assert_eq!(value["success"], false);
        assert!(value["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid tool arguments JSON"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = registry(sample_env());
        let result = registry
            .execute_by_name("delete_everything", RawToolArgs::from(""))
            .await;
        assert_eq!(
            result,
            ToolExecutionResult::failure("Unknown tool: delete_everything")
        );
    }

    #[tokio::test]
    async fn test_string_arguments_executed() {
        let registry = registry(sample_env());
        let result = registry
            .execute_by_name(
                GET_HOLDINGS,
                RawToolArgs::from(r#"{"filter":{"type":"stock"}}"#),
            )
            .await;
        let ToolExecutionResult::Success {
            data,
            data_provenance,
        } = result
        else {
            panic!("expected success");
        };
        let values: Vec<f64> = data["holdings"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| h["marketValue"].as_f64().unwrap())
            .collect();
        assert_eq!(values, vec![300.0, 200.0, 100.0]);
        assert_eq!(data_provenance[0], SRC_LIST_HOLDINGS);
    }

    #[tokio::test]
    async fn test_blank_arguments_use_defaults() {
        let registry = registry(sample_env());
        let result = registry
            .execute_by_name(GET_PORTFOLIO_SNAPSHOT, RawToolArgs::from("  "))
            .await;
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_unknown_field_is_failure() {
        let registry = registry(sample_env());
        let result = registry
            .execute_by_name(
                GET_HOLDINGS,
                RawToolArgs::from(serde_json::json!({ "sortBy": "name" })),
            )
            .await;
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn test_validation_message_surfaces() {
        let registry = registry(sample_env());
        let result = registry
            .execute_by_name(
                SIMULATE_TRADE,
                RawToolArgs::from(serde_json::json!({ "symbol": "AAA", "side": "buy" })),
            )
            .await;
        assert_eq!(
            result,
            ToolExecutionResult::failure("Provide quantity or amount")
        );
    }

    #[tokio::test]
    async fn test_repository_error_is_failure() {
        let registry = registry(sample_env().with_failing_portfolio());
        let result = registry
            .execute_by_name(GET_HOLDINGS, RawToolArgs::from(serde_json::json!({})))
            .await;
        let value = result.to_value();
        assert_eq!(value["success"], false);
        assert!(value["error"].as_str().unwrap().contains("connection lost"));
    }

    #[tokio::test]
    async fn test_research_service_error_is_failure() {
        let registry = registry(sample_env().with_offline_research());

        let search = registry
            .execute_by_name(
                SEARCH_RESEARCH,
                RawToolArgs::from(serde_json::json!({ "query": "margin" })),
            )
            .await;
        assert!(!search.is_success());
        let value = search.to_value();
        assert_eq!(
            value["error"],
            "Tool execution failed: Research service error: research index offline"
        );

        let run = registry
            .execute_by_name(
                RUN_RESEARCH,
                RawToolArgs::from(serde_json::json!({ "symbol": "nvda" })),
            )
            .await;
        assert!(!run.is_success());
        assert!(run.to_value()["error"]
            .as_str()
            .unwrap()
            .contains("research index offline"));
    }
}
