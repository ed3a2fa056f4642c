//! Research tools - trigger a report and keyword search across stored reports.

use chrono::{DateTime, Utc};
use folio_core::research::{ResearchReport, ResearchRequest, ResearchStatus};
use rig::{completion::ToolDefinition, tool::Tool};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::common::{core_err, resolve_holding};
use super::constants::{
    DEFAULT_RESEARCH_RESULTS, MAX_RESEARCH_RESULTS, RUN_RESEARCH, SEARCH_RESEARCH,
    SNIPPET_RADIUS_CHARS, SRC_LIST_REPORTS, SRC_REQUEST_REPORT,
};
use super::invocation::{Traced, ValidateArgs};
use crate::env::AiEnvironment;
use crate::error::AiError;

// ============================================================================
// run_research
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RunResearchArgs {
    #[serde(default)]
    pub holding_id: Option<String>,
    /// Any ticker, held or not.
    #[serde(default)]
    pub symbol: Option<String>,
    /// What the report should concentrate on.
    #[serde(default)]
    pub focus: Option<String>,
}

impl ValidateArgs for RunResearchArgs {
    fn validate(&self) -> Result<(), String> {
        super::common::require_holding_ref(self.holding_id.as_deref(), self.symbol.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResearchOutput {
    pub job_id: String,
    pub symbol: String,
    pub status: ResearchStatus,
    pub requested_at: DateTime<Utc>,
}

pub struct RunResearchTool<E: AiEnvironment> {
    env: Arc<E>,
}

impl<E: AiEnvironment> RunResearchTool<E> {
    pub fn new(env: Arc<E>) -> Self {
        Self { env }
    }
}

impl<E: AiEnvironment + 'static> Tool for RunResearchTool<E> {
    const NAME: &'static str = RUN_RESEARCH;

    type Error = AiError;
    type Args = RunResearchArgs;
    type Output = Traced<RunResearchOutput>;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Start generating a research report for a symbol or holding. The report is produced in the background; use search_research later to read it.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "holdingId": { "type": "string" },
                    "symbol": { "type": "string" },
                    "focus": { "type": "string", "description": "Topic to concentrate on, e.g. 'valuation' or 'dividend safety'" }
                },
                "required": [],
                "additionalProperties": false
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let mut provenance = Vec::new();

        let (holding_id, symbol) = match args.holding_id.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(id) => {
                let repo = self.env.portfolio_repository();
                let holding = resolve_holding(repo.as_ref(), Some(id), None, &mut provenance)?;
                (Some(holding.id), holding.symbol)
            }
            None => {
                let symbol = args
                    .symbol
                    .as_deref()
                    .map(|s| s.trim().to_uppercase())
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| AiError::invalid_input("Provide either holdingId or symbol"))?;
                (None, symbol)
            }
        };

        let job = self
            .env
            .research_service()
            .request_report(ResearchRequest {
                holding_id,
                symbol,
                focus: args.focus.map(|f| f.trim().to_string()).filter(|f| !f.is_empty()),
                requested_at: Utc::now(),
            })
            .await
            .map_err(core_err)?;
        provenance.push(SRC_REQUEST_REPORT.to_string());

        Ok(Traced::new(
            RunResearchOutput {
                job_id: job.id,
                symbol: job.symbol,
                status: job.status,
                requested_at: job.requested_at,
            },
            provenance,
        ))
    }
}

// ============================================================================
// search_research
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SearchResearchArgs {
    pub query: String,
    /// Restrict to reports about this symbol.
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ValidateArgs for SearchResearchArgs {
    fn validate(&self) -> Result<(), String> {
        if self.query.trim().is_empty() {
            return Err("query must not be empty".to_string());
        }
        if let Some(limit) = self.limit {
            if limit == 0 || limit > MAX_RESEARCH_RESULTS {
                return Err(format!("limit must be between 1 and {}", MAX_RESEARCH_RESULTS));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchHit {
    pub report_id: String,
    pub report_title: String,
    pub symbol: Option<String>,
    pub section_title: String,
    pub snippet: String,
    pub score: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResearchOutput {
    pub query: String,
    pub results: Vec<ResearchHit>,
    pub total_matches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated: Option<bool>,
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

/// Score a section: every term must appear; title hits count double.
fn score_section(title: &str, content: &str, terms: &[String]) -> Option<usize> {
    let title = title.to_lowercase();
    let content = content.to_lowercase();
    let mut score = 0;
    for term in terms {
        let in_title = count_occurrences(&title, term);
        let in_content = count_occurrences(&content, term);
        if in_title + in_content == 0 {
            return None;
        }
        score += in_title * 2 + in_content;
    }
    Some(score)
}

/// Text around the first match of `term`, in the original casing.
fn snippet(content: &str, term: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let lower = content.to_lowercase();
    // Lowercasing can change the char count; fall back to the start then.
    let position = if lower.chars().count() == chars.len() {
        lower
            .find(term)
            .map(|byte_idx| lower[..byte_idx].chars().count())
            .unwrap_or(0)
    } else {
        0
    };

    let start = position.saturating_sub(SNIPPET_RADIUS_CHARS);
    let end = (position + term.chars().count() + SNIPPET_RADIUS_CHARS).min(chars.len());
    let mut text: String = chars[start..end].iter().collect();
    text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if start > 0 {
        text.insert_str(0, "...");
    }
    if end < chars.len() {
        text.push_str("...");
    }
    text
}

fn search_reports(reports: &[ResearchReport], args: &SearchResearchArgs) -> Vec<ResearchHit> {
    let terms: Vec<String> = args
        .query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();
    let symbol = args.symbol.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let mut hits = Vec::new();
    for report in reports {
        if let Some(symbol) = symbol {
            let matches = report
                .symbol
                .as_deref()
                .map(|s| s.eq_ignore_ascii_case(symbol))
                .unwrap_or(false);
            if !matches {
                continue;
            }
        }
        for section in &report.sections {
            if let Some(score) = score_section(&section.title, &section.content, &terms) {
                hits.push(ResearchHit {
                    report_id: report.id.clone(),
                    report_title: report.title.clone(),
                    symbol: report.symbol.clone(),
                    section_title: section.title.clone(),
                    snippet: snippet(&section.content, &terms[0]),
                    score,
                    created_at: report.created_at,
                });
            }
        }
    }

    hits.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    hits
}

pub struct SearchResearchTool<E: AiEnvironment> {
    env: Arc<E>,
}

impl<E: AiEnvironment> SearchResearchTool<E> {
    pub fn new(env: Arc<E>) -> Self {
        Self { env }
    }
}

impl<E: AiEnvironment + 'static> Tool for SearchResearchTool<E> {
    const NAME: &'static str = SEARCH_RESEARCH;

    type Error = AiError;
    type Args = SearchResearchArgs;
    type Output = Traced<SearchResearchOutput>;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Keyword search across previously generated research reports. Every word in the query must appear in a section. Returns the best matching sections with a snippet.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                    "symbol": { "type": "string", "description": "Only reports about this symbol" },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_RESEARCH_RESULTS,
                        "default": DEFAULT_RESEARCH_RESULTS
                    }
                },
                "required": ["query"],
                "additionalProperties": false
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let reports = self
            .env
            .research_service()
            .list_reports()
            .map_err(core_err)?;

        let mut results = search_reports(&reports, &args);
        let total_matches = results.len();
        results.truncate(args.limit.unwrap_or(DEFAULT_RESEARCH_RESULTS));

        Ok(Traced::new(
            SearchResearchOutput {
                query: args.query,
                truncated: (total_matches > results.len()).then_some(true),
                results,
                total_matches,
            },
            vec![SRC_LIST_REPORTS.to_string()],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::test_env::{holding, report, MockEnvironment};
    use folio_core::portfolio::HoldingType;
    use rust_decimal_macros::dec;

    fn env() -> Arc<MockEnvironment> {
        Arc::new(
            MockEnvironment::new()
                .with_holdings(vec![holding(
                    "h1",
                    "KO",
                    HoldingType::Stock,
                    dec!(10),
                    dec!(60),
                )])
                .with_reports(vec![
                    report(
                        "r1",
                        "KO",
                        &[
                            ("Dividend safety", "The dividend is covered by free cash flow. Dividend growth has been steady."),
                            ("Valuation", "Shares trade at a premium to peers."),
                        ],
                    ),
                    report(
                        "r2",
                        "PEP",
                        &[("Overview", "Snacks offset beverage weakness; the dividend yield is 3%.")],
                    ),
                ]),
        )
    }

    #[tokio::test]
    async fn test_search_scores_and_filters() {
        let tool = SearchResearchTool::new(env());
        let output = tool
            .call(SearchResearchArgs {
                query: "Dividend".to_string(),
                symbol: None,
                limit: None,
            })
            .await
            .unwrap();

        let results = &output.data.results;
        assert_eq!(output.data.total_matches, 2);
        assert_eq!(results[0].report_id, "r1");
        assert_eq!(results[0].section_title, "Dividend safety");
        // title x2 + two content hits
        assert_eq!(results[0].score, 4);
        assert!(results[0].snippet.contains("dividend is covered"));
        assert_eq!(output.data_provenance, vec!["research.list_reports"]);
    }

    #[tokio::test]
    async fn test_search_requires_all_terms_and_symbol() {
        let tool = SearchResearchTool::new(env());
        let output = tool
            .call(SearchResearchArgs {
                query: "dividend yield".to_string(),
                symbol: Some("ko".to_string()),
                limit: None,
            })
            .await
            .unwrap();
        assert!(output.data.results.is_empty());
    }

    #[test]
    fn test_snippet_window() {
        let content = format!("{} needle {}", "a ".repeat(100), "b ".repeat(100));
        let text = snippet(&content, "needle");
        assert!(text.starts_with("..."));
        assert!(text.ends_with("..."));
        assert!(text.contains("needle"));
    }

    #[tokio::test]
    async fn test_run_research_for_holding() {
        let env = env();
        let tool = RunResearchTool::new(env.clone());
        let output = tool
            .call(RunResearchArgs {
                holding_id: Some("h1".to_string()),
                symbol: None,
                focus: Some(" dividends ".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(output.data.symbol, "KO");
        assert_eq!(output.data.status, ResearchStatus::Queued);
        assert_eq!(
            output.data_provenance,
            vec!["repository.get_holding", "research.request_report"]
        );
        let requests = env.research.requests.read().unwrap();
        assert_eq!(requests[0].focus.as_deref(), Some("dividends"));
        assert_eq!(requests[0].holding_id.as_deref(), Some("h1"));
    }

    #[tokio::test]
    async fn test_run_research_for_unheld_symbol() {
        let tool = RunResearchTool::new(env());
        let output = tool
            .call(RunResearchArgs {
                holding_id: None,
                symbol: Some("nvda".to_string()),
                focus: None,
            })
            .await
            .unwrap();
        assert_eq!(output.data.symbol, "NVDA");
        assert_eq!(output.data_provenance, vec!["research.request_report"]);
    }
}
