use crate::errors::Result;
use crate::research::research_model::{ResearchJob, ResearchReport, ResearchRequest};
use async_trait::async_trait;

/// Trait for the research feature: stored reports and report generation.
#[async_trait]
pub trait ResearchServiceTrait: Send + Sync {
    /// List previously generated reports, newest first.
    fn list_reports(&self) -> Result<Vec<ResearchReport>>;

    /// Queue generation of a new report.
    async fn request_report(&self, request: ResearchRequest) -> Result<ResearchJob>;
}
