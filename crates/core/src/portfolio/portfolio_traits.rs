use crate::errors::Result;
use crate::portfolio::portfolio_model::{
    Holding, NewNote, NewPriceAlert, Note, PriceAlert, PricePoint, Transaction,
};
use async_trait::async_trait;

/// Trait for portfolio repository operations.
///
/// Reads are synchronous, writes are async, mirroring how the storage layer
/// serialises writes through a single writer.
#[async_trait]
pub trait PortfolioRepositoryTrait: Send + Sync {
    fn list_holdings(&self) -> Result<Vec<Holding>>;
    fn get_holding(&self, holding_id: &str) -> Result<Option<Holding>>;
    fn list_transactions(&self, holding_id: &str) -> Result<Vec<Transaction>>;
    fn list_price_history(&self, holding_id: &str) -> Result<Vec<PricePoint>>;
    fn list_notes(&self, holding_id: Option<&str>) -> Result<Vec<Note>>;
    fn list_price_alerts(&self, holding_id: Option<&str>) -> Result<Vec<PriceAlert>>;
    async fn insert_note(&self, new_note: NewNote) -> Result<Note>;
    async fn insert_price_alert(&self, new_alert: NewPriceAlert) -> Result<PriceAlert>;
}
