//! Portfolio module - holdings, transactions, notes, alerts and the repository trait.

mod portfolio_model;
mod portfolio_traits;

pub use portfolio_model::{
    AlertCondition, Holding, HoldingType, NewNote, NewPriceAlert, Note, PriceAlert, PricePoint,
    Transaction, TransactionKind,
};
pub use portfolio_traits::PortfolioRepositoryTrait;
