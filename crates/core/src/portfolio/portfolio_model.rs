//! Portfolio domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of instrument a holding represents.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HoldingType {
    Stock,
    Etf,
    Fund,
    Bond,
    Crypto,
    Cash,
    Other,
}

impl HoldingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoldingType::Stock => "stock",
            HoldingType::Etf => "etf",
            HoldingType::Fund => "fund",
            HoldingType::Bond => "bond",
            HoldingType::Crypto => "crypto",
            HoldingType::Cash => "cash",
            HoldingType::Other => "other",
        }
    }
}

impl fmt::Display for HoldingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HoldingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stock" | "equity" => Ok(HoldingType::Stock),
            "etf" => Ok(HoldingType::Etf),
            "fund" | "mutualfund" => Ok(HoldingType::Fund),
            "bond" => Ok(HoldingType::Bond),
            "crypto" => Ok(HoldingType::Crypto),
            "cash" => Ok(HoldingType::Cash),
            "other" => Ok(HoldingType::Other),
            _ => Err(format!("Unknown holding type: {}", s)),
        }
    }
}

/// A position held in an account.
///
/// `price` is the latest known unit price in the holding currency. Cash
/// positions carry the balance in `quantity` with a unit price of one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    pub name: Option<String>,
    pub holding_type: HoldingType,
    pub quantity: Decimal,
    pub price: Decimal,
    /// Total cost of the position, when known.
    pub cost_basis: Option<Decimal>,
    pub currency: String,
    pub updated_at: DateTime<Utc>,
}

impl Holding {
    pub fn is_cash(&self) -> bool {
        self.holding_type == HoldingType::Cash
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Buy,
    Sell,
    Dividend,
    Deposit,
    Withdrawal,
    Fee,
}

/// A recorded transaction against a holding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub holding_id: String,
    pub kind: TransactionKind,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub fee: Decimal,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
}

impl Transaction {
    /// Gross amount of the transaction (quantity times unit price).
    pub fn amount(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

/// Daily closing price for a holding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub holding_id: String,
    pub date: NaiveDate,
    pub close: Decimal,
}

/// A free-form note, optionally attached to a holding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub holding_id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Input model for appending a note.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub holding_id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertCondition {
    Above,
    Below,
}

/// A price alert on a holding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
    pub id: String,
    pub holding_id: String,
    pub symbol: String,
    pub condition: AlertCondition,
    pub target_price: Decimal,
    pub note: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input model for creating a price alert.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewPriceAlert {
    pub holding_id: String,
    pub symbol: String,
    pub condition: AlertCondition,
    pub target_price: Decimal,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holding_type_round_trips_through_str() {
        for t in [
            HoldingType::Stock,
            HoldingType::Etf,
            HoldingType::Cash,
            HoldingType::Crypto,
        ] {
            assert_eq!(t.as_str().parse::<HoldingType>().unwrap(), t);
        }
        assert_eq!("Equity".parse::<HoldingType>().unwrap(), HoldingType::Stock);
        assert!("warrant".parse::<HoldingType>().is_err());
    }

    #[test]
    fn test_transaction_amount() {
        let tx = Transaction {
            id: "t1".to_string(),
            holding_id: "h1".to_string(),
            kind: TransactionKind::Buy,
            quantity: Decimal::new(15, 1),
            unit_price: Decimal::new(200, 0),
            fee: Decimal::ZERO,
            date: Utc::now(),
            note: None,
        };
        assert_eq!(tx.amount(), Decimal::new(300, 0));
    }
}
