//! Valuation arithmetic shared by services and AI tools.
//!
//! Everything here is pure: inputs are domain models, outputs are `Decimal`
//! figures in the holding currency. Currency conversion happens upstream.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::portfolio::{Holding, HoldingType};

/// Market value of a holding (quantity x latest price).
pub fn market_value(holding: &Holding) -> Decimal {
    holding.quantity * holding.price
}

/// Unrealized gain, when the cost basis is known.
pub fn unrealized_gain(holding: &Holding) -> Option<Decimal> {
    holding.cost_basis.map(|cost| market_value(holding) - cost)
}

/// Unrealized gain as a fraction of cost. None when cost is unknown or zero.
pub fn unrealized_gain_pct(holding: &Holding) -> Option<Decimal> {
    let cost = holding.cost_basis?;
    if cost.is_zero() {
        return None;
    }
    Some((market_value(holding) - cost) / cost)
}

pub fn total_market_value<'a, I>(holdings: I) -> Decimal
where
    I: IntoIterator<Item = &'a Holding>,
{
    holdings.into_iter().map(market_value).sum()
}

/// Fraction of `total` represented by `value`; zero when the total is zero.
pub fn weight_of(value: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        Decimal::ZERO
    } else {
        value / total
    }
}

/// Relative change between two prices. None when the starting price is zero.
pub fn price_change_pct(first: Decimal, last: Decimal) -> Option<Decimal> {
    if first.is_zero() {
        None
    } else {
        Some((last - first) / first)
    }
}

/// Aggregate figures for a set of holdings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_value: Decimal,
    pub invested_value: Decimal,
    pub cash_value: Decimal,
    /// Cost of the non-cash holdings that report a cost basis.
    pub total_cost: Decimal,
    pub unrealized_gain: Decimal,
    pub unrealized_gain_pct: Option<Decimal>,
    pub holdings_count: usize,
}

pub fn portfolio_summary(holdings: &[Holding]) -> PortfolioSummary {
    let mut total_value = Decimal::ZERO;
    let mut cash_value = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;
    let mut costed_value = Decimal::ZERO;

    for holding in holdings {
        let value = market_value(holding);
        total_value += value;
        if holding.is_cash() {
            cash_value += value;
            continue;
        }
        if let Some(cost) = holding.cost_basis {
            total_cost += cost;
            costed_value += value;
        }
    }

    let unrealized_gain = costed_value - total_cost;
    let unrealized_gain_pct = if total_cost.is_zero() {
        None
    } else {
        Some(unrealized_gain / total_cost)
    };

    PortfolioSummary {
        total_value,
        invested_value: total_value - cash_value,
        cash_value,
        total_cost,
        unrealized_gain,
        unrealized_gain_pct,
        holdings_count: holdings.len(),
    }
}

/// Value and weight of one holding type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSlice {
    pub holding_type: HoldingType,
    pub value: Decimal,
    pub weight: Decimal,
}

/// Allocation by holding type, largest slice first.
pub fn allocation_by_type(holdings: &[Holding]) -> Vec<AllocationSlice> {
    let total = total_market_value(holdings);
    let mut by_type: HashMap<HoldingType, Decimal> = HashMap::new();
    for holding in holdings {
        *by_type.entry(holding.holding_type).or_default() += market_value(holding);
    }

    let mut slices: Vec<AllocationSlice> = by_type
        .into_iter()
        .map(|(holding_type, value)| AllocationSlice {
            holding_type,
            value,
            weight: weight_of(value, total),
        })
        .collect();
    slices.sort_by(|a, b| {
        b.value
            .cmp(&a.value)
            .then_with(|| a.holding_type.as_str().cmp(b.holding_type.as_str()))
    });
    slices
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn holding(id: &str, holding_type: HoldingType, qty: Decimal, price: Decimal) -> Holding {
        Holding {
            id: id.to_string(),
            account_id: "acc-1".to_string(),
            symbol: id.to_uppercase(),
            name: None,
            holding_type,
            quantity: qty,
            price,
            cost_basis: None,
            currency: "USD".to_string(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_market_value_and_gain() {
        let mut h = holding("aapl", HoldingType::Stock, dec!(10), dec!(15));
        assert_eq!(market_value(&h), dec!(150));
        assert_eq!(unrealized_gain(&h), None);

        h.cost_basis = Some(dec!(100));
        assert_eq!(unrealized_gain(&h), Some(dec!(50)));
        assert_eq!(unrealized_gain_pct(&h), Some(dec!(0.5)));

        h.cost_basis = Some(Decimal::ZERO);
        assert_eq!(unrealized_gain_pct(&h), None);
    }

    #[test]
    fn test_weight_of_zero_total() {
        assert_eq!(weight_of(dec!(10), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(weight_of(dec!(25), dec!(100)), dec!(0.25));
    }

    #[test]
    fn test_portfolio_summary_separates_cash() {
        let mut stock = holding("msft", HoldingType::Stock, dec!(2), dec!(100));
        stock.cost_basis = Some(dec!(150));
        let cash = holding("usd", HoldingType::Cash, dec!(50), dec!(1));

        let summary = portfolio_summary(&[stock, cash]);
        assert_eq!(summary.total_value, dec!(250));
        assert_eq!(summary.cash_value, dec!(50));
        assert_eq!(summary.invested_value, dec!(200));
        assert_eq!(summary.total_cost, dec!(150));
        assert_eq!(summary.unrealized_gain, dec!(50));
        assert_eq!(summary.holdings_count, 2);
    }

    #[test]
    fn test_allocation_by_type_sorted_by_value() {
        let holdings = vec![
            holding("a", HoldingType::Stock, dec!(1), dec!(100)),
            holding("b", HoldingType::Etf, dec!(1), dec!(300)),
            holding("c", HoldingType::Stock, dec!(1), dec!(100)),
        ];
        let slices = allocation_by_type(&holdings);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].holding_type, HoldingType::Etf);
        assert_eq!(slices[0].weight, dec!(0.6));
        assert_eq!(slices[1].value, dec!(200));
    }

    #[test]
    fn test_price_change_pct() {
        assert_eq!(price_change_pct(dec!(100), dec!(110)), Some(dec!(0.1)));
        assert_eq!(price_change_pct(Decimal::ZERO, dec!(1)), None);
    }
}
