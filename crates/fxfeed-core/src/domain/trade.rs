use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validate;
use crate::error::{DomainError, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    Buy,
    Sell,
}

/// Entry in `users/{uid}/tradingHistory`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub pair: String,
    pub direction: TradeDirection,
    pub amount: f64,
    pub entry_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<f64>,
    #[serde(default)]
    pub profit: f64,
    pub opened_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

/// A closed trade to add to the history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TradeDraft {
    pub pair: String,
    pub direction: TradeDirection,
    pub amount: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    #[serde(default)]
    pub opened_at: Option<DateTime<Utc>>,
}

impl TradeDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = ValidationErrors::default();
        validate::required(&mut errors, "pair", &self.pair);
        if !self.amount.is_finite() || self.amount <= 0.0 {
            errors.push("amount", "must be positive");
        }
        if !self.entry_price.is_finite() || self.entry_price <= 0.0 {
            errors.push("entryPrice", "must be positive");
        }
        if !self.exit_price.is_finite() || self.exit_price <= 0.0 {
            errors.push("exitPrice", "must be positive");
        }
        errors.into_result()
    }

    /// Realized profit in quote currency.
    pub fn profit(&self) -> f64 {
        let delta = self.exit_price - self.entry_price;
        match self.direction {
            TradeDirection::Buy => delta * self.amount,
            TradeDirection::Sell => -delta * self.amount,
        }
    }

    pub fn into_record(self, id: String, now: DateTime<Utc>) -> TradeRecord {
        let profit = self.profit();
        TradeRecord {
            id,
            pair: self.pair.trim().to_uppercase(),
            direction: self.direction,
            amount: self.amount,
            entry_price: self.entry_price,
            exit_price: Some(self.exit_price),
            profit,
            opened_at: self.opened_at.unwrap_or(now),
            closed_at: Some(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(direction: TradeDirection, entry: f64, exit: f64) -> TradeDraft {
        TradeDraft {
            pair: "eur/usd".into(),
            direction,
            amount: 1000.0,
            entry_price: entry,
            exit_price: exit,
            opened_at: None,
        }
    }

    #[test]
    fn test_profit_by_direction() {
        let long = draft(TradeDirection::Buy, 1.0850, 1.0900);
        assert!((long.profit() - 5.0).abs() < 1e-9);

        let short = draft(TradeDirection::Sell, 1.0850, 1.0900);
        assert!((short.profit() + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let mut d = draft(TradeDirection::Buy, 1.0, 1.1);
        d.amount = 0.0;
        assert!(d.validate().is_err());
    }
}
