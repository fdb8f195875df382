use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency an account is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Eur,
}

impl Currency {
    /// The symbol the portal renders after the fractional balance part.
    pub fn symbol(&self) -> char {
        match self {
            Currency::Eur => '€',
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// One account whose balance should be fetched, keyed by the identifier the
/// portal prints on its tile.
#[derive(Debug, Clone)]
pub struct AccountRequest {
    pub account_id: String,
    pub currency: Currency,
}

impl AccountRequest {
    pub fn eur(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            currency: Currency::Eur,
        }
    }
}

/// A balance scraped from the portal during one login attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    pub amount: Decimal,
    pub currency: Currency,
    pub retrieved_at: DateTime<Utc>,
}

impl Balance {
    pub fn now(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount,
            currency,
            retrieved_at: Utc::now(),
        }
    }
}
