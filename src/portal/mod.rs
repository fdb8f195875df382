//! Institution adapters that turn an authenticated browser session into
//! account balances.

mod caisse_epargne;

pub use caisse_epargne::CaisseEpargne;

use thiserror::Error;

use crate::balance::BalanceError;
use crate::keypad::{KeypadError, PasswordError};
use crate::poll::PollError;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error(transparent)]
    Keypad(#[from] KeypadError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error(transparent)]
    Balance(#[from] BalanceError),

    /// Discovery finished but some requested accounts had no tile.
    #[error("accounts not found: {}", account_ids.join(", "))]
    AccountsNotFound { account_ids: Vec<String> },

    /// A tile rendered an unexpected number of balance fragments.
    #[error("expected two balance fragments per tile, found {found}")]
    BalanceFragments { found: usize },

    #[error(transparent)]
    Browser(#[from] anyhow::Error),
}
