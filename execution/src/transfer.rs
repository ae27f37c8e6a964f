//! Hand-off point between decided payouts and the external payment rail.

use gambit_types::escrow::{Context, Recipient};
use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex},
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("payment rail unavailable: {0}")]
    Unavailable(String),
    #[error("recipient rejected credit")]
    Rejected,
}

/// Moves value to a recipient's account. The engine calls this only after
/// the decision to pay has been committed, at most once per successful
/// credit.
pub trait Transfer: Send + Sync {
    fn credit(
        &self,
        context: Context,
        recipient: &Recipient,
        amount: u64,
    ) -> impl Future<Output = Result<(), TransferError>> + Send;
}

/// In-process balances keyed by recipient.
#[derive(Clone, Default)]
pub struct Ledger {
    balances: Arc<Mutex<HashMap<Recipient, u64>>>,
}

impl Ledger {
    pub fn balance(&self, recipient: &Recipient) -> u64 {
        match self.balances.lock() {
            Ok(balances) => balances.get(recipient).copied().unwrap_or_default(),
            Err(poisoned) => poisoned
                .into_inner()
                .get(recipient)
                .copied()
                .unwrap_or_default(),
        }
    }

    /// Sum of every balance.
    pub fn total(&self) -> u64 {
        match self.balances.lock() {
            Ok(balances) => balances.values().sum(),
            Err(poisoned) => poisoned.into_inner().values().sum(),
        }
    }
}

impl Transfer for Ledger {
    async fn credit(
        &self,
        _context: Context,
        recipient: &Recipient,
        amount: u64,
    ) -> Result<(), TransferError> {
        let mut balances = self
            .balances
            .lock()
            .map_err(|e| TransferError::Unavailable(e.to_string()))?;
        let balance = balances.entry(recipient.clone()).or_default();
        *balance = balance.checked_add(amount).ok_or(TransferError::Rejected)?;
        Ok(())
    }
}
