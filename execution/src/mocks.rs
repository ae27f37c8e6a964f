use crate::{Ledger, Transfer, TransferError, ValidatedConfig};
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    PrivateKeyExt, Signer,
};
use gambit_types::escrow::{Context, Recipient};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::Level;

/// Creates an account keypair for Ed25519 signatures used by players
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let mut rng = StdRng::seed_from_u64(seed);
    let private = PrivateKey::from_rng(&mut rng);
    let public = private.public_key();
    (private, public)
}

/// Wide bounds with a 2.5% platform fee
pub fn test_config() -> ValidatedConfig {
    ValidatedConfig {
        min_stake: 1,
        max_stake: 1_000_000,
        min_entry_fee: 1,
        max_entry_fee: 1_000_000,
        max_tournament_players: 256,
        platform_fee_bps: 250,
        log_level: Level::DEBUG,
    }
}

/// A [Ledger] whose first `failures` credits are refused as unavailable.
#[derive(Default)]
pub struct FlakyTransfer {
    pub ledger: Ledger,
    failures: AtomicUsize,
    attempts: AtomicUsize,
}

impl FlakyTransfer {
    pub fn failing(failures: usize) -> Self {
        Self {
            ledger: Ledger::default(),
            failures: AtomicUsize::new(failures),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Number of credits attempted, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }
}

impl Transfer for FlakyTransfer {
    async fn credit(
        &self,
        context: Context,
        recipient: &Recipient,
        amount: u64,
    ) -> Result<(), TransferError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        let failing = self
            .failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |left| {
                left.checked_sub(1)
            })
            .is_ok();
        if failing {
            return Err(TransferError::Unavailable("rail offline".to_string()));
        }
        self.ledger.credit(context, recipient, amount).await
    }
}
