//! Custody arithmetic for a single escrow context.
//!
//! These functions mutate a [Custody] record in place and either apply
//! the whole change or return an error with the record untouched.

use crate::Error;
use gambit_types::{
    escrow::{Context, Custody, Deposit, Payout, Recipient, MAX_LEDGER_ENTRIES},
    PublicKey,
};

/// Add `amount` from `depositor` to the value held for `custody.context`.
pub fn deposit(custody: &mut Custody, depositor: PublicKey, amount: u64) -> Result<(), Error> {
    if amount == 0 {
        return Err(Error::InvalidAmount);
    }
    if custody.deposits.len() >= MAX_LEDGER_ENTRIES {
        return Err(Error::Overflow);
    }
    custody
        .deposited()
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    custody.deposits.push(Deposit { depositor, amount });
    Ok(())
}

/// Release `amount` to `recipient`. Only the escrow that owns the context
/// (`authority`) may release, and never more than is currently held.
pub fn release(
    custody: &mut Custody,
    authority: Context,
    recipient: Recipient,
    amount: u64,
) -> Result<(), Error> {
    if authority != custody.context {
        return Err(Error::Unauthorized);
    }
    if amount == 0 {
        return Err(Error::InvalidAmount);
    }
    if amount > custody.custodied_amount() {
        return Err(Error::InsufficientEscrow);
    }
    if custody.payouts.len() >= MAX_LEDGER_ENTRIES {
        return Err(Error::Overflow);
    }
    custody.released += amount;
    custody.payouts.push(Payout {
        recipient,
        amount,
        settled: false,
    });
    Ok(())
}

/// Mark the payout at `index` as credited by the transfer sink.
pub fn settle(custody: &mut Custody, index: usize) -> bool {
    match custody.payouts.get_mut(index) {
        Some(payout) if !payout.settled => {
            payout.settled = true;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::create_account_keypair;

    #[test]
    fn test_deposit_rejects_zero() {
        let (_, alice) = create_account_keypair(1);
        let mut custody = Custody::new(Context::Game(1));
        assert_eq!(deposit(&mut custody, alice, 0), Err(Error::InvalidAmount));
        assert!(custody.deposits.is_empty());
    }

    #[test]
    fn test_deposit_overflow() {
        let (_, alice) = create_account_keypair(1);
        let (_, bob) = create_account_keypair(2);
        let mut custody = Custody::new(Context::Game(1));
        deposit(&mut custody, alice, u64::MAX - 1).unwrap();
        assert_eq!(deposit(&mut custody, bob, 2), Err(Error::Overflow));
        assert_eq!(custody.custodied_amount(), u64::MAX - 1);
    }

    #[test]
    fn test_release_requires_owner_context() {
        let (_, alice) = create_account_keypair(1);
        let mut custody = Custody::new(Context::Game(1));
        deposit(&mut custody, alice.clone(), 100).unwrap();

        for intruder in [Context::Game(2), Context::Tournament(1)] {
            assert_eq!(
                release(&mut custody, intruder, Recipient::Player(alice.clone()), 10),
                Err(Error::Unauthorized)
            );
        }
        assert_eq!(custody.custodied_amount(), 100);
        assert!(custody.payouts.is_empty());
    }

    #[test]
    fn test_release_never_truncates() {
        let (_, alice) = create_account_keypair(1);
        let mut custody = Custody::new(Context::Tournament(4));
        deposit(&mut custody, alice.clone(), 100).unwrap();
        release(&mut custody, Context::Tournament(4), Recipient::Platform, 30).unwrap();

        // 70 remain; asking for 71 must fail outright rather than pay 70
        assert_eq!(
            release(
                &mut custody,
                Context::Tournament(4),
                Recipient::Player(alice.clone()),
                71
            ),
            Err(Error::InsufficientEscrow)
        );
        assert_eq!(custody.custodied_amount(), 70);
        assert_eq!(custody.payouts.len(), 1);

        release(
            &mut custody,
            Context::Tournament(4),
            Recipient::Player(alice),
            70,
        )
        .unwrap();
        assert_eq!(custody.custodied_amount(), 0);
        assert_eq!(custody.released, custody.deposited());
    }

    #[test]
    fn test_settle_once() {
        let (_, alice) = create_account_keypair(1);
        let mut custody = Custody::new(Context::Game(1));
        deposit(&mut custody, alice.clone(), 5).unwrap();
        release(&mut custody, Context::Game(1), Recipient::Player(alice), 5).unwrap();

        assert!(settle(&mut custody, 0));
        assert!(!settle(&mut custody, 0));
        assert!(!settle(&mut custody, 1));
        assert_eq!(custody.unsettled().count(), 0);
    }
}
