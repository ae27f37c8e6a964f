//! Platform fee arithmetic.
//!
//! Fees are expressed in basis points and always rounded down, so the
//! platform never takes more than its configured share. Every split is
//! exact: the parts always sum back to the input.

use crate::Error;
use gambit_types::escrow::{BPS_DENOMINATOR, MAX_PLATFORM_FEE_BPS};

/// A fee deduction and the amount left over for recipients.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Split {
    pub fee: u64,
    pub net: u64,
}

/// `fee = floor(total * fee_bps / 10_000)`, `net = total - fee`.
pub fn split(total: u64, fee_bps: u16) -> Split {
    // Widen so `total * fee_bps` cannot overflow; the quotient is <= total.
    let fee = (total as u128 * fee_bps as u128 / BPS_DENOMINATOR as u128) as u64;
    Split {
        fee,
        net: total - fee,
    }
}

/// Halve `total`. An odd remainder unit goes to the first share.
pub fn even_split(total: u64) -> (u64, u64) {
    let second = total / 2;
    (total - second, second)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeePolicy {
    fee_bps: u16,
}

impl FeePolicy {
    pub fn new(fee_bps: u16) -> Result<Self, Error> {
        if fee_bps > MAX_PLATFORM_FEE_BPS {
            return Err(Error::FeeTooHigh);
        }
        Ok(Self { fee_bps })
    }

    pub fn fee_bps(&self) -> u16 {
        self.fee_bps
    }

    pub fn split(&self, total: u64) -> Split {
        split(total, self.fee_bps)
    }

    /// Take the fee from the pooled `total`, then halve what is left.
    pub fn draw(&self, total: u64) -> (u64, (u64, u64)) {
        let Split { fee, net } = self.split(total);
        (fee, even_split(net))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_rounds_fee_down() {
        assert_eq!(split(200, 250), Split { fee: 5, net: 195 });
        assert_eq!(split(202, 500), Split { fee: 10, net: 192 });
        assert_eq!(split(40, 500), Split { fee: 2, net: 38 });
        assert_eq!(split(19, 500), Split { fee: 0, net: 19 });
        assert_eq!(split(0, 1_000), Split { fee: 0, net: 0 });
    }

    #[test]
    fn test_split_conserves_value() {
        for total in [1, 2, 3, 99, 101, 202, 9_999, 10_001, u64::MAX] {
            for bps in [0, 1, 250, 333, 500, 999, 1_000] {
                let Split { fee, net } = split(total, bps);
                assert_eq!(fee + net, total, "total={total} bps={bps}");
            }
        }
    }

    #[test]
    fn test_split_large_total_does_not_overflow() {
        let Split { fee, net } = split(u64::MAX, 1_000);
        assert_eq!(fee, u64::MAX / 10);
        assert_eq!(net, u64::MAX - fee);
    }

    #[test]
    fn test_even_split_remainder_to_first() {
        assert_eq!(even_split(192), (96, 96));
        assert_eq!(even_split(193), (97, 96));
        assert_eq!(even_split(1), (1, 0));
        assert_eq!(even_split(0), (0, 0));
    }

    #[test]
    fn test_draw_takes_fee_before_halving() {
        let policy = FeePolicy::new(500).unwrap();
        assert_eq!(policy.draw(202), (10, (96, 96)));

        // 2 * 103 = 206, fee 10, net 196
        assert_eq!(policy.draw(206), (10, (98, 98)));

        // 2 * 107 = 214, fee 5, net 209 is odd
        assert_eq!(FeePolicy::new(250).unwrap().draw(214), (5, (105, 104)));
    }

    #[test]
    fn test_fee_cap() {
        assert!(FeePolicy::new(0).is_ok());
        assert_eq!(FeePolicy::new(1_000).unwrap().fee_bps(), 1_000);
        assert_eq!(FeePolicy::new(1_001), Err(Error::FeeTooHigh));
    }
}
