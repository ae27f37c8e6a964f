use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::ed25519::PublicKey;

use super::{Context, Recipient, MAX_LEDGER_ENTRIES};

/// Value moved into custody by one party.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deposit {
    pub depositor: PublicKey,
    pub amount: u64,
}

impl Write for Deposit {
    fn write(&self, writer: &mut impl BufMut) {
        self.depositor.write(writer);
        self.amount.write(writer);
    }
}

impl Read for Deposit {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            depositor: PublicKey::read(reader)?,
            amount: u64::read(reader)?,
        })
    }
}

impl FixedSize for Deposit {
    const SIZE: usize = PublicKey::SIZE + u64::SIZE;
}

/// A decided release. `settled` flips once the transfer sink confirms the credit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payout {
    pub recipient: Recipient,
    pub amount: u64,
    pub settled: bool,
}

impl Write for Payout {
    fn write(&self, writer: &mut impl BufMut) {
        self.recipient.write(writer);
        self.amount.write(writer);
        self.settled.write(writer);
    }
}

impl Read for Payout {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            recipient: Recipient::read(reader)?,
            amount: u64::read(reader)?,
            settled: bool::read(reader)?,
        })
    }
}

impl EncodeSize for Payout {
    fn encode_size(&self) -> usize {
        self.recipient.encode_size() + self.amount.encode_size() + self.settled.encode_size()
    }
}

/// Value held on behalf of one escrow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Custody {
    pub context: Context,
    pub deposits: Vec<Deposit>,
    pub released: u64,
    pub payouts: Vec<Payout>,
}

impl Custody {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            deposits: Vec::new(),
            released: 0,
            payouts: Vec::new(),
        }
    }

    /// Total ever deposited into this context.
    pub fn deposited(&self) -> u64 {
        self.deposits.iter().map(|deposit| deposit.amount).sum()
    }

    /// Value still held: deposits less releases.
    pub fn custodied_amount(&self) -> u64 {
        self.deposited().saturating_sub(self.released)
    }

    /// Indices of payouts the transfer sink has not yet confirmed.
    pub fn unsettled(&self) -> impl Iterator<Item = (usize, &Payout)> {
        self.payouts
            .iter()
            .enumerate()
            .filter(|(_, payout)| !payout.settled)
    }
}

impl Write for Custody {
    fn write(&self, writer: &mut impl BufMut) {
        self.context.write(writer);
        self.deposits.write(writer);
        self.released.write(writer);
        self.payouts.write(writer);
    }
}

impl Read for Custody {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            context: Context::read(reader)?,
            deposits: Vec::<Deposit>::read_range(reader, 0..=MAX_LEDGER_ENTRIES)?,
            released: u64::read(reader)?,
            payouts: Vec::<Payout>::read_range(reader, 0..=MAX_LEDGER_ENTRIES)?,
        })
    }
}

impl EncodeSize for Custody {
    fn encode_size(&self) -> usize {
        self.context.encode_size()
            + self.deposits.encode_size()
            + self.released.encode_size()
            + self.payouts.encode_size()
    }
}
