use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;

/// Identity of whoever invokes an escrow operation, as resolved by the
/// identity provider. The engine trusts the key and the role as given.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Caller {
    Player(PublicKey),
    Admin(PublicKey),
}

impl Caller {
    pub fn public(&self) -> &PublicKey {
        match self {
            Self::Player(public) | Self::Admin(public) => public,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin(_))
    }
}

/// The escrow a custody record belongs to. Only that escrow may release from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Context {
    Game(u64),
    Tournament(u64),
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Game(id) => write!(f, "game:{id}"),
            Self::Tournament(id) => write!(f, "tournament:{id}"),
        }
    }
}

impl Write for Context {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Game(id) => {
                0u8.write(writer);
                id.write(writer);
            }
            Self::Tournament(id) => {
                1u8.write(writer);
                id.write(writer);
            }
        }
    }
}

impl Read for Context {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Self::Game(u64::read(reader)?)),
            1 => Ok(Self::Tournament(u64::read(reader)?)),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for Context {
    const SIZE: usize = u8::SIZE + u64::SIZE;
}

/// Who a release credits: a player, or the platform fee account.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Recipient {
    Player(PublicKey),
    Platform,
}

impl Write for Recipient {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Player(public) => {
                0u8.write(writer);
                public.write(writer);
            }
            Self::Platform => 1u8.write(writer),
        }
    }
}

impl Read for Recipient {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Self::Player(PublicKey::read(reader)?)),
            1 => Ok(Self::Platform),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl EncodeSize for Recipient {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Player(_) => PublicKey::SIZE,
                Self::Platform => 0,
            }
    }
}
