use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;

use crate::escrow::{
    Context, Custody, Game, Move, Outcome, Recipient, Tournament, TournamentParams,
    TournamentState,
};

#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub enum Key {
    Game(u64),
    Tournament(u64),
    Custody(Context),
}

impl Write for Key {
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
            Self::Custody(context) => {
                2u8.write(writer);
                context.write(writer);
            }
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match u8::read(reader)? {
            0 => Self::Game(u64::read(reader)?),
            1 => Self::Tournament(u64::read(reader)?),
            2 => Self::Custody(Context::read(reader)?),
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Game(_) | Self::Tournament(_) => u64::SIZE,
                Self::Custody(_) => Context::SIZE,
            }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum Value {
    Game(Game),
    Tournament(Tournament),
    Custody(Custody),
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Game(game) => {
                0u8.write(writer);
                game.write(writer);
            }
            Self::Tournament(tournament) => {
                1u8.write(writer);
                tournament.write(writer);
            }
            Self::Custody(custody) => {
                2u8.write(writer);
                custody.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match u8::read(reader)? {
            0 => Self::Game(Game::read(reader)?),
            1 => Self::Tournament(Tournament::read(reader)?),
            2 => Self::Custody(Custody::read(reader)?),
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Game(game) => game.encode_size(),
                Self::Tournament(tournament) => tournament.encode_size(),
                Self::Custody(custody) => custody.encode_size(),
            }
    }
}

/// A state-mutating request against one escrow. Ids are assigned by the
/// engine before a creating instruction is applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    CreateGame { id: u64, stake: u64 },
    JoinGame { id: u64, stake: u64 },
    RecordMove { id: u64, mv: Move },
    EndGame { id: u64, outcome: Outcome },
    CancelGame { id: u64 },
    CreateTournament { id: u64, params: TournamentParams },
    Register { id: u64, fee: u64 },
    ReportResult { id: u64, match_id: u64, winner: PublicKey },
    CancelTournament { id: u64 },
}

impl Instruction {
    /// The escrow this instruction operates on.
    pub fn context(&self) -> Context {
        match self {
            Self::CreateGame { id, .. }
            | Self::JoinGame { id, .. }
            | Self::RecordMove { id, .. }
            | Self::EndGame { id, .. }
            | Self::CancelGame { id } => Context::Game(*id),
            Self::CreateTournament { id, .. }
            | Self::Register { id, .. }
            | Self::ReportResult { id, .. }
            | Self::CancelTournament { id } => Context::Tournament(*id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Game events
    GameCreated {
        id: u64,
        white: PublicKey,
        stake: u64,
    },
    GameJoined {
        id: u64,
        black: PublicKey,
    },
    MoveRecorded {
        id: u64,
        player: PublicKey,
        mv: Move,
        move_number: u32,
    },
    GameEnded {
        id: u64,
        outcome: Outcome,
        fee: u64,
    },
    GameCancelled {
        id: u64,
        refunded: u64,
    },

    // Tournament events
    TournamentCreated {
        id: u64,
        organizer: PublicKey,
        entry_fee: u64,
        max_players: u32,
    },
    PlayerRegistered {
        id: u64,
        player: PublicKey,
        prize_pool: u64,
    },
    TournamentStarted {
        id: u64,
        players: u32,
    },
    MatchCompleted {
        id: u64,
        match_id: u64,
        winner: PublicKey,
    },
    RoundAdvanced {
        id: u64,
        round: u32,
    },
    TournamentFinished {
        id: u64,
        champion: PublicKey,
        prize: u64,
        fee: u64,
    },
    TournamentCancelled {
        id: u64,
        previous: TournamentState,
        refunded: u64,
    },

    // Vault events
    Released {
        context: Context,
        recipient: Recipient,
        amount: u64,
    },
}
