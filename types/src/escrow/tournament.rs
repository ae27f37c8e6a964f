use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::ed25519::PublicKey;

use super::{read_string, string_encode_size, write_string, MAX_NAME_LENGTH, MAX_TOURNAMENT_PLAYERS};

/// Tournament phases
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TournamentState {
    #[default]
    Registration = 0,
    Active = 1,
    Finished = 2,
    Cancelled = 3,
}

impl Write for TournamentState {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for TournamentState {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Self::Registration),
            1 => Ok(Self::Active),
            2 => Ok(Self::Finished),
            3 => Ok(Self::Cancelled),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for TournamentState {
    const SIZE: usize = 1;
}

/// One pairing in a bracket round. `player2 == None` marks a bye, which is
/// created already complete with `player1` as winner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    pub round: u32,
    pub player1: PublicKey,
    pub player2: Option<PublicKey>,
    pub winner: Option<PublicKey>,
    pub is_complete: bool,
}

impl Match {
    pub fn pairing(round: u32, player1: PublicKey, player2: PublicKey) -> Self {
        Self {
            round,
            player1,
            player2: Some(player2),
            winner: None,
            is_complete: false,
        }
    }

    pub fn bye(round: u32, player: PublicKey) -> Self {
        Self {
            round,
            winner: Some(player.clone()),
            player1: player,
            player2: None,
            is_complete: true,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.player2.is_none()
    }

    pub fn involves(&self, player: &PublicKey) -> bool {
        &self.player1 == player || self.player2.as_ref() == Some(player)
    }
}

impl Write for Match {
    fn write(&self, writer: &mut impl BufMut) {
        self.round.write(writer);
        self.player1.write(writer);
        self.player2.write(writer);
        self.winner.write(writer);
        self.is_complete.write(writer);
    }
}

impl Read for Match {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            round: u32::read(reader)?,
            player1: PublicKey::read(reader)?,
            player2: Option::<PublicKey>::read(reader)?,
            winner: Option::<PublicKey>::read(reader)?,
            is_complete: bool::read(reader)?,
        })
    }
}

impl EncodeSize for Match {
    fn encode_size(&self) -> usize {
        self.round.encode_size()
            + self.player1.encode_size()
            + self.player2.encode_size()
            + self.winner.encode_size()
            + self.is_complete.encode_size()
    }
}

/// Single-elimination bracket. Match ids are indices into `matches`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Bracket {
    pub current_round: u32,
    pub matches: Vec<Match>,
}

impl Bracket {
    /// Ids and records of the matches in `round`, in pairing order.
    pub fn round(&self, round: u32) -> impl Iterator<Item = (u64, &Match)> {
        self.matches
            .iter()
            .enumerate()
            .filter(move |(_, m)| m.round == round)
            .map(|(i, m)| (i as u64, m))
    }

    pub fn get(&self, match_id: u64) -> Option<&Match> {
        usize::try_from(match_id)
            .ok()
            .and_then(|index| self.matches.get(index))
    }
}

impl Write for Bracket {
    fn write(&self, writer: &mut impl BufMut) {
        self.current_round.write(writer);
        self.matches.write(writer);
    }
}

impl Read for Bracket {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            current_round: u32::read(reader)?,
            // A full bracket over n players holds n - 1 pairings plus at most n byes.
            matches: Vec::<Match>::read_range(reader, 0..=2 * MAX_TOURNAMENT_PLAYERS)?,
        })
    }
}

impl EncodeSize for Bracket {
    fn encode_size(&self) -> usize {
        self.current_round.encode_size() + self.matches.encode_size()
    }
}

/// Parameters supplied by the organizer when opening registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TournamentParams {
    pub name: String,
    pub entry_fee: u64,
    pub max_players: u32,
    /// Unix timestamp (milliseconds); must be in the future at creation
    pub start_time: u64,
}

/// Tournament state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tournament {
    pub id: u64,
    pub organizer: PublicKey,
    pub name: String,
    pub entry_fee: u64,
    pub max_players: u32,
    pub start_time: u64,
    pub state: TournamentState,
    pub players: Vec<PublicKey>,
    pub prize_pool: u64,
    pub bracket: Bracket,
    pub champion: Option<PublicKey>,
    pub created_at: u64,
    pub started_at: u64,
}

impl Tournament {
    pub fn new(id: u64, organizer: PublicKey, params: TournamentParams, created_at: u64) -> Self {
        Self {
            id,
            organizer,
            name: params.name,
            entry_fee: params.entry_fee,
            max_players: params.max_players,
            start_time: params.start_time,
            state: TournamentState::Registration,
            players: Vec::new(),
            prize_pool: 0,
            bracket: Bracket::default(),
            champion: None,
            created_at,
            started_at: 0,
        }
    }

    pub fn contains_player(&self, player: &PublicKey) -> bool {
        self.players.contains(player)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players as usize
    }

    /// Round in play. Only meaningful while active.
    pub fn current_round(&self) -> Option<u32> {
        (self.state == TournamentState::Active).then_some(self.bracket.current_round)
    }
}

impl Write for Tournament {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.organizer.write(writer);
        write_string(&self.name, writer);
        self.entry_fee.write(writer);
        self.max_players.write(writer);
        self.start_time.write(writer);
        self.state.write(writer);
        self.players.write(writer);
        self.prize_pool.write(writer);
        self.bracket.write(writer);
        self.champion.write(writer);
        self.created_at.write(writer);
        self.started_at.write(writer);
    }
}

impl Read for Tournament {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            id: u64::read(reader)?,
            organizer: PublicKey::read(reader)?,
            name: read_string(reader, MAX_NAME_LENGTH)?,
            entry_fee: u64::read(reader)?,
            max_players: u32::read(reader)?,
            start_time: u64::read(reader)?,
            state: TournamentState::read(reader)?,
            players: Vec::<PublicKey>::read_range(reader, 0..=MAX_TOURNAMENT_PLAYERS)?,
            prize_pool: u64::read(reader)?,
            bracket: Bracket::read(reader)?,
            champion: Option::<PublicKey>::read(reader)?,
            created_at: u64::read(reader)?,
            started_at: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Tournament {
    fn encode_size(&self) -> usize {
        self.id.encode_size()
            + self.organizer.encode_size()
            + string_encode_size(&self.name)
            + self.entry_fee.encode_size()
            + self.max_players.encode_size()
            + self.start_time.encode_size()
            + self.state.encode_size()
            + self.players.encode_size()
            + self.prize_pool.encode_size()
            + self.bracket.encode_size()
            + self.champion.encode_size()
            + self.created_at.encode_size()
            + self.started_at.encode_size()
    }
}
