use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::ed25519::PublicKey;

use super::{BOARD_SIZE, MAX_MOVES};

/// Lifecycle of a staked game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum GameState {
    #[default]
    WaitingForPlayer = 0,
    Active = 1,
    WhiteWon = 2,
    BlackWon = 3,
    Draw = 4,
    Cancelled = 5,
}

impl GameState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::WhiteWon | Self::BlackWon | Self::Draw | Self::Cancelled
        )
    }
}

impl Write for GameState {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for GameState {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Self::WaitingForPlayer),
            1 => Ok(Self::Active),
            2 => Ok(Self::WhiteWon),
            3 => Ok(Self::BlackWon),
            4 => Ok(Self::Draw),
            5 => Ok(Self::Cancelled),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for GameState {
    const SIZE: usize = 1;
}

/// Result reported when a game ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    WhiteWon,
    BlackWon,
    Draw,
}

impl From<Outcome> for GameState {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::WhiteWon => Self::WhiteWon,
            Outcome::BlackWon => Self::BlackWon,
            Outcome::Draw => Self::Draw,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Color {
    #[default]
    White = 0,
    Black = 1,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

impl Write for Color {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for Color {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Self::White),
            1 => Ok(Self::Black),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for Color {
    const SIZE: usize = 1;
}

/// Piece tag carried by a recorded move. Legality is checked upstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Piece {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl Write for Piece {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for Piece {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Self::Pawn),
            1 => Ok(Self::Knight),
            2 => Ok(Self::Bishop),
            3 => Ok(Self::Rook),
            4 => Ok(Self::Queen),
            5 => Ok(Self::King),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for Piece {
    const SIZE: usize = 1;
}

/// A board coordinate. Decoding accepts any byte; [Square::on_board] is the bounds check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Square {
    pub file: u8,
    pub rank: u8,
}

impl Square {
    pub fn new(file: u8, rank: u8) -> Self {
        Self { file, rank }
    }

    pub fn on_board(&self) -> bool {
        self.file < BOARD_SIZE && self.rank < BOARD_SIZE
    }
}

impl Write for Square {
    fn write(&self, writer: &mut impl BufMut) {
        self.file.write(writer);
        self.rank.write(writer);
    }
}

impl Read for Square {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            file: u8::read(reader)?,
            rank: u8::read(reader)?,
        })
    }
}

impl FixedSize for Square {
    const SIZE: usize = 2;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
}

impl Move {
    pub fn new(from: Square, to: Square, piece: Piece) -> Self {
        Self { from, to, piece }
    }

    /// Both squares on the board and distinct.
    pub fn is_well_formed(&self) -> bool {
        self.from.on_board() && self.to.on_board() && self.from != self.to
    }
}

impl Write for Move {
    fn write(&self, writer: &mut impl BufMut) {
        self.from.write(writer);
        self.to.write(writer);
        self.piece.write(writer);
    }
}

impl Read for Move {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            from: Square::read(reader)?,
            to: Square::read(reader)?,
            piece: Piece::read(reader)?,
        })
    }
}

impl FixedSize for Move {
    const SIZE: usize = Square::SIZE * 2 + Piece::SIZE;
}

/// A head-to-head game with an equal stake from each side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Game {
    pub id: u64,
    pub white: PublicKey,
    pub black: Option<PublicKey>,
    pub stake: u64,
    pub state: GameState,
    pub turn: Color,
    pub moves: Vec<Move>,
    /// Unix timestamp (milliseconds) of creation
    pub created_at: u64,
    /// Unix timestamp (milliseconds) the second stake arrived, 0 until then
    pub started_at: u64,
}

impl Game {
    pub fn new(id: u64, white: PublicKey, stake: u64, created_at: u64) -> Self {
        Self {
            id,
            white,
            black: None,
            stake,
            state: GameState::WaitingForPlayer,
            turn: Color::White,
            moves: Vec::new(),
            created_at,
            started_at: 0,
        }
    }

    pub fn player(&self, color: Color) -> Option<&PublicKey> {
        match color {
            Color::White => Some(&self.white),
            Color::Black => self.black.as_ref(),
        }
    }

    /// Side played by `public`, if they are seated in this game.
    pub fn color_of(&self, public: &PublicKey) -> Option<Color> {
        if &self.white == public {
            Some(Color::White)
        } else if self.black.as_ref() == Some(public) {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// Player expected to move next. Only meaningful while active.
    pub fn current_turn(&self) -> Option<&PublicKey> {
        if self.state != GameState::Active {
            return None;
        }
        self.player(self.turn)
    }
}

impl Write for Game {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.white.write(writer);
        self.black.write(writer);
        self.stake.write(writer);
        self.state.write(writer);
        self.turn.write(writer);
        self.moves.write(writer);
        self.created_at.write(writer);
        self.started_at.write(writer);
    }
}

impl Read for Game {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            id: u64::read(reader)?,
            white: PublicKey::read(reader)?,
            black: Option::<PublicKey>::read(reader)?,
            stake: u64::read(reader)?,
            state: GameState::read(reader)?,
            turn: Color::read(reader)?,
            moves: Vec::<Move>::read_range(reader, 0..=MAX_MOVES)?,
            created_at: u64::read(reader)?,
            started_at: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Game {
    fn encode_size(&self) -> usize {
        self.id.encode_size()
            + self.white.encode_size()
            + self.black.encode_size()
            + self.stake.encode_size()
            + self.state.encode_size()
            + self.turn.encode_size()
            + self.moves.encode_size()
            + self.created_at.encode_size()
            + self.started_at.encode_size()
    }
}
