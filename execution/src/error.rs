use thiserror::Error;

/// Every way an escrow operation can be rejected. A rejected call leaves
/// the escrow exactly as it was.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Value
    #[error("amount must be non-zero and within configured bounds")]
    InvalidAmount,
    #[error("stake does not match the game's stake")]
    StakeMismatch,
    #[error("release exceeds the value held in escrow")]
    InsufficientEscrow,
    #[error("arithmetic overflow")]
    Overflow,

    // Standing
    #[error("caller is not permitted to perform this action")]
    Unauthorized,

    // Lifecycle
    #[error("game not found")]
    GameNotFound,
    #[error("tournament not found")]
    TournamentNotFound,
    #[error("escrow id is already in use")]
    IdInUse,
    #[error("game is not in a state that permits this action")]
    GameNotActive,
    #[error("tournament is not in a state that permits this action")]
    TournamentNotInState,

    // Moves
    #[error("move coordinates are outside the board")]
    InvalidCoordinates,
    #[error("it is not the caller's turn")]
    NotYourTurn,

    // Bracket
    #[error("match not found")]
    MatchNotFound,
    #[error("match has already been decided")]
    AlreadyComplete,
    #[error("winner is not a player in this match")]
    InvalidWinner,

    // Configuration and registration
    #[error("platform fee exceeds the 10% cap")]
    FeeTooHigh,
    #[error("start time is not in the future")]
    StartTimeInPast,
    #[error("tournament is full")]
    TournamentFull,
    #[error("player is already registered")]
    AlreadyRegistered,
    #[error("max players must be at least 2 and within the configured cap")]
    InvalidMaxPlayers,
    #[error("tournament name must be non-empty and at most 32 bytes")]
    InvalidName,
}
