/// Width and height of the board; coordinates are valid in `0..BOARD_SIZE`.
pub const BOARD_SIZE: u8 = 8;

/// Maximum number of moves recorded for a single game.
pub const MAX_MOVES: usize = 1024;

/// Maximum tournament name length in bytes.
pub const MAX_NAME_LENGTH: usize = 32;

/// Upper bound on tournament size accepted when decoding stored records.
pub const MAX_TOURNAMENT_PLAYERS: usize = 1024;

/// Upper bound on deposits or payouts recorded against one custody context.
pub const MAX_LEDGER_ENTRIES: usize = 2 * MAX_TOURNAMENT_PLAYERS;

/// Basis points denominator (10_000 bps = 100%).
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Highest platform fee that may be configured (10%).
pub const MAX_PLATFORM_FEE_BPS: u16 = 1_000;
