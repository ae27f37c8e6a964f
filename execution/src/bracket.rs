//! Single-elimination bracket construction and progression.
//!
//! Pairing is fully deterministic. Round one pairs players in registration
//! order; when the field is not a power of two, the lowest-indexed players
//! take the byes needed to fill it. Later rounds pair the previous round's
//! winners in match order. There is no randomness anywhere.

use crate::Error;
use gambit_types::{
    escrow::{Bracket, Match},
    PublicKey,
};

/// What [advance_round_if_ready] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advance {
    /// The current round still has undecided matches.
    Pending,
    /// All matches were decided and the given round was created.
    NextRound(u32),
    /// Only one player remains.
    Champion(PublicKey),
}

fn pair(round: u32, players: &[PublicKey]) -> Vec<Match> {
    players
        .chunks(2)
        .map(|pair| match pair {
            [first, second] => Match::pairing(round, first.clone(), second.clone()),
            [only] => Match::bye(round, only.clone()),
            _ => unreachable!("chunks(2) yields one or two players"),
        })
        .collect()
}

/// Build round one for `players` (in registration order).
pub fn seed(players: &[PublicKey]) -> Result<Bracket, Error> {
    if players.len() < 2 {
        return Err(Error::InvalidMaxPlayers);
    }
    let byes = players.len().next_power_of_two() - players.len();
    let mut matches: Vec<Match> = players[..byes]
        .iter()
        .map(|player| Match::bye(1, player.clone()))
        .collect();
    matches.extend(pair(1, &players[byes..]));

    Ok(Bracket {
        current_round: 1,
        matches,
    })
}

/// Record `winner` as the result of `match_id`.
pub fn complete_match(
    bracket: &mut Bracket,
    match_id: u64,
    winner: &PublicKey,
) -> Result<(), Error> {
    let index = usize::try_from(match_id).map_err(|_| Error::MatchNotFound)?;
    let record = bracket
        .matches
        .get_mut(index)
        .ok_or(Error::MatchNotFound)?;
    if record.is_complete {
        return Err(Error::AlreadyComplete);
    }
    if !record.involves(winner) {
        return Err(Error::InvalidWinner);
    }
    record.winner = Some(winner.clone());
    record.is_complete = true;
    Ok(())
}

/// If every match in the current round is decided, create the next round
/// from its winners, or name the champion when only one remains.
pub fn advance_round_if_ready(bracket: &mut Bracket) -> Advance {
    let round = bracket.current_round;
    let mut winners = Vec::new();
    for (_, record) in bracket.round(round) {
        match (&record.winner, record.is_complete) {
            (Some(winner), true) => winners.push(winner.clone()),
            _ => return Advance::Pending,
        }
    }

    match winners.as_slice() {
        [] => Advance::Pending,
        [champion] => Advance::Champion(champion.clone()),
        _ => {
            let next = round + 1;
            bracket.matches.extend(pair(next, &winners));
            bracket.current_round = next;
            Advance::NextRound(next)
        }
    }
}
