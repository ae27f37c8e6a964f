//! Replays a scripted sequence of escrow calls against an [Engine].
//!
//! A scenario names the identities taking part and lists the calls they
//! make, in order. Rejected calls are logged and counted but do not stop
//! the replay, so scripts can exercise the failure paths too.

use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    PrivateKeyExt, Signer,
};
use commonware_runtime::Clock;
use gambit_execution::{Engine, Error, Ledger};
use gambit_types::{
    escrow::{Caller, Context, Move, Outcome, Piece, Recipient, Square, TournamentParams},
    execution::Event,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::Deserialize;
use std::{collections::HashMap, time::UNIX_EPOCH};
use thiserror::Error as ThisError;
use tracing::{info, warn};

#[derive(Debug, ThisError)]
pub enum ScenarioError {
    #[error("could not parse scenario: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("unknown identity: {0}")]
    UnknownIdentity(String),
    #[error("duplicate identity: {0}")]
    DuplicateIdentity(String),
}

#[derive(Clone, Debug, Deserialize)]
pub struct Identity {
    pub name: String,
    #[serde(default)]
    pub admin: bool,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptOutcome {
    WhiteWon,
    BlackWon,
    Draw,
}

impl From<ScriptOutcome> for Outcome {
    fn from(outcome: ScriptOutcome) -> Self {
        match outcome {
            ScriptOutcome::WhiteWon => Outcome::WhiteWon,
            ScriptOutcome::BlackWon => Outcome::BlackWon,
            ScriptOutcome::Draw => Outcome::Draw,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptPiece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl From<ScriptPiece> for Piece {
    fn from(piece: ScriptPiece) -> Self {
        match piece {
            ScriptPiece::Pawn => Piece::Pawn,
            ScriptPiece::Knight => Piece::Knight,
            ScriptPiece::Bishop => Piece::Bishop,
            ScriptPiece::Rook => Piece::Rook,
            ScriptPiece::Queen => Piece::Queen,
            ScriptPiece::King => Piece::King,
        }
    }
}

/// One call in a scenario. `caller` names an entry of [Scenario::identities].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    CreateGame {
        caller: String,
        stake: u64,
    },
    JoinGame {
        caller: String,
        game: u64,
        stake: u64,
    },
    RecordMove {
        caller: String,
        game: u64,
        from: (u8, u8),
        to: (u8, u8),
        piece: ScriptPiece,
    },
    EndGame {
        caller: String,
        game: u64,
        outcome: ScriptOutcome,
    },
    CancelGame {
        caller: String,
        game: u64,
    },
    CreateTournament {
        caller: String,
        name: String,
        entry_fee: u64,
        max_players: u32,
        /// Milliseconds after the current time
        starts_in: u64,
    },
    Register {
        caller: String,
        tournament: u64,
        fee: u64,
    },
    ReportResult {
        caller: String,
        tournament: u64,
        match_id: u64,
        winner: String,
    },
    CancelTournament {
        caller: String,
        tournament: u64,
    },
    SetPlatformFee {
        caller: String,
        fee_bps: u16,
    },
    RetryGamePayouts {
        game: u64,
    },
    RetryTournamentPayouts {
        tournament: u64,
    },
}

#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    pub identities: Vec<Identity>,
    /// Each step is a single-key map, e.g. `- create_game: { .. }`
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_yaml(raw: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yaml::from_str(raw)?)
    }
}

/// Tally of a replay.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub applied: usize,
    pub rejected: Vec<(usize, Error)>,
    pub events: Vec<Event>,
}

/// Keys derived deterministically from each identity's position.
struct Roster {
    callers: HashMap<String, Caller>,
}

impl Roster {
    fn new(identities: &[Identity]) -> Result<Self, ScenarioError> {
        let mut callers = HashMap::new();
        for (index, identity) in identities.iter().enumerate() {
            let mut rng = StdRng::seed_from_u64(index as u64);
            let public = PrivateKey::from_rng(&mut rng).public_key();
            let caller = if identity.admin {
                Caller::Admin(public)
            } else {
                Caller::Player(public)
            };
            if callers.insert(identity.name.clone(), caller).is_some() {
                return Err(ScenarioError::DuplicateIdentity(identity.name.clone()));
            }
        }
        Ok(Self { callers })
    }

    fn caller(&self, name: &str) -> Result<&Caller, ScenarioError> {
        self.callers
            .get(name)
            .ok_or_else(|| ScenarioError::UnknownIdentity(name.to_string()))
    }

    fn public(&self, name: &str) -> Result<PublicKey, ScenarioError> {
        self.caller(name).map(|caller| caller.public().clone())
    }
}

pub struct Simulator<E: Clock> {
    clock: E,
    engine: Engine<E, Ledger>,
    roster: Roster,
}

impl<E: Clock + Clone> Simulator<E> {
    pub fn new(
        context: E,
        engine: Engine<E, Ledger>,
        identities: &[Identity],
    ) -> Result<Self, ScenarioError> {
        Ok(Self {
            clock: context,
            engine,
            roster: Roster::new(identities)?,
        })
    }

    pub fn engine(&self) -> &Engine<E, Ledger> {
        &self.engine
    }

    /// Key assigned to `name`.
    pub fn public(&self, name: &str) -> Result<PublicKey, ScenarioError> {
        self.roster.public(name)
    }

    /// Balance credited to `name` so far.
    pub fn balance(&self, name: &str) -> Result<u64, ScenarioError> {
        let public = self.roster.public(name)?;
        Ok(self.engine.transfer().balance(&Recipient::Player(public)))
    }

    pub fn platform_balance(&self) -> u64 {
        self.engine.transfer().balance(&Recipient::Platform)
    }

    fn now(&self) -> u64 {
        self.clock
            .current()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default()
    }

    async fn step(&self, step: &Step) -> Result<Result<Vec<Event>, Error>, ScenarioError> {
        let engine = &self.engine;
        let roster = &self.roster;
        Ok(match step {
            Step::CreateGame { caller, stake } => engine
                .create_game(roster.caller(caller)?, *stake)
                .await
                .map(|(_, events)| events),
            Step::JoinGame {
                caller,
                game,
                stake,
            } => {
                engine
                    .join_game(roster.caller(caller)?, *game, *stake)
                    .await
            }
            Step::RecordMove {
                caller,
                game,
                from,
                to,
                piece,
            } => {
                let mv = Move::new(
                    Square::new(from.0, from.1),
                    Square::new(to.0, to.1),
                    (*piece).into(),
                );
                engine.record_move(roster.caller(caller)?, *game, mv).await
            }
            Step::EndGame {
                caller,
                game,
                outcome,
            } => {
                engine
                    .end_game(roster.caller(caller)?, *game, (*outcome).into())
                    .await
            }
            Step::CancelGame { caller, game } => {
                engine.cancel_game(roster.caller(caller)?, *game).await
            }
            Step::CreateTournament {
                caller,
                name,
                entry_fee,
                max_players,
                starts_in,
            } => {
                let params = TournamentParams {
                    name: name.clone(),
                    entry_fee: *entry_fee,
                    max_players: *max_players,
                    start_time: self.now().saturating_add(*starts_in),
                };
                engine
                    .create_tournament(roster.caller(caller)?, params)
                    .await
                    .map(|(_, events)| events)
            }
            Step::Register {
                caller,
                tournament,
                fee,
            } => {
                engine
                    .register(roster.caller(caller)?, *tournament, *fee)
                    .await
            }
            Step::ReportResult {
                caller,
                tournament,
                match_id,
                winner,
            } => {
                engine
                    .report_result(
                        roster.caller(caller)?,
                        *tournament,
                        *match_id,
                        roster.public(winner)?,
                    )
                    .await
            }
            Step::CancelTournament { caller, tournament } => {
                engine
                    .cancel_tournament(roster.caller(caller)?, *tournament)
                    .await
            }
            Step::SetPlatformFee { caller, fee_bps } => engine
                .set_platform_fee(roster.caller(caller)?, *fee_bps)
                .map(|()| Vec::new()),
            Step::RetryGamePayouts { game } => engine
                .retry_payouts(Context::Game(*game))
                .await
                .map(|_| Vec::new()),
            Step::RetryTournamentPayouts { tournament } => engine
                .retry_payouts(Context::Tournament(*tournament))
                .await
                .map(|_| Vec::new()),
        })
    }

    /// Run every step in order.
    pub async fn replay(&self, steps: &[Step]) -> Result<Report, ScenarioError> {
        let mut report = Report::default();
        for (index, step) in steps.iter().enumerate() {
            match self.step(step).await? {
                Ok(events) => {
                    for event in &events {
                        info!(step = index, ?event, "event");
                    }
                    report.applied += 1;
                    report.events.extend(events);
                }
                Err(error) => {
                    warn!(step = index, ?step, %error, "step rejected");
                    report.rejected.push((index, error));
                }
            }
        }
        Ok(report)
    }
}
