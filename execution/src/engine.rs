//! The escrow engine.
//!
//! Every game and tournament owns a private state shard guarded by its own
//! lock. A mutating call takes that lock, stages its writes in a [Layer],
//! commits them only if the whole instruction succeeded, and then hands any
//! newly decided payouts to the [Transfer] sink while still holding the
//! lock. Calls against different escrows never contend.

use crate::{
    fee::FeePolicy,
    ids::{IdGenerator, Sequential},
    state::{Memory, State},
    transfer::Transfer,
    vault, Error, Layer, ValidatedConfig,
};
use commonware_runtime::{Clock, RwLock};
use futures::lock::Mutex;
use gambit_types::{
    escrow::{
        Caller, Context, Custody, Game, Match, Move, Outcome, Payout, Tournament,
        TournamentParams,
    },
    execution::{Event, Instruction, Key, Value},
    PublicKey,
};
use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{
        atomic::{AtomicU16, Ordering},
        Arc,
    },
    time::UNIX_EPOCH,
};
use tracing::{debug, info, warn};

type Shard = Arc<Mutex<Memory>>;

pub struct Engine<E: Clock, T: Transfer, I: IdGenerator = Sequential> {
    context: E,
    config: ValidatedConfig,
    fee_bps: AtomicU16,
    transfer: T,

    game_ids: I,
    tournament_ids: I,

    shards: RwLock<HashMap<Context, Shard>>,
}

impl<E: Clock, T: Transfer> Engine<E, T, Sequential> {
    pub fn new(context: E, config: ValidatedConfig, transfer: T) -> Self {
        Self::with_ids(
            context,
            config,
            transfer,
            Sequential::default(),
            Sequential::default(),
        )
    }
}

impl<E: Clock, T: Transfer, I: IdGenerator> Engine<E, T, I> {
    pub fn with_ids(
        context: E,
        config: ValidatedConfig,
        transfer: T,
        game_ids: I,
        tournament_ids: I,
    ) -> Self {
        Self {
            context,
            fee_bps: AtomicU16::new(config.platform_fee_bps),
            config,
            transfer,
            game_ids,
            tournament_ids,
            shards: RwLock::new(HashMap::new()),
        }
    }

    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    /// Milliseconds since the Unix epoch, per the runtime clock.
    fn now(&self) -> u64 {
        self.context
            .current()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default()
    }

    fn fees(&self) -> Result<FeePolicy, Error> {
        FeePolicy::new(self.fee_bps.load(Ordering::Acquire))
    }

    async fn shard(&self, context: Context) -> Result<Shard, Error> {
        let shards = self.shards.read().await;
        shards.get(&context).cloned().ok_or(match context {
            Context::Game(_) => Error::GameNotFound,
            Context::Tournament(_) => Error::TournamentNotFound,
        })
    }

    /// Stage `instruction` over `state`, keeping the writes only on success.
    async fn transition(
        &self,
        state: &mut Memory,
        caller: &Caller,
        instruction: &Instruction,
    ) -> Result<Vec<Event>, Error> {
        let context = instruction.context();
        let mut layer = Layer::new(&*state, &self.config, self.fees()?, self.now());
        let events = match layer.apply(caller, instruction).await {
            Ok(events) => events,
            Err(error) => {
                debug!(escrow = %context, ?error, "rejected");
                return Err(error);
            }
        };
        let changes = layer.commit();
        state.apply(changes).await;
        info!(escrow = %context, events = events.len(), "committed");
        Ok(events)
    }

    /// Credit every unsettled payout held in `state`, marking each success.
    /// Returns the number of payouts credited.
    async fn settle(&self, context: Context, state: &mut Memory) -> usize {
        let key = Key::Custody(context);
        let Some(Value::Custody(mut custody)) = state.get(&key).await else {
            return 0;
        };
        let pending: Vec<(usize, Payout)> = custody
            .unsettled()
            .map(|(index, payout)| (index, payout.clone()))
            .collect();
        if pending.is_empty() {
            return 0;
        }

        let mut credited = 0;
        for (index, payout) in pending {
            match self
                .transfer
                .credit(context, &payout.recipient, payout.amount)
                .await
            {
                Ok(()) => {
                    if vault::settle(&mut custody, index) {
                        credited += 1;
                    }
                }
                Err(error) => {
                    warn!(
                        escrow = %context,
                        recipient = ?payout.recipient,
                        amount = payout.amount,
                        ?error,
                        "payout failed"
                    );
                }
            }
        }
        state.insert(key, Value::Custody(custody)).await;
        credited
    }

    /// Run `instruction` against its existing escrow.
    async fn execute(&self, caller: &Caller, instruction: Instruction) -> Result<Vec<Event>, Error> {
        let context = instruction.context();
        let shard = self.shard(context).await?;
        let mut state = shard.lock().await;
        let events = self.transition(&mut state, caller, &instruction).await?;
        self.settle(context, &mut state).await;
        Ok(events)
    }

    /// Run `instruction` against a fresh escrow, registering it on success.
    /// An id that already names a live escrow is refused.
    async fn open(&self, caller: &Caller, instruction: Instruction) -> Result<Vec<Event>, Error> {
        let context = instruction.context();
        let mut shards = self.shards.write().await;
        let Entry::Vacant(slot) = shards.entry(context) else {
            debug!(escrow = %context, "id already in use");
            return Err(Error::IdInUse);
        };
        let mut state = Memory::default();
        let events = self.transition(&mut state, caller, &instruction).await?;
        slot.insert(Arc::new(Mutex::new(state)));
        Ok(events)
    }

    // === Game Escrow ===

    pub async fn create_game(
        &self,
        caller: &Caller,
        stake: u64,
    ) -> Result<(u64, Vec<Event>), Error> {
        let id = self.game_ids.next();
        let events = self
            .open(caller, Instruction::CreateGame { id, stake })
            .await?;
        Ok((id, events))
    }

    pub async fn join_game(
        &self,
        caller: &Caller,
        id: u64,
        stake: u64,
    ) -> Result<Vec<Event>, Error> {
        self.execute(caller, Instruction::JoinGame { id, stake })
            .await
    }

    pub async fn record_move(
        &self,
        caller: &Caller,
        id: u64,
        mv: Move,
    ) -> Result<Vec<Event>, Error> {
        self.execute(caller, Instruction::RecordMove { id, mv }).await
    }

    pub async fn end_game(
        &self,
        caller: &Caller,
        id: u64,
        outcome: Outcome,
    ) -> Result<Vec<Event>, Error> {
        self.execute(caller, Instruction::EndGame { id, outcome })
            .await
    }

    pub async fn cancel_game(&self, caller: &Caller, id: u64) -> Result<Vec<Event>, Error> {
        self.execute(caller, Instruction::CancelGame { id }).await
    }

    // === Tournament Escrow ===

    pub async fn create_tournament(
        &self,
        caller: &Caller,
        params: TournamentParams,
    ) -> Result<(u64, Vec<Event>), Error> {
        let id = self.tournament_ids.next();
        let events = self
            .open(caller, Instruction::CreateTournament { id, params })
            .await?;
        Ok((id, events))
    }

    pub async fn register(&self, caller: &Caller, id: u64, fee: u64) -> Result<Vec<Event>, Error> {
        self.execute(caller, Instruction::Register { id, fee }).await
    }

    pub async fn report_result(
        &self,
        caller: &Caller,
        id: u64,
        match_id: u64,
        winner: PublicKey,
    ) -> Result<Vec<Event>, Error> {
        self.execute(
            caller,
            Instruction::ReportResult {
                id,
                match_id,
                winner,
            },
        )
        .await
    }

    pub async fn cancel_tournament(&self, caller: &Caller, id: u64) -> Result<Vec<Event>, Error> {
        self.execute(caller, Instruction::CancelTournament { id })
            .await
    }

    // === Administration ===

    /// Re-send the payouts of `context` that the transfer sink has not yet
    /// accepted. Returns how many were credited on this attempt.
    pub async fn retry_payouts(&self, context: Context) -> Result<usize, Error> {
        let shard = self.shard(context).await?;
        let mut state = shard.lock().await;
        let credited = self.settle(context, &mut state).await;
        info!(escrow = %context, credited, "retried payouts");
        Ok(credited)
    }

    /// Change the platform fee applied to distributions decided from now on.
    pub fn set_platform_fee(&self, caller: &Caller, fee_bps: u16) -> Result<(), Error> {
        if !caller.is_admin() {
            return Err(Error::Unauthorized);
        }
        FeePolicy::new(fee_bps)?;
        self.fee_bps.store(fee_bps, Ordering::Release);
        info!(fee_bps, "platform fee updated");
        Ok(())
    }

    pub fn platform_fee_bps(&self) -> u16 {
        self.fee_bps.load(Ordering::Acquire)
    }

    // === Reads ===

    async fn read(&self, key: Key) -> Option<Value> {
        let context = match &key {
            Key::Game(id) => Context::Game(*id),
            Key::Tournament(id) => Context::Tournament(*id),
            Key::Custody(context) => *context,
        };
        let shard = self.shard(context).await.ok()?;
        let state = shard.lock().await;
        state.get(&key).await
    }

    pub async fn game(&self, id: u64) -> Option<Game> {
        match self.read(Key::Game(id)).await {
            Some(Value::Game(game)) => Some(game),
            _ => None,
        }
    }

    pub async fn tournament(&self, id: u64) -> Option<Tournament> {
        match self.read(Key::Tournament(id)).await {
            Some(Value::Tournament(tournament)) => Some(tournament),
            _ => None,
        }
    }

    pub async fn custody(&self, context: Context) -> Option<Custody> {
        match self.read(Key::Custody(context)).await {
            Some(Value::Custody(custody)) => Some(custody),
            _ => None,
        }
    }

    pub async fn moves(&self, id: u64) -> Option<Vec<Move>> {
        self.game(id).await.map(|game| game.moves)
    }

    pub async fn matches(&self, id: u64) -> Option<Vec<Match>> {
        self.tournament(id)
            .await
            .map(|tournament| tournament.bracket.matches)
    }

    pub async fn prize_pool(&self, id: u64) -> Option<u64> {
        self.tournament(id)
            .await
            .map(|tournament| tournament.prize_pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mocks::{create_account_keypair, test_config, FlakyTransfer},
        Ledger,
    };
    use commonware_runtime::{deterministic, deterministic::Runner, Runner as _};
    use gambit_types::escrow::{GameState, Piece, Recipient, Square, TournamentState};

    type TestEngine = Engine<deterministic::Context, Ledger>;

    fn player(seed: u64) -> (Caller, PublicKey) {
        let (_, public) = create_account_keypair(seed);
        (Caller::Player(public.clone()), public)
    }

    fn admin() -> Caller {
        Caller::Admin(create_account_keypair(999).1)
    }

    fn pawn(file: u8, from: u8, to: u8) -> Move {
        Move::new(Square::new(file, from), Square::new(file, to), Piece::Pawn)
    }

    fn params(max_players: u32) -> TournamentParams {
        TournamentParams {
            name: "club championship".to_string(),
            entry_fee: 10,
            max_players,
            start_time: 60_000,
        }
    }

    /// Create and join a game between seeds 1 (white) and 2 (black).
    async fn active_game<T: Transfer>(engine: &Engine<deterministic::Context, T>, stake: u64) -> u64 {
        let (white, _) = player(1);
        let (black, _) = player(2);
        let (id, _) = engine.create_game(&white, stake).await.unwrap();
        engine.join_game(&black, id, stake).await.unwrap();
        id
    }

    #[test]
    fn test_win_pays_net_to_winner() {
        let executor = Runner::default();
        executor.start(|context| async move {
            let engine = TestEngine::new(context, test_config(), Ledger::default());
            let (white, white_key) = player(1);
            let id = active_game(&engine, 100).await;

            engine.record_move(&white, id, pawn(4, 1, 3)).await.unwrap();
            engine.end_game(&white, id, Outcome::WhiteWon).await.unwrap();

            let ledger = engine.transfer();
            assert_eq!(ledger.balance(&Recipient::Player(white_key)), 195);
            assert_eq!(ledger.balance(&Recipient::Platform), 5);
            assert_eq!(ledger.total(), 200);

            let custody = engine.custody(Context::Game(id)).await.unwrap();
            assert_eq!(custody.custodied_amount(), 0);
            assert_eq!(custody.unsettled().count(), 0);
            assert_eq!(engine.game(id).await.unwrap().state, GameState::WhiteWon);
            assert_eq!(engine.moves(id).await.unwrap(), vec![pawn(4, 1, 3)]);
        });
    }

    #[test]
    fn test_draw_splits_after_fee() {
        let executor = Runner::default();
        executor.start(|context| async move {
            let engine = TestEngine::new(context, test_config(), Ledger::default());
            engine.set_platform_fee(&admin(), 500).unwrap();
            let (_, white_key) = player(1);
            let (black, black_key) = player(2);
            let id = active_game(&engine, 101).await;

            let events = engine.end_game(&black, id, Outcome::Draw).await.unwrap();
            assert_eq!(
                events[0],
                Event::GameEnded {
                    id,
                    outcome: Outcome::Draw,
                    fee: 10
                }
            );

            let ledger = engine.transfer();
            assert_eq!(ledger.balance(&Recipient::Player(white_key)), 96);
            assert_eq!(ledger.balance(&Recipient::Player(black_key)), 96);
            assert_eq!(ledger.balance(&Recipient::Platform), 10);
        });
    }

    #[test]
    fn test_second_termination_rejected() {
        let executor = Runner::default();
        executor.start(|context| async move {
            let engine = TestEngine::new(context, test_config(), Ledger::default());
            let (white, _) = player(1);
            let id = active_game(&engine, 100).await;

            engine.end_game(&white, id, Outcome::BlackWon).await.unwrap();
            assert_eq!(
                engine.end_game(&white, id, Outcome::WhiteWon).await,
                Err(Error::GameNotActive)
            );
            assert_eq!(
                engine.cancel_game(&admin(), id).await,
                Err(Error::GameNotActive)
            );
            assert_eq!(engine.transfer().total(), 200);
        });
    }

    #[test]
    fn test_cancel_refunds_creator() {
        let executor = Runner::default();
        executor.start(|context| async move {
            let engine = TestEngine::new(context, test_config(), Ledger::default());
            let (white, white_key) = player(1);
            let (black, _) = player(2);
            let (id, _) = engine.create_game(&white, 50).await.unwrap();

            assert_eq!(
                engine.cancel_game(&white, id).await,
                Err(Error::Unauthorized)
            );
            let events = engine.cancel_game(&admin(), id).await.unwrap();
            assert_eq!(events[0], Event::GameCancelled { id, refunded: 50 });
            assert_eq!(
                engine.transfer().balance(&Recipient::Player(white_key)),
                50
            );
            assert_eq!(
                engine.join_game(&black, id, 50).await,
                Err(Error::GameNotActive)
            );
            assert_eq!(engine.game(id).await.unwrap().state, GameState::Cancelled);
        });
    }

    #[test]
    fn test_turn_order_enforced() {
        let executor = Runner::default();
        executor.start(|context| async move {
            let engine = TestEngine::new(context, test_config(), Ledger::default());
            let (white, _) = player(1);
            let (black, _) = player(2);
            let id = active_game(&engine, 10).await;

            assert_eq!(
                engine.record_move(&black, id, pawn(4, 6, 4)).await,
                Err(Error::NotYourTurn)
            );
            engine.record_move(&white, id, pawn(4, 1, 3)).await.unwrap();
            assert_eq!(
                engine.record_move(&white, id, pawn(3, 1, 3)).await,
                Err(Error::NotYourTurn)
            );
            engine.record_move(&black, id, pawn(4, 6, 4)).await.unwrap();
            assert_eq!(engine.moves(id).await.unwrap().len(), 2);
        });
    }

    #[test]
    fn test_concurrent_join_admits_one() {
        let executor = Runner::default();
        executor.start(|context| async move {
            let engine = TestEngine::new(context, test_config(), Ledger::default());
            let (white, _) = player(1);
            let (bob, _) = player(2);
            let (carol, _) = player(3);
            let (id, _) = engine.create_game(&white, 25).await.unwrap();

            let (first, second) = futures::join!(
                engine.join_game(&bob, id, 25),
                engine.join_game(&carol, id, 25)
            );
            let outcomes = [first.is_ok(), second.is_ok()];
            assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
            assert!(matches!(
                (&first, &second),
                (Ok(_), Err(Error::GameNotActive)) | (Err(Error::GameNotActive), Ok(_))
            ));

            let custody = engine.custody(Context::Game(id)).await.unwrap();
            assert_eq!(custody.deposited(), 50);
            assert_eq!(custody.deposits.len(), 2);
        });
    }

    #[test]
    fn test_unknown_escrows() {
        let executor = Runner::default();
        executor.start(|context| async move {
            let engine = TestEngine::new(context, test_config(), Ledger::default());
            let (alice, _) = player(1);
            assert_eq!(
                engine.join_game(&alice, 42, 10).await,
                Err(Error::GameNotFound)
            );
            assert_eq!(
                engine.register(&alice, 42, 10).await,
                Err(Error::TournamentNotFound)
            );
            assert_eq!(
                engine.retry_payouts(Context::Game(42)).await,
                Err(Error::GameNotFound)
            );
            assert!(engine.game(42).await.is_none());
            assert!(engine.prize_pool(42).await.is_none());
        });
    }

    #[test]
    fn test_rejected_create_allocates_no_escrow() {
        let executor = Runner::default();
        executor.start(|context| async move {
            let engine = TestEngine::new(context, test_config(), Ledger::default());
            let (alice, _) = player(1);
            assert_eq!(
                engine.create_game(&alice, 0).await,
                Err(Error::InvalidAmount)
            );
            // The rejected attempt consumed id 1
            let (id, _) = engine.create_game(&alice, 10).await.unwrap();
            assert_eq!(id, 2);
            assert!(engine.game(1).await.is_none());
        });
    }

    #[test]
    fn test_four_player_tournament() {
        let executor = Runner::default();
        executor.start(|context| async move {
            let engine = TestEngine::new(context, test_config(), Ledger::default());
            engine.set_platform_fee(&admin(), 500).unwrap();
            let (organizer, _) = player(0);
            let players: Vec<(Caller, PublicKey)> = (1..=4).map(player).collect();
            let [a, b, c, d] = [0, 1, 2, 3].map(|i| players[i].1.clone());

            let (id, _) = engine
                .create_tournament(&organizer, params(4))
                .await
                .unwrap();
            for (caller, _) in &players {
                engine.register(caller, id, 10).await.unwrap();
            }
            assert_eq!(engine.prize_pool(id).await, Some(40));
            assert_eq!(
                engine.matches(id).await.unwrap(),
                vec![
                    Match::pairing(1, a.clone(), b.clone()),
                    Match::pairing(1, c.clone(), d.clone()),
                ]
            );

            engine
                .report_result(&organizer, id, 0, a.clone())
                .await
                .unwrap();
            let events = engine
                .report_result(&organizer, id, 1, c.clone())
                .await
                .unwrap();
            assert_eq!(events.last(), Some(&Event::RoundAdvanced { id, round: 2 }));
            assert_eq!(
                engine.matches(id).await.unwrap()[2],
                Match::pairing(2, a.clone(), c.clone())
            );

            engine
                .report_result(&organizer, id, 2, a.clone())
                .await
                .unwrap();
            let tournament = engine.tournament(id).await.unwrap();
            assert_eq!(tournament.state, TournamentState::Finished);
            assert_eq!(tournament.champion, Some(a.clone()));

            let ledger = engine.transfer();
            assert_eq!(ledger.balance(&Recipient::Player(a)), 38);
            assert_eq!(ledger.balance(&Recipient::Platform), 2);
            assert_eq!(ledger.total(), 40);
        });
    }

    #[test]
    fn test_cancel_active_tournament_refunds_everyone() {
        let executor = Runner::default();
        executor.start(|context| async move {
            let engine = TestEngine::new(context, test_config(), Ledger::default());
            let (organizer, _) = player(0);
            let players: Vec<(Caller, PublicKey)> = (1..=3).map(player).collect();
            let (id, _) = engine
                .create_tournament(&organizer, params(3))
                .await
                .unwrap();
            for (caller, _) in &players {
                engine.register(caller, id, 10).await.unwrap();
            }
            assert_eq!(
                engine.tournament(id).await.unwrap().state,
                TournamentState::Active
            );

            let events = engine.cancel_tournament(&admin(), id).await.unwrap();
            assert_eq!(
                events[0],
                Event::TournamentCancelled {
                    id,
                    previous: TournamentState::Active,
                    refunded: 30,
                }
            );
            for (_, public) in &players {
                assert_eq!(
                    engine
                        .transfer()
                        .balance(&Recipient::Player(public.clone())),
                    10
                );
            }
            assert_eq!(engine.transfer().balance(&Recipient::Platform), 0);
        });
    }

    #[test]
    fn test_failed_payout_is_retried_once() {
        let executor = Runner::default();
        executor.start(|context| async move {
            let engine = Engine::new(context, test_config(), FlakyTransfer::failing(1));
            let (white, white_key) = player(1);
            let id = active_game(&engine, 100).await;

            // The decision stands even though the first credit fails
            engine.end_game(&white, id, Outcome::WhiteWon).await.unwrap();
            assert_eq!(engine.game(id).await.unwrap().state, GameState::WhiteWon);
            let ledger = &engine.transfer().ledger;
            assert_eq!(ledger.balance(&Recipient::Player(white_key.clone())), 0);
            assert_eq!(ledger.balance(&Recipient::Platform), 5);

            let custody = engine.custody(Context::Game(id)).await.unwrap();
            assert_eq!(custody.unsettled().count(), 1);
            assert_eq!(custody.custodied_amount(), 0);

            assert_eq!(engine.retry_payouts(Context::Game(id)).await, Ok(1));
            assert_eq!(ledger.balance(&Recipient::Player(white_key.clone())), 195);

            let attempts = engine.transfer().attempts();
            assert_eq!(engine.retry_payouts(Context::Game(id)).await, Ok(0));
            assert_eq!(engine.transfer().attempts(), attempts);
            assert_eq!(ledger.balance(&Recipient::Player(white_key)), 195);
        });
    }

    #[test]
    fn test_platform_fee_administration() {
        let executor = Runner::default();
        executor.start(|context| async move {
            let engine = TestEngine::new(context, test_config(), Ledger::default());
            let (alice, _) = player(1);
            assert_eq!(engine.platform_fee_bps(), 250);
            assert_eq!(
                engine.set_platform_fee(&alice, 100),
                Err(Error::Unauthorized)
            );
            assert_eq!(
                engine.set_platform_fee(&admin(), 1_001),
                Err(Error::FeeTooHigh)
            );
            engine.set_platform_fee(&admin(), 1_000).unwrap();
            assert_eq!(engine.platform_fee_bps(), 1_000);
        });
    }

    #[test]
    fn test_cancel_active_game_refunds_both_seats() {
        let executor = Runner::default();
        executor.start(|context| async move {
            let engine = TestEngine::new(context, test_config(), Ledger::default());
            let (white, white_key) = player(1);
            let (_, black_key) = player(2);
            let id = active_game(&engine, 40).await;
            engine.record_move(&white, id, pawn(4, 1, 3)).await.unwrap();

            let events = engine.cancel_game(&admin(), id).await.unwrap();
            assert_eq!(events[0], Event::GameCancelled { id, refunded: 80 });

            let ledger = engine.transfer();
            assert_eq!(ledger.balance(&Recipient::Player(white_key)), 40);
            assert_eq!(ledger.balance(&Recipient::Player(black_key)), 40);
            assert_eq!(ledger.balance(&Recipient::Platform), 0);

            let custody = engine.custody(Context::Game(id)).await.unwrap();
            assert_eq!(custody.custodied_amount(), 0);
            assert_eq!(custody.unsettled().count(), 0);
            assert_eq!(engine.game(id).await.unwrap().state, GameState::Cancelled);
            assert_eq!(
                engine.end_game(&white, id, Outcome::WhiteWon).await,
                Err(Error::GameNotActive)
            );
        });
    }

    #[test]
    fn test_concurrent_reports_decide_match_once() {
        let executor = Runner::default();
        executor.start(|context| async move {
            let engine = TestEngine::new(context, test_config(), Ledger::default());
            let (organizer, _) = player(0);
            let players: Vec<(Caller, PublicKey)> = (1..=4).map(player).collect();
            let (a, b) = (players[0].1.clone(), players[1].1.clone());
            let (id, _) = engine
                .create_tournament(&organizer, params(4))
                .await
                .unwrap();
            for (caller, _) in &players {
                engine.register(caller, id, 10).await.unwrap();
            }

            let admin_caller = admin();
            let (first, second) = futures::join!(
                engine.report_result(&organizer, id, 0, a.clone()),
                engine.report_result(&admin_caller, id, 0, b.clone())
            );
            assert!(matches!(
                (&first, &second),
                (Ok(_), Err(Error::AlreadyComplete)) | (Err(Error::AlreadyComplete), Ok(_))
            ));

            let decided = engine.matches(id).await.unwrap()[0].clone();
            let expected = if first.is_ok() { a } else { b };
            assert_eq!(decided.winner, Some(expected));
            assert!(decided.is_complete);
            assert_eq!(engine.matches(id).await.unwrap().len(), 2);
            assert_eq!(engine.transfer().total(), 0);
        });
    }

    /// Hands out the same id every time.
    struct Repeating(u64);

    impl IdGenerator for Repeating {
        fn next(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn test_repeated_id_keeps_existing_escrow() {
        let executor = Runner::default();
        executor.start(|context| async move {
            let engine = Engine::with_ids(
                context,
                test_config(),
                Ledger::default(),
                Repeating(7),
                Repeating(7),
            );
            let (white, white_key) = player(1);
            let (other, _) = player(2);

            let (id, _) = engine.create_game(&white, 30).await.unwrap();
            assert_eq!(id, 7);
            assert_eq!(
                engine.create_game(&other, 90).await,
                Err(Error::IdInUse)
            );

            let game = engine.game(7).await.unwrap();
            assert_eq!(game.white, white_key);
            assert_eq!(game.stake, 30);
            assert_eq!(
                engine.custody(Context::Game(7)).await.unwrap().deposited(),
                30
            );

            // Games and tournaments live in separate id spaces
            let (organizer, _) = player(3);
            let (tournament, _) = engine
                .create_tournament(&organizer, params(2))
                .await
                .unwrap();
            assert_eq!(tournament, 7);
        });
    }
}
