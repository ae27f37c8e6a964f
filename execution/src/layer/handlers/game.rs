use super::super::*;
use gambit_types::escrow::{Color, Game, GameState, Move, Outcome, MAX_MOVES};

impl<'a, S: State> Layer<'a, S> {
    // === Game Escrow Handlers ===

    async fn load_game(&self, id: u64) -> Result<Game, Error> {
        match self.get(&Key::Game(id)).await {
            Some(Value::Game(game)) => Ok(game),
            _ => Err(Error::GameNotFound),
        }
    }

    /// Players seated in the game, or an admin, may end it.
    fn can_terminate(caller: &Caller, game: &Game) -> bool {
        caller.is_admin() || game.color_of(caller.public()).is_some()
    }

    pub(in crate::layer) async fn handle_create_game(
        &mut self,
        caller: &Caller,
        id: u64,
        stake: u64,
    ) -> Result<Vec<Event>, Error> {
        if stake < self.config.min_stake || stake > self.config.max_stake {
            return Err(Error::InvalidAmount);
        }

        let white = caller.public().clone();
        self.deposit(Context::Game(id), &white, stake).await?;
        let game = Game::new(id, white.clone(), stake, self.now);
        self.insert(Key::Game(id), Value::Game(game));

        Ok(vec![Event::GameCreated { id, white, stake }])
    }

    pub(in crate::layer) async fn handle_join_game(
        &mut self,
        caller: &Caller,
        id: u64,
        stake: u64,
    ) -> Result<Vec<Event>, Error> {
        let mut game = self.load_game(id).await?;
        if game.state != GameState::WaitingForPlayer {
            return Err(Error::GameNotActive);
        }
        let black = caller.public().clone();
        if black == game.white {
            return Err(Error::Unauthorized);
        }
        if stake != game.stake {
            return Err(Error::StakeMismatch);
        }

        self.deposit(Context::Game(id), &black, stake).await?;
        game.black = Some(black.clone());
        game.state = GameState::Active;
        game.turn = Color::White;
        game.started_at = self.now;
        self.insert(Key::Game(id), Value::Game(game));

        Ok(vec![Event::GameJoined { id, black }])
    }

    pub(in crate::layer) async fn handle_record_move(
        &mut self,
        caller: &Caller,
        id: u64,
        mv: Move,
    ) -> Result<Vec<Event>, Error> {
        let mut game = self.load_game(id).await?;
        if game.state != GameState::Active {
            return Err(Error::GameNotActive);
        }
        let color = game.color_of(caller.public()).ok_or(Error::Unauthorized)?;
        if color != game.turn {
            return Err(Error::NotYourTurn);
        }
        if !mv.is_well_formed() {
            return Err(Error::InvalidCoordinates);
        }
        if game.moves.len() >= MAX_MOVES {
            return Err(Error::Overflow);
        }

        game.moves.push(mv);
        game.turn = color.opponent();
        let move_number = game.moves.len() as u32;
        self.insert(Key::Game(id), Value::Game(game));

        Ok(vec![Event::MoveRecorded {
            id,
            player: caller.public().clone(),
            mv,
            move_number,
        }])
    }

    pub(in crate::layer) async fn handle_end_game(
        &mut self,
        caller: &Caller,
        id: u64,
        outcome: Outcome,
    ) -> Result<Vec<Event>, Error> {
        let mut game = self.load_game(id).await?;
        if game.state != GameState::Active {
            return Err(Error::GameNotActive);
        }
        if !Self::can_terminate(caller, &game) {
            return Err(Error::Unauthorized);
        }
        let black = game.black.clone().ok_or(Error::GameNotActive)?;
        let white = game.white.clone();
        let pot = game.stake.checked_mul(2).ok_or(Error::Overflow)?;

        // Record the terminal state before any value leaves custody
        game.state = outcome.into();
        self.insert(Key::Game(id), Value::Game(game));

        let context = Context::Game(id);
        let mut events = Vec::new();
        let fee = match outcome {
            Outcome::WhiteWon | Outcome::BlackWon => {
                let winner = if outcome == Outcome::WhiteWon {
                    white
                } else {
                    black
                };
                let split = self.fees.split(pot);
                self.release(context, Recipient::Player(winner), split.net, &mut events)
                    .await?;
                self.release(context, Recipient::Platform, split.fee, &mut events)
                    .await?;
                split.fee
            }
            Outcome::Draw => {
                let (fee, (white_share, black_share)) = self.fees.draw(pot);
                self.release(context, Recipient::Player(white), white_share, &mut events)
                    .await?;
                self.release(context, Recipient::Player(black), black_share, &mut events)
                    .await?;
                self.release(context, Recipient::Platform, fee, &mut events)
                    .await?;
                fee
            }
        };

        events.insert(0, Event::GameEnded { id, outcome, fee });
        Ok(events)
    }

    pub(in crate::layer) async fn handle_cancel_game(
        &mut self,
        caller: &Caller,
        id: u64,
    ) -> Result<Vec<Event>, Error> {
        let mut game = self.load_game(id).await?;
        if game.state.is_terminal() {
            return Err(Error::GameNotActive);
        }
        if !caller.is_admin() {
            return Err(Error::Unauthorized);
        }

        game.state = GameState::Cancelled;
        self.insert(Key::Game(id), Value::Game(game));

        let mut events = Vec::new();
        let refunded = self.refund_all(Context::Game(id), &mut events).await?;
        events.insert(0, Event::GameCancelled { id, refunded });
        Ok(events)
    }
}
