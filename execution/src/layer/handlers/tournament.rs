use super::super::*;
use crate::bracket::{self, Advance};
use gambit_types::escrow::{
    Tournament, TournamentParams, TournamentState, MAX_NAME_LENGTH, MAX_TOURNAMENT_PLAYERS,
};

impl<'a, S: State> Layer<'a, S> {
    // === Tournament Escrow Handlers ===

    async fn load_tournament(&self, id: u64) -> Result<Tournament, Error> {
        match self.get(&Key::Tournament(id)).await {
            Some(Value::Tournament(tournament)) => Ok(tournament),
            _ => Err(Error::TournamentNotFound),
        }
    }

    fn can_administer(caller: &Caller, tournament: &Tournament) -> bool {
        caller.is_admin() || caller.public() == &tournament.organizer
    }

    pub(in crate::layer) async fn handle_create_tournament(
        &mut self,
        caller: &Caller,
        id: u64,
        params: &TournamentParams,
    ) -> Result<Vec<Event>, Error> {
        if params.name.is_empty() || params.name.len() > MAX_NAME_LENGTH {
            return Err(Error::InvalidName);
        }
        if params.entry_fee < self.config.min_entry_fee
            || params.entry_fee > self.config.max_entry_fee
        {
            return Err(Error::InvalidAmount);
        }
        if params.max_players < 2
            || params.max_players > self.config.max_tournament_players
            || params.max_players as usize > MAX_TOURNAMENT_PLAYERS
        {
            return Err(Error::InvalidMaxPlayers);
        }
        if params.start_time <= self.now {
            return Err(Error::StartTimeInPast);
        }

        let organizer = caller.public().clone();
        let tournament = Tournament::new(id, organizer.clone(), params.clone(), self.now);
        self.insert(Key::Tournament(id), Value::Tournament(tournament));
        self.insert(
            Key::Custody(Context::Tournament(id)),
            Value::Custody(Custody::new(Context::Tournament(id))),
        );

        Ok(vec![Event::TournamentCreated {
            id,
            organizer,
            entry_fee: params.entry_fee,
            max_players: params.max_players,
        }])
    }

    pub(in crate::layer) async fn handle_register(
        &mut self,
        caller: &Caller,
        id: u64,
        fee: u64,
    ) -> Result<Vec<Event>, Error> {
        let mut tournament = self.load_tournament(id).await?;
        if tournament.state != TournamentState::Registration {
            return Err(Error::TournamentNotInState);
        }
        if fee != tournament.entry_fee {
            return Err(Error::InvalidAmount);
        }
        let player = caller.public().clone();
        if tournament.contains_player(&player) {
            return Err(Error::AlreadyRegistered);
        }
        if tournament.is_full() {
            return Err(Error::TournamentFull);
        }

        self.deposit(Context::Tournament(id), &player, fee).await?;
        tournament.players.push(player.clone());
        tournament.prize_pool = tournament
            .prize_pool
            .checked_add(fee)
            .ok_or(Error::Overflow)?;

        let mut events = vec![Event::PlayerRegistered {
            id,
            player,
            prize_pool: tournament.prize_pool,
        }];

        // The registration that fills the field starts the tournament
        if tournament.is_full() {
            tournament.bracket = bracket::seed(&tournament.players)?;
            tournament.state = TournamentState::Active;
            tournament.started_at = self.now;
            events.push(Event::TournamentStarted {
                id,
                players: tournament.players.len() as u32,
            });
        }
        self.insert(Key::Tournament(id), Value::Tournament(tournament));

        Ok(events)
    }

    pub(in crate::layer) async fn handle_report_result(
        &mut self,
        caller: &Caller,
        id: u64,
        match_id: u64,
        winner: &PublicKey,
    ) -> Result<Vec<Event>, Error> {
        let mut tournament = self.load_tournament(id).await?;
        if tournament.state != TournamentState::Active {
            return Err(Error::TournamentNotInState);
        }
        if !Self::can_administer(caller, &tournament) {
            return Err(Error::Unauthorized);
        }

        bracket::complete_match(&mut tournament.bracket, match_id, winner)?;
        let mut events = vec![Event::MatchCompleted {
            id,
            match_id,
            winner: winner.clone(),
        }];

        match bracket::advance_round_if_ready(&mut tournament.bracket) {
            Advance::Pending => {
                self.insert(Key::Tournament(id), Value::Tournament(tournament));
            }
            Advance::NextRound(round) => {
                self.insert(Key::Tournament(id), Value::Tournament(tournament));
                events.push(Event::RoundAdvanced { id, round });
            }
            Advance::Champion(champion) => {
                let prize_pool = tournament.prize_pool;
                tournament.state = TournamentState::Finished;
                tournament.champion = Some(champion.clone());
                self.insert(Key::Tournament(id), Value::Tournament(tournament));

                let split = self.fees.split(prize_pool);
                events.push(Event::TournamentFinished {
                    id,
                    champion: champion.clone(),
                    prize: split.net,
                    fee: split.fee,
                });
                let context = Context::Tournament(id);
                self.release(context, Recipient::Player(champion), split.net, &mut events)
                    .await?;
                self.release(context, Recipient::Platform, split.fee, &mut events)
                    .await?;
            }
        }

        Ok(events)
    }

    pub(in crate::layer) async fn handle_cancel_tournament(
        &mut self,
        caller: &Caller,
        id: u64,
    ) -> Result<Vec<Event>, Error> {
        let mut tournament = self.load_tournament(id).await?;
        let previous = tournament.state;
        if !matches!(
            previous,
            TournamentState::Registration | TournamentState::Active
        ) {
            return Err(Error::TournamentNotInState);
        }
        if !Self::can_administer(caller, &tournament) {
            return Err(Error::Unauthorized);
        }

        tournament.state = TournamentState::Cancelled;
        self.insert(Key::Tournament(id), Value::Tournament(tournament));

        let mut events = Vec::new();
        let refunded = self
            .refund_all(Context::Tournament(id), &mut events)
            .await?;
        events.insert(
            0,
            Event::TournamentCancelled {
                id,
                previous,
                refunded,
            },
        );
        Ok(events)
    }
}
