use gambit_types::{
    escrow::{Caller, Context, Custody, Recipient},
    execution::{Event, Instruction, Key, Value},
    PublicKey,
};
use std::collections::BTreeMap;

use crate::{
    fee::FeePolicy,
    state::State,
    vault, Error, ValidatedConfig,
};

mod handlers;

/// Stages the writes of a single instruction over a read-only view of an
/// escrow's state. Nothing reaches the underlying state unless the caller
/// takes [Layer::commit] after a successful [Layer::apply]; dropping the
/// layer discards every staged write.
pub struct Layer<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Value>,

    config: &'a ValidatedConfig,
    fees: FeePolicy,
    /// Unix timestamp (milliseconds) at which the instruction executes
    now: u64,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(state: &'a S, config: &'a ValidatedConfig, fees: FeePolicy, now: u64) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),

            config,
            fees,
            now,
        }
    }

    fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, value);
    }

    pub async fn apply(
        &mut self,
        caller: &Caller,
        instruction: &Instruction,
    ) -> Result<Vec<Event>, Error> {
        match instruction {
            Instruction::CreateGame { id, stake } => {
                self.handle_create_game(caller, *id, *stake).await
            }
            Instruction::JoinGame { id, stake } => self.handle_join_game(caller, *id, *stake).await,
            Instruction::RecordMove { id, mv } => self.handle_record_move(caller, *id, *mv).await,
            Instruction::EndGame { id, outcome } => {
                self.handle_end_game(caller, *id, *outcome).await
            }
            Instruction::CancelGame { id } => self.handle_cancel_game(caller, *id).await,
            Instruction::CreateTournament { id, params } => {
                self.handle_create_tournament(caller, *id, params).await
            }
            Instruction::Register { id, fee } => self.handle_register(caller, *id, *fee).await,
            Instruction::ReportResult {
                id,
                match_id,
                winner,
            } => {
                self.handle_report_result(caller, *id, *match_id, winner)
                    .await
            }
            Instruction::CancelTournament { id } => {
                self.handle_cancel_tournament(caller, *id).await
            }
        }
    }

    pub fn commit(self) -> Vec<(Key, Value)> {
        self.pending.into_iter().collect()
    }

    // === Vault ===

    async fn custody(&self, context: Context) -> Custody {
        match self.get(&Key::Custody(context)).await {
            Some(Value::Custody(custody)) => custody,
            _ => Custody::new(context),
        }
    }

    async fn deposit(
        &mut self,
        context: Context,
        depositor: &PublicKey,
        amount: u64,
    ) -> Result<(), Error> {
        let mut custody = self.custody(context).await;
        vault::deposit(&mut custody, depositor.clone(), amount)?;
        self.insert(Key::Custody(context), Value::Custody(custody));
        Ok(())
    }

    /// Release `amount` from `context`'s custody. Zero amounts are skipped
    /// so a fee-free distribution does not record an empty platform payout.
    async fn release(
        &mut self,
        context: Context,
        recipient: Recipient,
        amount: u64,
        events: &mut Vec<Event>,
    ) -> Result<(), Error> {
        if amount == 0 {
            return Ok(());
        }
        let mut custody = self.custody(context).await;
        vault::release(&mut custody, context, recipient.clone(), amount)?;
        self.insert(Key::Custody(context), Value::Custody(custody));
        events.push(Event::Released {
            context,
            recipient,
            amount,
        });
        Ok(())
    }

    /// Return every deposit in `context` to its depositor.
    async fn refund_all(
        &mut self,
        context: Context,
        events: &mut Vec<Event>,
    ) -> Result<u64, Error> {
        let deposits = self.custody(context).await.deposits;
        let mut refunded = 0u64;
        for deposit in deposits {
            self.release(
                context,
                Recipient::Player(deposit.depositor),
                deposit.amount,
                events,
            )
            .await?;
            refunded = refunded.checked_add(deposit.amount).ok_or(Error::Overflow)?;
        }
        Ok(refunded)
    }
}

impl<'a, S: State> State for Layer<'a, S> {
    async fn get(&self, key: &Key) -> Option<Value> {
        match self.pending.get(key) {
            Some(value) => Some(value.clone()),
            None => self.state.get(key).await,
        }
    }

    async fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, value);
    }
}
