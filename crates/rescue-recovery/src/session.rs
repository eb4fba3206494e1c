//! Async sessions that run engine requests against a chain.
//!
//! A session owns one engine and one chain handle. Each [`ProbeRequest`] the
//! engine emits is spawned as its own task; answers come back as tagged
//! [`ProbeEvent`]s over a channel and are folded into the engine one at a
//! time, so only the session task ever mutates engine state. Stale answers
//! are not aborted, the engine simply discards them.

use crate::constants::{RecoveryConfigReader, RecoveryConstants};
use crate::friend::FriendVouchEngine;
use crate::owner::OwnerEngine;
use crate::requests::{ProbeEvent, ProbeRequest};
use crate::rescuer::RescuerStepEngine;
use rescue_core::{AccountId, ChainError, ChainQueryEffects, EngineConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// An engine driven by probe events.
pub trait ProbeReducer: Send {
    /// Fold an event, returning follow-up requests.
    fn apply(&mut self, event: ProbeEvent) -> Vec<ProbeRequest>;

    /// Advance local timers by one tick.
    fn tick(&mut self) {}

    /// Receive the protocol constants for this connection.
    fn set_constants(&mut self, _constants: RecoveryConstants) {}
}

impl ProbeReducer for RescuerStepEngine {
    fn apply(&mut self, event: ProbeEvent) -> Vec<ProbeRequest> {
        RescuerStepEngine::apply(self, event)
    }

    fn tick(&mut self) {
        RescuerStepEngine::tick(self);
    }

    fn set_constants(&mut self, constants: RecoveryConstants) {
        RescuerStepEngine::set_constants(self, constants);
    }
}

impl ProbeReducer for FriendVouchEngine {
    fn apply(&mut self, event: ProbeEvent) -> Vec<ProbeRequest> {
        FriendVouchEngine::apply(self, event)
    }
}

impl ProbeReducer for OwnerEngine {
    fn apply(&mut self, event: ProbeEvent) -> Vec<ProbeRequest> {
        OwnerEngine::apply(self, event)
    }

    fn set_constants(&mut self, constants: RecoveryConstants) {
        OwnerEngine::set_constants(self, constants);
    }
}

#[derive(Debug)]
enum SessionMessage {
    Probe(ProbeEvent),
    Tick,
}

/// One engine bound to one chain connection.
pub struct RecoverySession<C: ?Sized, E> {
    chain: Arc<C>,
    engine: E,
    reader: RecoveryConfigReader,
    sender: mpsc::UnboundedSender<SessionMessage>,
    receiver: mpsc::UnboundedReceiver<SessionMessage>,
    in_flight: usize,
    tick_period: Duration,
    ticker: Option<JoinHandle<()>>,
}

/// Session driving a [`RescuerStepEngine`].
pub type RescuerSession<C> = RecoverySession<C, RescuerStepEngine>;

/// Session driving a [`FriendVouchEngine`].
pub type FriendSession<C> = RecoverySession<C, FriendVouchEngine>;

/// Session driving an [`OwnerEngine`].
pub type OwnerSession<C> = RecoverySession<C, OwnerEngine>;

impl<C, E> RecoverySession<C, E>
where
    C: ChainQueryEffects + ?Sized + 'static,
    E: ProbeReducer,
{
    /// Bind `engine` to `chain`.
    ///
    /// Protocol constants are read once here. A failed read is logged and
    /// retried by [`Self::constants`]; engines that need them report a
    /// precondition error until then.
    pub fn new(chain: Arc<C>, mut engine: E, config: &EngineConfig) -> Self {
        let reader = RecoveryConfigReader::new();
        match reader.constants(chain.as_ref()) {
            Ok(constants) => engine.set_constants(*constants),
            Err(err) => tracing::warn!(error = %err, "could not read recovery constants"),
        }
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            chain,
            engine,
            reader,
            sender,
            receiver,
            in_flight: 0,
            tick_period: Duration::from_millis(config.countdown_tick_ms.max(1)),
            ticker: None,
        }
    }

    /// The engine, for reading derived state.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Protocol constants, reading them now if the first read failed.
    pub fn constants(&mut self) -> Result<RecoveryConstants, ChainError> {
        let first_read = self.reader.cached().is_none();
        let constants = *self.reader.constants(self.chain.as_ref())?;
        if first_read {
            self.engine.set_constants(constants);
        }
        Ok(constants)
    }

    /// Mutate the engine and issue whatever requests it returns.
    pub fn update<F>(&mut self, f: F)
    where
        F: FnOnce(&mut E) -> Vec<ProbeRequest>,
    {
        let requests = f(&mut self.engine);
        self.dispatch(requests);
    }

    /// Requests issued and not yet folded back in.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Wait for the next event and fold it into the engine.
    pub async fn process_next(&mut self) {
        let Some(message) = self.receiver.recv().await else {
            return;
        };
        match message {
            SessionMessage::Probe(event) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                let requests = self.engine.apply(event);
                self.dispatch(requests);
            }
            SessionMessage::Tick => self.engine.tick(),
        }
    }

    /// Fold events until no request is in flight.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            self.process_next().await;
        }
    }

    /// Start posting countdown ticks every tick period.
    pub fn start_countdown(&mut self) {
        if self.ticker.is_some() {
            return;
        }
        let sender = self.sender.clone();
        let period = self.tick_period;
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if sender.send(SessionMessage::Tick).is_err() {
                    break;
                }
            }
        }));
    }

    /// Stop the countdown ticker.
    pub fn stop_countdown(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    fn dispatch(&mut self, requests: Vec<ProbeRequest>) {
        for request in requests {
            tracing::debug!(kind = request.kind(), "dispatching probe request");
            self.in_flight += 1;
            let chain = Arc::clone(&self.chain);
            let sender = self.sender.clone();
            tokio::spawn(async move {
                let event = request.execute(chain.as_ref()).await;
                // The session may be gone; its answer is no longer wanted.
                let _ = sender.send(SessionMessage::Probe(event));
            });
        }
    }
}

impl<C, E> RecoverySession<C, E>
where
    C: ChainQueryEffects + ?Sized + 'static,
    E: ProbeReducer + Default,
{
    /// Bind a default engine to `chain`.
    pub fn with_default_engine(chain: Arc<C>, config: &EngineConfig) -> Self {
        Self::new(chain, E::default(), config)
    }
}

impl<C> RescuerSession<C>
where
    C: ChainQueryEffects + ?Sized + 'static,
{
    /// Session for a rescuer.
    pub fn rescuer(chain: Arc<C>, config: &EngineConfig) -> Self {
        Self::new(chain, RescuerStepEngine::new(config.clone()), config)
    }
}

impl<C> FriendSession<C>
where
    C: ChainQueryEffects + ?Sized + 'static,
{
    /// Session for the friend `caller`.
    pub fn friend(chain: Arc<C>, caller: AccountId, config: &EngineConfig) -> Self {
        Self::new(chain, FriendVouchEngine::new(caller), config)
    }
}

impl<C: ?Sized, E> Drop for RecoverySession<C, E> {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}
