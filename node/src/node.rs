//! The node worker: single owner of the head state.
//!
//! Exactly one task consumes the event queue, applies the pure `update`
//! function, persists the applied event to the journal and only then
//! dispatches the resulting effects. This serialisation is the entire
//! concurrency policy of the core: network, chain follower and client all
//! just enqueue events.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, trace, warn};

use chain::{ChainFollower, ChainSyncMessage};
use head::{
    update, ClientCommand, ClientNotification, Effect, Environment, Event, HeadState, Outcome,
};
use journal::EventJournal;
use ledger::Ledger;

use crate::chain_client::ChainClient;
use crate::comm::{
    event_channel, notification_channel, EventReceiver, EventSender, NotificationReceiver,
    NotificationSender,
};
use crate::config::Config;
use crate::errors::NodeError;
use crate::network::Network;

/// Handle for communicating with a running node.
#[derive(Clone)]
pub struct NodeHandle<L: Ledger> {
    events: EventSender<L>,
    shutdown: mpsc::Sender<()>,
    state: watch::Receiver<HeadState<L>>,
}

impl<L: Ledger> NodeHandle<L> {
    /// Submits a client command.
    pub async fn submit(&self, command: ClientCommand<L>) -> Result<(), NodeError> {
        self.events
            .send(Event::Client(command))
            .await
            .map_err(|_| NodeError::ChannelClosed)
    }

    /// The event queue, for wiring up networks and followers.
    pub fn events(&self) -> EventSender<L> {
        self.events.clone()
    }

    /// The most recently published head state.
    pub fn state(&self) -> HeadState<L> {
        self.state.borrow().clone()
    }

    /// Waits until the published head state satisfies `pred`.
    pub async fn wait_for_state(&self, pred: impl Fn(&HeadState<L>) -> bool) {
        let mut receiver = self.state.clone();
        loop {
            if pred(&receiver.borrow()) {
                return;
            }
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }

    /// Asks the worker to drain its queue, flush the journal and stop.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(()).await;
    }
}

/// The node worker. Owns the head state and the journal.
pub struct Node<L: Ledger, N, C> {
    env: Environment,
    ledger: L,
    state: HeadState<L>,
    journal: EventJournal<Event<L>>,
    network: N,
    chain: C,
    notifications: NotificationSender<L>,
    events_rx: EventReceiver<L>,
    events_tx: EventSender<L>,
    waiting: VecDeque<Event<L>>,
    wait_depth: usize,
    state_tx: watch::Sender<HeadState<L>>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl<L, N, C> Node<L, N, C>
where
    L: Ledger,
    N: Network<L>,
    C: ChainClient<L>,
{
    /// Restores the head state from the journal and spawns the worker.
    ///
    /// Replay applies every journalled event with effects suppressed: the
    /// effects were already dispatched by the run that journalled them.
    pub fn spawn(
        config: &Config,
        env: Environment,
        ledger: L,
        network: N,
        chain: C,
    ) -> Result<(NodeHandle<L>, NotificationReceiver<L>, JoinHandle<Result<(), NodeError>>), NodeError>
    {
        let mut journal = EventJournal::open(&config.journal_path)?;
        let records = journal.load_all()?;
        let mut state = HeadState::Idle;
        for record in records {
            match update(&env, &ledger, &state, &record.payload) {
                Outcome::NewState { state: next, .. } => state = next,
                _ => return Err(NodeError::ReplayDiverged { id: record.id }),
            }
        }
        info!(
            party = env.party.index,
            events = journal.next_id(),
            "restored head state from journal"
        );

        let (events_tx, events_rx) = event_channel(config.event_queue_depth);
        let (notifications, notifications_rx) = notification_channel(config.event_queue_depth);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (state_tx, state_rx) = watch::channel(state.clone());

        let handle = NodeHandle {
            events: events_tx.clone(),
            shutdown: shutdown_tx,
            state: state_rx,
        };
        let node = Node {
            env,
            ledger,
            state,
            journal,
            network,
            chain,
            notifications,
            events_rx,
            events_tx,
            waiting: VecDeque::new(),
            wait_depth: config.wait_queue_depth,
            state_tx,
            shutdown_rx,
        };
        let worker = tokio::spawn(node.run());
        Ok((handle, notifications_rx, worker))
    }

    async fn run(mut self) -> Result<(), NodeError> {
        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    // Drain what is already queued, then flush and stop.
                    while let Ok(event) = self.events_rx.try_recv() {
                        self.process(event).await?;
                    }
                    self.journal.sync()?;
                    debug!(party = self.env.party.index, "node worker stopped");
                    return Ok(());
                }
                maybe_event = self.events_rx.recv() => match maybe_event {
                    Some(event) => self.process(event).await?,
                    None => return Ok(()),
                },
            }
        }
    }

    /// Applies one event, then retries parked events for as long as the
    /// state keeps changing.
    async fn process(&mut self, event: Event<L>) -> Result<(), NodeError> {
        let mut progressed = self.apply(event).await?;
        while progressed && !self.waiting.is_empty() {
            let retry: Vec<Event<L>> = self.waiting.drain(..).collect();
            progressed = false;
            for event in retry {
                if self.apply(event).await? {
                    progressed = true;
                }
            }
        }
        Ok(())
    }

    /// Applies one event. Returns whether the state changed.
    async fn apply(&mut self, event: Event<L>) -> Result<bool, NodeError> {
        match update(&self.env, &self.ledger, &self.state, &event) {
            Outcome::NewState { state, effects } => {
                // Durability before visibility: the event must be in the
                // journal before any of its effects can be seen outside.
                self.journal.append(&event)?;
                self.state = state;
                let _ = self.state_tx.send(self.state.clone());
                for effect in effects {
                    self.dispatch(effect).await?;
                }
                Ok(true)
            }
            Outcome::Wait { reason } => {
                trace!(?reason, "parking event for retry");
                if self.waiting.len() >= self.wait_depth {
                    if let Some(dropped) = self.waiting.pop_front() {
                        warn!(?dropped, "wait queue overflow, dropping oldest event");
                        let _ = self.notifications.send(ClientNotification::EventDropped {
                            description: format!("{:?}", dropped),
                        });
                    }
                }
                self.waiting.push_back(event);
                Ok(false)
            }
            Outcome::Error(error) => {
                warn!(%error, "protocol violation");
                if let Event::Client(_) = &event {
                    let _ = self.notifications.send(ClientNotification::CommandFailed {
                        reason: error.to_string(),
                    });
                }
                Ok(false)
            }
        }
    }

    async fn dispatch(&mut self, effect: Effect<L>) -> Result<(), NodeError> {
        match effect {
            Effect::SendToPeers(message) => {
                self.network.broadcast(message).await;
                Ok(())
            }
            Effect::NotifyClient(notification) => {
                // No subscribers is fine; notifications are best effort.
                let _ = self.notifications.send(notification);
                Ok(())
            }
            Effect::PostTx(request) => {
                self.chain.post(request).await?;
                Ok(())
            }
            Effect::Delay { duration_ms, event } => {
                let sender = self.events_tx.clone();
                tokio::spawn(async move {
                    time::sleep(Duration::from_millis(duration_ms)).await;
                    let _ = sender.send(event).await;
                });
                Ok(())
            }
        }
    }
}

/// Drives a chain follower from a sync-message stream into a node's event
/// queue. Stops when either side hangs up; an unrecoverable rollback is
/// fatal and surfaces through the returned handle.
pub fn spawn_follower<L: Ledger>(
    mut follower: ChainFollower<L>,
    mut sync: mpsc::Receiver<ChainSyncMessage<L>>,
    events: EventSender<L>,
) -> JoinHandle<Result<(), NodeError>> {
    tokio::spawn(async move {
        while let Some(message) = sync.recv().await {
            for event in follower.handle(message)? {
                if events.send(Event::Chain(event)).await.is_err() {
                    return Ok(());
                }
            }
        }
        Ok(())
    })
}
