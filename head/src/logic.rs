//! The pure head state machine.
//!
//! [`update`] consumes one event against the current [`HeadState`] and
//! yields a new state plus a list of effects, a request to retry the event
//! later (`Wait`), or a protocol error. It performs no I/O whatsoever; the
//! surrounding node owns persistence and effect dispatch.

use std::collections::{BTreeMap, BTreeSet};

use chain::{ChainEvent, ContestationPeriod, HeadParameters, OnChainTx, UnixTime};
use ledger::Ledger;
use multisig::{MultiSignature, MultisigError, Party, Signature, SigningKey};

use crate::client::{ClientCommand, ClientNotification};
use crate::effect::{Effect, PostChainTx};
use crate::errors::LogicError;
use crate::event::Event;
use crate::message::Message;
use crate::snapshot::{ConfirmedSnapshot, Snapshot, SnapshotInProgress};
use crate::state::{ClosedHead, FinalHead, HeadState, InitialHead, OpenHead};

/// Static environment of one head member: who we are, who else is in the
/// head, and the key we sign snapshots with.
#[derive(Clone, Debug)]
pub struct Environment {
    /// Our own party identity.
    pub party: Party,
    /// Key used to sign snapshots.
    pub signing_key: SigningKey,
    /// The full ordered party list, including ourselves.
    pub parties: Vec<Party>,
    /// Contestation period to freeze into initialised heads.
    pub contestation_period: ContestationPeriod,
}

impl Environment {
    /// Party responsible for proposing snapshot `number`.
    ///
    /// Leadership rotates through the ordered party list; party 0 leads
    /// snapshot 1.
    pub fn leader(&self, number: u64) -> &Party {
        let index = (number.saturating_sub(1) % self.parties.len() as u64) as usize;
        &self.parties[index]
    }

    fn all_indices(&self) -> BTreeSet<u32> {
        self.parties.iter().map(|p| p.index).collect()
    }
}

/// Why a valid event cannot be acted on yet. The node re-queues such
/// events and retries them after the next state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitReason {
    /// The transaction's inputs are not in the local UTxO set yet.
    TxNotYetApplicable,
    /// The requested snapshot refers to transactions we have not confirmed.
    SnapshotTxsNotConfirmed,
    /// An acknowledgement arrived before the transaction itself.
    TxNotSeen,
    /// A snapshot acknowledgement arrived before the snapshot request.
    SnapshotNotInProgress,
    /// Protocol traffic arrived before the head opened.
    HeadNotOpen,
}

/// Outcome of applying one event.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<L: Ledger> {
    /// The event was applied.
    NewState {
        /// The successor state.
        state: HeadState<L>,
        /// Effects to dispatch, in order.
        effects: Vec<Effect<L>>,
    },
    /// The event is valid but cannot be acted on yet; retry it later.
    Wait {
        /// Why the event has to wait.
        reason: WaitReason,
    },
    /// The event violates the protocol. State is unchanged.
    Error(LogicError<L>),
}

impl<L: Ledger> Outcome<L> {
    fn next(state: HeadState<L>, effects: Vec<Effect<L>>) -> Self {
        Outcome::NewState { state, effects }
    }

    /// The event is irrelevant or a duplicate: keep the state, no effects.
    fn ignored(state: &HeadState<L>) -> Self {
        Outcome::NewState {
            state: state.clone(),
            effects: Vec::new(),
        }
    }
}

fn notify<L: Ledger>(notification: ClientNotification<L>) -> Effect<L> {
    Effect::NotifyClient(notification)
}

fn command_failed<L: Ledger>(state: &HeadState<L>, reason: &str) -> Outcome<L> {
    Outcome::next(
        state.clone(),
        vec![notify(ClientNotification::CommandFailed {
            reason: reason.to_string(),
        })],
    )
}

fn invalid_event<L: Ledger>(event: &Event<L>, state: &HeadState<L>) -> Outcome<L> {
    Outcome::Error(LogicError::InvalidEvent {
        event: Box::new(event.clone()),
        state: Box::new(state.clone()),
    })
}

/// Applies one event to the head state.
///
/// Pure and deterministic: the same `(env, state, event)` triple always
/// yields the same outcome, which is what makes journal replay sound.
pub fn update<L: Ledger>(
    env: &Environment,
    ledger: &L,
    state: &HeadState<L>,
    event: &Event<L>,
) -> Outcome<L> {
    // Events meaningful in every state.
    match event {
        Event::Network(Message::Ping { host }) => {
            return Outcome::next(
                state.clone(),
                vec![notify(ClientNotification::PeerConnected { host: host.clone() })],
            );
        }
        Event::Chain(ChainEvent::Rollback { point, .. }) => {
            // The chain follower has already restored its state; off-chain
            // progress is kept and re-observation rebuilds the rest.
            return Outcome::next(
                state.clone(),
                vec![notify(ClientNotification::RolledBack { point: *point })],
            );
        }
        _ => {}
    }

    match state {
        HeadState::Idle => update_idle(env, state, event),
        HeadState::Initial(st) => update_initial(env, state, st, event),
        HeadState::Open(st) => update_open(env, ledger, state, st, event),
        HeadState::Closed(st) => update_closed(env, state, st, event),
        HeadState::Final(st) => update_final(state, st, event),
    }
}

fn update_idle<L: Ledger>(
    env: &Environment,
    state: &HeadState<L>,
    event: &Event<L>,
) -> Outcome<L> {
    match event {
        Event::Client(ClientCommand::Init {
            parties,
            contestation_period,
        }) => {
            if !parties.contains(&env.party) {
                return command_failed(state, "cannot initialise a head we are not a party of");
            }
            Outcome::next(
                state.clone(),
                vec![Effect::PostTx(PostChainTx::Init {
                    parties: parties.clone(),
                    contestation_period: *contestation_period,
                })],
            )
        }
        Event::Client(_) => command_failed(state, "no head is initialised"),
        Event::Chain(ChainEvent::Observation {
            tx:
                OnChainTx::Init {
                    head_id,
                    parties,
                    contestation_period,
                },
            ..
        }) => {
            if !parties.contains(&env.party) {
                return Outcome::ignored(state);
            }
            let parameters = HeadParameters {
                contestation_period: *contestation_period,
                parties: parties.clone(),
            };
            Outcome::next(
                HeadState::Initial(InitialHead {
                    head_id: *head_id,
                    parameters,
                    committed: BTreeMap::new(),
                    pending_commits: parties.clone(),
                }),
                vec![notify(ClientNotification::ReadyToCommit {
                    parties: parties.clone(),
                })],
            )
        }
        _ => Outcome::ignored(state),
    }
}

fn update_initial<L: Ledger>(
    env: &Environment,
    state: &HeadState<L>,
    st: &InitialHead<L>,
    event: &Event<L>,
) -> Outcome<L> {
    match event {
        Event::Client(ClientCommand::Commit { utxo }) => {
            if !st.pending_commits.contains(&env.party) {
                return command_failed(state, "already committed to this head");
            }
            Outcome::next(
                state.clone(),
                vec![Effect::PostTx(PostChainTx::Commit {
                    head_id: st.head_id,
                    utxo: utxo.clone(),
                })],
            )
        }
        Event::Client(ClientCommand::Abort) => Outcome::next(
            state.clone(),
            vec![Effect::PostTx(PostChainTx::Abort {
                head_id: st.head_id,
            })],
        ),
        Event::Client(_) => command_failed(state, "head is still collecting commits"),
        Event::Chain(ChainEvent::Observation {
            tx: OnChainTx::Commit { party, committed },
            ..
        }) => {
            let mut next = st.clone();
            next.pending_commits.retain(|p| p != party);
            next.committed.insert(party.index, committed.clone());
            let mut effects = vec![notify(ClientNotification::Committed {
                party: *party,
                utxo: committed.clone(),
            })];
            // Everyone races to collect; the chain takes the first one.
            if next.pending_commits.is_empty() {
                effects.push(Effect::PostTx(PostChainTx::Collect {
                    head_id: st.head_id,
                }));
            }
            Outcome::next(HeadState::Initial(next), effects)
        }
        Event::Chain(ChainEvent::Observation {
            tx: OnChainTx::Collect { utxo },
            ..
        }) => Outcome::next(
            HeadState::Open(OpenHead {
                head_id: st.head_id,
                parameters: st.parameters.clone(),
                confirmed_snapshot: ConfirmedSnapshot::Initial { utxo: utxo.clone() },
                local_utxo: utxo.clone(),
                seen_txs: Vec::new(),
                acks: BTreeMap::new(),
                confirmed_txs: Vec::new(),
                pending_snapshot: None,
            }),
            vec![notify(ClientNotification::HeadIsOpen { utxo: utxo.clone() })],
        ),
        Event::Chain(ChainEvent::Observation {
            tx: OnChainTx::Abort { utxo },
            ..
        }) => Outcome::next(
            HeadState::Final(FinalHead { utxo: utxo.clone() }),
            vec![notify(ClientNotification::HeadIsAborted { utxo: utxo.clone() })],
        ),
        // A faster peer may already treat the head as open.
        Event::Network(_) => Outcome::Wait {
            reason: WaitReason::HeadNotOpen,
        },
        _ => Outcome::ignored(state),
    }
}

fn update_open<L: Ledger>(
    env: &Environment,
    ledger: &L,
    state: &HeadState<L>,
    st: &OpenHead<L>,
    event: &Event<L>,
) -> Outcome<L> {
    match event {
        Event::Client(ClientCommand::NewTx { tx }) => Outcome::next(
            state.clone(),
            vec![Effect::SendToPeers(Message::ReqTx { tx: tx.clone() })],
        ),
        Event::Client(ClientCommand::Close) => Outcome::next(
            state.clone(),
            vec![Effect::PostTx(PostChainTx::Close {
                head_id: st.head_id,
                confirmed: st.confirmed_snapshot.clone(),
            })],
        ),
        Event::Client(ClientCommand::GetUtxo) => Outcome::next(
            state.clone(),
            vec![notify(ClientNotification::GetUtxoResponse {
                utxo: st.local_utxo.clone(),
            })],
        ),
        Event::Client(_) => command_failed(state, "head is already open"),

        Event::Network(Message::ReqTx { tx }) => on_req_tx(env, ledger, state, st, tx),
        Event::Network(Message::AckTx { party, tx }) => {
            on_ack_tx(env, state, st, event, party, tx)
        }
        Event::Network(Message::ReqSn {
            leader,
            number,
            tx_ids,
        }) => on_req_sn(env, ledger, state, st, event, leader, *number, tx_ids),
        Event::Network(Message::AckSn {
            party,
            number,
            signature,
        }) => on_ack_sn(env, state, st, event, party, *number, signature),
        Event::Network(Message::Ping { .. }) => Outcome::ignored(state),

        Event::Chain(ChainEvent::Observation {
            tx:
                OnChainTx::Close {
                    snapshot_number,
                    contestation_deadline,
                },
            time,
            ..
        }) => on_close_observed(st, *snapshot_number, *contestation_deadline, *time),
        _ => Outcome::ignored(state),
    }
}

fn on_req_tx<L: Ledger>(
    env: &Environment,
    ledger: &L,
    state: &HeadState<L>,
    st: &OpenHead<L>,
    tx: &L::Tx,
) -> Outcome<L> {
    let id = L::tx_id(tx);
    if st.acks.contains_key(&id) || st.confirmed_txs.contains(&id) {
        return Outcome::ignored(state);
    }
    match ledger.apply(&st.local_utxo, tx) {
        Err(_) => Outcome::Wait {
            reason: WaitReason::TxNotYetApplicable,
        },
        Ok(local_utxo) => {
            let mut next = st.clone();
            next.local_utxo = local_utxo;
            next.seen_txs.push(tx.clone());
            next.acks.insert(id, BTreeSet::new());
            Outcome::next(
                HeadState::Open(next),
                vec![Effect::SendToPeers(Message::AckTx {
                    party: env.party,
                    tx: tx.clone(),
                })],
            )
        }
    }
}

fn on_ack_tx<L: Ledger>(
    env: &Environment,
    state: &HeadState<L>,
    st: &OpenHead<L>,
    event: &Event<L>,
    party: &Party,
    tx: &L::Tx,
) -> Outcome<L> {
    if !env.parties.contains(party) {
        return invalid_event(event, state);
    }
    let id = L::tx_id(tx);
    if st.confirmed_txs.contains(&id) {
        return Outcome::ignored(state);
    }
    let acked = match st.acks.get(&id) {
        Some(acked) => acked,
        // The acknowledgement outran the request; retry once we saw it.
        None => {
            return Outcome::Wait {
                reason: WaitReason::TxNotSeen,
            }
        }
    };
    if acked.contains(&party.index) {
        return Outcome::ignored(state);
    }

    let mut next = st.clone();
    let mut acked = acked.clone();
    acked.insert(party.index);

    if acked == env.all_indices() {
        next.acks.remove(&id);
        next.confirmed_txs.push(id);
        let mut effects = vec![notify(ClientNotification::TxReceived { tx: tx.clone() })];
        if let Some(effect) = maybe_request_snapshot(env, &next) {
            effects.push(effect);
        }
        Outcome::next(HeadState::Open(next), effects)
    } else {
        next.acks.insert(id, acked);
        Outcome::next(HeadState::Open(next), Vec::new())
    }
}

fn on_req_sn<L: Ledger>(
    env: &Environment,
    ledger: &L,
    state: &HeadState<L>,
    st: &OpenHead<L>,
    event: &Event<L>,
    leader: &Party,
    number: u64,
    tx_ids: &[L::TxId],
) -> Outcome<L> {
    if let Some(pending) = &st.pending_snapshot {
        if number == pending.number() {
            return Outcome::ignored(state);
        }
    }
    // Snapshot numbers are strictly sequential, and only the leader for
    // the number may request one.
    if number != st.confirmed_snapshot.number() + 1 {
        return invalid_event(event, state);
    }
    if leader != env.leader(number) {
        return invalid_event(event, state);
    }
    if !tx_ids.iter().all(|id| st.confirmed_txs.contains(id)) {
        return Outcome::Wait {
            reason: WaitReason::SnapshotTxsNotConfirmed,
        };
    }

    // Compute the candidate body: apply the requested transactions, in the
    // requested order, to the previous confirmed UTxO.
    let mut utxo = st.confirmed_snapshot.utxo().clone();
    for id in tx_ids.iter() {
        let tx = match st.seen_tx(id) {
            Some(tx) => tx,
            None => {
                return Outcome::Wait {
                    reason: WaitReason::TxNotSeen,
                }
            }
        };
        utxo = match ledger.apply(&utxo, tx) {
            Ok(utxo) => utxo,
            Err(cause) => {
                return Outcome::Error(LogicError::LedgerRejection {
                    tx_id: id.clone(),
                    cause,
                })
            }
        };
    }

    let body = Snapshot {
        head_id: st.head_id,
        number,
        utxo,
        confirmed: tx_ids.to_vec(),
    };
    let signature = body.sign(&env.signing_key);

    let mut next = st.clone();
    next.pending_snapshot = Some(SnapshotInProgress {
        leader: *leader,
        body,
        acks: BTreeMap::new(),
    });
    // Our own signature is recorded when the broadcast loops back to us.
    Outcome::next(
        HeadState::Open(next),
        vec![Effect::SendToPeers(Message::AckSn {
            party: env.party,
            number,
            signature,
        })],
    )
}

fn on_ack_sn<L: Ledger>(
    env: &Environment,
    state: &HeadState<L>,
    st: &OpenHead<L>,
    event: &Event<L>,
    party: &Party,
    number: u64,
    signature: &Signature,
) -> Outcome<L> {
    if !env.parties.contains(party) {
        return invalid_event(event, state);
    }
    let pending = match &st.pending_snapshot {
        Some(pending) if pending.number() == number => pending,
        // An acknowledgement may outrun the request across peers.
        None if number == st.confirmed_snapshot.number() + 1 => {
            return Outcome::Wait {
                reason: WaitReason::SnapshotNotInProgress,
            }
        }
        _ => return Outcome::ignored(state),
    };
    // A signature over anything but the local candidate body is dropped:
    // it is either stale, cross-snapshot, or forged.
    if !pending.body.verify(party, signature) {
        return Outcome::ignored(state);
    }
    if pending.acks.contains_key(&party.index) {
        return Outcome::ignored(state);
    }

    let mut in_progress = pending.clone();
    in_progress.acks.insert(party.index, *signature);

    let have: BTreeSet<u32> = in_progress.acks.keys().copied().collect();
    if have != env.all_indices() {
        let mut next = st.clone();
        next.pending_snapshot = Some(in_progress);
        return Outcome::next(HeadState::Open(next), Vec::new());
    }

    // Everyone signed: promote the candidate to confirmed.
    let expected = st.confirmed_snapshot.number() + 1;
    if in_progress.body.number != expected {
        return Outcome::Error(LogicError::OutOfOrderSnapshot {
            expected,
            got: in_progress.body.number,
        });
    }
    // BTreeMap iterates in index order, which is party order.
    let signatures = MultiSignature::aggregate(in_progress.acks.values().copied().collect());
    if let Err(cause) = signatures.verify_all(&env.parties, &in_progress.body.transcript()) {
        let party = match cause {
            MultisigError::ShareError { index } => env
                .parties
                .iter()
                .find(|p| p.index == index)
                .copied()
                .unwrap_or(*party),
            _ => *party,
        };
        return Outcome::Error(LogicError::BadSignature { party });
    }

    let snapshot = in_progress.body;
    let snapshot_ids: BTreeSet<L::TxId> = snapshot.confirmed.iter().cloned().collect();
    let mut next = st.clone();
    next.confirmed_snapshot = ConfirmedSnapshot::Confirmed {
        snapshot: snapshot.clone(),
        signatures,
    };
    next.seen_txs.retain(|tx| !snapshot_ids.contains(&L::tx_id(tx)));
    next.confirmed_txs.retain(|id| !snapshot_ids.contains(id));
    next.pending_snapshot = None;

    let mut effects = vec![notify(ClientNotification::SnapshotConfirmed { snapshot })];
    if let Some(effect) = maybe_request_snapshot(env, &next) {
        effects.push(effect);
    }
    Outcome::next(HeadState::Open(next), effects)
}

fn on_close_observed<L: Ledger>(
    st: &OpenHead<L>,
    snapshot_number: u64,
    contestation_deadline: UnixTime,
    observed_at: UnixTime,
) -> Outcome<L> {
    let mut effects = vec![notify(ClientNotification::HeadIsClosed {
        contestation_deadline,
    })];
    // The close may carry a stale snapshot; overrule it with ours.
    if st.confirmed_snapshot.number() > snapshot_number {
        effects.push(Effect::PostTx(PostChainTx::Contest {
            head_id: st.head_id,
            confirmed: st.confirmed_snapshot.clone(),
        }));
    }
    // Make sure a tick arrives at the deadline even if the chain stalls.
    effects.push(Effect::Delay {
        duration_ms: contestation_deadline.saturating_millis_since(observed_at),
        event: Event::Chain(ChainEvent::Tick {
            time: contestation_deadline,
        }),
    });
    Outcome::next(
        HeadState::Closed(ClosedHead {
            head_id: st.head_id,
            parameters: st.parameters.clone(),
            confirmed_snapshot: st.confirmed_snapshot.clone(),
            contestation_deadline,
            contesters: Vec::new(),
        }),
        effects,
    )
}

fn update_closed<L: Ledger>(
    env: &Environment,
    state: &HeadState<L>,
    st: &ClosedHead<L>,
    event: &Event<L>,
) -> Outcome<L> {
    match event {
        Event::Chain(ChainEvent::Observation {
            tx:
                OnChainTx::Contest {
                    snapshot_number,
                    contesters,
                },
            ..
        }) => {
            let mut next = st.clone();
            next.contesters = contesters.clone();
            let mut effects = vec![notify(ClientNotification::HeadIsContested {
                snapshot_number: *snapshot_number,
            })];
            if st.confirmed_snapshot.number() > *snapshot_number
                && !contesters.contains(&env.party)
            {
                effects.push(Effect::PostTx(PostChainTx::Contest {
                    head_id: st.head_id,
                    confirmed: st.confirmed_snapshot.clone(),
                }));
            }
            Outcome::next(HeadState::Closed(next), effects)
        }
        Event::Chain(ChainEvent::Tick { time }) if *time >= st.contestation_deadline => {
            Outcome::next(
                state.clone(),
                vec![Effect::PostTx(PostChainTx::Fanout {
                    head_id: st.head_id,
                    utxo: st.confirmed_snapshot.utxo().clone(),
                    contestation_deadline: st.contestation_deadline,
                })],
            )
        }
        Event::Chain(ChainEvent::Observation {
            tx: OnChainTx::Fanout { utxo },
            ..
        }) => Outcome::next(
            HeadState::Final(FinalHead { utxo: utxo.clone() }),
            vec![notify(ClientNotification::HeadIsFinalized { utxo: utxo.clone() })],
        ),
        Event::Client(ClientCommand::GetUtxo) => Outcome::next(
            state.clone(),
            vec![notify(ClientNotification::GetUtxoResponse {
                utxo: st.confirmed_snapshot.utxo().clone(),
            })],
        ),
        Event::Client(_) => command_failed(state, "head is closed"),
        _ => Outcome::ignored(state),
    }
}

fn update_final<L: Ledger>(
    state: &HeadState<L>,
    st: &FinalHead<L>,
    event: &Event<L>,
) -> Outcome<L> {
    match event {
        Event::Client(ClientCommand::GetUtxo) => Outcome::next(
            state.clone(),
            vec![notify(ClientNotification::GetUtxoResponse {
                utxo: st.utxo.clone(),
            })],
        ),
        Event::Client(_) => command_failed(state, "head is finalised"),
        _ => Outcome::ignored(state),
    }
}

/// If we lead the next snapshot and have confirmed transactions to fold in,
/// request it.
fn maybe_request_snapshot<L: Ledger>(env: &Environment, st: &OpenHead<L>) -> Option<Effect<L>> {
    if st.pending_snapshot.is_some() || st.confirmed_txs.is_empty() {
        return None;
    }
    let number = st.confirmed_snapshot.number() + 1;
    if *env.leader(number) != env.party {
        return None;
    }
    Some(Effect::SendToPeers(Message::ReqSn {
        leader: env.party,
        number,
        tx_ids: st.confirmed_txs.clone(),
    }))
}
