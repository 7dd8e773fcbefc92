use curve25519_dalek::scalar::Scalar;

use ledger::{SimpleLedger, SimpleOutput, SimpleUtxo, UtxoSet};
use multisig::{hash_utxo, Hash32, MultiSignature, Party, Signature};

use super::*;

type L = SimpleLedger;

fn parties() -> Vec<Party> {
    (0..3u32)
        .map(|i| Party::from_secret(i, &Scalar::from(i as u64 + 1)))
        .collect()
}

fn parameters() -> HeadParameters {
    HeadParameters {
        contestation_period: ContestationPeriod::from_secs(60),
        parties: parties(),
    }
}

fn context_for(index: usize, network: ChainNetwork) -> ChainContext {
    ChainContext {
        network,
        party: parties()[index],
        time: TimeHandle::new(UnixTime(0), 1_000),
    }
}

fn seed() -> OutputRef {
    OutputRef {
        tx: Hash32([7u8; 32]),
        index: 0,
    }
}

fn multi_signature(msg: &[u8]) -> MultiSignature {
    MultiSignature::aggregate(
        (0..3u64)
            .map(|i| Signature::sign_message(b"test", msg, Scalar::from(i + 1)))
            .collect(),
    )
}

fn initial_state() -> InitialState<L> {
    let ctx = context_for(0, ChainNetwork::default());
    let init: ChainTx<L> = ctx.initialize(&parameters(), seed());
    match ChainState::Idle.observe(&ctx.party, &init) {
        Some((OnChainTx::Init { .. }, ChainState::Initial(st))) => st,
        other => panic!("init must open the initial state, got {:?}", other),
    }
}

fn committed_state() -> InitialState<L> {
    let mut state = ChainState::Initial(initial_state());
    for (i, party) in parties().iter().enumerate() {
        let ctx = ChainContext {
            party: *party,
            ..context_for(0, ChainNetwork::default())
        };
        let utxo = SimpleUtxo::singleton(i as u64, SimpleOutput::new(10));
        let initial = match &state {
            ChainState::Initial(st) => st.clone(),
            other => panic!("still collecting commits, got {:?}", other),
        };
        let commit = ctx.commit(&initial, &utxo, &utxo).expect("commit is clean");
        let (_, next) = state.observe(party, &commit).expect("commit observed");
        state = next;
    }
    match state {
        ChainState::Initial(st) => st,
        other => panic!("expected initial state, got {:?}", other),
    }
}

fn open_state() -> OpenState<L> {
    let ctx = context_for(0, ChainNetwork::default());
    let st = committed_state();
    let collect = ctx.collect(&st);
    match ChainState::Initial(st).observe(&ctx.party, &collect) {
        Some((OnChainTx::Collect { .. }, ChainState::Open(open))) => open,
        other => panic!("collect must open the head, got {:?}", other),
    }
}

fn closed_state() -> ClosedState {
    let ctx = context_for(0, ChainNetwork::default());
    let open = open_state();
    let close = ctx
        .close(
            &open,
            0,
            hash_utxo(&open.utxo),
            None,
            ChainSlot(10),
            UnixTime(20_000),
        )
        .expect("close window fits");
    match ChainState::Open(open).observe(&ctx.party, &close) {
        Some((OnChainTx::Close { .. }, ChainState::Closed(closed))) => closed,
        other => panic!("close must close the head, got {:?}", other),
    }
}

// --- construct/observe round trips -------------------------------------

#[test]
fn init_roundtrip_starts_collecting() {
    let st = initial_state();
    assert_eq!(st.pending, parties());
    assert!(st.committed.is_empty());
    assert_eq!(st.head_id, HeadId::from_seed(&seed()));
}

#[test]
fn init_for_foreign_head_is_ignored() {
    let ctx = context_for(0, ChainNetwork::default());
    let stranger = Party::from_secret(9, &Scalar::from(99u64));
    let foreign = HeadParameters {
        contestation_period: ContestationPeriod::from_secs(60),
        parties: vec![stranger],
    };
    let init: ChainTx<L> = ctx.initialize(&foreign, seed());

    assert_eq!(ChainState::<L>::Idle.observe(&ctx.party, &init), None);
}

#[test]
fn commit_roundtrip_tracks_the_party() {
    let ctx = context_for(1, ChainNetwork::default());
    let st = initial_state();
    let utxo = SimpleUtxo::singleton(5, SimpleOutput::new(10));
    let commit = ctx.commit(&st, &utxo, &utxo).unwrap();

    let (event, next) = ChainState::Initial(st).observe(&ctx.party, &commit).unwrap();
    match (event, next) {
        (OnChainTx::Commit { party, committed }, ChainState::Initial(next)) => {
            assert_eq!(party, ctx.party);
            assert_eq!(committed, utxo);
            assert!(!next.pending.contains(&ctx.party));
            assert_eq!(next.committed.get(&1), Some(&utxo));
        }
        other => panic!("unexpected observation {:?}", other),
    }
}

#[test]
fn collect_roundtrip_opens_with_the_union_of_commits() {
    let open = open_state();
    assert_eq!(open.utxo.len(), 3);
    assert_eq!(open.utxo.total_value(), 30);
}

#[test]
fn collect_is_ignored_while_commits_are_outstanding() {
    let ctx = context_for(0, ChainNetwork::default());
    let st = initial_state();
    let collect = ctx.collect(&st);

    assert_eq!(ChainState::Initial(st).observe(&ctx.party, &collect), None);
}

#[test]
fn abort_roundtrip_reimburses_commits() {
    let ctx = context_for(0, ChainNetwork::default());
    let st = committed_state();
    let abort = ctx.abort(&st);

    match ChainState::Initial(st).observe(&ctx.party, &abort) {
        Some((OnChainTx::Abort { utxo }, ChainState::Final(fin))) => {
            assert_eq!(utxo.total_value(), 30);
            assert_eq!(fin.utxo, utxo);
        }
        other => panic!("unexpected observation {:?}", other),
    }
}

#[test]
fn close_roundtrip_sets_the_deadline() {
    let closed = closed_state();
    // upper bound 20s plus the 60s contestation period
    assert_eq!(closed.contestation_deadline, UnixTime(80_000));
    assert_eq!(closed.snapshot_number, 0);
    assert!(closed.contesters.is_empty());
}

#[test]
fn contest_roundtrip_accumulates_contesters() {
    let ctx = context_for(2, ChainNetwork::default());
    let closed = closed_state();
    let utxo_hash = Hash32([9u8; 32]);
    let contest: ChainTx<L> = ctx.contest(&closed, 3, utxo_hash, multi_signature(b"snap3"));

    match ChainState::<L>::Closed(closed).observe(&ctx.party, &contest) {
        Some((OnChainTx::Contest { snapshot_number, contesters }, ChainState::Closed(next))) => {
            assert_eq!(snapshot_number, 3);
            assert_eq!(contesters, vec![ctx.party]);
            assert_eq!(next.snapshot_number, 3);
            assert_eq!(next.utxo_hash, utxo_hash);
        }
        other => panic!("unexpected observation {:?}", other),
    }
}

#[test]
fn stale_contest_is_ignored() {
    let ctx = context_for(2, ChainNetwork::default());
    let mut closed = closed_state();
    closed.snapshot_number = 5;
    let contest: ChainTx<L> = ctx.contest(&closed, 4, Hash32([9u8; 32]), multi_signature(b"snap4"));

    assert_eq!(ChainState::<L>::Closed(closed).observe(&ctx.party, &contest), None);
}

#[test]
fn fanout_roundtrip_finalizes_the_head() {
    let ctx = context_for(0, ChainNetwork::default());
    let open_utxo = open_state().utxo;
    let closed = closed_state();
    let fanout: ChainTx<L> = ctx.fanout(&closed, open_utxo.clone());

    match ChainState::<L>::Closed(closed).observe(&ctx.party, &fanout) {
        Some((OnChainTx::Fanout { utxo }, ChainState::Final(fin))) => {
            assert_eq!(utxo, open_utxo);
            assert_eq!(fin.utxo, open_utxo);
        }
        other => panic!("unexpected observation {:?}", other),
    }
}

#[test]
fn fanout_with_wrong_utxo_is_ignored() {
    let ctx = context_for(0, ChainNetwork::default());
    let closed = closed_state();
    let wrong = SimpleUtxo::singleton(99, SimpleOutput::new(1));
    let fanout = ctx.fanout(&closed, wrong);

    assert_eq!(ChainState::<L>::Closed(closed).observe(&ctx.party, &fanout), None);
}

#[test]
fn observers_ignore_other_heads() {
    let ctx = context_for(0, ChainNetwork::default());
    let st = initial_state();
    let utxo = SimpleUtxo::singleton(5, SimpleOutput::new(10));

    let mut foreign = st.clone();
    foreign.head_id = HeadId(Hash32([42u8; 32]));
    let commit = ctx.commit(&foreign, &utxo, &utxo).unwrap();

    assert_eq!(ChainState::Initial(st).observe(&ctx.party, &commit), None);
}

// --- commit screening ---------------------------------------------------

#[test]
fn commit_rejects_legacy_outputs() {
    let ctx = context_for(0, ChainNetwork::default());
    let st = initial_state();
    let utxo = SimpleUtxo::singleton(1, SimpleOutput::legacy(10));

    assert_eq!(
        ctx.commit(&st, &utxo, &utxo),
        Err(CommitError::UnsupportedLegacyOutput)
    );
}

#[test]
fn commit_rejects_reference_scripts() {
    let ctx = context_for(0, ChainNetwork::default());
    let st = initial_state();
    let utxo = SimpleUtxo::singleton(1, SimpleOutput::with_reference_script(10));

    assert_eq!(
        ctx.commit(&st, &utxo, &utxo),
        Err(CommitError::CannotCommitReferenceScript)
    );
}

#[test]
fn commit_enforces_the_mainnet_cap() {
    let ctx = context_for(0, ChainNetwork::Mainnet);
    let st = initial_state();
    let utxo = SimpleUtxo::singleton(1, SimpleOutput::new(MAINNET_COMMIT_CAP + 1));

    assert_eq!(
        ctx.commit(&st, &utxo, &utxo),
        Err(CommitError::CommittedTooMuchForMainnet {
            amount: MAINNET_COMMIT_CAP + 1,
            limit: MAINNET_COMMIT_CAP,
        })
    );

    // The same value is fine on a testnet.
    let testnet = context_for(0, ChainNetwork::default());
    assert!(testnet.commit(&st, &utxo, &utxo).is_ok());
}

#[test]
fn commit_requires_an_outstanding_initial() {
    let ctx = context_for(0, ChainNetwork::default());
    let mut st = initial_state();
    st.pending.retain(|p| *p != ctx.party);
    let utxo = SimpleUtxo::singleton(1, SimpleOutput::new(10));

    assert_eq!(
        ctx.commit(&st, &utxo, &utxo),
        Err(CommitError::CannotFindOwnInitial)
    );
}

#[test]
fn commit_requires_spendable_outputs() {
    let ctx = context_for(0, ChainNetwork::default());
    let st = initial_state();
    let spendable = SimpleUtxo::singleton(1, SimpleOutput::new(10));
    let to_commit = SimpleUtxo::singleton(2, SimpleOutput::new(10));

    assert_eq!(
        ctx.commit(&st, &spendable, &to_commit),
        Err(CommitError::MissingSpendableOutput)
    );
}

// --- close window -------------------------------------------------------

#[test]
fn close_rejects_a_window_wider_than_the_contestation_period() {
    let ctx = context_for(0, ChainNetwork::default());
    let open = open_state();

    // Lower bound at slot 0 (time 0), upper 61s later against a 60s period.
    let result = ctx.close(
        &open,
        0,
        hash_utxo(&open.utxo),
        None,
        ChainSlot(0),
        UnixTime(61_000),
    );
    assert_eq!(
        result.err(),
        Some(CloseError::ValidityWindowTooWide {
            window_ms: 61_000,
            period_ms: 60_000,
        })
    );
}

// --- follower and rollback ----------------------------------------------

fn block(slot: u64, txs: Vec<ChainTx<L>>) -> ChainSyncMessage<L> {
    ChainSyncMessage::RollForward {
        block: BlockInfo {
            point: ChainPoint {
                slot: ChainSlot(slot),
                block: Hash32([slot as u8; 32]),
            },
            timestamp: UnixTime(slot * 1_000),
        },
        txs,
    }
}

#[test]
fn follower_emits_observations_and_ticks() {
    let ctx = context_for(0, ChainNetwork::default());
    let mut follower = ChainFollower::new(ctx.party, ChainState::<L>::Idle, DEFAULT_RETENTION);

    let init = ctx.initialize(&parameters(), seed());
    let events = follower.handle(block(1, vec![init])).unwrap();

    assert_eq!(events.len(), 2);
    assert!(matches!(
        events[0],
        ChainEvent::Observation { tx: OnChainTx::Init { .. }, .. }
    ));
    assert_eq!(events[1], ChainEvent::Tick { time: UnixTime(1_000) });
    assert!(matches!(follower.state(), ChainState::Initial(_)));
}

#[test]
fn rollback_restores_the_state_at_the_requested_slot() {
    let ctx = context_for(0, ChainNetwork::default());
    let mut follower = ChainFollower::new(ctx.party, ChainState::<L>::Idle, DEFAULT_RETENTION);

    // Init at slot 1, one commit each at slots 2 and 3.
    let init = ctx.initialize(&parameters(), seed());
    follower.handle(block(1, vec![init])).unwrap();

    for (slot, index) in [(2u64, 0usize), (3, 1)].iter() {
        let party_ctx = ChainContext {
            party: parties()[*index],
            ..ctx.clone()
        };
        let st = match follower.state() {
            ChainState::Initial(st) => st.clone(),
            other => panic!("expected initial state, got {:?}", other),
        };
        let utxo = SimpleUtxo::singleton(*index as u64, SimpleOutput::new(10));
        let commit = party_ctx.commit(&st, &utxo, &utxo).unwrap();
        follower.handle(block(*slot, vec![commit])).unwrap();
    }

    // Roll back to slot 1: the two commits vanish.
    let events = follower
        .handle(ChainSyncMessage::RollBackward {
            point: ChainPoint {
                slot: ChainSlot(1),
                block: Hash32([1u8; 32]),
            },
        })
        .unwrap();

    match &events[..] {
        [ChainEvent::Rollback { point, state }] => {
            assert_eq!(point.slot, ChainSlot(1));
            match state {
                ChainState::Initial(st) => assert!(st.committed.is_empty()),
                other => panic!("expected initial state, got {:?}", other),
            }
        }
        other => panic!("expected a single rollback event, got {:?}", other),
    }

    // Further roll-forwards rebuild from the restored point.
    let st = match follower.state() {
        ChainState::Initial(st) => st.clone(),
        other => panic!("expected initial state, got {:?}", other),
    };
    let utxo = SimpleUtxo::singleton(0, SimpleOutput::new(10));
    let commit = ctx.commit(&st, &utxo, &utxo).unwrap();
    let events = follower.handle(block(2, vec![commit])).unwrap();
    assert!(matches!(
        events[0],
        ChainEvent::Observation { tx: OnChainTx::Commit { .. }, .. }
    ));
}

#[test]
fn rollback_past_the_retained_window_is_unrecoverable() {
    let ctx = context_for(0, ChainNetwork::default());
    let mut follower = ChainFollower::new(ctx.party, ChainState::<L>::Idle, 2);

    for slot in 1..=5u64 {
        follower.handle(block(slot, vec![])).unwrap();
    }

    let too_old = ChainPoint {
        slot: ChainSlot(1),
        block: Hash32([1u8; 32]),
    };
    match follower.handle(ChainSyncMessage::RollBackward { point: too_old }) {
        Err(ChainError::UnrecoverableRollback(point)) => assert_eq!(point, too_old),
        other => panic!("expected an unrecoverable rollback, got {:?}", other),
    }
}
