use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use crate::{
    ClientSeq, Error, Fid, MemoryStore, Range, Result, SeqConfig, SeqOp, SeqTransport, ServerSeq,
    SuperClient,
};

/// Replies with a fixed script of results, recording every request.
#[derive(Default)]
struct Scripted {
    replies: Mutex<VecDeque<Result<Range>>>,
    seen: Mutex<Vec<SeqOp>>,
}

impl Scripted {
    fn new(replies: impl IntoIterator<Item = Result<Range>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            seen: Mutex::default(),
        }
    }

    fn requests(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl SeqTransport for Scripted {
    fn query(&self, op: SeqOp) -> Result<Range> {
        self.seen.lock().unwrap().push(op);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(Error::Unreachable {
                reason: "script exhausted".to_string(),
            }))
    }
}

fn unreachable() -> Error {
    Error::Unreachable {
        reason: "connection refused".to_string(),
    }
}

fn small_config() -> SeqConfig {
    SeqConfig::default()
        .with_width(100)
        .with_init_oid(1)
        .with_meta_chunk(8)
        .with_super_chunk(64)
}

#[test]
fn worked_example_rolls_to_next_sequence_at_width() {
    let transport = Arc::new(Scripted::new([Ok(Range::new(5, 6)), Ok(Range::new(6, 7))]));
    let client = ClientSeq::new(Arc::clone(&transport), &small_config()).unwrap();

    for oid in 1..=99 {
        assert_eq!(client.alloc_fid().unwrap(), Fid::new(5, oid, 0));
    }
    assert_eq!(transport.requests(), 1);

    assert_eq!(client.alloc_fid().unwrap(), Fid::new(6, 1, 0));
    assert_eq!(transport.requests(), 2);
    assert_eq!(client.current().unwrap(), Fid::new(6, 2, 0));
}

#[test]
fn identifiers_are_unique_and_ordered() {
    let config = small_config().with_width(4);
    let server = ServerSeq::controller(MemoryStore::new(), config.clone()).unwrap();
    let client = ClientSeq::new(&server, &config).unwrap();

    let mut seen = HashSet::new();
    let mut last = Fid::ZERO;
    for _ in 0..5_000 {
        let fid = client.alloc_fid().unwrap();
        assert!(fid.is_sane(config.init_oid, config.width));
        assert!(fid > last, "{fid} minted after {last}");
        assert!(seen.insert(fid));
        last = fid;
    }
}

#[test]
fn oid_increases_until_width_then_sequence_changes() {
    let config = small_config().with_width(10);
    let server = ServerSeq::controller(MemoryStore::new(), config.clone()).unwrap();
    let client = ClientSeq::new(&server, &config).unwrap();

    let mut prev = client.alloc_fid().unwrap();
    for _ in 0..100 {
        let next = client.alloc_fid().unwrap();
        if prev.oid + 1 < config.width {
            assert_eq!(next.seq, prev.seq);
            assert_eq!(next.oid, prev.oid + 1);
        } else {
            assert_ne!(next.seq, prev.seq);
            assert_eq!(next.oid, config.init_oid);
        }
        assert_eq!(next.ver, 0);
        prev = next;
    }
}

#[test]
fn init_failure_aborts_construction() {
    let transport = Scripted::new([Err(unreachable())]);
    assert!(matches!(
        ClientSeq::new(&transport, &small_config()),
        Err(Error::Unreachable { .. })
    ));
}

#[test]
fn init_rejects_invalid_config() {
    let transport = Scripted::new([Ok(Range::new(5, 6))]);
    let config = small_config().with_width(1);
    assert!(matches!(
        ClientSeq::new(&transport, &config),
        Err(Error::InvalidConfig { .. })
    ));
    assert_eq!(transport.requests(), 0);
}

#[test]
fn failed_refill_leaves_state_untouched() {
    let config = small_config().with_width(3);
    let transport = Scripted::new([
        Ok(Range::new(5, 6)),
        Err(unreachable()),
        Err(Error::OutOfSpace),
        Ok(Range::new(9, 11)),
    ]);
    let client = ClientSeq::new(&transport, &config).unwrap();

    assert_eq!(client.alloc_fid().unwrap(), Fid::new(5, 1, 0));
    assert_eq!(client.alloc_fid().unwrap(), Fid::new(5, 2, 0));

    assert!(matches!(client.alloc_fid(), Err(Error::Unreachable { .. })));
    assert_eq!(client.current().unwrap(), Fid::new(5, 3, 0));
    assert_eq!(client.range().unwrap(), Range::new(6, 6));

    assert_eq!(client.alloc_fid(), Err(Error::OutOfSpace));
    assert_eq!(client.alloc_fid().unwrap(), Fid::new(9, 1, 0));
    assert_eq!(client.range().unwrap(), Range::new(10, 11));
}

#[test]
fn malformed_grants_are_rejected() {
    let config = small_config();

    let empty = Scripted::new([Ok(Range::new(7, 7))]);
    assert!(matches!(
        ClientSeq::new(&empty, &config),
        Err(Error::Protocol { .. })
    ));

    let insane = Scripted::new([Ok(Range::new(9, 7))]);
    assert_eq!(
        ClientSeq::new(&insane, &config).err(),
        Some(Error::InvalidRange { start: 9, end: 7 })
    );
}

#[test]
fn grants_starting_at_sequence_zero_are_rejected() {
    let config = small_config().with_width(2);

    let at_zero = Scripted::new([Ok(Range::new(0, 2))]);
    assert!(matches!(
        ClientSeq::new(&at_zero, &config),
        Err(Error::Protocol { .. })
    ));

    let refill = Scripted::new([Ok(Range::new(5, 6)), Ok(Range::new(0, 2))]);
    let client = ClientSeq::new(&refill, &config).unwrap();
    assert_eq!(client.alloc_fid().unwrap(), Fid::new(5, 1, 0));
    assert!(matches!(client.alloc_fid(), Err(Error::Protocol { .. })));
    assert_eq!(client.current().unwrap(), Fid::new(5, 2, 0));

    let upstream = SuperClient::new(Scripted::new([Ok(Range::new(0, 100))]));
    assert!(matches!(
        upstream.alloc_super(),
        Err(Error::Protocol { .. })
    ));
}

#[test]
fn alloc_seq_draws_from_meta_range_without_touching_current_fid() {
    let transport = Scripted::new([Ok(Range::new(5, 8)), Ok(Range::new(20, 21))]);
    let client = ClientSeq::new(&transport, &small_config()).unwrap();

    assert_eq!(client.current().unwrap(), Fid::new(5, 1, 0));
    assert_eq!(client.alloc_seq().unwrap(), 6);
    assert_eq!(client.alloc_seq().unwrap(), 7);
    assert_eq!(client.alloc_seq().unwrap(), 20);
    assert_eq!(client.current().unwrap(), Fid::new(5, 1, 0));
    assert!(client.alloc_seq().is_err());
}

#[test]
fn only_meta_ranges_are_requested() {
    let transport = Scripted::new([Ok(Range::new(5, 6)), Ok(Range::new(6, 7))]);
    let client = ClientSeq::new(&transport, &small_config().with_width(2)).unwrap();
    client.alloc_fid().unwrap();
    client.alloc_fid().unwrap();
    assert_eq!(
        *transport.seen.lock().unwrap(),
        vec![SeqOp::AllocMeta, SeqOp::AllocMeta]
    );
}
