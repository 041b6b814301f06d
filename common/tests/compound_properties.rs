use bytes::Bytes;
use nfstest_common::{
    compound::{
        evaluate_compound, CompoundReply, CompoundRequest, CompoundResult, CompoundState, FileHandle,
        OpHandler, OpNum, OpResult, ResultBody, SubOp, FORE_PROFILE,
    },
    rpc::Credential,
    status::NfsStat4,
};
use proptest::prelude::*;

// Operations whose successful result carries no body
const VOID_OPS: [OpNum; 7] = [
    OpNum::Sequence,
    OpNum::PutRootFh,
    OpNum::SaveFh,
    OpNum::RestoreFh,
    OpNum::Lookup,
    OpNum::Renew,
    OpNum::Verify,
];

// Fails every operation whose first argument byte is non zero
struct ScriptedHandler;

impl OpHandler<OpNum> for ScriptedHandler {
    fn evaluate(
        &self,
        subop: &SubOp<OpNum>,
        state: &mut CompoundState<OpNum>,
    ) -> CompoundResult<OpResult<OpNum>> {
        let status = match subop.args.first() {
            Some(0) | None => NfsStat4::Ok,
            Some(_) => NfsStat4::Io,
        };
        state
            .profile()
            .encode_status(subop.op, status, ResultBody::Void)
    }
}

const ROOT_FH: [u8; 8] = [0x2a; 8];

// PUTROOTFH sets the root handle, GETFH returns the current handle, LOOKUP
// finds nothing
struct FileHandleHandler;

impl OpHandler<OpNum> for FileHandleHandler {
    fn evaluate(
        &self,
        subop: &SubOp<OpNum>,
        state: &mut CompoundState<OpNum>,
    ) -> CompoundResult<OpResult<OpNum>> {
        let (status, body) = match subop.op {
            OpNum::PutRootFh => match FileHandle::new(Bytes::from_static(&ROOT_FH)) {
                Ok(fh) => {
                    state.set_cfh(fh, None);
                    (NfsStat4::Ok, ResultBody::Void)
                }
                Err(_) => (NfsStat4::BadHandle, ResultBody::Void),
            },
            OpNum::GetFh => match state.current_fh() {
                Ok(fh) => (NfsStat4::Ok, ResultBody::FileHandle(fh.clone())),
                Err(status) => (status, ResultBody::Void),
            },
            OpNum::Lookup => (NfsStat4::NoEnt, ResultBody::Void),
            _ => (NfsStat4::Ok, ResultBody::Void),
        };
        state.profile().encode_status(subop.op, status, body)
    }
}

fn evaluate(ops: &[(usize, bool)], cache_this: bool) -> CompoundReply<OpNum> {
    let ops = ops
        .iter()
        .map(|(op, fails)| SubOp::new(VOID_OPS[*op], Bytes::from(vec![*fails as u8])))
        .collect();
    let request = CompoundRequest {
        tag: "prop".to_owned(),
        minor_version: 1,
        ops,
        cache_this,
    };
    evaluate_compound(&FORE_PROFILE, &request, &Credential::None, &ScriptedHandler).unwrap()
}

fn ops_strategy() -> impl Strategy<Value = Vec<(usize, bool)>> {
    prop::collection::vec((0..VOID_OPS.len(), prop::bool::weighted(0.15)), 1..16)
}

proptest! {
    #[test]
    fn cached_replies_match_live(ops in ops_strategy()) {
        let reply = evaluate(&ops, true);
        prop_assert_eq!(reply.live.results(), reply.cache.results());
        prop_assert_eq!(reply.live.packed(), reply.cache.packed());
    }

    #[test]
    fn uncached_replies_get_sentinels(ops in ops_strategy()) {
        let reply = evaluate(&ops, false);
        prop_assert_eq!(reply.live.len(), reply.cache.len());
        prop_assert_eq!(reply.live.get(0), reply.cache.get(0));
        for index in 1..reply.cache.len() {
            let cached = reply.cache.get(index).unwrap();
            prop_assert_eq!(cached.status, NfsStat4::RetryUncachedRep);
            prop_assert_eq!(cached.op, reply.live.get(index).unwrap().op);
        }
    }

    #[test]
    fn evaluation_stops_at_first_failure(ops in ops_strategy(), cache_this in any::<bool>()) {
        let reply = evaluate(&ops, cache_this);
        match ops.iter().position(|(_, fails)| *fails) {
            Some(failed) => {
                prop_assert_eq!(reply.live.len(), failed + 1);
                prop_assert_eq!(reply.status, NfsStat4::Io);
            }
            None => {
                prop_assert_eq!(reply.live.len(), ops.len());
                prop_assert_eq!(reply.status, NfsStat4::Ok);
            }
        }
    }

    #[test]
    fn sizes_match_encoding(ops in ops_strategy(), cache_this in any::<bool>()) {
        let reply = evaluate(&ops, cache_this);
        prop_assert_eq!(reply.live.size(&reply.tag), reply.live_bytes().len());
        prop_assert_eq!(reply.cache.size(&reply.tag), reply.cache_bytes().len());
    }
}

#[test]
fn test_failure_after_file_handle_is_cached_verbatim() {
    // [PUTROOTFH ok, LOOKUP fails] with caching: both buffers identical
    let reply = evaluate(&[(1, false), (4, true)], true);
    assert_eq!(reply.status, NfsStat4::Io);
    assert_eq!(reply.live.results(), reply.cache.results());
    assert_eq!(reply.live.len(), 2);
}

#[test]
fn test_file_handle_result_survives_later_failure() {
    let ops = [OpNum::Sequence, OpNum::PutRootFh, OpNum::GetFh, OpNum::Lookup]
        .into_iter()
        .map(|op| SubOp::new(op, Bytes::new()))
        .collect();
    let request = CompoundRequest {
        tag: "getfh".to_owned(),
        minor_version: 1,
        ops,
        cache_this: true,
    };
    let reply =
        evaluate_compound(&FORE_PROFILE, &request, &Credential::None, &FileHandleHandler).unwrap();

    assert_eq!(reply.status, NfsStat4::NoEnt);
    assert_eq!(reply.live.len(), 4);
    for index in 0..reply.live.len() {
        assert_eq!(reply.live.get(index), reply.cache.get(index));
    }
    assert_eq!(reply.live.packed(), reply.cache.packed());

    let getfh = reply.cache.get(2).unwrap();
    assert_eq!(getfh.op, OpNum::GetFh);
    assert_eq!(getfh.status, NfsStat4::Ok);
    assert_eq!(getfh.file_handle().map(|fh| fh.as_bytes()), Some(&ROOT_FH[..]));
    assert_eq!(reply.cache.get(3).unwrap().status, NfsStat4::NoEnt);
}

#[test]
fn test_sequence_then_uncached_op() {
    let reply = evaluate(&[(0, false), (1, false)], false);
    assert_eq!(reply.status, NfsStat4::Ok);
    assert_eq!(reply.live.get(1).unwrap().status, NfsStat4::Ok);
    assert_eq!(
        reply.cache.get(1),
        Some(&OpResult::status_only(OpNum::PutRootFh, NfsStat4::RetryUncachedRep))
    );
    assert!(reply.cache_bytes().windows(9).any(|w| w == b"[REPLAY] "));
}
