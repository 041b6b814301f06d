// Result constructors per operation, and the two compound profiles built on
// top of them. Every operation is registered once, here; the evaluator only
// looks operations up.

use std::{collections::HashMap, ops::RangeInclusive};

use lazy_static::lazy_static;
use strum::IntoEnumIterator;

use super::{
    error::{CompoundError, CompoundResult},
    op::{CbOpNum, OpNum, Operation},
    result::{BodyShape, OpResult, ResultBody},
};
use crate::{
    config::REPLAY_TAG_PREFIX,
    status::{NfsStat4, ProtocolStatus},
};

// Builds the result of one operation from its status and body
pub type ResultConstructor<O> = fn(O, NfsStat4, ResultBody) -> CompoundResult<OpResult<O>>;

fn check_shape<O: Operation>(op: O, expected: BodyShape, body: &ResultBody) -> CompoundResult<()> {
    if body.shape() != expected {
        return Err(CompoundError::BodyMismatch {
            op: op.to_string(),
            expected,
            got: body.shape(),
        });
    }
    Ok(())
}

fn build<O: Operation>(
    op: O,
    status: NfsStat4,
    body: ResultBody,
    shape: BodyShape,
) -> CompoundResult<OpResult<O>> {
    // error results never carry a body
    if !status.is_ok() {
        return Ok(OpResult::status_only(op, status));
    }
    check_shape(op, shape, &body)?;
    Ok(OpResult {
        op,
        status,
        body,
        msg: None,
    })
}

fn void_result<O: Operation>(op: O, status: NfsStat4, body: ResultBody) -> CompoundResult<OpResult<O>> {
    build(op, status, body, BodyShape::Void)
}

fn fh_result<O: Operation>(op: O, status: NfsStat4, body: ResultBody) -> CompoundResult<OpResult<O>> {
    build(op, status, body, BodyShape::FileHandle)
}

fn stateid_result<O: Operation>(op: O, status: NfsStat4, body: ResultBody) -> CompoundResult<OpResult<O>> {
    build(op, status, body, BodyShape::StateId)
}

fn opaque_result<O: Operation>(op: O, status: NfsStat4, body: ResultBody) -> CompoundResult<OpResult<O>> {
    build(op, status, body, BodyShape::Opaque)
}

/// A registered operation.
#[derive(Clone)]
pub struct ResultEntry<O: Operation> {
    // name of the XDR result type, `GETFH4res`
    pub res_type: String,
    pub construct: ResultConstructor<O>,
}

fn fore_constructor(op: OpNum) -> ResultConstructor<OpNum> {
    use OpNum::*;

    match op {
        GetFh => fh_result,
        Close | OpenDowngrade | OpenConfirm | LockU => stateid_result,
        PutFh | PutPubFh | PutRootFh | SaveFh | RestoreFh | Lookup | LookupP | OpenAttr
        | DelegPurge | DelegReturn | Renew | SetClientIdConfirm | Verify | NVerify
        | ReleaseLockOwner | BackchannelCtl | DestroySession | DestroyClientId
        | ReclaimComplete | Illegal => void_result,
        _ => opaque_result,
    }
}

fn callback_constructor(op: CbOpNum) -> ResultConstructor<CbOpNum> {
    use CbOpNum::*;

    match op {
        GetAttr | Sequence | Notify | NotifyLock | NotifyDeviceId | RecallSlot => opaque_result,
        _ => void_result,
    }
}

fn build_registry<O: Operation + IntoEnumIterator>(
    constructor: fn(O) -> ResultConstructor<O>,
) -> HashMap<O, ResultEntry<O>> {
    O::iter()
        .map(|op| {
            // `OP_CB_GETATTR` -> `CB_GETATTR4res`
            let base = op.name().strip_prefix("OP_").unwrap_or(op.name());
            let entry = ResultEntry {
                res_type: format!("{}4res", base),
                construct: constructor(op),
            };
            (op, entry)
        })
        .collect()
}

/// Everything that differs between the fore channel compound and the
/// callback compound.
pub struct CompoundProfile<O: Operation> {
    pub name: &'static str,
    // union type of the reply entries
    pub resop_type: &'static str,
    // prepended to the tag of replies served from the replay cache
    pub replay_prefix: &'static str,
    // field name of a reply entry in its union: `opgetfh`, `opcbrecall`
    pub mangle: fn(O) -> String,
    pub minor_versions: RangeInclusive<u32>,
    registry: HashMap<O, ResultEntry<O>>,
}

impl<O: Operation> CompoundProfile<O> {
    pub fn entry(&self, op: O) -> CompoundResult<&ResultEntry<O>> {
        self.registry
            .get(&op)
            .ok_or_else(|| CompoundError::UnregisteredOp(op.to_string(), self.name))
    }

    /// Build the result of `op` through its registered constructor.
    pub fn encode_status(&self, op: O, status: NfsStat4, body: ResultBody) -> CompoundResult<OpResult<O>> {
        let entry = self.entry(op)?;
        (entry.construct)(op, status, body)
    }

    // Same as `encode_status` with the operation given by name
    pub fn encode_status_by_name(&self, name: &str, status: NfsStat4, body: ResultBody) -> CompoundResult<OpResult<O>> {
        let op = self
            .op_by_name(name)
            .ok_or_else(|| CompoundError::UnregisteredOp(name.to_owned(), self.name))?;
        self.encode_status(op, status, body)
    }

    // Accepts `OP_WRITE`, `write`, and for callbacks `OP_CB_RECALL`,
    // `CB_RECALL` or `recall`
    pub fn op_by_name(&self, name: &str) -> Option<O> {
        let lower = name.to_ascii_lowercase();
        let prefix = O::PREFIX.to_ascii_lowercase();
        // "cb_" for callback operations, empty for the fore channel
        let bare = prefix.strip_prefix("op_").unwrap_or(&prefix);
        let short = lower
            .strip_prefix(&prefix)
            .or_else(|| lower.strip_prefix(bare))
            .unwrap_or(&lower)
            .to_owned();
        self.registry.keys().copied().find(|op| op.short_name() == short)
    }

    pub fn result_field(&self, op: O) -> String {
        (self.mangle)(op)
    }

    pub fn supports_minor_version(&self, minor_version: u32) -> bool {
        self.minor_versions.contains(&minor_version)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

lazy_static! {
    pub static ref FORE_PROFILE: CompoundProfile<OpNum> = CompoundProfile {
        name: "fore",
        resop_type: "nfs_resop4",
        replay_prefix: REPLAY_TAG_PREFIX,
        mangle: |op| format!("op{}", op.short_name()),
        minor_versions: 0..=2,
        registry: build_registry(fore_constructor),
    };

    pub static ref CALLBACK_PROFILE: CompoundProfile<CbOpNum> = CompoundProfile {
        name: "callback",
        resop_type: "nfs_cb_resop4",
        replay_prefix: REPLAY_TAG_PREFIX,
        mangle: |op| format!("opcb{}", op.short_name()),
        minor_versions: 0..=2,
        registry: build_registry(callback_constructor),
    };
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::compound::result::FileHandle;

    #[test]
    fn test_every_operation_is_registered() {
        assert_eq!(FORE_PROFILE.len(), OpNum::iter().count());
        assert_eq!(CALLBACK_PROFILE.len(), CbOpNum::iter().count());
    }

    #[test]
    fn test_res_type_names() {
        assert_eq!(FORE_PROFILE.entry(OpNum::GetFh).unwrap().res_type, "GETFH4res");
        assert_eq!(
            CALLBACK_PROFILE.entry(CbOpNum::Recall).unwrap().res_type,
            "CB_RECALL4res"
        );
    }

    #[test]
    fn test_mangle() {
        assert_eq!(FORE_PROFILE.result_field(OpNum::GetFh), "opgetfh");
        assert_eq!(CALLBACK_PROFILE.result_field(CbOpNum::Recall), "opcbrecall");
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(FORE_PROFILE.op_by_name("OP_WRITE"), Some(OpNum::Write));
        assert_eq!(FORE_PROFILE.op_by_name("sequence"), Some(OpNum::Sequence));
        assert_eq!(CALLBACK_PROFILE.op_by_name("CB_RECALL_ANY"), Some(CbOpNum::RecallAny));
        assert_eq!(CALLBACK_PROFILE.op_by_name("recall"), Some(CbOpNum::Recall));
        assert_eq!(FORE_PROFILE.op_by_name("frobnicate"), None);
    }

    #[test]
    fn test_callback_prefix_only_on_callback_profile() {
        assert_eq!(FORE_PROFILE.op_by_name("cb_write"), None);
        assert_eq!(FORE_PROFILE.op_by_name("CB_SEQUENCE"), None);
        assert_eq!(CALLBACK_PROFILE.op_by_name("cb_recall"), Some(CbOpNum::Recall));
        assert_eq!(CALLBACK_PROFILE.op_by_name("OP_CB_SEQUENCE"), Some(CbOpNum::Sequence));
    }

    #[test]
    fn test_constructor_checks_body() {
        let fh = FileHandle::new(vec![1u8]).unwrap();
        let ok = FORE_PROFILE
            .encode_status(OpNum::GetFh, NfsStat4::Ok, ResultBody::FileHandle(fh))
            .unwrap();
        assert!(ok.is_ok());

        let err = FORE_PROFILE
            .encode_status(OpNum::GetFh, NfsStat4::Ok, ResultBody::Void)
            .unwrap_err();
        assert!(matches!(err, CompoundError::BodyMismatch { .. }));
    }

    #[test]
    fn test_error_drops_body() {
        let result = FORE_PROFILE
            .encode_status_by_name(
                "write",
                NfsStat4::RetryUncachedRep,
                ResultBody::Opaque(Bytes::from_static(&[0; 16])),
            )
            .unwrap();
        assert_eq!(result.body, ResultBody::Void);
        assert_eq!(result.status, NfsStat4::RetryUncachedRep);
    }
}
