use bytes::Bytes;
use log::{debug, trace};

use super::{
    error::{CompoundError, CompoundResult},
    op::Operation,
    registry::CompoundProfile,
    reply::ArgResults,
    result::OpResult,
    state::CompoundState,
};
use crate::{
    rpc::Credential,
    status::{NfsStat4, ProtocolStatus},
};

/// One operation of a compound with its still encoded arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubOp<O: Operation> {
    pub op: O,
    pub args: Bytes,
}

impl<O: Operation> SubOp<O> {
    pub fn new(op: O, args: impl Into<Bytes>) -> Self {
        Self {
            op,
            args: args.into(),
        }
    }

    // Operation without arguments
    pub fn void(op: O) -> Self {
        Self::new(op, Bytes::new())
    }
}

#[derive(Debug, Clone)]
pub struct CompoundRequest<O: Operation> {
    pub tag: String,
    pub minor_version: u32,
    pub ops: Vec<SubOp<O>>,
    // whether the reply may be replayed to a retransmission
    pub cache_this: bool,
}

/// Evaluates one operation against the interim state of its compound.
///
/// Operation failures are reported through the status of the returned
/// result; an `Err` aborts the whole evaluation.
pub trait OpHandler<O: Operation>: Send + Sync {
    fn evaluate(&self, op: &SubOp<O>, state: &mut CompoundState<O>) -> CompoundResult<OpResult<O>>;
}

/// Outcome of a compound: the live reply and the cacheable one.
#[derive(Debug, Clone)]
pub struct CompoundReply<O: Operation> {
    pub status: NfsStat4,
    pub tag: String,
    pub live: ArgResults<O>,
    pub cache: ArgResults<O>,
}

impl<O: Operation> CompoundReply<O> {
    pub fn live_bytes(&self) -> Vec<u8> {
        self.live.to_bytes(&self.tag)
    }

    pub fn cache_bytes(&self) -> Vec<u8> {
        self.cache.to_bytes(&self.tag)
    }
}

/// Evaluate every operation of `request` in order, stopping after the first
/// one that doesn't return OK.
pub fn evaluate_compound<O: Operation, H: OpHandler<O> + ?Sized>(
    profile: &'static CompoundProfile<O>,
    request: &CompoundRequest<O>,
    credential: &Credential,
    handler: &H,
) -> CompoundResult<CompoundReply<O>> {
    let mut state = CompoundState::new(
        profile,
        request.tag.clone(),
        request.minor_version,
        request.cache_this,
        credential.principal(),
    );

    if !profile.supports_minor_version(request.minor_version) {
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Rejecting {} compound with minor version {}",
                profile.name, request.minor_version
            );
        }
        state.set_empty_return(NfsStat4::MinorVersMismatch, None);
        return Ok(into_reply(state));
    }

    for subop in &request.ops {
        let index = state.advance();
        let result = handler.evaluate(subop, &mut state)?;
        if result.op != subop.op {
            return Err(CompoundError::OpMismatch {
                expected: subop.op.to_string(),
                got: result.op.to_string(),
            });
        }
        // normalize through the registry, error results lose their body
        let OpResult {
            op,
            status,
            body,
            msg,
        } = result;
        let mut result = profile.encode_status(op, status, body)?;
        result.msg = msg;

        let status = result.status;
        if log::log_enabled!(log::Level::Trace) {
            trace!("{} compound [{}] {}", profile.name, index, result);
        }
        state.append(result);
        if !status.is_ok() {
            if log::log_enabled!(log::Level::Debug) {
                debug!(
                    "{} compound '{}' stopped at {} with {}",
                    profile.name, request.tag, subop.op, status
                );
            }
            break;
        }
    }

    Ok(into_reply(state))
}

fn into_reply<O: Operation>(state: CompoundState<O>) -> CompoundReply<O> {
    let status = state.status();
    let (live, cache, tag) = state.into_results().into_parts();
    CompoundReply {
        status,
        tag,
        live,
        cache,
    }
}
