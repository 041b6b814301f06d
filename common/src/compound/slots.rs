use log::debug;

use super::{
    error::CompoundResult,
    evaluator::CompoundReply,
    op::Operation,
};
use crate::status::NfsStat4;

/// What to do with a request arriving on a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotDecision {
    /// Next request of the slot, evaluate it.
    NewRequest,
    /// Retransmission of the last request, answer with its cached reply.
    Replay(Vec<u8>),
    /// Reject the request with this status.
    Reject(NfsStat4),
}

#[derive(Debug, Clone, Default)]
struct Slot {
    seqid: u32,
    // encoded cacheable reply of the last completed request
    reply: Option<Vec<u8>>,
}

/// Reply cache of one session: the last reply of every slot.
#[derive(Debug, Clone)]
pub struct SlotTable {
    slots: Vec<Slot>,
}

impl SlotTable {
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![Slot::default(); size],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // Sequence id of the last request accepted on this slot
    pub fn seqid(&self, slot: usize) -> Option<u32> {
        self.slots.get(slot).map(|s| s.seqid)
    }

    pub fn check(&self, slot: usize, seqid: u32) -> SlotDecision {
        let Some(entry) = self.slots.get(slot) else {
            return SlotDecision::Reject(NfsStat4::BadSlot);
        };

        if seqid == entry.seqid {
            match &entry.reply {
                Some(reply) => SlotDecision::Replay(reply.clone()),
                // nothing was ever answered on this slot
                None => SlotDecision::Reject(NfsStat4::SeqMisordered),
            }
        } else if seqid == entry.seqid.wrapping_add(1) {
            SlotDecision::NewRequest
        } else {
            SlotDecision::Reject(NfsStat4::SeqMisordered)
        }
    }

    /// Remember the cacheable reply of the request `seqid` on `slot`.
    pub fn complete<O: Operation>(&mut self, slot: usize, seqid: u32, reply: &CompoundReply<O>) {
        if let Some(entry) = self.slots.get_mut(slot) {
            entry.seqid = seqid;
            entry.reply = Some(reply.cache_bytes());
        }
    }

    /// Run `evaluate` for a new request, or answer from the cache.
    ///
    /// Returns the encoded reply to send.
    pub fn process<O, F>(&mut self, slot: usize, seqid: u32, evaluate: F) -> CompoundResult<Result<Vec<u8>, NfsStat4>>
    where
        O: Operation,
        F: FnOnce() -> CompoundResult<CompoundReply<O>>,
    {
        match self.check(slot, seqid) {
            SlotDecision::NewRequest => {
                let reply = evaluate()?;
                self.complete(slot, seqid, &reply);
                Ok(Ok(reply.live_bytes()))
            }
            SlotDecision::Replay(reply) => {
                if log::log_enabled!(log::Level::Debug) {
                    debug!("Replaying slot {} seqid {}", slot, seqid);
                }
                Ok(Ok(reply))
            }
            SlotDecision::Reject(status) => Ok(Err(status)),
        }
    }
}
