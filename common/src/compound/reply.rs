use bytes::Bytes;

use super::{op::Operation, result::OpResult};
use crate::{
    config::COMPOUND_RES_BASE_SIZE,
    serializer::{xdr_len, Writer},
    status::NfsStat4,
};

/// The results of one compound as they are sent (`COMPOUND4res`).
///
/// Keeps every result next to its encoding so the reply size is known at
/// any point of the evaluation.
#[derive(Debug, Clone)]
pub struct ArgResults<O: Operation> {
    status: NfsStat4,
    results: Vec<OpResult<O>>,
    packed: Vec<Bytes>,
    // prepended to the compound tag
    prefix: &'static str,
    // status + array length + every packed result
    base_len: usize,
}

impl<O: Operation> ArgResults<O> {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            status: NfsStat4::Ok,
            results: Vec::new(),
            packed: Vec::new(),
            prefix,
            base_len: COMPOUND_RES_BASE_SIZE,
        }
    }

    pub fn append(&mut self, result: OpResult<O>) {
        self.status = result.status;
        let packed = result.pack();
        self.base_len += packed.len();
        self.packed.push(packed);
        self.results.push(result);
    }

    // Mirrors the status of the last appended result
    pub fn status(&self) -> NfsStat4 {
        self.status
    }

    pub fn set_status(&mut self, status: NfsStat4) {
        self.status = status;
    }

    pub fn tag(&self, compound_tag: &str) -> String {
        format!("{}{}", self.prefix, compound_tag)
    }

    /// Encoded size of the whole reply carrying `compound_tag`.
    pub fn size(&self, compound_tag: &str) -> usize {
        self.base_len + xdr_len(self.tag(compound_tag).as_bytes())
    }

    pub fn results(&self) -> &[OpResult<O>] {
        &self.results
    }

    pub fn packed(&self) -> &[Bytes] {
        &self.packed
    }

    pub fn get(&self, index: usize) -> Option<&OpResult<O>> {
        self.results.get(index)
    }

    pub fn last(&self) -> Option<&OpResult<O>> {
        self.results.last()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Encode the reply as `COMPOUND4res`.
    pub fn to_bytes(&self, compound_tag: &str) -> Vec<u8> {
        let mut writer = Writer::with_capacity(self.size(compound_tag));
        writer.write_u32(self.status as u32);
        writer.write_string(&self.tag(compound_tag));
        writer.write_u32(self.packed.len() as u32);
        for packed in &self.packed {
            writer.write_raw(packed);
        }
        writer.bytes()
    }
}

/// The live reply and the one a retransmission will get.
///
/// Both grow by one entry per appended result. They only differ when the
/// compound must not be cached: every result after the first is then
/// replaced in the cache by an `NFS4ERR_RETRY_UNCACHED_REP` result for the
/// same operation.
#[derive(Debug, Clone)]
pub struct PairedResults<O: Operation> {
    reply: ArgResults<O>,
    cache: ArgResults<O>,
    tag: String,
}

impl<O: Operation> PairedResults<O> {
    pub fn new(tag: impl Into<String>, replay_prefix: &'static str) -> Self {
        Self {
            reply: ArgResults::new(""),
            cache: ArgResults::new(replay_prefix),
            tag: tag.into(),
        }
    }

    /// Append the result of the operation at `index`.
    pub fn append(&mut self, result: OpResult<O>, index: usize, caching: bool) {
        if let Some(msg) = &result.msg {
            self.tag = msg.clone();
        }

        if index == 0 || caching {
            self.cache.append(result.clone());
        } else {
            self.cache
                .append(OpResult::status_only(result.op, NfsStat4::RetryUncachedRep));
        }
        self.reply.append(result);
    }

    /// Set the status of both replies without any result, for compounds
    /// rejected before their first operation.
    pub fn set_empty_return(&mut self, status: NfsStat4, tag: Option<String>) {
        self.reply.set_status(status);
        self.cache.set_status(status);
        if let Some(tag) = tag {
            self.tag = tag;
        }
    }

    pub fn reply(&self) -> &ArgResults<O> {
        &self.reply
    }

    pub fn cache(&self) -> &ArgResults<O> {
        &self.cache
    }

    pub fn status(&self) -> NfsStat4 {
        self.reply.status()
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    pub fn reply_size(&self) -> usize {
        self.reply.size(&self.tag)
    }

    pub fn cache_size(&self) -> usize {
        self.cache.size(&self.tag)
    }

    pub fn len(&self) -> usize {
        self.reply.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reply.is_empty()
    }

    pub fn into_parts(self) -> (ArgResults<O>, ArgResults<O>, String) {
        (self.reply, self.cache, self.tag)
    }
}
