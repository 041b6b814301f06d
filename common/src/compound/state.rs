use super::{
    op::Operation,
    registry::CompoundProfile,
    reply::PairedResults,
    result::{FileHandle, OpResult, StateId},
};
use crate::status::NfsStat4;

/// Interim state of one compound while its operations are evaluated in
/// turn. Never shared between compounds.
pub struct CompoundState<O: Operation> {
    // Current filehandle
    pub cfh: Option<FileHandle>,
    // Saved filehandle
    pub sfh: Option<FileHandle>,
    // Current stateid
    pub cid: Option<StateId>,
    // Saved stateid
    pub sid: Option<StateId>,
    pub principal: String,
    pub minor_version: u32,
    // -1 until the first operation is evaluated
    index: isize,
    caching: bool,
    results: PairedResults<O>,
    profile: &'static CompoundProfile<O>,
}

impl<O: Operation> CompoundState<O> {
    pub fn new(
        profile: &'static CompoundProfile<O>,
        tag: impl Into<String>,
        minor_version: u32,
        caching: bool,
        principal: String,
    ) -> Self {
        Self {
            cfh: None,
            sfh: None,
            cid: None,
            sid: None,
            principal,
            minor_version,
            index: -1,
            caching,
            results: PairedResults::new(tag, profile.replay_prefix),
            profile,
        }
    }

    pub fn profile(&self) -> &'static CompoundProfile<O> {
        self.profile
    }

    pub fn index(&self) -> isize {
        self.index
    }

    pub(super) fn advance(&mut self) -> usize {
        self.index += 1;
        self.index as usize
    }

    // Whether the reply of this compound may be replayed
    pub fn caching(&self) -> bool {
        self.caching
    }

    /// Switch the current filehandle.
    ///
    /// The current stateid goes back to the anonymous one unless `state` is
    /// given.
    pub fn set_cfh(&mut self, fh: FileHandle, state: Option<StateId>) {
        self.cfh = Some(fh);
        self.cid = Some(state.unwrap_or(StateId::ANONYMOUS));
    }

    pub fn current_fh(&self) -> Result<&FileHandle, NfsStat4> {
        self.cfh.as_ref().ok_or(NfsStat4::NoFileHandle)
    }

    // SAVEFH
    pub fn save_fh(&mut self) -> Result<(), NfsStat4> {
        let fh = self.current_fh()?.clone();
        self.sfh = Some(fh);
        self.sid = self.cid;
        Ok(())
    }

    // RESTOREFH
    pub fn restore_fh(&mut self) -> Result<(), NfsStat4> {
        let fh = self.sfh.clone().ok_or(NfsStat4::RestoreFh)?;
        self.cfh = Some(fh);
        self.cid = self.sid;
        Ok(())
    }

    pub fn tag(&self) -> &str {
        self.results.tag()
    }

    pub fn tag_msg(&mut self, msg: impl Into<String>) {
        self.results.set_tag(msg);
    }

    // Status of the last evaluated operation, OK before any
    pub fn status(&self) -> NfsStat4 {
        self.results.status()
    }

    pub fn results(&self) -> &PairedResults<O> {
        &self.results
    }

    pub(super) fn append(&mut self, result: OpResult<O>) {
        let index = self.index.max(0) as usize;
        self.results.append(result, index, self.caching);
    }

    pub fn set_empty_return(&mut self, status: NfsStat4, tag: Option<String>) {
        self.results.set_empty_return(status, tag);
    }

    pub(super) fn into_results(self) -> PairedResults<O> {
        self.results
    }
}
