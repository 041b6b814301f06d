use std::fmt;

use bytes::Bytes;

use super::op::Operation;
use crate::{
    config::{NFS4_FHSIZE, NFS4_OTHER_SIZE},
    serializer::{xdr_padding, Reader, ReaderError, Serializer, Writer},
    status::{NfsStat4, ProtocolStatus},
};

/// `nfs_fh4`
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FileHandle(Bytes);

impl FileHandle {
    pub fn new(bytes: impl Into<Bytes>) -> Result<Self, ReaderError> {
        let bytes = bytes.into();
        if bytes.len() > NFS4_FHSIZE {
            return Err(ReaderError::TooLong(bytes.len(), NFS4_FHSIZE));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileHandle({})", self)
    }
}

impl Serializer for FileHandle {
    fn write(&self, writer: &mut Writer) {
        writer.write_opaque(&self.0);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader
            .read_opaque(Some(NFS4_FHSIZE))
            .map(|bytes| Self(Bytes::from(bytes)))
    }
}

/// `stateid4`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId {
    pub seqid: u32,
    pub other: [u8; NFS4_OTHER_SIZE],
}

impl StateId {
    /// The anonymous stateid, all zeros.
    pub const ANONYMOUS: Self = Self {
        seqid: 0,
        other: [0; NFS4_OTHER_SIZE],
    };

    /// The READ bypass stateid, all ones.
    pub const BYPASS: Self = Self {
        seqid: u32::MAX,
        other: [0xff; NFS4_OTHER_SIZE],
    };

    /// Refers to the current stateid of the compound.
    pub const CURRENT: Self = Self {
        seqid: 1,
        other: [0; NFS4_OTHER_SIZE],
    };

    pub fn new(seqid: u32, other: [u8; NFS4_OTHER_SIZE]) -> Self {
        Self { seqid, other }
    }

    pub fn is_anonymous(&self) -> bool {
        *self == Self::ANONYMOUS
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.seqid, hex::encode(self.other))
    }
}

impl Serializer for StateId {
    fn write(&self, writer: &mut Writer) {
        writer.write_u32(self.seqid);
        writer.write_fixed_opaque(&self.other);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let seqid = reader.read_u32()?;
        let mut other = [0; NFS4_OTHER_SIZE];
        other.copy_from_slice(reader.read_fixed_opaque(NFS4_OTHER_SIZE)?);
        Ok(Self { seqid, other })
    }

    fn size(&self) -> usize {
        4 + NFS4_OTHER_SIZE
    }
}

/// Shape of the body an operation returns on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    Void,
    FileHandle,
    StateId,
    // encoded by the operation itself
    Opaque,
}

/// Body of a successful operation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultBody {
    Void,
    FileHandle(FileHandle),
    StateId(StateId),
    // Already XDR encoded body, written as is
    Opaque(Bytes),
}

impl ResultBody {
    pub fn shape(&self) -> BodyShape {
        match self {
            Self::Void => BodyShape::Void,
            Self::FileHandle(_) => BodyShape::FileHandle,
            Self::StateId(_) => BodyShape::StateId,
            Self::Opaque(_) => BodyShape::Opaque,
        }
    }

    fn write(&self, writer: &mut Writer) {
        match self {
            Self::Void => {}
            Self::FileHandle(fh) => fh.write(writer),
            Self::StateId(stateid) => stateid.write(writer),
            Self::Opaque(bytes) => {
                writer.write_raw(bytes);
                writer.write_raw(&[0u8; 3][..xdr_padding(bytes.len())]);
            }
        }
    }
}

/// One entry of a compound reply (`nfs_resop4` / `nfs_cb_resop4`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpResult<O: Operation> {
    pub op: O,
    pub status: NfsStat4,
    pub body: ResultBody,
    // replaces the compound tag when appended
    pub msg: Option<String>,
}

impl<O: Operation> OpResult<O> {
    // A result carrying only a status, as every error result does
    pub fn status_only(op: O, status: NfsStat4) -> Self {
        Self {
            op,
            status,
            body: ResultBody::Void,
            msg: None,
        }
    }

    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    pub fn file_handle(&self) -> Option<&FileHandle> {
        match &self.body {
            ResultBody::FileHandle(fh) => Some(fh),
            _ => None,
        }
    }

    pub fn state_id(&self) -> Option<&StateId> {
        match &self.body {
            ResultBody::StateId(stateid) => Some(stateid),
            _ => None,
        }
    }

    pub fn pack(&self) -> Bytes {
        let mut writer = Writer::new();
        self.write(&mut writer);
        Bytes::from(writer.bytes())
    }

    pub fn write(&self, writer: &mut Writer) {
        writer.write_u32(self.op.code());
        self.status.write(writer);
        if self.status.is_ok() {
            self.body.write(writer);
        }
    }
}

impl<O: Operation> fmt::Display for OpResult<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.op, self.status)
    }
}
