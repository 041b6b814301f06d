// ONC RPC v2 message headers (RFC 5531) and record marking.

use bytes::Bytes;

use crate::{
    config::{FRAGMENT_LENGTH_MASK, LAST_FRAGMENT, MAX_AUTH_BYTES, RPC_VERSION},
    serializer::{Reader, ReaderError, Serializer, Writer},
};

pub const MSG_CALL: u32 = 0;
pub const MSG_REPLY: u32 = 1;

pub const MSG_ACCEPTED: u32 = 0;
pub const MSG_DENIED: u32 = 1;

pub const RPC_MISMATCH: u32 = 0;
pub const AUTH_ERROR: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::FromRepr)]
#[repr(u32)]
pub enum AuthFlavor {
    #[strum(serialize = "AUTH_NONE")]
    None = 0,
    #[strum(serialize = "AUTH_SYS")]
    Sys = 1,
    #[strum(serialize = "AUTH_SHORT")]
    Short = 2,
    #[strum(serialize = "AUTH_DH")]
    Dh = 3,
    #[strum(serialize = "RPCSEC_GSS")]
    Gss = 6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::FromRepr)]
#[repr(u32)]
pub enum AcceptStat {
    #[strum(serialize = "SUCCESS")]
    Success = 0,
    #[strum(serialize = "PROG_UNAVAIL")]
    ProgUnavail = 1,
    #[strum(serialize = "PROG_MISMATCH")]
    ProgMismatch = 2,
    #[strum(serialize = "PROC_UNAVAIL")]
    ProcUnavail = 3,
    #[strum(serialize = "GARBAGE_ARGS")]
    GarbageArgs = 4,
    #[strum(serialize = "SYSTEM_ERR")]
    SystemErr = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::FromRepr)]
#[repr(u32)]
pub enum AuthStat {
    #[strum(serialize = "AUTH_OK")]
    Ok = 0,
    #[strum(serialize = "AUTH_BADCRED")]
    BadCred = 1,
    #[strum(serialize = "AUTH_REJECTEDCRED")]
    RejectedCred = 2,
    #[strum(serialize = "AUTH_BADVERF")]
    BadVerf = 3,
    #[strum(serialize = "AUTH_REJECTEDVERF")]
    RejectedVerf = 4,
    #[strum(serialize = "AUTH_TOOWEAK")]
    TooWeak = 5,
    #[strum(serialize = "AUTH_INVALIDRESP")]
    InvalidResp = 6,
    #[strum(serialize = "AUTH_FAILED")]
    Failed = 7,
    #[strum(serialize = "RPCSEC_GSS_CREDPROBLEM")]
    GssCredProblem = 13,
    #[strum(serialize = "RPCSEC_GSS_CTXPROBLEM")]
    GssCtxProblem = 14,
}

/// `opaque_auth`: a flavor and up to 400 bytes of flavor specific body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueAuth {
    pub flavor: u32,
    pub body: Bytes,
}

impl OpaqueAuth {
    pub fn none() -> Self {
        Self {
            flavor: AuthFlavor::None as u32,
            body: Bytes::new(),
        }
    }

    pub fn new(flavor: AuthFlavor, body: Bytes) -> Self {
        Self {
            flavor: flavor as u32,
            body,
        }
    }
}

impl Serializer for OpaqueAuth {
    fn write(&self, writer: &mut Writer) {
        writer.write_u32(self.flavor);
        writer.write_opaque(&self.body);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let flavor = reader.read_u32()?;
        let body = reader.read_opaque(Some(MAX_AUTH_BYTES))?;
        Ok(Self {
            flavor,
            body: Bytes::from(body),
        })
    }
}

/// Header of a call up to and including the credential.
///
/// The verifier is written separately since strong security flavors compute
/// it over the encoded bytes of this header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallHeader {
    pub xid: u32,
    pub program: u32,
    pub version: u32,
    pub procedure: u32,
    pub credential: OpaqueAuth,
}

impl Serializer for CallHeader {
    fn write(&self, writer: &mut Writer) {
        writer.write_u32(self.xid);
        writer.write_u32(MSG_CALL);
        writer.write_u32(RPC_VERSION);
        writer.write_u32(self.program);
        writer.write_u32(self.version);
        writer.write_u32(self.procedure);
        self.credential.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let xid = reader.read_u32()?;
        if reader.read_u32()? != MSG_CALL {
            return Err(ReaderError::InvalidValue);
        }
        if reader.read_u32()? != RPC_VERSION {
            return Err(ReaderError::InvalidValue);
        }
        Ok(Self {
            xid,
            program: reader.read_u32()?,
            version: reader.read_u32()?,
            procedure: reader.read_u32()?,
            credential: OpaqueAuth::read(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBody {
    Accepted {
        verifier: OpaqueAuth,
        stat: AcceptStat,
        // only set for PROG_MISMATCH
        mismatch: Option<(u32, u32)>,
    },
    RpcMismatch {
        low: u32,
        high: u32,
    },
    AuthError(AuthStat),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyHeader {
    pub xid: u32,
    pub body: ReplyBody,
}

impl ReplyHeader {
    pub fn success(xid: u32) -> Self {
        Self {
            xid,
            body: ReplyBody::Accepted {
                verifier: OpaqueAuth::none(),
                stat: AcceptStat::Success,
                mismatch: None,
            },
        }
    }
}

impl Serializer for ReplyHeader {
    fn write(&self, writer: &mut Writer) {
        writer.write_u32(self.xid);
        writer.write_u32(MSG_REPLY);
        match &self.body {
            ReplyBody::Accepted {
                verifier,
                stat,
                mismatch,
            } => {
                writer.write_u32(MSG_ACCEPTED);
                verifier.write(writer);
                writer.write_u32(*stat as u32);
                if let (AcceptStat::ProgMismatch, Some((low, high))) = (stat, mismatch) {
                    writer.write_u32(*low);
                    writer.write_u32(*high);
                }
            }
            ReplyBody::RpcMismatch { low, high } => {
                writer.write_u32(MSG_DENIED);
                writer.write_u32(RPC_MISMATCH);
                writer.write_u32(*low);
                writer.write_u32(*high);
            }
            ReplyBody::AuthError(stat) => {
                writer.write_u32(MSG_DENIED);
                writer.write_u32(AUTH_ERROR);
                writer.write_u32(*stat as u32);
            }
        }
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let xid = reader.read_u32()?;
        if reader.read_u32()? != MSG_REPLY {
            return Err(ReaderError::InvalidValue);
        }
        let body = match reader.read_u32()? {
            MSG_ACCEPTED => {
                let verifier = OpaqueAuth::read(reader)?;
                let code = reader.read_u32()?;
                let stat =
                    AcceptStat::from_repr(code).ok_or(ReaderError::UnknownDiscriminant(code))?;
                let mismatch = if stat == AcceptStat::ProgMismatch {
                    Some((reader.read_u32()?, reader.read_u32()?))
                } else {
                    None
                };
                ReplyBody::Accepted {
                    verifier,
                    stat,
                    mismatch,
                }
            }
            MSG_DENIED => match reader.read_u32()? {
                RPC_MISMATCH => ReplyBody::RpcMismatch {
                    low: reader.read_u32()?,
                    high: reader.read_u32()?,
                },
                AUTH_ERROR => {
                    let code = reader.read_u32()?;
                    ReplyBody::AuthError(
                        AuthStat::from_repr(code).ok_or(ReaderError::UnknownDiscriminant(code))?,
                    )
                }
                other => return Err(ReaderError::UnknownDiscriminant(other)),
            },
            other => return Err(ReaderError::UnknownDiscriminant(other)),
        };
        Ok(Self { xid, body })
    }
}

// Peek at the xid of a complete record without decoding the rest
pub fn peek_xid(record: &[u8]) -> Option<u32> {
    record
        .get(..4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

// Wrap a record into a single last fragment
pub fn frame_record(record: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(record.len() + 4);
    let marker = LAST_FRAGMENT | (record.len() as u32 & FRAGMENT_LENGTH_MASK);
    framed.extend_from_slice(&marker.to_be_bytes());
    framed.extend_from_slice(record);
    framed
}

// Split a record marking header into (is_last, length)
#[inline]
pub fn parse_fragment_header(marker: u32) -> (bool, usize) {
    (
        marker & LAST_FRAGMENT != 0,
        (marker & FRAGMENT_LENGTH_MASK) as usize,
    )
}
