use std::{io::Error as IoError, net::SocketAddr, time::Duration};

use thiserror::Error;

use super::message::{AcceptStat, AuthStat};
use crate::serializer::ReaderError;

/// Error type for RPC transport and dispatch.
#[derive(Error, Debug)]
pub enum RpcError {
    /// Could not establish the connection.
    #[error("Connection to {0} failed: {1}")]
    ConnectionError(SocketAddr, IoError),
    #[error("Connection to {0} timed out")]
    ConnectTimeout(SocketAddr),
    /// The connection broke while writing or reading.
    #[error("Transport error: {0}")]
    TransportError(#[from] IoError),
    #[error("Channel to {0} is closed")]
    ChannelClosed(SocketAddr),
    /// No reply arrived before the deadline.
    #[error("No reply for xid {xid:#010x} within {timeout:?}")]
    Timeout { xid: u32, timeout: Duration },
    #[error("No call with xid {0:#010x} is waiting on this channel")]
    UnknownXid(u32),
    #[error("Xid {0:#010x} is already in flight on this channel")]
    XidInUse(u32),
    #[error("Too many calls in flight ({0})")]
    TooManyPending(usize),
    #[error("Record of {0} bytes exceeds the maximum of {1}")]
    RecordTooLarge(usize, usize),
    #[error("Malformed RPC message: {0}")]
    Malformed(#[from] ReaderError),
    #[error("Reply for xid {expected:#010x} carried xid {got:#010x}")]
    XidMismatch { expected: u32, got: u32 },
    #[error("Call was accepted but failed with {0}")]
    CallFailed(AcceptStat),
    #[error("Program version mismatch, server supports {low} to {high}")]
    ProgramMismatch { low: u32, high: u32 },
    #[error("RPC version mismatch, server supports {low} to {high}")]
    RpcMismatch { low: u32, high: u32 },
    #[error("Authentication failed: {0}")]
    AuthError(AuthStat),
    #[error("Credential is invalid: {0}")]
    InvalidCredential(&'static str),
    /// The port mapper has no registration for this program/version.
    #[error("Service {program}/{version} is not registered with the port mapper")]
    ServiceNotFound { program: u32, version: u32 },
}

impl RpcError {
    // Errors after which the channel can't be trusted anymore. Calls refused
    // before anything was written leave the channel usable.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::TransportError(_) | Self::ChannelClosed(_))
    }
}

pub type RpcResult<T> = Result<T, RpcError>;
