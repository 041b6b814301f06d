//! Error types of the test clients and their assertions.

use std::io::Error as IoError;

use thiserror::Error;

use nfstest_common::{rpc::RpcError, serializer::ReaderError, status::NfsStat3};

/// Error type for client operations and test assertions.
#[derive(Error, Debug)]
pub enum CheckError {
    /// A status assertion failed. Warnings are failures the caller listed
    /// as acceptable deviations.
    #[error("{message}")]
    StatusMismatch { message: String, warning: bool },

    /// A plain condition did not hold.
    #[error("{0}")]
    Failure(String),

    /// An NFSv3 procedure didn't return NFS3_OK.
    #[error("{}operation {procedure} should return NFS3_OK, instead got {status}", context_prefix(.context))]
    BadResult {
        procedure: String,
        status: NfsStat3,
        context: Option<String>,
    },

    /// The procedure succeeded but returned implausible data.
    #[error("Unexpected NFS result: {0}")]
    Unexpected(String),

    /// The reply decodes but doesn't follow the procedure's result layout.
    #[error("Invalid NFS result: {0}")]
    Invalid(String),

    #[error("Error parsing NFS URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to resolve {0}: {1}")]
    Resolve(String, IoError),

    #[error("Malformed reply: {0}")]
    Malformed(#[from] ReaderError),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

fn context_prefix(context: &Option<String>) -> String {
    match context {
        Some(context) => format!("{}: ", context),
        None => String::new(),
    }
}

impl CheckError {
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::StatusMismatch { warning: true, .. })
    }
}

/// Result type alias for client operations.
pub type CheckResult<T> = Result<T, CheckError>;
