use thiserror::Error;

use super::result::BodyShape;

/// Error type for compound evaluation.
///
/// A failing operation is never an error here, its status is recorded in the
/// reply. These only report misuse of the evaluator by an operation handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompoundError {
    /// No result constructor is registered for this operation.
    #[error("No result constructor registered for {0} in the {1} profile")]
    UnregisteredOp(String, &'static str),

    /// The handler returned a body that doesn't fit the operation.
    #[error("{op} returns a {expected:?} body, got {got:?}")]
    BodyMismatch {
        op: String,
        expected: BodyShape,
        got: BodyShape,
    },

    /// The handler answered for another operation than it was given.
    #[error("Handler answered {got} while evaluating {expected}")]
    OpMismatch { expected: String, got: String },

    #[error("Handler failed on {0}: {1}")]
    Handler(String, String),
}

pub type CompoundResult<T> = Result<T, CompoundError>;
