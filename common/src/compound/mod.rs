//! Server side evaluation of COMPOUND requests.
//!
//! Operations are evaluated in order against a per compound interim state
//! and their results appended to a pair of replies: the one sent now and
//! the one a retransmission hitting the same session slot gets.

mod error;
mod evaluator;
mod op;
mod registry;
mod reply;
mod result;
mod slots;
mod state;

pub use error::*;
pub use evaluator::*;
pub use op::*;
pub use registry::*;
pub use reply::*;
pub use result::*;
pub use slots::*;
pub use state::CompoundState;
