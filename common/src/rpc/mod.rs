mod auth;
mod channel;
mod client;
mod discovery;
mod error;
mod message;
mod xid;

pub use auth::*;
pub use channel::Channel;
pub use client::RpcClient;
pub use discovery::*;
pub use error::*;
pub use message::*;
pub use xid::XidGenerator;
