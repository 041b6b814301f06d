// Allow some clippy lints
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]

pub mod compound;
pub mod config;
pub mod rpc;
pub mod serializer;
pub mod status;
pub mod time;
pub mod verifier;
