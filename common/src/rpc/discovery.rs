use async_trait::async_trait;

use super::error::RpcResult;

/// Maps a program/version pair to the port it is served on.
#[async_trait]
pub trait PortResolver: Send + Sync {
    async fn resolve(&self, program: u32, version: u32) -> RpcResult<u16>;
}

// Resolver for servers whose port is known in advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPort(pub u16);

#[async_trait]
impl PortResolver for FixedPort {
    async fn resolve(&self, _: u32, _: u32) -> RpcResult<u16> {
        Ok(self.0)
    }
}
