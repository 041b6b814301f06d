//! Port mapper (rpcbind v2) client.

use std::{
    net::{IpAddr, SocketAddr},
    time::Duration,
};

use async_trait::async_trait;
use log::debug;

use nfstest_common::{
    config::{IPPROTO_TCP, PMAPPROC_GETPORT, PMAP_PORT, PMAP_PROGRAM, PMAP_VERSION},
    rpc::{Credential, PortResolver, RpcClient, RpcError, RpcResult},
    serializer::{Reader, ReaderError, Serializer, Writer},
};

/// `mapping` argument of PMAPPROC_GETPORT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub program: u32,
    pub version: u32,
    pub protocol: u32,
    pub port: u32,
}

impl Serializer for Mapping {
    fn write(&self, writer: &mut Writer) {
        writer.write_u32(self.program);
        writer.write_u32(self.version);
        writer.write_u32(self.protocol);
        writer.write_u32(self.port);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(Self {
            program: reader.read_u32()?,
            version: reader.read_u32()?,
            protocol: reader.read_u32()?,
            port: reader.read_u32()?,
        })
    }

    fn size(&self) -> usize {
        16
    }
}

pub struct PortmapClient {
    rpc: RpcClient,
}

impl PortmapClient {
    // Port mapper of `ip` on its well known port
    pub fn new(ip: IpAddr) -> Self {
        Self::with_addr(SocketAddr::new(ip, PMAP_PORT))
    }

    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            rpc: RpcClient::new(addr, PMAP_PROGRAM, PMAP_VERSION, Credential::None),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.rpc = self.rpc.with_timeout(timeout);
        self
    }

    pub async fn null(&self) -> RpcResult<()> {
        self.rpc.null().await
    }

    /// Raw PMAPPROC_GETPORT, 0 means the program isn't registered.
    pub async fn get_port(&self, program: u32, version: u32, protocol: u32) -> RpcResult<u32> {
        let mapping = Mapping {
            program,
            version,
            protocol,
            port: 0,
        };
        self.rpc.call(PMAPPROC_GETPORT, &mapping, None, None).await
    }
}

#[async_trait]
impl PortResolver for PortmapClient {
    async fn resolve(&self, program: u32, version: u32) -> RpcResult<u16> {
        let port = self.get_port(program, version, IPPROTO_TCP).await?;
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Port mapper {} maps {}/{} to port {}",
                self.rpc.addr(),
                program,
                version,
                port
            );
        }

        match port {
            0 => Err(RpcError::ServiceNotFound { program, version }),
            port => u16::try_from(port).map_err(|_| RpcError::Malformed(ReaderError::InvalidValue)),
        }
    }
}
