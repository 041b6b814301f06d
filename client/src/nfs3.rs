//! NFSv3 client facade.

use std::{
    io::{Error as IoError, ErrorKind},
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use bytes::Bytes;
use log::debug;

use nfstest_common::{
    config::{MOUNT_PROGRAM, MOUNT_V3, NFSPROC3_NAMES, NFS_PROGRAM, NFS_V3},
    rpc::{Credential, PortResolver, RpcClient, RpcResult},
    serializer::{Reader, Serializer},
    status::NfsStat3,
    verifier::{new_verifier, Verifier},
};

use crate::{
    environment::check_res,
    error::{CheckError, CheckResult},
    mount::MountClient,
};

/// Printable name of an NFSv3 procedure number.
pub fn procedure_name(procedure: u32) -> String {
    NFSPROC3_NAMES
        .get(procedure as usize)
        .map(|name| (*name).to_owned())
        .unwrap_or_else(|| format!("NFSPROC3_{}", procedure))
}

/// First address `host` resolves to.
pub async fn resolve_host(host: &str) -> CheckResult<IpAddr> {
    if let Ok(ip) = host.parse() {
        return Ok(ip);
    }

    let mut addrs = tokio::net::lookup_host((host, 0))
        .await
        .map_err(|e| CheckError::Resolve(host.to_owned(), e))?;
    addrs.next().map(|addr| addr.ip()).ok_or_else(|| {
        CheckError::Resolve(
            host.to_owned(),
            IoError::new(ErrorKind::NotFound, "no address found"),
        )
    })
}

/// NFSv3 and MOUNTv3 clients of one server.
pub struct Nfs3Client {
    rpc: RpcClient,
    mount: MountClient,
    verifier: Verifier,
}

impl Nfs3Client {
    /// Resolve the MOUNT port, and the NFS port unless `port` is given, then
    /// build the clients. Connections are opened on first use.
    pub async fn connect(
        ip: IpAddr,
        port: Option<u16>,
        resolver: Arc<dyn PortResolver>,
        credential: Credential,
        timeout: Duration,
    ) -> RpcResult<Self> {
        let mount_port = resolver.resolve(MOUNT_PROGRAM, MOUNT_V3).await?;
        let port = match port {
            Some(port) => port,
            None => resolver.resolve(NFS_PROGRAM, NFS_V3).await?,
        };
        if log::log_enabled!(log::Level::Debug) {
            debug!("NFSv3 server {} on port {}, mount on port {}", ip, port, mount_port);
        }

        Ok(Self {
            rpc: RpcClient::new(SocketAddr::new(ip, port), NFS_PROGRAM, NFS_V3, credential.clone())
                .with_timeout(timeout),
            mount: MountClient::new(SocketAddr::new(ip, mount_port), credential, timeout),
            verifier: new_verifier(),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.rpc.addr()
    }

    pub fn mount(&self) -> &MountClient {
        &self.mount
    }

    // Write verifier of this client instance
    pub fn verifier(&self) -> Verifier {
        self.verifier
    }

    /// Default credential of every following call that doesn't bring its own.
    pub async fn set_cred(&self, credential: Credential) {
        self.rpc.set_credential(credential).await
    }

    pub async fn null(&self) -> RpcResult<()> {
        self.rpc.null().await
    }

    pub async fn proc_async<A: Serializer>(
        &self,
        procedure: u32,
        arg: &A,
        credential: Option<&Credential>,
    ) -> RpcResult<u32> {
        self.rpc.send_call(procedure, &arg.to_bytes(), credential).await
    }

    /// Wait for the reply of `xid` and decode it.
    pub async fn listen<R: Serializer>(&self, xid: u32, timeout: Option<Duration>) -> RpcResult<R> {
        let body = self.rpc.listen(xid, timeout, None).await?;
        Ok(R::from_bytes(&body)?)
    }

    // Reply body of `xid`, left undecoded
    pub async fn listen_raw(&self, xid: u32, timeout: Option<Duration>) -> RpcResult<Vec<u8>> {
        self.rpc.listen(xid, timeout, None).await
    }

    pub async fn proc<A: Serializer, R: Serializer>(
        &self,
        procedure: u32,
        arg: &A,
        credential: Option<&Credential>,
    ) -> RpcResult<R> {
        let xid = self.proc_async(procedure, arg, credential).await?;
        let body = self.rpc.listen(xid, None, credential).await?;
        Ok(R::from_bytes(&body)?)
    }

    /// Call `procedure` and require NFS3_OK. `R` decodes the `resok` arm,
    /// everything after the leading `nfsstat3`.
    pub async fn proc_ok<A: Serializer, R: Serializer>(
        &self,
        procedure: u32,
        arg: &A,
        credential: Option<&Credential>,
        context: Option<&str>,
    ) -> CheckResult<R> {
        let xid = self.proc_async(procedure, arg, credential).await?;
        let body = self.rpc.listen(xid, None, credential).await?;

        let mut reader = Reader::new(&body);
        let status = NfsStat3::read(&mut reader)?;
        check_res(&procedure_name(procedure), status, context)?;

        let value = R::read(&mut reader)?;
        if reader.size() != 0 {
            return Err(CheckError::Invalid(format!(
                "{} bytes left after the {} result",
                reader.size(),
                procedure_name(procedure)
            )));
        }
        Ok(value)
    }

    /// Stop waiting for the reply of `xid`, returns false if it was unknown.
    pub async fn abandon(&self, xid: u32) -> bool {
        self.rpc.abandon(xid).await
    }

    /// Root file handle of `export`.
    pub async fn mount_root(&self, export: &str) -> CheckResult<Bytes> {
        self.mount.get_root_fh(export).await
    }

    pub async fn close(&self) {
        self.rpc.close().await;
    }
}
