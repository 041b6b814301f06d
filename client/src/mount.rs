//! MOUNT v3 client, used to get the root file handle of an export.

use std::{net::SocketAddr, time::Duration};

use bytes::Bytes;
use log::info;

use nfstest_common::{
    config::{FHSIZE3, MNTPATHLEN, MOUNTPROC3_MNT, MOUNTPROC3_UMNT, MOUNT_PROGRAM, MOUNT_V3},
    rpc::{Credential, RpcClient, RpcResult},
    serializer::{Reader, ReaderError, Serializer, Writer},
    status::MountStat3,
};

use crate::{
    environment::check,
    error::{CheckError, CheckResult},
};

/// `dirpath` argument of MNT and UMNT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirPath(pub String);

impl Serializer for DirPath {
    fn write(&self, writer: &mut Writer) {
        writer.write_string(&self.0);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_string(Some(MNTPATHLEN)).map(Self)
    }
}

/// `mountres3_ok`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    pub fhandle: Bytes,
    pub auth_flavors: Vec<u32>,
}

/// `mountres3`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRes {
    pub status: MountStat3,
    pub info: Option<MountInfo>,
}

impl Serializer for MountRes {
    fn write(&self, writer: &mut Writer) {
        self.status.write(writer);
        if let Some(info) = &self.info {
            writer.write_opaque(&info.fhandle);
            info.auth_flavors.write(writer);
        }
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let status = MountStat3::read(reader)?;
        let info = match status {
            MountStat3::Ok => Some(MountInfo {
                fhandle: Bytes::from(reader.read_opaque(Some(FHSIZE3))?),
                auth_flavors: Vec::read(reader)?,
            }),
            _ => None,
        };
        Ok(Self { status, info })
    }
}

pub struct MountClient {
    rpc: RpcClient,
}

impl MountClient {
    pub fn new(addr: SocketAddr, credential: Credential, timeout: Duration) -> Self {
        Self {
            rpc: RpcClient::new(addr, MOUNT_PROGRAM, MOUNT_V3, credential).with_timeout(timeout),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.rpc.addr()
    }

    pub async fn null(&self) -> RpcResult<()> {
        self.rpc.null().await
    }

    pub async fn mnt(&self, path: &str) -> RpcResult<MountRes> {
        self.rpc
            .call(MOUNTPROC3_MNT, &DirPath(path.to_owned()), None, None)
            .await
    }

    pub async fn umnt(&self, path: &str) -> RpcResult<()> {
        self.rpc
            .call(MOUNTPROC3_UMNT, &DirPath(path.to_owned()), None, None)
            .await
    }

    /// Mount `export` and return its root file handle.
    pub async fn get_root_fh(&self, export: &str) -> CheckResult<Bytes> {
        if log::log_enabled!(log::Level::Info) {
            info!("Mount path {}", export);
        }
        let res = self.mnt(export).await?;
        check(
            res.status,
            &[MountStat3::Ok],
            &format!("Mount failed on {}", export),
            &[],
        )?;

        match res.info {
            Some(info) if !info.fhandle.is_empty() => Ok(info.fhandle),
            _ => Err(CheckError::Unexpected(format!(
                "Mount of {} returned an empty file handle",
                export
            ))),
        }
    }
}
