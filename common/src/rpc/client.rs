use std::{net::SocketAddr, sync::Arc, time::Duration};

use log::{debug, warn};
use metrics::counter;
use tokio::sync::{Mutex, RwLock};

use super::{
    auth::Credential,
    channel::Channel,
    error::{RpcError, RpcResult},
    message::{AcceptStat, CallHeader, OpaqueAuth, ReplyBody, ReplyHeader},
    xid::XidGenerator,
};
use crate::{
    config::DEFAULT_CALL_TIMEOUT,
    serializer::{Reader, Serializer, Writer},
};

/// Call dispatcher bound to one remote program/version.
///
/// The channel is opened on first use. When it is found stale the client
/// reconnects once; if the fresh connection fails as well the error is
/// returned to the caller.
pub struct RpcClient {
    addr: SocketAddr,
    program: u32,
    version: u32,
    credential: RwLock<Credential>,
    channel: Mutex<Option<Arc<Channel>>>,
    xids: XidGenerator,
    timeout: Duration,
}

impl RpcClient {
    pub fn new(addr: SocketAddr, program: u32, version: u32, credential: Credential) -> Self {
        Self {
            addr,
            program,
            version,
            credential: RwLock::new(credential),
            channel: Mutex::new(None),
            xids: XidGenerator::new(),
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn program(&self) -> (u32, u32) {
        (self.program, self.version)
    }

    pub fn default_timeout(&self) -> Duration {
        self.timeout
    }

    pub fn new_transaction_id(&self) -> u32 {
        self.xids.next()
    }

    pub async fn credential(&self) -> Credential {
        self.credential.read().await.clone()
    }

    // Replace the default credential used when a call doesn't bring its own
    pub async fn set_credential(&self, credential: Credential) {
        *self.credential.write().await = credential;
    }

    // Returns the channel and whether it was opened by this call
    async fn channel(&self) -> RpcResult<(Arc<Channel>, bool)> {
        let mut guard = self.channel.lock().await;
        if let Some(channel) = guard.as_ref() {
            if channel.is_active() {
                return Ok((Arc::clone(channel), false));
            }
            if log::log_enabled!(log::Level::Debug) {
                debug!("Channel to {} is stale, reconnecting", self.addr);
            }
            counter!("nfstest_rpc_reconnects").increment(1u64);
        }

        let channel = Arc::new(Channel::connect(self.addr).await?);
        *guard = Some(Arc::clone(&channel));
        Ok((channel, true))
    }

    // Replace `stale` unless another caller already did
    async fn reconnect(&self, stale: &Arc<Channel>) -> RpcResult<Arc<Channel>> {
        let mut guard = self.channel.lock().await;
        if let Some(current) = guard.as_ref() {
            if !Arc::ptr_eq(current, stale) && current.is_active() {
                return Ok(Arc::clone(current));
            }
        }
        stale.close().await;
        counter!("nfstest_rpc_reconnects").increment(1u64);

        let channel = Arc::new(Channel::connect(self.addr).await?);
        *guard = Some(Arc::clone(&channel));
        Ok(channel)
    }

    fn encode_call(
        &self,
        xid: u32,
        procedure: u32,
        args: &[u8],
        credential: &Credential,
    ) -> RpcResult<Vec<u8>> {
        let mut header = CallHeader {
            xid,
            program: self.program,
            version: self.version,
            procedure,
            credential: OpaqueAuth::none(),
        };
        let verifier = credential.apply_to(&mut header)?;

        let mut writer = Writer::with_capacity(args.len() + 64);
        header.write(&mut writer);
        verifier.write(&mut writer);
        writer.write_raw(args);
        Ok(writer.bytes())
    }

    /// Encode and send one call, returns its xid without waiting for the reply.
    pub async fn send_call(
        &self,
        procedure: u32,
        args: &[u8],
        credential: Option<&Credential>,
    ) -> RpcResult<u32> {
        let xid = self.new_transaction_id();
        let record = match credential {
            Some(credential) => self.encode_call(xid, procedure, args, credential)?,
            None => self.encode_call(xid, procedure, args, &*self.credential.read().await)?,
        };

        let (channel, fresh) = self.channel().await?;
        match channel.send_call(xid, &record).await {
            Ok(()) => Ok(xid),
            Err(e) if e.is_transport() && !fresh => {
                if log::log_enabled!(log::Level::Warn) {
                    warn!("Sending to {} failed ({}), reconnecting once", self.addr, e);
                }
                let channel = self.reconnect(&channel).await?;
                channel.send_call(xid, &record).await?;
                Ok(xid)
            }
            Err(e) => Err(e),
        }
    }

    /// Wait for the reply of `xid` and return its body, after the reply
    /// header was checked.
    pub async fn listen(
        &self,
        xid: u32,
        timeout: Option<Duration>,
        credential: Option<&Credential>,
    ) -> RpcResult<Vec<u8>> {
        let channel = {
            let guard = self.channel.lock().await;
            guard.clone().ok_or(RpcError::ChannelClosed(self.addr))?
        };
        let record = channel.listen(xid, timeout.unwrap_or(self.timeout)).await?;

        let mut reader = Reader::new(&record);
        let header = ReplyHeader::read(&mut reader)?;
        if header.xid != xid {
            return Err(RpcError::XidMismatch {
                expected: xid,
                got: header.xid,
            });
        }

        match header.body {
            ReplyBody::Accepted {
                verifier,
                stat: AcceptStat::Success,
                ..
            } => {
                match credential {
                    Some(credential) => credential.verify_reply(&verifier)?,
                    None => self.credential.read().await.verify_reply(&verifier)?,
                }
                Ok(reader.read_remaining().to_vec())
            }
            ReplyBody::Accepted {
                stat: AcceptStat::ProgMismatch,
                mismatch,
                ..
            } => {
                let (low, high) = mismatch.unwrap_or((0, 0));
                Err(RpcError::ProgramMismatch { low, high })
            }
            ReplyBody::Accepted { stat, .. } => Err(RpcError::CallFailed(stat)),
            ReplyBody::RpcMismatch { low, high } => Err(RpcError::RpcMismatch { low, high }),
            ReplyBody::AuthError(stat) => Err(RpcError::AuthError(stat)),
        }
    }

    /// Drop the call `xid` sent with `send_call` without waiting for its
    /// reply, the xid becomes free again.
    pub async fn abandon(&self, xid: u32) -> bool {
        let channel = self.channel.lock().await.clone();
        match channel {
            Some(channel) => channel.abandon(xid).await,
            None => false,
        }
    }

    /// `send_call` + `listen` + decode.
    pub async fn call<A: Serializer, R: Serializer>(
        &self,
        procedure: u32,
        arg: &A,
        credential: Option<&Credential>,
        timeout: Option<Duration>,
    ) -> RpcResult<R> {
        let xid = self.send_call(procedure, &arg.to_bytes(), credential).await?;
        let body = self.listen(xid, timeout, credential).await?;
        Ok(R::from_bytes(&body)?)
    }

    // NULL procedure of any program
    pub async fn null(&self) -> RpcResult<()> {
        self.call::<(), ()>(0, &(), None, None).await
    }

    pub async fn is_connected(&self) -> bool {
        match self.channel.lock().await.as_ref() {
            Some(channel) => channel.is_active(),
            None => false,
        }
    }

    pub async fn close(&self) {
        if let Some(channel) = self.channel.lock().await.take() {
            channel.close().await;
        }
    }
}
