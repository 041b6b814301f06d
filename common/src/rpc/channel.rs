use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use log::{debug, trace, warn};
use metrics::counter;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt, BufReader},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::{oneshot, Mutex},
    task::JoinHandle,
    time::timeout,
};

use super::{
    error::{RpcError, RpcResult},
    message::{frame_record, parse_fragment_header, peek_xid},
};
use crate::config::{CONNECT_TIMEOUT, MAX_PENDING_CALLS, MAX_RECORD_SIZE};

// Waiters of calls in flight, keyed by xid.
// The sender half is consumed by the reader task when the reply arrives,
// the receiver half by `listen`.
#[derive(Default)]
struct PendingCalls {
    senders: HashMap<u32, oneshot::Sender<Vec<u8>>>,
    receivers: HashMap<u32, oneshot::Receiver<Vec<u8>>>,
}

impl PendingCalls {
    fn contains(&self, xid: u32) -> bool {
        self.senders.contains_key(&xid) || self.receivers.contains_key(&xid)
    }

    // Calls still waiting for their reply. Replies that arrived but were
    // never listened for don't count.
    fn outstanding(&self) -> usize {
        self.senders.len()
    }
}

/// One TCP connection to an RPC server.
///
/// Calls are written with `send_call` and their replies collected with
/// `listen`. A background task reads every incoming record and hands it to
/// the waiter registered for its xid, so replies may arrive in any order and
/// waiters of different xids never block each other.
pub struct Channel {
    addr: SocketAddr,
    writer: Mutex<OwnedWriteHalf>,
    pending: Arc<Mutex<PendingCalls>>,
    active: Arc<AtomicBool>,
    reader_task: JoinHandle<()>,
}

impl Channel {
    pub async fn connect(addr: SocketAddr) -> RpcResult<Self> {
        if log::log_enabled!(log::Level::Debug) {
            debug!("Connecting to {}", addr);
        }
        let stream = match timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(RpcError::ConnectionError(addr, e)),
            Err(_) => return Err(RpcError::ConnectTimeout(addr)),
        };
        stream
            .set_nodelay(true)
            .map_err(|e| RpcError::ConnectionError(addr, e))?;
        counter!("nfstest_rpc_connections").increment(1u64);

        let (read, write) = stream.into_split();
        let pending = Arc::new(Mutex::new(PendingCalls::default()));
        let active = Arc::new(AtomicBool::new(true));
        let reader_task = tokio::spawn(Self::read_loop(
            addr,
            BufReader::new(read),
            Arc::clone(&pending),
            Arc::clone(&active),
        ));

        Ok(Self {
            addr,
            writer: Mutex::new(write),
            pending,
            active,
            reader_task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    // False once the connection failed or was closed
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Register a waiter for `xid` and write the already encoded call record.
    ///
    /// Never waits for the reply.
    pub async fn send_call(&self, xid: u32, record: &[u8]) -> RpcResult<()> {
        if !self.is_active() {
            return Err(RpcError::ChannelClosed(self.addr));
        }
        if record.len() > MAX_RECORD_SIZE {
            return Err(RpcError::RecordTooLarge(record.len(), MAX_RECORD_SIZE));
        }

        {
            let mut pending = self.pending.lock().await;
            if pending.contains(xid) {
                return Err(RpcError::XidInUse(xid));
            }
            if pending.outstanding() >= MAX_PENDING_CALLS {
                return Err(RpcError::TooManyPending(pending.outstanding()));
            }
            let (sender, receiver) = oneshot::channel();
            pending.senders.insert(xid, sender);
            pending.receivers.insert(xid, receiver);
        }

        let framed = frame_record(record);
        let res = {
            let mut writer = self.writer.lock().await;
            match writer.write_all(&framed).await {
                Ok(()) => writer.flush().await,
                Err(e) => Err(e),
            }
        };

        if let Err(e) = res {
            if log::log_enabled!(log::Level::Warn) {
                warn!("Error while sending call {:#010x} to {}: {}", xid, self.addr, e);
            }
            self.active.store(false, Ordering::Release);
            self.abandon(xid).await;
            return Err(RpcError::TransportError(e));
        }

        if log::log_enabled!(log::Level::Trace) {
            trace!("Sent call {:#010x} ({} bytes) to {}", xid, record.len(), self.addr);
        }
        counter!("nfstest_rpc_calls_sent").increment(1u64);
        Ok(())
    }

    /// Wait for the reply record of `xid`.
    ///
    /// On timeout the waiter is removed, a reply arriving afterwards is
    /// discarded by the reader task.
    pub async fn listen(&self, xid: u32, wait: Duration) -> RpcResult<Vec<u8>> {
        let receiver = {
            let mut pending = self.pending.lock().await;
            pending.receivers.remove(&xid).ok_or(RpcError::UnknownXid(xid))?
        };

        match timeout(wait, receiver).await {
            Ok(Ok(record)) => Ok(record),
            // sender dropped: the connection went away before the reply
            Ok(Err(_)) => Err(RpcError::ChannelClosed(self.addr)),
            Err(_) => {
                if log::log_enabled!(log::Level::Warn) {
                    warn!("Call {:#010x} to {} has timed out after {:?}", xid, self.addr, wait);
                }
                counter!("nfstest_rpc_timeouts").increment(1u64);
                self.abandon(xid).await;
                Err(RpcError::Timeout { xid, timeout: wait })
            }
        }
    }

    // Number of calls sent whose reply didn't arrive yet
    pub async fn pending_calls(&self) -> usize {
        self.pending.lock().await.outstanding()
    }

    pub async fn close(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            if log::log_enabled!(log::Level::Debug) {
                debug!("Closing channel to {}", self.addr);
            }
        }
        self.reader_task.abort();
        {
            let mut pending = self.pending.lock().await;
            pending.senders.clear();
        }
        if let Err(e) = self.writer.lock().await.shutdown().await {
            if log::log_enabled!(log::Level::Debug) {
                debug!("Error while shutting down channel to {}: {}", self.addr, e);
            }
        }
    }

    /// Give up on the call `xid`: its reply, delivered or not, is dropped and
    /// the xid may be used again. Returns false if nothing was registered.
    pub async fn abandon(&self, xid: u32) -> bool {
        let mut pending = self.pending.lock().await;
        let sender = pending.senders.remove(&xid);
        let receiver = pending.receivers.remove(&xid);
        sender.is_some() || receiver.is_some()
    }

    // Read a complete record, reassembling fragments
    async fn read_record(reader: &mut BufReader<OwnedReadHalf>) -> RpcResult<Vec<u8>> {
        let mut record = Vec::new();
        loop {
            let marker = reader.read_u32().await?;
            let (last, len) = parse_fragment_header(marker);
            if record.len() + len > MAX_RECORD_SIZE {
                return Err(RpcError::RecordTooLarge(record.len() + len, MAX_RECORD_SIZE));
            }

            let start = record.len();
            record.resize(start + len, 0);
            reader.read_exact(&mut record[start..]).await?;
            if last {
                return Ok(record);
            }
        }
    }

    async fn read_loop(
        addr: SocketAddr,
        mut reader: BufReader<OwnedReadHalf>,
        pending: Arc<Mutex<PendingCalls>>,
        active: Arc<AtomicBool>,
    ) {
        loop {
            let record = match Self::read_record(&mut reader).await {
                Ok(record) => record,
                Err(e) => {
                    if log::log_enabled!(log::Level::Debug) {
                        debug!("Channel to {} stopped reading: {}", addr, e);
                    }
                    break;
                }
            };

            let Some(xid) = peek_xid(&record) else {
                if log::log_enabled!(log::Level::Debug) {
                    debug!("Discarding record of {} bytes without xid from {}", record.len(), addr);
                }
                counter!("nfstest_rpc_frames_discarded").increment(1u64);
                continue;
            };

            let sender = pending.lock().await.senders.remove(&xid);
            match sender {
                Some(sender) => {
                    if sender.send(record).is_err() {
                        // the waiter gave up between the lookup and the send
                        counter!("nfstest_rpc_frames_discarded").increment(1u64);
                    } else {
                        counter!("nfstest_rpc_replies_delivered").increment(1u64);
                    }
                }
                None => {
                    if log::log_enabled!(log::Level::Debug) {
                        debug!("Discarding reply for unknown xid {:#010x} from {}", xid, addr);
                    }
                    counter!("nfstest_rpc_frames_discarded").increment(1u64);
                }
            }
        }

        active.store(false, Ordering::Release);
        // wake up every waiter still registered
        pending.lock().await.senders.clear();
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}
