// Common test utilities: an in-process RPC server speaking record marking
// over TCP, driven by a per connection script.

#![allow(dead_code)]

use std::net::SocketAddr;

use nfstest_common::{
    rpc::{frame_record, parse_fragment_header, AcceptStat, CallHeader, OpaqueAuth, ReplyBody, ReplyHeader},
    serializer::{Reader, Serializer, Writer},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

/// A decoded call as seen by the mock server.
pub struct ReceivedCall {
    pub header: CallHeader,
    pub verifier: OpaqueAuth,
    pub args: Vec<u8>,
}

pub async fn bind() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Read one record, `None` once the client hung up.
pub async fn read_call(stream: &mut TcpStream) -> Option<ReceivedCall> {
    let mut record = Vec::new();
    loop {
        let marker = stream.read_u32().await.ok()?;
        let (last, len) = parse_fragment_header(marker);
        let start = record.len();
        record.resize(start + len, 0);
        stream.read_exact(&mut record[start..]).await.ok()?;
        if last {
            break;
        }
    }

    let mut reader = Reader::new(&record);
    let header = CallHeader::read(&mut reader).unwrap();
    let verifier = OpaqueAuth::read(&mut reader).unwrap();
    let args = reader.read_remaining().to_vec();
    Some(ReceivedCall {
        header,
        verifier,
        args,
    })
}

pub fn reply_record(header: &ReplyHeader, body: &[u8]) -> Vec<u8> {
    let mut writer = Writer::new();
    header.write(&mut writer);
    writer.write_raw(body);
    writer.bytes()
}

pub async fn send_reply(stream: &mut TcpStream, xid: u32, body: &[u8]) {
    let record = reply_record(&ReplyHeader::success(xid), body);
    stream.write_all(&frame_record(&record)).await.unwrap();
}

// Same reply split over two fragments
pub async fn send_fragmented_reply(stream: &mut TcpStream, xid: u32, body: &[u8]) {
    let record = reply_record(&ReplyHeader::success(xid), body);
    let (first, second) = record.split_at(record.len() / 2);
    let mut out = Vec::new();
    out.extend_from_slice(&(first.len() as u32).to_be_bytes());
    out.extend_from_slice(first);
    out.extend_from_slice(&frame_record(second));
    stream.write_all(&out).await.unwrap();
}

pub async fn send_accept_error(stream: &mut TcpStream, xid: u32, stat: AcceptStat) {
    let header = ReplyHeader {
        xid,
        body: ReplyBody::Accepted {
            verifier: OpaqueAuth::none(),
            stat,
            mismatch: None,
        },
    };
    stream
        .write_all(&frame_record(&reply_record(&header, &[])))
        .await
        .unwrap();
}

/// Echo server: every call is answered with its own arguments.
pub async fn spawn_echo_server() -> SocketAddr {
    let (listener, addr) = bind().await;
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                while let Some(call) = read_call(&mut stream).await {
                    send_reply(&mut stream, call.header.xid, &call.args).await;
                }
            });
        }
    });
    addr
}

pub fn encode<T: Serializer>(value: &T) -> Vec<u8> {
    value.to_bytes()
}
