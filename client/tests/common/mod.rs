// Common test utilities: one in-process TCP server answering the port
// mapper, MOUNT and NFS programs on the same port.

#![allow(dead_code)]

use std::net::SocketAddr;

use nfstest_client::{mount::DirPath, portmap::Mapping};
use nfstest_common::{
    config::{MOUNT_PROGRAM, NFS_PROGRAM, PMAP_PROGRAM},
    rpc::{frame_record, parse_fragment_header, CallHeader, OpaqueAuth, ReplyHeader},
    serializer::{Reader, Serializer, Writer},
    status::MountStat3,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

pub const EXPORT: &str = "/export";
// mounts fine but hands out a zero length file handle
pub const EMPTY_EXPORT: &str = "/empty";
pub const ROOT_FH: [u8; 8] = [0xab; 8];

// NFS procedures of the mock: echo the arguments, report the credential flavor
pub const PROC_ECHO: u32 = 1;
pub const PROC_WHOAMI: u32 = 2;

async fn read_record(stream: &mut TcpStream) -> Option<Vec<u8>> {
    let mut record = Vec::new();
    loop {
        let marker = stream.read_u32().await.ok()?;
        let (last, len) = parse_fragment_header(marker);
        let start = record.len();
        record.resize(start + len, 0);
        stream.read_exact(&mut record[start..]).await.ok()?;
        if last {
            return Some(record);
        }
    }
}

fn mount_reply(args: &[u8]) -> Vec<u8> {
    let path = DirPath::from_bytes(args).unwrap();
    let mut writer = Writer::new();
    if path.0 == EXPORT || path.0 == EMPTY_EXPORT {
        let fh: &[u8] = if path.0 == EXPORT { &ROOT_FH } else { &[] };
        MountStat3::Ok.write(&mut writer);
        writer.write_opaque(fh);
        vec![1u32].write(&mut writer);
    } else {
        MountStat3::NoEnt.write(&mut writer);
    }
    writer.bytes()
}

fn dispatch(header: &CallHeader, args: &[u8], port: u16, nfs_registered: bool) -> Vec<u8> {
    match (header.program, header.procedure) {
        (_, 0) => Vec::new(),
        (PMAP_PROGRAM, _) => {
            let mapping = Mapping::from_bytes(args).unwrap();
            let registered = match mapping.program {
                MOUNT_PROGRAM => true,
                NFS_PROGRAM => nfs_registered,
                _ => false,
            };
            let port = if registered { port as u32 } else { 0 };
            port.to_bytes()
        }
        (MOUNT_PROGRAM, 1) => mount_reply(args),
        (MOUNT_PROGRAM, _) => Vec::new(),
        (NFS_PROGRAM, PROC_WHOAMI) => header.credential.flavor.to_bytes(),
        _ => args.to_vec(),
    }
}

async fn serve(mut stream: TcpStream, port: u16, nfs_registered: bool) {
    while let Some(record) = read_record(&mut stream).await {
        let mut reader = Reader::new(&record);
        let header = CallHeader::read(&mut reader).unwrap();
        let _verifier = OpaqueAuth::read(&mut reader).unwrap();
        let body = dispatch(&header, reader.read_remaining(), port, nfs_registered);

        let mut writer = Writer::new();
        ReplyHeader::success(header.xid).write(&mut writer);
        writer.write_raw(&body);
        if stream.write_all(&frame_record(&writer.bytes())).await.is_err() {
            break;
        }
    }
}

/// Start the mock server, returns its address.
pub async fn spawn_server(nfs_registered: bool) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(serve(stream, addr.port(), nfs_registered));
        }
    });
    addr
}
