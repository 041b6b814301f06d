mod common;

use std::{collections::HashSet, sync::Arc, time::Duration};

use futures::future::join_all;
use nfstest_common::{
    config::{MAX_PENDING_CALLS, MAX_RECORD_SIZE},
    rpc::{AcceptStat, CallHeader, Channel, Credential, OpaqueAuth, RpcClient, RpcError},
    serializer::{Serializer, Writer},
};
use tokio::time::sleep;

use common::*;

const PROGRAM: u32 = 400123;
const VERSION: u32 = 1;

fn call_record(xid: u32, args: &[u8]) -> Vec<u8> {
    let header = CallHeader {
        xid,
        program: PROGRAM,
        version: VERSION,
        procedure: 1,
        credential: OpaqueAuth::none(),
    };
    let mut writer = Writer::new();
    header.write(&mut writer);
    OpaqueAuth::none().write(&mut writer);
    writer.write_raw(args);
    writer.bytes()
}

#[tokio::test]
async fn test_call_roundtrip() {
    let addr = spawn_echo_server().await;
    let client = RpcClient::new(addr, PROGRAM, VERSION, Credential::None);

    let value: u32 = client.call(1, &42u32, None, None).await.unwrap();
    assert_eq!(value, 42);
    client.null().await.unwrap();
    assert!(client.is_connected().await);
}

#[tokio::test]
async fn test_replies_in_reverse_order() {
    let (listener, addr) = bind().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let first = read_call(&mut stream).await.unwrap();
        let second = read_call(&mut stream).await.unwrap();
        send_reply(&mut stream, second.header.xid, &second.args).await;
        send_reply(&mut stream, first.header.xid, &first.args).await;
        // keep the connection open until the client is done
        let _ = read_call(&mut stream).await;
    });

    let client = RpcClient::new(addr, PROGRAM, VERSION, Credential::None);
    let (a, b) = tokio::join!(
        client.call::<u32, u32>(1, &1, None, None),
        client.call::<u32, u32>(1, &2, None, None)
    );
    assert_eq!(a.unwrap(), 1);
    assert_eq!(b.unwrap(), 2);
}

#[tokio::test]
async fn test_split_send_and_listen() {
    let addr = spawn_echo_server().await;
    let client = RpcClient::new(addr, PROGRAM, VERSION, Credential::None);

    let first = client.send_call(1, &encode(&10u32), None).await.unwrap();
    let second = client.send_call(1, &encode(&20u32), None).await.unwrap();
    assert_ne!(first, second);

    // listen in the opposite order of sending
    let body = client.listen(second, None, None).await.unwrap();
    assert_eq!(u32::from_bytes(&body).unwrap(), 20);
    let body = client.listen(first, None, None).await.unwrap();
    assert_eq!(u32::from_bytes(&body).unwrap(), 10);

    // consumed replies can't be listened for again
    let err = client.listen(first, None, None).await.unwrap_err();
    assert!(matches!(err, RpcError::UnknownXid(xid) if xid == first));
}

#[tokio::test]
async fn test_timeout_discards_late_reply() {
    let (listener, addr) = bind().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut count = 0u32;
        while let Some(call) = read_call(&mut stream).await {
            count += 1;
            if count == 1 {
                sleep(Duration::from_millis(200)).await;
            }
            send_reply(&mut stream, call.header.xid, &encode(&count)).await;
        }
    });

    let channel = Channel::connect(addr).await.unwrap();
    channel.send_call(5, &call_record(5, &[])).await.unwrap();
    let err = channel.listen(5, Duration::from_millis(50)).await.unwrap_err();
    assert!(matches!(err, RpcError::Timeout { xid: 5, .. }));
    assert_eq!(channel.pending_calls().await, 0);

    // the first reply arrives while nobody waits for xid 5
    sleep(Duration::from_millis(400)).await;

    channel.send_call(5, &call_record(5, &[])).await.unwrap();
    let record = channel.listen(5, Duration::from_secs(2)).await.unwrap();
    // reply header: xid, REPLY, ACCEPTED, verifier (8), SUCCESS, then body
    assert_eq!(&record[24..28], &2u32.to_be_bytes());
}

#[tokio::test]
async fn test_xid_in_flight_is_refused() {
    let (listener, addr) = bind().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        while read_call(&mut stream).await.is_some() {}
    });

    let channel = Channel::connect(addr).await.unwrap();
    channel.send_call(9, &call_record(9, &[])).await.unwrap();
    let err = channel.send_call(9, &call_record(9, &[])).await.unwrap_err();
    assert!(matches!(err, RpcError::XidInUse(9)));
}

#[tokio::test]
async fn test_fragmented_reply() {
    let (listener, addr) = bind().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        while let Some(call) = read_call(&mut stream).await {
            send_fragmented_reply(&mut stream, call.header.xid, &call.args).await;
        }
    });

    let client = RpcClient::new(addr, PROGRAM, VERSION, Credential::None);
    let value: String = client
        .call(1, &"fragmented reply".to_owned(), None, None)
        .await
        .unwrap();
    assert_eq!(value, "fragmented reply");
}

#[tokio::test]
async fn test_accept_errors_are_surfaced() {
    let (listener, addr) = bind().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        while let Some(call) = read_call(&mut stream).await {
            send_accept_error(&mut stream, call.header.xid, AcceptStat::ProcUnavail).await;
        }
    });

    let client = RpcClient::new(addr, PROGRAM, VERSION, Credential::None);
    let err = client.call::<(), ()>(77, &(), None, None).await.unwrap_err();
    assert!(matches!(err, RpcError::CallFailed(AcceptStat::ProcUnavail)));
}

#[tokio::test]
async fn test_concurrent_calls_get_their_own_reply() {
    let addr = spawn_echo_server().await;
    let client = Arc::new(RpcClient::new(addr, PROGRAM, VERSION, Credential::None));

    let calls = (0..64u32).map(|i| {
        let client = client.clone();
        async move {
            let xid = client.send_call(1, &encode(&i), None).await.unwrap();
            let body = client.listen(xid, None, None).await.unwrap();
            (xid, i, u32::from_bytes(&body).unwrap())
        }
    });

    let mut xids = HashSet::new();
    for (xid, sent, received) in join_all(calls).await {
        assert_eq!(sent, received);
        assert!(xids.insert(xid));
    }
}

#[tokio::test]
async fn test_reconnects_once_after_connection_loss() {
    let (listener, addr) = bind().await;
    tokio::spawn(async move {
        // first connection dies after reading one call
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ = read_call(&mut stream).await;
        drop(stream);

        let (mut stream, _) = listener.accept().await.unwrap();
        while let Some(call) = read_call(&mut stream).await {
            send_reply(&mut stream, call.header.xid, &call.args).await;
        }
    });

    let client = RpcClient::new(addr, PROGRAM, VERSION, Credential::None)
        .with_timeout(Duration::from_secs(2));
    let err = client.call::<u32, u32>(1, &1, None, None).await.unwrap_err();
    assert!(matches!(err, RpcError::ChannelClosed(_)));

    let value: u32 = client.call(1, &2u32, None, None).await.unwrap();
    assert_eq!(value, 2);
}

#[tokio::test]
async fn test_connection_refused() {
    // grab a free port and release it
    let (listener, addr) = bind().await;
    drop(listener);

    let client = RpcClient::new(addr, PROGRAM, VERSION, Credential::None);
    let err = client.null().await.unwrap_err();
    assert!(matches!(err, RpcError::ConnectionError(_, _)));

    // a second attempt fails again instead of looping
    let err = client.null().await.unwrap_err();
    assert!(matches!(err, RpcError::ConnectionError(_, _)));
}

#[tokio::test]
async fn test_auth_sys_credential_reaches_server() {
    let (listener, addr) = bind().await;
    let (tx, rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let call = read_call(&mut stream).await.unwrap();
        send_reply(&mut stream, call.header.xid, &[]).await;
        let _ = tx.send(call.header.credential);
        let _ = read_call(&mut stream).await;
    });

    let credential = Credential::sys("tester", 1000, 1000, vec![10, 20]).unwrap();
    let client = RpcClient::new(addr, PROGRAM, VERSION, credential);
    client.null().await.unwrap();

    let received = rx.await.unwrap();
    assert_eq!(received.flavor, 1);
    assert!(!received.body.is_empty());
}

#[tokio::test]
async fn test_oversized_call_keeps_channel() {
    let addr = spawn_echo_server().await;
    let client = RpcClient::new(addr, PROGRAM, VERSION, Credential::None);

    let in_flight = client.send_call(1, &encode(&7u32), None).await.unwrap();
    let err = client
        .send_call(1, &vec![0u8; MAX_RECORD_SIZE + 1], None)
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::RecordTooLarge(_, MAX_RECORD_SIZE)));
    assert!(!err.is_transport());

    // the call sent before is still served on the same connection
    let body = client.listen(in_flight, None, None).await.unwrap();
    assert_eq!(u32::from_bytes(&body).unwrap(), 7);
}

#[tokio::test]
async fn test_unread_replies_dont_exhaust_the_channel() {
    let addr = spawn_echo_server().await;
    let channel = Channel::connect(addr).await.unwrap();

    let count = MAX_PENDING_CALLS as u32;
    for xid in 1..=count {
        channel.send_call(xid, &call_record(xid, &[])).await.unwrap();
    }
    // every reply arrives, none is listened for
    for _ in 0..200 {
        if channel.pending_calls().await == 0 {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(channel.pending_calls().await, 0);

    let xid = count + 1;
    channel.send_call(xid, &call_record(xid, &[])).await.unwrap();
    channel.listen(xid, Duration::from_secs(2)).await.unwrap();

    // a delivered reply is still held until it is listened for or abandoned
    let err = channel.send_call(1, &call_record(1, &[])).await.unwrap_err();
    assert!(matches!(err, RpcError::XidInUse(1)));
    assert!(channel.abandon(1).await);
    assert!(!channel.abandon(1).await);
    channel.send_call(1, &call_record(1, &[])).await.unwrap();
    channel.listen(1, Duration::from_secs(2)).await.unwrap();
}

#[tokio::test]
async fn test_abandoned_call() {
    let addr = spawn_echo_server().await;
    let client = RpcClient::new(addr, PROGRAM, VERSION, Credential::None);
    assert!(!client.abandon(42).await);

    let xid = client.send_call(1, &encode(&1u32), None).await.unwrap();
    assert!(client.abandon(xid).await);
    let err = client.listen(xid, None, None).await.unwrap_err();
    assert!(matches!(err, RpcError::UnknownXid(x) if x == xid));

    // the channel keeps working
    let value: u32 = client.call(1, &5u32, None, None).await.unwrap();
    assert_eq!(value, 5);
}
