//! Lock-step sessions: error replies, void calls, replacement, timeouts.

use std::time::Duration;

use lockstep_rpc::rpc::codec::to_bytes;
use lockstep_rpc::rpc::envelope::encode_request;
use lockstep_rpc::rpc::{Channel, Client, MemoryChannel, Reply, ServeExit};
use lockstep_rpc::{Error, RemoteErrorKind, TransportError};

use crate::harness::serve_with;

#[test]
fn void_service_replies_with_empty_payload() {
    let (mut client, server) = serve_with(|reg| {
        reg.register("ping", || ());
        reg.register("one", || 1u8);
    });

    let raw = client.channel_mut();
    raw.send(&encode_request("ping", &())).unwrap();
    assert_eq!(Reply::decode(&raw.receive().unwrap()).unwrap(), Reply::Ok(Vec::new()));

    client.call::<(), _>("ping", ()).unwrap();
    let one: u8 = client.call("one", ()).unwrap();
    assert_eq!(one, 1);

    drop(client);
    let (exit, handled) = server.join().unwrap();
    assert_eq!(exit, ServeExit::ChannelClosed);
    assert_eq!(handled, 3);
}

#[test]
fn later_registration_replaces_earlier() {
    let (mut client, server) = serve_with(|reg| {
        reg.register("op", |a: i32, b: i32| a + b);
        reg.register("op", |a: i32, b: i32| a * b);
    });

    let v: i32 = client.call("op", (6i32, 7i32)).unwrap();
    assert_eq!(v, 42);

    drop(client);
    server.join().unwrap();
}

#[test]
fn failures_do_not_break_the_session() {
    let (mut client, server) = serve_with(|reg| {
        reg.register("len", |s: String| s.len() as u32);
    });

    let err = client.call::<u32, _>("LEN", ("abc",)).unwrap_err();
    assert!(matches!(&err, Error::Remote(e) if e.kind == RemoteErrorKind::UnknownService));
    assert!(err.to_string().contains("LEN"));

    let err = client.call::<u32, _>("len", ()).unwrap_err();
    assert!(matches!(err, Error::Remote(e) if e.kind == RemoteErrorKind::DecodeUnderrun));

    let bad_utf8 = {
        let mut args = to_bytes(&2usize);
        args.extend([0xC3, 0x28]);
        args
    };
    let raw = client.channel_mut();
    let mut request = to_bytes("len");
    request.extend(bad_utf8);
    raw.send(&request).unwrap();
    let Reply::Err(e) = Reply::decode(&raw.receive().unwrap()).unwrap() else {
        panic!("invalid UTF-8 must be rejected");
    };
    assert_eq!(e.kind, RemoteErrorKind::BadRequest);

    let n: u32 = client.call("len", ("four",)).unwrap();
    assert_eq!(n, 4);

    drop(client);
    server.join().unwrap();
}

#[test]
fn lost_reply_desynchronises_client() {
    let (client_end, mut server_end) = MemoryChannel::pair();
    let mut client = Client::new(client_end.with_recv_timeout(Duration::from_millis(10)));

    let err = client.call::<i32, _>("slow", ()).unwrap_err();
    assert_eq!(err, Error::Transport(TransportError::TimedOut));

    // The late reply would be read by the next call; the client refuses instead.
    server_end.send(&Reply::Ok(to_bytes(&1i32)).encode()).unwrap();
    let err = client.call::<i32, _>("fast", ()).unwrap_err();
    assert_eq!(err, Error::Transport(TransportError::OutOfSync));
    assert!(!client.is_in_sync());
}

#[test]
fn panicking_handler_does_not_end_the_serve_loop() {
    let (mut client, server) = serve_with(|reg| {
        reg.register("add", |a: i32, b: i32| {
            a.checked_add(b).unwrap_or_else(|| panic!("add overflowed"))
        });
    });

    let err = client.call::<i32, _>("add", (i32::MAX, 1i32)).unwrap_err();
    let e = match err {
        Error::Remote(e) => e,
        other => panic!("expected an error reply, got {other:?}"),
    };
    assert_eq!(e.kind, RemoteErrorKind::HandlerPanicked);
    assert!(e.message.contains("add overflowed"));

    let sum: i32 = client.call("add", (2i32, 3i32)).unwrap();
    assert_eq!(sum, 5);

    drop(client);
    let (exit, handled) = server.join().unwrap();
    assert_eq!(exit, ServeExit::ChannelClosed);
    assert_eq!(handled, 2);
}
