//! Fuzz target: `ServiceRegistry::handle_request`
//!
//! Arbitrary request bytes against a registry with a spread of argument
//! shapes. Every input must produce a reply that decodes again; nothing
//! may panic or over-read.
//!
//! cargo fuzz run fuzz_handle_request

#![no_main]

use std::collections::BTreeMap;

use libfuzzer_sys::fuzz_target;
use lockstep_rpc::rpc::{Reply, ServiceRegistry};

fuzz_target!(|data: &[u8]| {
    let mut registry = ServiceRegistry::new();
    registry.register("add", |a: i32, b: i32| a.wrapping_add(b));
    registry.register("echo", |s: String| s);
    registry.register("sum", |v: Vec<u64>| v.iter().fold(0u64, |acc, x| acc.wrapping_add(*x)));
    registry.register("keys", |m: BTreeMap<String, (u8, char)>| m.len());
    registry.register("flags", |b: bool, c: char, arr: [u16; 3]| (b, c, arr));
    registry.register("noop", || ());

    let reply = registry.handle_request(data).encode();
    assert!(Reply::decode(&reply).is_ok(), "reply must round-trip");
});
