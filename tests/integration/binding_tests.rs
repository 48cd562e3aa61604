//! Bound-object dispatch: shared and exclusive receivers.

use std::cell::Cell;

use lockstep_rpc::rpc::codec::{from_bytes, to_bytes};
use lockstep_rpc::rpc::envelope::encode_request;
use lockstep_rpc::rpc::{Client, MemoryChannel, Reply, ServiceRegistry, Server};

struct Counter {
    total: i64,
}

impl Counter {
    fn bump(&mut self, by: i64) -> i64 {
        self.total += by;
        self.total
    }

    fn peek(&self) -> i64 {
        self.total
    }
}

struct Ledger {
    entries: Cell<u32>,
}

impl Ledger {
    fn record(&self, _label: String) {
        self.entries.set(self.entries.get() + 1);
    }
}

#[test]
fn mutation_through_bound_method_is_observable_afterwards() {
    let mut counter = Counter { total: 0 };
    {
        let mut registry = ServiceRegistry::new();
        registry.register_method_mut("bump", &mut counter, Counter::bump);
        let mut server = Server::new(registry);

        for by in [5i64, 7, -2] {
            let reply = server.handle(&encode_request("bump", &(by,)));
            assert!(matches!(Reply::decode(&reply).unwrap(), Reply::Ok(_)));
        }
    }
    assert_eq!(counter.total, 10);
    assert_eq!(counter.peek(), 10);
}

#[test]
fn shared_receiver_with_interior_state() {
    let ledger = Ledger {
        entries: Cell::new(0),
    };
    let mut registry = ServiceRegistry::new();
    registry.register_method("record", &ledger, Ledger::record);

    for label in ["a", "b", "c"] {
        let reply = registry.handle_request(&encode_request("record", &(label,)));
        assert_eq!(reply, Reply::Ok(Vec::new()));
    }
    drop(registry);
    assert_eq!(ledger.entries.get(), 3);
}

#[test]
fn same_object_bound_under_two_ids() {
    let counter = Counter { total: 41 };
    let mut registry = ServiceRegistry::new();
    registry.register_method("peek", &counter, Counter::peek);
    registry.register_method("peek_plus", &counter, |c: &Counter, n: i64| c.peek() + n);

    let Reply::Ok(a) = registry.handle_request(&encode_request("peek", &())) else {
        panic!("peek failed");
    };
    let Reply::Ok(b) = registry.handle_request(&encode_request("peek_plus", &(1i64,))) else {
        panic!("peek_plus failed");
    };
    assert_eq!(from_bytes::<i64>(&a).unwrap(), 41);
    assert_eq!(b, to_bytes(&42i64));
}

#[test]
fn bound_method_over_channel() {
    let (server_end, client_end) = MemoryChannel::pair();
    let mut counter = Counter { total: 100 };
    std::thread::scope(|scope| {
        scope.spawn(|| {
            let mut server_end = server_end;
            let mut registry = ServiceRegistry::new();
            registry.register_method_mut("bump", &mut counter, Counter::bump);
            Server::new(registry).serve(&mut server_end).unwrap();
        });

        let mut client = Client::new(client_end);
        let total: i64 = client.call("bump", (1i64,)).unwrap();
        assert_eq!(total, 101);
        drop(client);
    });
    assert_eq!(counter.total, 101);
}
