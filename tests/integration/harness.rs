//! Shared fixture: a server thread on one end of a memory channel pair.

use std::thread;

use lockstep_rpc::rpc::{Client, MemoryChannel, ServeExit, ServiceRegistry, Server};

/// Run `setup` on a fresh registry inside a server thread and hand back a
/// client on the other end. The server exits when the client is dropped.
pub fn serve_with<F>(setup: F) -> (Client<MemoryChannel>, thread::JoinHandle<(ServeExit, u64)>)
where
    F: FnOnce(&mut ServiceRegistry<'static>) + Send + 'static,
{
    let (mut server_end, client_end) = MemoryChannel::pair();
    let handle = thread::spawn(move || {
        let mut registry = ServiceRegistry::new();
        setup(&mut registry);
        let mut server = Server::new(registry);
        let exit = server.serve(&mut server_end).expect("serve loop");
        (exit, server.requests_handled())
    });
    (Client::new(client_end), handle)
}
