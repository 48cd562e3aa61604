//! Lock-step RPC library.
//!
//! A host-format binary codec for composite values and a service registry
//! that exposes free functions and bound methods behind string ids. A
//! client encodes `(service id, argument tuple)`, the server dispatches it
//! to the registered callable and sends back the encoded return value.
//!
//! ```no_run
//! use lockstep_rpc::config::RpcConfig;
//! use lockstep_rpc::rpc::{Client, ServiceRegistry, Server, TcpAcceptor};
//!
//! fn add(a: i32, b: i32) -> i32 {
//!     a + b
//! }
//!
//! # fn main() -> lockstep_rpc::Result<()> {
//! let config = RpcConfig::default();
//!
//! let acceptor = TcpAcceptor::bind(&config)?;
//! std::thread::spawn(move || {
//!     // Handlers are not `Send`; the registry lives on the serving thread.
//!     let mut registry = ServiceRegistry::new();
//!     registry.register("add", add);
//!     Server::new(registry).serve_tcp(&acceptor)
//! });
//!
//! let mut client = Client::connect(&config)?;
//! let sum: i32 = lockstep_rpc::invoke!(client, "add", 2, 3)?;
//! assert_eq!(sum, 5);
//! # Ok(())
//! # }
//! ```

#![deny(unused_must_use)]

pub mod config;
pub mod error;
pub mod rpc;

pub use error::{DecodeError, Error, RemoteError, RemoteErrorKind, Result, TransportError};
