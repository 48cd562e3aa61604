//! Lock-step RPC subsystem.
//!
//! Shape-directed binary codec plus a registry that erases heterogeneous
//! callables into one `bytes in → bytes out` handler signature.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         RPC Stack                            │
//! │                                                              │
//! │  Client                                   Server             │
//! │  ┌──────────┐  request  ┌───────────┐    ┌────────────────┐  │
//! │  │  call()  │──────────▶│ Channel   │───▶│ ServiceRegistry │  │
//! │  │ (proxy)  │           │ (trait)   │    │  → Handler      │  │
//! │  └──────────┘           └───────────┘    └────────────────┘  │
//! │       ▲                       ▲                  │           │
//! │       │        reply          │     Reply        │           │
//! │       └───────────────────────┴──────────────────┘           │
//! │                                                              │
//! │  codec: Encode/Decode per value shape   frame: TCP framing   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod codec;
pub mod envelope;
pub mod frame;
pub mod handler;
pub mod registry;
pub mod server;
pub mod tcp;
pub mod transport;

pub use client::Client;
pub use codec::{Decode, Encode, Reader};
pub use envelope::Reply;
pub use handler::Handler;
pub use registry::ServiceRegistry;
pub use server::{ServeExit, Server, StopSignal};
pub use tcp::{TcpAcceptor, TcpChannel};
pub use transport::{Channel, MemoryChannel};
