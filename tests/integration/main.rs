//! Integration test driver for `tests/integration/` submodules.
//!
//! Each `mod` below exercises one subsystem end to end over in-process
//! [`MemoryChannel`](lockstep_rpc::rpc::MemoryChannel) pairs; no sockets.

mod binding_tests;
mod harness;
mod shape_tests;
mod session_tests;
