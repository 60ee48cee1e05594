//! Core data-plane state machines for a user-space TCP/IP stack: a bounded
//! byte stream, sequence-number arithmetic, out-of-order reassembly, the
//! split TCP sender/receiver, and an ARP-resolving router over Ethernet
//! interfaces.
//!
//! The whole crate is single-threaded and cooperative: every component is
//! a synchronous state machine driven by an external event loop that
//! injects inbound frames, outbound application bytes, and a
//! monotonically-advancing `tick(ms)` in call order. Nothing here is
//! `Send`/`Sync`, and nothing needs to be.

pub mod byte_stream;
pub mod error;
pub mod network;
pub mod reassembler;
pub mod tcp;
pub mod wrap32;

pub use byte_stream::{ByteStream, Reader, Writer};
pub use error::{Result, StackError};
pub use network::{NetworkInterface, NetworkInterfaceConfig, Route, Router};
pub use reassembler::Reassembler;
pub use tcp::{TCPReceiver, TCPReceiverMessage, TCPSender, TCPSenderConfig, TCPSenderMessage, TcpFlags};
pub use wrap32::Wrap32;
