//! The split-sender/receiver TCP core: segmentation, flow control,
//! retransmission, and stream reassembly, independent of any particular
//! wire format or I/O mechanism.

pub mod config;
pub mod message;
pub mod receiver;
pub mod sender;

pub use config::TCPSenderConfig;
pub use message::{TCPReceiverMessage, TCPSenderMessage, TcpFlags};
pub use receiver::TCPReceiver;
pub use sender::TCPSender;
