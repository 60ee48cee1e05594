//! IP-over-Ethernet bridging: address resolution with timed caching, and
//! longest-prefix-match forwarding across a set of interfaces.

pub mod interface;
pub mod router;

pub use interface::{NetworkInterface, NetworkInterfaceConfig};
pub use router::{Route, Router};
