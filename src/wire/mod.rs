//! Wire formats this crate actually serializes: Ethernet, ARP, and IPv4.
//! No TCP segment format lives here — see `crate::tcp::message` for why.

pub mod arp;
pub mod ethernet;
pub mod ipv4;

pub use arp::{ArpMessage, ArpOpcode};
pub use ethernet::{EthernetAddress, EthernetFrame, EthernetHeader, EtherType, BROADCAST};
pub use ipv4::{Ipv4Datagram, Ipv4Header};
