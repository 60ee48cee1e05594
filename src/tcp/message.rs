//! Messages exchanged between [`super::sender::TCPSender`] and
//! [`super::receiver::TCPReceiver`] and whatever lower layer an embedder
//! supplies. These are in-process structs, not a wire format: no TCP
//! segment is ever serialized by this crate (see the crate's design notes
//! on why TCP options and segment checksums are out of scope).

use crate::wrap32::Wrap32;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TcpFlags: u8 {
        const SYN = 0b01;
        const FIN = 0b10;
    }
}

/// A segment produced by the sender and handed to the lower layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TCPSenderMessage {
    pub seqno: Wrap32,
    pub flags: TcpFlags,
    pub payload: Vec<u8>,
}

impl TCPSenderMessage {
    pub fn syn(&self) -> bool {
        self.flags.contains(TcpFlags::SYN)
    }

    pub fn fin(&self) -> bool {
        self.flags.contains(TcpFlags::FIN)
    }

    /// `SYN + |payload| + FIN`: the count of sequence numbers this segment
    /// consumes.
    pub fn sequence_length(&self) -> u64 {
        self.syn() as u64 + self.payload.len() as u64 + self.fin() as u64
    }
}

/// The window/ack advertisement a receiver hands back to its peer's sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TCPReceiverMessage {
    pub ackno: Option<Wrap32>,
    pub window_size: u16,
}
