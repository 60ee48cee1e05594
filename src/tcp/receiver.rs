//! Translates inbound segments into reassembler inserts and produces the
//! ack/window advertisement sent back to the peer.

use crate::byte_stream::Writer;
use crate::reassembler::Reassembler;
use crate::wrap32::Wrap32;

use super::config::MAX_WINDOW_SIZE;
use super::message::{TCPReceiverMessage, TCPSenderMessage};

#[derive(Debug, Default)]
pub struct TCPReceiver {
    /// Set exactly once, on receipt of a segment carrying SYN.
    zero_point: Option<Wrap32>,
}

impl TCPReceiver {
    pub fn new() -> Self {
        TCPReceiver::default()
    }

    /// Feeds an inbound segment into the reassembler. Segments that arrive
    /// before SYN is seen are dropped: only a segment with SYN set can
    /// establish `zero_point`.
    pub fn receive(
        &mut self,
        segment: &TCPSenderMessage,
        reassembler: &mut Reassembler,
        writer: &Writer,
    ) {
        if segment.syn() {
            self.zero_point = Some(segment.seqno);
            reassembler.insert(0, &segment.payload, segment.fin(), writer);
        } else if let Some(zero_point) = self.zero_point {
            // -1 to undo the "byte i occupies absolute index i+1" SYN offset.
            // A segment whose seqno unwraps to 0 (a stray retransmitted SYN
            // seen on this path) wraps to u64::MAX here, which `insert`
            // harmlessly drops as unreachably far past the frontier.
            let stream_index = segment
                .seqno
                .unwrap(zero_point, writer.bytes_pushed())
                .wrapping_sub(1);
            reassembler.insert(stream_index, &segment.payload, segment.fin(), writer);
        } else {
            tracing::trace!("dropping segment received before SYN");
        }
    }

    /// Builds the ack/window advertisement for the current inbound stream
    /// state.
    pub fn send(&self, writer: &Writer) -> TCPReceiverMessage {
        let window_size = writer.available_capacity().min(MAX_WINDOW_SIZE as usize) as u16;
        let ackno = self.zero_point.map(|zero_point| {
            let mut absolute = writer.bytes_pushed() + 1;
            if writer.is_closed() {
                absolute += 1;
            }
            Wrap32::wrap(absolute, zero_point)
        });
        TCPReceiverMessage { ackno, window_size }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_stream::ByteStream;
    use crate::tcp::message::TcpFlags;

    fn segment(seqno: u32, flags: TcpFlags, payload: &[u8]) -> TCPSenderMessage {
        TCPSenderMessage {
            seqno: Wrap32::new(seqno),
            flags,
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn syn_establishes_zero_point_and_delivers_payload() {
        let stream = ByteStream::new(16);
        let (writer, reader) = (stream.writer(), stream.reader());
        let mut receiver = TCPReceiver::new();
        let mut reassembler = Reassembler::new();

        receiver.receive(&segment(100, TcpFlags::SYN, b"ab"), &mut reassembler, &writer);
        assert_eq!(reader.peek(), b"ab");

        let msg = receiver.send(&writer);
        assert_eq!(msg.ackno, Some(Wrap32::new(103)));
    }

    #[test]
    fn segments_before_syn_are_dropped() {
        let stream = ByteStream::new(16);
        let (writer, reader) = (stream.writer(), stream.reader());
        let mut receiver = TCPReceiver::new();
        let mut reassembler = Reassembler::new();

        receiver.receive(&segment(5, TcpFlags::empty(), b"xx"), &mut reassembler, &writer);
        assert_eq!(reader.bytes_buffered(), 0);
        assert_eq!(receiver.send(&writer).ackno, None);
    }

    #[test]
    fn window_size_caps_at_65535() {
        let stream = ByteStream::new(1 << 20);
        let writer = stream.writer();
        let receiver = TCPReceiver::new();

        assert_eq!(receiver.send(&writer).window_size, 65535);
    }

    #[test]
    fn ack_accounts_for_fin_once_stream_closed() {
        let stream = ByteStream::new(16);
        let (writer, _reader) = (stream.writer(), stream.reader());
        let mut receiver = TCPReceiver::new();
        let mut reassembler = Reassembler::new();

        receiver.receive(&segment(0, TcpFlags::SYN | TcpFlags::FIN, b"hi"), &mut reassembler, &writer);
        assert!(writer.is_closed());

        let msg = receiver.send(&writer);
        // +1 for SYN, +2 bytes, +1 for FIN.
        assert_eq!(msg.ackno, Some(Wrap32::new(4)));
    }
}
