//! Segments outbound bytes, enforces the peer's advertised window, and
//! retransmits under an exponential-backoff timer.

use std::collections::VecDeque;

use crate::byte_stream::Reader;
use crate::wrap32::Wrap32;

use super::config::{TCPSenderConfig, MAX_PAYLOAD};
use super::message::{TCPReceiverMessage, TCPSenderMessage, TcpFlags};

#[derive(Debug)]
pub struct TCPSender {
    isn: Wrap32,
    /// Next absolute index to transmit.
    left_edge: u64,
    /// First absolute index beyond the peer's advertised window. Floored
    /// at 1 so the SYN can always go out before any window is advertised.
    right_edge: u64,
    initial_rto: u64,
    current_rto: u64,
    timer_elapsed: u64,
    timer_running: bool,
    retransmit_count: u32,
    to_send: VecDeque<TCPSenderMessage>,
    outstanding: VecDeque<TCPSenderMessage>,
    syn_sent: bool,
    fin_sent: bool,
}

impl TCPSender {
    pub fn new(config: TCPSenderConfig) -> Self {
        let isn = config.fixed_isn.unwrap_or_else(|| Wrap32::new(rand::random()));
        TCPSender {
            isn,
            left_edge: 0,
            right_edge: 1,
            initial_rto: config.initial_rto_ms,
            current_rto: config.initial_rto_ms,
            timer_elapsed: 0,
            timer_running: false,
            retransmit_count: 0,
            to_send: VecDeque::new(),
            outstanding: VecDeque::new(),
            syn_sent: false,
            fin_sent: false,
        }
    }

    /// How many sequence numbers are currently outstanding (sent, not yet
    /// acknowledged).
    pub fn sequence_numbers_in_flight(&self) -> u64 {
        self.outstanding.iter().map(|s| s.sequence_length()).sum()
    }

    /// How many consecutive retransmissions have happened since the last
    /// net acknowledgment progress.
    pub fn consecutive_retransmissions(&self) -> u32 {
        self.retransmit_count
    }

    /// Pulls bytes from `reader` and turns them into segments, subject to
    /// the peer's advertised window and `MAX_PAYLOAD`.
    pub fn push(&mut self, reader: &Reader) {
        while self.try_send_one(reader) {}
    }

    fn try_send_one(&mut self, reader: &Reader) -> bool {
        if self.fin_sent {
            return false;
        }

        let window = self.right_edge.saturating_sub(self.left_edge);

        if window == 0 {
            return self.try_zero_window_probe(reader);
        }

        let reserve_syn = u64::from(!self.syn_sent);
        if window <= reserve_syn {
            if reserve_syn == 1 {
                self.emit(TcpFlags::SYN, Vec::new());
                return true;
            }
            return false;
        }

        let payload_budget = (window - reserve_syn).min(MAX_PAYLOAD as u64) as usize;
        let available = reader.bytes_buffered().min(payload_budget);

        if available == 0 {
            if reserve_syn == 0 {
                // Nothing new, SYN already out: only a lone FIN remains possible.
                if reader.is_finished() {
                    self.emit(TcpFlags::FIN, Vec::new());
                    return true;
                }
                return false;
            }
            // SYN not yet sent: send it now, piggybacking FIN if the stream
            // is already closed and empty.
            let mut flags = TcpFlags::SYN;
            if reader.is_finished() {
                flags |= TcpFlags::FIN;
            }
            self.emit(flags, Vec::new());
            return true;
        }

        let mut payload = reader.peek();
        payload.truncate(available);
        reader.pop(payload.len());

        let mut flags = TcpFlags::empty();
        if reserve_syn == 1 {
            flags |= TcpFlags::SYN;
        }

        let consumed = reserve_syn + payload.len() as u64;
        if reader.is_finished() && consumed < window {
            flags |= TcpFlags::FIN;
        }

        self.emit(flags, payload);
        true
    }

    /// Emits a single one-sequence-number segment while the peer's window
    /// is fully closed, but only while nothing is already outstanding.
    fn try_zero_window_probe(&mut self, reader: &Reader) -> bool {
        if !self.outstanding.is_empty() {
            return false;
        }
        if !self.syn_sent {
            self.emit(TcpFlags::SYN, Vec::new());
            return true;
        }
        if reader.bytes_buffered() > 0 {
            let mut byte = reader.peek();
            byte.truncate(1);
            reader.pop(1);
            self.emit(TcpFlags::empty(), byte);
            return true;
        }
        if reader.is_finished() {
            self.emit(TcpFlags::FIN, Vec::new());
            return true;
        }
        false
    }

    fn emit(&mut self, flags: TcpFlags, payload: Vec<u8>) {
        let segment = TCPSenderMessage {
            seqno: Wrap32::wrap(self.left_edge, self.isn),
            flags,
            payload,
        };
        self.left_edge += segment.sequence_length();
        self.syn_sent |= segment.syn();
        self.fin_sent |= segment.fin();
        self.outstanding.push_back(segment.clone());
        self.to_send.push_back(segment);
    }

    /// Dequeues the next segment ready for transmission, starting the
    /// retransmission timer if it was idle.
    pub fn maybe_send(&mut self) -> Option<TCPSenderMessage> {
        let segment = self.to_send.pop_front()?;
        if !self.timer_running {
            self.timer_running = true;
            self.timer_elapsed = 0;
        }
        Some(segment)
    }

    /// Processes an ack/window advertisement from the peer's receiver.
    pub fn receive(&mut self, msg: &TCPReceiverMessage) {
        let Some(ackno) = msg.ackno else {
            return;
        };

        let ack_absolute = ackno.unwrap(self.isn, self.left_edge);
        if ack_absolute > self.left_edge {
            tracing::trace!(ack_absolute, left_edge = self.left_edge, "ignoring ack beyond what was sent");
            return;
        }

        self.right_edge = self.right_edge.max(ack_absolute + msg.window_size as u64);

        let before = self.outstanding.len();
        let left_edge = self.left_edge;
        let isn = self.isn;
        self.outstanding.retain(|segment| {
            let segment_end = segment.seqno.unwrap(isn, left_edge) + segment.sequence_length();
            segment_end > ack_absolute
        });
        let removed = before - self.outstanding.len();

        if removed > 0 {
            self.current_rto = self.initial_rto;
            self.retransmit_count = 0;
            self.timer_elapsed = 0;
            self.timer_running = !self.outstanding.is_empty();
        }
    }

    /// Advances the retransmission timer by `ms_since_last_tick`. At most
    /// one retransmission is produced per call, regardless of how large the
    /// elapsed time is.
    pub fn tick(&mut self, ms_since_last_tick: u64) {
        if !self.timer_running {
            return;
        }
        self.timer_elapsed += ms_since_last_tick;
        if self.timer_elapsed < self.current_rto {
            return;
        }

        if let Some(earliest) = self.outstanding.front().cloned() {
            self.to_send.push_front(earliest);
        }

        // Zero-window probes (left_edge having overrun right_edge) never
        // back off; only a genuinely non-zero advertised window does.
        if self.left_edge <= self.right_edge {
            self.current_rto *= 2;
            self.retransmit_count += 1;
            tracing::debug!(rto = self.current_rto, retransmits = self.retransmit_count, "retransmission timeout");
        }
        self.timer_elapsed = 0;
    }

    /// An unframed, flagless segment carrying only the current sequence
    /// number — used for a keep-alive / ack-only response.
    pub fn send_empty_message(&self) -> TCPSenderMessage {
        TCPSenderMessage {
            seqno: Wrap32::wrap(self.left_edge, self.isn),
            flags: TcpFlags::empty(),
            payload: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_stream::ByteStream;

    fn sender_with_isn(isn: u32, rto: u64) -> TCPSender {
        TCPSender::new(TCPSenderConfig {
            initial_rto_ms: rto,
            fixed_isn: Some(Wrap32::new(isn)),
        })
    }

    #[test]
    fn first_push_sends_syn() {
        let stream = ByteStream::new(1000);
        let mut sender = sender_with_isn(0, 1000);

        sender.push(&stream.reader());
        let segment = sender.maybe_send().unwrap();
        assert!(segment.syn());
        assert_eq!(segment.seqno, Wrap32::new(0));
        assert_eq!(sender.sequence_numbers_in_flight(), 1);
    }

    #[test]
    fn segments_respect_max_payload() {
        let stream = ByteStream::new(10_000);
        let writer = stream.writer();
        writer.push(&vec![b'a'; MAX_PAYLOAD * 2 + 10]);
        writer.close();

        let mut sender = TCPSender::new(TCPSenderConfig {
            initial_rto_ms: 1000,
            fixed_isn: Some(Wrap32::new(0)),
        });
        // Advertise a huge window so the whole buffer fits.
        sender.receive(&TCPReceiverMessage {
            ackno: None,
            window_size: 0,
        });

        sender.push(&stream.reader());
        let mut total_payload = 0;
        let mut saw_fin = false;
        while let Some(segment) = sender.maybe_send() {
            assert!(segment.payload.len() <= MAX_PAYLOAD);
            total_payload += segment.payload.len();
            saw_fin |= segment.fin();
        }
        // Window starts at 1 (only room for SYN) since no ack/window has
        // been processed yet; nothing beyond the SYN should have gone out.
        assert_eq!(total_payload, 0);
        assert!(!saw_fin);
    }

    #[test]
    fn zero_window_probe_retransmits_without_backoff() {
        let stream = ByteStream::new(10);
        let writer = stream.writer();
        writer.push(b"x");

        let mut sender = sender_with_isn(0, 1000);
        sender.push(&stream.reader());
        let syn = sender.maybe_send().unwrap();
        assert!(syn.syn());

        sender.receive(&TCPReceiverMessage {
            ackno: Some(Wrap32::wrap(1, Wrap32::new(0))),
            window_size: 0,
        });

        sender.push(&stream.reader());
        let probe = sender.maybe_send().unwrap();
        assert_eq!(probe.payload.len(), 1);
        assert_eq!(sender.consecutive_retransmissions(), 0);

        sender.tick(1000);
        assert_eq!(sender.consecutive_retransmissions(), 0);
        let retransmitted = sender.maybe_send().unwrap();
        assert_eq!(retransmitted.seqno, probe.seqno);
    }

    #[test]
    fn backs_off_on_repeated_timeout_with_open_window() {
        let stream = ByteStream::new(10);
        let mut sender = sender_with_isn(0, 1000);

        sender.push(&stream.reader());
        assert!(sender.maybe_send().is_some());

        sender.receive(&TCPReceiverMessage {
            ackno: Some(Wrap32::new(0)),
            window_size: 10,
        });

        sender.push(&stream.reader());
        sender.maybe_send();

        sender.tick(999);
        assert_eq!(sender.consecutive_retransmissions(), 0);
        sender.tick(1);
        assert_eq!(sender.consecutive_retransmissions(), 1);
        sender.tick(2000);
        assert_eq!(sender.consecutive_retransmissions(), 2);
    }

    #[test]
    fn ack_progress_stops_timer_when_nothing_outstanding() {
        let stream = ByteStream::new(10);
        let mut sender = sender_with_isn(0, 1000);

        sender.push(&stream.reader());
        let syn = sender.maybe_send().unwrap();

        sender.receive(&TCPReceiverMessage {
            ackno: Some(Wrap32::wrap(syn.sequence_length(), Wrap32::new(0))),
            window_size: 10,
        });

        assert_eq!(sender.sequence_numbers_in_flight(), 0);
        // No-op ticks afterward must not produce a retransmission.
        sender.tick(10_000);
        assert!(sender.maybe_send().is_none());
    }

    #[test]
    fn stale_ack_is_ignored() {
        let stream = ByteStream::new(10);
        let mut sender = sender_with_isn(0, 1000);
        sender.push(&stream.reader());
        sender.maybe_send();

        sender.receive(&TCPReceiverMessage {
            ackno: Some(Wrap32::new(50)),
            window_size: 10,
        });
        // An ack far beyond anything sent must be ignored, not crash or
        // fast-forward left_edge.
        assert_eq!(sender.sequence_numbers_in_flight(), 1);
    }
}
