//! Turns a stream of possibly out-of-order, possibly overlapping byte
//! ranges into the contiguous prefix a [`ByteStream`] writer expects.

use std::collections::BTreeMap;

use crate::byte_stream::Writer;

/// Bounded out-of-order reassembly buffer. Every byte it ever accepts is
/// either delivered to the downstream writer or dropped because it fell
/// outside the writer's flow-control window — it never grows unboundedly.
#[derive(Debug, Default)]
pub struct Reassembler {
    /// Next absolute stream index awaiting delivery.
    frontier: u64,
    /// Disjoint buffered ranges, keyed by start index, all with start > frontier.
    intervals: BTreeMap<u64, Vec<u8>>,
    buffered_bytes: usize,
    saw_last: bool,
}

impl Reassembler {
    pub fn new() -> Self {
        Reassembler::default()
    }

    /// Inserts `data` starting at absolute index `first_index`. `is_last`
    /// marks that this segment carries the stream's terminator (the flag is
    /// sticky across calls).
    pub fn insert(&mut self, first_index: u64, data: &[u8], is_last: bool, writer: &Writer) {
        let cap = writer.available_capacity() as u64;
        let first_index_end = first_index.saturating_add(data.len() as u64);

        if first_index <= self.frontier && first_index_end > self.frontier {
            let overlap_start = (self.frontier - first_index) as usize;
            let available = data.len() - overlap_start;
            let push_len = available.min(cap as usize);
            writer.push(&data[overlap_start..overlap_start + push_len]);
            self.frontier += push_len as u64;
            self.absorb_buffered_prefix(writer);
        } else if first_index > self.frontier && first_index < self.frontier.saturating_add(cap) {
            let gap = first_index - self.frontier;
            let room = (cap - gap) as usize;
            let keep = data.len().min(room);
            if keep > 0 {
                self.buffer_insert(first_index, data[..keep].to_vec());
            }
        }

        if is_last {
            self.saw_last = true;
        }
        if self.saw_last && self.intervals.is_empty() {
            writer.close();
        }
    }

    /// After the frontier advances, pull in any buffered intervals that the
    /// frontier now reaches or overlaps, in ascending order, stopping at the
    /// first remaining gap.
    fn absorb_buffered_prefix(&mut self, writer: &Writer) {
        loop {
            let Some((&start, _)) = self.intervals.iter().next() else {
                break;
            };
            if start > self.frontier {
                break;
            }
            let (start, payload) = self.intervals.remove_entry(&start).unwrap();
            self.buffered_bytes -= payload.len();

            let end = start + payload.len() as u64;
            if end <= self.frontier {
                // Entirely covered already; drop it and keep scanning.
                continue;
            }

            let tail_off = (self.frontier - start) as usize;
            let cap = writer.available_capacity();
            let push_len = (payload.len() - tail_off).min(cap);
            writer.push(&payload[tail_off..tail_off + push_len]);
            self.frontier += push_len as u64;

            if push_len < payload.len() - tail_off {
                // Capacity ran out mid-interval; the remainder is now
                // unreachable and was correctly discarded above.
                break;
            }
        }
    }

    /// Merges `data` (starting at `start`) into the buffered interval set,
    /// trimming it against any existing overlapping intervals, which are
    /// authoritative for the bytes they already hold.
    fn buffer_insert(&mut self, start: u64, data: Vec<u8>) {
        let end = start + data.len() as u64;

        let overlapping: Vec<(u64, usize)> = self
            .intervals
            .range(..end)
            .filter(|(&k, v)| k + v.len() as u64 > start)
            .map(|(&k, v)| (k, v.len()))
            .collect();

        let mut new_segments = Vec::new();
        let mut cursor = start;
        for (k, len) in overlapping {
            let k_end = k + len as u64;
            if cursor < k {
                let seg_start = cursor;
                let seg_end = k.min(end);
                if seg_end > seg_start {
                    let lo = (seg_start - start) as usize;
                    let hi = (seg_end - start) as usize;
                    new_segments.push((seg_start, data[lo..hi].to_vec()));
                }
            }
            cursor = cursor.max(k_end);
            if cursor >= end {
                break;
            }
        }
        if cursor < end {
            let lo = (cursor - start) as usize;
            new_segments.push((cursor, data[lo..].to_vec()));
        }

        for (s, bytes) in new_segments {
            if !bytes.is_empty() {
                self.buffered_bytes += bytes.len();
                self.intervals.insert(s, bytes);
            }
        }
    }

    /// Total bytes currently held in the out-of-order buffer.
    pub fn bytes_pending(&self) -> usize {
        self.buffered_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_stream::ByteStream;

    #[test]
    fn in_order_insert() {
        let stream = ByteStream::new(8);
        let (writer, reader) = (stream.writer(), stream.reader());
        let mut reassembler = Reassembler::new();

        reassembler.insert(0, b"ab", false, &writer);
        assert_eq!(reader.peek(), b"ab");
        assert_eq!(reassembler.bytes_pending(), 0);
    }

    #[test]
    fn reorders_and_merges_overlap() {
        let stream = ByteStream::new(8);
        let (writer, reader) = (stream.writer(), stream.reader());
        let mut reassembler = Reassembler::new();

        reassembler.insert(0, b"ab", false, &writer);
        reassembler.insert(4, b"ef", false, &writer);
        reassembler.insert(2, b"cdefg", false, &writer);

        assert_eq!(reader.peek(), b"abcdefg");
        assert_eq!(reassembler.bytes_pending(), 0);
    }

    #[test]
    fn respects_capacity_boundary() {
        let stream = ByteStream::new(2);
        let (writer, _reader) = (stream.writer(), stream.reader());
        let mut reassembler = Reassembler::new();

        // Only the first 2 bytes are reachable; the rest is unconditionally dropped.
        reassembler.insert(0, b"abcdef", false, &writer);
        assert_eq!(reassembler.bytes_pending(), 0);
        assert_eq!(writer.bytes_pushed(), 2);
    }

    #[test]
    fn closes_writer_once_last_byte_delivered() {
        let stream = ByteStream::new(8);
        let (writer, reader) = (stream.writer(), stream.reader());
        let mut reassembler = Reassembler::new();

        reassembler.insert(0, b"ab", false, &writer);
        reassembler.insert(3, b"d", false, &writer);
        assert!(!reader.is_finished());

        reassembler.insert(2, b"c", true, &writer);
        assert!(reader.is_finished());
    }

    #[test]
    fn empty_last_segment_closes_once_frontier_catches_up() {
        let stream = ByteStream::new(8);
        let (writer, reader) = (stream.writer(), stream.reader());
        let mut reassembler = Reassembler::new();

        reassembler.insert(0, b"ab", false, &writer);
        reassembler.insert(2, b"", true, &writer);
        assert!(reader.is_finished());
    }

    #[test]
    fn direct_push_overruns_buffered_bytes_at_the_same_indices() {
        let stream = ByteStream::new(8);
        let (writer, reader) = (stream.writer(), stream.reader());
        let mut reassembler = Reassembler::new();

        reassembler.insert(1, b"XY", false, &writer);
        // A direct push that reaches the frontier writes straight to the
        // writer and discards any buffered interval it now subsumes —
        // the existing-bytes-authoritative rule only governs conflicts
        // between two still-buffered (not yet pushed) intervals.
        reassembler.insert(0, b"AXZ", false, &writer);

        assert_eq!(reader.peek(), b"AXZ");
        assert_eq!(reassembler.bytes_pending(), 0);
    }

    #[test]
    fn buffered_interval_is_authoritative_over_a_later_overlapping_buffer_insert() {
        let stream = ByteStream::new(8);
        let (writer, reader) = (stream.writer(), stream.reader());
        let mut reassembler = Reassembler::new();

        // Both inserts land beyond the frontier and stay buffered.
        reassembler.insert(2, b"XY", false, &writer);
        reassembler.insert(1, b"ABCD", false, &writer);

        // Advance the frontier to absorb everything; "XY" must win over
        // the "BC" that "ABCD" would otherwise have contributed at the
        // same indices.
        reassembler.insert(0, b"Z", false, &writer);

        assert_eq!(reader.peek(), b"ZAXYD");
        assert_eq!(reassembler.bytes_pending(), 0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::byte_stream::ByteStream;
    use proptest::prelude::*;

    proptest! {
        // Any sequence of inserts, however scrambled or overlapping, only
        // ever delivers a prefix of a single underlying byte sequence —
        // every chunk here is a fragment of the same ground-truth string,
        // as real (non-adversarial) TCP segments of one stream are.
        #[test]
        fn delivered_bytes_form_a_prefix_of_the_ground_truth(
            ground_truth in prop::collection::vec(any::<u8>(), 1..32),
            cut_points in prop::collection::vec(0usize..32, 2..8),
        ) {
            let stream = ByteStream::new(64);
            let (writer, reader) = (stream.writer(), stream.reader());
            let mut reassembler = Reassembler::new();

            let mut bounds: Vec<usize> = cut_points
                .into_iter()
                .map(|c| c.min(ground_truth.len()))
                .collect();
            bounds.push(0);
            bounds.push(ground_truth.len());
            bounds.sort_unstable();
            bounds.dedup();

            // Insert fragments between consecutive cut points, in reverse
            // order, to exercise out-of-order delivery.
            for window in bounds.windows(2).rev() {
                let (start, end) = (window[0], window[1]);
                reassembler.insert(start as u64, &ground_truth[start..end], false, &writer);
            }

            let delivered = reader.peek();
            prop_assert!(delivered.len() <= ground_truth.len());
            prop_assert_eq!(&delivered[..], &ground_truth[..delivered.len()]);
        }
    }
}
