//! Bounded in-memory byte stream shared between a writer and a reader role.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug)]
struct Inner {
    capacity: usize,
    buffer: VecDeque<u8>,
    bytes_pushed: u64,
    bytes_popped: u64,
    closed: bool,
    error: bool,
}

impl Inner {
    fn available_capacity(&self) -> usize {
        self.capacity - self.buffer.len()
    }
}

/// A capacity-bounded FIFO of bytes, accessed through a [`Writer`] and a
/// [`Reader`] view over the same shared state. The two views are two
/// method-dispatch surfaces over one object, not independently-owned halves:
/// the stack's single-threaded cooperative scheduling model (see the crate's
/// design notes) never requires the extra ceremony of a channel.
#[derive(Debug, Clone)]
pub struct ByteStream {
    inner: Rc<RefCell<Inner>>,
}

impl ByteStream {
    pub fn new(capacity: usize) -> Self {
        ByteStream {
            inner: Rc::new(RefCell::new(Inner {
                capacity,
                buffer: VecDeque::new(),
                bytes_pushed: 0,
                bytes_popped: 0,
                closed: false,
                error: false,
            })),
        }
    }

    /// A handle through which bytes may be written.
    pub fn writer(&self) -> Writer {
        Writer {
            inner: self.inner.clone(),
        }
    }

    /// A handle through which bytes may be read.
    pub fn reader(&self) -> Reader {
        Reader {
            inner: self.inner.clone(),
        }
    }
}

/// The write-side view of a [`ByteStream`].
#[derive(Debug, Clone)]
pub struct Writer {
    inner: Rc<RefCell<Inner>>,
}

impl Writer {
    /// Appends as many bytes of `data` as fit in the remaining capacity.
    /// Excess bytes are silently dropped, not rejected outright. Writing
    /// to a closed stream sets the error flag instead of appending.
    pub fn push(&self, data: &[u8]) {
        let mut inner = self.inner.borrow_mut();
        if inner.closed {
            inner.error = true;
            return;
        }
        let available = inner.available_capacity();
        let take = available.min(data.len());
        inner.buffer.extend(&data[..take]);
        inner.bytes_pushed += take as u64;
    }

    /// Marks the stream closed. Already-buffered bytes remain readable.
    pub fn close(&self) {
        self.inner.borrow_mut().closed = true;
    }

    pub fn set_error(&self) {
        self.inner.borrow_mut().error = true;
    }

    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }

    pub fn has_error(&self) -> bool {
        self.inner.borrow().error
    }

    pub fn available_capacity(&self) -> usize {
        self.inner.borrow().available_capacity()
    }

    pub fn bytes_pushed(&self) -> u64 {
        self.inner.borrow().bytes_pushed
    }

    pub fn bytes_buffered(&self) -> usize {
        self.inner.borrow().buffer.len()
    }
}

/// The read-side view of a [`ByteStream`].
#[derive(Debug, Clone)]
pub struct Reader {
    inner: Rc<RefCell<Inner>>,
}

impl Reader {
    /// Returns a contiguous prefix of the buffered bytes: at least one byte
    /// whenever the buffer is non-empty, possibly fewer than all of it.
    pub fn peek(&self) -> Vec<u8> {
        let inner = self.inner.borrow();
        let (head, _tail) = inner.buffer.as_slices();
        if !head.is_empty() {
            head.to_vec()
        } else {
            inner.buffer.iter().copied().collect()
        }
    }

    /// Discards up to `n` bytes from the front; returns the count actually
    /// discarded.
    pub fn pop(&self, n: usize) -> usize {
        let mut inner = self.inner.borrow_mut();
        let actual = n.min(inner.buffer.len());
        inner.buffer.drain(..actual);
        inner.bytes_popped += actual as u64;
        actual
    }

    pub fn is_finished(&self) -> bool {
        let inner = self.inner.borrow();
        inner.closed && inner.buffer.is_empty()
    }

    pub fn has_error(&self) -> bool {
        self.inner.borrow().error
    }

    pub fn bytes_buffered(&self) -> usize {
        self.inner.borrow().buffer.len()
    }

    pub fn bytes_popped(&self) -> u64 {
        self.inner.borrow().bytes_popped
    }

    pub fn bytes_pushed(&self) -> u64 {
        self.inner.borrow().bytes_pushed
    }

    pub fn available_capacity(&self) -> usize {
        self.inner.borrow().available_capacity()
    }
}
