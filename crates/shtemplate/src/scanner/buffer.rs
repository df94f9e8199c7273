use std::io::{self, ErrorKind, Read};

/// Fixed-capacity byte region with a read cursor and a fill cursor.
///
/// `start` is the first unconsumed byte and `end` the first unfilled byte,
/// with `start <= end <= capacity` at all times.
#[derive(Debug)]
pub(crate) struct Buffer {
    data: Box<[u8]>,
    start: usize,
    end: usize,
}

impl Buffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity].into_boxed_slice(),
            start: 0,
            end: 0,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.end == self.data.len()
    }

    /// The unconsumed region `[start, end)`.
    #[inline]
    pub(crate) fn unread(&self) -> &[u8] {
        &self.data[self.start..self.end]
    }

    /// Marks `n` unconsumed bytes as consumed.
    #[inline]
    pub(crate) fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.end - self.start, "consumed past the fill cursor");
        self.start += n;
    }

    /// Moves the unconsumed bytes to the front of the buffer.
    pub(crate) fn compact(&mut self) {
        if self.start == 0 {
            return;
        }
        self.data.copy_within(self.start..self.end, 0);
        self.end -= self.start;
        self.start = 0;
    }

    /// Reads once into the free tail and returns how many bytes arrived.
    ///
    /// `Ok(0)` means the input is exhausted: the tail is never empty when a
    /// read is issued, so a zero-length read cannot be mistaken for a full
    /// buffer. Interrupted reads are retried.
    pub(crate) fn refill<R: Read + ?Sized>(&mut self, input: &mut R) -> io::Result<usize> {
        if self.is_empty() {
            self.start = 0;
            self.end = 0;
        }
        debug_assert!(!self.is_full(), "refill with no free space");

        loop {
            match input.read(&mut self.data[self.end..]) {
                Ok(n) => {
                    self.end += n;
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn refill_resets_cursors_once_drained() {
        let mut buf = Buffer::new(4);
        let mut input = Cursor::new(b"abcdef".to_vec());

        assert_eq!(buf.refill(&mut input).unwrap(), 4);
        assert!(buf.is_full());
        buf.consume(4);
        assert!(buf.is_empty());

        assert_eq!(buf.refill(&mut input).unwrap(), 2);
        assert_eq!(buf.unread(), b"ef");
        assert_eq!(buf.refill(&mut input).unwrap(), 0);
    }

    #[test]
    fn compact_keeps_unconsumed_tail() {
        let mut buf = Buffer::new(4);
        let mut input = Cursor::new(b"wxyz12".to_vec());
        buf.refill(&mut input).unwrap();
        buf.consume(3);

        buf.compact();
        assert_eq!(buf.unread(), b"z");
        assert_eq!(buf.refill(&mut input).unwrap(), 2);
        assert_eq!(buf.unread(), b"z12");
    }

    #[test]
    fn interrupted_reads_are_retried() {
        struct Flaky(bool);
        impl Read for Flaky {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if std::mem::replace(&mut self.0, false) {
                    return Err(ErrorKind::Interrupted.into());
                }
                buf[0] = b'!';
                Ok(1)
            }
        }

        let mut buf = Buffer::new(2);
        assert_eq!(buf.refill(&mut Flaky(true)).unwrap(), 1);
        assert_eq!(buf.unread(), b"!");
    }
}
