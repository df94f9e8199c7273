use std::io::{self, Read};

/// A reader that hands out its payload in a fixed sequence of read sizes.
///
/// Each `read` call returns at most the next size from `sizes` (cycling), so
/// tests can force delimiters to fall on arbitrary read boundaries. A size of
/// zero is treated as one to keep zero-length reads meaning end of stream.
#[derive(Debug, Clone)]
pub struct ChunkedReader<'a> {
    payload: &'a [u8],
    sizes: Vec<usize>,
    next: usize,
}

impl<'a> ChunkedReader<'a> {
    /// Serve `payload` in reads of `sizes` bytes, repeating the sizes as needed.
    #[must_use]
    pub fn new(payload: &'a [u8], sizes: Vec<usize>) -> Self {
        Self {
            payload,
            sizes,
            next: 0,
        }
    }

    /// Serve `payload` one byte per read.
    #[must_use]
    pub fn bytewise(payload: &'a [u8]) -> Self {
        Self::new(payload, vec![1])
    }
}

impl Read for ChunkedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let limit = if self.sizes.is_empty() {
            buf.len()
        } else {
            let size = self.sizes[self.next % self.sizes.len()].max(1);
            self.next += 1;
            size
        };
        let n = limit.min(buf.len()).min(self.payload.len());
        let (head, tail) = self.payload.split_at(n);
        buf[..n].copy_from_slice(head);
        self.payload = tail;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunked_reader_cycles_sizes() {
        let mut reader = ChunkedReader::new(b"abcdefg", vec![1, 3]);
        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 1);
        assert_eq!(reader.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"bcd");
        assert_eq!(reader.read(&mut buf).unwrap(), 1);
        assert_eq!(reader.read(&mut buf).unwrap(), 2);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }
}
