//! Scanner: bounded-memory search for a delimiter in a byte stream.
//!
//! The scanner owns one fixed-size buffer and pulls from an input source to
//! fill it. Each [`Scanner::find`] call copies every byte that precedes the
//! next delimiter occurrence to the sink it is given, consumes the delimiter
//! itself and stops. Callers swap the sink between calls to route literal text
//! and captured text to different places while sharing one buffer.
//!
//! Straddling delimiters
//! - When the buffered region does not contain the delimiter but ends with a
//!   proper prefix of it, those trailing bytes are held back instead of being
//!   flushed. They are moved to the front of the buffer and the free space
//!   behind them is refilled, so the next search sees the prefix followed by
//!   fresh input.
//! - Only the longest such prefix is held. Any occurrence starting earlier
//!   would either lie fully inside the region (and have been found) or leave a
//!   longer prefix as the suffix.
//! - If the input ends while bytes are held back, they were not a delimiter
//!   and are flushed before reporting end of stream.
//!
//! Invariants
//! - Every non-delimiter byte reaches a sink exactly once, in input order.
//! - No byte of a delimiter occurrence ever reaches a sink.
//! - Results do not depend on the buffer capacity or on how the input splits
//!   its reads, as long as the delimiter fits in the buffer.
//!
//! Example
//! ```rust
//! use shtemplate::{Outcome, Scanner};
//!
//! let mut scanner = Scanner::new(&b"abcd"[..], 2);
//! let mut out = Vec::new();
//! assert_eq!(scanner.find(b"bc", &mut out).unwrap(), Outcome::Found { offset: 1 });
//! assert_eq!(out, b"a");
//! assert_eq!(scanner.find(b"bc", &mut out).unwrap(), Outcome::EndOfStream);
//! assert_eq!(out, b"ad");
//! ```

mod buffer;

use std::io::{Read, Write};

use bstr::ByteSlice;
use tracing::trace;

use self::buffer::Buffer;
use crate::{error::ScanError, options::check_delimiter};

/// Result of one [`Scanner::find`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The delimiter starts at `offset` bytes into the input stream.
    Found {
        /// Absolute stream offset of the first delimiter byte.
        offset: u64,
    },
    /// The input is exhausted and everything read has been flushed.
    EndOfStream,
}

/// Streaming delimiter finder over a single fixed-size buffer.
///
/// A scanner is not meant to be shared; every operation takes `&mut self`.
#[derive(Debug)]
pub struct Scanner<R> {
    input: R,
    buf: Buffer,
    /// Stream offset of the first unconsumed buffered byte.
    position: u64,
}

impl<R: Read> Scanner<R> {
    /// Create a scanner reading from `input` with a buffer of `capacity` bytes.
    ///
    /// Delimiters longer than `capacity` are rejected by [`Scanner::find`].
    #[must_use]
    pub fn new(input: R, capacity: usize) -> Self {
        Self {
            input,
            buf: Buffer::new(capacity),
            position: 0,
        }
    }

    /// Copy input to `sink` up to the next occurrence of `delimiter`.
    ///
    /// On [`Outcome::Found`] the delimiter has been consumed and the bytes in
    /// front of it written; on [`Outcome::EndOfStream`] the whole remaining
    /// input has been written.
    ///
    /// # Errors
    ///
    /// Configuration errors ([`ScanError::EmptyDelimiter`],
    /// [`ScanError::DelimiterTooLong`]) are returned before any I/O. Input and
    /// sink failures abort the search; bytes already written stay written.
    pub fn find(&mut self, delimiter: &[u8], sink: &mut dyn Write) -> Result<Outcome, ScanError> {
        check_delimiter(delimiter, self.buf.capacity())?;

        if self.buf.is_empty() && self.fill()? == 0 {
            return Ok(Outcome::EndOfStream);
        }

        loop {
            let window = self.buf.unread();

            if let Some(i) = window.find(delimiter) {
                let offset = self.position + i as u64;
                self.flush(i, sink)?;
                self.skip(delimiter.len());
                return Ok(Outcome::Found { offset });
            }

            let held = straddle_len(window, delimiter);
            let safe = window.len() - held;
            self.flush(safe, sink)?;

            if held == 0 {
                if self.fill()? == 0 {
                    return Ok(Outcome::EndOfStream);
                }
                continue;
            }

            trace!(held, position = self.position, "delimiter prefix straddles refill");
            self.buf.compact();
            if self.fill()? == 0 {
                // The held prefix never completed.
                self.flush(held, sink)?;
                return Ok(Outcome::EndOfStream);
            }
        }
    }

    /// Stream offset of the next byte [`Scanner::find`] will examine.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Size of the scanner buffer in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Bytes read from the input but not yet handed to a sink.
    #[must_use]
    pub fn buffered(&self) -> &[u8] {
        self.buf.unread()
    }

    /// Borrow the underlying input.
    pub fn get_ref(&self) -> &R {
        &self.input
    }

    /// Give back the underlying input, dropping any buffered bytes.
    pub fn into_inner(self) -> R {
        self.input
    }

    fn fill(&mut self) -> Result<usize, ScanError> {
        let n = self.buf.refill(&mut self.input).map_err(ScanError::Read)?;
        trace!(n, buffered = self.buf.unread().len(), "refilled scanner buffer");
        Ok(n)
    }

    fn flush(&mut self, n: usize, sink: &mut dyn Write) -> Result<(), ScanError> {
        if n > 0 {
            sink.write_all(&self.buf.unread()[..n])
                .map_err(ScanError::Write)?;
            self.skip(n);
        }
        Ok(())
    }

    fn skip(&mut self, n: usize) {
        self.buf.consume(n);
        self.position += n as u64;
    }
}

/// Length of the longest proper prefix of `delimiter` that ends `window`.
///
/// `window = "xyab"`, `delimiter = "abc"` gives `2`: the input may continue
/// with `c` and complete the delimiter.
pub(crate) fn straddle_len(window: &[u8], delimiter: &[u8]) -> usize {
    (1..delimiter.len())
        .rev()
        .find(|&len| window.ends_with(&delimiter[..len]))
        .unwrap_or(0)
}
