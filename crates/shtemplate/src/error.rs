use std::io;

use bstr::BString;
use thiserror::Error;

/// Failure of a single [`Scanner::find`](crate::Scanner::find) call.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The delimiter has no bytes to match.
    #[error("delimiter must not be empty")]
    EmptyDelimiter,
    /// The delimiter cannot fit in the scanner buffer.
    #[error("delimiter of {len} bytes cannot fit in a {capacity} byte buffer")]
    DelimiterTooLong {
        /// Length of the rejected delimiter.
        len: usize,
        /// Capacity of the scanner buffer.
        capacity: usize,
    },
    /// The input source failed with something other than end of stream.
    #[error("reading input")]
    Read(#[source] io::Error),
    /// The output sink rejected a write.
    #[error("writing output")]
    Write(#[source] io::Error),
}

impl ScanError {
    /// Whether the error is a configuration problem raised before any I/O.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::EmptyDelimiter | Self::DelimiterTooLong { .. })
    }
}

/// Failure of a [`BlockProcessor`](crate::BlockProcessor) run.
///
/// `E` is the error type of the [`Executor`](crate::Executor) driving the run.
#[derive(Error, Debug)]
pub enum ProcessError<E: core::error::Error + 'static> {
    /// The scanner failed on the input or the passthrough sink.
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// The capture accumulator could not be reset or flushed.
    #[error("capture buffer")]
    Capture(#[source] io::Error),
    /// The input ended inside a block.
    #[error("unclosed delimiter: '{open}' at byte {offset} has no matching '{close}'")]
    UnclosedDelimiter {
        /// Delimiter that opened the block.
        open: BString,
        /// Delimiter that never appeared.
        close: BString,
        /// Stream offset of the open delimiter.
        offset: u64,
    },
    /// The executor rejected a block; the rest of the input is not processed.
    #[error("block {index} opened at byte {offset} failed")]
    Executor {
        /// Zero-based index of the failed block.
        index: usize,
        /// Stream offset of the block's open delimiter.
        offset: u64,
        /// Failure reported by the executor.
        #[source]
        source: E,
    },
}

impl<E: core::error::Error + 'static> ProcessError<E> {
    /// Whether the input itself was malformed rather than the system failing.
    #[must_use]
    pub fn is_unclosed(&self) -> bool {
        matches!(self, Self::UnclosedDelimiter { .. })
    }
}
