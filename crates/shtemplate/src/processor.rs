//! Block processor: alternates between copying literal text and capturing
//! code blocks, running each captured block through an [`Executor`].

use std::io::{Read, Write};

use bstr::BString;
use tracing::{debug, info};

use crate::{
    capture::Capture,
    error::{ProcessError, ScanError},
    executor::{Block, Executor},
    options::Options,
    scanner::{Outcome, Scanner},
};

/// What the processor is searching for next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Copying literal text to the output until an open delimiter.
    AwaitingOpen,
    /// Capturing a block opened at `opened_at` until a close delimiter.
    AwaitingClose { opened_at: u64 },
}

/// Summary of a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    /// Number of blocks executed.
    pub blocks: usize,
    /// Bytes consumed from the input.
    pub bytes_read: u64,
}

/// Drives one [`Scanner`] over the input, routing literal text to the output
/// and block text to a [`Capture`].
///
/// Both delimiters are searched for with the same scanner, so the open and
/// close searches share one buffer and one set of boundary rules.
#[derive(Debug)]
pub struct BlockProcessor<R> {
    scanner: Scanner<R>,
    open: BString,
    close: BString,
    capture: Capture,
    blocks: usize,
}

impl<R: Read> BlockProcessor<R> {
    /// Build a processor over `input`, accumulating blocks in `capture`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either delimiter is empty or does not
    /// fit in `options.buffer_capacity`. No input is read.
    pub fn new(input: R, options: &Options, capture: Capture) -> Result<Self, ScanError> {
        options.validate()?;
        Ok(Self {
            scanner: Scanner::new(input, options.buffer_capacity),
            open: options.open.clone(),
            close: options.close.clone(),
            capture,
            blocks: 0,
        })
    }

    /// Copy the input to `out`, replacing every block with what `executor`
    /// writes for it.
    ///
    /// # Errors
    ///
    /// - [`ProcessError::UnclosedDelimiter`] if the input ends inside a block;
    ///   none of that block's text reaches `out`.
    /// - [`ProcessError::Executor`] as soon as a block fails.
    /// - [`ProcessError::Scan`] or [`ProcessError::Capture`] on I/O failures.
    ///
    /// Output written before an error is not rolled back.
    pub fn process<X: Executor>(
        &mut self,
        out: &mut dyn Write,
        executor: &mut X,
    ) -> Result<Report, ProcessError<X::Error>> {
        let mut mode = Mode::AwaitingOpen;
        loop {
            mode = match mode {
                Mode::AwaitingOpen => match self.scanner.find(&self.open, out)? {
                    Outcome::EndOfStream => {
                        let report = Report {
                            blocks: self.blocks,
                            bytes_read: self.scanner.position(),
                        };
                        info!(blocks = report.blocks, bytes = report.bytes_read, "input processed");
                        return Ok(report);
                    }
                    Outcome::Found { offset } => {
                        debug!(index = self.blocks, offset, "block opened");
                        self.capture.reset().map_err(ProcessError::Capture)?;
                        Mode::AwaitingClose { opened_at: offset }
                    }
                },
                Mode::AwaitingClose { opened_at } => {
                    match self.scanner.find(&self.close, &mut self.capture)? {
                        Outcome::EndOfStream => {
                            return Err(ProcessError::UnclosedDelimiter {
                                open: self.open.clone(),
                                close: self.close.clone(),
                                offset: opened_at,
                            });
                        }
                        Outcome::Found { offset } => {
                            self.run_block(opened_at, offset, out, executor)?;
                            Mode::AwaitingOpen
                        }
                    }
                }
            };
        }
    }

    fn run_block<X: Executor>(
        &mut self,
        opened_at: u64,
        closed_at: u64,
        out: &mut dyn Write,
        executor: &mut X,
    ) -> Result<(), ProcessError<X::Error>> {
        let index = self.blocks;
        self.capture.flush().map_err(ProcessError::Capture)?;
        debug!(index, opened_at, closed_at, len = self.capture.len(), "block closed");

        let block = Block::new(index, opened_at, closed_at, &self.capture);
        executor
            .execute(&block, out)
            .map_err(|source| ProcessError::Executor {
                index,
                offset: opened_at,
                source,
            })?;

        self.blocks += 1;
        self.capture.reset().map_err(ProcessError::Capture)
    }

    /// Number of blocks executed so far.
    #[must_use]
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// The scanner driving this processor.
    #[must_use]
    pub fn scanner(&self) -> &Scanner<R> {
        &self.scanner
    }

    /// Give back the input and the capture accumulator.
    pub fn into_parts(self) -> (R, Capture) {
        (self.scanner.into_inner(), self.capture)
    }
}

/// Expand `input` into `output` with an in-memory capture.
///
/// # Errors
///
/// See [`BlockProcessor::new`] and [`BlockProcessor::process`].
pub fn process<R: Read, X: Executor>(
    input: R,
    output: &mut dyn Write,
    executor: &mut X,
    options: &Options,
) -> Result<Report, ProcessError<X::Error>> {
    BlockProcessor::new(input, options, Capture::in_memory())?.process(output, executor)
}
