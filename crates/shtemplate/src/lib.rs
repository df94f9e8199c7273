//! Streaming template expansion with shell code blocks.
//!
//! Text outside `%{ ... }%` is copied through unchanged; the text inside each
//! pair of delimiters is handed to an [`Executor`] (by default a shell) and
//! replaced by whatever it writes. Input is scanned with a single fixed-size
//! buffer, so templates of any size stream through in bounded memory.
//!
//! ```rust
//! use std::io::Write;
//!
//! use shtemplate::{Block, Executor, Options, process};
//!
//! struct Shout;
//!
//! impl Executor for Shout {
//!     type Error = std::io::Error;
//!
//!     fn execute(&mut self, block: &Block<'_>, out: &mut dyn Write) -> std::io::Result<()> {
//!         out.write_all(&block.contents()?.to_ascii_uppercase())
//!     }
//! }
//!
//! let mut out = Vec::new();
//! process(&b"say %{hi}%!"[..], &mut out, &mut Shout, &Options::default()).unwrap();
//! assert_eq!(out, b"say HI!");
//! ```

mod capture;
mod error;
mod executor;
mod options;
mod processor;
mod scanner;

#[doc(hidden)]
pub mod chunk_utils;


pub use capture::Capture;
pub use error::{ProcessError, ScanError};
pub use executor::{Block, BlockStdin, Executor, ShellError, ShellExecutor};
pub use options::{DEFAULT_BUFFER_CAPACITY, DEFAULT_CLOSE, DEFAULT_OPEN, Options};
pub use processor::{BlockProcessor, Report, process};
pub use scanner::{Outcome, Scanner};
