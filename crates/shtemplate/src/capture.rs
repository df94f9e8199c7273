//! Capture accumulator for the text between an open and a close delimiter.
//!
//! A [`Capture`] is the sink the scanner writes to while a block is open. It
//! is handed to the processor by the caller, reset after every block and, for
//! the file-backed variant, removed from disk when dropped.

use std::{
    borrow::Cow,
    fs,
    io::{self, Seek, Write},
    path::Path,
};

use tempfile::NamedTempFile;

/// Where captured block text is accumulated.
///
/// - `Memory(Vec<u8>)`: keep the block in memory.
/// - `File`: spill the block to a named temporary file, bounding memory for
///   large blocks and giving executors a path they can run directly.
#[derive(Debug)]
pub enum Capture {
    /// In-memory accumulator.
    Memory(Vec<u8>),
    /// Temporary file accumulator; `len` counts bytes written since the last
    /// reset.
    File {
        /// Backing file, deleted on drop.
        file: NamedTempFile,
        /// Bytes written since the last reset.
        len: u64,
    },
}

impl Default for Capture {
    fn default() -> Self {
        Capture::Memory(Vec::new())
    }
}

impl Capture {
    /// An empty in-memory accumulator.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// An empty accumulator backed by a new file in the system temp directory.
    ///
    /// # Errors
    ///
    /// Fails if the temporary file cannot be created.
    pub fn temp_file() -> io::Result<Self> {
        Self::from_builder(&Self::builder(), None)
    }

    /// An empty accumulator backed by a new file inside `dir`.
    ///
    /// # Errors
    ///
    /// Fails if the temporary file cannot be created.
    pub fn temp_file_in(dir: impl AsRef<Path>) -> io::Result<Self> {
        Self::from_builder(&Self::builder(), Some(dir.as_ref()))
    }

    fn builder() -> tempfile::Builder<'static, 'static> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("shtemplate-").suffix(".sh");
        builder
    }

    fn from_builder(builder: &tempfile::Builder<'_, '_>, dir: Option<&Path>) -> io::Result<Self> {
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(Capture::File { file, len: 0 })
    }

    /// Number of bytes captured since the last reset.
    #[must_use]
    pub fn len(&self) -> u64 {
        match self {
            Capture::Memory(buf) => buf.len() as u64,
            Capture::File { len, .. } => *len,
        }
    }

    /// Whether nothing has been captured since the last reset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path of the backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Capture::Memory(_) => None,
            Capture::File { file, .. } => Some(file.path()),
        }
    }

    /// The captured bytes.
    ///
    /// Borrowed for the in-memory variant; read back from disk for the file
    /// variant.
    ///
    /// # Errors
    ///
    /// Fails if the backing file cannot be read.
    pub fn contents(&self) -> io::Result<Cow<'_, [u8]>> {
        match self {
            Capture::Memory(buf) => Ok(Cow::Borrowed(buf)),
            Capture::File { file, .. } => fs::read(file.path()).map(Cow::Owned),
        }
    }

    /// Discard the captured bytes, keeping the allocation or the file.
    ///
    /// # Errors
    ///
    /// Fails if the backing file cannot be truncated.
    pub fn reset(&mut self) -> io::Result<()> {
        match self {
            Capture::Memory(buf) => buf.clear(),
            Capture::File { file, len } => {
                let file = file.as_file_mut();
                file.set_len(0)?;
                file.rewind()?;
                *len = 0;
            }
        }
        Ok(())
    }
}

impl Write for Capture {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        match self {
            Capture::Memory(buf) => buf.write(bytes),
            Capture::File { file, len } => {
                let n = file.write(bytes)?;
                *len += n as u64;
                Ok(n)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Capture::Memory(_) => Ok(()),
            Capture::File { file, .. } => file.flush(),
        }
    }
}
