//! Executors turn a captured block into output spliced back into the stream.

use std::{
    borrow::Cow,
    ffi::{OsStr, OsString},
    fs::File,
    io::{self, Write},
    path::Path,
    process::{Command, ExitStatus, Stdio},
};

use thiserror::Error;
use tracing::debug;

use crate::capture::Capture;

/// Read-only view of one captured block, handed to an [`Executor`].
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
    /// Zero-based position of the block in the input.
    pub index: usize,
    /// Stream offset of the open delimiter.
    pub opened_at: u64,
    /// Stream offset of the close delimiter.
    pub closed_at: u64,
    pub(crate) capture: &'a Capture,
}

impl<'a> Block<'a> {
    /// Wrap an accumulator as block number `index`.
    #[must_use]
    pub fn new(index: usize, opened_at: u64, closed_at: u64, capture: &'a Capture) -> Self {
        Self {
            index,
            opened_at,
            closed_at,
            capture,
        }
    }

    /// The text between the delimiters.
    ///
    /// # Errors
    ///
    /// Fails if a file-backed capture cannot be read back.
    pub fn contents(&self) -> io::Result<Cow<'a, [u8]>> {
        self.capture.contents()
    }

    /// Path of the file holding the text, for file-backed captures.
    #[must_use]
    pub fn path(&self) -> Option<&'a Path> {
        self.capture.path()
    }

    /// Length of the text in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.capture.len()
    }

    /// Whether the delimiters enclosed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.capture.is_empty()
    }
}

/// Runs a captured block.
///
/// Implementations write whatever the block produces to `out`, the same sink
/// the processor uses for literal text, and return once the block is done.
pub trait Executor {
    /// Failure reported for a block.
    type Error: core::error::Error + 'static;

    /// Run `block`, writing its output to `out`.
    ///
    /// # Errors
    ///
    /// Any error aborts the run.
    fn execute(&mut self, block: &Block<'_>, out: &mut dyn Write) -> Result<(), Self::Error>;
}

/// Failure of a [`ShellExecutor`] block.
#[derive(Error, Debug)]
pub enum ShellError {
    /// The output pipe could not be created.
    #[error("creating output pipe")]
    Pipe(#[source] io::Error),
    /// The shared stdin handle could not be duplicated for the block.
    #[error("sharing stdin with block")]
    Stdin(#[source] io::Error),
    /// The shell could not be started.
    #[error("spawning '{shell}'")]
    Spawn {
        /// Shell binary that failed to start.
        shell: String,
        /// Underlying spawn failure.
        #[source]
        source: io::Error,
    },
    /// The block text could not be read back from its capture.
    #[error("reading captured block")]
    Capture(#[source] io::Error),
    /// Copying the shell output to the passthrough sink failed.
    #[error("relaying block output")]
    Relay(#[source] io::Error),
    /// Waiting for the shell failed.
    #[error("waiting for '{shell}'")]
    Wait {
        /// Shell binary being waited on.
        shell: String,
        /// Underlying wait failure.
        #[source]
        source: io::Error,
    },
    /// The shell ran and reported failure.
    #[error("'{shell}' exited with {status}")]
    Status {
        /// Shell binary that failed.
        shell: String,
        /// Exit status of the shell.
        status: ExitStatus,
    },
}

/// Standard input given to every block.
#[derive(Debug, Default)]
pub enum BlockStdin {
    /// Blocks read nothing.
    #[default]
    Null,
    /// Blocks share the standard input of this process.
    Inherit,
    /// Blocks share a file handle; what one block reads is gone for the next.
    File(File),
}

impl BlockStdin {
    fn stdio(&self) -> io::Result<Stdio> {
        Ok(match self {
            BlockStdin::Null => Stdio::null(),
            BlockStdin::Inherit => Stdio::inherit(),
            BlockStdin::File(file) => Stdio::from(file.try_clone()?),
        })
    }
}

/// Runs each block with a shell and relays its combined stdout and stderr.
///
/// In-memory blocks run as `shell -c <block> <arg0> <args>...`, file-backed
/// blocks as `shell <path> <args>...`. Either way the first user argument is
/// `$1`. The environment is inherited.
///
/// ```rust,no_run
/// use shtemplate::{Options, ShellExecutor, process};
///
/// let mut executor = ShellExecutor::new("sh").args(["world"]);
/// let mut out = Vec::new();
/// process(&b"hello, %{ printf $1 }%"[..], &mut out, &mut executor, &Options::default())
///     .unwrap();
/// assert_eq!(out, b"hello, world");
/// ```
#[derive(Debug)]
pub struct ShellExecutor {
    shell: OsString,
    arg0: OsString,
    args: Vec<OsString>,
    stdin: BlockStdin,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new("sh")
    }
}

impl ShellExecutor {
    /// Run blocks with `shell`, null stdin and no arguments.
    #[must_use]
    pub fn new(shell: impl Into<OsString>) -> Self {
        Self {
            shell: shell.into(),
            arg0: OsString::from(env!("CARGO_PKG_NAME")),
            args: Vec::new(),
            stdin: BlockStdin::Null,
        }
    }

    /// Value of `$0` for inline blocks.
    #[must_use]
    pub fn arg0(mut self, arg0: impl Into<OsString>) -> Self {
        self.arg0 = arg0.into();
        self
    }

    /// Positional arguments, exposed as `$1`, `$2`, ...
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Standard input for every block.
    #[must_use]
    pub fn stdin(mut self, stdin: BlockStdin) -> Self {
        self.stdin = stdin;
        self
    }

    fn shell_name(&self) -> String {
        self.shell.to_string_lossy().into_owned()
    }

    fn command(&self, block: &Block<'_>) -> Result<Command, ShellError> {
        let mut cmd = Command::new(&self.shell);
        if let Some(path) = block.path() {
            cmd.arg(path);
        } else {
            let script = block.contents().map_err(ShellError::Capture)?;
            cmd.arg("-c").arg(script_arg(&script)).arg(&self.arg0);
        }
        cmd.args(&self.args);
        Ok(cmd)
    }
}

impl Executor for ShellExecutor {
    type Error = ShellError;

    fn execute(&mut self, block: &Block<'_>, out: &mut dyn Write) -> Result<(), ShellError> {
        let (mut reader, writer) = io::pipe().map_err(ShellError::Pipe)?;
        let mut child = {
            let mut cmd = self.command(block)?;
            cmd.stdin(self.stdin.stdio().map_err(ShellError::Stdin)?)
                .stdout(writer.try_clone().map_err(ShellError::Pipe)?)
                .stderr(writer);
            debug!(index = block.index, shell = ?self.shell, "spawning block");
            cmd.spawn().map_err(|source| ShellError::Spawn {
                shell: self.shell_name(),
                source,
            })?
            // `cmd` drops here, closing our copies of the pipe's write end so
            // the relay below sees EOF once the child exits.
        };

        if let Err(err) = io::copy(&mut reader, out) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ShellError::Relay(err));
        }

        let status = child.wait().map_err(|source| ShellError::Wait {
            shell: self.shell_name(),
            source,
        })?;
        debug!(index = block.index, %status, "block finished");
        if status.success() {
            Ok(())
        } else {
            Err(ShellError::Status {
                shell: self.shell_name(),
                status,
            })
        }
    }
}

#[cfg(unix)]
fn script_arg(script: &[u8]) -> Cow<'_, OsStr> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(OsStr::from_bytes(script))
}

#[cfg(not(unix))]
fn script_arg(script: &[u8]) -> Cow<'_, OsStr> {
    use bstr::ByteSlice;
    match script.to_str_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(OsStr::new(s)),
        Cow::Owned(s) => Cow::Owned(OsString::from(s)),
    }
}
