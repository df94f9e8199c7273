//! `shtemplate`: expand a template, running every `%{ ... }%` block with a
//! shell and splicing its output into the text.

use std::{
    ffi::OsString,
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use shtemplate::{
    BlockProcessor, BlockStdin, Capture, DEFAULT_BUFFER_CAPACITY, Options, ProcessError,
    ShellError, ShellExecutor,
};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status for a template that opens a block it never closes.
const EXIT_UNCLOSED: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "shtemplate",
    version,
    about = "Pipe anything inside the delimiters into a shell and substitute its output back into the text",
    after_help = "Blocks see ARGS as $1, $2, ... and inherit the environment, so values can also be passed through environment variables."
)]
struct Cli {
    /// Template to expand; `-` reads the template from stdin.
    template: PathBuf,

    /// Positional arguments for every block.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<OsString>,

    /// Delimiter that opens a block.
    #[arg(long, default_value = "%{", env = "SHTEMPLATE_OPEN")]
    open: String,

    /// Delimiter that closes a block.
    #[arg(long, default_value = "}%", env = "SHTEMPLATE_CLOSE")]
    close: String,

    /// Shell that runs the blocks.
    #[arg(long, default_value = "sh", env = "SHTEMPLATE_SHELL")]
    shell: OsString,

    /// Size of the scanning buffer in bytes.
    #[arg(long, default_value_t = DEFAULT_BUFFER_CAPACITY, env = "SHTEMPLATE_BUFFER_SIZE")]
    buffer_size: usize,

    /// Write each block to a temporary file and run it as a script.
    #[arg(long)]
    script_file: bool,

    /// Directory for the temporary script file.
    #[arg(long, requires = "script_file")]
    temp_dir: Option<PathBuf>,
}

impl Cli {
    fn options(&self) -> Options {
        Options {
            open: self.open.clone().into(),
            close: self.close.clone().into(),
            buffer_capacity: self.buffer_size,
        }
    }

    fn capture(&self) -> Result<Capture> {
        if !self.script_file {
            return Ok(Capture::in_memory());
        }
        let capture = match &self.temp_dir {
            Some(dir) => Capture::temp_file_in(dir),
            None => Capture::temp_file(),
        };
        capture.context("creating temporary script file")
    }

    fn reads_stdin(&self) -> bool {
        self.template.as_os_str() == "-"
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let input: Box<dyn Read> = if cli.reads_stdin() {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(&cli.template)
            .with_context(|| format!("opening template {}", cli.template.display()))?;
        Box::new(file)
    };

    // A template read from stdin leaves nothing for the blocks to share.
    let stdin = if cli.reads_stdin() {
        BlockStdin::Null
    } else {
        BlockStdin::Inherit
    };
    let mut executor = ShellExecutor::new(cli.shell.clone())
        .arg0(cli.template.clone())
        .args(cli.args.iter().cloned())
        .stdin(stdin);

    let mut processor = BlockProcessor::new(input, &cli.options(), cli.capture()?)
        .context("invalid delimiter configuration")?;
    let report = processor.process(out, &mut executor)?;
    debug!(blocks = report.blocks, bytes = report.bytes_read, "template expanded");
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<ProcessError<ShellError>>() {
        Some(err) if err.is_unclosed() => ExitCode::from(EXIT_UNCLOSED),
        _ => ExitCode::FAILURE,
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let mut out = BufWriter::new(io::stdout().lock());
    let result = run(&cli, &mut out);
    // Whatever was expanded before a failure stays visible.
    let flushed = out.flush().context("flushing output");

    match result.and(flushed) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("shtemplate: {err:#}");
            exit_code(&err)
        }
    }
}
