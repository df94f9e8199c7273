#![cfg(unix)]
#![allow(missing_docs)]

use std::{fs::File, io::Write};

use rstest::rstest;
use shtemplate::{
    BlockProcessor, BlockStdin, Capture, Options, ProcessError, ShellError, ShellExecutor,
    chunk_utils::ChunkedReader, process,
};

fn expand(input: &str, executor: &mut ShellExecutor) -> Result<String, ProcessError<ShellError>> {
    let mut out = Vec::new();
    process(input.as_bytes(), &mut out, executor, &Options::default())?;
    Ok(String::from_utf8(out).expect("utf-8 output"))
}

fn stdin_file(contents: &str) -> File {
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.sync_all().unwrap();
    let mut reopened = file.try_clone().unwrap();
    std::io::Seek::rewind(&mut reopened).unwrap();
    reopened
}

#[rstest]
#[case::simple_hello_world("hello, world", "hello, world")]
#[case::closed_delimiter("hello, %{ printf world }%", "hello, world")]
#[case::multiple_blocks("%{ printf a }%-%{ printf b }%", "a-b")]
#[case::multiline_block("x%{\nfor i in 1 2 3; do\n  printf $i\ndone\n}%y", "x123y")]
#[case::stderr_is_spliced("%{ printf oops >&2 }%", "oops")]
fn expands_with_shell(#[case] input: &str, #[case] expected: &str) {
    let mut executor = ShellExecutor::new("sh");
    assert_eq!(expand(input, &mut executor).unwrap(), expected);
}

#[test]
fn positional_arguments_start_at_one() {
    let mut executor = ShellExecutor::new("sh")
        .arg0("page.tmpl")
        .args(["world", "again"]);
    assert_eq!(
        expand("hello, %{ printf $1 }%; %{ printf \"$0 $2 $#\" }%", &mut executor).unwrap(),
        "hello, world; page.tmpl again 2"
    );
}

#[test]
fn blocks_share_one_stdin() {
    let mut executor = ShellExecutor::new("sh").stdin(BlockStdin::File(stdin_file("world\nagain\n")));
    assert_eq!(
        expand(
            "hello, %{ read -r w; printf \"$w\" }% / %{ cat - }%",
            &mut executor
        )
        .unwrap(),
        "hello, world / again\n"
    );
}

#[test]
fn cat_reads_stdin() {
    let mut executor = ShellExecutor::new("sh").stdin(BlockStdin::File(stdin_file("world")));
    assert_eq!(expand("hello, %{ cat - }%", &mut executor).unwrap(), "hello, world");
}

#[test]
fn failing_block_aborts_with_partial_output() {
    let mut executor = ShellExecutor::new("sh");
    let mut out = Vec::new();
    let err = process(
        &b"before %{ printf partial; exit 3 }% after %{ printf never }%"[..],
        &mut out,
        &mut executor,
        &Options::default(),
    )
    .unwrap_err();

    match err {
        ProcessError::Executor {
            index: 0,
            offset: 7,
            source: ShellError::Status { status, .. },
        } => assert_eq!(status.code(), Some(3)),
        other => panic!("expected a failed block, got {other:?}"),
    }
    assert_eq!(out, b"before partial");
}

#[test]
fn missing_shell_is_a_spawn_error() {
    let mut executor = ShellExecutor::new("/nonexistent/shtemplate-shell");
    let err = expand("%{ true }%", &mut executor).unwrap_err();
    assert!(matches!(
        err,
        ProcessError::Executor {
            source: ShellError::Spawn { .. },
            ..
        }
    ));
}

#[test]
fn unclosed_block_never_runs() {
    let mut executor = ShellExecutor::new("sh");
    let err = expand("hello, %{ printf nope", &mut executor).unwrap_err();
    assert!(err.is_unclosed());
}

#[test]
fn script_file_blocks_with_small_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let options = Options {
        buffer_capacity: 3,
        ..Default::default()
    };
    let template = b"hello, %{ printf \"$1\" }% and %{ n=${0##*/}; printf '%.11s' \"$n\" }%";
    let mut processor = BlockProcessor::new(
        ChunkedReader::bytewise(template),
        &options,
        Capture::temp_file_in(dir.path()).unwrap(),
    )
    .unwrap();
    let mut executor = ShellExecutor::new("sh").args(["world"]);
    let mut out = Vec::new();

    let report = processor.process(&mut out, &mut executor).unwrap();
    assert_eq!(report.blocks, 2);
    assert_eq!(String::from_utf8(out).unwrap(), "hello, world and shtemplate-");

    drop(processor);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
