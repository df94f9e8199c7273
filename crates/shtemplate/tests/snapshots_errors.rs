#![allow(missing_docs)]

use std::io::{self, Write};

use shtemplate::{Block, Executor, Options, ProcessError, ScanError, Scanner, process};

struct Refuse;

impl Executor for Refuse {
    type Error = io::Error;

    fn execute(&mut self, _: &Block<'_>, _: &mut dyn Write) -> io::Result<()> {
        Err(io::Error::other("no shell today"))
    }
}

fn render<E: core::error::Error>(err: &E) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\n  caused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

fn expand_err(input: &[u8], options: &Options) -> ProcessError<io::Error> {
    process(input, &mut io::sink(), &mut Refuse, options).unwrap_err()
}

#[test]
fn snapshot_unclosed_delimiter() {
    let err = expand_err(b"line one\n%{ never closed", &Options::default());
    insta::assert_snapshot!(render(&err), @"unclosed delimiter: '%{' at byte 9 has no matching '}%'");
}

#[test]
fn snapshot_executor_failure() {
    let err = expand_err(b"ok %{ date }%", &Options::default());
    insta::assert_snapshot!(render(&err), @r"
    block 0 opened at byte 3 failed
      caused by: no shell today
    ");
}

#[test]
fn snapshot_delimiter_too_long() {
    let options = Options {
        close: "]]]]]".into(),
        buffer_capacity: 4,
        ..Default::default()
    };
    let err = expand_err(b"", &options);
    insta::assert_snapshot!(render(&err), @"delimiter of 5 bytes cannot fit in a 4 byte buffer");
}

#[test]
fn snapshot_read_failure() {
    struct Broken;
    impl io::Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away"))
        }
    }

    let mut scanner = Scanner::new(Broken, 16);
    let err = scanner.find(b"%{", &mut io::sink()).unwrap_err();
    assert!(matches!(err, ScanError::Read(_)));
    insta::assert_snapshot!(render(&err), @r"
    reading input
      caused by: peer went away
    ");
}
