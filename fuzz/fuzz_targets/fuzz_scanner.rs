#![no_main]
use std::io::{self, Write};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shtemplate::{
    Block, Executor, Options, ProcessError, chunk_utils::ChunkedReader, process,
};

#[derive(Debug, Arbitrary)]
struct Input {
    open: Vec<u8>,
    close: Vec<u8>,
    capacity: u8,
    sizes: Vec<u8>,
    template: Vec<u8>,
}

struct Bracket;

impl Executor for Bracket {
    type Error = io::Error;

    fn execute(&mut self, block: &Block<'_>, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b"<")?;
        out.write_all(&block.contents()?)?;
        out.write_all(b">")
    }
}

fn expand(
    template: &[u8],
    options: &Options,
    sizes: Vec<usize>,
) -> (Vec<u8>, Result<usize, Option<u64>>) {
    let mut out = Vec::new();
    let result = match process(ChunkedReader::new(template, sizes), &mut out, &mut Bracket, options) {
        Ok(report) => Ok(report.blocks),
        Err(ProcessError::UnclosedDelimiter { offset, .. }) => Err(Some(offset)),
        Err(ProcessError::Scan(err)) if err.is_config() => Err(None),
        Err(err) => panic!("unexpected failure: {err}"),
    };
    (out, result)
}

// Expansion never depends on the buffer size or on how reads are split.
fuzz_target!(|input: Input| {
    let open: Vec<u8> = input.open.into_iter().take(8).collect();
    let close: Vec<u8> = input.close.into_iter().take(8).collect();
    let capacity = usize::from(input.capacity).max(1);
    let sizes = input.sizes.into_iter().map(usize::from).collect();

    let small = Options {
        open: open.clone().into(),
        close: close.clone().into(),
        buffer_capacity: capacity,
    };
    let large = Options {
        open: open.into(),
        close: close.into(),
        buffer_capacity: 1 << 16,
    };

    let (small_out, small_result) = expand(&input.template, &small, sizes);
    if small_result == Err(None) {
        return;
    }
    let (large_out, large_result) = expand(&input.template, &large, Vec::new());
    assert_eq!(small_result, large_result);
    assert_eq!(small_out, large_out);
});
