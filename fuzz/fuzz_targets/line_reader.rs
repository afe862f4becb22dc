#![no_main]

use std::io::{Cursor, Read};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use tailwatch_engine::tailer::LineReader;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 원시 읽기 버퍼 크기 (1..=256으로 제한)
    buffer_size: u8,
    /// 소스가 한 번에 내주는 최대 바이트 수
    chunk: u8,
    data: Vec<u8>,
}

/// 한 번의 read 호출에 최대 `chunk` 바이트만 내주는 소스
struct Chunked {
    inner: Cursor<Vec<u8>>,
    chunk: usize,
}

impl Read for Chunked {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let len = buf.len().min(self.chunk);
        self.inner.read(&mut buf[..len])
    }
}

fuzz_target!(|input: FuzzInput| {
    let mut reader = LineReader::new(usize::from(input.buffer_size).max(1));
    let mut source = Chunked {
        inner: Cursor::new(input.data.clone()),
        chunk: usize::from(input.chunk).max(1),
    };

    let mut consumed = 0u64;
    let mut lines = 0usize;
    while let Ok(Some(line)) = reader.next_line(&mut source, &mut consumed) {
        assert!(!line.contains('\n'));
        lines += 1;
    }

    let terminators = input.data.iter().filter(|&&b| b == b'\n').count();
    assert_eq!(lines, terminators);
    assert_eq!(consumed, input.data.len() as u64);
});
