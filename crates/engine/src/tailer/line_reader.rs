//! 바이트 단위 라인 분리기
//!
//! 원시 읽기 버퍼(`buffer_size`)로 소스에서 바이트를 읽고 LF(`\n`) 기준으로
//! 라인을 분리합니다. 종결자가 아직 도착하지 않은 부분 라인은 라인 버퍼에
//! 보존되어 다음 호출에서 이어 붙습니다.
//!
//! - 라인 끝의 CR(`\r`) 하나는 제거합니다 (CRLF 지원).
//! - 라인 버퍼가 `buffer_size`보다 커지면 라인 전달 후 원래 크기로 줄입니다.
//! - 잘못된 UTF-8 시퀀스는 U+FFFD로 대체합니다.

use std::io::{self, Read};

use bytes::BytesMut;

const LF: u8 = b'\n';
const CR: u8 = b'\r';

/// LF 기준 라인 분리기
///
/// 소스(`Read`)는 호출마다 전달받으므로 파일 핸들을 닫았다가 다시 열어도
/// 버퍼에 남은 바이트와 부분 라인이 유지됩니다.
#[derive(Debug)]
pub struct LineReader {
    /// 원시 읽기 버퍼
    buf: Box<[u8]>,
    /// 버퍼 내 다음 처리 위치
    pos: usize,
    /// 버퍼에 채워진 바이트 수
    cap: usize,
    /// 조립 중인 라인
    line: BytesMut,
    /// 라인 버퍼 기본 용량
    line_capacity: usize,
}

impl LineReader {
    /// 새 라인 분리기를 생성합니다.
    ///
    /// `buffer_size`가 0이면 1바이트 버퍼를 사용합니다.
    pub fn new(buffer_size: usize) -> Self {
        let size = buffer_size.max(1);
        Self {
            buf: vec![0u8; size].into_boxed_slice(),
            pos: 0,
            cap: 0,
            line: BytesMut::with_capacity(size),
            line_capacity: size,
        }
    }

    /// 다음 완성 라인을 반환합니다.
    ///
    /// 소스가 EOF에 도달하면 `Ok(None)`을 반환하고, 그때까지 읽은 부분 라인은
    /// 버퍼에 남겨둡니다. `consumed`에는 소스에서 새로 읽은 바이트 수가 더해집니다.
    pub fn next_line<R: Read>(
        &mut self,
        source: &mut R,
        consumed: &mut u64,
    ) -> io::Result<Option<String>> {
        loop {
            if self.pos == self.cap {
                let n = read_retrying(source, &mut self.buf)?;
                if n == 0 {
                    return Ok(None);
                }
                *consumed += n as u64;
                self.pos = 0;
                self.cap = n;
            }

            let window = &self.buf[self.pos..self.cap];
            match window.iter().position(|&b| b == LF) {
                Some(idx) => {
                    self.line.extend_from_slice(&window[..idx]);
                    self.pos += idx + 1;
                    return Ok(Some(self.take_line()));
                }
                None => {
                    self.line.extend_from_slice(window);
                    self.pos = self.cap;
                }
            }
        }
    }

    /// 읽기 버퍼에 아직 처리하지 않은 바이트가 있는지 여부
    pub fn has_buffered(&self) -> bool {
        self.pos < self.cap
    }

    /// 조립 중인 부분 라인의 바이트 수
    pub fn partial_len(&self) -> usize {
        self.line.len()
    }

    fn take_line(&mut self) -> String {
        let mut end = self.line.len();
        if end > 0 && self.line[end - 1] == CR {
            end -= 1;
        }
        let text = String::from_utf8_lossy(&self.line[..end]).into_owned();

        if self.line.capacity() > self.line_capacity {
            self.line = BytesMut::with_capacity(self.line_capacity);
        } else {
            self.line.clear();
        }
        text
    }
}

fn read_retrying<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match source.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}
