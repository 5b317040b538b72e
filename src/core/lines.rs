// ULP Validator - core/lines.rs
//
// Permissive line reading over any `BufRead`.
//
// Lines end at `\r\n`, `\n` or a lone `\r` and keep their terminator, so
// files saved with classic Mac line endings split the same way as Unix and
// Windows ones. Invalid UTF-8
// sequences are dropped (not replaced) so a stray binary byte never fails a
// run or alters the neighbouring text. A literal U+FFFD already present in
// the input is valid UTF-8 and is preserved.

use crate::core::model::RawLine;
use std::io::{self, BufRead};

/// Decode `bytes` as UTF-8, discarding every invalid sequence.
pub fn decode_dropping_invalid(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(_) => {
            let mut out = String::with_capacity(bytes.len());
            for chunk in bytes.utf8_chunks() {
                out.push_str(chunk.valid());
            }
            out
        }
    }
}

/// Iterator over the numbered physical lines of a reader.
///
/// Yields `io::Result<RawLine>`; after the first error the iterator is
/// exhausted.
pub struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
    line_number: u64,
    failed: bool,
}

impl<R: BufRead> LossyLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_number: 0,
            failed: false,
        }
    }

    /// Number of the line most recently yielded (0 before the first).
    pub fn line_number(&self) -> u64 {
        self.line_number
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<RawLine>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        self.buf.clear();
        match read_terminated(&mut self.reader, &mut self.buf) {
            Ok(false) => None,
            Ok(true) => {
                self.line_number += 1;
                Some(Ok(RawLine::new(
                    self.line_number,
                    decode_dropping_invalid(&self.buf),
                )))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Append the next line of `reader` to `buf`, terminator included.
/// Returns `false` at end of input with nothing read.
fn read_terminated<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    let mut read_any = false;
    loop {
        let available = match reader.fill_buf() {
            Ok(a) => a,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            return Ok(read_any);
        }
        read_any = true;

        match available.iter().position(|&b| b == b'\n' || b == b'\r') {
            Some(i) => {
                let terminator = available[i];
                buf.extend_from_slice(&available[..=i]);
                reader.consume(i + 1);
                if terminator == b'\r' && next_byte_is(reader, b'\n')? {
                    buf.push(b'\n');
                    reader.consume(1);
                }
                return Ok(true);
            }
            None => {
                let len = available.len();
                buf.extend_from_slice(available);
                reader.consume(len);
            }
        }
    }
}

/// Peek one byte, refilling the buffer if the previous chunk ended exactly
/// on a `\r`.
fn next_byte_is<R: BufRead>(reader: &mut R, expected: u8) -> io::Result<bool> {
    loop {
        match reader.fill_buf() {
            Ok(next) => return Ok(next.first() == Some(&expected)),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Count physical lines with the same terminators `LossyLines` splits on,
/// plus one for trailing bytes without a terminator. No decoding takes
/// place, so encoding problems cannot fail the count.
pub fn count_lines<R: BufRead>(mut reader: R) -> io::Result<u64> {
    let mut count: u64 = 0;
    // The previous byte was `\r`; a `\n` now completes `\r\n`.
    let mut after_cr = false;
    // Bytes seen since the last terminator.
    let mut open_line = false;

    loop {
        let chunk = match reader.fill_buf() {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if chunk.is_empty() {
            break;
        }
        for &b in chunk {
            match b {
                b'\r' => {
                    count += 1;
                    after_cr = true;
                    open_line = false;
                }
                b'\n' => {
                    if !after_cr {
                        count += 1;
                    }
                    after_cr = false;
                    open_line = false;
                }
                _ => {
                    after_cr = false;
                    open_line = true;
                }
            }
        }
        let len = chunk.len();
        reader.consume(len);
    }

    if open_line {
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn lines(input: &[u8]) -> Vec<RawLine> {
        LossyLines::new(Cursor::new(input.to_vec()))
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_lines_keep_terminator_and_number() {
        let got = lines(b"a:b:c\n\nx:y:z");
        assert_eq!(
            got,
            vec![
                RawLine::new(1, "a:b:c\n"),
                RawLine::new(2, "\n"),
                RawLine::new(3, "x:y:z"),
            ]
        );
    }

    #[test]
    fn test_invalid_utf8_is_dropped() {
        let got = lines(b"us\xffer:site:p\xc3w\n");
        assert_eq!(got[0].text, "user:site:pw\n");
    }

    #[test]
    fn test_existing_replacement_char_survives() {
        assert_eq!(decode_dropping_invalid("a\u{FFFD}b".as_bytes()), "a\u{FFFD}b");
    }

    #[test]
    fn test_count_matches_iteration() {
        for input in [
            &b""[..],
            b"\n",
            b"one",
            b"one\n",
            b"one\ntwo",
            b"one\ntwo\n\n",
            b"\xff\xfe\n\xff",
            b"a\rb\rc\r",
            b"a\r\nb\r\n",
            b"a\r\rb",
            b"\r",
            b"x\r\n\ny",
        ] {
            let counted = count_lines(Cursor::new(input.to_vec())).unwrap();
            assert_eq!(counted, lines(input).len() as u64, "input {input:?}");
        }
    }

    #[test]
    fn test_lone_carriage_return_ends_a_line() {
        let got = lines(b"a:b:c\rd:e:f\r\ng:h:i\r");
        assert_eq!(
            got,
            vec![
                RawLine::new(1, "a:b:c\r"),
                RawLine::new(2, "d:e:f\r\n"),
                RawLine::new(3, "g:h:i\r"),
            ]
        );
    }

    #[test]
    fn test_crlf_split_across_buffer_refill() {
        // Capacity 2 puts the `\r` and the `\n` of line one in different fills.
        let reader = io::BufReader::with_capacity(2, Cursor::new(b"abc\r\nde".to_vec()));
        let got = LossyLines::new(reader)
            .collect::<io::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(got, vec![RawLine::new(1, "abc\r\n"), RawLine::new(2, "de")]);

        let reader = io::BufReader::with_capacity(2, Cursor::new(b"abc\r\nde".to_vec()));
        assert_eq!(count_lines(reader).unwrap(), 2);
    }

    #[test]
    fn test_count_across_small_buffer_boundaries() {
        let data = b"a\nb\nc\nd".to_vec();
        let reader = io::BufReader::with_capacity(2, Cursor::new(data));
        assert_eq!(count_lines(reader).unwrap(), 4);
    }
}
