//! Reading program input for `P`, `O`, `I` and the debug pause.
use std::io::{self, Read};

/// A byte reader with one byte of lookahead, so numbers can stop at the
/// first non-digit without consuming it.
///
/// Reads one byte at a time, so it can share standard input with a
/// program that is itself being read from standard input.
pub struct Console<R: Read> {
    inner: R,
    peeked: Option<u8>,
}

impl<R: Read> Console<R> {
    pub fn new(inner: R) -> Self {
        Console { inner, peeked: None }
    }

    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.peeked.take() {
            return Ok(Some(b));
        }
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        if self.peeked.is_none() {
            self.peeked = self.read_byte()?;
        }
        Ok(self.peeked)
    }

    fn skip_whitespace(&mut self) -> io::Result<()> {
        while let Some(b) = self.peek_byte()? {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.peeked = None;
        }
        Ok(())
    }

    /// The next non-whitespace byte.
    pub fn read_char(&mut self) -> io::Result<Option<u8>> {
        self.skip_whitespace()?;
        self.read_byte()
    }

    /// A decimal integer with an optional sign, after skipping whitespace.
    /// Returns `None` if no digits follow; values out of range saturate.
    pub fn read_int(&mut self) -> io::Result<Option<i64>> {
        self.skip_whitespace()?;
        let negative = match self.peek_byte()? {
            Some(b'-') => true,
            Some(b'+') => false,
            _ => return self.read_digits(false),
        };
        self.peeked = None;
        self.read_digits(negative)
    }

    fn read_digits(&mut self, negative: bool) -> io::Result<Option<i64>> {
        let mut value: Option<i64> = None;
        while let Some(b @ b'0'..=b'9') = self.peek_byte()? {
            self.peeked = None;
            let digit = (b - b'0') as i64;
            let v = value.unwrap_or(0);
            value = Some(if negative {
                v.saturating_mul(10).saturating_sub(digit)
            } else {
                v.saturating_mul(10).saturating_add(digit)
            });
        }
        Ok(value)
    }

    /// Everything up to the next line feed, which is consumed but not returned.
    pub fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let mut line = Vec::new();
        while let Some(b) = self.read_byte()? {
            if b == b'\n' {
                break;
            }
            line.push(b);
        }
        Ok(line)
    }
}
