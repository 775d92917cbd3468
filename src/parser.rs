use std::io;

use thiserror::Error;

use crate::codepoint;

#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParserError {
    #[error("Invalid hexadecimal value for \\{0}")]
    InvalidHexEscape(char),
    #[error("Invalid escape sequence \\{}", .0.escape_ascii())]
    InvalidEscape(u8),
    #[error("Linefeed in string literal")]
    LinefeedInString,
    #[error("Could not read program text: {message}")]
    Read { message: String },
}

impl From<io::Error> for ParserError {
    fn from(e: io::Error) -> Self {
        ParserError::Read { message: e.to_string() }
    }
}

/// A character producer that keeps its own position bookkeeping.
pub trait CharStream {
    /// Returns the next character, or `None` when the active source has nothing left.
    fn next_char(&mut self) -> io::Result<Option<u8>>;
}

/// Reads a quoted literal whose opening `delimiter` has already been consumed.
///
/// The literal ends at the first unescaped `delimiter` (which is consumed but not
/// part of the result) or when the stream runs out.
pub fn parse_string_literal(stream: &mut impl CharStream, delimiter: u8) -> Result<Vec<u8>, ParserError> {
    let mut buffer = Vec::new();
    while let Some(c) = stream.next_char()? {
        match c {
            b'\\' => parse_escape(stream, delimiter, &mut buffer)?,
            b'\n' => return Err(ParserError::LinefeedInString),
            c if c == delimiter => break,
            c => buffer.push(c),
        }
    }
    Ok(buffer)
}

fn parse_escape(stream: &mut impl CharStream, delimiter: u8, buffer: &mut Vec<u8>) -> Result<(), ParserError> {
    let Some(c) = stream.next_char()? else {
        return Ok(());
    };
    let simple = match c {
        b'a' => 0x07,
        b'b' => 0x08,
        b'e' => 0x1b,
        b'f' => 0x0c,
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        b'v' => 0x0b,
        b'\\' => b'\\',
        c if c == delimiter => delimiter,
        b'x' => return parse_hex_escape(stream, 'x', 2, buffer),
        b'u' => return parse_hex_escape(stream, 'u', 4, buffer),
        b'U' => return parse_hex_escape(stream, 'U', 8, buffer),
        c => return Err(ParserError::InvalidEscape(c)),
    };
    buffer.push(simple);
    Ok(())
}

fn parse_hex_escape(
    stream: &mut impl CharStream,
    escape: char,
    digits: usize,
    buffer: &mut Vec<u8>,
) -> Result<(), ParserError> {
    let mut codepoint: u32 = 0;
    for _ in 0..digits {
        let digit = stream
            .next_char()?
            .and_then(|c| (c as char).to_digit(16))
            .ok_or(ParserError::InvalidHexEscape(escape))?;
        codepoint = codepoint << 4 | digit;
    }
    codepoint::encode(codepoint, buffer);
    Ok(())
}
