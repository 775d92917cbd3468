//! Character producers for the interpreter and the stack that re-enters them.
use std::{fmt, io::{self, Read}, rc::Rc};

/// A position in program text, 1-based. Column 0 is the position right after a line feed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Location { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Something the dispatch loop can pull characters from.
pub enum Source {
    /// The program stream handed over by the caller (a file or standard input).
    Primary {
        reader: Box<dyn Read>,
        exhausted: bool,
    },
    /// Captured text being replayed: a loop body or a function body.
    Literal {
        text: Rc<[u8]>,
        pos: usize,
    },
}

impl Source {
    pub fn primary(reader: impl Read + 'static) -> Self {
        Source::Primary { reader: Box::new(reader), exhausted: false }
    }

    pub fn literal(text: impl Into<Rc<[u8]>>) -> Self {
        Source::Literal { text: text.into(), pos: 0 }
    }

    /// Returns the next character, or `None` once the source has nothing left.
    ///
    /// A primary source only learns it is exhausted by failing a read, so it
    /// reports exhaustion one call later than a literal does.
    pub fn next(&mut self) -> io::Result<Option<u8>> {
        match self {
            Source::Primary { reader, exhausted } => {
                if *exhausted {
                    return Ok(None);
                }
                let mut buf = [0u8; 1];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) => {
                            *exhausted = true;
                            return Ok(None);
                        }
                        Ok(_) => return Ok(Some(buf[0])),
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => {
                            *exhausted = true;
                            return Err(e);
                        }
                    }
                }
            }
            Source::Literal { text, pos } => {
                let c = text.get(*pos).copied();
                if c.is_some() {
                    *pos += 1;
                }
                Ok(c)
            }
        }
    }

    pub fn is_exhausted(&self) -> bool {
        match self {
            Source::Primary { exhausted, .. } => *exhausted,
            Source::Literal { text, pos } => *pos >= text.len(),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Primary { exhausted, .. } => {
                f.debug_struct("Primary").field("exhausted", exhausted).finish()
            }
            Source::Literal { text, pos } => f
                .debug_struct("Literal")
                .field("text", &String::from_utf8_lossy(text))
                .field("pos", pos)
                .finish(),
        }
    }
}

#[derive(Debug)]
struct Entry {
    source: Source,
    /// Where to continue reporting positions once this source is popped.
    resume: Option<Location>,
}

/// The active sources, innermost replay on top. The bottom entry is the primary source.
#[derive(Debug, Default)]
pub struct SourceStack {
    entries: Vec<Entry>,
}

impl SourceStack {
    pub fn new(primary: Source) -> Self {
        SourceStack { entries: vec![Entry { source: primary, resume: None }] }
    }

    /// Pushes a source that is replayed on top of the current one; `resume` is
    /// restored as the current position when it is popped again.
    pub fn push(&mut self, source: Source, resume: Location) {
        self.entries.push(Entry { source, resume: Some(resume) });
    }

    /// Removes the top source, returning its saved position (the primary source has none).
    pub fn pop(&mut self) -> Option<Location> {
        self.entries.pop().and_then(|e| e.resume)
    }

    pub fn top(&self) -> Option<&Source> {
        self.entries.last().map(|e| &e.source)
    }

    pub fn top_mut(&mut self) -> Option<&mut Source> {
        self.entries.last_mut().map(|e| &mut e.source)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }
}
