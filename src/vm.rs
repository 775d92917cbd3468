//! Functions for executing Ska programs.
use std::{collections::BTreeMap, io::{self, Read, Write}, mem, rc::Rc};

use rustc_hash::FxHashMap as HashMap;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    config::get_config,
    console::Console,
    ops::Op,
    parser::{self, CharStream, ParserError},
    source::{Location, Source, SourceStack},
};

#[cfg(test)]
mod tests;

/// Text as the interpreter sees it: raw bytes, since escapes may produce any byte sequence.
pub type Text = Vec<u8>;

fn show(text: &[u8]) -> String {
    String::from_utf8_lossy(text).into_owned()
}

/// An error that can occur during the execution of a Ska instruction.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationError {
    #[error("Unrecognised token `{}`", .0.escape_ascii())]
    UnknownOperation(u8),
    #[error("No memory at specified location \"{}\"", show(.name))]
    UnknownMemory { name: Text },
    #[error(transparent)]
    Parse(#[from] ParserError),
    #[error("String index out of range (index {index}, length {len})")]
    StringIndexOutOfRange { index: i64, len: usize },
    #[error("List index out of range (index {index}, length {len})")]
    ListIndexOutOfRange { index: i64, len: usize },
    #[error("Unmatched closing bracket")]
    UnmatchedBracket,
    #[error("Unmatched closing brace")]
    UnmatchedBrace,
    #[error("Function \"{}\" declared twice", show(.name))]
    FunctionDeclaredTwice { name: Text },
    #[error("No function with specified name \"{}\"", show(.name))]
    NoSuchFunction { name: Text },
    #[error("Unterminated loop, expected `]`")]
    UnterminatedLoop,
    #[error("Unterminated function, expected `}}`")]
    UnterminatedFunction,
    #[error("Unterminated comment, expected `)`")]
    UnterminatedComment,
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Too many nested loops and calls (depth {depth})")]
    SourceOverflow { depth: usize },
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl From<io::Error> for OperationError {
    fn from(e: io::Error) -> Self {
        OperationError::Io { message: e.to_string() }
    }
}

/// Captured text with the position of its opening delimiter.
#[derive(Clone, Debug)]
struct Capture {
    body: Rc<[u8]>,
    origin: Location,
}

/// The internal state of the interpreter.
struct State<R: Read, W: Write> {
    accumulator: i64,
    counter: i64,
    string_src: Text,
    string_dest: Text,
    memory: HashMap<Text, i64>,
    functions: HashMap<Text, Capture>,
    list: Vec<Text>,
    backup: Vec<Text>,
    /// Loops that are currently being repeated, innermost last.
    loops: Vec<Capture>,
    sources: SourceStack,
    location: Location,
    input: Console<R>,
    output: W,
    debug: bool,
    max_depth: usize,
    instructions_run: u64,
}

impl<R: Read, W: Write> CharStream for State<R, W> {
    fn next_char(&mut self) -> io::Result<Option<u8>> {
        let Some(source) = self.sources.top_mut() else {
            return Ok(None);
        };
        let c = source.next()?;
        if c.is_some() {
            self.location.column += 1;
        }
        Ok(c)
    }
}

/// How far `k` and `f` may grow a string or the list in one step.
const MAX_GROWTH: usize = 1 << 24;

fn list_index(index: i64, len: usize) -> Result<usize, OperationError> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or(OperationError::ListIndexOutOfRange { index, len })
}

/// Splits `text` on every occurrence of `delimiter`. An empty delimiter splits into single bytes.
fn split(text: &[u8], delimiter: &[u8]) -> Vec<Text> {
    if delimiter.is_empty() {
        return text.iter().map(|&b| vec![b]).collect();
    }
    let mut pieces = Vec::new();
    let mut last = 0;
    let mut i = 0;
    while i + delimiter.len() <= text.len() {
        if &text[i..i + delimiter.len()] == delimiter {
            pieces.push(text[last..i].to_vec());
            i += delimiter.len();
            last = i;
        } else {
            i += 1;
        }
    }
    pieces.push(text[last..].to_vec());
    pieces
}

impl<R: Read, W: Write> State<R, W> {
    fn new(program: Source, input: R, output: W, options: &VMOptions) -> Self {
        State {
            accumulator: 0,
            counter: 0,
            string_src: Text::new(),
            string_dest: Text::new(),
            memory: HashMap::default(),
            functions: HashMap::default(),
            list: options.args.to_vec(),
            backup: Vec::new(),
            loops: Vec::new(),
            sources: SourceStack::new(program),
            location: Location::new(1, 0),
            input: Console::new(input),
            output,
            debug: options.debug,
            max_depth: options.max_depth,
            instructions_run: 0,
        }
    }

    /// Like [`CharStream::next_char`], but also follows line feeds. Used by
    /// instructions that consume text beyond their own character.
    fn next_tracked(&mut self) -> io::Result<Option<u8>> {
        let c = self.next_char()?;
        if c == Some(b'\n') {
            self.new_line();
        }
        Ok(c)
    }

    fn new_line(&mut self) {
        self.location.line += 1;
        self.location.column = 0;
    }

    /// Consumes text up to `end`, returning it with or without the terminator.
    fn capture_until(&mut self, end: u8, keep_end: bool, unterminated: OperationError) -> Result<Text, OperationError> {
        let mut body = Text::new();
        loop {
            match self.next_tracked()? {
                Some(c) if c == end => {
                    if keep_end {
                        body.push(c);
                    }
                    return Ok(body);
                }
                Some(c) => body.push(c),
                None => return Err(unterminated),
            }
        }
    }

    /// Starts replaying `capture`; reporting continues from its origin and
    /// returns to the current position once the replay is done.
    fn replay(&mut self, capture: &Capture) -> Result<(), OperationError> {
        if self.sources.depth() >= self.max_depth {
            return Err(OperationError::SourceOverflow { depth: self.sources.depth() });
        }
        self.sources.push(Source::literal(capture.body.clone()), self.location);
        self.location = capture.origin;
        Ok(())
    }

    fn divisor(&self) -> Result<i64, OperationError> {
        match self.counter {
            0 => Err(OperationError::DivisionByZero),
            c => Ok(c),
        }
    }

    fn apply(&mut self, op: Op) -> Result<(), OperationError> {
        match op {
            Op::Nop => {}
            Op::Newline => self.new_line(),
            Op::Digit(d) => {
                self.counter = self.counter.wrapping_mul(10).wrapping_add(d as i64);
            }

            Op::Store => {
                self.memory.insert(self.string_dest.clone(), self.accumulator);
            }
            Op::Load => {
                self.accumulator = *self
                    .memory
                    .get(&self.string_src)
                    .ok_or_else(|| OperationError::UnknownMemory { name: self.string_src.clone() })?;
            }

            Op::ReadChar => {
                self.accumulator = self.input.read_char()?.map_or(-1, |c| c as i64);
            }
            Op::ReadInt => {
                self.accumulator = self.input.read_int()?.unwrap_or(0);
            }
            Op::ReadLine => {
                self.string_dest = self.input.read_line()?;
            }

            Op::PrintString => {
                self.output.write_all(&self.string_src)?;
                self.output.flush()?;
            }
            Op::PrintNumber => {
                write!(self.output, "{}", self.accumulator)?;
                self.output.flush()?;
            }
            Op::PrintNewline => {
                writeln!(self.output)?;
                self.output.flush()?;
            }

            Op::LoadSource => {
                self.string_src = parser::parse_string_literal(self, b'"')?;
            }
            Op::LoadDest => {
                self.string_dest = parser::parse_string_literal(self, b'\'')?;
            }
            Op::SwapStrings => mem::swap(&mut self.string_src, &mut self.string_dest),
            Op::CharAt => {
                let len = self.string_src.len();
                let index = usize::try_from(self.counter)
                    .ok()
                    .filter(|&i| i < len)
                    .ok_or(OperationError::StringIndexOutOfRange { index: self.counter, len })?;
                self.accumulator = self.string_src[index] as i64;
            }
            Op::SetCharAt => {
                let len = self.string_dest.len();
                let index = usize::try_from(self.counter)
                    .ok()
                    .filter(|&i| i < len + MAX_GROWTH)
                    .ok_or(OperationError::StringIndexOutOfRange { index: self.counter, len })?;
                if self.string_dest.len() <= index {
                    self.string_dest.resize(index + 1, b' ');
                }
                self.string_dest[index] = self.accumulator as u8;
            }
            Op::Append => self.string_dest.extend_from_slice(&self.string_src),

            Op::ListLength => self.accumulator = self.list.len() as i64,
            Op::Split => {
                let pieces = split(&self.string_src, &self.string_dest);
                self.list.extend(pieces);
            }
            Op::MergeBackup => self.list.extend(self.backup.iter().cloned()),
            Op::SwapLists => mem::swap(&mut self.list, &mut self.backup),
            Op::ListLoad => {
                let index = list_index(self.counter, self.list.len())?;
                self.string_dest = self.list[index].clone();
            }
            Op::ListStore => {
                let index = list_index(self.counter, self.list.len() + MAX_GROWTH)
                    .map_err(|_| OperationError::ListIndexOutOfRange { index: self.counter, len: self.list.len() })?;
                if self.list.len() <= index {
                    self.list.resize(index + 1, Text::new());
                }
                self.list[index] = self.string_src.clone();
            }
            Op::ListClear => self.list.clear(),

            Op::Add => self.accumulator = self.accumulator.wrapping_add(self.counter),
            Op::Subtract => self.accumulator = self.accumulator.wrapping_sub(self.counter),
            Op::Multiply => self.accumulator = self.accumulator.wrapping_mul(self.counter),
            Op::Divide => self.accumulator = self.accumulator.wrapping_div(self.divisor()?),
            Op::Remainder => self.accumulator = self.accumulator.wrapping_rem(self.divisor()?),
            Op::ResetCounter => self.counter = 0,
            Op::SwapRegisters => mem::swap(&mut self.accumulator, &mut self.counter),

            Op::LoopStart => {
                let origin = self.location;
                // The body ends at the first `]`, nested loops included.
                let body = self.capture_until(b']', true, OperationError::UnterminatedLoop)?;
                let capture = Capture { body: body.into(), origin };
                debug!(origin = %origin, body = %show(&capture.body), "entering loop");
                self.replay(&capture)?;
                self.loops.push(capture);
            }
            Op::LoopEnd => {
                let Some(capture) = self.loops.last().cloned() else {
                    return Err(OperationError::UnmatchedBracket);
                };
                if self.accumulator != 0 {
                    self.replay(&capture)?;
                } else {
                    self.loops.pop();
                }
            }
            Op::DeclareFunction => {
                if self.functions.contains_key(&self.string_dest) {
                    return Err(OperationError::FunctionDeclaredTwice { name: self.string_dest.clone() });
                }
                let origin = self.location;
                let body = self.capture_until(b'}', false, OperationError::UnterminatedFunction)?;
                debug!(name = %show(&self.string_dest), origin = %origin, "declared function");
                self.functions.insert(self.string_dest.clone(), Capture { body: body.into(), origin });
            }
            Op::CloseBrace => return Err(OperationError::UnmatchedBrace),
            Op::Call => {
                let capture = self
                    .functions
                    .get(&self.string_src)
                    .cloned()
                    .ok_or_else(|| OperationError::NoSuchFunction { name: self.string_src.clone() })?;
                self.replay(&capture)?;
            }

            Op::IfZero
            | Op::IfNonZero
            | Op::IfPositive
            | Op::IfNotPositive
            | Op::IfNegative
            | Op::IfNotNegative => {
                if op.condition_holds(self.accumulator) == Some(false) {
                    self.next_tracked()?;
                }
            }

            Op::Comment => {
                self.capture_until(b')', false, OperationError::UnterminatedComment)?;
            }
        }

        Ok(())
    }

    fn fail(&self, error: OperationError) -> RunError {
        RunError::InstructionFailed {
            location: self.location,
            instruction_counter: self.instructions_run,
            error,
        }
    }

    fn dump(&mut self, op: Op) -> io::Result<()> {
        let out = &mut self.output;
        write!(out, "Character: {op}\nAccum Count \n{:5} {:5}\n", self.accumulator, self.counter)?;
        write!(out, "Src: \"{}\"\nDest: \"{}\"\nList:\n", show(&self.string_src), show(&self.string_dest))?;
        for item in &self.list {
            if item.is_empty() {
                writeln!(out, "\t(Empty)")?;
            } else {
                writeln!(out, "\t{}", show(item))?;
            }
        }
        let memory: BTreeMap<_, _> = self.memory.iter().collect();
        for (name, value) in memory {
            writeln!(out, "\t\"{}\": {}", show(name), value)?;
        }
        out.flush()?;
        self.input.read_byte()?;
        Ok(())
    }
}

/// Options for the Ska interpreter.
#[derive(Debug, Clone)]
pub struct VMOptions<'a> {
    /// The initial contents of the list, normally the invocation arguments.
    args: &'a [Text],
    /// Print the interpreter state after every instruction and wait for a
    /// character of input before continuing.
    debug: bool,
    /// The maximum number of characters to dispatch, if this is reached,
    /// the program will stop with an error.
    ///
    /// Set to [`u64::MAX`] to disable this limit.
    max_op_count: u64,
    /// The maximum number of sources (the program plus replayed loop and
    /// function bodies) active at once.
    max_depth: usize,
}

impl<'a> VMOptions<'a> {
    /// Create a new set of interpreter options.
    pub fn new(args: &'a [Text], debug: bool, max_op_count: u64, max_depth: usize) -> Self {
        Self { args, debug, max_op_count, max_depth }
    }
}

impl<'a> Default for VMOptions<'a> {
    fn default() -> Self {
        let config = get_config();
        Self {
            args: &[],
            debug: config.debug,
            max_op_count: config.op_limit,
            max_depth: config.max_depth,
        }
    }
}

/// An error that happened while running a Ska program.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunError {
    /// A specific instruction failed.
    #[error("({location}): {error}")]
    InstructionFailed {
        /// The position of the failing character, or of the last character it consumed.
        location: Location,
        /// The number of instructions which have been run before this one.
        instruction_counter: u64,
        /// The specific error within the instruction.
        error: OperationError,
    },
    /// The program executed more instructions than the limit specified within [`VMOptions`].
    #[error("The program ran for too long ({instruction_counter} instructions had been run).")]
    RunTooLong {
        /// The number of instructions which have been run
        instruction_counter: u64,
    },
}

/// The state of the interpreter after a program has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub accumulator: i64,
    pub counter: i64,
    pub string_src: Text,
    pub string_dest: Text,
    pub list: Vec<Text>,
    pub backup: Vec<Text>,
    pub memory: BTreeMap<Text, i64>,
    /// Names of all declared functions, sorted.
    pub functions: Vec<Text>,
    /// The number of characters which have been dispatched.
    pub instruction_counter: u64,
}

impl<R: Read, W: Write> From<State<R, W>> for RunResult {
    fn from(s: State<R, W>) -> Self {
        let mut functions: Vec<Text> = s.functions.into_keys().collect();
        functions.sort();
        RunResult {
            accumulator: s.accumulator,
            counter: s.counter,
            string_src: s.string_src,
            string_dest: s.string_dest,
            list: s.list,
            backup: s.backup,
            memory: s.memory.into_iter().collect(),
            functions,
            instruction_counter: s.instructions_run,
        }
    }
}

/// Run the Ska program read from `program`, with `input` and `output` standing in
/// for the program's standard input and output.
///
/// # Example
/// ```
/// use ska::vm::{run, VMOptions};
///
/// let mut output = Vec::new();
/// let result = run(&b"\"Hello\"p 6az7xo"[..], &b""[..], &mut output, VMOptions::default()).unwrap();
/// assert_eq!(output, b"Hello42");
/// assert_eq!(result.accumulator, 42);
/// ```
pub fn run<R: Read, W: Write>(
    program: impl Read + 'static,
    input: R,
    output: W,
    options: VMOptions,
) -> Result<RunResult, RunError> {
    let mut s = State::new(Source::primary(program), input, output, &options);
    run_state(&mut s, &options)?;
    Ok(s.into())
}

/// Run a program given as text.
pub fn run_text<W: Write>(program: &str, input: &[u8], output: W, options: VMOptions) -> Result<RunResult, RunError> {
    run(io::Cursor::new(program.as_bytes().to_vec()), input, output, options)
}

fn run_state<R: Read, W: Write>(s: &mut State<R, W>, options: &VMOptions) -> Result<(), RunError> {
    // One character of lookahead: the source a character came from may be
    // popped before the character itself is dispatched.
    let mut current = s.next_char().map_err(|e| s.fail(e.into()))?;

    loop {
        if s.sources.top().map_or(true, Source::is_exhausted) {
            let resume = s.sources.pop();
            if s.sources.is_empty() {
                break;
            }
            if let Some(location) = resume {
                s.location = location;
            }
            debug!(depth = s.sources.depth(), location = %s.location, "source finished");
        }

        if let Some(c) = current {
            if s.instructions_run >= options.max_op_count {
                return Err(RunError::RunTooLong { instruction_counter: s.instructions_run });
            }
            let op = Op::from_char(c).ok_or_else(|| s.fail(OperationError::UnknownOperation(c)))?;
            trace!(op = %op, location = %s.location, acc = s.accumulator, counter = s.counter, "dispatch");

            s.apply(op).map_err(|e| s.fail(e))?;
            s.instructions_run += 1;

            if s.debug && !op.is_whitespace() {
                s.dump(op).map_err(|e| s.fail(e.into()))?;
            }
        }

        current = s.next_char().map_err(|e| s.fail(e.into()))?;
    }

    Ok(())
}
