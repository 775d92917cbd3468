use std::fmt;

/// A single Ska instruction, selected by one character of program text.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Op {
    /// Space or tab.
    Nop,
    /// A line feed; only affects position bookkeeping.
    Newline,
    /// `counter = counter * 10 + digit`
    Digit(u8),

    Store,
    Load,

    ReadChar,
    ReadInt,
    ReadLine,

    PrintString,
    PrintNumber,
    PrintNewline,

    LoadSource,
    LoadDest,
    SwapStrings,
    CharAt,
    SetCharAt,
    Append,

    ListLength,
    Split,
    MergeBackup,
    SwapLists,
    ListLoad,
    ListStore,
    ListClear,

    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    ResetCounter,
    SwapRegisters,

    LoopStart,
    LoopEnd,
    DeclareFunction,
    CloseBrace,
    Call,

    // Each of these runs the next character only when the accumulator
    // satisfies the condition, otherwise the character is skipped.
    IfZero,
    IfNonZero,
    IfPositive,
    IfNotPositive,
    IfNegative,
    IfNotNegative,

    Comment,
}

impl Op {
    pub fn from_char(c: u8) -> Option<Op> {
        let op = match c {
            b' ' | b'\t' => Op::Nop,
            b'\n' => Op::Newline,
            b'0'..=b'9' => Op::Digit(c - b'0'),
            b's' => Op::Store,
            b'l' => Op::Load,
            b'P' => Op::ReadChar,
            b'O' => Op::ReadInt,
            b'I' => Op::ReadLine,
            b'p' => Op::PrintString,
            b'o' => Op::PrintNumber,
            b'i' => Op::PrintNewline,
            b'"' => Op::LoadSource,
            b'\'' => Op::LoadDest,
            b't' => Op::SwapStrings,
            b'j' => Op::CharAt,
            b'k' => Op::SetCharAt,
            b'e' => Op::Append,
            b'w' => Op::ListLength,
            b'y' => Op::Split,
            b'v' => Op::MergeBackup,
            b'u' => Op::SwapLists,
            b'b' => Op::ListLoad,
            b'f' => Op::ListStore,
            b'Z' => Op::ListClear,
            b'a' => Op::Add,
            b'm' => Op::Subtract,
            b'x' => Op::Multiply,
            b'd' => Op::Divide,
            b'r' => Op::Remainder,
            b'z' => Op::ResetCounter,
            b'c' => Op::SwapRegisters,
            b'[' => Op::LoopStart,
            b']' => Op::LoopEnd,
            b'{' => Op::DeclareFunction,
            b'}' => Op::CloseBrace,
            b'q' => Op::Call,
            b'n' => Op::IfZero,
            b'N' => Op::IfNonZero,
            b'g' => Op::IfPositive,
            b'G' => Op::IfNotPositive,
            b'h' => Op::IfNegative,
            b'H' => Op::IfNotNegative,
            b'(' => Op::Comment,
            _ => return None,
        };
        Some(op)
    }

    /// The canonical character for this instruction. `Nop` maps to a space.
    pub fn as_char(&self) -> u8 {
        match self {
            Op::Nop => b' ',
            Op::Newline => b'\n',
            Op::Digit(d) => b'0' + d,
            Op::Store => b's',
            Op::Load => b'l',
            Op::ReadChar => b'P',
            Op::ReadInt => b'O',
            Op::ReadLine => b'I',
            Op::PrintString => b'p',
            Op::PrintNumber => b'o',
            Op::PrintNewline => b'i',
            Op::LoadSource => b'"',
            Op::LoadDest => b'\'',
            Op::SwapStrings => b't',
            Op::CharAt => b'j',
            Op::SetCharAt => b'k',
            Op::Append => b'e',
            Op::ListLength => b'w',
            Op::Split => b'y',
            Op::MergeBackup => b'v',
            Op::SwapLists => b'u',
            Op::ListLoad => b'b',
            Op::ListStore => b'f',
            Op::ListClear => b'Z',
            Op::Add => b'a',
            Op::Subtract => b'm',
            Op::Multiply => b'x',
            Op::Divide => b'd',
            Op::Remainder => b'r',
            Op::ResetCounter => b'z',
            Op::SwapRegisters => b'c',
            Op::LoopStart => b'[',
            Op::LoopEnd => b']',
            Op::DeclareFunction => b'{',
            Op::CloseBrace => b'}',
            Op::Call => b'q',
            Op::IfZero => b'n',
            Op::IfNonZero => b'N',
            Op::IfPositive => b'g',
            Op::IfNotPositive => b'G',
            Op::IfNegative => b'h',
            Op::IfNotNegative => b'H',
            Op::Comment => b'(',
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, Op::Nop | Op::Newline)
    }

    /// For the conditional ops, whether the next character runs given `accumulator`.
    pub fn condition_holds(&self, accumulator: i64) -> Option<bool> {
        match self {
            Op::IfZero => Some(accumulator == 0),
            Op::IfNonZero => Some(accumulator != 0),
            Op::IfPositive => Some(accumulator > 0),
            Op::IfNotPositive => Some(accumulator <= 0),
            Op::IfNegative => Some(accumulator < 0),
            Op::IfNotNegative => Some(accumulator >= 0),
            _ => None,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Newline => write!(f, "\\n"),
            op => write!(f, "{}", op.as_char() as char),
        }
    }
}
