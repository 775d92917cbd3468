use std::fmt;

use arbitrary::Arbitrary;
use ska::ops::Op;
use ska::vm::{run_text, RunError, RunResult, VMOptions};

pub const OP_LIMIT: u64 = 100_000;
pub const MAX_DEPTH: usize = 1_000;

pub const ALLOWED_OPS: &[Op] = &[
    Op::Nop,
    Op::Newline,
    Op::Digit(0),
    Op::Digit(1),
    Op::Digit(2),
    Op::Digit(7),
    Op::Digit(9),
    Op::Store,
    Op::Load,
    Op::ReadChar,
    Op::ReadInt,
    Op::ReadLine,
    Op::PrintString,
    Op::PrintNumber,
    Op::PrintNewline,
    Op::LoadSource,
    Op::LoadDest,
    Op::SwapStrings,
    Op::CharAt,
    Op::SetCharAt,
    Op::Append,
    Op::ListLength,
    Op::Split,
    Op::MergeBackup,
    Op::SwapLists,
    Op::ListLoad,
    Op::ListStore,
    Op::ListClear,
    Op::Add,
    Op::Subtract,
    Op::Multiply,
    Op::Divide,
    Op::Remainder,
    Op::ResetCounter,
    Op::SwapRegisters,
    Op::LoopStart,
    Op::LoopEnd,
    Op::DeclareFunction,
    Op::CloseBrace,
    Op::Call,
    Op::IfZero,
    Op::IfNonZero,
    Op::IfPositive,
    Op::IfNotPositive,
    Op::IfNegative,
    Op::IfNotNegative,
    Op::Comment,
];

pub struct ArbitraryOp(pub Op);

impl<'a> Arbitrary<'a> for ArbitraryOp {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let idx = u.choose_index(ALLOWED_OPS.len())?;
        Ok(ArbitraryOp(ALLOWED_OPS[idx]))
    }
}

impl fmt::Debug for ArbitraryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Debug::fmt(&self.0, f) }
}

pub fn program_text(ops: &[Op]) -> String {
    ops.iter().map(|op| op.as_char() as char).collect()
}

fn run_once(program: &str, input: &[u8], args: &[Vec<u8>]) -> (Result<RunResult, RunError>, Vec<u8>) {
    let mut output = Vec::new();
    let options = VMOptions::new(args, false, OP_LIMIT, MAX_DEPTH);
    let result = run_text(program, input, &mut output, options);
    (result, output)
}

/// Runs the program twice and checks that it behaves the same both times and
/// that failures carry a sensible position.
pub fn verify_repro(program: &str, input: &[u8]) {
    let args = vec![b"ska".to_vec(), b"arg".to_vec()];
    let (first, first_output) = run_once(program, input, &args);
    let (second, second_output) = run_once(program, input, &args);
    assert_eq!(first, second, "program {program:?}");
    assert_eq!(first_output, second_output, "program {program:?}");

    match first {
        Ok(result) => assert!(result.instruction_counter <= OP_LIMIT),
        Err(RunError::InstructionFailed { location, instruction_counter, .. }) => {
            assert!(location.line >= 1, "program {program:?} failed at {location}");
            assert!(instruction_counter <= OP_LIMIT);
        }
        Err(RunError::RunTooLong { instruction_counter }) => assert_eq!(instruction_counter, OP_LIMIT),
    }
}
