#![no_main]

use std::fmt;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ska::ops::Op;
use ska_fuzz::{program_text, verify_repro, ArbitraryOp};

#[derive(Arbitrary)]
struct FuzzInput {
    program: Vec<ArbitraryOp>,
    input: Vec<u8>,
}

impl fmt::Debug for FuzzInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ops: Vec<Op> = self.program.iter().map(|op| op.0).collect();
        writeln!(f, "FuzzInput {{")?;
        writeln!(f, "    program: {:?},", program_text(&ops))?;
        writeln!(f, "    input: {:?},", self.input)?;
        write!(f, "}}")?;
        writeln!(f, "Reproduce with:")?;
        writeln!(f, "#[test]")?;
        writeln!(f, "fn fuzz_repro() {{")?;
        writeln!(f, "    verify_repro({:?}, &{:?});", program_text(&ops), self.input)?;
        writeln!(f, "}}")?;
        Ok(())
    }
}

fuzz_target!(|data: FuzzInput| {
    let FuzzInput { program, input } = data;
    let ops: Vec<Op> = program.iter().map(|op| op.0).collect();

    if ops.is_empty() { return }

    verify_repro(&program_text(&ops), &input);
});
