#![no_main]

use libfuzzer_sys::fuzz_target;
use ska_fuzz::verify_repro;

// Raw text, mostly exercising unknown characters and string literal escapes.
fuzz_target!(|program: &str| {
    verify_repro(program, b"1 2 3\nline\n");
});
