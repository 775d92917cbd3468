//! # ska
//! An interpreter for Ska, a small esoteric language built around two integer
//! registers, two text registers, a named memory and a list of strings.
//!
//! ## Introduction
//! Every character of a Ska program is an instruction. There is no parsing step:
//! the interpreter reads the program one character at a time and acts on it
//! immediately. Digits build up a number in the `counter` register, arithmetic
//! folds the counter into the `accumulator`, and quoted literals load text.
//!
//! Control flow works on raw text. A loop `[...]` is captured as text and replayed
//! for as long as the accumulator is non-zero when its `]` is reached. A function
//! `{...}` is captured under the name held in the destination text register and
//! replayed by `q`. The only conditional is a family of instructions that skip the
//! next character depending on the sign of the accumulator.
//!
//! ```
//! use ska::vm::{run_text, VMOptions};
//!
//! // Count down from 3, printing each value.
//! let mut output = Vec::new();
//! run_text("3a z1 [o i m]", b"", &mut output, VMOptions::default()).unwrap();
//! assert_eq!(output, b"3\n2\n1\n");
//! ```
pub mod codepoint;
pub mod config;
pub mod console;
pub mod ops;
pub mod parser;
pub mod source;
pub mod vm;
