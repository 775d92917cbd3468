use super::*;

const OP_LIMIT: u64 = 1_000_000;
const MAX_DEPTH: usize = 1_000;

fn options(args: &[Text]) -> VMOptions<'_> {
    VMOptions::new(args, false, OP_LIMIT, MAX_DEPTH)
}

fn run_full(program: &str, input: &str, options: VMOptions) -> Result<(RunResult, String), RunError> {
    let mut output = Vec::new();
    let result = run_text(program, input.as_bytes(), &mut output, options)?;
    Ok((result, String::from_utf8(output).unwrap()))
}

fn run(program: &str) -> RunResult {
    run_full(program, "", options(&[])).unwrap().0
}

fn run_output(program: &str) -> String {
    run_full(program, "", options(&[])).unwrap().1
}

fn run_with_input(program: &str, input: &str) -> RunResult {
    run_full(program, input, options(&[])).unwrap().0
}

fn run_err_with(program: &str, options: VMOptions) -> (Location, OperationError) {
    match run_full(program, "", options) {
        Err(RunError::InstructionFailed { location, error, .. }) => (location, error),
        other => panic!("expected an instruction to fail, got {other:?}"),
    }
}

fn run_err(program: &str) -> (Location, OperationError) {
    run_err_with(program, options(&[]))
}

fn texts(items: &[&str]) -> Vec<Text> {
    items.iter().map(|s| s.as_bytes().to_vec()).collect()
}

#[test]
fn test_empty() {
    let result = run("");
    assert_eq!(result.accumulator, 0);
    assert_eq!(result.counter, 0);
    assert_eq!(result.instruction_counter, 0);
    assert!(result.list.is_empty());
}

#[test]
fn test_whitespace() {
    let result = run(" \t\n \n");
    assert_eq!(result.accumulator, 0);
    assert_eq!(result.instruction_counter, 5);
}

#[test]
fn test_digits() {
    assert_eq!(run("123").counter, 123);
    assert_eq!(run("0").counter, 0);
    assert_eq!(run("007").counter, 7);
    // Whitespace does not end a number, only `z` does.
    assert_eq!(run("1 2\n3").counter, 123);
    assert_eq!(run("12z34").counter, 34);
    assert_eq!(run("9223372036854775807").counter, i64::MAX);
    assert_eq!(run("9223372036854775808").counter, i64::MIN);
}

#[test]
fn test_arithmetic() {
    assert_eq!(run("7a").accumulator, 7);
    assert_eq!(run("7az3m").accumulator, 4);
    assert_eq!(run("7az3x").accumulator, 21);
    assert_eq!(run("7az2d").accumulator, 3);
    assert_eq!(run("7az2r").accumulator, 1);
    assert_eq!(run("5m").accumulator, -5);
    assert_eq!(run("5mz2d").accumulator, -2);
    assert_eq!(run("5mz2r").accumulator, -1);
    assert_eq!(run("9223372036854775807az1a").accumulator, i64::MIN);
}

#[test]
fn test_min_divided_by_minus_one_wraps() {
    // Memory `m` holds i64::MIN, the counter ends up at -1.
    let setup = "'m'9223372036854775807az1as c z2m c \"m\"l";
    let result = run(&format!("{setup} d"));
    assert_eq!((result.accumulator, result.counter), (i64::MIN, -1));
    let result = run(&format!("{setup} r"));
    assert_eq!((result.accumulator, result.counter), (0, -1));
}

#[test]
fn test_counter_ops() {
    let result = run("5c");
    assert_eq!((result.accumulator, result.counter), (5, 0));
    let result = run("5az3c");
    assert_eq!((result.accumulator, result.counter), (3, 5));
    assert_eq!(run("5z").counter, 0);
}

#[test]
fn test_division_by_zero() {
    assert_eq!(run_err("5azd"), (Location::new(1, 4), OperationError::DivisionByZero));
    assert_eq!(run_err("5azr"), (Location::new(1, 4), OperationError::DivisionByZero));
}

#[test]
fn test_memory() {
    let result = run("'x'7asz7m\"x\"l");
    assert_eq!(result.accumulator, 7);
    assert_eq!(result.memory, BTreeMap::from([(b"x".to_vec(), 7)]));

    // Later stores overwrite.
    let result = run("'x'7as3as\"x\"l");
    assert_eq!(result.accumulator, 80);
    assert_eq!(result.memory.len(), 1);

    assert_eq!(
        run_err("\"nope\"l"),
        (Location::new(1, 7), OperationError::UnknownMemory { name: b"nope".to_vec() })
    );
}

#[test]
fn test_output() {
    assert_eq!(run_output("\"Hi\"p i 4a o"), "Hi\n4");
    assert_eq!(run_output("5m o"), "-5");
    assert_eq!(run_output("\"\"p"), "");
}

#[test]
fn test_string_literals() {
    let result = run(r#""a\tb\u00e9""#);
    assert_eq!(result.string_src, [b'a', b'\t', b'b', 0xc3, 0xa9]);

    let result = run(r"'it\'s'");
    assert_eq!(result.string_dest, b"it's");
    assert!(result.string_src.is_empty());

    // An unterminated literal ends with the program.
    assert_eq!(run("\"abc").string_src, b"abc");
}

#[test]
fn test_string_literal_errors() {
    assert_eq!(run_err(r#""a\qb""#), (Location::new(1, 4), OperationError::Parse(ParserError::InvalidEscape(b'q'))));
    assert_eq!(run_err("\"a\nb\""), (Location::new(1, 3), OperationError::Parse(ParserError::LinefeedInString)));
    assert_eq!(run_err(r#""\xZZ""#).1, OperationError::Parse(ParserError::InvalidHexEscape('x')));
    assert_eq!(run_err(r#""\u00e""#).1, OperationError::Parse(ParserError::InvalidHexEscape('u')));
    assert_eq!(
        OperationError::from(ParserError::InvalidEscape(b'q')).to_string(),
        "Invalid escape sequence \\q"
    );
}

#[test]
fn test_string_literal_escape_columns() {
    // Every character of an escape counts towards the column of what follows.
    assert_eq!(run_err(r#""\u00e9"}"#), (Location::new(1, 9), OperationError::UnmatchedBrace));
    assert_eq!(run_err(r"'\U0001F600\x41'}"), (Location::new(1, 17), OperationError::UnmatchedBrace));
    assert_eq!(run_err(r#""\t\"x"}"#), (Location::new(1, 8), OperationError::UnmatchedBrace));
}

#[test]
fn test_string_ops() {
    let result = run("\"a\"'b't");
    assert_eq!((result.string_src, result.string_dest), (b"b".to_vec(), b"a".to_vec()));

    let result = run("\"x\"'y'e");
    assert_eq!(result.string_dest, b"yx");
    // Appending does not touch the accumulator.
    assert_eq!(result.accumulator, 0);

    assert_eq!(run("\"AB\"1j").accumulator, 66);
    // `\xff` is stored as its two byte encoding.
    assert_eq!(run(r#""\xff"j"#).accumulator, 0xc3);
    assert_eq!(
        run_err("\"AB\"2j"),
        (Location::new(1, 6), OperationError::StringIndexOutOfRange { index: 2, len: 2 })
    );
    assert_eq!(
        run_err("\"AB\"1mcj").1,
        OperationError::StringIndexOutOfRange { index: -1, len: 2 }
    );

    assert_eq!(run("65az3k").string_dest, b"   A");
    assert_eq!(run("'xyz'66az1k").string_dest, b"xBz");
}

#[test]
fn test_list_store_load() {
    let result = run("\"v0\"f\"v1\"1f");
    assert_eq!(result.list, texts(&["v0", "v1"]));
    assert_eq!(run("\"v0\"f\"v1\"1fzb").string_dest, b"v0");
    assert_eq!(run("\"v0\"f\"v1\"1fb").string_dest, b"v1");

    assert_eq!(run("\"q\"3f").list, texts(&["", "", "", "q"]));
    assert_eq!(run("\"a\"f\"b\"fw").accumulator, 1);

    assert_eq!(
        run_err("5b"),
        (Location::new(1, 2), OperationError::ListIndexOutOfRange { index: 5, len: 0 })
    );
    assert_eq!(
        run_err("1mc\"a\"f").1,
        OperationError::ListIndexOutOfRange { index: -1, len: 0 }
    );
}

#[test]
fn test_list_clear_and_length() {
    let result = run("\"a\"f\"b\"1f w");
    assert_eq!(result.accumulator, 2);
    let result = run("\"a\"f\"b\"1f Zw");
    assert_eq!(result.accumulator, 0);
    assert!(result.list.is_empty());
}

#[test]
fn test_list_split() {
    assert_eq!(run("\"a,b,,c\"',' y").list, texts(&["a", "b", "", "c"]));
    assert_eq!(run("\"a--b--c\"'--'y").list, texts(&["a", "b", "c"]));
    assert_eq!(run("\"abc\"'x'y").list, texts(&["abc"]));
    assert_eq!(run("\"ab\"''y").list, texts(&["a", "b"]));
    // Pieces are appended after what is already there.
    assert_eq!(run("\"z\"f\"a b\"' 'y").list, texts(&["z", "a", "b"]));
}

#[test]
fn test_list_backup() {
    let result = run("\"a\"fu");
    assert!(result.list.is_empty());
    assert_eq!(result.backup, texts(&["a"]));

    let result = run("\"a\"fu\"b\"fv");
    assert_eq!(result.list, texts(&["b", "a"]));
    assert_eq!(result.backup, texts(&["a"]));
}

#[test]
fn test_args_seed_list() {
    let args = texts(&["ska", "input.txt"]);
    let (result, _) = run_full("w 1b", "", options(&args)).unwrap();
    assert_eq!(result.accumulator, 2);
    assert_eq!(result.string_dest, b"input.txt");
}

#[test]
fn test_loop_countdown() {
    assert_eq!(run_output("5az1[om]"), "54321");
    assert_eq!(run_output("3a z1 [o i m]"), "3\n2\n1\n");
}

#[test]
fn test_loop_iteration_count() {
    // Count iterations in memory slot "i" while the accumulator counts down.
    let program = "'i's z7a [ 'a's z \"i\"l 1a 'i's \"a\"l z1m ] \"i\"l";
    assert_eq!(run(program).accumulator, 7);
}

#[test]
fn test_loop_body_runs_once_before_check() {
    assert_eq!(run_output("[o]"), "0");
    assert_eq!(run("[ 'r's ]").memory.get(&b"r".to_vec()), Some(&0));
}

#[test]
fn test_loop_does_not_grow_source_stack() {
    let (result, _) = run_full("5000a z1 [m]", "", VMOptions::new(&[], false, OP_LIMIT, 3)).unwrap();
    assert_eq!(result.accumulator, 0);
}

#[test]
fn test_loop_capture_stops_at_first_bracket() {
    // The outer capture is `[m]`; the trailing `o]` runs after the inner loop ends.
    assert_eq!(run_output("2az1[[m]o]"), "0");
    assert_eq!(run_err("[]]"), (Location::new(1, 3), OperationError::UnmatchedBracket));
}

#[test]
fn test_loop_errors() {
    assert_eq!(run_err("]"), (Location::new(1, 1), OperationError::UnmatchedBracket));
    assert_eq!(run_err("[abc"), (Location::new(1, 4), OperationError::UnterminatedLoop));
}

#[test]
fn test_loop_locations() {
    // Errors inside a replayed body point at the character in the program.
    assert_eq!(run_err("1a[}]"), (Location::new(1, 4), OperationError::UnmatchedBrace));
    assert_eq!(run_err("1a\n[\n}]"), (Location::new(3, 1), OperationError::UnmatchedBrace));
    // After the loop, positions continue after its `]`.
    assert_eq!(run_err("[ ]}"), (Location::new(1, 4), OperationError::UnmatchedBrace));
    assert_eq!(run_err("[\n\n]\n}"), (Location::new(4, 1), OperationError::UnmatchedBrace));
}

#[test]
fn test_functions() {
    assert_eq!(run_output("'f'{\"hi\"p}\"f\"q"), "hi");
    assert_eq!(run_output("'f'{\"hi\"p}\"f\"qq"), "hihi");
    // The body is only run by `q`.
    assert_eq!(run_output("'f'{\"hi\"p}"), "");
    assert_eq!(run("'f'{} 'g'{}").functions, texts(&["f", "g"]));
    // An empty body is fine to call.
    assert_eq!(run("'f'{}\"f\"q 5a").accumulator, 5);
}

#[test]
fn test_function_recursion() {
    assert_eq!(run_output("'f'{omNq}3az1\"f\"q"), "321");
}

#[test]
fn test_function_errors() {
    assert_eq!(
        run_err("'f'{}'f'{}"),
        (Location::new(1, 9), OperationError::FunctionDeclaredTwice { name: b"f".to_vec() })
    );
    assert_eq!(
        run_err("\"g\"q"),
        (Location::new(1, 4), OperationError::NoSuchFunction { name: b"g".to_vec() })
    );
    assert_eq!(run_err("'f'{ }}"), (Location::new(1, 7), OperationError::UnmatchedBrace));
    assert_eq!(run_err("'f'{abc"), (Location::new(1, 7), OperationError::UnterminatedFunction));
}

#[test]
fn test_function_locations() {
    assert_eq!(run_err("'f'{ ]}\"f\"q"), (Location::new(1, 6), OperationError::UnmatchedBracket));
    assert_eq!(run_err("'f'{\n ]}\n\"f\"q"), (Location::new(2, 2), OperationError::UnmatchedBracket));
    // Back in the caller after the call.
    assert_eq!(run_err("'f'{ }\"f\"q}"), (Location::new(1, 11), OperationError::UnmatchedBrace));
}

#[test]
fn test_source_overflow() {
    let (_, error) = run_err_with("'f'{q }\"f\"q", VMOptions::new(&[], false, OP_LIMIT, 100));
    assert_eq!(error, OperationError::SourceOverflow { depth: 100 });
}

#[test]
fn test_conditional_skips() {
    for (prefix, acc) in [("", 0i64), ("5a", 5), ("5m", -5)] {
        for op_char in "nNgGhH".chars() {
            let op = Op::from_char(op_char as u8).unwrap();
            let program = format!("{prefix}{op_char}o");
            let printed = !run_output(&program).is_empty();
            assert_eq!(Some(printed), op.condition_holds(acc), "program {program}");
        }
    }
}

#[test]
fn test_skip_consumes_exactly_one_char() {
    assert_eq!(run_output("5an oo"), "55");
    assert_eq!(run_output("5anoo"), "5");
    // A skipped line feed still counts as a new line.
    assert_eq!(run_err("1an\n}"), (Location::new(2, 1), OperationError::UnmatchedBrace));
}

#[test]
fn test_comments() {
    assert_eq!(run("(hello ] } world)5a").accumulator, 5);
    assert_eq!(run_err("(a\nb)}"), (Location::new(2, 3), OperationError::UnmatchedBrace));
    assert_eq!(run_err("(abc").1, OperationError::UnterminatedComment);
}

#[test]
fn test_unknown_operation() {
    assert_eq!(run_err("5aX"), (Location::new(1, 3), OperationError::UnknownOperation(b'X')));
    assert_eq!(run_err("\n\n  )"), (Location::new(3, 3), OperationError::UnknownOperation(b')')));
}

#[test]
fn test_error_display() {
    let error = run_full("5aX", "", options(&[])).unwrap_err();
    assert_eq!(error.to_string(), "(1:3): Unrecognised token `X`");
    let error = run_full("\"f\"q", "", options(&[])).unwrap_err();
    assert_eq!(error.to_string(), "(1:4): No function with specified name \"f\"");
}

#[test]
fn test_input() {
    assert_eq!(run_with_input("P", "  x").accumulator, 120);
    assert_eq!(run_with_input("P", "").accumulator, -1);
    assert_eq!(run_with_input("O", "-42\n").accumulator, -42);
    assert_eq!(run_with_input("O", "abc").accumulator, 0);
    assert_eq!(run_with_input("I", "hello world\nrest").string_dest, b"hello world");

    let result = run_with_input("OI", "12\nabc");
    assert_eq!(result.accumulator, 12);
    assert_eq!(result.string_dest, b"");

    let result = run_with_input("O I I", "12\nabc\n");
    assert_eq!(result.string_dest, b"abc");
}

#[test]
fn test_echo_program() {
    let (_, output) = run_full("I t p i", "echo me\n", options(&[])).unwrap();
    assert_eq!(output, "echo me\n");
}

#[test]
fn test_debug_dump() {
    let args = texts(&["", "x"]);
    let (_, output) = run_full("5 a", "\n\n", VMOptions::new(&args, true, OP_LIMIT, MAX_DEPTH)).unwrap();
    let expected = "Character: 5\nAccum Count \n    0     5\nSrc: \"\"\nDest: \"\"\nList:\n\t(Empty)\n\tx\n\
                    Character: a\nAccum Count \n    5     5\nSrc: \"\"\nDest: \"\"\nList:\n\t(Empty)\n\tx\n";
    assert_eq!(output, expected);

    let (_, output) = run_full("'k's", "\n\n", VMOptions::new(&[], true, OP_LIMIT, MAX_DEPTH)).unwrap();
    assert!(output.ends_with("List:\n\t\"k\": 0\n"), "{output}");
}

#[test]
fn test_op_limit() {
    let result = run_full("1a[ ]", "", VMOptions::new(&[], false, 1000, MAX_DEPTH));
    assert_eq!(result.unwrap_err(), RunError::RunTooLong { instruction_counter: 1000 });
}

#[test]
fn test_split_helper() {
    assert_eq!(split(b"", b","), texts(&[""]));
    assert_eq!(split(b",", b","), texts(&["", ""]));
    assert_eq!(split(b"aXXXb", b"XX"), texts(&["a", "Xb"]));
}

#[test]
fn test_sample_programs() {
    let output = run_output(include_str!("../../benches/programs/fibonacci.ska"));
    let numbers: Vec<i64> = output.lines().map(|l| l.parse().unwrap()).collect();
    assert_eq!(numbers.len(), 40);
    assert_eq!(numbers[..8], [0, 1, 1, 2, 3, 5, 8, 13]);
    assert_eq!(numbers[39], 63245986);

    let output = run_output(include_str!("../../benches/programs/words.ska"));
    assert_eq!(output, "the\nquick\nbrown\nfox\njumps\nover\nthe\nlazy\ndog\n");

    assert_eq!(run(include_str!("../../benches/programs/countdown.ska")).accumulator, 0);

    let result = run(include_str!("../../benches/programs/recursion.ska"));
    assert_eq!(result.accumulator, 0);
    assert_eq!(result.functions, texts(&["down", "step"]));
}

#[test]
fn test_growth_is_bounded() {
    assert_eq!(
        run_err("9999999999k"),
        (Location::new(1, 11), OperationError::StringIndexOutOfRange { index: 9999999999, len: 0 })
    );
    assert_eq!(
        run_err("9999999999f").1,
        OperationError::ListIndexOutOfRange { index: 9999999999, len: 0 }
    );
}
