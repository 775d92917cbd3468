use anyhow::Context;
use clap::Parser;
use ska::config::get_config;
use ska::vm::{RunError, Text, VMOptions};
use std::fs::File;
use std::io::{BufReader, Read};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Run a Ska program.
#[derive(Parser, Debug)]
#[command(name = "ska")]
struct Args {
    /// File containing a Ska program. The program is read from standard input if omitted.
    #[arg(long, short = 'f')]
    file: Option<String>,
    /// Print the interpreter state after every instruction and wait for a key press.
    #[arg(long, short = 'd')]
    debug: bool,
    /// A limit for the number of executed instructions.
    /// If the limit is reached, the program will be stopped with an error.
    #[arg(long, short = 'l')]
    op_limit: Option<u64>,
    /// Maximum number of nested loop iterations and function calls being replayed.
    #[arg(long)]
    max_depth: Option<usize>,
    /// Print statistics after running the program.
    #[arg(long, short = 's')]
    stats: bool,
    /// Arguments passed to the program; they start out in its list.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn open_program(file: Option<&str>) -> anyhow::Result<Box<dyn Read>> {
    match file {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("Could not open file \"{path}\""))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(std::io::stdin())),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    init_logging();
    let args = Args::parse();
    let config = get_config();

    let program = open_program(args.file.as_deref())?;

    // The list starts with the interpreter's name, followed by the program's own arguments.
    let interpreter = std::env::args().next().unwrap_or_else(|| "ska".to_string());
    let list: Vec<Text> = std::iter::once(interpreter)
        .chain(args.args.iter().cloned())
        .map(String::into_bytes)
        .collect();

    let options = VMOptions::new(
        &list,
        args.debug || config.debug,
        args.op_limit.unwrap_or(config.op_limit),
        args.max_depth.unwrap_or(config.max_depth),
    );

    let start_time = Instant::now();
    let result = ska::vm::run(program, std::io::stdin(), std::io::stdout(), options);
    let elapsed = start_time.elapsed();

    match result {
        Ok(result) => {
            if args.stats {
                print_stats(result.instruction_counter, elapsed);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            report(&error);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn report(error: &RunError) {
    tracing::debug!(?error, "program failed");
    eprintln!("Ska {error}");
}

fn print_stats(instruction_counter: u64, elapsed: Duration) {
    let instructions_per_second = instruction_counter as f64 / elapsed.as_secs_f64();
    eprintln!("Execution time: {:?}", elapsed);
    eprintln!(
        "Instructions executed: {} ({}/s)",
        instruction_counter,
        match instructions_per_second {
            n if n >= 1_000_000.0 => format!("{:.1}M", n / 1_000_000.0),
            n if n >= 1_000.0 => format!("{:.1}k", n / 1_000.0),
            n => format!("{:.1}", n),
        }
    );
}
