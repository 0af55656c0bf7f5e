use std::{fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use clap_stdin::FileOrStdin;
use tracing::{debug, Level};

use classcc::{analyze, codegen::Codegen};

/// Compiles a class-based source program to 32-bit x86 assembly.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Source file, or `-` for standard input
    #[arg(default_value = "-")]
    input: FileOrStdin,

    /// Write the assembly here instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the scope tree to standard error after type checking
    #[arg(long)]
    dump_symbols: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let user_input = match args.input.contents() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read input: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (program, tables) = match analyze(&user_input) {
        Ok(analyzed) => analyzed,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if args.dump_symbols {
        eprint!("{}", tables.symbol_table.dump());
    }

    let asm = Codegen::new(&tables).generate(&program);
    debug!(bytes = asm.len(), "generated assembly");

    match args.output {
        Some(path) => {
            if let Err(e) = fs::write(&path, asm) {
                eprintln!("error: cannot write {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        }
        None => print!("{}", asm),
    }
    ExitCode::SUCCESS
}
