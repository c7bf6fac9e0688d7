use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser as ClapParser, error::ErrorKind};
use colored::Colorize;

use eddyc::{CResult, Compilation, Parser};

#[derive(Debug, ClapParser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Source file to compile; use --expr for inline programs.
    source_file: Option<PathBuf>,

    /// Compile an inline program instead of a file.
    #[arg(short, long, value_name = "PROGRAM", conflicts_with = "source_file")]
    expr: Option<String>,

    /// Compile against a known argument value.
    #[arg(long, value_name = "N")]
    arg: Option<i64>,

    /// Skip the post-parse optimization pass.
    #[arg(long)]
    no_opt: bool,

    /// Print the whole node graph instead of the expression form.
    #[arg(long)]
    ir: bool,

    /// Interpret the compiled program with this argument value.
    #[arg(long, value_name = "N")]
    eval: Option<i64>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let source = match (&args.source_file, &args.expr) {
        (_, Some(expr)) => expr.clone(),
        (Some(path), None) => match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                Args::command()
                    .error(
                        ErrorKind::InvalidValue,
                        format!("Cannot read '{}': {err}", path.display()),
                    )
                    .exit();
            }
        },
        (None, None) => {
            Args::command()
                .error(ErrorKind::MissingRequiredArgument, "Missing a program!")
                .exit();
        }
    };

    match run(&args, &source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, source: &str) -> CResult<()> {
    let parser = match args.arg {
        Some(value) => Parser::with_arg(source, value),
        None => Parser::new(source),
    };
    let mut compilation: Compilation = parser.parse()?;
    if !args.no_opt {
        compilation.iterate()?;
    }

    if args.ir {
        print!("{}", compilation.pretty_print());
    } else {
        println!("{}", compilation.print());
    }

    if let Some(arg) = args.eval {
        match compilation.evaluate(arg) {
            Some(value) => println!("{value}"),
            None => println!("{}", "timeout".yellow()),
        }
    }
    Ok(())
}
