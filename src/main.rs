use std::fs;
use std::io::Write;
use std::process;

use anyhow::Context;

use rpal::fmt::format_ast;
use rpal::parser::{parse, ParseState};
use rpal::standardize::standardize;
use rpal::{cse, lexer};

const USAGE: &str = "usage: interp [-l] [-ast] [-st] <input-file>\n\
    \x20 -l    print the source before evaluation\n\
    \x20 -ast  print the abstract syntax tree and exit\n\
    \x20 -st   print the standardized tree and exit";

struct Options {
    listing: bool,
    print_ast: bool,
    print_st: bool,
    input: String,
}

fn parse_args() -> Result<Options, String> {
    let mut options = Options {
        listing: false,
        print_ast: false,
        print_st: false,
        input: String::new(),
    };
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-l" => options.listing = true,
            "-ast" => options.print_ast = true,
            "-st" => options.print_st = true,
            other if other.starts_with('-') => {
                return Err(format!("unknown flag '{other}'\n{USAGE}"));
            }
            other => {
                if !options.input.is_empty() {
                    return Err(format!("more than one input file\n{USAGE}"));
                }
                options.input = other.to_string();
            }
        }
    }
    if options.input.is_empty() {
        return Err(USAGE.to_string());
    }
    Ok(options)
}

fn run(options: &Options) -> anyhow::Result<()> {
    let source = fs::read_to_string(&options.input)
        .with_context(|| format!("cannot read '{}'", options.input))?;

    if options.listing {
        print!("{source}");
    }

    let tokens = lexer::lex(&source)?;
    let mut state = ParseState::new(tokens);
    let program = parse(&mut state)?;

    if options.print_ast {
        print!("{}", format_ast(&program));
        return Ok(());
    }

    let standardized = standardize(program)?;

    if options.print_st {
        print!("{}", format_ast(&standardized));
        return Ok(());
    }

    let structure = cse::build(&standardized)?;
    let mut stdout = std::io::stdout();
    cse::evaluate(&structure, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

fn main() {
    let options = match parse_args() {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            process::exit(2);
        }
    };

    if let Err(error) = run(&options) {
        eprintln!("{error}");
        process::exit(1);
    }
}
