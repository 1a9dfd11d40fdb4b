//! The `loxide` command-line driver: runs a source file through one of the
//! pipeline stages, or — with no subcommand and no file — starts a REPL
//! that feeds stdin fragments to a single long-lived `Interpreter`.

extern crate loxide;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Parser as ClapParser, Subcommand};
use log::error;

use loxide::checker::Checker;
use loxide::interpreter::{request_interrupt, Interpreter};
use loxide::lexer::Lexer;
use loxide::parser::Parser as LoxideParser;

#[derive(ClapParser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Suppress timestamp/color prefixes so golden-test stdout stays stable.
    #[arg(long, global = true)]
    ui_testing: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one line per token.
    Lex { file: PathBuf },
    /// Print the parsed AST's S-expression dump.
    Parse { file: PathBuf },
    /// Run a source file.
    #[command(alias = "interpret")]
    Run { file: PathBuf },
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let level = if args.ui_testing { log::Level::Error } else { log::Level::Warn };
    simple_logger::init_with_level(level).unwrap();

    install_interrupt_handler();

    match args.command {
        Some(Command::Lex { file }) => run_lex(&file),
        Some(Command::Parse { file }) => run_parse(&file),
        Some(Command::Run { file }) => run_interpret(&file),
        None => run_repl(),
    }
}

fn install_interrupt_handler() {
    if let Err(e) = ctrlc::set_handler(request_interrupt) {
        error!("could not install interrupt handler: {e}");
    }
}

fn read_source(path: &PathBuf) -> Option<Rc<str>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Some(Rc::from(contents)),
        Err(e) => {
            error!("could not read file '{}': {e}", path.display());
            None
        }
    }
}

fn run_lex(path: &PathBuf) -> ExitCode {
    let Some(source) = read_source(path) else { return ExitCode::FAILURE };
    match Lexer::new(Rc::clone(&source)).lex() {
        Ok(tokens) => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for token in &tokens {
                let _ = writeln!(out, "{}", token.dump());
            }
            ExitCode::SUCCESS
        }
        Err(errors) => {
            report_errors(&errors);
            ExitCode::FAILURE
        }
    }
}

fn run_parse(path: &PathBuf) -> ExitCode {
    let Some(source) = read_source(path) else { return ExitCode::FAILURE };
    let tokens = match Lexer::new(Rc::clone(&source)).lex() {
        Ok(tokens) => tokens,
        Err(errors) => {
            report_errors(&errors);
            return ExitCode::FAILURE;
        }
    };
    match LoxideParser::new(Rc::clone(&source), tokens).parse() {
        Ok(program) => {
            println!("{}", loxide::ast::dump::dump_program(&program));
            ExitCode::SUCCESS
        }
        Err(errors) => {
            report_errors(&errors);
            ExitCode::FAILURE
        }
    }
}

fn run_interpret(path: &PathBuf) -> ExitCode {
    let Some(source) = read_source(path) else { return ExitCode::FAILURE };
    let mut interp = Interpreter::new();
    match compile(&source) {
        Ok(program) => match interp.interpret(&program, source) {
            Ok(()) => ExitCode::SUCCESS,
            Err(errors) => {
                report_errors(&errors);
                ExitCode::FAILURE
            }
        },
        Err(errors) => {
            report_errors(&errors);
            ExitCode::FAILURE
        }
    }
}

fn compile(source: &Rc<str>) -> Result<loxide::ast::Program, loxide::diagnostics::ErrorList> {
    let tokens = Lexer::new(Rc::clone(source)).lex()?;
    let program = LoxideParser::new(Rc::clone(source), tokens).parse()?;
    Checker::new().check(&program);
    Ok(program)
}

fn run_repl() -> ExitCode {
    let mut interp = Interpreter::new();
    interp.set_print_expr_statements(true);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let source: Rc<str> = Rc::from(line);
        match compile(&source) {
            Ok(program) => {
                if let Err(errors) = interp.interpret(&program, source) {
                    report_errors(&errors);
                }
            }
            Err(errors) => report_errors(&errors),
        }
        let _ = out.flush();
    }
    ExitCode::SUCCESS
}

fn report_errors(errors: &loxide::diagnostics::ErrorList) {
    for e in errors.iter() {
        error!("{e}");
    }
}
