use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rox::ast_printer::AstPrinter;
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::scanner::Scanner;
use rox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Rox language interpreter", long_about = None)]
pub struct Cli {
    /// Subcommand to run; starts the REPL when omitted
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: PathBuf },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs input from a file as a program
    Run { filename: PathBuf },

    /// Starts an interactive session
    Repl,
}

/// Maps the file read-only and validates it as UTF-8.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).with_context(|| format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .with_context(|| format!("Failed to stat file {:?}", filename))?
        .len();

    if len == 0 {
        return Ok(String::new());
    }

    // SAFETY: the map is read-only and dropped before this function returns;
    // the text is copied out first.
    let map = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to map file {:?}", filename))?;

    let text = std::str::from_utf8(&map)
        .with_context(|| format!("File {:?} is not valid UTF-8", filename))?
        .to_owned();

    info!("Read {} bytes from {:?}", text.len(), filename);

    Ok(text)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn tokenize(source: &str, json: bool) -> Result<i32> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut failed = false;

    for item in Scanner::new(source) {
        match item {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                if !json {
                    println!("{}", token);
                }
                tokens.push(token);
            }
            Err(e) => {
                failed = true;
                eprintln!("{}", e);
            }
        }
    }

    if json {
        let rendered = serde_json::to_string_pretty(&tokens).context("Failed to encode tokens")?;
        println!("{}", rendered);
    }

    Ok(if failed { 65 } else { 0 })
}

fn parse(source: &str) -> i32 {
    let (tokens, errors) = Scanner::new(source).scan_tokens();

    if !errors.is_empty() {
        errors.iter().for_each(|e| eprintln!("{}", e));
        return 65;
    }

    match Parser::new(tokens).parse_expression() {
        Ok(expr) => {
            println!("{}", AstPrinter::print(&expr));
            0
        }
        Err(e) => {
            debug!("Parse debug: {}", e);
            eprintln!("{}", e);
            65
        }
    }
}

fn evaluate(source: &str) -> i32 {
    let mut interpreter = Interpreter::new();

    match interpreter.run_expression(source) {
        Ok(value) => {
            println!("{}", value);
            0
        }
        Err(e @ rox::error::LoxError::Runtime { .. }) => {
            eprintln!("{}", e);
            70
        }
        Err(e) => {
            eprintln!("{}", e);
            65
        }
    }
}

fn run(source: &str) -> i32 {
    let mut interpreter = Interpreter::new();

    match interpreter.run(source) {
        Ok(_) => {
            info!("Program executed successfully");
            0
        }
        Err(e) => {
            debug!("Run failed: {:?}", e);
            e.errors().iter().for_each(|err| eprintln!("{}", err));
            e.exit_code()
        }
    }
}

fn repl() -> Result<i32> {
    info!("Starting REPL");

    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        print!("> ");
        stdout.flush().context("Failed to flush stdout")?;

        line.clear();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        let input = line.trim();

        if read == 0 || input == "exit" {
            break;
        }

        if input.is_empty() {
            continue;
        }

        match interpreter.run(input) {
            Ok(value) if !value.is_nil() => println!("{}", value),
            Ok(_) => {}
            Err(e) => e.errors().iter().for_each(|err| eprintln!("{}", err)),
        }
    }

    info!("Leaving REPL");

    Ok(0)
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::from_default_env().init();
    }

    info!("CLI arguments: {:?}", args);

    let code = match args.commands.unwrap_or(Commands::Repl) {
        Commands::Tokenize { filename, json } => tokenize(&read_file(&filename)?, json)?,
        Commands::Parse { filename } => parse(&read_file(&filename)?),
        Commands::Evaluate { filename } => evaluate(&read_file(&filename)?),
        Commands::Run { filename } => run(&read_file(&filename)?),
        Commands::Repl => repl()?,
    };

    if code != 0 {
        debug!("Exiting with code {}", code);
        std::process::exit(code);
    }

    Ok(())
}
