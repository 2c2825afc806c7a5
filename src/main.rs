use peglet_rust::ast::Grammar;
use peglet_rust::diagnostics::{format_grammar, print_parsing_message, render_grammar_error, HIGHLIGHT};
use peglet_rust::error::GrammarError;
use peglet_rust::value::Object;
use peglet_rust::{parse_into_object_with, ParseOptions};

use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "peglet")]
#[command(about = "Parse text into JSON with a small PEG-style grammar")]
struct Args {
    /// Grammar file, one rule definition per line
    #[arg(short, long)]
    grammar: PathBuf,

    /// Rule to start parsing from
    #[arg(short, long)]
    start: Option<String>,

    /// Input file (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Fail when the start rule leaves input unconsumed
    #[arg(long)]
    strict: bool,

    /// Pretty-print the JSON result
    #[arg(long)]
    pretty: bool,

    /// Print the compiled grammar and exit
    #[arg(long)]
    dump_grammar: bool,

    /// Disable colored error highlighting
    #[arg(long)]
    no_color: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let source = fs::read_to_string(&args.grammar)
        .map_err(|e| format!("cannot read grammar {}: {}", args.grammar.display(), e))?;

    let mut grammar = Grammar::from_source(&source).map_err(|e| report(args, &e, &source))?;
    grammar.link().map_err(|e| e.to_string())?;

    if args.dump_grammar {
        print!("{}", format_grammar(&grammar));
        return Ok(());
    }

    let start = args
        .start
        .as_deref()
        .ok_or_else(|| "a start rule is required (--start)".to_string())?;

    let input = match &args.input {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("cannot read input {}: {}", path.display(), e))?,
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .map_err(|e| format!("cannot read stdin: {}", e))?;
            input
        }
    };

    let options = ParseOptions {
        strict: args.strict,
    };
    let result = parse_into_object_with(Object::new(), &input, &grammar, start, &options);
    if let Some(err) = result.errors.first() {
        return Err(report(args, err, &input));
    }

    let json = if args.pretty {
        result.value.to_json_pretty()
    } else {
        result.value.to_json()
    };
    println!("{}", json.map_err(|e| e.to_string())?);
    Ok(())
}

/// Format `err` against the text it points into.
fn report(args: &Args, err: &GrammarError, text: &str) -> String {
    match err {
        GrammarError::Compile { index, .. } => {
            let line = text
                .lines()
                .filter(|line| !line.trim().is_empty())
                .nth(*index)
                .unwrap_or("");
            render_grammar_error(err, line)
        }
        GrammarError::NoMatch { position, .. } | GrammarError::TrailingInput { position, .. }
            if !args.no_color =>
        {
            let mut out = Vec::new();
            let _ = print_parsing_message(
                &mut out,
                &err.to_string(),
                text,
                HIGHLIGHT,
                *position,
                text.len(),
            );
            String::from_utf8_lossy(&out).trim_end().to_string()
        }
        _ => render_grammar_error(err, text),
    }
}
