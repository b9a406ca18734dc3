use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use quill::scanner;

#[derive(Parser, Debug)]
#[command(name = "quill", version, about = "Tokenizer for the Quill language")]
struct Cli {
    /// Source files to tokenize (omit for an interactive token loop)
    files: Vec<PathBuf>,

    /// Token dump format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Print the token count per file
    #[arg(long)]
    count: bool,
}

fn dump_tokens(cli: &Cli, path: &PathBuf) -> Result<bool> {
    let name = path.display().to_string();
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("read source file '{name}'"))?;

    let tokens = match scanner::scan(&name, &source) {
        Ok(tokens) => tokens,
        Err(e) => {
            let report = miette::Report::new(e.with_source_code(source));
            eprintln!("{report:?}");
            return Ok(false);
        }
    };

    match cli.format.as_str() {
        "json" => {
            let json =
                serde_json::to_string_pretty(&tokens).context("serialize tokens to JSON")?;
            println!("{json}");
        }
        _ => {
            for token in &tokens {
                println!("{token}");
            }
        }
    }
    if cli.count {
        println!("{name}: {} token(s)", tokens.len());
    }
    Ok(true)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.files.is_empty() {
        quill::repl::run_repl();
        return Ok(());
    }

    let mut failures = 0usize;
    for path in &cli.files {
        if !dump_tokens(&cli, path)? {
            failures += 1;
        }
    }
    if failures > 0 {
        bail!("{failures} file(s) failed to tokenize");
    }
    Ok(())
}
