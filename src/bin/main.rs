use crossterm::style::Stylize;
use fuzzy_core::{FuzzyConfig, FuzzyError, FuzzyMap, GetOptions};
use serde_json::json;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: fuzzy_lookup <word-list> [--config <config.json>] [--snapshot <dict.bin>]";

struct Args {
    words: PathBuf,
    config: Option<PathBuf>,
    snapshot: Option<PathBuf>,
}

fn parse_args() -> Option<Args> {
    let mut args = std::env::args().skip(1);
    let words = PathBuf::from(args.next()?);
    let mut config = None;
    let mut snapshot = None;
    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--config" => config = Some(PathBuf::from(args.next()?)),
            "--snapshot" => snapshot = Some(PathBuf::from(args.next()?)),
            _ => return None,
        }
    }
    Some(Args { words, config, snapshot })
}

fn build_dictionary(args: &Args) -> Result<FuzzyMap<String>, FuzzyError> {
    let config = match &args.config {
        Some(path) => FuzzyConfig::from_json_file(path)?,
        None => FuzzyConfig::default(),
    };
    let mut dict = FuzzyMap::with_config(config);

    let text = fs::read_to_string(&args.words)?;
    for word in text.lines().map(str::trim).filter(|w| !w.is_empty()) {
        dict.insert(word, word.to_string())?;
    }
    tracing::info!(words = dict.len(), "dictionary built");

    if let Some(path) = &args.snapshot {
        dict.save(path)?;
    }
    Ok(dict)
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let Some(args) = parse_args() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let dict = match build_dictionary(&args) {
        Ok(dict) => dict,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            std::process::exit(1);
        }
    };

    println!("{}", "Fuzzy lookup. One query per line, Ctrl-D to quit.".bold());
    println!("{}", format!("{} keys loaded", dict.len()).dark_grey());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let query = line?;
        let query = query.trim();
        if query.is_empty() {
            continue;
        }

        match dict.get(query, &GetOptions::new().topn(5)) {
            Ok(matches) => {
                writeln!(stdout, "{} {}", "found".green().bold(), query)?;
                for m in matches {
                    let corrections: Vec<_> = m
                        .corrections
                        .iter()
                        .map(|c| json!({ "correction": c.description(), "position": c.position, "cost": c.cost }))
                        .collect();
                    let row = json!({ "key": m.key, "value": m.value, "cost": m.cost, "corrections": corrections });
                    writeln!(stdout, "{row}")?;
                }
            }
            Err(FuzzyError::NoMatch { .. }) => {
                writeln!(stdout, "{} {}", "no match".yellow().bold(), query)?;
            }
            Err(e) => {
                writeln!(stdout, "{} {e}", "error:".red().bold())?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}
