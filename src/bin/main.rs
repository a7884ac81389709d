// Line-oriented driver for a keyboard host process.
//
//   LEARN <word>               learn a committed word
//   PREDICT <prefix> [limit]   answer with CANDIDATE lines followed by END
//   SELECT <AUTO|PLAIN> <text> answer with COMMIT_TEXT or REPLACE_COMPOSING
//   SAVE                       request a background save
//   EXIT                       flush to disk and quit
use keyboard_core::{Candidate, Dictionary, DictionaryConfig, FileBackend, Selection};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const DICTIONARY_PATH: &str = "user_dictionary.lkwd";

fn init_logging() {
    // stdout carries the protocol, so diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("keyboard_core=info")))
        .init();
}

fn load_config(path: Option<String>) -> DictionaryConfig {
    let Some(path) = path else {
        return DictionaryConfig::default();
    };
    DictionaryConfig::from_json_file(Path::new(&path)).unwrap_or_else(|e| {
        warn!(error = %e, path = %path, "using default config");
        DictionaryConfig::default()
    })
}

fn main() -> io::Result<()> {
    init_logging();

    let mut args = env::args().skip(1);
    let dict_path = args.next().unwrap_or_else(|| DICTIONARY_PATH.to_string());
    let config = load_config(args.next());

    info!(path = %dict_path, "keyboard engine starting");
    let dictionary = Dictionary::open(config, Arc::new(FileBackend::new(&dict_path)));

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let input = line?;
        debug!(input = %input, "command");
        let (command, rest) = input.split_once(' ').unwrap_or((input.as_str(), ""));

        match command {
            "LEARN" => dictionary.learn(rest),
            "PREDICT" => {
                let (prefix, limit) = parse_predict(rest, dictionary.config().default_limit);
                write_candidates(&mut stdout, &dictionary.candidates(prefix, limit))?;
            }
            "SELECT" => {
                let (kind, text) = rest.split_once(' ').unwrap_or((rest, ""));
                let candidate = Candidate { text: text.to_string(), is_autocorrect: kind == "AUTO" };
                match dictionary.select(&candidate) {
                    Selection::Commit(text) => writeln!(stdout, "COMMIT_TEXT {}", text)?,
                    Selection::ReplaceComposing(text) => writeln!(stdout, "REPLACE_COMPOSING {}", text)?,
                }
                stdout.flush()?;
            }
            "SAVE" => {
                if let Err(e) = dictionary.save() {
                    warn!(error = %e, "save failed");
                }
            }
            "EXIT" => break,
            _ => warn!(command = %command, "unknown command"),
        }
    }

    info!("shutting down, saving dictionary");
    if let Err(e) = dictionary.flush() {
        warn!(error = %e, "could not save dictionary");
    }
    Ok(())
}

fn parse_predict(rest: &str, default_limit: usize) -> (&str, usize) {
    let mut parts = rest.split_whitespace();
    let prefix = parts.next().unwrap_or("");
    let limit = parts.next().and_then(|s| s.parse().ok()).unwrap_or(default_limit);
    (prefix, limit)
}

fn write_candidates(stdout: &mut io::Stdout, candidates: &[Candidate]) -> io::Result<()> {
    for (i, candidate) in candidates.iter().enumerate() {
        let kind = if candidate.is_autocorrect { "AUTO" } else { "PLAIN" };
        writeln!(stdout, "CANDIDATE {} {} {}", i, candidate.text, kind)?;
    }
    writeln!(stdout, "END")?;
    stdout.flush()
}
