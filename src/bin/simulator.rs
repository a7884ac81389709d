// Interactive keyboard simulator.
// Run with: cargo run --bin simulator [dictionary path]
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use keyboard_core::{Candidate, Dictionary, DictionaryConfig, FileBackend, Selection};
use std::env;
use std::io::{stdin, stdout, Write};
use std::sync::Arc;

const DICTIONARY_PATH: &str = "user_dictionary.lkwd";

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_env_filter("keyboard_core=warn").init();

    let dict_path = env::args().nth(1).unwrap_or_else(|| DICTIONARY_PATH.to_string());
    let dictionary = Dictionary::open(DictionaryConfig::default(), Arc::new(FileBackend::new(&dict_path)));
    let limit = dictionary.config().default_limit;
    let mut preedit = String::new();
    let mut committed = String::new();

    loop {
        let candidates = dictionary.candidates(&preedit, limit);
        print_ui(&preedit, &committed, &candidates)?;

        let mut input = String::new();
        if stdin().read_line(&mut input)? == 0 {
            break;
        }
        let cmd = input.trim_end_matches(['\r', '\n']);

        match cmd {
            "exit" => break,
            "" => {
                // Enter commits the composed text as typed
                if !preedit.is_empty() {
                    dictionary.learn(&preedit);
                    committed.push_str(&preedit);
                    committed.push(' ');
                    preedit.clear();
                }
            }
            s if s.starts_with(':') && s.len() > 1 => {
                let picked = s[1..]
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| candidates.get(i));
                if let Some(candidate) = picked {
                    match dictionary.select(candidate) {
                        Selection::ReplaceComposing(text) => preedit = text,
                        Selection::Commit(text) => {
                            committed.push_str(&text);
                            committed.push(' ');
                            preedit.clear();
                        }
                    }
                }
            }
            s => preedit.push_str(s),
        }
    }

    println!("\nSaving dictionary...");
    match dictionary.flush() {
        Ok(()) => println!("Dictionary saved to '{}'", dict_path),
        Err(e) => eprintln!("[ERROR] Could not save dictionary: {}", e),
    }
    Ok(())
}

fn print_ui(preedit: &str, committed: &str, candidates: &[Candidate]) -> std::io::Result<()> {
    let mut out = stdout();
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    println!("{}", "Learning Keyboard Simulator".bold());
    println!("---------------------------------------------------------------");
    println!("Type letters and press [Enter] to extend the word, empty line commits.");
    println!("Select with ':1', ':2'. 'exit' to save and quit.\n");

    println!("Text:     {}", committed);
    println!("Pre-edit: [{}]", preedit.underlined());

    if candidates.is_empty() {
        println!("\nNo suggestions.");
    } else {
        println!("\nSuggestions:");
        for (i, candidate) in candidates.iter().enumerate() {
            if candidate.is_autocorrect {
                println!("  :{}: {} {}", i + 1, candidate.text.as_str().green().bold(), "(Auto)".dark_grey());
            } else {
                println!("  :{}: {}", i + 1, candidate.text);
            }
        }
    }
    print!("\n> ");
    out.flush()
}
