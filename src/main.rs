use chordsheet::chord::Spelling;
use chordsheet::transpose::transpose_text_with;
use chordsheet::{
    format_melody, keyboard_voicing, parse_melody_string, parse_song, transpose_melody,
    transpose_steps, ChordError, Config, OutputFormat,
};
use serde::Serialize;
use serde_json::json;
use std::env;
use std::fs;
use std::process;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: chordsheet [--config <file.yaml>] <command> [args]

Commands:
  parse <song.txt>               parsed song
  chords <song.txt>              chords used in the song
  bars <song.txt>                chords grouped per bar
  transpose <song.txt> [steps]   song text with transposed chords
  steps <from-key> <to-key>      semitones between two keys
  melody <melody> [semitones]    parsed (and transposed) numeric melody
  voicing <chord>                keyboard voicing of a chord";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        if matches!(e, ChordError::Usage(_)) {
            eprintln!();
            eprintln!("{}", USAGE);
        }
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), ChordError> {
    let (config, args) = match args {
        [flag, path, rest @ ..] if flag == "--config" => (Config::load(path)?, rest),
        [flag] if flag == "--config" => {
            return Err(ChordError::Usage("--config needs a file".to_string()))
        }
        _ => (Config::default(), args),
    };

    let Some((command, rest)) = args.split_first() else {
        return Err(ChordError::Usage("no command given".to_string()));
    };

    match (command.as_str(), rest) {
        ("parse", [path]) => {
            let song = parse_song(&read_source(path)?);
            match config.output {
                OutputFormat::Json => print_json(&song)?,
                OutputFormat::Text => {
                    for (key, value) in &song.metadata {
                        println!("{}: {}", key, value);
                    }
                    for section in song.sections() {
                        println!(
                            "[{} #{}] {} ({} lines)",
                            section.name,
                            section.occurrence + 1,
                            section.label,
                            section.lines.len()
                        );
                    }
                }
            }
        }
        ("chords", [path]) => {
            let chords = parse_song(&read_source(path)?).all_chords();
            match config.output {
                OutputFormat::Json => print_json(&chords)?,
                OutputFormat::Text => chords.iter().for_each(|c| println!("{}", c)),
            }
        }
        ("bars", [path]) => {
            let bars = parse_song(&read_source(path)?).chords_by_bar();
            match config.output {
                OutputFormat::Json => print_json(&bars)?,
                OutputFormat::Text => {
                    for bar in bars {
                        println!("| {} |", bar.join(" "));
                    }
                }
            }
        }
        ("transpose", [path, tail @ ..]) if tail.len() <= 1 => {
            let source = read_source(path)?;
            let steps = match tail.first() {
                Some(steps) => parse_number(steps)?,
                None => {
                    let song = parse_song(&source);
                    let from = song.metadata("original_key").or_else(|| song.metadata("key"));
                    config.steps_for(from)
                }
            };
            let spelling = config.prefer_flats.map(|flats| {
                if flats {
                    Spelling::Flat
                } else {
                    Spelling::Sharp
                }
            });
            tracing::debug!(steps, ?spelling, "transposing {}", path);
            print!("{}", transpose_text_with(&source, steps, spelling));
        }
        ("steps", [from, to]) => {
            println!("{}", transpose_steps(from, to));
        }
        ("melody", [melody, tail @ ..]) if tail.len() <= 1 => {
            let semitones = match tail.first() {
                Some(semitones) => parse_number(semitones)?,
                None => config.transpose,
            };
            let notes = transpose_melody(&parse_melody_string(melody), semitones);
            match config.output {
                OutputFormat::Json => print_json(&json!({
                    "notes": notes,
                    "formatted": format_melody(&notes),
                }))?,
                OutputFormat::Text => println!("{}", format_melody(&notes)),
            }
        }
        ("voicing", [symbol]) => {
            let voicing = keyboard_voicing(symbol)
                .ok_or_else(|| ChordError::Usage(format!("'{}' is not a chord", symbol)))?;
            match config.output {
                OutputFormat::Json => print_json(&voicing)?,
                OutputFormat::Text => {
                    let bass = voicing
                        .bass
                        .map(|b| format!(" (bass {})", b))
                        .unwrap_or_default();
                    println!("{}: {}{}", voicing.chord, voicing.note_names.join(" "), bass);
                }
            }
        }
        (
            "parse" | "chords" | "bars" | "transpose" | "steps" | "melody" | "voicing",
            _,
        ) => {
            return Err(ChordError::Usage(format!(
                "wrong arguments for '{}'",
                command
            )))
        }
        _ => return Err(ChordError::Usage(format!("unknown command '{}'", command))),
    }
    Ok(())
}

fn read_source(path: &str) -> Result<String, ChordError> {
    fs::read_to_string(path).map_err(|source| ChordError::Io {
        path: path.into(),
        source,
    })
}

fn parse_number(arg: &str) -> Result<i32, ChordError> {
    arg.parse()
        .map_err(|_| ChordError::Usage(format!("'{}' is not a number of semitones", arg)))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), ChordError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
