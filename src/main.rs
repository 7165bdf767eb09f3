use clap::{crate_version, App, Arg, ErrorKind};
use cmm::channel::InputSlot;
use cmm::debug;
use std::fs;
use std::io;
use std::process;
use std::sync::mpsc;
use std::thread;

fn main() {
    let app = App::new("cmm")
        .version(crate_version!())
        .about("Lexes, parses and runs CMM programs")
        .arg(
            Arg::with_name("FILE")
                .help("Program source")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("tokens")
                .short("t")
                .long("tokens")
                .help("Prints the token table before parsing"),
        )
        .arg(
            Arg::with_name("tree")
                .short("p")
                .long("tree")
                .help("Prints the parse tree before running"),
        )
        .arg(
            Arg::with_name("check")
                .short("c")
                .long("check")
                .help("Stops after parsing"),
        );
    let matches = match app.get_matches_safe() {
        Ok(matches) => matches,
        Err(e) => match e.kind {
            ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed => e.exit(),
            _ => {
                eprintln!("{}", e.message);
                process::exit(64);
            }
        },
    };
    let file = match matches.value_of("FILE") {
        Some(file) => file,
        None => process::exit(64),
    };
    let source = match fs::read_to_string(file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Could not read '{}': {}", file, err);
            process::exit(66);
        }
    };

    let (tokens, lex_errors) = cmm::lex(&source);
    if matches.is_present("tokens") {
        print!("{}", debug::format_tokens(&tokens));
    }
    report(&lex_errors, "lexical");
    if !lex_errors.is_empty() {
        process::exit(65);
    }

    let (program, syntax_errors) = cmm::parse(&tokens);
    if matches.is_present("tree") {
        print!("{}", debug::format_tree(&program));
    }
    report(&syntax_errors, "syntax");
    if !syntax_errors.is_empty() {
        process::exit(65);
    }
    if matches.is_present("check") {
        return;
    }

    let slot = InputSlot::new();
    let (tx, rx) = mpsc::channel();
    let handle = cmm::spawn(program, slot.clone(), tx);
    feed_stdin(slot);
    for line in rx {
        println!("{}", line);
    }
    let runtime_errors = match handle.join() {
        Ok(errors) => errors,
        Err(_) => {
            eprintln!("interpreter thread panicked");
            process::exit(70);
        }
    };
    report(&runtime_errors, "runtime");
    if !runtime_errors.is_empty() {
        process::exit(70);
    }
}

fn report<E: std::fmt::Display>(errors: &[E], stage: &str) {
    for err in errors {
        eprintln!("{}", err);
    }
    eprintln!("{} {} error(s)", errors.len(), stage);
}

/// Answers each `read` with one line of stdin. Once stdin is exhausted every
/// further request gets an empty line.
fn feed_stdin(slot: InputSlot) {
    thread::spawn(move || {
        let stdin = io::stdin();
        let mut exhausted = false;
        loop {
            slot.wait_for_request();
            let mut line = String::new();
            if !exhausted {
                match stdin.read_line(&mut line) {
                    Ok(0) | Err(_) => exhausted = true,
                    Ok(_) => (),
                }
            }
            slot.deposit(line.trim_end_matches(|c: char| c == '\n' || c == '\r'));
        }
    });
}
