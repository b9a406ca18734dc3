use std::io::{self, BufRead, Write};

use crate::scanner;

/// Run the interactive token loop: each line is scanned independently and
/// its tokens printed, so bracket state does not persist across lines.
pub fn run_repl() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush().expect("flush stdout");

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // Ctrl-D / EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("read error: {e}");
                break;
            }
        }

        let trimmed = line.trim_end_matches('\n');
        if trimmed.trim().is_empty() {
            continue;
        }

        match scanner::scan("<repl>", trimmed) {
            Ok(tokens) => {
                for token in &tokens {
                    println!("{token}");
                }
            }
            Err(e) => {
                let report = miette::Report::new(e.with_source_code(trimmed));
                eprintln!("{report:?}");
            }
        }
    }
}
