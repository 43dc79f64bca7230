//! Operator interaction.
//!
//! The pipeline only ever asks two kinds of question, so the seam is a small
//! trait that tests replace with scripted answers.

use std::io::{self, Write};

pub trait Prompter {
    /// Yes/no question. The default answer is no.
    fn confirm(&self, prompt: &str) -> bool;

    /// Pick one of `options`; returns a 0-based index. Shown to the
    /// operator 1-based; invalid input is re-prompted without limit.
    fn choose_one(&self, prompt: &str, options: &[String]) -> usize;
}

/// Reads answers from stdin.
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N]: ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        if io::stdin().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
    }

    fn choose_one(&self, prompt: &str, options: &[String]) -> usize {
        println!("{prompt}");
        for (idx, option) in options.iter().enumerate() {
            println!("{}) {}", idx + 1, option);
        }
        loop {
            print!("enter 1-{}: ", options.len());
            let _ = io::stdout().flush();
            let mut line = String::new();
            match io::stdin().read_line(&mut line) {
                // EOF: fall back to the top-ranked option
                Ok(0) | Err(_) => return 0,
                Ok(_) => {}
            }
            if let Ok(n) = line.trim().parse::<usize>()
                && (1..=options.len()).contains(&n)
            {
                return n - 1;
            }
            println!("invalid input, try again.");
        }
    }
}
