//! Interactive chat command

use anyhow::Result;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use tracing::warn;

use rugby_nlp::NlpError;

use super::Session;
use crate::output::{render_outcome, OutputFormat, NOT_UNDERSTOOD};

/// Lines with these prefixes are log output pasted back in, not questions.
const LOG_PREFIXES: &[&str] = &["INFO:", "DEBUG:", "WARNING:", "ERROR:"];

/// Reduces raw input to the question it carries: the last line that is neither blank nor
/// a log line.
pub fn sanitize_input(raw: &str) -> Option<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !LOG_PREFIXES.iter().any(|prefix| line.starts_with(prefix)))
        .last()
        .map(str::to_string)
}

fn is_exit(input: &str) -> bool {
    matches!(input.to_lowercase().as_str(), "exit" | "quit")
}

pub async fn run(format: OutputFormat) -> Result<()> {
    let mut session = super::build_session()?;

    println!("{}", "RugbyBot ready. Ask about players, teams and games.".green());
    println!("{}", "Type 'exit' or 'quit' to end the session.".dimmed());
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", "You:".bold());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let Some(input) = sanitize_input(&line?) else {
            println!("{}", NOT_UNDERSTOOD);
            continue;
        };
        if is_exit(&input) {
            println!("{}", "Goodbye!".green());
            break;
        }

        answer(&mut session, &input, format).await?;
    }

    Ok(())
}

async fn answer(session: &mut Session, input: &str, format: OutputFormat) -> Result<()> {
    match session.engine.process(input).await {
        Ok(outcome) => {
            let reply = render_outcome(input, &outcome, format, &session.phraser).await?;
            println!();
            println!("{} {}", "RugbyBot:".cyan().bold(), reply);
            println!();
        }
        Err(NlpError::Validation(msg)) => {
            warn!("Rejected input: {}", msg);
            println!("{}", NOT_UNDERSTOOD);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
