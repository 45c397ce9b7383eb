//! Command-line argument parsing

use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rugby",
    about = "RugbyBot - answer rugby questions from match data",
    version,
    long_about = "Routes a rugby question, classifies its intent, extracts entities \
                  and answers it from the loaded match corpus.\n\n\
                  Endpoint, API key and data locations come from RUGBY__* environment \
                  variables or a .env file."
)]
pub struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        env = "LOG_LEVEL",
        default_value = "warn",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        global = true
    )]
    pub log_level: String,

    /// Enable JSON log format
    #[arg(long, env = "JSON_LOGS", global = true)]
    pub json_logs: bool,

    /// Output format (text, json)
    #[arg(
        short,
        long,
        default_value = "text",
        value_parser = ["text", "json"],
        global = true
    )]
    pub format: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Answer a single question
    Ask {
        /// The question to answer
        query: String,
    },

    /// Start an interactive session
    Chat,

    /// Show the route and intent chosen for a question
    Classify {
        query: String,

        /// Model to use instead of the configured one
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show the entities extracted from a question
    Entities { query: String },
}
