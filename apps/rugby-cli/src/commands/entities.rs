//! Entity extraction diagnostics

use anyhow::Result;
use colored::Colorize;

use crate::output::{to_json, OutputFormat};

pub fn run(query: &str, format: OutputFormat) -> Result<()> {
    let engine = super::build_engine()?;
    let entities = engine.extractor().extract(query);

    match format {
        OutputFormat::Json => println!("{}", to_json(&entities)?),
        OutputFormat::Text => {
            let rows = [
                ("Players", &entities.players),
                ("Teams", &entities.teams),
                ("Positions", &entities.positions),
                ("Event types", &entities.event_types),
                ("Time reference", &entities.time_reference),
            ];
            for (label, values) in rows {
                let shown = if values.is_empty() {
                    "-".dimmed().to_string()
                } else {
                    values.join(", ")
                };
                println!("{}: {}", label.bold(), shown);
            }
        }
    }
    Ok(())
}
