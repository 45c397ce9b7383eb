//! Single question command

use anyhow::Result;

use crate::output::{render_outcome, OutputFormat};

pub async fn run(query: &str, format: OutputFormat) -> Result<()> {
    let mut session = super::build_session()?;
    let outcome = session.engine.process(query).await?;
    println!(
        "{}",
        render_outcome(query, &outcome, format, &session.phraser).await?
    );
    Ok(())
}
