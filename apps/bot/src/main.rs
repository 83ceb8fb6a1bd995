//! PileLog bot: records pile-driving events through a chat dialogue.
//!
//! Operators pick a pile, a date, and enter the measured head elevation;
//! the completed record is posted to the project's web service.

mod commands;
mod console;
mod telegram;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
