//! Line-oriented terminal transport with a single session.
//!
//! Useful for walking through the dialogue against a real backend without a
//! Telegram token. Keyboard buttons are printed as `[ label ]`; type the label
//! to press one.

use std::sync::Arc;

use color_eyre::eyre::Result;
use pilelog_backend::BackendClient;
use pilelog_core::{Engine, Keyboard, Outgoing};
use pilelog_shared::SessionId;
use tokio::io::{AsyncBufReadExt, BufReader};

const CONSOLE_SESSION: SessionId = SessionId(0);

/// Read operator lines from stdin until EOF.
pub(crate) async fn run(engine: Arc<Engine<BackendClient>>) -> Result<()> {
    for reply in engine.handle(CONSOLE_SESSION, "/start").await {
        println!("{}", render(&reply));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        for reply in engine.handle(CONSOLE_SESSION, &line).await {
            println!("{}", render(&reply));
        }
    }

    Ok(())
}

fn render(reply: &Outgoing) -> String {
    let mut out = reply.text.clone();
    if let Keyboard::Show(rows) = &reply.keyboard {
        for row in rows {
            let buttons: Vec<String> = row.iter().map(|label| format!("[ {label} ]")).collect();
            out.push_str("\n  ");
            out.push_str(&buttons.join(" "));
        }
    }
    out.push('\n');
    out
}
