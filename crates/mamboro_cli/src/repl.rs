//! Interactive read/generate loop. Owns the conversation history and
//! renders each cumulative snapshot by printing only the newly generated
//! suffix, so tokens appear as they arrive.

use std::sync::Arc;

use console::{Term, style};
use futures::StreamExt;

use mamboro_core::{ChatConfig, ChatSession, ConversationHistory, ConversationTurn, Snapshot};
use mamboro_ollama::OllamaEngine;

pub async fn run(config: ChatConfig) -> anyhow::Result<()> {
    let engine = Arc::new(OllamaEngine::from_config(&config));
    let session = ChatSession::from_config(engine, &config);
    let term = Term::stdout();
    let mut history: ConversationHistory = Vec::new();

    term.write_line(&format!(
        "{} chatting with {} via {} (/quit to exit)",
        style("mamboro").cyan().bold(),
        style(&config.model).green(),
        config.engine_url,
    ))?;

    loop {
        term.write_str(&format!("{} ", style("you:").bold()))?;
        let line = term.read_line()?;
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message == "/quit" || message == "/exit" {
            break;
        }

        let mut snapshots = match session.generate_streaming_response(message, &history).await {
            Ok(snapshots) => snapshots,
            Err(e) => {
                // Pre-generation failure: nothing was produced.
                term.write_line(&format!("{} {e}", style("error:").red().bold()))?;
                continue;
            }
        };

        term.write_str(&format!("{} ", style("assistant:").magenta().bold()))?;
        let mut printed = 0;
        let mut last = Snapshot::ok("");
        while let Some(snapshot) = snapshots.next().await {
            // Snapshot text only ever grows; print the new suffix.
            if snapshot.text.len() > printed {
                term.write_str(&snapshot.text[printed..])?;
                printed = snapshot.text.len();
            }
            last = snapshot;
        }
        term.write_line("")?;

        if let Some(error) = &last.error {
            term.write_line(&format!("{} {error}", style("[interrupted]").red()))?;
        }
        // Record the turn either way; on failure the partial text is what
        // the user saw and what the model should see next time.
        history.push(ConversationTurn::new(message, last.text));
    }

    Ok(())
}
