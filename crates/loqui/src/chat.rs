// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `loqui chat` command implementation.
//!
//! Interactive REPL against a running gateway. Replies stream to stdout
//! token by token; Ctrl+C during a reply aborts the stream and keeps the
//! partial text in the transcript, matching what was already rendered.

use std::io::Write;

use colored::Colorize;
use loqui_client::{ChatClient, ChatSession, DraftOutcome};
use loqui_config::LoquiConfig;
use loqui_core::ConversationTurn;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Runs the interactive chat REPL.
pub async fn run_chat(config: LoquiConfig, model: Option<String>) -> miette::Result<()> {
    let client = ChatClient::new(&config.client)
        .map_err(|e| miette::miette!("failed to build HTTP client: {e}"))?;
    let mut session: ChatSession<Vec<ConversationTurn>> = ChatSession::new(Vec::new());
    let mut model_override = model;

    let mut rl =
        DefaultEditor::new().map_err(|e| miette::miette!("failed to initialize readline: {e}"))?;

    println!("{}", "loqui chat".bold().green());
    println!(
        "Type {} to exit, {} to list models, {} to switch.\n",
        "/quit".yellow(),
        "/models".yellow(),
        "/model <id>".yellow()
    );

    let prompt = format!("{}> ", "loqui".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                match trimmed {
                    "/quit" | "/exit" => break,
                    "/models" => {
                        print_models(&client, model_override.as_deref()).await;
                        continue;
                    }
                    _ if trimmed.starts_with("/model ") => {
                        let id = trimmed.trim_start_matches("/model ").trim();
                        model_override = Some(id.to_string());
                        println!("model set to {}\n", id.cyan());
                        continue;
                    }
                    _ => {}
                }

                stream_one_reply(&client, &mut session, trimmed, model_override.as_deref())
                    .await;
            }
            // Ctrl+C at the prompt and Ctrl+D both exit.
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    println!("{}", "goodbye".dimmed());
    Ok(())
}

/// Streams one reply, racing the stream against Ctrl+C.
async fn stream_one_reply(
    client: &ChatClient,
    session: &mut ChatSession<Vec<ConversationTurn>>,
    message: &str,
    model_override: Option<&str>,
) {
    // History as of before this message; the gateway appends the message.
    // The session only commits assistant turns, so the user turn is
    // recorded here.
    let history = session.sink().clone();
    session.sink_mut().push(ConversationTurn::user(message));
    let cancel = CancellationToken::new();

    let stream = client.run_stream(session, history, message, model_override, &cancel, |token| {
        print!("{token}");
        let _ = std::io::stdout().flush();
    });
    tokio::pin!(stream);

    let outcome = loop {
        tokio::select! {
            result = &mut stream => break result,
            _ = tokio::signal::ctrl_c() => {
                debug!("abort requested");
                cancel.cancel();
            }
        }
    };

    match outcome {
        Ok(DraftOutcome::Completed { .. }) => println!("\n"),
        Ok(DraftOutcome::Aborted) => println!("\n{}\n", "(aborted)".dimmed()),
        Ok(DraftOutcome::Failed { error }) => {
            println!("\n{}: {}", "error".red(), error.message);
            if let Some(secs) = error.retry_after_secs {
                println!("{}", format!("retry suggested in {secs}s").dimmed());
            }
            println!();
        }
        // State machine misuse; the REPL drives one stream at a time.
        Err(e) => eprintln!("\n{}: {e}", "error".red()),
    }
}

async fn print_models(client: &ChatClient, current: Option<&str>) {
    match client.list_models().await {
        Ok(list) => {
            for model in &list.models {
                let marker = if current == Some(model.id.as_str())
                    || (current.is_none() && model.id == list.default)
                {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{marker} {} {} {}",
                    model.id.cyan(),
                    model.display_name,
                    format!("({})", model.provider).dimmed()
                );
            }
            println!();
        }
        Err(e) => eprintln!("{}: {}", "error".red(), e.message),
    }
}
