//! Main chat loop orchestration.
//!
//! Reads lines from stdin, dispatches slash commands, and streams each
//! message through the [`StreamConsumer`]. Ctrl+C during a reply drops the
//! response body, which the server sees as a disconnect and stops the turn.

use std::io::Write;
use std::time::Duration;

use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use uuid::Uuid;

use gradepal_core::starters::catalog::PromptCatalog;
use gradepal_core::stream::consumer::{StreamConsumer, Transcript};
use gradepal_types::chat::ChatRole;
use gradepal_types::config::RevealConfig;
use gradepal_types::prompt::Prompt;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::renderer::ConsoleObserver;
use crate::cli::client::ApiClient;
use crate::cli::threads::{print_history, print_threads};

/// Run the interactive chat loop until `/exit` or end of input.
pub async fn run_chat_loop(
    client: &ApiClient,
    server: &str,
    reveal: &RevealConfig,
    mut thread_id: Option<Uuid>,
) -> anyhow::Result<()> {
    print_welcome_banner(server, thread_id);

    let consumer =
        StreamConsumer::new(reveal.chars_per_tick, Duration::from_millis(reveal.tick_ms));
    let mut transcript = Transcript::new();
    let mut observer = ConsoleObserver::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut prompts: Vec<Prompt> = Vec::new();

    loop {
        print!("  {} ", style("You:").green().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut message = input.to_string();
        if let Some(command) = commands::parse(input) {
            let mut chosen = None;
            match command {
                ChatCommand::Help => commands::print_help(),
                ChatCommand::Exit => break,
                ChatCommand::New => {
                    thread_id = None;
                    transcript = Transcript::new();
                    println!("\n  {}\n", style("Started a new conversation").dim());
                }
                ChatCommand::History => match thread_id {
                    Some(id) => match client.history(id).await {
                        Ok(history) => print_history(&history),
                        Err(e) => eprintln!("  {} {e}", style("!").red().bold()),
                    },
                    None => println!("\n  {}\n", style("No messages yet").dim()),
                },
                ChatCommand::Threads => match client.threads().await {
                    Ok(threads) => print_threads(&threads),
                    Err(e) => eprintln!("  {} {e}", style("!").red().bold()),
                },
                ChatCommand::Prompts(None) => match client.prompts().await {
                    Ok(fetched) => {
                        prompts = numbered(&fetched);
                        print_prompts(&prompts);
                    }
                    Err(e) => eprintln!("  {} {e}", style("!").red().bold()),
                },
                ChatCommand::Prompts(Some(n)) => {
                    if prompts.is_empty() {
                        match client.prompts().await {
                            Ok(fetched) => prompts = numbered(&fetched),
                            Err(e) => eprintln!("  {} {e}", style("!").red().bold()),
                        }
                    }
                    match prompts.get(n - 1) {
                        Some(prompt) => {
                            println!("  {} {}", style("You:").green().bold(), prompt.content);
                            chosen = Some(prompt.content.clone());
                        }
                        None => eprintln!(
                            "  {} No prompt {n}. Type /prompts to see the list.",
                            style("?").yellow().bold()
                        ),
                    }
                }
                ChatCommand::Unknown(cmd) => {
                    eprintln!(
                        "  {} Unknown command {cmd}. Type /help for the list.",
                        style("?").yellow().bold()
                    );
                }
            }
            match chosen {
                Some(content) => message = content,
                None => continue,
            }
        }

        transcript.push(ChatRole::User, message.as_str());
        let body = match client.stream_chat(&message, thread_id).await {
            Ok(body) => body,
            Err(e) => {
                eprintln!("  {} {e}", style("!").red().bold());
                continue;
            }
        };

        observer.start_turn();
        let result = tokio::select! {
            result = consumer.consume(body, thread_id, &mut observer, &mut transcript) => {
                Some(result)
            }
            _ = tokio::signal::ctrl_c() => None,
        };

        match result {
            Some(Ok(turn)) => {
                if turn.thread_id.is_some() {
                    thread_id = turn.thread_id;
                }
            }
            Some(Err(e)) => warn!(error = %e, "Reply stream failed"),
            None => println!("\n  {}\n", style("(stopped)").dim()),
        }
        if let Some(id) = observer.take_created_thread() {
            info!(thread_id = %id, "Conversation started");
        }
    }

    println!("  {}", style("Bye.").dim());
    Ok(())
}

/// Prompts in display order: grouped by category, numbered from 1.
fn numbered(prompts: &[Prompt]) -> Vec<Prompt> {
    PromptCatalog::grouped(prompts)
        .into_iter()
        .flat_map(|(_, items)| items.into_iter().cloned())
        .collect()
}

fn print_prompts(prompts: &[Prompt]) {
    println!();
    if prompts.is_empty() {
        println!("  {}", style("No suggestions available").dim());
    }
    let mut number = 0;
    for (category, items) in PromptCatalog::grouped(prompts) {
        println!("  {}", style(category).bold());
        for prompt in items {
            number += 1;
            println!("    {} {}", style(format!("{number:>2}.")).cyan(), prompt.title);
        }
    }
    println!();
}
