//! `gradepal threads` and `gradepal history`: list conversations over HTTP.

use console::style;
use uuid::Uuid;

use gradepal_types::chat::{ChatMessage, ChatRole, ChatThread};

use super::client::ApiClient;

/// List the caller's threads.
pub async fn list_threads(client: &ApiClient, json: bool) -> anyhow::Result<()> {
    let threads = client.threads().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&threads)?);
    } else {
        print_threads(&threads);
    }
    Ok(())
}

/// Show every message of one thread.
pub async fn show_history(client: &ApiClient, thread_id: Uuid, json: bool) -> anyhow::Result<()> {
    let history = client.history(thread_id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
    } else {
        print_history(&history);
    }
    Ok(())
}

pub fn print_threads(threads: &[ChatThread]) {
    println!();
    if threads.is_empty() {
        println!("  {}", style("No conversations yet").dim());
    }
    for thread in threads {
        println!(
            "  {}  {}  {}",
            style(thread.id).dim(),
            style(thread.updated_at.format("%Y-%m-%d %H:%M")).dim(),
            style(&thread.title).bold()
        );
    }
    println!();
}

pub fn print_history(history: &[ChatMessage]) {
    println!();
    for message in history {
        let speaker = match message.role {
            ChatRole::User => style("You:").green().bold(),
            ChatRole::Assistant => style("GradePal:").cyan().bold(),
        };
        println!("  {speaker} {}", message.content);
        println!();
    }
}
