//! Welcome banner display for chat sessions.

use console::style;
use uuid::Uuid;

/// Print the welcome banner at the start of a chat session.
pub fn print_welcome_banner(server: &str, thread_id: Option<Uuid>) {
    println!();
    println!("  {} {}", style("GradePal").cyan().bold(), style("academic assistant").dim());
    println!();
    println!("  {}  {}", style("Server:").bold(), style(server).dim());
    let thread = thread_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "new".to_string());
    println!("  {}  {}", style("Thread:").bold(), style(thread).dim());
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}
