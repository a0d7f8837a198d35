//! Slash command parsing and help for the chat loop.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Exit the chat.
    Exit,
    /// Start a new thread on the next message.
    New,
    /// Show the current thread's messages as stored on the server.
    History,
    /// List the caller's threads.
    Threads,
    /// List suggested prompts, or send the numbered one.
    Prompts(Option<usize>),
    /// Unknown command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut words = trimmed.split_whitespace();
    let cmd = words.next().unwrap_or_default().to_lowercase();

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/new" => Some(ChatCommand::New),
        "/history" => Some(ChatCommand::History),
        "/threads" => Some(ChatCommand::Threads),
        "/prompts" | "/p" => match words.next() {
            None => Some(ChatCommand::Prompts(None)),
            Some(n) => match n.parse::<usize>() {
                Ok(n) if n > 0 => Some(ChatCommand::Prompts(Some(n))),
                _ => Some(ChatCommand::Unknown(format!("/prompts {n}"))),
            },
        },
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Print the help text listing all available commands.
pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}     {}", style("/help").cyan(), "Show this help message");
    println!("  {}      {}", style("/new").cyan(), "Start a new conversation");
    println!("  {}  {}", style("/history").cyan(), "Show this conversation's messages");
    println!("  {}  {}", style("/threads").cyan(), "List your conversations");
    println!("  {}  {}", style("/prompts").cyan(), "Suggested questions (/prompts N sends one)");
    println!("  {}     {}", style("/exit").cyan(), "Leave the chat");
    println!();
    println!(
        "  {}",
        style("Ctrl+C stops the reply in progress, Ctrl+D exits").dim()
    );
    println!();
}
