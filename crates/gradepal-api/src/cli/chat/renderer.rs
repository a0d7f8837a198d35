//! Console side of a consumed turn.
//!
//! Revealed text is printed as the cursor advances, so the reply appears at
//! the reveal rate rather than in network-sized bursts.

use std::io::Write;

use console::style;
use uuid::Uuid;

use gradepal_core::stream::consumer::{StreamObserver, TranscriptEntry};
use gradepal_types::chat::ChatRole;

/// [`StreamObserver`] that writes to stdout.
#[derive(Debug, Default)]
pub struct ConsoleObserver {
    revealed_any: bool,
    created_thread: Option<Uuid>,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Thread the server created during the last turn, if any.
    pub fn take_created_thread(&mut self) -> Option<Uuid> {
        self.created_thread.take()
    }

    /// Reset per-turn state before the next message.
    pub fn start_turn(&mut self) {
        self.revealed_any = false;
        print!("\n  {} ", style("GradePal:").cyan().bold());
        let _ = std::io::stdout().flush();
    }
}

impl StreamObserver for ConsoleObserver {
    fn on_reveal(&mut self, text: &str) {
        self.revealed_any = true;
        print!("{text}");
        let _ = std::io::stdout().flush();
    }

    fn on_thread_created(&mut self, thread_id: Uuid) {
        self.created_thread = Some(thread_id);
    }

    fn on_error(&mut self, message: &str) {
        eprintln!("\n  {} {message}", style("!").red().bold());
    }

    fn on_commit(&mut self, entry: &TranscriptEntry) {
        // Fallback and error texts are committed without being revealed.
        if entry.role == ChatRole::Assistant && !self.revealed_any {
            print!("{}", entry.content);
        }
        println!();
        println!();
    }
}
