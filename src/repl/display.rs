//! Terminal output for the chat loop

use crate::conversation::Session;
use crate::index::KnowledgeHandle;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn show_banner(version: &str, model: &str, knowledge: &KnowledgeHandle) {
    let width = 64;
    let status = match knowledge.current() {
        Ok(kb) => format!(
            "{} ({} passages)",
            kb.source().unwrap_or("document"),
            kb.len()
        ),
        Err(_) => "no document loaded".to_string(),
    };

    println!("\n{}", "=".repeat(width).cyan());
    println!("{}", format!("  docbuddy {} - Document Chat", version).bold().cyan());
    println!("{}", format!("  Model: {} | Knowledge: {}", model, status).dimmed());
    println!("{}\n", "=".repeat(width).cyan());
    println!(
        "Ask a question (or {} for commands, {} to quit)\n",
        "/help".green(),
        "/exit".green()
    );
}

/// Spinner shown while a question is being answered
pub fn thinking() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Thinking...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn show_history(session: &Session, limit: Option<usize>) {
    if session.history.is_empty() {
        println!("{}", "No exchanges yet.".dimmed());
        return;
    }

    let skip = limit
        .map(|n| session.history.len().saturating_sub(n))
        .unwrap_or(0);
    for (i, turn) in session.history.iter().enumerate().skip(skip) {
        println!(
            "{} {} {}",
            format!("[{}]", i + 1).dimmed(),
            turn.timestamp.format("%H:%M:%S").to_string().dimmed(),
            turn.user.green()
        );
        println!("    {}", turn.assistant);
    }
}

pub fn show_status(session: &Session, knowledge: &KnowledgeHandle) {
    println!("\n{}", "Session Status".bold().cyan());
    println!("{}", "=".repeat(60).cyan());
    println!("  {:<12} {}", "Session:".bold(), session.short_id());
    println!(
        "  {:<12} {}",
        "Started:".bold(),
        session.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "  {:<12} {}/{}",
        "History:".bold(),
        session.history.len(),
        session.history.capacity()
    );
    match knowledge.current() {
        Ok(kb) => {
            println!("  {:<12} {}", "Document:".bold(), kb.source().unwrap_or("-"));
            println!("  {:<12} {} (dim {})", "Passages:".bold(), kb.len(), kb.dimension());
        }
        Err(_) => println!("  {:<12} {}", "Document:".bold(), "not loaded".red()),
    }
    println!();
}

pub fn show_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.red());
}
