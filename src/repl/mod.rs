//! Interactive chat over the ingested document
//!
//! Input goes through rustyline with persistent history; lines starting with
//! `/` are built-in commands, anything else is a question for the assistant.

pub mod commands;
pub mod display;
pub mod input;

use crate::cli::{print_reply, Verbosity};
use crate::config::Config;
use crate::conversation::Session;
use crate::pipeline::{Assistant, Input};
use anyhow::Result;
use colored::Colorize;
use commands::Command;
use input::{InputHandler, Line};
use std::path::PathBuf;

pub struct ReplSession {
    input: InputHandler,
    assistant: Assistant,
    session: Session,
    knowledge_path: PathBuf,
    model: String,
    history_turns: usize,
    verbosity: Verbosity,
}

impl ReplSession {
    pub fn new(
        config: &Config,
        assistant: Assistant,
        knowledge_path: PathBuf,
        verbosity: Verbosity,
    ) -> Result<Self> {
        let input = InputHandler::with_history(config.state_dir().join("history"))?;
        let history_turns = config.conversation.history_turns;

        Ok(Self {
            input,
            assistant,
            session: Session::new(history_turns),
            knowledge_path,
            model: config.generation.provider.model.clone(),
            history_turns,
            verbosity,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        if self.verbosity.show_progress() {
            display::show_banner(env!("CARGO_PKG_VERSION"), &self.model, self.assistant.knowledge());
        }

        loop {
            let line = match self.input.read_line()? {
                Line::Text(line) => line,
                Line::Interrupted => continue,
                Line::Eof => break,
            };
            if line.is_empty() {
                continue;
            }

            if commands::is_command(&line) {
                if !self.handle_command(commands::parse(&line)) {
                    break;
                }
                continue;
            }

            let spinner = self.verbosity.show_progress().then(display::thinking);
            let reply = self.assistant.answer(&mut self.session, Input::Text(line)).await;
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }
            print_reply(&reply, self.verbosity);
            println!();
        }

        self.input.save_history()?;
        println!("{}", "Goodbye!".green());
        Ok(())
    }

    /// Returns false when the loop should end
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Help => commands::show_help(),
            Command::History { limit } => display::show_history(&self.session, limit),
            Command::Status => display::show_status(&self.session, self.assistant.knowledge()),
            Command::Reset => {
                self.session = Session::new(self.history_turns);
                println!("{}", "Conversation cleared.".yellow());
            }
            Command::Reload => match self.assistant.knowledge().load_from(&self.knowledge_path) {
                Ok(()) => println!("{}", format!("Reloaded {}", self.knowledge_path.display()).green()),
                Err(e) => display::show_error(&format!("Reload failed, keeping current knowledge: {}", e)),
            },
            Command::Verbose { enable } => {
                self.verbosity = if enable {
                    Verbosity::Verbose
                } else {
                    Verbosity::Normal
                };
                let status = if enable { "enabled" } else { "disabled" };
                println!("{}", format!("Verbose mode {}", status).cyan());
            }
            Command::Clear => print!("\x1B[2J\x1B[1;1H"),
            Command::Exit => return false,
            Command::Unknown { input } => {
                println!("{}", format!("Unknown command: {}", input).red());
                println!("Type {} for available commands", "/help".cyan());
            }
        }
        true
    }
}
