//! Command-line argument parsing for docbuddy
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docbuddy - ask grounded questions about a document, in your own language
#[derive(Parser, Debug)]
#[command(name = "docbuddy")]
#[command(version)]
#[command(about = "Ask grounded questions about a document, in your own language", long_about = None)]
pub struct Args {
    /// Configuration file path (default: ~/.docbuddy/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -v (info), -vv (debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (print only answers)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the knowledge base from a document (.json blocks, .txt or .md)
    Ingest {
        /// Document to ingest
        document: PathBuf,

        /// Where to write the knowledge base (default: paths.knowledge_file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Count tokens with the offline 4-chars-per-token estimate
        #[arg(long)]
        heuristic_tokens: bool,
    },

    /// Ask a single question
    Ask {
        /// The question (omit when using --audio)
        #[arg(value_name = "QUESTION", trailing_var_arg = true)]
        question: Vec<String>,

        /// Ask with a WAV recording instead of text
        #[arg(long, value_name = "WAV")]
        audio: Option<PathBuf>,

        /// Write the spoken answer to this WAV file
        #[arg(long, value_name = "WAV")]
        speak: Option<PathBuf>,

        /// Knowledge base to query (default: paths.knowledge_file)
        #[arg(short, long)]
        knowledge: Option<PathBuf>,
    },

    /// Start an interactive conversation
    Chat {
        /// Knowledge base to query (default: paths.knowledge_file)
        #[arg(short, long)]
        knowledge: Option<PathBuf>,
    },

    /// Show what a knowledge base contains
    Inspect {
        /// Knowledge base to inspect (default: paths.knowledge_file)
        #[arg(short, long)]
        knowledge: Option<PathBuf>,

        /// Also print the first N passages
        #[arg(short, long, value_name = "N")]
        passages: Option<usize>,
    },

    /// Display or initialize configuration
    Config {
        /// Write a default config file
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(long)]
        force: bool,
    },
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Check argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Commands::Ask {
                question, audio, ..
            } => {
                if question.is_empty() && audio.is_none() {
                    return Err("Question required. Use 'docbuddy ask <QUESTION>' or --audio <WAV>.".to_string());
                }
                if !question.is_empty() && audio.is_some() {
                    return Err("Cannot give both a question and --audio.".to_string());
                }
                Ok(())
            }
            Commands::Config { init, force } if *force && !*init => {
                Err("--force only applies with --init.".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Question words joined back into one string
    pub fn question(&self) -> Option<String> {
        match &self.command {
            Commands::Ask { question, .. } if !question.is_empty() => Some(question.join(" ")),
            _ => None,
        }
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Check if should show progress bars
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show the query state trail
    pub fn show_trail(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }

    /// Log level floor passed to the subscriber
    pub fn log_level(&self) -> u8 {
        match self {
            Verbosity::Quiet | Verbosity::Normal => 0,
            Verbosity::Verbose => 1,
            Verbosity::VeryVerbose => 2,
        }
    }
}
