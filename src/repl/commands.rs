//! Built-in REPL commands

use colored::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    History { limit: Option<usize> },
    Status,
    Reset,
    Reload,
    Verbose { enable: bool },
    Clear,
    Exit,
    Unknown { input: String },
}

/// Check if input is a command (starts with /)
pub fn is_command(input: &str) -> bool {
    input.trim_start().starts_with('/')
}

/// Parse a `/command [arg]` line
pub fn parse(input: &str) -> Command {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Unknown {
            input: input.to_string(),
        };
    };

    let parts: Vec<&str> = rest.split_whitespace().collect();
    let Some(name) = parts.first() else {
        return Command::Unknown {
            input: input.to_string(),
        };
    };

    match name.to_lowercase().as_str() {
        "help" | "h" => Command::Help,
        "exit" | "quit" | "q" => Command::Exit,
        "history" => Command::History {
            limit: parts.get(1).and_then(|s| s.parse().ok()),
        },
        "status" => Command::Status,
        "reset" => Command::Reset,
        "reload" => Command::Reload,
        "verbose" => {
            let enable = parts
                .get(1)
                .map(|s| matches!(s.to_lowercase().as_str(), "on" | "1" | "true"))
                .unwrap_or(true);
            Command::Verbose { enable }
        }
        "clear" | "cls" => Command::Clear,
        _ => Command::Unknown {
            input: input.to_string(),
        },
    }
}

pub fn show_help() {
    println!("\n{}", "Available Commands:".bold().cyan());
    println!("{}", "=".repeat(60).cyan());

    let commands = [
        ("/help, /h", "Show this help message"),
        ("/history [n]", "Show the last n exchanges (default: all kept)"),
        ("/status", "Show session and knowledge base status"),
        ("/reset", "Forget the conversation so far"),
        ("/reload", "Reload the knowledge base from disk"),
        ("/verbose [on|off]", "Show query state trails"),
        ("/clear, /cls", "Clear screen"),
        ("/exit, /quit, /q", "Exit"),
    ];

    for (cmd, desc) in commands {
        println!("  {:<20} {}", cmd.green(), desc);
    }

    println!("\n{}", "Usage:".bold());
    println!("  - Ask about the document directly, in any language");
    println!("  - Use {} for input history", "UP/DOWN arrows".cyan());
    println!("  - Press {} or type {} to leave\n", "Ctrl-D".cyan(), "/exit".cyan());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("/help"), Command::Help);
        assert_eq!(parse("  /Q "), Command::Exit);
        assert_eq!(parse("/history 3"), Command::History { limit: Some(3) });
        assert_eq!(parse("/history"), Command::History { limit: None });
        assert_eq!(parse("/verbose off"), Command::Verbose { enable: false });
        assert_eq!(parse("/verbose"), Command::Verbose { enable: true });
        assert_eq!(parse("/reload"), Command::Reload);
    }

    #[test]
    fn test_unknown_commands() {
        assert!(matches!(parse("/frobnicate"), Command::Unknown { .. }));
        assert!(matches!(parse("/"), Command::Unknown { .. }));
    }

    #[test]
    fn test_is_command() {
        assert!(is_command("/help"));
        assert!(!is_command("what is /etc?"));
    }
}
