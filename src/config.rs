use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_BRIDGE_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_LOG_FILE: &str = "whatsapp-tui.log";

/// Browse WhatsApp chats from the terminal.
#[derive(Debug, Parser)]
#[command(name = "whatsapp-tui", version)]
pub struct Cli {
    /// Log file used while the browser owns the terminal.
    #[arg(long, global = true, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Hand the session's contacts and groups to one consumer, then keep
    /// logging session events until interrupted.
    Serve {
        #[arg(long, default_value = DEFAULT_BRIDGE_ADDR)]
        listen: String,
        /// Session fixture (JSON) to serve.
        #[arg(long)]
        session: PathBuf,
    },
    /// Receive a snapshot from a running producer and browse it.
    Browse {
        #[arg(long, default_value = DEFAULT_BRIDGE_ADDR)]
        connect: String,
    },
    /// Run the session and the browser in one process.
    Local {
        #[arg(long)]
        session: PathBuf,
    },
}

impl Command {
    /// Whether this command puts the terminal in the alternate screen, in
    /// which case logs must go to a file.
    pub fn owns_terminal(&self) -> bool {
        !matches!(self, Command::Serve { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["whatsapp-tui", "serve", "--session", "s.json"]).unwrap();
        assert_eq!(cli.log_file, PathBuf::from(DEFAULT_LOG_FILE));
        assert_eq!(
            cli.command,
            Command::Serve {
                listen: DEFAULT_BRIDGE_ADDR.to_string(),
                session: PathBuf::from("s.json"),
            }
        );
        assert!(!cli.command.owns_terminal());
    }

    #[test]
    fn test_browse_with_overrides() {
        let cli = Cli::try_parse_from([
            "whatsapp-tui",
            "browse",
            "--connect",
            "10.0.0.2:9000",
            "--log-file",
            "/tmp/wa.log",
        ])
        .unwrap();
        assert_eq!(cli.log_file, PathBuf::from("/tmp/wa.log"));
        assert_eq!(
            cli.command,
            Command::Browse {
                connect: "10.0.0.2:9000".to_string()
            }
        );
        assert!(cli.command.owns_terminal());
    }

    #[test]
    fn test_local_requires_session() {
        assert!(Cli::try_parse_from(["whatsapp-tui", "local"]).is_err());
        assert!(Cli::try_parse_from(["whatsapp-tui"]).is_err());
    }
}
