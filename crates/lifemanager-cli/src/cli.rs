use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lifemanager_core::StorageMode;

#[derive(Debug, Parser)]
#[command(name = "lifemanager", version, about = "Life Manager command-line client")]
pub struct Cli {
    /// Backend base address, e.g. http://192.168.1.20:3000
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Where to keep the session token: auto, secure, file or memory
    #[arg(long, global = true)]
    pub token_storage: Option<StorageMode>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and remember the session on this device
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Forget the saved session
    Logout,

    /// Show the backend address and whether you are logged in
    Status,

    /// Call the protected test endpoint with the saved session
    Protected,

    /// Submit a document
    Submit {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        content: String,

        #[arg(long, default_value_t = 0)]
        id: i32,

        /// File to attach; the server extracts and summarizes its text
        #[arg(long, conflicts_with = "json")]
        file: Option<PathBuf>,

        /// Send a JSON body instead of multipart form data
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login() {
        let cli = Cli::try_parse_from(["lifemanager", "login", "-u", "admin"]).unwrap();
        assert!(matches!(cli.command, Command::Login { username: Some(ref u) } if u == "admin"));
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "lifemanager",
            "status",
            "--api-url",
            "http://h",
            "--token-storage",
            "keyring",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://h"));
        assert_eq!(cli.token_storage, Some(StorageMode::Secure));
    }

    #[test]
    fn test_parse_submit_defaults() {
        let cli = Cli::try_parse_from(["lifemanager", "submit", "--title", "Groceries"]).unwrap();
        match cli.command {
            Command::Submit {
                title,
                content,
                id,
                file,
                json,
            } => {
                assert_eq!(title, "Groceries");
                assert_eq!(content, "");
                assert_eq!(id, 0);
                assert!(file.is_none());
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_file_conflicts_with_json() {
        let result = Cli::try_parse_from([
            "lifemanager",
            "submit",
            "--title",
            "T",
            "--file",
            "a.pdf",
            "--json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_storage_mode_rejected() {
        assert!(Cli::try_parse_from(["lifemanager", "status", "--token-storage", "cloud"]).is_err());
    }
}
