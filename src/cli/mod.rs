use clap::{ Parser, Subcommand };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Base URL of the chatbot server (e.g., http://127.0.0.1:5000)
    #[arg(long, env = "SERVER_URL", default_value = "http://127.0.0.1:5000")]
    pub server_url: String,

    /// Timeout in seconds for each request to the server.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    // --- Local Storage Args ---
    /// Local storage backend (file, memory)
    #[arg(long, env = "STORAGE_TYPE", default_value = "file")]
    pub storage_type: String,

    /// Path of the JSON file holding the auth token and user id.
    #[arg(long, env = "STORAGE_PATH", default_value = ".chatbot/local_storage.json")]
    pub storage_path: String,

    // --- Chat Args ---
    /// Greeting shown at the top of every new chat.
    #[arg(long, env = "CHAT_GREETING")] // Falls back to the built-in greeting
    pub greeting: Option<String>,

    /// Message shown when the server fails to answer.
    #[arg(long, env = "CHAT_FALLBACK_REPLY")]
    pub fallback_reply: Option<String>,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create an account on the server.
    Register {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Log in and store the auth token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored auth token.
    Logout,
    /// Interactive chat (default).
    Chat,
    /// List saved conversations.
    History,
    /// Delete every saved conversation on the server.
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_no_subcommand() {
        let args = Args::try_parse_from(["chatbot-client", "--storage-type", "memory"]).unwrap();
        assert_eq!(args.command, None);
        assert_eq!(args.storage_type, "memory");
    }

    #[test]
    fn parses_login_subcommand() {
        let args = Args::try_parse_from([
            "chatbot-client",
            "login",
            "--email",
            "a@b.c",
            "--password",
            "pw",
        ]).unwrap();
        assert_eq!(
            args.command,
            Some(Command::Login {
                email: "a@b.c".into(),
                password: Some("pw".into()),
            })
        );
    }
}
