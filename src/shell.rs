use log::{ debug, warn };
use std::error::Error;
use std::io::{ self, Write };
use std::sync::Arc;
use tokio::io::{ AsyncBufReadExt, BufReader };
use tokio_stream::{ Stream, StreamExt };
use tokio_stream::wrappers::LinesStream;

use crate::api::ChatApi;
use crate::auth;
use crate::config::ClientConfig;
use crate::session::view::SavedConversation;
use crate::session::{ SendOutcome, Session, SessionError, SessionManager };
use crate::storage::LocalStore;

const HELP: &str =
    "Commands: /new  /save  /history  /load <n>  /close  /reset  /logout  /help  /quit\nAnything else is sent as a message.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Send(String),
    New,
    Save,
    History,
    Load(usize),
    Close,
    Reset,
    Logout,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_command(line: &str) -> ShellCommand {
    let trimmed = line.trim();
    if !trimmed.starts_with('/') {
        return ShellCommand::Send(line.to_string());
    }

    let mut parts = trimmed.split_whitespace();
    let name = parts.next().unwrap_or_default();
    match name {
        "/new" => ShellCommand::New,
        "/save" => ShellCommand::Save,
        "/history" => ShellCommand::History,
        "/load" =>
            match parts.next().and_then(|n| n.parse::<usize>().ok()) {
                Some(n) if n >= 1 => ShellCommand::Load(n - 1),
                _ => ShellCommand::Unknown(trimmed.to_string()),
            }
        "/close" => ShellCommand::Close,
        "/reset" => ShellCommand::Reset,
        "/logout" => ShellCommand::Logout,
        "/help" => ShellCommand::Help,
        "/quit" | "/exit" => ShellCommand::Quit,
        _ => ShellCommand::Unknown(trimmed.to_string()),
    }
}

/// Prints only what was added to the view since the last call, or the
/// whole view after it has been replaced. The typing indicator is skipped.
#[derive(Debug, Default)]
pub struct ViewPrinter {
    generation: u64,
    printed: usize,
}

impl ViewPrinter {
    pub fn pending_lines(&mut self, session: &Session) -> Vec<String> {
        let mut lines = Vec::new();
        if session.view_generation() != self.generation {
            self.generation = session.view_generation();
            self.printed = 0;
            lines.push("----------------------------------------".to_string());
        }

        let fresh: Vec<String> = session
            .view()
            .iter()
            .filter(|entry| !entry.pending)
            .skip(self.printed)
            .map(|entry| entry.to_string())
            .collect();
        self.printed += fresh.len();
        lines.extend(fresh);
        lines
    }

    pub fn print<W: Write>(&mut self, session: &Session, out: &mut W) -> io::Result<()> {
        for line in self.pending_lines(session) {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }
}

pub fn stdin_lines() -> impl Stream<Item = io::Result<String>> + Unpin {
    LinesStream::new(BufReader::new(tokio::io::stdin()).lines())
}

/// Shows `label` and reads one line. `None` on end of input.
pub async fn prompt_line<S, W>(input: &mut S, out: &mut W, label: &str) -> io::Result<Option<String>>
    where S: Stream<Item = io::Result<String>> + Unpin, W: Write
{
    write!(out, "{}", label)?;
    out.flush()?;
    match input.next().await {
        Some(line) => Ok(Some(line?)),
        None => Ok(None),
    }
}

/// `given` when set, otherwise prompts. `None` when input ends first.
pub async fn password_or_prompt<S, W>(
    given: Option<String>,
    input: &mut S,
    out: &mut W
) -> io::Result<Option<String>>
    where S: Stream<Item = io::Result<String>> + Unpin, W: Write
{
    match given {
        Some(password) => Ok(Some(password)),
        None => prompt_line(input, out, "Password: ").await,
    }
}

/// Returns `false` when the user gives up (blank email or end of input).
pub async fn login_view<S, W>(
    api: &dyn ChatApi,
    store: &dyn LocalStore,
    input: &mut S,
    out: &mut W
) -> io::Result<bool>
    where S: Stream<Item = io::Result<String>> + Unpin, W: Write
{
    writeln!(out, "Please log in (leave the email blank to quit).")?;
    loop {
        let Some(email) = prompt_line(input, out, "Email: ").await? else {
            return Ok(false);
        };
        let email = email.trim().to_string();
        if email.is_empty() {
            return Ok(false);
        }
        let Some(password) = prompt_line(input, out, "Password: ").await? else {
            return Ok(false);
        };

        match auth::login(api, store, &email, &password).await {
            Ok(()) => {
                writeln!(out, "Logged in.")?;
                return Ok(true);
            }
            Err(message) => writeln!(out, "{}", message)?,
        }
    }
}

pub fn print_saved<W: Write>(saved: &[SavedConversation], out: &mut W) -> io::Result<()> {
    if saved.is_empty() {
        return writeln!(out, "No saved conversations.");
    }
    for (i, conversation) in saved.iter().enumerate() {
        writeln!(out, "{:>3}. {}", i + 1, conversation.summary)?;
    }
    Ok(())
}

/// Interactive chat loop. Owns the session; a fresh one is started after
/// every login, like a page reload.
pub async fn run_chat<S, W>(
    api: Arc<dyn ChatApi>,
    store: Arc<dyn LocalStore>,
    config: &ClientConfig,
    input: &mut S,
    out: &mut W
) -> Result<(), Box<dyn Error + Send + Sync>>
    where S: Stream<Item = io::Result<String>> + Unpin, W: Write
{
    if auth::require_token(store.as_ref()).is_err() {
        if !login_view(api.as_ref(), store.as_ref(), input, out).await? {
            return Ok(());
        }
    }

    let mut manager = SessionManager::new(api.clone(), store.clone(), config)?;
    let mut printer = ViewPrinter::default();
    writeln!(out, "{}", HELP)?;
    printer.print(manager.session(), out)?;

    loop {
        let Some(line) = prompt_line(input, out, "> ").await? else {
            break;
        };
        let command = parse_command(&line);
        debug!("Shell command: {:?}", command);

        let mut relogin = false;
        match command {
            ShellCommand::Quit => {
                break;
            }
            ShellCommand::Help => writeln!(out, "{}", HELP)?,
            ShellCommand::New => manager.start_new_chat(),
            ShellCommand::Send(text) => {
                match manager.send_message(&text).await {
                    SendOutcome::Unauthorized => {
                        printer.print(manager.session(), out)?;
                        writeln!(out, "Your session has expired. Please log in again.")?;
                        relogin = true;
                    }
                    SendOutcome::Failed(e) => debug!("Send failed: {}", e),
                    SendOutcome::Stale => warn!("Reply arrived for a superseded request"),
                    SendOutcome::Empty | SendOutcome::Replied(_) => {}
                }
            }
            ShellCommand::Save => {
                match manager.save_chat().await {
                    Ok(_) => writeln!(out, "Conversation saved!")?,
                    Err(SessionError::NothingToSave) => {
                        writeln!(out, "{}", SessionError::NothingToSave)?;
                    }
                    Err(SessionError::Api(e)) => {
                        let detail = e.server_message().unwrap_or("Unknown error");
                        writeln!(out, "Failed to save conversation: {}", detail)?;
                    }
                    Err(e) => writeln!(out, "Failed to save conversation: {}", e)?,
                }
            }
            ShellCommand::History => {
                match manager.list_saved_conversations().await {
                    Ok(saved) => print_saved(saved, out)?,
                    Err(e) => writeln!(out, "Failed to load saved conversations: {}", e)?,
                }
            }
            ShellCommand::Load(index) => {
                if let Err(e) = manager.select_saved(index) {
                    writeln!(out, "{}", e)?;
                }
            }
            ShellCommand::Close => manager.close_history(),
            ShellCommand::Reset => {
                let outcome = manager.reset_all_history().await;
                if let Some(warning) = outcome.warning {
                    writeln!(
                        out,
                        "Could not delete saved conversations ({}); started a new chat anyway.",
                        warning
                    )?;
                }
            }
            ShellCommand::Logout => {
                auth::logout(store.as_ref())?;
                writeln!(out, "Logged out.")?;
                relogin = true;
            }
            ShellCommand::Unknown(cmd) => writeln!(out, "Unknown command: {}\n{}", cmd, HELP)?,
        }

        if relogin {
            if !login_view(api.as_ref(), store.as_ref(), input, out).await? {
                break;
            }
            manager = SessionManager::new(api.clone(), store.clone(), config)?;
            printer = ViewPrinter::default();
        }

        printer.print(manager.session(), out)?;
    }

    Ok(())
}
