pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod models;
pub mod session;
pub mod shell;
pub mod storage;

use api::new_client;
use cli::{ Args, Command };
use config::ClientConfig;
use log::info;
use session::SessionManager;
use std::error::Error;
use std::io;
use storage::create_local_store;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = ClientConfig::from_args(&args)?;

    info!("--- Client Configuration ---");
    info!("Server URL: {}", config.server_url);
    info!("Request Timeout: {}s", config.request_timeout.as_secs());
    info!("Storage Type: {}", config.storage_type);
    info!("Storage Path: {}", config.storage_path.display());
    info!("----------------------------");

    let store = create_local_store(&config)?;
    let api = new_client(&config, store.clone())?;
    let mut input = shell::stdin_lines();
    let mut out = io::stdout();

    match args.command.clone().unwrap_or(Command::Chat) {
        Command::Register { email, password } => {
            let password = shell
                ::password_or_prompt(password, &mut input, &mut out).await?
                .ok_or("No password given; aborting.")?;
            let message = auth::register(api.as_ref(), &email, &password).await?;
            println!("{}", message);
            println!("You can now log in with `login --email {}`.", email);
        }
        Command::Login { email, password } => {
            let password = shell
                ::password_or_prompt(password, &mut input, &mut out).await?
                .ok_or("No password given; aborting.")?;
            auth::login(api.as_ref(), store.as_ref(), &email, &password).await?;
            println!("Logged in.");
        }
        Command::Logout => {
            auth::logout(store.as_ref())?;
            println!("Logged out.");
        }
        Command::Chat => {
            shell::run_chat(api, store, &config, &mut input, &mut out).await?;
        }
        Command::History => {
            auth::require_token(store.as_ref())?;
            let mut manager = SessionManager::new(api, store, &config)?;
            let saved = manager.list_saved_conversations().await?;
            shell::print_saved(saved, &mut out)?;
        }
        Command::Reset => {
            auth::require_token(store.as_ref())?;
            let mut manager = SessionManager::new(api, store, &config)?;
            let outcome = manager.reset_all_history().await;
            match (outcome.message, outcome.warning) {
                (_, Some(warning)) => println!("Could not delete saved conversations: {}", warning),
                (Some(message), None) if !message.is_empty() => println!("{}", message),
                _ => println!("Saved conversations deleted."),
            }
        }
    }

    Ok(())
}
