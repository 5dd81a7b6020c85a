use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use opt_auth::callback::{self, CallbackConfig};
use opt_auth::{FileStore, LoginFlow, SessionContext};
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "opt-login", about = "Sign in to OPT with Kakao", version)]
struct Cli {
    /// Session file (default: <data dir>/opt/session.json)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the Kakao login and wait for the redirect (default)
    Login,
    /// Show the stored session
    Status,
    /// Remove the stored session
    Logout,
    /// Print the Kakao authorization URL
    AuthorizeUrl,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let store_path = match cli.store {
        Some(path) => path,
        None => dirs::data_dir()
            .context("no data directory on this platform, pass --store")?
            .join("opt")
            .join("session.json"),
    };
    let session = Arc::new(SessionContext::new(Arc::new(FileStore::new(store_path))));

    match cli.command.unwrap_or(Command::Login) {
        Command::Login => login(session).await,
        Command::Status => {
            match session.restore().await? {
                Some(credentials) => println!(
                    "signed in as {} (member {}, {})",
                    credentials.email, credentials.member_id, credentials.role
                ),
                None => println!("not signed in"),
            }
            Ok(())
        }
        Command::Logout => {
            session.clear().await?;
            println!("signed out");
            Ok(())
        }
        Command::AuthorizeUrl => {
            let config = CallbackConfig::from_env()?;
            println!("{}", config.client().authorization_url());
            Ok(())
        }
    }
}

async fn login(session: Arc<SessionContext<FileStore>>) -> anyhow::Result<()> {
    let config = CallbackConfig::from_env()?;
    let client = Arc::new(config.client().clone());
    let listen_addr = config.listen_addr();

    let (events_tx, events_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(callback::serve(config, events_tx, async move {
        let _ = shutdown_rx.await;
    }));

    println!("Open http://{listen_addr}/login in a browser to sign in with Kakao.");

    let flow = LoginFlow::new(client, session);
    let result = tokio::select! {
        credentials = flow.run(events_rx) => credentials,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Login cancelled");
            None
        }
    };

    let _ = shutdown_tx.send(());
    server
        .await
        .context("callback listener panicked")?
        .context("callback listener failed")?;

    match result {
        Some(credentials) => {
            println!("signed in as {} (member {})", credentials.email, credentials.member_id);
            Ok(())
        }
        None => anyhow::bail!("login did not complete"),
    }
}
