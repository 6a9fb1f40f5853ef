use clap::{Parser, Subcommand};
use std::io::Write;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trackback::{
    api::AdminClient,
    config::{ClientConfig, ServerAddress},
    error::{ClientError, ClientResult},
    input,
    view::TerminalView,
    ws,
};

#[derive(Parser, Debug)]
#[command(name = "trackback", about = "Terminal client for the TrackBack music timeline game")]
struct Cli {
    /// Server address: host, host:port or URL (overrides TRACKBACK_SERVER)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join a game and play (default)
    Play {
        /// Your username
        #[arg(long)]
        name: Option<String>,
        /// Game session to join
        #[arg(long)]
        game: Option<String>,
        /// Leave after this many guesses
        #[arg(long)]
        max_turns: Option<u32>,
        /// Start the game right away if you are the first player
        #[arg(long)]
        auto_start: bool,
    },
    /// Start the game
    Start {
        #[arg(long)]
        game: Option<String>,
    },
    /// Stop the server
    Shutdown,
    /// List sessions that can still be joined
    Sessions,
    /// Create a game session
    Create {
        #[arg(long)]
        game: String,
        #[arg(long, default_value_t = 10)]
        target_songs: u32,
        #[arg(long, default_value = "spotify")]
        music_service: String,
    },
    /// Register a player for a session
    Join {
        #[arg(long)]
        game: String,
        #[arg(long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Logs go to stderr so they don't interleave with the timeline
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trackback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let code = match run(Cli::parse()).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    // The stdin reader would otherwise keep the runtime from shutting down
    std::process::exit(code);
}

async fn run(cli: Cli) -> ClientResult<()> {
    let mut config = ClientConfig::from_env()?;
    if let Some(server) = cli.server {
        config.server = ServerAddress::parse(&server)?;
    }

    let command = cli.command.unwrap_or(Command::Play {
        name: None,
        game: None,
        max_turns: None,
        auto_start: false,
    });

    match command {
        Command::Play {
            name,
            game,
            max_turns,
            auto_start,
        } => {
            if name.is_some() {
                config.username = name;
            }
            if game.is_some() {
                config.game_id = game;
            }
            config.max_turns = max_turns;
            config.auto_start |= auto_start;

            if config.username.is_none() {
                config.username = Some(ask_username()?);
            }
            config.require_username()?;

            let gestures = input::spawn_stdin_gestures();
            let view = TerminalView::new(std::io::stdout());
            let summary = ws::run_session(&config, view, gestures).await?;

            tracing::info!(
                "Session ended after {} guesses, winner: {:?}",
                summary.guesses_sent,
                summary.winner
            );
            println!("Goodbye!");
        }
        Command::Start { game } => {
            let admin = AdminClient::new(config.server.clone(), config.http_timeout)?;
            let reply = admin.start(game.or(config.game_id).as_deref()).await?;
            println!("{}", reply.message);
        }
        Command::Shutdown => {
            let admin = AdminClient::new(config.server.clone(), config.http_timeout)?;
            let reply = admin.shutdown().await?;
            println!("{}", reply.message);
        }
        Command::Sessions => {
            let admin = AdminClient::new(config.server.clone(), config.http_timeout)?;
            let sessions = admin.list_sessions().await?;
            if sessions.is_empty() {
                println!("No open sessions.");
            }
            for session in sessions {
                println!("{}", session);
            }
        }
        Command::Create {
            game,
            target_songs,
            music_service,
        } => {
            let admin = AdminClient::new(config.server.clone(), config.http_timeout)?;
            let reply = admin
                .create_session(&game, target_songs, &music_service)
                .await?;
            println!("{}", reply.message);
        }
        Command::Join { game, name } => {
            if name.is_some() {
                config.username = name;
            }
            let admin = AdminClient::new(config.server.clone(), config.http_timeout)?;
            let reply = admin
                .join_session(&game, config.require_username()?)
                .await?;
            println!("{}", reply.message);
        }
    }

    Ok(())
}

fn ask_username() -> ClientResult<String> {
    print!("Enter your username: ");
    let _ = std::io::stdout().flush();

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .map_err(|e| ClientError::Config(format!("failed to read username: {}", e)))?;
    Ok(line.trim().to_string())
}
