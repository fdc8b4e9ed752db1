//! Spyfall game-session client.
//!
//! Creates or joins a lobby, then shows the round countdown and logs live
//! updates from the server's event stream. Ctrl+C closes the stream and exits.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin spyfall-client -- create --name Alice
//! cargo run --bin spyfall-client -- join --name Bob --room 4821
//! cargo run --bin spyfall-client -- --server http://127.0.0.1:1337 join -n Carol -r 4821
//! ```

use std::sync::Arc;

use clap::{Parser, Subcommand};
use spyfall_client::{
    ClientError,
    channel::{ChannelConfig, LoggingObserver},
    countdown::TerminalSurface,
    lobby::{LobbyAction, LobbyCode, navigation_url},
    view::{GameView, ViewSettings},
};
use spyfall_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "spyfall-client")]
#[command(about = "Spyfall client with live updates and a synchronized round timer", long_about = None)]
struct Args {
    /// Base URL of the game server
    #[arg(short = 's', long, global = true, default_value = "http://127.0.0.1:1337")]
    server: String,

    /// Send credentials with the event stream request
    #[arg(long, global = true)]
    with_credentials: bool,

    /// Cookie header to send when credentials are enabled
    #[arg(long, global = true, requires = "with_credentials")]
    cookie: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new lobby
    Create {
        /// Player name
        #[arg(short = 'n', long)]
        name: String,

        /// Lobby code to use (a random one is drawn if omitted)
        #[arg(short = 'r', long)]
        room: Option<LobbyCode>,
    },
    /// Join an existing lobby
    Join {
        /// Player name
        #[arg(short = 'n', long)]
        name: String,

        /// Four-digit lobby code
        #[arg(short = 'r', long)]
        room: LobbyCode,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), ClientError> {
    let (action, name, room) = match args.command {
        Command::Create { name, room } => {
            (LobbyAction::Create, name, room.unwrap_or_else(LobbyCode::generate))
        }
        Command::Join { name, room } => (LobbyAction::Join, name, room),
    };

    let lobby_url = navigation_url(&args.server, action, &name, room)?;
    tracing::info!("Lobby {} as '{}': {}", room, name, lobby_url);

    let mut channel = ChannelConfig::for_server(&args.server)?;
    if args.with_credentials {
        channel = channel.with_credentials(args.cookie);
    }

    let view = GameView::start(
        ViewSettings::new(channel),
        Arc::new(TerminalSurface::new("Time left:")),
        Arc::new(SystemClock),
        vec![Arc::new(LoggingObserver)],
    )?;

    // Ctrl+C plays the role of the close button
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
    }
    println!();
    view.leave();

    Ok(())
}
