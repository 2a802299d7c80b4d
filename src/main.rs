use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tbg_client::{
    console::{self, Command, ConsoleNotifier},
    setup_logger, GameClient, GameId, GameTransport, GameType, HttpTransport, SyncSettings,
    ViewModel,
};
use tbg_env::{ClientConfig, SyncMode};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "tbg",
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None,
)]
struct Args {
    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Server port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Background sync (overrides config)
    #[arg(long, value_enum)]
    sync: Option<SyncMode>,

    #[command(subcommand)]
    command: Entry,
}

#[derive(Subcommand)]
enum Entry {
    /// Create a new game and join it as host
    Create {
        name: String,
        #[arg(long, value_enum)]
        game_type: Option<GameType>,
    },
    /// Join an existing game
    Join { name: String, game: String },
    /// Resume a session with a previously issued token
    Resume {
        #[arg(long)]
        token: String,
    },
    /// Write the default tbg.toml and exit
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tbg_env::init()?;
    let args = Args::parse();

    if let Entry::InitConfig = args.command {
        let path = tbg_env::create_default_config()?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    let mut config = ClientConfig::global().clone();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(mode) = args.sync {
        config.sync.mode = mode;
    }
    setup_logger(&config.logging);

    let game_type = match &args.command {
        Entry::Create {
            game_type: Some(game_type),
            ..
        } => *game_type,
        _ => config.session.default_game_type.parse::<GameType>()?,
    };

    let mut transport =
        HttpTransport::with_cookie_name(&config.server.url(), &config.session.cookie_name)?;
    if let Entry::Resume { token } = &args.command {
        transport = transport.with_token(token);
    }

    let client = GameClient::new(transport).with_game_type(game_type);
    let mut view = ViewModel::new(
        client,
        Arc::new(ConsoleNotifier),
        SyncSettings::from_config(&config)?,
    );

    let logged_in = match &args.command {
        Entry::Create { name, .. } => view.create_game(name).await,
        Entry::Join { name, game } => view.join_game(name, &GameId::from(game.as_str())).await,
        Entry::Resume { .. } => view.check_access().await,
        Entry::InitConfig => false,
    };
    if !logged_in && view.session().is_none() {
        bail!("could not enter a game");
    }

    if let Some(token) = view.client().transport().session_token() {
        info!("session token: {}", token);
    }
    println!("{}", console::render(view.session().as_ref(), view.snapshot().as_ref()));
    println!("type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(command) => {
                if !console::execute(&view, command).await {
                    break;
                }
            }
            Err(e) => eprintln!("{}", e),
        }
    }

    view.teardown();
    Ok(())
}
