use std::path::{Path, PathBuf};

use clap::Parser;
use uuid::Uuid;

use mercury_client::api::ApiClient;
use mercury_client::cli::{self, TuiApp};
use mercury_client::dispatch::Dispatcher;
use mercury_client::session::SessionStore;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Parser, Clone)]
#[command(name = "mercury-play")]
#[command(about = "Terminal client for the Mercury negotiation simulation")]
struct Args {
    /// Backend base URL; persisted as the session override when given
    #[arg(long, env = "MERCURY_API_BASE")]
    base_url: Option<String>,

    /// Join a specific game id instead of the stored one
    #[arg(long)]
    game: Option<Uuid>,

    /// Role id to confirm while the game is in role selection
    #[arg(long)]
    role: Option<String>,

    /// Create a fresh game even if one is stored
    #[arg(long)]
    new_game: bool,

    /// Print the end-of-game review for the selected game and exit
    #[arg(long)]
    review: bool,

    /// Clear all stored session state and exit
    #[arg(long)]
    reset: bool,

    /// Directory for tracing output (kept off the terminal; raw mode)
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = init_tracing(&args.log_dir);

    let mut store = SessionStore::open_default()?;
    if args.reset {
        store.clear_all()?;
        println!("Session state cleared.");
        return Ok(());
    }

    // CLI flag wins over the persisted override, which wins over the default.
    let base_url = args
        .base_url
        .clone()
        .or_else(|| store.api_base_override().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    if args.base_url.is_some() {
        store.persist_api_base(args.base_url.clone())?;
    }

    let api = ApiClient::new(&base_url);
    if let Err(err) = api.health() {
        eprintln!("Warning: backend at {base_url} failed its health check: {err}");
    }

    let game_id = if let Some(id) = args.game {
        store.persist_active_game(Some(id))?;
        id
    } else if let (false, Some(id)) = (args.new_game, store.active_game_id()) {
        id
    } else {
        let created = match api.create_game() {
            Ok(created) => created,
            Err(err) => {
                eprintln!("Error: could not create a game at {base_url}: {err}");
                std::process::exit(1);
            }
        };
        store.persist_active_game(Some(created.game_id))?;
        println!("Created game {}", created.game_id);
        created.game_id
    };

    if args.review {
        let review = api.get_review(game_id)?;
        println!("{}", serde_json::to_string_pretty(&review)?);
        return Ok(());
    }

    let mut record = store.load_for_game(game_id);
    if let Some(role) = args.role.clone() {
        store.persist_confirmed_role(game_id, Some(role.clone()))?;
        record.confirmed_role_id = Some(role);
    }
    if record.confirmed_role_id.is_none() {
        eprintln!("No confirmed role stored for this game; pass --role to pick a seat.");
    }

    let confirmed_role_id = record.confirmed_role_id.clone();
    let required_action = record.required_action;
    let worker = cli::spawn(Dispatcher::new(api, store, game_id));

    let mut app = TuiApp::new(worker, game_id, confirmed_role_id, required_action);
    app.run()?;
    Ok(())
}

fn init_tracing(log_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    let appender = tracing_appender::rolling::daily(log_dir, "mercury-client.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    guard
}
