use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use stickkery_admin::guard::visibility::{Visibility, spawn_visibility_watcher};
use stickkery_admin::hooks::{ConsoleNavigator, ConsoleNotifier};
use stickkery_admin::net::{HttpTransport, ReqwestTransport};
use stickkery_admin::session::FileStore;
use stickkery_admin::{
    ApiRequest, AuthClient, CheckOutcome, GuardConfig, GuardError, GuardHooks, GuardedClient, SessionEvent,
    SessionGuard, SessionStorage, Trigger,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Guard(#[from] GuardError),
    #[error("server returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("session ended: {0}")]
    SessionEnded(&'static str),
}

#[derive(Parser, Debug)]
#[command(name = "stickkery-admin", about = "Stickkery admin API client with account-status guard")]
struct Cli {
    /// Overrides `STICKKERY_API_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "STICKKERY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Whoami,
    /// Run one account check now.
    Verify,
    /// Keep the session guarded until it ends. Each line on stdin counts as
    /// the terminal regaining focus.
    Watch,
    Api(ApiArgs),
}

#[derive(Args, Debug)]
struct ApiArgs {
    #[arg(value_enum)]
    method: HttpMethod,
    /// Path such as `/api/admin/users`.
    path: String,
    #[arg(long, help = "JSON request body")]
    data: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Patch => Self::PATCH,
            HttpMethod::Delete => Self::DELETE,
        }
    }
}

struct App {
    guard: Arc<SessionGuard>,
    client: GuardedClient,
    auth: AuthClient,
}

impl App {
    fn build(base_url: Option<&str>) -> Result<Self, GuardError> {
        let mut config = GuardConfig::from_env()?;
        if let Some(raw) = base_url {
            config = config.with_base_url(raw)?;
        }
        debug!(base_url = %config.base_url, session_file = %config.session_file.display(), "config loaded");

        let storage = SessionStorage::new(Arc::new(FileStore::new(&config.session_file)));
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(config.timeouts)?);
        let hooks = GuardHooks { navigator: Arc::new(ConsoleNavigator), notifier: Arc::new(ConsoleNotifier) };
        let guard = SessionGuard::new(&config, storage.clone(), Arc::clone(&transport), hooks)?;
        let client = GuardedClient::new(config.base_url.clone(), transport, storage);
        guard.install(&client);
        let auth = AuthClient::new(client.clone(), Arc::clone(&guard));

        Ok(Self { guard, client, auth })
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    init_logging();

    let cli = Cli::parse();
    let app = App::build(cli.base_url.as_deref())?;

    let result = match cli.command {
        Command::Login { email, password } => run_login(&app, &email, &password).await,
        Command::Logout => {
            app.auth.logout()?;
            println!("logged out");
            Ok(())
        }
        Command::Whoami => run_whoami(&app),
        Command::Verify => run_verify(&app).await,
        Command::Watch => run_watch(&app).await,
        Command::Api(args) => run_api(&app, args).await,
    };
    app.guard.teardown();
    result
}

fn init_logging() {
    let debug_enabled = std::env::var("STICKKERY_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_login(app: &App, email: &str, password: &str) -> Result<(), CliError> {
    let session = app.auth.login(email, password).await?;
    let profile = session.profile();
    println!("logged in as {} <{}>", profile.name, profile.email);
    Ok(())
}

fn run_whoami(app: &App) -> Result<(), CliError> {
    let profile = app.auth.current_profile().ok_or(GuardError::MissingSession)?;
    println!("[{}] {} <{}>", profile.initial(), profile.name, profile.email);
    Ok(())
}

async fn run_verify(app: &App) -> Result<(), CliError> {
    match app.guard.check_once(Trigger::Visibility).await? {
        CheckOutcome::NoSession => Err(GuardError::MissingSession.into()),
        CheckOutcome::Active => {
            println!("session active");
            Ok(())
        }
        CheckOutcome::Rejected(status) => {
            println!("verification inconclusive (HTTP {}); session kept", status.as_u16());
            Ok(())
        }
        CheckOutcome::Disabled { .. } => Err(CliError::SessionEnded("account disabled")),
    }
}

async fn run_watch(app: &App) -> Result<(), CliError> {
    if !app.client.storage().has_token() {
        return Err(GuardError::MissingSession.into());
    }

    let mut events = app.guard.subscribe();
    let (tx, rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let watcher = spawn_visibility_watcher(Arc::downgrade(&app.guard), rx, cancel.clone());

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(_)) = lines.next_line().await {
            if tx.send(Visibility::Visible).await.is_err() {
                break;
            }
        }
    });

    info!("watching session; press Enter to re-check, Ctrl-C to stop");
    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            event = events.recv() => match event {
                Ok(SessionEvent::Terminated { .. }) => break Err(CliError::SessionEnded("account disabled")),
                Ok(SessionEvent::SignedOut) => break Err(CliError::SessionEnded("signed out")),
                Ok(SessionEvent::Armed) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break Ok(()),
            },
        }
    };

    cancel.cancel();
    let _ = watcher.await;
    outcome
}

async fn run_api(app: &App, args: ApiArgs) -> Result<(), CliError> {
    let mut request = ApiRequest::new(args.method.into(), args.path);
    if let Some(data) = args.data {
        request = request.with_body(serde_json::from_str(&data).map_err(GuardError::from)?);
    }

    let response = app.client.send(request).await?;
    let rendered = match response.json::<Value>() {
        Ok(json) => serde_json::to_string_pretty(&json).map_err(GuardError::from)?,
        Err(_) => response.text(),
    };

    if !response.is_success() {
        return Err(CliError::Api { status: response.status.as_u16(), body: rendered });
    }
    println!("{rendered}");
    Ok(())
}
