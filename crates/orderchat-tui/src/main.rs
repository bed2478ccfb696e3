//! Orderchat terminal client.
//!
//! Shows the chat of one reservation: history, live updates from the
//! change feed, and a draft line for sending. `demo` runs against an
//! in-process service with a scripted counterpart.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod backend;
mod demo;
mod event;
mod state;
mod ui;

use app::App;
use event::{BackendCommand, UiEvent};
use orderchat_client::{tagging_translator, ChatBackend, MemoryBackend, RestBackend, ServiceConfig};
use orderchat_core::{
    AuthUser, CallerIdentity, ReservationNumber, SenderRole, UserId, UserMetadata, UserProfile,
    Viewer,
};
use orderchat_panel::PanelConfig;

const DEMO_RESERVATION: &str = "DL-2024-0001";

#[derive(Parser)]
#[command(name = "orderchat-tui")]
#[command(about = "Reservation chat in the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Data service base URL
    #[arg(long, env = "ORDERCHAT_URL", default_value = "http://127.0.0.1:54321")]
    url: String,

    /// Public API key of the data service
    #[arg(long, env = "ORDERCHAT_ANON_KEY", default_value = "")]
    anon_key: String,

    /// Access token of the signed-in user
    #[arg(long, env = "ORDERCHAT_ACCESS_TOKEN")]
    access_token: Option<String>,

    /// Reservation to open (e.g. DL-2024-0001)
    #[arg(short, long)]
    reservation: Option<String>,

    /// Sender id used when there is no session
    #[arg(long)]
    user_id: Option<String>,

    /// Sender name used when neither session nor profile has one
    #[arg(long)]
    user_name: Option<String>,

    /// Sender role used when neither session nor profile has one
    #[arg(long)]
    user_role: Option<String>,

    /// Service type stored with outgoing messages
    #[arg(long)]
    service_type: Option<String>,

    /// Do not request translations for untranslated history on load
    #[arg(long)]
    skip_pending_translations: bool,

    /// Log file (the terminal is owned by the UI)
    #[arg(long, default_value = "/tmp/orderchat-tui.log")]
    log_file: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run against an in-process service with a scripted counterpart
    Demo {
        /// Seconds between counterpart messages
        #[arg(short, long, default_value = "4")]
        interval_secs: u64,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_file);

    let viewer = Viewer::anonymous(CallerIdentity {
        user_id: cli.user_id.clone().map(UserId::new),
        name: cli.user_name.clone(),
        role: cli.user_role.clone().map(SenderRole::from),
    });

    let mut config = PanelConfig {
        translate_pending_on_load: !cli.skip_pending_translations,
        ..PanelConfig::default()
    };
    if let Some(service_type) = &cli.service_type {
        config = config.with_service_type(service_type.clone());
    }

    let runtime = tokio::runtime::Runtime::new()?;

    let (backend, reservation): (Arc<dyn ChatBackend>, ReservationNumber) = match cli.command {
        Some(Commands::Demo { interval_secs }) => {
            let reservation = ReservationNumber::parse(
                cli.reservation.as_deref().unwrap_or(DEMO_RESERVATION),
            )?;
            let memory = Arc::new(demo_backend());
            demo::seed_history(&memory, &reservation);
            runtime.spawn(demo::run_counterpart(
                memory.clone(),
                reservation.clone(),
                Duration::from_secs(interval_secs),
            ));
            info!(reservation = %reservation, "Starting demo");
            (memory as Arc<dyn ChatBackend>, reservation)
        }
        None => {
            let Some(reservation) = cli.reservation.as_deref() else {
                return Err("--reservation is required".into());
            };
            let reservation = ReservationNumber::parse(reservation)?;
            let mut service = ServiceConfig::new(&cli.url, &cli.anon_key);
            if let Some(token) = &cli.access_token {
                service = service.with_access_token(token.clone());
            }
            info!(url = %service.url, reservation = %reservation, "Starting TUI");
            let backend: Arc<dyn ChatBackend> = Arc::new(RestBackend::new(service)?);
            (backend, reservation)
        }
    };

    run_tui(runtime, backend, viewer, config, reservation)
}

fn init_tracing(path: &str) {
    // Logs go to a file to avoid terminal interference
    let Ok(file) = std::fs::File::create(path) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("orderchat_tui=debug,orderchat_panel=debug,orderchat_client=debug")
    });
    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(file))
        .with_env_filter(filter)
        .with_ansi(false)
        .init();
}

fn demo_backend() -> MemoryBackend {
    let user_id = UserId::new(demo::DEMO_USER_ID);
    MemoryBackend::new()
        .with_translator(tagging_translator())
        .with_session(AuthUser {
            id: user_id.clone(),
            email: Some("demo@example.com".to_string()),
            user_metadata: UserMetadata::default(),
        })
        .with_profile(
            user_id,
            UserProfile {
                contact_person: Some(demo::DEMO_USER_NAME.to_string()),
                role: Some("customer".to_string()),
                ..UserProfile::default()
            },
        )
}

fn run_tui(
    runtime: tokio::runtime::Runtime,
    backend: Arc<dyn ChatBackend>,
    viewer: Viewer,
    config: PanelConfig,
    reservation: ReservationNumber,
) -> Result<(), Box<dyn Error>> {
    // Create channels for UI <-> backend communication
    let (ui_tx, ui_rx) = mpsc::channel::<UiEvent>(100);
    let (cmd_tx, cmd_rx) = mpsc::channel::<BackendCommand>(100);

    let viewer_id = viewer.id();

    // Background thread drives the runtime
    let bg_handle = std::thread::spawn(move || {
        runtime.block_on(backend::run_backend(backend, viewer, config, ui_tx, cmd_rx));
    });

    // Initialize terminal (enters alternate screen, enables raw mode)
    let terminal = ratatui::init();

    // Run UI loop on main thread
    let mut app = App::new(viewer_id, ui_rx, cmd_tx);
    app.open(reservation);
    let result = app.run(terminal);

    // Restore terminal (exits alternate screen, disables raw mode)
    ratatui::restore();

    // Wait for background thread to finish
    let _ = bg_handle.join();

    info!("TUI shutdown complete");

    result.map_err(|e| e.into())
}
