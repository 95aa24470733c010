//! Healthcare Portal - role-based desktop client for the hospital REST API.

use std::path::PathBuf;

use clap::Parser;
use eframe::egui;
use healthcare_portal as portal;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use portal::api::ApiClient;
use portal::config::{AppConfig, ConfigLoadResult};
use portal::session::{SessionHandle, SessionStore};
use portal::ui::{App, SetupApp, SetupWizard};

/// Role-based healthcare portal for patients, doctors, radiologists and admins.
#[derive(Parser)]
#[command(name = "healthcare-portal")]
struct Cli {
    /// Use config.toml from current directory (dev mode)
    #[arg(long)]
    dev: bool,
}

/// Application launch mode.
enum LaunchMode {
    /// Normal operation with valid config.
    Normal(AppConfig),
    /// Setup wizard for first run or invalid config.
    Setup(SetupWizard, Option<String>),
}

fn main() -> eframe::Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_logging();

    tracing::info!("Healthcare Portal starting...");

    // Determine config path based on mode
    let config_path = if cli.dev {
        tracing::info!("Dev mode: loading config from current directory");
        PathBuf::from("config.toml")
    } else {
        AppConfig::default_path()
    };
    tracing::info!("Config path: {:?}", config_path);

    let launch_mode = match AppConfig::try_load(&config_path) {
        ConfigLoadResult::Loaded(config) => {
            tracing::info!("Config loaded successfully");
            LaunchMode::Normal(config)
        }
        ConfigLoadResult::Missing => {
            tracing::info!("Config missing, starting setup wizard");
            LaunchMode::Setup(SetupWizard::new(), None)
        }
        ConfigLoadResult::Invalid(e) => {
            tracing::warn!("Config invalid: {}", e);
            LaunchMode::Setup(SetupWizard::new(), Some(e.to_string()))
        }
    };

    // Create tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new().map_err(|e| eframe::Error::AppCreation(Box::new(e)))?;

    match launch_mode {
        LaunchMode::Normal(config) => run_main_app(config, config_path, rt),
        LaunchMode::Setup(wizard, error) => run_setup_wizard(wizard, error, rt),
    }
}

/// Console output plus a daily log file under the data directory.
///
/// `RUST_LOG` overrides the default `info` level.
fn init_logging() -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let log_dir = AppConfig::data_dir().join("logs");

    match std::fs::create_dir_all(&log_dir) {
        Ok(()) => {
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, "portal.log"));
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
                .init();
            Some(guard)
        }
        Err(e) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
            tracing::warn!("File logging disabled, cannot create {:?}: {}", log_dir, e);
            None
        }
    }
}

/// Run the setup wizard.
fn run_setup_wizard(
    wizard: SetupWizard,
    initial_error: Option<String>,
    rt: tokio::runtime::Runtime,
) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Healthcare Portal - Setup")
            .with_inner_size([600.0, 500.0])
            .with_min_inner_size([500.0, 400.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "Healthcare Portal - Setup",
        options,
        Box::new(|_cc| Ok(Box::new(SetupApp::new(wizard, initial_error, rt)))),
    )
}

/// Session storage according to `session.remember_login`.
fn session_handle(config: &AppConfig) -> SessionHandle {
    let store = SessionStore::new(&AppConfig::data_dir());
    if config.session.remember_login {
        tracing::info!("Session file: {:?}", store.path());
        SessionHandle::persistent(store)
    } else {
        // A file left from an earlier run must not sign anyone in
        if let Err(e) = store.clear() {
            tracing::warn!("Failed to remove stale session file: {}", e);
        }
        SessionHandle::in_memory()
    }
}

/// Run the main application.
fn run_main_app(config: AppConfig, config_path: PathBuf, rt: tokio::runtime::Runtime) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Healthcare Portal")
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    tracing::info!("Backend: {}", config.api.effective_base_url());
    let session = session_handle(&config);
    let api = ApiClient::new(&config.api, session).map_err(|e| eframe::Error::AppCreation(Box::new(e)))?;

    eframe::run_native(
        "Healthcare Portal",
        options,
        Box::new(move |cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);

            let mut fonts = egui::FontDefinitions::default();
            egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
            cc.egui_ctx.set_fonts(fonts);

            cc.egui_ctx.set_visuals(if config.ui.dark_mode {
                egui::Visuals::dark()
            } else {
                egui::Visuals::light()
            });

            Ok(Box::new(App::new(cc.egui_ctx.clone(), api, config, config_path, rt)))
        }),
    )
}
