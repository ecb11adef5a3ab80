//! livesync - Entry Point
//!
//! Follows an application's deployments and logs from the backend and keeps
//! a reconciled local view of both.

use std::collections::HashMap;
use std::env;
use std::io::stdout;

use livesync::app::options::AppOptions;
use livesync::app::run::run;
use livesync::display::{print_deployments, print_logs, print_matches};
use livesync::errors::SyncError;
use livesync::filesys::file::File;
use livesync::http::client::HttpClient;
use livesync::logs::{init_logging, LogLevel, LogOptions};
use livesync::reconcile::reconciler::DeploymentState;
use livesync::storage::settings::{Settings, DEFAULT_SETTINGS_FILE};
use livesync::sync::log_pager::{FetchOutcome, LogPager};
use livesync::utils::version_info;

use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Failed to print version: {e}"),
        }
        return;
    }

    // Retrieve the settings file
    let settings_path = cli_args
        .get("config")
        .cloned()
        .unwrap_or_else(|| DEFAULT_SETTINGS_FILE.to_string());
    let mut settings = match Settings::load(&File::new(settings_path)).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file: {e}");
            return;
        }
    };
    if let Err(e) = apply_overrides(&mut settings, &cli_args) {
        eprintln!("{e}");
        return;
    }

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    if let Err(e) = settings.validate() {
        error!("Invalid settings: {}", e);
        return;
    }

    // One-shot modes
    if cli_args.contains_key("print-deployments") {
        if let Err(e) = run_print_deployments(&settings).await {
            error!("Failed to print deployments: {e}");
        }
        return;
    }

    if cli_args.contains_key("print-logs") {
        if let Err(e) = run_print_logs(&settings, &cli_args).await {
            error!("Failed to print logs: {e}");
        }
        return;
    }

    // Run livesync
    let options = AppOptions::from_settings(&settings);
    info!("Running livesync with options: {:?}", options);
    let result = run(version.version, options, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run livesync: {e}");
    }
}

/// Apply `--key=value` flags on top of the settings file
fn apply_overrides(settings: &mut Settings, cli_args: &HashMap<String, String>) -> Result<(), SyncError> {
    if let Some(url) = cli_args.get("backend-url") {
        settings.backend.base_url = url.clone();
    }
    if let Some(token) = cli_args.get("api-token") {
        settings.backend.api_token = Some(token.clone());
    }
    if let Some(application_id) = cli_args.get("application") {
        settings.application_id = application_id.clone();
    }
    if let Some(level) = cli_args.get("log-level") {
        settings.log_level = level.parse::<LogLevel>().map_err(SyncError::ConfigError)?;
    }
    if let Some(deployment_id) = cli_args.get("deployment") {
        settings.logs.scope = livesync::http::logs::LogScope::Deployment;
        settings.logs.deployment_id = Some(deployment_id.clone());
    }
    if cli_args.contains_key("serve") {
        settings.server.enabled = true;
    }
    Ok(())
}

fn http_client(settings: &Settings) -> Result<HttpClient, SyncError> {
    let timeout = settings.backend.request_timeout();
    match &settings.backend.api_token {
        Some(token) => HttpClient::with_token(&settings.backend.base_url, timeout, token.clone()),
        None => HttpClient::new(&settings.backend.base_url, timeout),
    }
}

async fn run_print_deployments(settings: &Settings) -> Result<(), SyncError> {
    let client = http_client(settings)?;
    let snapshot = client.get_deployments(&settings.application_id).await?;
    let state = DeploymentState::from_snapshot(snapshot);
    print_deployments(&mut stdout().lock(), &state)?;
    Ok(())
}

async fn run_print_logs(settings: &Settings, cli_args: &HashMap<String, String>) -> Result<(), SyncError> {
    let pages: u32 = match cli_args.get("pages") {
        Some(pages) => pages
            .parse()
            .map_err(|_| SyncError::ConfigError(format!("Invalid --pages value: {}", pages)))?,
        None => 1,
    };

    let client = http_client(settings)?;
    let options = AppOptions::from_settings(settings);
    let (scope, resource_id) = options.logs.resource(&settings.application_id);

    let mut pager = LogPager::new(settings.logs.page_size);
    pager.select_resource(scope, &resource_id);

    let mut outcome = pager.refresh(&client).await;
    for _ in 1..pages.max(1) {
        if !pager.has_older() {
            break;
        }
        outcome = pager.load_older(&client).await;
    }
    if outcome == Some(FetchOutcome::Failed) {
        return Err(SyncError::Internal(
            pager.last_error().unwrap_or("log fetch failed").to_string(),
        ));
    }

    let mut out = stdout().lock();
    print_logs(&mut out, pager.view_mut().formatted())?;

    if let Some(term) = cli_args.get("search").filter(|t| !t.is_empty()) {
        let view = pager.view_mut();
        let matches = view.set_query(term).to_vec();
        let status = view.search_status();
        let rows: Vec<String> = view.lines().iter().map(|line| line.text.clone()).collect();
        print_matches(&mut out, &status, &matches, &rows)?;
    }

    if pager.has_older() {
        warn!(
            "Showing {} of {} pages, use --pages=N to load more",
            pager.current_page(),
            pager.total_pages()
        );
    }
    Ok(())
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            _ => {
                error!("Failed to install signal handlers, falling back to Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
        info!("Ctrl+C received, shutting down...");
    }
}
